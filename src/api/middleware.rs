//! Authentication and rate limiting for every route except health.
//!
//! Browsers reach the battle page with HTTP Basic auth (any user name, the
//! API key as password); API clients send `Authorization: Bearer <key>`.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::bool_var;

/// Realm announced in the Basic auth challenge.
const REALM: &str = r#"Basic realm="film-battle""#;

/// Tracked clients above which every check sweeps out idle entries.
const SWEEP_THRESHOLD: usize = 1024;

/// Security configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    /// API key for authentication (from FILM_BATTLE_API_KEY)
    pub api_key: Option<String>,
    /// Allowed CORS origins (from FILM_BATTLE_CORS_ORIGINS, comma-separated)
    pub cors_origins: Option<Vec<String>>,
    pub rate_limiter: Option<RateLimiter>,
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        let api_key = std::env::var("FILM_BATTLE_API_KEY").ok();

        let cors_origins = std::env::var("FILM_BATTLE_CORS_ORIGINS")
            .ok()
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect());

        let rate_limit = std::env::var("FILM_BATTLE_RATE_LIMIT")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(120);

        // Only rate limit when the UI is exposed with a key
        let rate_limiter = api_key.as_ref().map(|_| {
            RateLimiter::new(rate_limit, Duration::from_secs(60))
                .trust_proxy(bool_var("FILM_BATTLE_TRUST_PROXY"))
        });

        Self {
            api_key,
            cors_origins,
            rate_limiter,
        }
    }

    /// No authentication, no rate limit.
    pub fn disabled() -> Self {
        Self {
            api_key: None,
            cors_origins: None,
            rate_limiter: None,
        }
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::disabled()
        }
    }

    pub fn with_rate_limit(max_requests: u32) -> Self {
        Self::with_rate_limiter(RateLimiter::new(max_requests, Duration::from_secs(60)))
    }

    pub fn with_rate_limiter(limiter: RateLimiter) -> Self {
        Self {
            rate_limiter: Some(limiter),
            ..Self::disabled()
        }
    }

    /// CORS layer: the configured origins, or permissive when none are set.
    pub fn cors_layer(&self) -> CorsLayer {
        match &self.cors_origins {
            Some(origins) => {
                let origins: Vec<HeaderValue> =
                    origins.iter().filter_map(|o| o.parse().ok()).collect();
                CorsLayer::new().allow_origin(AllowOrigin::list(origins))
            }
            None => CorsLayer::permissive(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Sliding-window request counter keyed by client address.
///
/// Clients are identified by the peer address of the connection. Proxy
/// headers are only consulted after [`trust_proxy`](Self::trust_proxy),
/// since any caller can set them.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    trust_proxy: bool,
    requests: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            trust_proxy: false,
            requests: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Identify clients by `X-Forwarded-For` / `X-Real-IP` when set (from
    /// FILM_BATTLE_TRUST_PROXY). Only safe behind a proxy that overwrites them.
    pub fn trust_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }

    /// Returns true if a request from `ip` is allowed, false if rate limited.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let cutoff = now.checked_sub(self.window).unwrap_or(now);

        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");
        if requests.len() >= SWEEP_THRESHOLD {
            sweep(&mut requests, cutoff);
        }

        let entry = requests.entry(ip).or_default();
        entry.retain(|&t| t > cutoff);

        if entry.len() < self.max_requests as usize {
            entry.push(now);
            true
        } else {
            false
        }
    }

    /// Forget clients with no requests inside the window.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let cutoff = now.checked_sub(self.window).unwrap_or(now);
        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");
        sweep(&mut requests, cutoff);
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.requests.lock().expect("rate limiter lock poisoned").len()
    }

    fn client_ip(&self, request: &Request<Body>) -> IpAddr {
        let forwarded = if self.trust_proxy {
            forwarded_ip(request)
        } else {
            None
        };

        forwarded
            .or_else(|| {
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

fn sweep(requests: &mut HashMap<IpAddr, Vec<Instant>>, cutoff: Instant) {
    requests.retain(|_, timestamps| {
        timestamps.retain(|&t| t > cutoff);
        !timestamps.is_empty()
    });
}

/// Authentication middleware: Bearer token or Basic password must match the key.
pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected_key) = &config.api_key else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_header.and_then(presented_key) {
        Some(key) if key == *expected_key => next.run(request).await,
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            unauthorized()
        }
        None => {
            tracing::warn!("Missing or malformed Authorization header");
            unauthorized()
        }
    }
}

/// Key carried by an `Authorization` header value.
fn presented_key(value: &str) -> Option<String> {
    if let Some(token) = value.strip_prefix("Bearer ") {
        return Some(token.to_string());
    }
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (_, password) = decoded.split_once(':')?;
    Some(password.to_string())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, REALM)],
    )
        .into_response()
}

pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let ip = rate_limiter.client_ip(&request);

    if rate_limiter.check(ip) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Rate limit exceeded for IP: {}", ip);
        Err(StatusCode::TOO_MANY_REQUESTS)
    }
}

fn forwarded_ip(request: &Request<Body>) -> Option<IpAddr> {
    let headers = request.headers();
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok())
        .or_else(|| {
            headers
                .get("X-Real-IP")
                .and_then(|v| v.to_str().ok())
                .and_then(|ip| ip.trim().parse().ok())
        })
}
