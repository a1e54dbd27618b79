use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    Form, Json,
};
use serde::Deserialize;

use super::page::{self, DebugInfo};
use super::AppState;
use crate::models::*;
use crate::session::{BattleSession, SessionError};

// ============================================================
// Error Handling
// ============================================================

/// Map a session error to a response. Choosing without an active session is
/// a client mistake, not a server fault.
fn session_error(e: SessionError) -> (StatusCode, String) {
    tracing::warn!("Rejected choice: {}", e);
    match e {
        SessionError::NoActiveSession => (StatusCode::CONFLICT, e.to_string()),
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// JSON API
// ============================================================

pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.session.lock().await;
    Json(session.view())
}

pub async fn choose(
    State(state): State<AppState>,
    Json(input): Json<ChoiceInput>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    session
        .choose(input.challenger_won)
        .await
        .map_err(session_error)?;
    Ok(Json(session.view()))
}

pub async fn reset(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.session.lock().await;
    session.reset().await;
    Json(session.view())
}

pub async fn get_leaderboard(State(state): State<AppState>) -> Json<Vec<LeaderboardEntry>> {
    let session = state.session.lock().await;
    Json(session.view().leaderboard)
}

// ============================================================
// HTML pages
// ============================================================

/// Which side of the matchup the user clicked.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Challenger,
    Pivot,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceForm {
    pub winner: Winner,
}

pub async fn battle_page(State(state): State<AppState>) -> Html<String> {
    let session = state.session.lock().await;
    let view = session.view();
    let debug = state.page.debug.then(|| debug_info(&session));
    Html(page::render_page(&view, &state.page, debug.as_ref()))
}

pub async fn choose_form(
    State(state): State<AppState>,
    Form(form): Form<ChoiceForm>,
) -> Result<Redirect, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    session
        .choose(form.winner == Winner::Challenger)
        .await
        .map_err(session_error)?;
    Ok(Redirect::to("/"))
}

pub async fn reset_form(State(state): State<AppState>) -> Redirect {
    let mut session = state.session.lock().await;
    session.reset().await;
    Redirect::to("/")
}

fn debug_info(session: &BattleSession) -> DebugInfo {
    let Some(engine) = session.engine() else {
        return DebugInfo::default();
    };
    DebugInfo {
        window: engine.cursor().map(|c| (c.low, c.end)),
        pending: engine.pending().map(|item| item.title.clone()).collect(),
        last_sync: session.last_sync().map(|r| (r.written, r.failed)),
    }
}
