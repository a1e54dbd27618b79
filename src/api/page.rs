//! HTML rendering for the battle page.

use crate::models::{LeaderboardEntry, Matchup, SessionStatus, SessionView};

/// Page-level settings taken from [`Config`](crate::config::Config).
#[derive(Clone, Debug)]
pub struct PageOptions {
    pub title: String,
    pub debug: bool,
}

/// Engine internals shown when debug is enabled.
#[derive(Clone, Debug, Default)]
pub struct DebugInfo {
    /// Current search window as `low..end`.
    pub window: Option<(usize, usize)>,
    pub pending: Vec<String>,
    /// `(written, failed)` from the last rank write-back.
    pub last_sync: Option<(usize, usize)>,
}

/// Render the whole battle page.
pub fn render_page(view: &SessionView, options: &PageOptions, debug: Option<&DebugInfo>) -> String {
    let mut body = String::new();

    match view.status {
        SessionStatus::Empty => {
            body.push_str(r#"<p class="warning">Not enough films to run battles!</p>"#);
        }
        SessionStatus::Unavailable => {
            body.push_str(&format!(
                r#"<p class="error">Could not load films: {}</p>"#,
                html_escape(view.error.as_deref().unwrap_or("unknown error"))
            ));
        }
        SessionStatus::Trivial => {
            body.push_str(r#"<p class="notice">Only one eligible film, nothing to battle.</p>"#);
        }
        SessionStatus::Done => {
            body.push_str(&format!(
                r#"<p class="notice">All films ranked in {} battles.</p>"#,
                view.progress.comparisons
            ));
        }
        SessionStatus::Awaiting => {
            if let Some(matchup) = &view.matchup {
                body.push_str(&render_matchup(matchup));
            }
            body.push_str(&format!(
                r#"<p class="progress">{} ranked, {} to go, {} battles so far</p>"#,
                view.progress.ranked, view.progress.remaining, view.progress.comparisons
            ));
        }
    }

    if !view.leaderboard.is_empty() {
        body.push_str(&render_leaderboard(&view.leaderboard));
    }

    body.push_str(
        r#"<form method="post" action="/reset"><button type="submit" class="reset">Reset battles</button></form>"#,
    );

    if let (true, Some(debug)) = (options.debug, debug) {
        body.push_str(&render_debug(view, debug));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <h1>{title}</h1>
    {body}
</body>
</html>"#,
        title = html_escape(&options.title),
        css = CSS,
        body = body,
    )
}

fn render_matchup(matchup: &Matchup) -> String {
    format!(
        r#"<h2>{} vs {}</h2>
<form method="post" action="/choose" class="battle">
    <button type="submit" name="winner" value="challenger">{}</button>
    <button type="submit" name="winner" value="pivot">{}</button>
</form>"#,
        html_escape(&matchup.challenger.title),
        html_escape(&matchup.pivot.title),
        render_choice(&matchup.challenger.title, matchup.challenger.image.as_deref()),
        render_choice(&matchup.pivot.title, matchup.pivot.image.as_deref()),
    )
}

fn render_choice(title: &str, image: Option<&str>) -> String {
    let title = html_escape(title);
    match image {
        Some(url) => format!(
            r#"<img src="{}" alt="{}"><span>{}</span>"#,
            html_escape(url),
            title,
            title
        ),
        None => format!("<span>{}</span>", title),
    }
}

fn render_leaderboard(entries: &[LeaderboardEntry]) -> String {
    let rows: String = entries
        .iter()
        .map(|e| format!("<li>{}</li>", html_escape(&e.item.title)))
        .collect();
    format!(
        r#"<h2>Current Battle Rankings</h2><ol class="leaderboard">{}</ol>"#,
        rows
    )
}

fn render_debug(view: &SessionView, debug: &DebugInfo) -> String {
    let window = debug
        .window
        .map(|(low, end)| format!("{}..{}", low, end))
        .unwrap_or_else(|| "none".to_string());
    let sync = debug
        .last_sync
        .map(|(written, failed)| format!("{} written, {} failed", written, failed))
        .unwrap_or_else(|| "not run".to_string());
    let pending = if debug.pending.is_empty() {
        "(empty)".to_string()
    } else {
        html_escape(&debug.pending.join(", "))
    };

    format!(
        r#"<details class="debug" open><summary>Debug</summary><dl>
<dt>Session</dt><dd>{}</dd>
<dt>Status</dt><dd>{}</dd>
<dt>Window</dt><dd>{}</dd>
<dt>Pending</dt><dd>{}</dd>
<dt>Last sync</dt><dd>{}</dd>
</dl></details>"#,
        view.session_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".to_string()),
        view.status.as_str(),
        window,
        pending,
        sync
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const CSS: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; }
.battle { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }
.battle button { display: flex; flex-direction: column; align-items: center; gap: .5rem; padding: 1rem; font-size: 1.1rem; cursor: pointer; }
.battle img { max-width: 100%; max-height: 22rem; object-fit: contain; }
.warning { color: #8a6d00; }
.error { color: #b00020; }
.progress, .notice { color: #555; }
.reset { margin-top: 1.5rem; }
.debug { margin-top: 2rem; font-family: monospace; font-size: .85rem; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, Progress};

    fn options(debug: bool) -> PageOptions {
        PageOptions {
            title: "Battle Mode".to_string(),
            debug,
        }
    }

    fn view(status: SessionStatus) -> SessionView {
        SessionView {
            session_id: None,
            status,
            matchup: None,
            leaderboard: Vec::new(),
            progress: Progress::default(),
            error: None,
        }
    }

    #[test]
    fn empty_session_shows_warning() {
        let html = render_page(&view(SessionStatus::Empty), &options(false), None);
        assert!(html.contains("Not enough films to run battles!"));
        assert!(!html.contains("/choose"));
    }

    #[test]
    fn unavailable_source_shows_error_not_warning() {
        let mut v = view(SessionStatus::Unavailable);
        v.error = Some("Unauthorized".to_string());
        let html = render_page(&v, &options(false), None);
        assert!(html.contains("Could not load films: Unauthorized"));
        assert!(!html.contains("Not enough films"));
    }

    #[test]
    fn matchup_renders_both_choices_escaped() {
        let mut v = view(SessionStatus::Awaiting);
        v.matchup = Some(Matchup {
            challenger: Item::new("b", "Tom & Jerry").with_image("https://img/b.jpg"),
            pivot: Item::new("a", "<Heat>"),
        });
        let html = render_page(&v, &options(false), None);

        assert!(html.contains(r#"value="challenger""#));
        assert!(html.contains(r#"value="pivot""#));
        assert!(html.contains("Tom &amp; Jerry"));
        assert!(html.contains("&lt;Heat&gt;"));
        assert!(html.contains(r#"<img src="https://img/b.jpg""#));
    }

    #[test]
    fn debug_panel_only_when_enabled() {
        let debug = DebugInfo {
            window: Some((0, 2)),
            pending: vec!["C".to_string()],
            last_sync: None,
        };
        let v = view(SessionStatus::Awaiting);

        assert!(!render_page(&v, &options(false), Some(&debug)).contains("<summary>Debug"));
        let html = render_page(&v, &options(true), Some(&debug));
        assert!(html.contains("<summary>Debug"));
        assert!(html.contains("0..2"));
    }
}
