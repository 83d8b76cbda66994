use axum::{
    extract::{Path, State},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::auth::{AdminSession, Authorize};
use crate::admin::error::AdminError;
use crate::admin::tokens::TokenAction;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::sanitize::sanitize_text;
use crate::security::LogEntry;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub max_attempts: u64,
    pub window_secs: u64,
    pub log_entries: usize,
}

#[derive(Serialize)]
pub struct IndexedEntry {
    pub index: usize,
    #[serde(flatten)]
    pub entry: LogEntry,
}

#[derive(Serialize)]
pub struct AttemptStatus {
    pub ip: String,
    pub attempts: u64,
    pub blocked: bool,
}

#[derive(Serialize)]
pub struct IssuedToken {
    pub action: &'static str,
    pub token: String,
}

/// Admin form fields. Both actions post to the same endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ActionForm {
    pub ip_block_action: String,
    pub ip_block_nonce: Option<String>,
    pub ip: Option<String>,
    pub ip_block_remove_logs: Option<String>,
    pub log_index: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: &'static str,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_logs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
}

impl ActionOutcome {
    fn ignored(action: &'static str) -> Self {
        Self {
            action,
            applied: false,
            message: None,
            removed_logs: None,
            removed: None,
        }
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        max_attempts: state.guard.max_attempts(),
        window_secs: state.guard.counter().window().as_secs(),
        log_entries: state.guard.log().len(),
    })
}

pub async fn get_logs(State(state): State<AppState>) -> Json<Vec<IndexedEntry>> {
    let entries = state
        .guard
        .log()
        .list()
        .into_iter()
        .enumerate()
        .map(|(index, entry)| IndexedEntry { index, entry })
        .collect();
    Json(entries)
}

pub async fn get_attempts(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Json<AttemptStatus> {
    let ip = sanitize_text(&ip);
    let attempts = state.guard.counter().get_count(&ip);
    Json(AttemptStatus {
        blocked: attempts >= state.guard.max_attempts(),
        ip,
        attempts,
    })
}

pub async fn issue_token(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Result<Json<IssuedToken>, AdminError> {
    let action = TokenAction::from_id(&action).ok_or(AdminError::UnknownAction(action))?;
    Ok(Json(IssuedToken {
        action: action.id(),
        token: state.tokens.issue(action),
    }))
}

/// Log indexes arrive as text. Only a whole non-negative integer selects an
/// entry; "abc", "3x" and "" select nothing rather than being coerced to a
/// leading number or to 0.
fn parse_index(raw: Option<&str>) -> Option<usize> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|i| usize::try_from(i).ok())
}

fn check_token(state: &AppState, action: TokenAction, form: &ActionForm) -> Result<(), AdminError> {
    let token = form.ip_block_nonce.as_deref().unwrap_or_default();
    if state.tokens.verify(action, token) {
        Ok(())
    } else {
        tracing::warn!(action = action.id(), "Admin action with invalid or reused token");
        Err(AdminError::InvalidToken)
    }
}

pub async fn post_action(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Form(form): Form<ActionForm>,
) -> Result<Json<ActionOutcome>, AdminError> {
    match form.ip_block_action.as_str() {
        "unblock_ip" => {
            if !session.can_manage() {
                metrics::record_admin_action("unblock_ip", false);
                return Ok(Json(ActionOutcome::ignored("unblock_ip")));
            }
            check_token(&state, TokenAction::Unblock, &form)?;

            let ip = sanitize_text(form.ip.as_deref().unwrap_or_default());
            let remove_logs = form.ip_block_remove_logs.as_deref() == Some("1");
            let outcome = state.admin.unblock(&session, &ip, remove_logs);
            metrics::record_admin_action("unblock_ip", outcome.is_some());

            Ok(Json(ActionOutcome {
                action: "unblock_ip",
                applied: outcome.is_some(),
                message: outcome.map(|_| "IP unblocked."),
                removed_logs: outcome.map(|o| o.removed_logs),
                removed: None,
            }))
        }
        "remove_log_entry" => {
            if !session.can_manage() {
                metrics::record_admin_action("remove_log_entry", false);
                return Ok(Json(ActionOutcome::ignored("remove_log_entry")));
            }
            check_token(&state, TokenAction::RemoveLog, &form)?;

            let removed = match parse_index(form.log_index.as_deref()) {
                Some(index) => state.admin.remove_log_entry(&session, index),
                None => Some(false),
            };
            metrics::record_admin_action("remove_log_entry", removed.is_some());

            Ok(Json(ActionOutcome {
                action: "remove_log_entry",
                applied: removed.is_some(),
                message: removed.map(|_| "Log entry removed."),
                removed_logs: None,
                removed,
            }))
        }
        other => Err(AdminError::UnknownAction(other.to_string())),
    }
}
