//! Admin API.
//!
//! # Routes
//! - `GET  /admin/status`          configuration summary
//! - `GET  /admin/logs`            audit log with positional indexes
//! - `GET  /admin/attempts/{ip}`   current count for an address
//! - `GET  /admin/token/{action}`  issue a one-time action token
//! - `POST /admin/actions`         `unblock_ip` / `remove_log_entry`
//!
//! Every route requires a Bearer key. Mutations additionally need the
//! manage capability and a token for the action.

pub mod auth;
pub mod control;
pub mod error;
pub mod handlers;
pub mod tokens;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub use control::AdminControl;
pub use tokens::{ActionTokens, OneTimeTokens, TokenAction};

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/logs", get(get_logs))
        .route("/admin/attempts/{ip}", get(get_attempts))
        .route("/admin/token/{action}", get(issue_token))
        .route("/admin/actions", post(post_action))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
