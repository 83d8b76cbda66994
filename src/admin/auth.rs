use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

/// Capability check supplied by whoever authenticated the caller.
pub trait Authorize {
    fn can_manage(&self) -> bool;
}

/// An authenticated admin API caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSession {
    pub can_manage: bool,
}

impl Authorize for AdminSession {
    fn can_manage(&self) -> bool {
        self.can_manage
    }
}

/// Map a bearer key to a session, if the key is known.
pub fn session_for_key(config: &crate::config::AdminConfig, key: &str) -> Option<AdminSession> {
    if key == config.api_key {
        Some(AdminSession { can_manage: true })
    } else if config.read_only_keys.iter().any(|k| k == key) {
        Some(AdminSession { can_manage: false })
    } else {
        None
    }
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let session = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|key| session_for_key(&state.config.admin, key));

    match session {
        Some(session) => {
            request.extensions_mut().insert(session);
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "Rejected admin request without a valid key");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
