//! Admin API errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("The link you followed has expired.")]
    InvalidToken,

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

impl AdminError {
    pub fn status(&self) -> StatusCode {
        match self {
            AdminError::InvalidToken => StatusCode::FORBIDDEN,
            AdminError::UnknownAction(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
