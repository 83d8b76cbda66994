//! Checkout hook.
//!
//! `POST /checkout` runs the guard for the submitting client. The response
//! tells the storefront whether to continue with payment.

use axum::{
    extract::{rejection::FormRejection, ConnectInfo, State},
    http::{Extensions, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::http::server::AppState;
use crate::security::{CheckoutSubmission, ClientContext, Decision};

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub billing_email: Option<String>,
}

pub async fn checkout_handler(
    State(state): State<AppState>,
    extensions: Extensions,
    headers: HeaderMap,
    uri: Uri,
    form: Result<Form<CheckoutForm>, FormRejection>,
) -> Response {
    // The storefront posts whatever it has. A body that is missing or does
    // not decode still counts as an attempt, just without an email.
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable checkout body, continuing without it");
            CheckoutForm::default()
        }
    };

    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let submission = CheckoutSubmission {
        client: ClientContext::from_request(&headers, peer, &uri),
        billing_email: form.billing_email.filter(|e| !e.trim().is_empty()),
    };

    match state.guard.evaluate(&submission) {
        Decision::Allowed {
            attempts,
            threshold_reached,
        } => Json(serde_json::json!({
            "result": "allowed",
            "attempts": attempts,
            "threshold_reached": threshold_reached,
        }))
        .into_response(),
        Decision::Blocked { attempts, notice } => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "result": "blocked",
                "attempts": attempts,
                "notice": notice,
            })),
        )
            .into_response(),
    }
}

pub async fn health_handler() -> &'static str {
    "ok"
}
