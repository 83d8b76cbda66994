//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Mount the admin API when enabled
//! - Bind server to listener and stop on shutdown

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{self, ActionTokens, AdminControl, OneTimeTokens};
use crate::config::ShieldConfig;
use crate::http::checkout::{checkout_handler, health_handler};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::security::CheckoutGuard;
use crate::store::KeyValueStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ShieldConfig>,
    pub guard: CheckoutGuard,
    pub admin: AdminControl,
    pub tokens: Arc<dyn ActionTokens>,
}

impl AppState {
    /// Build every component over one shared store.
    pub fn new(config: ShieldConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let guard = CheckoutGuard::from_config(store, &config.rate_limit);
        let admin = AdminControl::new(guard.counter().clone(), guard.log().clone());
        let tokens = Arc::new(OneTimeTokens::new(Duration::from_secs(
            config.admin.token_ttl_secs,
        )));

        Self {
            config: Arc::new(config),
            guard,
            admin,
            tokens,
        }
    }
}

/// HTTP server for the checkout shield.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: ShieldConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let state = AppState::new(config, store);
        let router = build_router(state.clone());
        Self { router, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_attempts = self.state.guard.max_attempts(),
            window_secs = self.state.guard.counter().window().as_secs(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/checkout", post(checkout_handler))
        .route("/health", get(health_handler))
        .with_state(state.clone());

    if config.admin.enabled {
        router = router.merge(admin::setup_admin_router(state));
    } else {
        tracing::info!("Admin API disabled");
    }

    router
        .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.listener.request_timeout_secs,
        )))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}
