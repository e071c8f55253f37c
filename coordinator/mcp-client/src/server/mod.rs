/// HTTP and WebSocket front ends
///
/// - POST /query                            - one query, one answer
/// - GET  /ws/:session_id                   - streamed events per query
/// - GET  /sessions/:user_id/:session_id    - session history and state
/// - GET  /health                           - liveness

pub mod http;
pub mod ws;

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::config::{AppConfig, AuthMode};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::identity::{IdentityResolver, RestIdentityProvider};
use crate::policy::{AgentPolicy, CoordinatorPolicy};
use crate::session::SessionStore;

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub identity: Option<Arc<IdentityResolver>>,
    pub auth_mode: AuthMode,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        identity: Option<Arc<IdentityResolver>>,
        auth_mode: AuthMode,
    ) -> Self {
        Self {
            dispatcher,
            identity,
            auth_mode,
        }
    }

    /// Wires the hosted-model policy and the identity provider from configuration.
    pub fn from_config(config: &AppConfig, sessions: Arc<SessionStore>) -> Result<Self> {
        let http = reqwest::Client::new();

        let policy: Arc<dyn AgentPolicy> =
            Arc::new(CoordinatorPolicy::from_config(config, http.clone())?);
        let dispatcher = Arc::new(Dispatcher::new(
            policy,
            sessions,
            &config.app_name,
            config.dispatch_timeout,
        ));

        let identity = config.identity.as_ref().map(|identity| {
            let provider = Arc::new(RestIdentityProvider::new(http.clone(), identity.clone()));
            Arc::new(IdentityResolver::new(provider, identity.timeout))
        });

        Ok(Self::new(dispatcher, identity, config.auth_mode))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::health))
        .route("/query", post(http::query))
        .route("/sessions/:user_id/:session_id", get(http::session_history))
        .route("/ws/:session_id", get(ws::websocket))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

/// Short random suffix for synthesized ids.
pub(crate) fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
