//! Shared fixtures: scripted policies, a fake identity provider and
//! in-process mock servers for the external collaborators

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Extension, Json, Path},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use futures_util::stream;
use serde_json::{json, Value};

use travel_coordinator::config::IdentityConfig;
use travel_coordinator::server::AppState;
use travel_coordinator::{
    AgentPolicy, AuthMode, CoordinatorError, Dispatcher, EventStream, IdentityProvider,
    IdentityResolver, Principal, QueryEvent, Result, RestIdentityProvider, Role, SessionSnapshot,
    SessionStore,
};

/// Echoes the query back, numbering turns by the user messages in history.
pub struct EchoPolicy;

#[async_trait]
impl AgentPolicy for EchoPolicy {
    async fn invoke(&self, session: SessionSnapshot, query: QueryEvent) -> Result<EventStream> {
        let turn = session
            .history
            .iter()
            .filter(|event| event.role == Role::User)
            .count();
        let text = query.text.clone().unwrap_or_default();
        let events = vec![
            Ok(QueryEvent::agent_text(&query.invocation_id, "coordinator", "Transferring to echo_agent")
                .with_state("active_agent", json!("echo_agent"))),
            Ok(QueryEvent::final_answer(
                &query.invocation_id,
                "echo_agent",
                format!("You said: {} (turn {})", text, turn),
            )),
        ];
        Ok(Box::pin(stream::iter(events)))
    }
}

/// Emits one progress event, then fails.
pub struct FailingPolicy;

#[async_trait]
impl AgentPolicy for FailingPolicy {
    async fn invoke(&self, _session: SessionSnapshot, query: QueryEvent) -> Result<EventStream> {
        let events = vec![
            Ok(QueryEvent::agent_text(&query.invocation_id, "coordinator", "Transferring to flights_agent")),
            Err(CoordinatorError::Policy("Claude API error (500)".to_string())),
        ];
        Ok(Box::pin(stream::iter(events)))
    }
}

/// Phone numbers registered with the fake provider.
pub struct FakeIdentity {
    pub accounts: HashMap<String, String>,
}

impl FakeIdentity {
    pub fn with_account(phone: &str, uid: &str) -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(phone.to_string(), uid.to_string());
        Self { accounts }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn lookup_by_phone(&self, phone_number: &str) -> Result<Principal> {
        self.accounts
            .get(phone_number)
            .map(|uid| Principal { uid: uid.clone(), phone_number: phone_number.to_string() })
            .ok_or_else(|| CoordinatorError::NotFound(phone_number.to_string()))
    }

    async fn mint_custom_token(&self, principal: &Principal) -> Result<String> {
        Ok(format!("custom.{}", principal.uid))
    }

    async fn exchange_custom_token(&self, custom_token: &str) -> Result<String> {
        Ok(format!("id.{}", custom_token))
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<String> {
        Ok(id_token.trim_start_matches("id.custom.").to_string())
    }
}

pub fn app_state(
    policy: impl AgentPolicy + 'static,
    identity: Option<Arc<dyn IdentityProvider>>,
    auth_mode: AuthMode,
) -> AppState {
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(policy),
        Arc::new(SessionStore::new()),
        "coordinator",
        Duration::from_secs(5),
    ));
    let identity = identity.map(|provider| Arc::new(IdentityResolver::new(provider, Duration::from_secs(5))));
    AppState::new(dispatcher, identity, auth_mode)
}

/// Serves `app` on an ephemeral local port.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// ---------------------------------------------------------------------------
// Identity provider mock
// ---------------------------------------------------------------------------

pub struct MockIdentityServer {
    /// phone number -> uid
    pub accounts: HashMap<String, String>,
    /// Status returned by the token exchange endpoint.
    pub exchange_status: StatusCode,
}

pub async fn spawn_identity_server(mock: MockIdentityServer) -> SocketAddr {
    let app = Router::new()
        .fallback(identity_endpoint)
        .layer(Extension(Arc::new(mock)));
    spawn_server(app).await
}

pub fn identity_config(addr: SocketAddr) -> IdentityConfig {
    IdentityConfig {
        web_api_key: "web-key".to_string(),
        service_account_email: "svc@travel-demo.iam.gserviceaccount.com".to_string(),
        access_token: "ya29.test".to_string(),
        toolkit_url: format!("http://{}", addr),
        iam_url: format!("http://{}", addr),
        timeout: Duration::from_secs(5),
    }
}

pub fn rest_identity(addr: SocketAddr) -> Arc<dyn IdentityProvider> {
    Arc::new(RestIdentityProvider::new(reqwest::Client::new(), identity_config(addr)))
}

async fn identity_endpoint(
    Extension(mock): Extension<Arc<MockIdentityServer>>,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    let path = uri.path();

    if path == "/v1/accounts:lookup" {
        if let Some(phone) = body["phoneNumber"][0].as_str() {
            let users: Vec<Value> = mock
                .accounts
                .get(phone)
                .map(|uid| vec![json!({"localId": uid, "phoneNumber": phone})])
                .unwrap_or_default();
            return Json(json!({"kind": "identitytoolkit#GetAccountInfoResponse", "users": users})).into_response();
        }
        if let Some(id_token) = body["idToken"].as_str() {
            let uid = id_token.trim_start_matches("id.jwt.");
            return Json(json!({"users": [{"localId": uid}]})).into_response();
        }
        return (StatusCode::BAD_REQUEST, Json(json!({"error": {"message": "MISSING_IDENTIFIER"}}))).into_response();
    }

    if path.ends_with(":signJwt") {
        let claims: Value = body["payload"]
            .as_str()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or(Value::Null);
        let uid = claims["uid"].as_str().unwrap_or_default();
        return Json(json!({"keyId": "key-1", "signedJwt": format!("jwt.{}", uid)})).into_response();
    }

    if path == "/v1/accounts:signInWithCustomToken" {
        if mock.exchange_status != StatusCode::OK {
            return (mock.exchange_status, Json(json!({"error": {"message": "INTERNAL_ERROR"}}))).into_response();
        }
        let token = body["token"].as_str().unwrap_or_default();
        return Json(json!({"idToken": format!("id.{}", token), "refreshToken": "r", "expiresIn": "3600"}))
            .into_response();
    }

    (StatusCode::NOT_FOUND, "unknown endpoint").into_response()
}

// ---------------------------------------------------------------------------
// Hosted model mock
// ---------------------------------------------------------------------------

/// Replies to `/v1/messages` in order and records each request body.
#[derive(Clone, Default)]
pub struct MockClaude {
    pub replies: Arc<Mutex<VecDeque<String>>>,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl MockClaude {
    pub fn with_replies(replies: &[&str]) -> Self {
        let mock = Self::default();
        mock.replies
            .lock()
            .unwrap()
            .extend(replies.iter().map(|r| r.to_string()));
        mock
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn spawn_claude_server(mock: MockClaude) -> SocketAddr {
    let app = Router::new()
        .route("/v1/messages", post(claude_messages))
        .layer(Extension(mock));
    spawn_server(app).await
}

async fn claude_messages(Extension(mock): Extension<MockClaude>, Json(body): Json<Value>) -> Response {
    mock.requests.lock().unwrap().push(body);
    let next = mock.replies.lock().unwrap().pop_front();
    match next {
        Some(text) => Json(json!({
            "id": "msg_test",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn"
        }))
        .into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"type": "error", "error": {"type": "api_error", "message": "no scripted reply"}})),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// Tool backend mock
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockToolbox {
    /// toolset -> manifest `tools` object
    pub toolsets: Arc<HashMap<String, Value>>,
    /// tool -> (status, body)
    pub results: Arc<HashMap<String, (StatusCode, Value)>>,
    pub manifest_hits: Arc<Mutex<usize>>,
    pub invocations: Arc<Mutex<Vec<(String, Value)>>>,
}

pub async fn spawn_toolbox_server(mock: MockToolbox) -> SocketAddr {
    let app = Router::new()
        .route("/api/toolset/:name", get(toolset_manifest))
        .route("/api/tool/:name/invoke", post(invoke_tool))
        .layer(Extension(mock));
    spawn_server(app).await
}

async fn toolset_manifest(Extension(mock): Extension<MockToolbox>, Path(name): Path<String>) -> Response {
    *mock.manifest_hits.lock().unwrap() += 1;
    match mock.toolsets.get(&name) {
        Some(tools) => Json(json!({"serverVersion": "0.9.0", "tools": tools})).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "toolset not found"}))).into_response(),
    }
}

async fn invoke_tool(
    Extension(mock): Extension<MockToolbox>,
    Path(name): Path<String>,
    Json(params): Json<Value>,
) -> Response {
    mock.invocations.lock().unwrap().push((name.clone(), params));
    match mock.results.get(&name) {
        Some((status, body)) => (*status, Json(body.clone())).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": format!("tool {} not found", name)}))).into_response(),
    }
}

pub fn hotels_toolset() -> Value {
    json!({
        "search-hotels-by-location": {
            "description": "Search for hotels in a city, sorted by price",
            "parameters": [
                {"name": "location", "type": "string", "description": "City name"}
            ],
            "authRequired": []
        },
        "get-hotel-amenities": {
            "description": "List amenities for a hotel",
            "parameters": [
                {"name": "hotel_id", "type": "integer", "description": "Hotel id"}
            ],
            "authRequired": []
        }
    })
}
