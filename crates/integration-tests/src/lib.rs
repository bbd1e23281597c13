//! Integration test harness for the archetype sync service.
//!
//! Spins up two servers on ephemeral ports:
//!
//! - [`FakeShopify`] - an in-memory stand-in for the Admin API endpoints the
//!   service calls (customer search, customer create, GraphQL)
//! - the real sync app, configured to talk to the fake
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p archetype-sync-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use archetype_sync::{AppState, SyncConfig};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

/// Access token the fake expects.
pub const TEST_TOKEN: &str = "shpat_integration_token_0123456789";

/// Page an edge proxy serves in place of the API during an outage.
pub const MAINTENANCE_PAGE: &str = "<html>maintenance</html>";

/// An Admin API endpoint of the fake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    Create,
    GraphQL,
}

/// Knobs for how the fake Admin API misbehaves.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    /// Answer every search with this status.
    pub search_status: Option<u16>,
    /// Answer the first N searches with 503, then recover.
    pub search_transient_failures: usize,
    /// Answer every create with this status.
    pub create_status: Option<u16>,
    /// Answer creates with a 201 whose body lacks `customer.id`.
    pub create_without_id: bool,
    /// `userErrors` returned by `metafieldsSet`.
    pub user_errors: Vec<Value>,
    /// Answer this endpoint with a 200 [`MAINTENANCE_PAGE`] instead of JSON.
    pub html_on: Option<Endpoint>,
}

/// Everything the fake has seen.
#[derive(Debug, Default)]
pub struct Recorded {
    pub search_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub graphql_calls: AtomicUsize,
    pub graphql_bodies: Mutex<Vec<Value>>,
    pub create_bodies: Mutex<Vec<Value>>,
    pub bad_token_calls: AtomicUsize,
}

#[derive(Default)]
struct FakeState {
    behavior: Behavior,
    customers: Mutex<Vec<Value>>,
    next_id: AtomicU64,
    recorded: Recorded,
}

/// In-memory Admin API.
#[derive(Clone)]
pub struct FakeShopify {
    state: Arc<FakeState>,
    addr: SocketAddr,
}

impl FakeShopify {
    /// Start a fake with default behavior.
    pub async fn start() -> Self {
        Self::start_with(Behavior::default()).await
    }

    /// Start a fake with the given behavior.
    pub async fn start_with(behavior: Behavior) -> Self {
        let state = Arc::new(FakeState {
            behavior,
            next_id: AtomicU64::new(7_000_000_001),
            ..FakeState::default()
        });

        let router = Router::new()
            .route("/admin/api/{version}/customers/search.json", get(search))
            .route("/admin/api/{version}/customers.json", post(create))
            .route("/admin/api/{version}/graphql.json", post(graphql))
            .with_state(state.clone());

        let addr = serve(router).await;
        Self { state, addr }
    }

    /// Store URL to configure the service with.
    pub fn store_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Seed an existing customer.
    pub fn add_customer(&self, id: u64, email: &str) {
        self.state
            .customers
            .lock()
            .unwrap()
            .push(json!({"id": id, "email": email}));
    }

    /// Number of customers the fake holds.
    pub fn customer_count(&self) -> usize {
        self.state.customers.lock().unwrap().len()
    }

    /// Calls and bodies seen so far.
    pub fn recorded(&self) -> &Recorded {
        &self.state.recorded
    }

    pub fn search_calls(&self) -> usize {
        self.state.recorded.search_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.state.recorded.create_calls.load(Ordering::SeqCst)
    }

    pub fn graphql_calls(&self) -> usize {
        self.state.recorded.graphql_calls.load(Ordering::SeqCst)
    }

    /// The most recent GraphQL request body.
    pub fn last_graphql_body(&self) -> Option<Value> {
        self.state.recorded.graphql_bodies.lock().unwrap().last().cloned()
    }
}

fn authorized(state: &FakeState, headers: &HeaderMap) -> bool {
    let ok = headers
        .get("x-shopify-access-token")
        .and_then(|v| v.to_str().ok())
        == Some(TEST_TOKEN);
    if !ok {
        state.recorded.bad_token_calls.fetch_add(1, Ordering::SeqCst);
    }
    ok
}

fn status_response(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap();
    (status, Json(body)).into_response()
}

fn maintenance_page(state: &FakeState, endpoint: Endpoint) -> Option<Response> {
    (state.behavior.html_on == Some(endpoint)).then(|| {
        (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/html; charset=utf-8")],
            MAINTENANCE_PAGE,
        )
            .into_response()
    })
}

async fn search(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let call = state.recorded.search_calls.fetch_add(1, Ordering::SeqCst);

    if !authorized(&state, &headers) {
        return status_response(401, json!({"errors": "[API] Invalid API key or access token"}));
    }
    if let Some(page) = maintenance_page(&state, Endpoint::Search) {
        return page;
    }
    if let Some(status) = state.behavior.search_status {
        return status_response(status, json!({"errors": "search unavailable"}));
    }
    if call < state.behavior.search_transient_failures {
        return status_response(503, json!({"errors": "try again"}));
    }

    let wanted = params
        .get("query")
        .and_then(|q| q.strip_prefix("email:"))
        .unwrap_or_default()
        .to_ascii_lowercase();

    let customers: Vec<Value> = state
        .customers
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c["email"].as_str().map(str::to_ascii_lowercase) == Some(wanted.clone()))
        .cloned()
        .collect();

    Json(json!({ "customers": customers })).into_response()
}

async fn create(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.recorded.create_calls.fetch_add(1, Ordering::SeqCst);
    state.recorded.create_bodies.lock().unwrap().push(body.clone());

    if !authorized(&state, &headers) {
        return status_response(401, json!({"errors": "[API] Invalid API key or access token"}));
    }
    if let Some(page) = maintenance_page(&state, Endpoint::Create) {
        return page;
    }
    if let Some(status) = state.behavior.create_status {
        return status_response(status, json!({"errors": {"phone": ["has already been taken"]}}));
    }
    if state.behavior.create_without_id {
        return status_response(201, json!({"customer": {"email": body["customer"]["email"]}}));
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let mut customer = body["customer"].clone();
    customer["id"] = json!(id);
    state.customers.lock().unwrap().push(customer.clone());

    status_response(201, json!({ "customer": customer }))
}

async fn graphql(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.recorded.graphql_calls.fetch_add(1, Ordering::SeqCst);
    state.recorded.graphql_bodies.lock().unwrap().push(body.clone());

    if !authorized(&state, &headers) {
        return status_response(401, json!({"errors": "[API] Invalid API key or access token"}));
    }
    if let Some(page) = maintenance_page(&state, Endpoint::GraphQL) {
        return page;
    }

    if body["operationName"] == "GetCustomerMetafield" {
        let id = body["variables"]["id"].clone();
        return Json(json!({"data": {"customer": {"id": id, "metafield": null}}})).into_response();
    }

    if !state.behavior.user_errors.is_empty() {
        return Json(json!({
            "data": {
                "metafieldsSet": {
                    "metafields": [],
                    "userErrors": state.behavior.user_errors,
                }
            }
        }))
        .into_response();
    }

    let metafields: Vec<Value> = body["variables"]["metafields"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            json!({
                "id": format!("gid://shopify/Metafield/{}", 900 + i),
                "namespace": input["namespace"],
                "key": input["key"],
                "value": input["value"],
                "type": input["type"],
            })
        })
        .collect();

    Json(json!({
        "data": {
            "metafieldsSet": {
                "metafields": metafields,
                "userErrors": [],
            }
        }
    }))
    .into_response()
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A running sync service wired to a [`FakeShopify`].
pub struct TestContext {
    pub shopify: FakeShopify,
    pub client: reqwest::Client,
    base_url: String,
}

impl TestContext {
    /// Start the service with default settings.
    pub async fn new(shopify: FakeShopify) -> Self {
        Self::with_env(shopify, &[]).await
    }

    /// Start the service with extra environment overrides.
    pub async fn with_env(shopify: FakeShopify, extra: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("SHOPIFY_STORE".to_string(), shopify.store_url()),
            ("ADMIN_API_TOKEN".to_string(), TEST_TOKEN.to_string()),
            ("SHOPIFY_TIMEOUT_SECS".to_string(), "5".to_string()),
        ]);
        for (key, value) in extra {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = SyncConfig::from_vars(&|key: &str| vars.get(key).cloned()).unwrap();
        let state = AppState::from_config(config).unwrap();
        let addr = serve(archetype_sync::app(state)).await;

        Self {
            shopify,
            client: reqwest::Client::new(),
            base_url: format!("http://{addr}"),
        }
    }

    /// Absolute URL for a path on the service.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST a JSON body to `/sync` and return status and decoded body.
    pub async fn sync(&self, body: &Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(self.url("/sync"))
            .json(body)
            .send()
            .await
            .unwrap();
        decode(response).await
    }
}

/// Status and JSON body of a response.
pub async fn decode(response: reqwest::Response) -> (StatusCode, Value) {
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}
