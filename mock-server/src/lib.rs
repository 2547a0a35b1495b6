use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "secret";

/// Collections that reject a second entry with the same `name`.
const UNIQUE_NAMES: &[&str] = &["vms", "users", "vnets", "groups"];

type Entry = Map<String, Value>;

#[derive(Default)]
pub struct Store {
    collections: HashMap<String, BTreeMap<u64, Entry>>,
    next_key: u64,
}

impl Store {
    fn insert(&mut self, collection: &str, mut entry: Entry) -> u64 {
        self.next_key += 1;
        let key = self.next_key;
        entry.insert("$key".to_string(), json!(key));
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(key, entry);
        key
    }

    fn name_taken(&self, collection: &str, name: &Value) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|entries| entries.values().any(|e| e.get("name") == Some(name)))
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    authorization: Arc<String>,
}

impl AppState {
    pub fn new(username: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{username}:{password}"));
        Self {
            db: Db::default(),
            authorization: Arc::new(format!("Basic {token}")),
        }
    }

    /// Pre-populate `collection`; each entry gets a fresh `$key`.
    pub async fn seed(&self, collection: &str, entries: Vec<Value>) {
        let mut store = self.db.write().await;
        for entry in entries {
            if let Value::Object(entry) = entry {
                store.insert(collection, entry);
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

pub fn app() -> Router {
    app_with(AppState::default())
}

pub fn app_with(state: AppState) -> Router {
    Router::new()
        .route("/version.json", get(version))
        .route("/auth_sources.json", get(auth_sources))
        .route("/api/v4/{collection}", get(list).post(create))
        .route(
            "/api/v4/{collection}/{key}",
            get(fetch).put(update).delete(remove),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, AppState::default()).await
}

pub async fn run_with(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(state)).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "err": message }))).into_response()
}

async fn require_basic_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(state.authorization.as_str());
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "authentication required");
    }
    next.run(request).await
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub fields: Option<String>,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Evaluate `field eq 'text'`, `field eq null`, and `field eq <literal>`
/// clauses joined by ` and `.
pub fn matches_filter(entry: &Entry, filter: &str) -> bool {
    filter.split(" and ").all(|clause| {
        let Some((field, literal)) = clause.trim().split_once(" eq ") else {
            return false;
        };
        let actual = entry.get(field.trim()).unwrap_or(&Value::Null);
        let literal = literal.trim();
        if literal == "null" {
            actual.is_null()
        } else if let Some(text) = literal
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            actual.as_str() == Some(text)
        } else {
            actual.to_string() == literal
        }
    })
}

fn select_fields(entry: &Entry, fields: Option<&str>) -> Entry {
    match fields {
        None | Some("most") | Some("all") => entry.clone(),
        Some(list) => list
            .split(',')
            .filter_map(|f| entry.get(f).map(|v| (f.to_string(), v.clone())))
            .collect(),
    }
}

fn query_entries(entries: Vec<Entry>, params: &ListParams) -> Vec<Value> {
    let mut entries: Vec<Entry> = entries
        .into_iter()
        .filter(|e| params.filter.as_deref().map_or(true, |f| matches_filter(e, f)))
        .collect();
    if let Some(sort) = params.sort.as_deref() {
        let (field, descending) = match sort.strip_prefix('-') {
            Some(field) => (field, true),
            None => (sort, false),
        };
        entries.sort_by_key(|e| e.get(field).map(Value::to_string).unwrap_or_default());
        if descending {
            entries.reverse();
        }
    }
    entries
        .iter()
        .skip(params.offset.unwrap_or(0))
        .take(params.limit.unwrap_or(usize::MAX))
        .map(|e| Value::Object(select_fields(e, params.fields.as_deref())))
        .collect()
}

async fn version() -> Json<Value> {
    Json(json!({ "name": "VergeOS", "version": "4.12.0", "hash": "mock" }))
}

async fn auth_sources(State(state): State<AppState>) -> Json<Vec<Value>> {
    let store = state.db.read().await;
    let entries = store
        .collections
        .get("auth_sources")
        .map(|c| c.values().cloned().map(Value::Object).collect())
        .unwrap_or_default();
    Json(entries)
}

async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Value>> {
    let store = state.db.read().await;
    let entries = store
        .collections
        .get(&collection)
        .map(|c| c.values().cloned().collect())
        .unwrap_or_default();
    Json(query_entries(entries, &params))
}

async fn create(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Value::Object(entry) = body else {
        return error(StatusCode::BAD_REQUEST, "expected a JSON object");
    };
    let mut store = state.db.write().await;
    if UNIQUE_NAMES.contains(&collection.as_str()) {
        if let Some(name) = entry.get("name") {
            if store.name_taken(&collection, name) {
                return error(StatusCode::CONFLICT, "name already exists");
            }
        }
    }
    let key = store.insert(&collection, entry);
    (StatusCode::CREATED, Json(json!({ "$key": key }))).into_response()
}

async fn fetch(
    State(state): State<AppState>,
    Path((collection, key)): Path<(String, String)>,
    Query(params): Query<ListParams>,
) -> Response {
    let store = state.db.read().await;
    match lookup(&store, &collection, &key) {
        Some(entry) => Json(select_fields(entry, params.fields.as_deref())).into_response(),
        None => error(StatusCode::NOT_FOUND, "not found"),
    }
}

async fn update(
    State(state): State<AppState>,
    Path((collection, key)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let Value::Object(changes) = body else {
        return error(StatusCode::BAD_REQUEST, "expected a JSON object");
    };
    let mut store = state.db.write().await;
    let Some(entry) = key
        .parse::<u64>()
        .ok()
        .and_then(|k| store.collections.get_mut(&collection)?.get_mut(&k))
    else {
        return error(StatusCode::NOT_FOUND, "not found");
    };
    for (field, value) in changes {
        if field != "$key" {
            entry.insert(field, value);
        }
    }
    StatusCode::OK.into_response()
}

async fn remove(
    State(state): State<AppState>,
    Path((collection, key)): Path<(String, String)>,
) -> Response {
    let mut store = state.db.write().await;
    let removed = key
        .parse::<u64>()
        .ok()
        .and_then(|k| store.collections.get_mut(&collection)?.remove(&k));
    match removed {
        Some(_) => StatusCode::OK.into_response(),
        None => error(StatusCode::NOT_FOUND, "not found"),
    }
}

fn lookup<'a>(store: &'a Store, collection: &str, key: &str) -> Option<&'a Entry> {
    let key = key.parse::<u64>().ok()?;
    store.collections.get(collection)?.get(&key)
}
