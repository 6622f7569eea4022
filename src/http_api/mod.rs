use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    Feed, FeedError, FeedMetadata, FeedProgress, FeedStore, InstanceId, PluginInstance, TreeBuild,
    UnreachableReport, classify_unreachable,
};

type SharedStore = Arc<dyn FeedStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    feed: Arc<RwLock<Feed>>,
    store: Option<SharedStore>,
}

impl AppState {
    pub fn new(feed: Feed) -> Self {
        Self {
            feed: Arc::new(RwLock::new(feed)),
            store: None,
        }
    }

    /// Every successful mutation is written through to `store`.
    pub fn with_store(feed: Feed, store: SharedStore) -> Self {
        Self {
            feed: Arc::new(RwLock::new(feed)),
            store: Some(store),
        }
    }

    fn feed(&self) -> Arc<RwLock<Feed>> {
        self.feed.clone()
    }

    fn persist(&self, feed: &Feed) -> Result<(), ApiError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        store.save_feed(feed).map_err(|err| {
            error!(%err, "failed to persist feed");
            ApiError::internal(format!("failed to persist feed: {err}"))
        })
    }

    /// Applies `change` to a copy of the feed and swaps it in only once the
    /// store accepted it, so a failed save leaves the served feed untouched.
    fn commit<R>(
        &self,
        change: impl FnOnce(&mut Feed) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        let mut guard = self.feed.write();
        let mut next = Feed::clone(&guard);
        let result = change(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(result)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<FeedError> for ApiError {
    fn from(value: FeedError) -> Self {
        match value {
            FeedError::InstanceNotFound(_) => ApiError::NotFound(value.to_string()),
            FeedError::BlankName | FeedError::Validation(_) => ApiError::Invalid(value.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct LayoutQuery {
    /// `previous_id` of the wanted root; omitted selects the feed root.
    previous: Option<InstanceId>,
}

#[derive(Serialize)]
struct LayoutResponse<'a> {
    #[serde(flatten)]
    build: TreeBuild<'a, PluginInstance>,
    report: UnreachableReport,
}

#[derive(Serialize)]
struct DeleteResponse {
    removed: Vec<InstanceId>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metadata", get(get_metadata).put(update_metadata))
        .route("/instances", get(list_instances).post(create_instance))
        .route(
            "/instances/:id",
            get(get_instance).put(update_instance).delete(delete_instance),
        )
        .route("/layout", get(get_layout))
        .route("/progress", get(get_progress))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "feed-tree HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_metadata(State(state): State<AppState>) -> Json<FeedMetadata> {
    let feed = state.feed();
    let metadata = feed.read().metadata().clone();
    Json(metadata)
}

async fn update_metadata(
    State(state): State<AppState>,
    Json(metadata): Json<FeedMetadata>,
) -> Result<Json<FeedMetadata>, ApiError> {
    let metadata = state.commit(|feed| {
        feed.set_metadata(metadata)?;
        Ok(feed.metadata().clone())
    })?;
    Ok(Json(metadata))
}

async fn list_instances(State(state): State<AppState>) -> Json<Vec<PluginInstance>> {
    let feed = state.feed();
    let instances = feed.read().instances().to_vec();
    Json(instances)
}

async fn get_instance(
    State(state): State<AppState>,
    Path(id): Path<InstanceId>,
) -> Result<Json<PluginInstance>, ApiError> {
    let feed = state.feed();
    let guard = feed.read();
    match guard.find_instance(id) {
        Some(instance) => Ok(Json(instance.clone())),
        None => Err(ApiError::not_found(format!("instance {id} not found"))),
    }
}

async fn create_instance(
    State(state): State<AppState>,
    Json(instance): Json<PluginInstance>,
) -> Result<(StatusCode, Json<PluginInstance>), ApiError> {
    state.commit(|feed| {
        if feed.find_instance(instance.id).is_some() {
            return Err(ApiError::Conflict(format!(
                "instance {} already exists",
                instance.id
            )));
        }
        feed.upsert_instance(instance.clone()).map_err(ApiError::from)
    })?;
    Ok((StatusCode::CREATED, Json(instance)))
}

async fn update_instance(
    State(state): State<AppState>,
    Path(id): Path<InstanceId>,
    Json(instance): Json<PluginInstance>,
) -> Result<Json<PluginInstance>, ApiError> {
    if instance.id != id {
        return Err(ApiError::invalid(
            "instance id in payload does not match path parameter",
        ));
    }
    state.commit(|feed| {
        if feed.find_instance(id).is_none() {
            return Err(ApiError::not_found(format!("instance {id} not found")));
        }
        feed.upsert_instance(instance.clone()).map_err(ApiError::from)
    })?;
    Ok(Json(instance))
}

async fn delete_instance(
    State(state): State<AppState>,
    Path(id): Path<InstanceId>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let removed = state.commit(|feed| {
        let removed = feed.delete_instance(id);
        if removed.is_empty() {
            return Err(ApiError::not_found(format!("instance {id} not found")));
        }
        Ok(removed)
    })?;
    Ok(Json(DeleteResponse { removed }))
}

async fn get_layout(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let feed = state.feed();
    let guard = feed.read();
    let build = guard.layout_from(query.previous);
    let report = classify_unreachable(guard.instances(), &build.unreachable);
    let body = serde_json::to_value(LayoutResponse { build, report })
        .map_err(|err| ApiError::internal(err.to_string()))?;
    Ok(Json(body))
}

async fn get_progress(State(state): State<AppState>) -> Json<FeedProgress> {
    let feed = state.feed();
    let progress = feed.read().progress();
    Json(progress)
}
