use crate::coordinator::{Coordinator, CreateTurnRequest};
use crate::http_api::{build_response, error_response};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use converse_protocol::Tenant;
use serde::Deserialize;
use std::sync::Arc;

/// Header carrying the tenant schema the request runs against. Tenant
/// resolution itself (auth, schema routing) lives outside this core; the
/// header is just the opaque capability it hands us.
pub const TENANT_HEADER: &str = "x-converse-schema";

pub struct AppState {
    pub coordinator: Coordinator,
}

fn tenant_from(headers: &HeaderMap) -> Tenant {
    headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(Tenant::new)
        .unwrap_or_default()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/topic-paths",
            get(list_topic_paths)
                .post(create_topic_path)
                .put(rename_topic_path)
                .delete(delete_topic_path),
        )
        .route("/turns", axum::routing::post(create_turn))
        .route("/topics/:id/turns", get(topic_turns))
        .route("/turns/:id/related", get(related_turns))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CreateTopicPathBody {
    path: String,
    group_id: i64,
    participant_id: i64,
}

#[derive(Debug, Deserialize)]
struct RenameTopicPathBody {
    old_path: String,
    new_path: String,
    group_id: i64,
}

#[derive(Debug, Deserialize)]
struct DeleteTopicPathBody {
    path: String,
    group_id: i64,
}

#[derive(Debug, Deserialize)]
struct GroupQuery {
    group_id: i64,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RelatedQuery {
    limit: Option<usize>,
    /// Include hits from the querying turn's own topic. Off by default:
    /// related turns are for discovery across topics.
    include_own_topic: Option<bool>,
}

const DEFAULT_RELATED_LIMIT: usize = 10;

async fn create_topic_path(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateTopicPathBody>,
) -> Response {
    let tenant = tenant_from(&headers);
    match state
        .coordinator
        .create_topic_path(&tenant, body.group_id, &body.path, body.participant_id)
        .await
    {
        Ok(created) => build_response(StatusCode::CREATED, &created),
        Err(err) => error_response(&err),
    }
}

async fn rename_topic_path(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RenameTopicPathBody>,
) -> Response {
    let tenant = tenant_from(&headers);
    match state
        .coordinator
        .rename_topic_path(&tenant, body.group_id, &body.old_path, &body.new_path)
        .await
    {
        Ok(outcome) => build_response(StatusCode::OK, &outcome),
        Err(err) => error_response(&err),
    }
}

async fn delete_topic_path(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<DeleteTopicPathBody>,
) -> Response {
    let tenant = tenant_from(&headers);
    match state
        .coordinator
        .delete_topic_path(&tenant, body.group_id, &body.path)
        .await
    {
        Ok(outcome) => build_response(StatusCode::OK, &outcome),
        Err(err) => error_response(&err),
    }
}

async fn list_topic_paths(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<GroupQuery>,
) -> Response {
    let tenant = tenant_from(&headers);
    match state.coordinator.list_topic_paths(&tenant, query.group_id) {
        Ok(paths) => build_response(StatusCode::OK, &paths),
        Err(err) => error_response(&err),
    }
}

async fn create_turn(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateTurnRequest>,
) -> Response {
    let tenant = tenant_from(&headers);
    match state.coordinator.create_turn(&tenant, body) {
        Ok(turn) => build_response(StatusCode::CREATED, &turn),
        Err(err) => error_response(&err),
    }
}

async fn topic_turns(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(topic_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let tenant = tenant_from(&headers);
    match state.coordinator.get_history(&tenant, topic_id, query.limit) {
        Ok(turns) => build_response(StatusCode::OK, &turns),
        Err(err) => error_response(&err),
    }
}

async fn related_turns(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(turn_id): Path<i64>,
    Query(query): Query<RelatedQuery>,
) -> Response {
    let tenant = tenant_from(&headers);
    let limit = query.limit.unwrap_or(DEFAULT_RELATED_LIMIT);
    match state.coordinator.get_related(
        &tenant,
        turn_id,
        limit,
        query.include_own_topic.unwrap_or(false),
    ) {
        Ok(related) => build_response(StatusCode::OK, &related),
        Err(err) => error_response(&err),
    }
}

async fn health() -> Response {
    build_response(
        StatusCode::OK,
        &serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
    )
}
