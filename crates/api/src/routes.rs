use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tickerdash_core::controller::{Controller, DispatchReport};
use tickerdash_core::session::{Event, SessionStore, SessionView};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    controller: Controller,
    sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(controller: Controller, sessions: SessionStore) -> Self {
        Self {
            controller,
            sessions: Arc::new(sessions),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/dispatch", post(dispatch))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<DispatchReport>) {
    let session = state.sessions.create().await;
    let report = state.controller.initialize(&session).await;
    tracing::info!(session_id = %report.session.id, "session started");
    (StatusCode::CREATED, Json(report))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, StatusCode> {
    let session = state.sessions.get(id).await.ok_or(StatusCode::NOT_FOUND)?;
    let view = session.lock().await.view();
    Ok(Json(view))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.sessions.remove(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn dispatch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(event): Json<Event>,
) -> Result<Json<DispatchReport>, StatusCode> {
    let session = state.sessions.get(id).await.ok_or(StatusCode::NOT_FOUND)?;
    let report = state.controller.dispatch(&session, event).await;
    Ok(Json(report))
}
