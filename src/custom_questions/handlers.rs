use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::info;

use crate::{
    common::{app_state::AppState, error::ServerError},
    custom_questions::models::{CreateTopicRequest, DeleteTopicQuery, DeleteTopicResponse},
};

pub fn custom_questions_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/",
            get(list_topics).post(create_topic).delete(delete_topics),
        )
        .with_state(state)
}

async fn list_topics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ServerError> {
    let topics = state.get_store().list().await?;
    Ok((StatusCode::OK, Json(topics)))
}

async fn create_topic(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ServerError> {
    let body: serde_json::Value = serde_json::from_slice(&body)?;
    let topic = CreateTopicRequest::from_value(&body).validate()?;
    let created = state.get_store().create(topic).await?;

    info!(
        "Created topic '{}' with {} questions",
        created.title,
        created.questions.len()
    );
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_topics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteTopicQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let title = query.title.unwrap_or_default();
    if title.trim().is_empty() {
        return Err(ServerError::Validation("title is required".into()));
    }

    let deleted = state.get_store().delete_by_title(&title).await?;
    info!("Deleted {} topics titled '{}'", deleted, title);

    Ok((StatusCode::OK, Json(DeleteTopicResponse { deleted })))
}
