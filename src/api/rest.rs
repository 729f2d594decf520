//! Axum REST API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::service::registry::PersonRegistry;

use super::dto::*;

/// Application state shared across handlers
pub struct AppState<R: PersonRegistry> {
    pub registry: Arc<R>,
}

/// Create the REST API router
pub fn create_rest_router<R: PersonRegistry + 'static>(state: Arc<AppState<R>>) -> Router {
    Router::new()
        .route("/person", get(list_persons_handler))
        .route("/person/:person_id", get(get_person_handler::<R>))
        .route("/person/:person_id", delete(unregister_person_handler::<R>))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// List registered persons
///
/// Placeholder payload until a real listing contract is defined.
async fn list_persons_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "persons": [],
        "detail": "person listing is not implemented",
    }))
}

/// Get a registered person by id
async fn get_person_handler<R: PersonRegistry>(
    State(state): State<Arc<AppState<R>>>,
    Path(person_id): Path<i64>,
) -> Result<Json<PersonDto>, (StatusCode, Json<ErrorResponse>)> {
    let person = state
        .registry
        .get_registered_person(person_id)
        .await
        .map_err(|e| {
            error!("Person lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(&e.to_string(), "LOOKUP_FAILED")),
            )
        })?;

    match person {
        Some(person) => Ok(Json(person.into())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Person not found", "NOT_FOUND")),
        )),
    }
}

/// Unregister a person
async fn unregister_person_handler<R: PersonRegistry>(
    State(state): State<Arc<AppState<R>>>,
    Path(person_id): Path<i64>,
) -> Result<Json<UnregisterResponse>, (StatusCode, Json<ErrorResponse>)> {
    let removed = state
        .registry
        .unregister_person(person_id)
        .await
        .map_err(|e| {
            error!("Unregister failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(&e.to_string(), "UNREGISTER_FAILED")),
            )
        })?;

    Ok(Json(UnregisterResponse {
        success: removed,
        message: if removed {
            "Person unregistered successfully"
        } else {
            "Person not found"
        }
        .to_string(),
    }))
}
