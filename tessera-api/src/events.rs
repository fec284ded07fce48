use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::event::{Event, NewEvent};

use crate::error::AppError;
use crate::middleware::auth::{is_admin, CustomerClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct EventCreateRequest {
    title: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    max_attendees: i32,
}

#[derive(Debug, Serialize)]
struct EventResponse {
    id: Uuid,
    title: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    max_attendees: i32,
    available_attendees: i32,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        EventResponse {
            id: event.id,
            title: event.title,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            max_attendees: event.max_attendees,
            available_attendees: event.available_attendees,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event).delete(delete_event))
}

async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state.events.list().await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state.events.get(id).await?;
    Ok(Json(EventResponse::from(event)))
}

async fn create_event(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<EventCreateRequest>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    if !is_admin(&claims) {
        return Err(AppError::AuthorizationError(
            "only admins can create events".to_string(),
        ));
    }

    let event = state
        .events
        .create(NewEvent {
            title: req.title,
            starts_at: req.starts_at,
            ends_at: req.ends_at,
            max_attendees: req.max_attendees,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

async fn delete_event(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !is_admin(&claims) {
        return Err(AppError::AuthorizationError(
            "only admins can delete events".to_string(),
        ));
    }

    state.events.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
