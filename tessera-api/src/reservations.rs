use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    routing::post,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::reservation::Reservation;

use crate::error::AppError;
use crate::middleware::auth::CustomerClaims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ReservationCreateRequest {
    event_id: Uuid,
    // user id comes from the token, not the body
}

#[derive(Debug, Deserialize)]
struct ReservationUpdateRequest {
    event_id: Uuid,
}

#[derive(Debug, Serialize)]
struct ReservationResponse {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    booked_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        ReservationResponse {
            id: reservation.id,
            event_id: reservation.event_id,
            user_id: reservation.user_id,
            booked_at: reservation.booked_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reservations", post(create_reservation).get(list_my_reservations))
        .route(
            "/reservations/{id}",
            get(get_reservation)
                .put(update_reservation)
                .delete(delete_reservation),
        )
}

fn caller_id(claims: &CustomerClaims) -> Result<Uuid, AppError> {
    Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthenticationError("malformed token subject".to_string()))
}

async fn create_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<ReservationCreateRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let user_id = caller_id(&claims)?;
    let reservation = state.reservations.create(req.event_id, user_id).await?;
    Ok(Json(ReservationResponse::from(reservation)))
}

async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, AppError> {
    let reservation = state.reservations.get(id).await?;
    Ok(Json(ReservationResponse::from(reservation)))
}

async fn list_my_reservations(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    let user_id = caller_id(&claims)?;
    let reservations = state.reservations.list_by_user(user_id).await?;
    Ok(Json(
        reservations
            .into_iter()
            .map(ReservationResponse::from)
            .collect(),
    ))
}

async fn update_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReservationUpdateRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let reservation = state.reservations.update(id, req.event_id).await?;
    Ok(Json(ReservationResponse::from(reservation)))
}

async fn delete_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.reservations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
