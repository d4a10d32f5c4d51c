// handlers/protected/schedule.rs - GET /schedule handler

use axum::{extract::State, Extension, Json};
use chrono::Local;

use crate::app::AppState;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::services::schedule_service::{schedule_for, Schedule};

/// GET /schedule - weekly agenda for the current school year
pub async fn schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Schedule>, ApiError> {
    let schedule = schedule_for(state.store.as_ref(), &identity, Local::now().date_naive()).await?;
    Ok(Json(schedule))
}
