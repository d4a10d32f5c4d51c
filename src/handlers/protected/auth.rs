// handlers/protected/auth.rs - GET /auth handler

use axum::{extract::State, Extension, Json};

use crate::app::AppState;
use crate::auth::Identity;
use crate::database::models::User;
use crate::database::Table;
use crate::error::ApiError;
use crate::filter::{Predicate, PredicateSet};

/// GET /auth - the logged-in user, without the password digest
pub async fn current_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<User>, ApiError> {
    let by_id = PredicateSet::empty().and(Predicate::eq("id", identity.user_id));
    let row = state
        .store
        .find_one(Table::Users, &by_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let user: User = serde_json::from_value(serde_json::Value::Object(row))?;
    Ok(Json(user))
}
