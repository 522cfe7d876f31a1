// =============================================================================
// SkillSwap Backend - Public User Directory & Profile
// =============================================================================

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::{ProfileChanges, User, UserResponse};
use crate::error::ApiError;
use crate::AppState;

// -----------------------------------------------------------------------------
// Request/Response Types
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub search: String,
}

/// Directory card: public fields plus resolved skill names.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub id: String,
    pub full_name: String,
    pub location: String,
    pub availability: String,
    pub rating: f64,
    pub bio: String,
    pub skills_offered: Vec<String>,
    pub skills_wanted: Vec<String>,
}

/// Own profile: everything the directory card has, plus account fields.
#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub skills_offered: Vec<String>,
    pub skills_wanted: Vec<String>,
}

async fn directory_card(state: &AppState, user: &User) -> Result<UserListResponse, ApiError> {
    Ok(UserListResponse {
        id: user.id.clone(),
        full_name: user.full_name(),
        location: user.location.clone(),
        availability: user.availability.clone(),
        rating: user.rating,
        bio: user.bio.clone(),
        skills_offered: state.db.skill_names_for(&user.id, "offered").await?,
        skills_wanted: state.db.skill_names_for(&user.id, "wanted").await?,
    })
}

// -----------------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------------

/// List all users with search functionality.
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserListResponse>>, ApiError> {
    let users = state.db.list_users(&auth.user.id, &query.search).await?;

    let mut cards = Vec::with_capacity(users.len());
    for user in &users {
        cards.push(directory_card(&state, user).await?);
    }
    Ok(Json(cards))
}

/// Get detailed user information.
pub async fn user_detail(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserListResponse>, ApiError> {
    let user = state
        .db
        .find_user_by_id(&user_id)
        .await?
        .filter(|u| !u.is_banned)
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(directory_card(&state, &user).await?))
}

/// Get current user profile.
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let skills_offered = state.db.skill_names_for(&auth.user.id, "offered").await?;
    let skills_wanted = state.db.skill_names_for(&auth.user.id, "wanted").await?;

    Ok(Json(UserProfileResponse {
        user: auth.user.into(),
        skills_offered,
        skills_wanted,
    }))
}

/// Update current user profile (partial).
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(changes): Json<ProfileChanges>,
) -> Result<Json<UserResponse>, ApiError> {
    state.db.update_profile(&auth.user.id, &changes).await?;

    let user = state
        .db
        .find_user_by_id(&auth.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}
