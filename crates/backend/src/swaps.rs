// =============================================================================
// SkillSwap Backend - Swap Lifecycle (requests, sessions, ratings)
// =============================================================================

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::{SwapDetail, SwapRequest};
use crate::error::ApiError;
use crate::AppState;

// -----------------------------------------------------------------------------
// Swap status state machine
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
    Rejected,
}

impl SwapStatus {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ApiError::BadRequest(format!("Invalid swap status: {s}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }
}

/// Recipient response to a pending request.
pub fn respond_transition(current: &str, action: &str) -> Result<SwapStatus, ApiError> {
    let next = match action {
        "accept" => SwapStatus::Accepted,
        "reject" => SwapStatus::Rejected,
        _ => {
            return Err(ApiError::BadRequest(format!(
                "Invalid action: {action}. Use \"accept\" or \"reject\"."
            )))
        }
    };
    if current != SwapStatus::Pending.as_str() {
        return Err(ApiError::Conflict(format!(
            "Cannot respond to swap in status {current}"
        )));
    }
    Ok(next)
}

/// Cancellation is only permitted before the swap completes.
pub fn cancel_transition(current: &str) -> Result<(), ApiError> {
    if current == SwapStatus::Pending.as_str() || current == SwapStatus::Accepted.as_str() {
        Ok(())
    } else {
        Err(ApiError::Conflict(format!(
            "Cannot cancel swap in status {current}"
        )))
    }
}

/// Completion requires an accepted swap.
pub fn ensure_completable(current: &str) -> Result<(), ApiError> {
    if current == SwapStatus::Accepted.as_str() {
        Ok(())
    } else {
        Err(ApiError::Conflict(format!(
            "Cannot complete swap in status {current}"
        )))
    }
}

pub fn validate_rating(rating: i64) -> Result<(), ApiError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ApiError::Validation("Rating must be between 1 and 5".into()))
    }
}

// -----------------------------------------------------------------------------
// Request/Response Types
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateSwapRequest {
    pub to_user_id: String,
    pub skill_offered_id: String,
    pub skill_wanted_id: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub preferred_time: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct SwapParticipant {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SwapResponse {
    pub id: String,
    pub from_user: SwapParticipant,
    pub to_user: SwapParticipant,
    pub skill_offered: String,
    pub skill_wanted: String,
    pub status: String,
    pub duration: String,
    pub preferred_time: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SwapDetail> for SwapResponse {
    fn from(d: SwapDetail) -> Self {
        Self {
            id: d.id,
            from_user: SwapParticipant {
                id: d.from_user_id,
                name: d.from_user_name,
                email: d.from_user_email,
            },
            to_user: SwapParticipant {
                id: d.to_user_id,
                name: d.to_user_name,
                email: d.to_user_email,
            },
            skill_offered: d.skill_offered,
            skill_wanted: d.skill_wanted,
            status: d.status,
            duration: d.duration,
            preferred_time: d.preferred_time,
            message: d.message,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

fn is_participant(swap: &SwapRequest, user_id: &str) -> bool {
    swap.from_user_id == user_id || swap.to_user_id == user_id
}

// -----------------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------------

/// Swaps the current user participates in, newest first.
pub async fn my_swaps(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<SwapResponse>>, ApiError> {
    let swaps = state.db.swaps_for_user(&auth.user.id).await?;
    Ok(Json(swaps.into_iter().map(Into::into).collect()))
}

/// Propose a swap to another user.
pub async fn create_swap(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateSwapRequest>,
) -> Result<Json<SwapRequest>, ApiError> {
    if req.to_user_id == auth.user.id {
        return Err(ApiError::BadRequest("Cannot swap with yourself".into()));
    }

    let to_user = state
        .db
        .find_user_by_id(&req.to_user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    if to_user.is_banned {
        return Err(ApiError::BadRequest("User is not available".into()));
    }

    state
        .db
        .find_skill_by_id(&req.skill_offered_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Offered skill not found".into()))?;
    state
        .db
        .find_skill_by_id(&req.skill_wanted_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Wanted skill not found".into()))?;

    let swap = state
        .db
        .create_swap_request(
            &auth.user.id,
            &req.to_user_id,
            &req.skill_offered_id,
            &req.skill_wanted_id,
            &req.duration,
            &req.preferred_time,
            &req.message,
        )
        .await?;

    Ok(Json(swap))
}

/// Accept or reject a pending request (recipient only). Accepting creates
/// the backing session.
pub async fn respond_to_swap(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(swap_id): Path<String>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<SwapRequest>, ApiError> {
    let swap = state
        .db
        .find_swap_by_id(&swap_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap not found".into()))?;

    if swap.to_user_id != auth.user.id {
        return Err(ApiError::Forbidden(
            "Only the recipient can respond to a swap".into(),
        ));
    }

    let next = respond_transition(&swap.status, &req.action)?;
    state.db.update_swap_status(&swap.id, next.as_str()).await?;

    if next == SwapStatus::Accepted {
        state.db.create_session(&swap.id, None).await?;
    }

    let swap = state
        .db
        .find_swap_by_id(&swap.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap not found".into()))?;
    Ok(Json(swap))
}

/// Cancel a pending or accepted swap (either participant).
pub async fn cancel_swap(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(swap_id): Path<String>,
) -> Result<Json<SwapRequest>, ApiError> {
    let swap = state
        .db
        .find_swap_by_id(&swap_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap not found".into()))?;

    if !is_participant(&swap, &auth.user.id) {
        return Err(ApiError::Forbidden("Not a participant of this swap".into()));
    }

    cancel_transition(&swap.status)?;
    state
        .db
        .update_swap_status(&swap.id, SwapStatus::Cancelled.as_str())
        .await?;

    let swap = state
        .db
        .find_swap_by_id(&swap.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap not found".into()))?;
    Ok(Json(swap))
}

/// Mark an accepted swap as completed (either participant).
pub async fn complete_swap(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(swap_id): Path<String>,
) -> Result<Json<SwapRequest>, ApiError> {
    let swap = state
        .db
        .find_swap_by_id(&swap_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap not found".into()))?;

    if !is_participant(&swap, &auth.user.id) {
        return Err(ApiError::Forbidden("Not a participant of this swap".into()));
    }

    ensure_completable(&swap.status)?;

    if state.db.find_session_by_swap(&swap.id).await?.is_none() {
        state.db.create_session(&swap.id, None).await?;
    }
    state.db.complete_swap(&swap.id).await?;

    let swap = state
        .db
        .find_swap_by_id(&swap.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap not found".into()))?;
    Ok(Json(swap))
}

/// Rate a completed session (each participant once). The rating lands on
/// the other participant's aggregate.
pub async fn rate_swap(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(swap_id): Path<String>,
    Json(req): Json<RateRequest>,
) -> Result<Json<crate::db::SwapRating>, ApiError> {
    validate_rating(req.rating)?;

    let swap = state
        .db
        .find_swap_by_id(&swap_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap not found".into()))?;

    if !is_participant(&swap, &auth.user.id) {
        return Err(ApiError::Forbidden("Not a participant of this swap".into()));
    }
    if swap.status != SwapStatus::Completed.as_str() {
        return Err(ApiError::Conflict(
            "Only completed swaps can be rated".into(),
        ));
    }

    let session = state
        .db
        .find_session_by_swap(&swap.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".into()))?;

    if state
        .db
        .find_rating(&session.id, &auth.user.id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Swap already rated".into()));
    }

    let rating = state
        .db
        .create_rating(&session.id, &auth.user.id, req.rating, &req.comment)
        .await?;

    let ratee = if swap.from_user_id == auth.user.id {
        &swap.to_user_id
    } else {
        &swap.from_user_id
    };
    state.db.refresh_user_rating(ratee).await?;

    Ok(Json(rating))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respond_only_from_pending() {
        assert_eq!(
            respond_transition("pending", "accept").unwrap(),
            SwapStatus::Accepted
        );
        assert_eq!(
            respond_transition("pending", "reject").unwrap(),
            SwapStatus::Rejected
        );
        assert!(matches!(
            respond_transition("accepted", "accept"),
            Err(ApiError::Conflict(_))
        ));
        assert!(matches!(
            respond_transition("pending", "maybe"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn cancel_only_before_completion() {
        assert!(cancel_transition("pending").is_ok());
        assert!(cancel_transition("accepted").is_ok());
        assert!(matches!(
            cancel_transition("completed"),
            Err(ApiError::Conflict(_))
        ));
        assert!(matches!(
            cancel_transition("cancelled"),
            Err(ApiError::Conflict(_))
        ));
    }

    #[test]
    fn complete_only_from_accepted() {
        assert!(ensure_completable("accepted").is_ok());
        assert!(matches!(
            ensure_completable("pending"),
            Err(ApiError::Conflict(_))
        ));
    }

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn invalid_status_string_is_rejected() {
        assert!(SwapStatus::parse("in_progress").is_err());
        assert_eq!(SwapStatus::parse("cancelled").unwrap().as_str(), "cancelled");
    }
}
