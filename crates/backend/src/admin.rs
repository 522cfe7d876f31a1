// =============================================================================
// SkillSwap Backend - Admin Console (moderation actions, management views)
// =============================================================================
// Table of Contents:
// 1. Moderation Actions (ban, resolve, bulk moderate, swap override)
// 2. User Management Handlers
// 3. Platform Message Handlers
// 4. Report Handlers
// 5. Skill & Swap Monitoring Handlers
// 6. Dashboard & Enhanced Reports
// =============================================================================
// Every handler takes the resolved AdminUser explicitly. The swap "modify"
// override bypasses the swap state machine; it demands a justification and
// logs under the `moderation_override` target.
// =============================================================================

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{hash_password, AdminUser, AuthUser};
use crate::db::{
    AdminUserChanges, Database, PlatformMessage, SkillReportDetail, SkillWithCounts, User,
    UserReportDetail,
};
use crate::error::ApiError;
use crate::reports::{SkillReportStatus, UserReportStatus};
use crate::stats;
use crate::swaps::{cancel_transition, SwapResponse, SwapStatus};
use crate::AppState;

// -----------------------------------------------------------------------------
// 1. Moderation Actions
// -----------------------------------------------------------------------------

/// Ban or unban an account as a single state transition.
pub async fn apply_ban(
    db: &Database,
    admin_id: &str,
    user_id: &str,
    is_banned: bool,
    ban_reason: &str,
) -> Result<User, ApiError> {
    db.set_user_ban(user_id, is_banned, ban_reason, admin_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

/// Resolve a user report. A terminal status stamps resolved_by/resolved_at;
/// a non-terminal one leaves them untouched.
pub async fn resolve_user_report(
    db: &Database,
    admin_id: &str,
    report_id: &str,
    status: Option<&str>,
    admin_notes: Option<&str>,
) -> Result<UserReportDetail, ApiError> {
    let existing = db
        .find_user_report(report_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Report not found".into()))?;

    let status = UserReportStatus::parse(status.unwrap_or(&existing.status))?;
    let resolution = status
        .is_terminal()
        .then(|| (admin_id, Utc::now()));

    db.update_user_report_status(report_id, status.as_str(), admin_notes, resolution)
        .await?;

    db.find_user_report(report_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Report not found".into()))
}

/// Resolve a skill report (same contract as the user report variant).
pub async fn resolve_skill_report(
    db: &Database,
    admin_id: &str,
    report_id: &str,
    status: Option<&str>,
    admin_notes: Option<&str>,
) -> Result<SkillReportDetail, ApiError> {
    let existing = db
        .find_skill_report(report_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Report not found".into()))?;

    let status = SkillReportStatus::parse(status.unwrap_or(&existing.status))?;
    let resolution = status
        .is_terminal()
        .then(|| (admin_id, Utc::now()));

    db.update_skill_report_status(report_id, status.as_str(), admin_notes, resolution)
        .await?;

    db.find_skill_report(report_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Report not found".into()))
}

/// Approve or reject a skill, closing all of its pending reports with one
/// resolution. Returns the skill name and the number of reports closed.
pub async fn moderate_skill(
    db: &Database,
    admin_id: &str,
    skill_id: &str,
    action: &str,
    reason: &str,
) -> Result<(String, u64), ApiError> {
    let (status, notes) = match action {
        "approve" => (SkillReportStatus::Approved, format!("Skill approved: {reason}")),
        "reject" => (
            SkillReportStatus::SkillRemoved,
            format!("Skill rejected: {reason}"),
        ),
        _ => {
            return Err(ApiError::BadRequest(format!(
                "Invalid action: {action}. Use \"approve\" or \"reject\"."
            )))
        }
    };

    let skill = db
        .find_skill_by_id(skill_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Skill not found".into()))?;

    let closed = db
        .close_pending_skill_reports(skill_id, status.as_str(), &notes, admin_id)
        .await?;

    Ok((skill.name, closed))
}

/// Admin cancel of a pending/accepted swap; participants are notified via a
/// platform message.
pub async fn override_cancel_swap(
    db: &Database,
    admin_id: &str,
    swap_id: &str,
    reason: &str,
) -> Result<(), ApiError> {
    let swap = db
        .find_swap_by_id(swap_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap not found".into()))?;

    cancel_transition(&swap.status)?;
    db.update_swap_status(swap_id, SwapStatus::Cancelled.as_str())
        .await?;

    db.create_message(
        "Swap Cancelled by Admin",
        &format!(
            "Your swap (ID: {swap_id}) has been cancelled by an administrator. Reason: {reason}"
        ),
        "notification",
        true,
        admin_id,
    )
    .await?;

    Ok(())
}

/// Escape hatch: free-form overwrite of a swap's status/duration/time with
/// no transition validation. Requires a justification and is logged apart
/// from normal transitions.
pub async fn override_modify_swap(
    db: &Database,
    admin_id: &str,
    swap_id: &str,
    reason: &str,
    new_status: Option<&str>,
    new_duration: Option<&str>,
    new_preferred_time: Option<&str>,
) -> Result<(), ApiError> {
    if reason.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "A justification is required to modify a swap".into(),
        ));
    }
    if let Some(status) = new_status {
        SwapStatus::parse(status)?;
    }

    let swap = db
        .find_swap_by_id(swap_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap not found".into()))?;

    tracing::warn!(
        target: "moderation_override",
        swap_id,
        admin_id,
        reason,
        old_status = %swap.status,
        new_status = new_status.unwrap_or(&swap.status),
        "swap modified outside the state machine"
    );

    db.admin_modify_swap(swap_id, new_status, new_duration, new_preferred_time)
        .await?;
    Ok(())
}

// -----------------------------------------------------------------------------
// Message type
// -----------------------------------------------------------------------------

const MESSAGE_TYPES: &[&str] = &[
    "announcement",
    "feature_update",
    "downtime_alert",
    "maintenance",
    "notification",
    "general",
];

fn validate_message_type(message_type: &str) -> Result<(), ApiError> {
    if MESSAGE_TYPES.contains(&message_type) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Invalid message type: {message_type}"
        )))
    }
}

// -----------------------------------------------------------------------------
// Response Types
// -----------------------------------------------------------------------------

/// Account as the admin console sees it: moderation state plus rollups.
#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub location: String,
    pub rating: f64,
    pub completed_swaps: i64,
    pub is_admin: bool,
    pub is_banned: bool,
    pub ban_reason: String,
    pub ban_date: Option<DateTime<Utc>>,
    pub banned_by: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub total_swaps: i64,
    pub total_reports_received: i64,
    pub total_reports_made: i64,
}

async fn admin_user_response(db: &Database, user: User) -> Result<AdminUserResponse, ApiError> {
    let total_swaps = db.swap_count_for_user(&user.id).await?;
    let total_reports_received = db.reports_received_count(&user.id).await?;
    let total_reports_made = db.reports_made_count(&user.id).await?;

    Ok(AdminUserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        bio: user.bio,
        location: user.location,
        rating: user.rating,
        completed_swaps: user.completed_swaps,
        is_admin: user.is_admin,
        is_banned: user.is_banned,
        ban_reason: user.ban_reason,
        ban_date: user.ban_date,
        banned_by: user.banned_by,
        last_login: user.last_login,
        created_at: user.created_at,
        total_swaps,
        total_reports_received,
        total_reports_made,
    })
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    #[serde(flatten)]
    pub message: PlatformMessage,
    pub created_by_name: String,
}

async fn message_response(db: &Database, message: PlatformMessage) -> Result<MessageResponse, ApiError> {
    let created_by_name = db
        .find_user_by_id(&message.created_by)
        .await?
        .map(|u| u.full_name())
        .unwrap_or_default();
    Ok(MessageResponse {
        message,
        created_by_name,
    })
}

// -----------------------------------------------------------------------------
// 2. User Management Handlers
// -----------------------------------------------------------------------------

/// List all users for admin management.
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<AdminUserResponse>>, ApiError> {
    let users = state.db.list_all_users().await?;
    let mut out = Vec::with_capacity(users.len());
    for user in users {
        out.push(admin_user_response(&state.db, user).await?);
    }
    Ok(Json(out))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Create an account (including other admins) from the console.
pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<AdminUserResponse>), ApiError> {
    if state.db.find_user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }
    if state.db.find_user_by_username(&req.username).await?.is_some() {
        return Err(ApiError::Conflict("Username already taken".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let id = uuid::Uuid::new_v4().to_string();
    let user = state
        .db
        .create_user(
            &id,
            &req.username,
            &req.email,
            &password_hash,
            &req.first_name,
            &req.last_name,
            req.is_admin,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(admin_user_response(&state.db, user).await?),
    ))
}

/// Get one user with moderation rollups.
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<AdminUserResponse>, ApiError> {
    let user = state
        .db
        .find_user_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(admin_user_response(&state.db, user).await?))
}

/// Partial admin update of a user's fields.
pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
    Json(changes): Json<AdminUserChanges>,
) -> Result<Json<AdminUserResponse>, ApiError> {
    state
        .db
        .find_user_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    state.db.admin_update_user(&user_id, &changes).await?;

    let user = state
        .db
        .find_user_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(admin_user_response(&state.db, user).await?))
}

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub is_banned: bool,
    #[serde(default)]
    pub ban_reason: String,
}

/// Ban or unban a user.
pub async fn ban_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
    Json(req): Json<BanRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = apply_ban(
        &state.db,
        &admin.user.id,
        &user_id,
        req.is_banned,
        &req.ban_reason,
    )
    .await?;

    let verb = if req.is_banned { "banned" } else { "unbanned" };
    Ok(Json(json!({
        "message": format!("User {verb} successfully"),
        "user": admin_user_response(&state.db, user).await?,
    })))
}

// -----------------------------------------------------------------------------
// 3. Platform Message Handlers
// -----------------------------------------------------------------------------

/// Active messages, visible to any authenticated user.
pub async fn active_messages(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let messages = state.db.list_active_messages().await?;
    let mut out = Vec::with_capacity(messages.len());
    for message in messages {
        out.push(message_response(&state.db, message).await?);
    }
    Ok(Json(out))
}

/// All messages, newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let messages = state.db.list_messages().await?;
    let mut out = Vec::with_capacity(messages.len());
    for message in messages {
        out.push(message_response(&state.db, message).await?);
    }
    Ok(Json(out))
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub title: String,
    pub content: String,
    #[serde(default = "default_message_type")]
    pub message_type: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_message_type() -> String {
    "general".into()
}

fn default_true() -> bool {
    true
}

/// Publish a platform message.
pub async fn create_message(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(req): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    validate_message_type(&req.message_type)?;

    let message = state
        .db
        .create_message(
            &req.title,
            &req.content,
            &req.message_type,
            req.is_active,
            &admin.user.id,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(message_response(&state.db, message).await?),
    ))
}

/// Get one message.
pub async fn get_message(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state
        .db
        .find_message_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Message not found".into()))?;
    Ok(Json(message_response(&state.db, message).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub message_type: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial message update.
pub async fn update_message(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateMessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Some(message_type) = &req.message_type {
        validate_message_type(message_type)?;
    }

    let updated = state
        .db
        .update_message(
            &id,
            req.title.as_deref(),
            req.content.as_deref(),
            req.message_type.as_deref(),
            req.is_active,
        )
        .await?;
    if !updated {
        return Err(ApiError::NotFound("Message not found".into()));
    }

    let message = state
        .db
        .find_message_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Message not found".into()))?;
    Ok(Json(message_response(&state.db, message).await?))
}

/// Delete a message.
pub async fn delete_message(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_message(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Message not found".into()))
    }
}

// -----------------------------------------------------------------------------
// 4. Report Handlers
// -----------------------------------------------------------------------------

/// All user reports, newest first.
pub async fn list_user_reports(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserReportDetail>>, ApiError> {
    Ok(Json(state.db.list_user_reports().await?))
}

/// One user report.
pub async fn get_user_report(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<UserReportDetail>, ApiError> {
    state
        .db
        .find_user_report(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Report not found".into()))
}

#[derive(Debug, Deserialize)]
pub struct ResolveReportRequest {
    pub status: Option<String>,
    pub admin_notes: Option<String>,
}

/// Update a user report's workflow state.
pub async fn patch_user_report(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<ResolveReportRequest>,
) -> Result<Json<UserReportDetail>, ApiError> {
    let report = resolve_user_report(
        &state.db,
        &admin.user.id,
        &id,
        req.status.as_deref(),
        req.admin_notes.as_deref(),
    )
    .await?;
    Ok(Json(report))
}

/// All skill reports, newest first.
pub async fn list_skill_reports(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<SkillReportDetail>>, ApiError> {
    Ok(Json(state.db.list_skill_reports().await?))
}

/// One skill report.
pub async fn get_skill_report(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<SkillReportDetail>, ApiError> {
    state
        .db
        .find_skill_report(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Report not found".into()))
}

/// Update a skill report's workflow state.
pub async fn patch_skill_report(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<ResolveReportRequest>,
) -> Result<Json<SkillReportDetail>, ApiError> {
    let report = resolve_skill_report(
        &state.db,
        &admin.user.id,
        &id,
        req.status.as_deref(),
        req.admin_notes.as_deref(),
    )
    .await?;
    Ok(Json(report))
}

// -----------------------------------------------------------------------------
// 5. Skill & Swap Monitoring Handlers
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SkillReportSummary {
    pub id: String,
    pub reporter: String,
    pub report_type: String,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReportedSkillDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub total_reports: i64,
    pub pending_reports: i64,
    pub reports: Vec<SkillReportSummary>,
}

#[derive(Debug, Serialize)]
pub struct AdminSkillsResponse {
    pub total_skills: i64,
    pub skills: Vec<SkillWithCounts>,
    pub reported_skills: Vec<ReportedSkillDetail>,
}

/// Catalog with report rollups and the reported-skill queue.
pub async fn list_skills(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<AdminSkillsResponse>, ApiError> {
    let skills = state.db.skills_with_counts().await?;
    let total_skills = skills.len() as i64;

    let mut reported_skills = Vec::new();
    for skill in state.db.reported_skills().await? {
        // Show the last 5 reports per skill
        let reports = state
            .db
            .skill_reports_for_skill(&skill.id, 5)
            .await?
            .into_iter()
            .map(|r| SkillReportSummary {
                id: r.id,
                reporter: r.reporter_name,
                report_type: r.report_type,
                description: r.description,
                status: r.status,
                created_at: r.created_at,
            })
            .collect();

        reported_skills.push(ReportedSkillDetail {
            id: skill.id,
            name: skill.name,
            description: skill.description,
            total_reports: skill.report_count,
            pending_reports: skill.pending_reports,
            reports,
        });
    }

    Ok(Json(AdminSkillsResponse {
        total_skills,
        skills,
        reported_skills,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ModerateSkillRequest {
    pub skill_id: String,
    pub action: String,
    #[serde(default)]
    pub reason: String,
}

/// Approve or reject a skill, closing all its pending reports.
pub async fn moderate_skill_handler(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(req): Json<ModerateSkillRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (skill_name, reports_closed) = moderate_skill(
        &state.db,
        &admin.user.id,
        &req.skill_id,
        &req.action,
        &req.reason,
    )
    .await?;

    let verb = if req.action == "approve" { "approved" } else { "rejected" };
    Ok(Json(json!({
        "message": format!("Skill \"{skill_name}\" {verb} successfully"),
        "reason": req.reason,
        "reports_closed": reports_closed,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SwapMonitorQuery {
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct SwapMonitorResponse {
    pub swaps: Vec<SwapResponse>,
    pub pagination: Pagination,
    pub statistics: stats::SwapStatusCounts,
}

/// Paginated swap monitor with per-status statistics over all swaps.
pub async fn monitor_swaps(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<SwapMonitorQuery>,
) -> Result<Json<SwapMonitorResponse>, ApiError> {
    let status = match &query.status {
        Some(s) if !s.is_empty() => Some(SwapStatus::parse(s)?.as_str()),
        _ => None,
    };

    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, 100);
    let offset = (page - 1) * page_size;

    let swaps = state.db.list_swaps(status, page_size, offset).await?;
    let total = state.db.count_swaps(status).await?;
    let statistics = stats::swap_status_counts(&state.db).await?;

    Ok(Json(SwapMonitorResponse {
        swaps: swaps.into_iter().map(Into::into).collect(),
        pagination: Pagination {
            page,
            page_size,
            total,
            total_pages: (total + page_size - 1) / page_size,
        },
        statistics,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SwapOverrideRequest {
    pub swap_id: String,
    pub action: String,
    #[serde(default)]
    pub reason: String,
    pub new_status: Option<String>,
    pub new_duration: Option<String>,
    pub new_preferred_time: Option<String>,
}

/// Admin cancel/modify of a swap.
pub async fn override_swap(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(req): Json<SwapOverrideRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match req.action.as_str() {
        "cancel" => {
            override_cancel_swap(&state.db, &admin.user.id, &req.swap_id, &req.reason).await?;
            Ok(Json(json!({
                "message": format!("Swap {} cancelled successfully", req.swap_id),
                "reason": req.reason,
            })))
        }
        "modify" => {
            override_modify_swap(
                &state.db,
                &admin.user.id,
                &req.swap_id,
                &req.reason,
                req.new_status.as_deref(),
                req.new_duration.as_deref(),
                req.new_preferred_time.as_deref(),
            )
            .await?;
            Ok(Json(json!({
                "message": format!("Swap {} modified successfully", req.swap_id),
                "changes": {
                    "status": req.new_status,
                    "duration": req.new_duration,
                    "preferred_time": req.new_preferred_time,
                },
            })))
        }
        other => Err(ApiError::BadRequest(format!(
            "Invalid action: {other}. Use \"cancel\" or \"modify\"."
        ))),
    }
}

// -----------------------------------------------------------------------------
// 6. Dashboard & Enhanced Reports
// -----------------------------------------------------------------------------

/// Admin dashboard with statistics and overview.
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<stats::DashboardStats>, ApiError> {
    Ok(Json(stats::dashboard(&state.db).await?))
}

/// Detailed swap statistics.
pub async fn swap_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<stats::SwapStats>, ApiError> {
    Ok(Json(stats::swap_stats(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct EnhancedReportQuery {
    #[serde(rename = "type", default = "default_report_type")]
    pub report_type: String,
}

fn default_report_type() -> String {
    "overview".into()
}

/// Enhanced analytics, dispatched on the `type` query parameter.
pub async fn enhanced_reports(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<EnhancedReportQuery>,
) -> Result<Response, ApiError> {
    let response = match query.report_type.as_str() {
        "overview" => Json(stats::overview(&state.db).await?).into_response(),
        "user_activity" => Json(stats::user_activity(&state.db).await?).into_response(),
        "swap_analytics" => Json(stats::swap_analytics(&state.db).await?).into_response(),
        "moderation" => Json(stats::moderation(&state.db).await?).into_response(),
        other => {
            return Err(ApiError::BadRequest(format!(
                "Invalid report type: {other}"
            )))
        }
    };
    Ok(response)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    async fn make_user(db: &Database, username: &str) -> User {
        let id = uuid::Uuid::new_v4().to_string();
        db.create_user(
            &id,
            username,
            &format!("{username}@example.com"),
            "hash",
            "Test",
            username,
            false,
        )
        .await
        .unwrap()
    }

    async fn make_swap(db: &Database, from: &User, to: &User) -> crate::db::SwapRequest {
        let offered = db.create_skill("Guitar", "other", "").await.unwrap();
        let wanted = db.create_skill("Cooking", "other", "").await.unwrap();
        db.create_swap_request(&from.id, &to.id, &offered.id, &wanted.id, "", "", "")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn ban_then_unban_resets_all_four_fields() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let target = make_user(&db, "target").await;

        let banned = apply_ban(&db, &admin.id, &target.id, true, "spam").await.unwrap();
        assert!(banned.is_banned);
        assert_eq!(banned.ban_reason, "spam");
        assert!(banned.ban_date.is_some());
        assert!(banned.banned_by.is_some());

        let unbanned = apply_ban(&db, &admin.id, &target.id, false, "").await.unwrap();
        assert!(!unbanned.is_banned);
        assert_eq!(unbanned.ban_reason, "");
        assert!(unbanned.ban_date.is_none());
        assert!(unbanned.banned_by.is_none());
    }

    #[tokio::test]
    async fn ban_unknown_user_is_not_found() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let result = apply_ban(&db, &admin.id, "missing", true, "x").await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn terminal_resolution_stamps_resolver_and_time() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let reporter = make_user(&db, "reporter").await;
        let target = make_user(&db, "target").await;
        let report = db
            .create_user_report(&reporter.id, &target.id, "spam", "desc", "")
            .await
            .unwrap();

        let resolved =
            resolve_user_report(&db, &admin.id, &report.id, Some("resolved"), Some("done"))
                .await
                .unwrap();
        assert_eq!(resolved.status, "resolved");
        assert_eq!(resolved.resolved_by.as_deref(), Some(admin.id.as_str()));
        let resolved_at = resolved.resolved_at.unwrap();
        assert!(resolved_at >= resolved.created_at);
        assert_eq!(resolved.admin_notes, "done");
    }

    #[tokio::test]
    async fn non_terminal_resolution_leaves_audit_fields_null() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let reporter = make_user(&db, "reporter").await;
        let target = make_user(&db, "target").await;
        let report = db
            .create_user_report(&reporter.id, &target.id, "spam", "desc", "")
            .await
            .unwrap();

        let updated =
            resolve_user_report(&db, &admin.id, &report.id, Some("investigating"), None)
                .await
                .unwrap();
        assert_eq!(updated.status, "investigating");
        assert!(updated.resolved_by.is_none());
        assert!(updated.resolved_at.is_none());
    }

    #[tokio::test]
    async fn invalid_report_status_is_bad_request() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let reporter = make_user(&db, "reporter").await;
        let target = make_user(&db, "target").await;
        let report = db
            .create_user_report(&reporter.id, &target.id, "spam", "desc", "")
            .await
            .unwrap();

        let result =
            resolve_user_report(&db, &admin.id, &report.id, Some("escalated"), None).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn bulk_moderation_closes_every_pending_report() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let reporter = make_user(&db, "reporter").await;
        let skill = db.create_skill("Guitar", "other", "").await.unwrap();
        for i in 0..3 {
            db.create_skill_report(&reporter.id, &skill.id, "spam", &format!("report {i}"))
                .await
                .unwrap();
        }

        let (name, closed) =
            moderate_skill(&db, &admin.id, &skill.id, "reject", "inappropriate").await.unwrap();
        assert_eq!(name, "Guitar");
        assert_eq!(closed, 3);

        for report in db.list_skill_reports().await.unwrap() {
            assert_eq!(report.status, "skill_removed");
            assert_eq!(report.admin_notes, "Skill rejected: inappropriate");
            assert_eq!(report.resolved_by.as_deref(), Some(admin.id.as_str()));
            assert!(report.resolved_at.is_some());
        }
    }

    #[tokio::test]
    async fn bulk_moderation_validates_action_and_skill() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let skill = db.create_skill("Guitar", "other", "").await.unwrap();

        let bad_action = moderate_skill(&db, &admin.id, &skill.id, "delete", "").await;
        assert!(matches!(bad_action, Err(ApiError::BadRequest(_))));

        let bad_skill = moderate_skill(&db, &admin.id, "missing", "approve", "").await;
        assert!(matches!(bad_skill, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn admin_cancel_rejected_for_completed_swap() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        let swap = make_swap(&db, &alice, &bob).await;
        db.update_swap_status(&swap.id, "completed").await.unwrap();

        let result = override_cancel_swap(&db, &admin.id, &swap.id, "cleanup").await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));

        let swap = db.find_swap_by_id(&swap.id).await.unwrap().unwrap();
        assert_eq!(swap.status, "completed");
    }

    #[tokio::test]
    async fn admin_cancel_emits_notification_message() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        let swap = make_swap(&db, &alice, &bob).await;

        override_cancel_swap(&db, &admin.id, &swap.id, "dispute").await.unwrap();

        let swap = db.find_swap_by_id(&swap.id).await.unwrap().unwrap();
        assert_eq!(swap.status, "cancelled");

        let messages = db.list_active_messages().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type, "notification");
        assert!(messages[0].content.contains("dispute"));
    }

    #[tokio::test]
    async fn modify_requires_justification() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        let swap = make_swap(&db, &alice, &bob).await;

        let result =
            override_modify_swap(&db, &admin.id, &swap.id, "  ", Some("accepted"), None, None)
                .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn modify_bypasses_the_state_machine() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        let swap = make_swap(&db, &alice, &bob).await;
        db.update_swap_status(&swap.id, "completed").await.unwrap();

        // completed -> pending is not a legal transition, but the escape
        // hatch allows it
        override_modify_swap(
            &db,
            &admin.id,
            &swap.id,
            "support ticket 1234",
            Some("pending"),
            Some("2 hours"),
            None,
        )
        .await
        .unwrap();

        let swap = db.find_swap_by_id(&swap.id).await.unwrap().unwrap();
        assert_eq!(swap.status, "pending");
        assert_eq!(swap.duration, "2 hours");

        let invalid =
            override_modify_swap(&db, &admin.id, &swap.id, "ticket", Some("bogus"), None, None)
                .await;
        assert!(matches!(invalid, Err(ApiError::BadRequest(_))));
    }
}
