// =============================================================================
// SkillSwap Backend - CSV Report Exports
// =============================================================================
// Table of Contents:
// 1. Row Fetching (flat per-record views)
// 2. CSV Builders (one fixed header per export type)
// 3. Download Handlers
// =============================================================================
// Rows follow the underlying query order (reverse-chronological by creation
// time). Missing optional values render as the empty string. Free-text
// fields in log-style exports are truncated to 100 characters.
// =============================================================================

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::AdminUser;
use crate::db::Database;
use crate::error::ApiError;
use crate::reports::ReportKind;
use crate::AppState;

const TEXT_FIELD_LIMIT: usize = 100;

// -----------------------------------------------------------------------------
// 1. Row Fetching
// -----------------------------------------------------------------------------

/// Per-user activity rollup backing the user exports.
#[derive(Debug, sqlx::FromRow)]
struct UserActivityRow {
    id: String,
    username: String,
    email: String,
    full_name: String,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
    total_swaps: i64,
    completed_swaps: i64,
    cancelled_swaps: i64,
    rating: f64,
    reports_received: i64,
    reports_made: i64,
    is_banned: bool,
    ban_reason: String,
    skills_offered: i64,
    skills_wanted: i64,
}

async fn fetch_user_activity_rows(db: &Database) -> Result<Vec<UserActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, UserActivityRow>(
        r#"
        SELECT u.id, u.username, u.email,
               TRIM(u.first_name || ' ' || u.last_name) AS full_name,
               u.created_at, u.last_login,
               (SELECT COUNT(*) FROM swap_requests r
                 WHERE r.from_user_id = u.id OR r.to_user_id = u.id) AS total_swaps,
               (SELECT COUNT(*) FROM swap_requests r
                 WHERE (r.from_user_id = u.id OR r.to_user_id = u.id)
                   AND r.status = 'completed') AS completed_swaps,
               (SELECT COUNT(*) FROM swap_requests r
                 WHERE (r.from_user_id = u.id OR r.to_user_id = u.id)
                   AND r.status = 'cancelled') AS cancelled_swaps,
               u.rating,
               (SELECT COUNT(*) FROM user_reports
                 WHERE reported_user_id = u.id) AS reports_received,
               (SELECT COUNT(*) FROM user_reports
                 WHERE reporter_id = u.id) AS reports_made,
               u.is_banned, u.ban_reason,
               (SELECT COUNT(*) FROM user_skills us
                 WHERE us.user_id = u.id AND us.skill_type = 'offered') AS skills_offered,
               (SELECT COUNT(*) FROM user_skills us
                 WHERE us.user_id = u.id AND us.skill_type = 'wanted') AS skills_wanted
        FROM users u
        ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(db.pool())
    .await
}

/// Banned account with resolver name, backing the moderation log.
#[derive(Debug, sqlx::FromRow)]
struct BannedUserRow {
    full_name: String,
    banned_by: String,
    ban_date: Option<DateTime<Utc>>,
    ban_reason: String,
}

async fn fetch_banned_users(db: &Database) -> Result<Vec<BannedUserRow>, sqlx::Error> {
    sqlx::query_as::<_, BannedUserRow>(
        r#"
        SELECT TRIM(u.first_name || ' ' || u.last_name) AS full_name,
               COALESCE(TRIM(b.first_name || ' ' || b.last_name), 'System') AS banned_by,
               u.ban_date, u.ban_reason
        FROM users u
        LEFT JOIN users b ON u.banned_by = b.id
        WHERE u.is_banned = 1
        ORDER BY u.ban_date DESC
        "#,
    )
    .fetch_all(db.pool())
    .await
}

// -----------------------------------------------------------------------------
// 2. CSV Builders
// -----------------------------------------------------------------------------

fn fmt_dt(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn fmt_opt_dt(dt: &Option<DateTime<Utc>>) -> String {
    dt.as_ref().map(fmt_dt).unwrap_or_default()
}

/// Char-boundary-safe prefix of a free-text field.
fn truncate_text(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ApiError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Internal(format!("CSV not UTF-8: {e}")))
}

/// User activity report, one row per account.
pub async fn users_csv(db: &Database) -> Result<String, ApiError> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "User ID", "Username", "Email", "Full Name", "Join Date", "Last Login",
        "Total Swaps", "Completed Swaps", "Average Rating", "Reports Received",
        "Reports Made", "Is Banned", "Ban Reason",
    ])?;

    for row in fetch_user_activity_rows(db).await? {
        w.write_record([
            row.id,
            row.username,
            row.email,
            row.full_name,
            fmt_dt(&row.created_at),
            fmt_opt_dt(&row.last_login),
            row.total_swaps.to_string(),
            row.completed_swaps.to_string(),
            format!("{:.2}", row.rating),
            row.reports_received.to_string(),
            row.reports_made.to_string(),
            row.is_banned.to_string(),
            row.ban_reason,
        ])?;
    }
    finish(w)
}

/// Enhanced user activity report with cancellation and skill rollups.
pub async fn enhanced_users_csv(db: &Database) -> Result<String, ApiError> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "User ID", "Username", "Email", "Full Name", "Join Date", "Last Login",
        "Total Swaps", "Completed Swaps", "Cancelled Swaps", "Average Rating",
        "Reports Received", "Reports Made", "Is Banned", "Ban Reason",
        "Total Skills Offered", "Total Skills Wanted",
    ])?;

    for row in fetch_user_activity_rows(db).await? {
        w.write_record([
            row.id,
            row.username,
            row.email,
            row.full_name,
            fmt_dt(&row.created_at),
            fmt_opt_dt(&row.last_login),
            row.total_swaps.to_string(),
            row.completed_swaps.to_string(),
            row.cancelled_swaps.to_string(),
            format!("{:.2}", row.rating),
            row.reports_received.to_string(),
            row.reports_made.to_string(),
            row.is_banned.to_string(),
            row.ban_reason,
            row.skills_offered.to_string(),
            row.skills_wanted.to_string(),
        ])?;
    }
    finish(w)
}

/// Swap activity report, one row per request.
pub async fn swaps_csv(db: &Database) -> Result<String, ApiError> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "Swap ID", "From User", "To User", "Skill Offered", "Skill Wanted",
        "Status", "Duration", "Preferred Time", "Created At", "Updated At",
    ])?;

    for swap in db.list_swap_details().await? {
        w.write_record([
            swap.id,
            swap.from_user_name,
            swap.to_user_name,
            swap.skill_offered,
            swap.skill_wanted,
            swap.status,
            swap.duration,
            swap.preferred_time,
            fmt_dt(&swap.created_at),
            fmt_dt(&swap.updated_at),
        ])?;
    }
    finish(w)
}

/// Enhanced swap analytics report with session completion and ratings.
pub async fn enhanced_swaps_csv(db: &Database) -> Result<String, ApiError> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "Swap ID", "From User", "To User", "Skill Offered", "Skill Wanted",
        "Status", "Duration", "Preferred Time", "Created At", "Updated At",
        "Completion Date", "Rating Given", "Rating Received",
    ])?;

    for swap in db.list_swap_details().await? {
        let mut completion_date = String::new();
        let mut rating_given = String::new();
        let mut rating_received = String::new();

        if swap.status == "completed" {
            if let Some(session) = db.find_session_by_swap(&swap.id).await? {
                completion_date = fmt_opt_dt(&session.completed_at);
                if let Some(r) = db.find_rating(&session.id, &swap.from_user_id).await? {
                    rating_given = r.rating.to_string();
                }
                if let Some(r) = db.find_rating(&session.id, &swap.to_user_id).await? {
                    rating_received = r.rating.to_string();
                }
            }
        }

        w.write_record([
            swap.id,
            swap.from_user_name,
            swap.to_user_name,
            swap.skill_offered,
            swap.skill_wanted,
            swap.status,
            swap.duration,
            swap.preferred_time,
            fmt_dt(&swap.created_at),
            fmt_dt(&swap.updated_at),
            completion_date,
            rating_given,
            rating_received,
        ])?;
    }
    finish(w)
}

/// Report log: both report kinds, free text truncated, ids prefixed by kind.
pub async fn logs_csv(db: &Database) -> Result<String, ApiError> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "Report ID", "Type", "Reporter", "Reported User/Skill", "Report Type",
        "Description", "Status", "Admin Notes", "Resolved By", "Resolved At",
        "Created At",
    ])?;

    for report in db.list_user_reports().await? {
        let kind = ReportKind::UserReport;
        w.write_record([
            format!("{}-{}", kind.id_prefix(), report.id),
            kind.label().to_string(),
            report.reporter_name,
            report.reported_user_name,
            report.report_type,
            truncate_text(&report.description, TEXT_FIELD_LIMIT),
            report.status,
            truncate_text(&report.admin_notes, TEXT_FIELD_LIMIT),
            report.resolved_by_name.unwrap_or_default(),
            fmt_opt_dt(&report.resolved_at),
            fmt_dt(&report.created_at),
        ])?;
    }

    for report in db.list_skill_reports().await? {
        let kind = ReportKind::SkillReport;
        w.write_record([
            format!("{}-{}", kind.id_prefix(), report.id),
            kind.label().to_string(),
            report.reporter_name,
            report.skill_name,
            report.report_type,
            truncate_text(&report.description, TEXT_FIELD_LIMIT),
            report.status,
            truncate_text(&report.admin_notes, TEXT_FIELD_LIMIT),
            report.resolved_by_name.unwrap_or_default(),
            fmt_opt_dt(&report.resolved_at),
            fmt_dt(&report.created_at),
        ])?;
    }
    finish(w)
}

/// Moderation log: active bans plus every terminal report resolution.
pub async fn moderation_log_csv(db: &Database) -> Result<String, ApiError> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "Action Type", "Target", "Action By", "Action Date", "Reason/Notes",
        "Status", "Related Reports",
    ])?;

    for ban in fetch_banned_users(db).await? {
        w.write_record([
            "User Ban".to_string(),
            ban.full_name,
            ban.banned_by,
            fmt_opt_dt(&ban.ban_date),
            ban.ban_reason,
            "Active".to_string(),
            String::new(),
        ])?;
    }

    for report in db.list_user_reports().await? {
        if !matches!(report.status.as_str(), "resolved" | "dismissed") {
            continue;
        }
        w.write_record([
            "User Report Resolution".to_string(),
            report.reported_user_name,
            report.resolved_by_name.unwrap_or_else(|| "System".to_string()),
            fmt_opt_dt(&report.resolved_at),
            truncate_text(&report.admin_notes, TEXT_FIELD_LIMIT),
            report.status,
            format!("{}-{}", ReportKind::UserReport.id_prefix(), report.id),
        ])?;
    }

    for report in db.list_skill_reports().await? {
        if !matches!(report.status.as_str(), "approved" | "rejected" | "skill_removed") {
            continue;
        }
        w.write_record([
            "Skill Report Resolution".to_string(),
            report.skill_name,
            report.resolved_by_name.unwrap_or_else(|| "System".to_string()),
            fmt_opt_dt(&report.resolved_at),
            truncate_text(&report.admin_notes, TEXT_FIELD_LIMIT),
            report.status,
            format!("{}-{}", ReportKind::SkillReport.id_prefix(), report.id),
        ])?;
    }
    finish(w)
}

// -----------------------------------------------------------------------------
// 3. Download Handlers
// -----------------------------------------------------------------------------

fn csv_response(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Download one of the basic reports (users, swaps, logs) as CSV.
pub async fn download_report(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(kind): Path<String>,
) -> Result<Response, ApiError> {
    let (filename, body) = match kind.as_str() {
        "users" => ("user_activity_report.csv", users_csv(&state.db).await?),
        "swaps" => ("swap_activity_report.csv", swaps_csv(&state.db).await?),
        "logs" => ("report_logs.csv", logs_csv(&state.db).await?),
        _ => {
            return Err(ApiError::BadRequest(format!(
                "Invalid report kind: {kind}"
            )))
        }
    };
    Ok(csv_response(filename, body))
}

#[derive(Debug, Deserialize)]
pub struct EnhancedDownloadQuery {
    #[serde(rename = "type", default)]
    pub report_type: String,
}

/// Download one of the enhanced reports as CSV.
pub async fn download_enhanced_report(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<EnhancedDownloadQuery>,
) -> Result<Response, ApiError> {
    let (filename, body) = match query.report_type.as_str() {
        "" | "user_activity" => (
            "enhanced_user_activity_report.csv",
            enhanced_users_csv(&state.db).await?,
        ),
        "swap_analytics" => (
            "swap_analytics_report.csv",
            enhanced_swaps_csv(&state.db).await?,
        ),
        "moderation_log" => (
            "moderation_log_report.csv",
            moderation_log_csv(&state.db).await?,
        ),
        other => {
            return Err(ApiError::BadRequest(format!(
                "Invalid report type: {other}"
            )))
        }
    };
    Ok(csv_response(filename, body))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn test_db() -> Database {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    async fn make_user(db: &Database, username: &str) -> crate::db::User {
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

    #[tokio::test]
    async fn empty_users_export_is_header_only() {
        let db = test_db().await;
        let csv = users_csv(&db).await.unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("User ID,Username,Email,Full Name"));
    }

    #[tokio::test]
    async fn users_export_has_one_row_per_account() {
        let db = test_db().await;
        make_user(&db, "alice").await;
        make_user(&db, "bob").await;

        let csv = users_csv(&db).await.unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[tokio::test]
    async fn missing_last_login_renders_as_empty_string() {
        let db = test_db().await;
        make_user(&db, "alice").await;

        let csv = users_csv(&db).await.unwrap();
        let row = csv.lines().nth(1).unwrap();
        // Join Date is set, Last Login is the empty field right after it
        assert!(row.contains(",,"));
        assert!(!row.contains("Never"));
    }

    #[tokio::test]
    async fn log_export_truncates_long_descriptions() {
        let db = test_db().await;
        let reporter = make_user(&db, "reporter").await;
        let target = make_user(&db, "target").await;

        let long = "x".repeat(150);
        db.create_user_report(&reporter.id, &target.id, "spam", &long, "")
            .await
            .unwrap();

        let csv = logs_csv(&db).await.unwrap();
        assert!(csv.contains(&"x".repeat(100)));
        assert!(!csv.contains(&"x".repeat(101)));
    }

    #[tokio::test]
    async fn log_export_prefixes_ids_by_kind() {
        let db = test_db().await;
        let reporter = make_user(&db, "reporter").await;
        let target = make_user(&db, "target").await;
        let skill = db.create_skill("Guitar", "other", "").await.unwrap();

        db.create_user_report(&reporter.id, &target.id, "spam", "d", "")
            .await
            .unwrap();
        db.create_skill_report(&reporter.id, &skill.id, "spam", "d")
            .await
            .unwrap();

        let csv = logs_csv(&db).await.unwrap();
        assert!(csv.contains("UR-"));
        assert!(csv.contains("SR-"));
        assert_eq!(csv.lines().count(), 3);
    }

    #[tokio::test]
    async fn moderation_log_lists_bans_and_terminal_resolutions_only() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let reporter = make_user(&db, "reporter").await;
        let target = make_user(&db, "target").await;

        db.set_user_ban(&target.id, true, "spam", &admin.id)
            .await
            .unwrap();
        let open = db
            .create_user_report(&reporter.id, &target.id, "spam", "open one", "")
            .await
            .unwrap();
        let closed = db
            .create_user_report(&reporter.id, &target.id, "harassment", "closed one", "")
            .await
            .unwrap();
        db.update_user_report_status(&closed.id, "resolved", None, Some((&admin.id, Utc::now())))
            .await
            .unwrap();
        // Keep the open report pending
        let _ = open;

        let csv = moderation_log_csv(&db).await.unwrap();
        assert!(csv.contains("User Ban"));
        assert!(csv.contains("User Report Resolution"));
        // header + ban + one resolution
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "é".repeat(120);
        let out = truncate_text(&s, 100);
        assert_eq!(out.chars().count(), 100);
    }

    #[tokio::test]
    async fn enhanced_swap_export_includes_ratings() {
        let db = test_db().await;
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        let guitar = db.create_skill("Guitar", "other", "").await.unwrap();
        let cooking = db.create_skill("Cooking", "other", "").await.unwrap();
        let swap = db
            .create_swap_request(&alice.id, &bob.id, &guitar.id, &cooking.id, "", "", "")
            .await
            .unwrap();
        db.update_swap_status(&swap.id, "accepted").await.unwrap();
        let session = db.create_session(&swap.id, None).await.unwrap();
        db.complete_swap(&swap.id).await.unwrap();
        db.create_rating(&session.id, &alice.id, 5, "").await.unwrap();
        db.create_rating(&session.id, &bob.id, 3, "").await.unwrap();

        let csv = enhanced_swaps_csv(&db).await.unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.ends_with("5,3"));
    }
}
