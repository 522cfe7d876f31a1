// =============================================================================
// SkillSwap Backend - Reporting & Aggregation Layer
// =============================================================================
// Table of Contents:
// 1. Payload Types (dashboard, swap stats, enhanced reports)
// 2. Helpers (rounding, zero-filled series)
// 3. Dashboard & Swap Statistics
// 4. Enhanced Reports (overview, user activity, swap analytics, moderation)
// =============================================================================
// Every function here is a read-only aggregation over the pool; none of them
// mutate the store. Monthly buckets are true calendar months (chrono Months),
// not 30-day offsets.
// =============================================================================

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::db::Database;
use crate::reports::ReportKind;

// -----------------------------------------------------------------------------
// 1. Payload Types
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RecentUser {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RecentSwap {
    pub id: String,
    pub from_user: String,
    pub to_user: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RecentReport {
    pub id: String,
    pub reporter: String,
    pub reported_user: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct SwapStatusCounts {
    pub pending: i64,
    pub accepted: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub rejected: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct ReportStatusCounts {
    pub pending: i64,
    pub investigating: i64,
    pub resolved: i64,
    pub dismissed: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_swaps: i64,
    pub total_reports: i64,
    pub total_skill_reports: i64,
    pub pending_reports: i64,
    pub pending_skill_reports: i64,
    pub banned_users: i64,
    pub active_messages: i64,
    pub recent_users: Vec<RecentUser>,
    pub recent_swaps: Vec<RecentSwap>,
    pub recent_reports: Vec<RecentReport>,
    pub user_growth: Vec<DailyCount>,
    pub swap_stats: SwapStatusCounts,
    pub report_stats: ReportStatusCounts,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SkillCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct SwapStats {
    pub total_swaps: i64,
    pub pending_swaps: i64,
    pub accepted_swaps: i64,
    pub completed_swaps: i64,
    pub cancelled_swaps: i64,
    pub rejected_swaps: i64,
    pub swaps_this_week: i64,
    pub swaps_this_month: i64,
    pub swaps_this_year: i64,
    pub average_rating: f64,
    pub top_offered_skills: Vec<SkillCount>,
    pub top_wanted_skills: Vec<SkillCount>,
}

#[derive(Debug, Serialize)]
pub struct PlatformOverview {
    pub total_users: i64,
    pub new_users_this_month: i64,
    pub active_users: i64,
    pub banned_users: i64,
    pub total_swaps: i64,
    pub swaps_this_month: i64,
    pub completed_swaps: i64,
    pub completion_rate: f64,
    pub total_reports: i64,
    pub pending_reports: i64,
    pub average_rating: f64,
}

#[derive(Debug, Serialize)]
pub struct OverviewReport {
    pub platform_overview: PlatformOverview,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ActiveUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub swap_count: i64,
    pub rating_count: i64,
    pub join_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthlyCount {
    pub month: String,
    pub new_users: i64,
}

#[derive(Debug, Serialize)]
pub struct UserActivityReport {
    pub top_active_users: Vec<ActiveUser>,
    pub user_growth: Vec<MonthlyCount>,
}

#[derive(Debug, Serialize)]
pub struct SkillSuccessRate {
    pub skill_name: String,
    pub total_swaps: i64,
    pub completed_swaps: i64,
    pub success_rate: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthlyTrend {
    pub month: String,
    pub total_swaps: i64,
    pub completed_swaps: i64,
}

#[derive(Debug, Serialize)]
pub struct SwapAnalyticsReport {
    pub skill_success_rates: Vec<SkillSuccessRate>,
    pub swap_trends: Vec<MonthlyTrend>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RecentBan {
    pub user_id: String,
    pub user_name: String,
    pub ban_reason: String,
    pub ban_date: DateTime<Utc>,
    pub banned_by: String,
}

#[derive(Debug, Serialize)]
pub struct ModerationReportEntry {
    pub id: String,
    pub kind: ReportKind,
    pub reporter: String,
    pub reported_item: String,
    pub report_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ModerationReport {
    pub recent_bans: Vec<RecentBan>,
    pub recent_reports: Vec<ModerationReportEntry>,
}

// -----------------------------------------------------------------------------
// 2. Helpers
// -----------------------------------------------------------------------------

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// completed / total as a percentage; 0.00 when total is 0.
pub fn pct(completed: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(completed as f64 / total as f64 * 100.0)
    }
}

/// The trailing `days` calendar dates ending today, oldest first.
fn trailing_days(today: NaiveDate, days: u64) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .filter_map(|i| today.checked_sub_days(Days::new(i)))
        .collect()
}

/// The trailing `months` calendar months ending this month, oldest first,
/// as YYYY-MM labels. Anchored on the first of the month so subtraction
/// never skips short months.
fn trailing_months(today: NaiveDate, months: u32) -> Vec<String> {
    let first_of_month = today
        .with_day(1)
        .expect("day 1 is valid for every month");
    (0..months)
        .rev()
        .filter_map(|i| first_of_month.checked_sub_months(Months::new(i)))
        .map(|d| d.format("%Y-%m").to_string())
        .collect()
}

async fn count(db: &Database, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(sql).fetch_one(db.pool()).await
}

async fn count_since(db: &Database, sql: &str, since: DateTime<Utc>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(sql)
        .bind(since.to_rfc3339())
        .fetch_one(db.pool())
        .await
}

async fn status_counts(db: &Database, table: &str) -> Result<HashMap<String, i64>, sqlx::Error> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as(&format!("SELECT status, COUNT(*) FROM {table} GROUP BY status"))
            .fetch_all(db.pool())
            .await?;
    Ok(rows.into_iter().collect())
}

/// Per-status swap counts over the whole store.
pub async fn swap_status_counts(db: &Database) -> Result<SwapStatusCounts, sqlx::Error> {
    let counts = status_counts(db, "swap_requests").await?;
    Ok(SwapStatusCounts {
        pending: counts.get("pending").copied().unwrap_or(0),
        accepted: counts.get("accepted").copied().unwrap_or(0),
        completed: counts.get("completed").copied().unwrap_or(0),
        cancelled: counts.get("cancelled").copied().unwrap_or(0),
        rejected: counts.get("rejected").copied().unwrap_or(0),
    })
}

/// Average across all session ratings; 0.0 when none are recorded.
pub async fn average_rating(db: &Database) -> Result<f64, sqlx::Error> {
    let avg: Option<f64> = sqlx::query_scalar("SELECT AVG(rating) FROM swap_ratings")
        .fetch_one(db.pool())
        .await?;
    Ok(round2(avg.unwrap_or(0.0)))
}

/// Daily new-account counts for the trailing `days` days, zero-filled,
/// oldest first.
pub async fn user_growth_daily(db: &Database, days: u64) -> Result<Vec<DailyCount>, sqlx::Error> {
    let today = Utc::now().date_naive();
    let dates = trailing_days(today, days);
    let cutoff = dates.first().copied().unwrap_or(today);

    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT date(created_at), COUNT(*) FROM users WHERE date(created_at) >= date(?) GROUP BY date(created_at)",
    )
    .bind(cutoff.to_string())
    .fetch_all(db.pool())
    .await?;
    let by_day: HashMap<String, i64> = rows.into_iter().collect();

    Ok(dates
        .into_iter()
        .map(|d| {
            let date = d.to_string();
            let count = by_day.get(&date).copied().unwrap_or(0);
            DailyCount { date, count }
        })
        .collect())
}

/// Monthly signup counts for the trailing 12 calendar months, zero-filled,
/// oldest first.
pub async fn monthly_signups(db: &Database) -> Result<Vec<MonthlyCount>, sqlx::Error> {
    let months = trailing_months(Utc::now().date_naive(), 12);

    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT strftime('%Y-%m', created_at), COUNT(*) FROM users GROUP BY strftime('%Y-%m', created_at)",
    )
    .fetch_all(db.pool())
    .await?;
    let by_month: HashMap<String, i64> = rows.into_iter().collect();

    Ok(months
        .into_iter()
        .map(|month| {
            let new_users = by_month.get(&month).copied().unwrap_or(0);
            MonthlyCount { month, new_users }
        })
        .collect())
}

/// Total and completed swap counts for the trailing 12 calendar months,
/// zero-filled, oldest first.
pub async fn monthly_swap_trends(db: &Database) -> Result<Vec<MonthlyTrend>, sqlx::Error> {
    let months = trailing_months(Utc::now().date_naive(), 12);

    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT strftime('%Y-%m', created_at),
               COUNT(*),
               SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END)
        FROM swap_requests
        GROUP BY strftime('%Y-%m', created_at)
        "#,
    )
    .fetch_all(db.pool())
    .await?;
    let by_month: HashMap<String, (i64, i64)> = rows
        .into_iter()
        .map(|(month, total, completed)| (month, (total, completed)))
        .collect();

    Ok(months
        .into_iter()
        .map(|month| {
            let (total_swaps, completed_swaps) =
                by_month.get(&month).copied().unwrap_or((0, 0));
            MonthlyTrend {
                month,
                total_swaps,
                completed_swaps,
            }
        })
        .collect())
}

/// Per-skill completed/total percentages over swaps referencing the skill
/// as offered or wanted. Skills with no swaps report 0.00.
pub async fn skill_success_rates(db: &Database) -> Result<Vec<SkillSuccessRate>, sqlx::Error> {
    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT s.name,
               COUNT(r.id),
               COALESCE(SUM(CASE WHEN r.status = 'completed' THEN 1 ELSE 0 END), 0)
        FROM skills s
        LEFT JOIN swap_requests r
               ON r.skill_offered_id = s.id OR r.skill_wanted_id = s.id
        GROUP BY s.id
        ORDER BY s.name
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    Ok(rows
        .into_iter()
        .map(|(skill_name, total_swaps, completed_swaps)| SkillSuccessRate {
            skill_name,
            total_swaps,
            completed_swaps,
            success_rate: pct(completed_swaps, total_swaps),
        })
        .collect())
}

// -----------------------------------------------------------------------------
// 3. Dashboard & Swap Statistics
// -----------------------------------------------------------------------------

pub async fn dashboard(db: &Database) -> Result<DashboardStats, sqlx::Error> {
    let total_users = count(db, "SELECT COUNT(*) FROM users").await?;
    let total_swaps = count(db, "SELECT COUNT(*) FROM swap_requests").await?;
    let total_reports = count(db, "SELECT COUNT(*) FROM user_reports").await?;
    let total_skill_reports = count(db, "SELECT COUNT(*) FROM skill_reports").await?;
    let pending_reports =
        count(db, "SELECT COUNT(*) FROM user_reports WHERE status = 'pending'").await?;
    let pending_skill_reports =
        count(db, "SELECT COUNT(*) FROM skill_reports WHERE status = 'pending'").await?;
    let banned_users = count(db, "SELECT COUNT(*) FROM users WHERE is_banned = 1").await?;
    let active_messages =
        count(db, "SELECT COUNT(*) FROM platform_messages WHERE is_active = 1").await?;

    let recent_users = sqlx::query_as::<_, RecentUser>(
        "SELECT id, username, first_name, last_name, created_at FROM users ORDER BY created_at DESC LIMIT 5",
    )
    .fetch_all(db.pool())
    .await?;

    let recent_swaps = sqlx::query_as::<_, RecentSwap>(
        r#"
        SELECT r.id,
               TRIM(fu.first_name || ' ' || fu.last_name) AS from_user,
               TRIM(tu.first_name || ' ' || tu.last_name) AS to_user,
               r.status, r.created_at
        FROM swap_requests r
        JOIN users fu ON r.from_user_id = fu.id
        JOIN users tu ON r.to_user_id = tu.id
        ORDER BY r.created_at DESC LIMIT 5
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    let recent_reports = sqlx::query_as::<_, RecentReport>(
        r#"
        SELECT r.id,
               TRIM(rp.first_name || ' ' || rp.last_name) AS reporter,
               TRIM(ru.first_name || ' ' || ru.last_name) AS reported_user,
               r.status, r.created_at
        FROM user_reports r
        JOIN users rp ON r.reporter_id = rp.id
        JOIN users ru ON r.reported_user_id = ru.id
        ORDER BY r.created_at DESC LIMIT 5
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    let user_growth = user_growth_daily(db, 30).await?;

    let swap_stats = swap_status_counts(db).await?;

    let report_counts = status_counts(db, "user_reports").await?;
    let report_stats = ReportStatusCounts {
        pending: report_counts.get("pending").copied().unwrap_or(0),
        investigating: report_counts.get("investigating").copied().unwrap_or(0),
        resolved: report_counts.get("resolved").copied().unwrap_or(0),
        dismissed: report_counts.get("dismissed").copied().unwrap_or(0),
    };

    Ok(DashboardStats {
        total_users,
        total_swaps,
        total_reports,
        total_skill_reports,
        pending_reports,
        pending_skill_reports,
        banned_users,
        active_messages,
        recent_users,
        recent_swaps,
        recent_reports,
        user_growth,
        swap_stats,
        report_stats,
    })
}

pub async fn swap_stats(db: &Database) -> Result<SwapStats, sqlx::Error> {
    let counts = status_counts(db, "swap_requests").await?;
    let total_swaps = count(db, "SELECT COUNT(*) FROM swap_requests").await?;

    let now = Utc::now();
    let windows_sql =
        "SELECT COUNT(*) FROM swap_requests WHERE datetime(created_at) >= datetime(?)";
    let swaps_this_week = count_since(db, windows_sql, now - Days::new(7)).await?;
    let swaps_this_month = count_since(db, windows_sql, now - Days::new(30)).await?;
    let swaps_this_year = count_since(db, windows_sql, now - Days::new(365)).await?;

    let top_offered_skills = sqlx::query_as::<_, SkillCount>(
        r#"
        SELECT s.name, COUNT(r.id) AS count
        FROM skills s
        JOIN swap_requests r ON r.skill_offered_id = s.id
        GROUP BY s.id
        ORDER BY count DESC, s.name
        LIMIT 10
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    let top_wanted_skills = sqlx::query_as::<_, SkillCount>(
        r#"
        SELECT s.name, COUNT(r.id) AS count
        FROM skills s
        JOIN swap_requests r ON r.skill_wanted_id = s.id
        GROUP BY s.id
        ORDER BY count DESC, s.name
        LIMIT 10
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    Ok(SwapStats {
        total_swaps,
        pending_swaps: counts.get("pending").copied().unwrap_or(0),
        accepted_swaps: counts.get("accepted").copied().unwrap_or(0),
        completed_swaps: counts.get("completed").copied().unwrap_or(0),
        cancelled_swaps: counts.get("cancelled").copied().unwrap_or(0),
        rejected_swaps: counts.get("rejected").copied().unwrap_or(0),
        swaps_this_week,
        swaps_this_month,
        swaps_this_year,
        average_rating: average_rating(db).await?,
        top_offered_skills,
        top_wanted_skills,
    })
}

// -----------------------------------------------------------------------------
// 4. Enhanced Reports
// -----------------------------------------------------------------------------

pub async fn overview(db: &Database) -> Result<OverviewReport, sqlx::Error> {
    let now = Utc::now();
    let month_ago = now - Days::new(30);

    let total_users = count(db, "SELECT COUNT(*) FROM users").await?;
    let new_users_this_month = count_since(
        db,
        "SELECT COUNT(*) FROM users WHERE datetime(created_at) >= datetime(?)",
        month_ago,
    )
    .await?;
    let active_users = count_since(
        db,
        "SELECT COUNT(*) FROM users WHERE last_login IS NOT NULL AND datetime(last_login) >= datetime(?)",
        month_ago,
    )
    .await?;
    let banned_users = count(db, "SELECT COUNT(*) FROM users WHERE is_banned = 1").await?;

    let total_swaps = count(db, "SELECT COUNT(*) FROM swap_requests").await?;
    let swaps_this_month = count_since(
        db,
        "SELECT COUNT(*) FROM swap_requests WHERE datetime(created_at) >= datetime(?)",
        month_ago,
    )
    .await?;
    let completed_swaps =
        count(db, "SELECT COUNT(*) FROM swap_requests WHERE status = 'completed'").await?;

    let total_reports = count(db, "SELECT COUNT(*) FROM user_reports").await?
        + count(db, "SELECT COUNT(*) FROM skill_reports").await?;
    let pending_reports =
        count(db, "SELECT COUNT(*) FROM user_reports WHERE status = 'pending'").await?
            + count(db, "SELECT COUNT(*) FROM skill_reports WHERE status = 'pending'").await?;

    Ok(OverviewReport {
        platform_overview: PlatformOverview {
            total_users,
            new_users_this_month,
            active_users,
            banned_users,
            total_swaps,
            swaps_this_month,
            completed_swaps,
            completion_rate: pct(completed_swaps, total_swaps),
            total_reports,
            pending_reports,
            average_rating: average_rating(db).await?,
        },
    })
}

pub async fn user_activity(db: &Database) -> Result<UserActivityReport, sqlx::Error> {
    let top_active_users = sqlx::query_as::<_, ActiveUser>(
        r#"
        SELECT u.id,
               TRIM(u.first_name || ' ' || u.last_name) AS name,
               u.email,
               (SELECT COUNT(*) FROM swap_requests r
                 WHERE r.from_user_id = u.id OR r.to_user_id = u.id) AS swap_count,
               (SELECT COUNT(*) FROM swap_ratings sr
                  JOIN swap_sessions ss ON sr.swap_session_id = ss.id
                  JOIN swap_requests r ON ss.swap_request_id = r.id
                 WHERE (r.from_user_id = u.id OR r.to_user_id = u.id)
                   AND sr.rater_id != u.id) AS rating_count,
               u.created_at AS join_date
        FROM users u
        ORDER BY swap_count DESC, u.created_at
        LIMIT 10
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    Ok(UserActivityReport {
        top_active_users,
        user_growth: monthly_signups(db).await?,
    })
}

pub async fn swap_analytics(db: &Database) -> Result<SwapAnalyticsReport, sqlx::Error> {
    Ok(SwapAnalyticsReport {
        skill_success_rates: skill_success_rates(db).await?,
        swap_trends: monthly_swap_trends(db).await?,
    })
}

pub async fn moderation(db: &Database) -> Result<ModerationReport, sqlx::Error> {
    let cutoff = Utc::now() - Days::new(30);

    let recent_bans = sqlx::query_as::<_, RecentBan>(
        r#"
        SELECT u.id AS user_id,
               TRIM(u.first_name || ' ' || u.last_name) AS user_name,
               u.ban_reason,
               u.ban_date,
               COALESCE(TRIM(b.first_name || ' ' || b.last_name), 'System') AS banned_by
        FROM users u
        LEFT JOIN users b ON u.banned_by = b.id
        WHERE u.is_banned = 1
          AND u.ban_date IS NOT NULL
          AND datetime(u.ban_date) >= datetime(?)
        ORDER BY u.ban_date DESC
        LIMIT 10
        "#,
    )
    .bind(cutoff.to_rfc3339())
    .fetch_all(db.pool())
    .await?;

    // Both report kinds, explicitly tagged at construction, merged newest
    // first.
    let mut entries: Vec<ModerationReportEntry> = Vec::new();
    for report in db.list_user_reports().await? {
        if report.created_at < cutoff {
            continue;
        }
        entries.push(ModerationReportEntry {
            id: report.id,
            kind: ReportKind::UserReport,
            reporter: report.reporter_name,
            reported_item: report.reported_user_name,
            report_type: report.report_type,
            status: report.status,
            created_at: report.created_at,
        });
    }
    for report in db.list_skill_reports().await? {
        if report.created_at < cutoff {
            continue;
        }
        entries.push(ModerationReportEntry {
            id: report.id,
            kind: ReportKind::SkillReport,
            reporter: report.reporter_name,
            reported_item: report.skill_name,
            report_type: report.report_type,
            status: report.status,
            created_at: report.created_at,
        });
    }
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries.truncate(10);

    Ok(ModerationReport {
        recent_bans,
        recent_reports: entries,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

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

    #[test]
    fn pct_guards_division_by_zero() {
        assert_eq!(pct(0, 0), 0.0);
        assert_eq!(pct(1, 2), 50.0);
        assert_eq!(pct(1, 3), 33.33);
    }

    #[test]
    fn trailing_months_are_calendar_aligned() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let months = trailing_months(today, 12);

        assert_eq!(months.len(), 12);
        assert_eq!(months.first().unwrap(), "2025-04");
        assert_eq!(months.last().unwrap(), "2026-03");
        // February is one bucket, not a 30-day window spilling into March
        assert!(months.contains(&"2026-02".to_string()));
    }

    #[tokio::test]
    async fn user_growth_has_exactly_30_zero_filled_entries() {
        let db = test_db().await;
        make_user(&db, "alice").await;
        make_user(&db, "bob").await;

        let growth = user_growth_daily(&db, 30).await.unwrap();

        assert_eq!(growth.len(), 30);
        assert!(growth.iter().all(|d| d.count >= 0));
        let total: i64 = growth.iter().map(|d| d.count).sum();
        assert_eq!(total, 2);
        // Oldest first; the two signups from just now land in the last bucket
        assert_eq!(growth.last().unwrap().count, 2);
        assert_eq!(growth.first().unwrap().count, 0);
    }

    #[tokio::test]
    async fn average_rating_is_zero_with_no_ratings() {
        let db = test_db().await;
        assert_eq!(average_rating(&db).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn success_rate_is_zero_for_skill_with_no_swaps() {
        let db = test_db().await;
        db.create_skill("Guitar", "other", "").await.unwrap();

        let rates = skill_success_rates(&db).await.unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].total_swaps, 0);
        assert_eq!(rates[0].success_rate, 0.0);
    }

    #[tokio::test]
    async fn success_rate_counts_both_sides_of_the_swap() {
        let db = test_db().await;
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        let guitar = db.create_skill("Guitar", "other", "").await.unwrap();
        let cooking = db.create_skill("Cooking", "other", "").await.unwrap();

        let s1 = db
            .create_swap_request(&alice.id, &bob.id, &guitar.id, &cooking.id, "", "", "")
            .await
            .unwrap();
        db.create_swap_request(&bob.id, &alice.id, &cooking.id, &guitar.id, "", "", "")
            .await
            .unwrap();
        db.update_swap_status(&s1.id, "completed").await.unwrap();

        let rates = skill_success_rates(&db).await.unwrap();
        let guitar_rate = rates.iter().find(|r| r.skill_name == "Guitar").unwrap();
        assert_eq!(guitar_rate.total_swaps, 2);
        assert_eq!(guitar_rate.completed_swaps, 1);
        assert_eq!(guitar_rate.success_rate, 50.0);
    }

    #[tokio::test]
    async fn monthly_trends_have_12_buckets_and_bucket_by_calendar_month() {
        let db = test_db().await;
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        let guitar = db.create_skill("Guitar", "other", "").await.unwrap();
        let cooking = db.create_skill("Cooking", "other", "").await.unwrap();

        let swap = db
            .create_swap_request(&alice.id, &bob.id, &guitar.id, &cooking.id, "", "", "")
            .await
            .unwrap();
        // Move the swap back one calendar month
        let last_month = Utc::now()
            .date_naive()
            .with_day(1)
            .unwrap()
            .checked_sub_months(Months::new(1))
            .unwrap();
        sqlx::query("UPDATE swap_requests SET created_at = ? WHERE id = ?")
            .bind(format!("{last_month}T12:00:00+00:00"))
            .bind(&swap.id)
            .execute(db.pool())
            .await
            .unwrap();

        let trends = monthly_swap_trends(&db).await.unwrap();
        assert_eq!(trends.len(), 12);

        let label = last_month.format("%Y-%m").to_string();
        let bucket = trends.iter().find(|t| t.month == label).unwrap();
        assert_eq!(bucket.total_swaps, 1);
        assert_eq!(bucket.completed_swaps, 0);
        // Current month bucket is last and empty
        assert_eq!(trends.last().unwrap().total_swaps, 0);
    }

    #[tokio::test]
    async fn dashboard_counts_empty_store() {
        let db = test_db().await;
        let stats = dashboard(&db).await.unwrap();

        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.banned_users, 0);
        assert_eq!(stats.user_growth.len(), 30);
        assert!(stats.recent_users.is_empty());
        assert_eq!(stats.swap_stats.pending, 0);
        assert_eq!(stats.report_stats.dismissed, 0);
    }

    #[tokio::test]
    async fn swap_stats_windows_and_average() {
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
        db.create_rating(&session.id, &bob.id, 4, "").await.unwrap();

        let stats = swap_stats(&db).await.unwrap();
        assert_eq!(stats.total_swaps, 1);
        assert_eq!(stats.completed_swaps, 1);
        assert_eq!(stats.swaps_this_week, 1);
        assert_eq!(stats.swaps_this_month, 1);
        assert_eq!(stats.swaps_this_year, 1);
        assert_eq!(stats.average_rating, 4.5);
        assert_eq!(stats.top_offered_skills[0].name, "Guitar");
        assert_eq!(stats.top_wanted_skills[0].name, "Cooking");
    }

    #[tokio::test]
    async fn moderation_report_tags_both_kinds() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let reporter = make_user(&db, "reporter").await;
        let target = make_user(&db, "target").await;
        let skill = db.create_skill("Guitar", "other", "").await.unwrap();

        db.create_user_report(&reporter.id, &target.id, "spam", "desc", "")
            .await
            .unwrap();
        db.create_skill_report(&reporter.id, &skill.id, "misleading", "desc")
            .await
            .unwrap();
        db.set_user_ban(&target.id, true, "spam", &admin.id)
            .await
            .unwrap();

        let report = moderation(&db).await.unwrap();
        assert_eq!(report.recent_bans.len(), 1);
        assert_eq!(report.recent_bans[0].ban_reason, "spam");
        assert_eq!(report.recent_reports.len(), 2);
        assert!(report
            .recent_reports
            .iter()
            .any(|e| e.kind == ReportKind::UserReport));
        assert!(report
            .recent_reports
            .iter()
            .any(|e| e.kind == ReportKind::SkillReport && e.reported_item == "Guitar"));
    }

    #[tokio::test]
    async fn overview_completion_rate_handles_empty_store() {
        let db = test_db().await;
        let report = overview(&db).await.unwrap();
        assert_eq!(report.platform_overview.completion_rate, 0.0);
        assert_eq!(report.platform_overview.average_rating, 0.0);
    }
}
