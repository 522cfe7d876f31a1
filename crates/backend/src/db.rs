// =============================================================================
// SkillSwap Backend - Database Layer
// =============================================================================
// Table of Contents:
// 1. Models
// 2. Pool Setup & Migrations
// 3. User Methods
// 4. Skill & UserSkill Methods
// 5. Swap Methods (requests, sessions, ratings)
// 6. Report Methods
// 7. Platform Message Methods
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

// -----------------------------------------------------------------------------
// 1. Models
// -----------------------------------------------------------------------------

/// User model.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub location: String,
    pub availability: String,
    pub experience_level: String,
    pub rating: f64,
    pub completed_swaps: i64,
    pub is_admin: bool,
    pub is_banned: bool,
    pub ban_reason: String,
    pub ban_date: Option<DateTime<Utc>>,
    pub banned_by: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// User response (without sensitive fields).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub bio: String,
    pub location: String,
    pub availability: String,
    pub experience_level: String,
    pub rating: f64,
    pub completed_swaps: i64,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            bio: user.bio,
            location: user.location,
            availability: user.availability,
            experience_level: user.experience_level,
            rating: user.rating,
            completed_swaps: user.completed_swaps,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// Skill catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A user's offered or wanted skill.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSkill {
    pub id: String,
    pub user_id: String,
    pub skill_id: String,
    pub skill_type: String,
    pub proficiency_level: String,
    pub created_at: DateTime<Utc>,
}

/// Swap request between two users.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SwapRequest {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub skill_offered_id: String,
    pub skill_wanted_id: String,
    pub status: String,
    pub duration: String,
    pub preferred_time: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session backing an accepted swap request (1:1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SwapSession {
    pub id: String,
    pub swap_request_id: String,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Rating left by one participant of a completed session.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SwapRating {
    pub id: String,
    pub swap_session_id: String,
    pub rater_id: String,
    pub rating: i64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Report filed against a user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserReport {
    pub id: String,
    pub reporter_id: String,
    pub reported_user_id: String,
    pub report_type: String,
    pub description: String,
    pub evidence: String,
    pub status: String,
    pub admin_notes: String,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Report filed against a skill description.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SkillReport {
    pub id: String,
    pub reporter_id: String,
    pub skill_id: String,
    pub report_type: String,
    pub description: String,
    pub status: String,
    pub admin_notes: String,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin-authored broadcast message.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlatformMessage {
    pub id: String,
    pub title: String,
    pub content: String,
    pub message_type: String,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -----------------------------------------------------------------------------
// Joined rows (denormalized views used by handlers and exports)
// -----------------------------------------------------------------------------

/// Swap request with participant and skill names resolved.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SwapDetail {
    pub id: String,
    pub from_user_id: String,
    pub from_user_name: String,
    pub from_user_email: String,
    pub to_user_id: String,
    pub to_user_name: String,
    pub to_user_email: String,
    pub skill_offered: String,
    pub skill_wanted: String,
    pub status: String,
    pub duration: String,
    pub preferred_time: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User report with reporter/target/resolver names resolved.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserReportDetail {
    pub id: String,
    pub reporter_id: String,
    pub reporter_name: String,
    pub reported_user_id: String,
    pub reported_user_name: String,
    pub report_type: String,
    pub description: String,
    pub evidence: String,
    pub status: String,
    pub admin_notes: String,
    pub resolved_by: Option<String>,
    pub resolved_by_name: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Skill report with reporter/skill/resolver names resolved.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SkillReportDetail {
    pub id: String,
    pub reporter_id: String,
    pub reporter_name: String,
    pub skill_id: String,
    pub skill_name: String,
    pub report_type: String,
    pub description: String,
    pub status: String,
    pub admin_notes: String,
    pub resolved_by: Option<String>,
    pub resolved_by_name: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One user's link to a skill, with both sides resolved (discovery view).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SkillListing {
    pub skill_id: String,
    pub skill_name: String,
    pub category: String,
    pub description: String,
    pub user_id: String,
    pub user_name: String,
    pub skill_type: String,
    pub proficiency_level: String,
    pub created_at: DateTime<Utc>,
}

/// Skill with listing/report rollups (admin catalog view).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SkillWithCounts {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub user_count: i64,
    pub report_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Skill that has at least one report filed against it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReportedSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub report_count: i64,
    pub pending_reports: i64,
}

// -----------------------------------------------------------------------------
// Update payloads
// -----------------------------------------------------------------------------

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub availability: Option<String>,
    pub experience_level: Option<String>,
}

/// Partial admin-side user update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub availability: Option<String>,
    pub experience_level: Option<String>,
    pub is_admin: Option<bool>,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

// -----------------------------------------------------------------------------
// 2. Pool Setup & Migrations
// -----------------------------------------------------------------------------

impl Database {
    /// Create a new database connection pool.
    pub async fn new(url: &str) -> Result<Self, sqlx::Error> {
        // In-memory databases get a single connection: each SQLite
        // connection to ":memory:" is its own database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        // Add create_if_missing option for file-backed SQLite
        let url_with_options = if url.starts_with("sqlite:")
            && !url.contains(":memory:")
            && !url.contains('?')
        {
            format!("{}?mode=rwc", url)
        } else {
            url.to_string()
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url_with_options)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        // Users table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                bio TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT '',
                availability TEXT NOT NULL DEFAULT '',
                experience_level TEXT NOT NULL DEFAULT '',
                rating REAL NOT NULL DEFAULT 0,
                completed_swaps INTEGER NOT NULL DEFAULT 0,
                is_admin INTEGER NOT NULL DEFAULT 0,
                is_banned INTEGER NOT NULL DEFAULT 0,
                ban_reason TEXT NOT NULL DEFAULT '',
                ban_date TEXT,
                banned_by TEXT REFERENCES users(id),
                last_login TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Skill catalog
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS skills (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL DEFAULT 'other',
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Per-user skill links
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_skills (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                skill_id TEXT NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
                skill_type TEXT NOT NULL,
                proficiency_level TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, skill_id, skill_type)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Swap requests
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS swap_requests (
                id TEXT PRIMARY KEY,
                from_user_id TEXT NOT NULL REFERENCES users(id),
                to_user_id TEXT NOT NULL REFERENCES users(id),
                skill_offered_id TEXT NOT NULL REFERENCES skills(id),
                skill_wanted_id TEXT NOT NULL REFERENCES skills(id),
                status TEXT NOT NULL DEFAULT 'pending',
                duration TEXT NOT NULL DEFAULT '',
                preferred_time TEXT NOT NULL DEFAULT '',
                message TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Swap sessions (one per accepted request)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS swap_sessions (
                id TEXT PRIMARY KEY,
                swap_request_id TEXT NOT NULL UNIQUE REFERENCES swap_requests(id) ON DELETE CASCADE,
                scheduled_date TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Swap ratings (one per participant per session)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS swap_ratings (
                id TEXT PRIMARY KEY,
                swap_session_id TEXT NOT NULL REFERENCES swap_sessions(id) ON DELETE CASCADE,
                rater_id TEXT NOT NULL REFERENCES users(id),
                rating INTEGER NOT NULL,
                comment TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(swap_session_id, rater_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // User reports
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_reports (
                id TEXT PRIMARY KEY,
                reporter_id TEXT NOT NULL REFERENCES users(id),
                reported_user_id TEXT NOT NULL REFERENCES users(id),
                report_type TEXT NOT NULL,
                description TEXT NOT NULL,
                evidence TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'pending',
                admin_notes TEXT NOT NULL DEFAULT '',
                resolved_by TEXT REFERENCES users(id),
                resolved_at TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Skill reports
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS skill_reports (
                id TEXT PRIMARY KEY,
                reporter_id TEXT NOT NULL REFERENCES users(id),
                skill_id TEXT NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
                report_type TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                admin_notes TEXT NOT NULL DEFAULT '',
                resolved_by TEXT REFERENCES users(id),
                resolved_at TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Platform messages
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS platform_messages (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                message_type TEXT NOT NULL DEFAULT 'general',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_by TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create indexes for performance
        let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_skills_user ON user_skills(user_id)")
            .execute(&self.pool)
            .await;
        let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_swaps_from ON swap_requests(from_user_id)")
            .execute(&self.pool)
            .await;
        let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_swaps_to ON swap_requests(to_user_id)")
            .execute(&self.pool)
            .await;
        let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_swaps_status ON swap_requests(status)")
            .execute(&self.pool)
            .await;
        let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_reports_status ON user_reports(status)")
            .execute(&self.pool)
            .await;
        let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_skill_reports_skill ON skill_reports(skill_id)")
            .execute(&self.pool)
            .await;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    // =========================================================================
    // 3. User Methods
    // =========================================================================

    /// Find user by ID.
    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find user by email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find user by username.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    /// Create a new user.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        is_admin: bool,
    ) -> Result<User, sqlx::Error> {
        let now = now_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, first_name, last_name, is_admin, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(is_admin)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_user_by_id(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Stamp the user's last login time.
    pub async fn touch_last_login(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(now_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Apply a partial profile update; absent fields keep their value.
    pub async fn update_profile(
        &self,
        id: &str,
        changes: &ProfileChanges,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                bio = COALESCE(?, bio),
                location = COALESCE(?, location),
                availability = COALESCE(?, availability),
                experience_level = COALESCE(?, experience_level),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.bio)
        .bind(&changes.location)
        .bind(&changes.availability)
        .bind(&changes.experience_level)
        .bind(now_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Apply a partial admin-side user update.
    pub async fn admin_update_user(
        &self,
        id: &str,
        changes: &AdminUserChanges,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                bio = COALESCE(?, bio),
                location = COALESCE(?, location),
                availability = COALESCE(?, availability),
                experience_level = COALESCE(?, experience_level),
                is_admin = COALESCE(?, is_admin),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.bio)
        .bind(&changes.location)
        .bind(&changes.availability)
        .bind(&changes.experience_level)
        .bind(changes.is_admin)
        .bind(now_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Public directory listing: everyone except the caller and banned
    /// accounts, optionally filtered by a search term over name/bio/location.
    pub async fn list_users(
        &self,
        exclude_id: &str,
        search: &str,
    ) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE id != ? AND is_banned = 0
              AND (? = ''
                   OR first_name LIKE '%' || ? || '%'
                   OR last_name LIKE '%' || ? || '%'
                   OR bio LIKE '%' || ? || '%'
                   OR location LIKE '%' || ? || '%')
            ORDER BY created_at DESC
            "#,
        )
        .bind(exclude_id)
        .bind(search)
        .bind(search)
        .bind(search)
        .bind(search)
        .bind(search)
        .fetch_all(&self.pool)
        .await
    }

    /// Every account, newest first (admin view).
    pub async fn list_all_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    /// Set or clear the ban state as one unit.
    ///
    /// Banning stamps ban_date/banned_by; unbanning clears reason, date and
    /// resolver together. Returns the updated user, or None if the id is
    /// unknown.
    pub async fn set_user_ban(
        &self,
        user_id: &str,
        is_banned: bool,
        ban_reason: &str,
        admin_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let result = if is_banned {
            sqlx::query(
                r#"
                UPDATE users
                SET is_banned = 1, ban_reason = ?, ban_date = ?, banned_by = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(ban_reason)
            .bind(now_rfc3339())
            .bind(admin_id)
            .bind(now_rfc3339())
            .bind(user_id)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE users
                SET is_banned = 0, ban_reason = '', ban_date = NULL, banned_by = NULL, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(now_rfc3339())
            .bind(user_id)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_user_by_id(user_id).await
    }

    /// Whether any admin account exists (bootstrap check).
    pub async fn admin_exists(&self) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_admin = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Number of swap requests the user participates in, either side.
    pub async fn swap_count_for_user(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM swap_requests WHERE from_user_id = ? OR to_user_id = ?",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Number of user reports filed against the user.
    pub async fn reports_received_count(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_reports WHERE reported_user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Number of user reports the user filed.
    pub async fn reports_made_count(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_reports WHERE reporter_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    // =========================================================================
    // 4. Skill & UserSkill Methods
    // =========================================================================

    /// The full skill catalog, alphabetical.
    pub async fn list_skills(&self) -> Result<Vec<Skill>, sqlx::Error> {
        sqlx::query_as::<_, Skill>("SELECT * FROM skills ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    /// Find skill by ID.
    pub async fn find_skill_by_id(&self, id: &str) -> Result<Option<Skill>, sqlx::Error> {
        sqlx::query_as::<_, Skill>("SELECT * FROM skills WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find skill by name.
    pub async fn find_skill_by_name(&self, name: &str) -> Result<Option<Skill>, sqlx::Error> {
        sqlx::query_as::<_, Skill>("SELECT * FROM skills WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn count_skills(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM skills")
            .fetch_one(&self.pool)
            .await
    }

    /// Add a catalog entry.
    pub async fn create_skill(
        &self,
        name: &str,
        category: &str,
        description: &str,
    ) -> Result<Skill, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO skills (id, name, category, description, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(category)
        .bind(description)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await?;

        self.find_skill_by_id(&id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// The user's skill links, newest first.
    pub async fn user_skills(&self, user_id: &str) -> Result<Vec<UserSkill>, sqlx::Error> {
        sqlx::query_as::<_, UserSkill>(
            "SELECT * FROM user_skills WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// The user's skill links of one type.
    pub async fn user_skills_by_type(
        &self,
        user_id: &str,
        skill_type: &str,
    ) -> Result<Vec<UserSkill>, sqlx::Error> {
        sqlx::query_as::<_, UserSkill>(
            "SELECT * FROM user_skills WHERE user_id = ? AND skill_type = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .bind(skill_type)
        .fetch_all(&self.pool)
        .await
    }

    /// Skill names the user offers or wants.
    pub async fn skill_names_for(
        &self,
        user_id: &str,
        skill_type: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT s.name FROM user_skills us
            JOIN skills s ON us.skill_id = s.id
            WHERE us.user_id = ? AND us.skill_type = ?
            ORDER BY s.name
            "#,
        )
        .bind(user_id)
        .bind(skill_type)
        .fetch_all(&self.pool)
        .await
    }

    /// Find a specific (user, skill, type) link.
    pub async fn find_user_skill(
        &self,
        user_id: &str,
        skill_id: &str,
        skill_type: &str,
    ) -> Result<Option<UserSkill>, sqlx::Error> {
        sqlx::query_as::<_, UserSkill>(
            "SELECT * FROM user_skills WHERE user_id = ? AND skill_id = ? AND skill_type = ?",
        )
        .bind(user_id)
        .bind(skill_id)
        .bind(skill_type)
        .fetch_optional(&self.pool)
        .await
    }

    /// Link a skill to a user.
    pub async fn create_user_skill(
        &self,
        user_id: &str,
        skill_id: &str,
        skill_type: &str,
        proficiency_level: &str,
    ) -> Result<UserSkill, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO user_skills (id, user_id, skill_id, skill_type, proficiency_level, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(skill_id)
        .bind(skill_type)
        .bind(proficiency_level)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, UserSkill>("SELECT * FROM user_skills WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
    }

    /// Remove a user's skill link; true if a row was deleted.
    pub async fn delete_user_skill(&self, id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_skills WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All other users' skill links with names resolved (discovery feed).
    pub async fn skill_listings(&self, exclude_user: &str) -> Result<Vec<SkillListing>, sqlx::Error> {
        sqlx::query_as::<_, SkillListing>(
            r#"
            SELECT s.id AS skill_id,
                   s.name AS skill_name,
                   s.category,
                   s.description,
                   u.id AS user_id,
                   TRIM(u.first_name || ' ' || u.last_name) AS user_name,
                   us.skill_type,
                   us.proficiency_level,
                   us.created_at
            FROM user_skills us
            JOIN users u ON us.user_id = u.id
            JOIN skills s ON us.skill_id = s.id
            WHERE us.user_id != ? AND u.is_banned = 0
            ORDER BY us.created_at DESC
            "#,
        )
        .bind(exclude_user)
        .fetch_all(&self.pool)
        .await
    }

    /// Catalog entries with listing/report rollups, most-listed first.
    pub async fn skills_with_counts(&self) -> Result<Vec<SkillWithCounts>, sqlx::Error> {
        sqlx::query_as::<_, SkillWithCounts>(
            r#"
            SELECT s.id, s.name, s.category, s.description,
                   (SELECT COUNT(*) FROM user_skills us WHERE us.skill_id = s.id) AS user_count,
                   (SELECT COUNT(*) FROM skill_reports r WHERE r.skill_id = s.id) AS report_count,
                   s.created_at
            FROM skills s
            ORDER BY user_count DESC, s.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Skills with at least one report, with pending rollup.
    pub async fn reported_skills(&self) -> Result<Vec<ReportedSkill>, sqlx::Error> {
        sqlx::query_as::<_, ReportedSkill>(
            r#"
            SELECT s.id, s.name, s.description,
                   COUNT(r.id) AS report_count,
                   SUM(CASE WHEN r.status = 'pending' THEN 1 ELSE 0 END) AS pending_reports
            FROM skills s
            JOIN skill_reports r ON r.skill_id = s.id
            GROUP BY s.id
            ORDER BY report_count DESC, s.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    // =========================================================================
    // 5. Swap Methods
    // =========================================================================

    /// Create a swap request in `pending` status.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_swap_request(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        skill_offered_id: &str,
        skill_wanted_id: &str,
        duration: &str,
        preferred_time: &str,
        message: &str,
    ) -> Result<SwapRequest, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO swap_requests
                (id, from_user_id, to_user_id, skill_offered_id, skill_wanted_id,
                 status, duration, preferred_time, message, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(from_user_id)
        .bind(to_user_id)
        .bind(skill_offered_id)
        .bind(skill_wanted_id)
        .bind(duration)
        .bind(preferred_time)
        .bind(message)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_swap_by_id(&id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Find swap request by ID.
    pub async fn find_swap_by_id(&self, id: &str) -> Result<Option<SwapRequest>, sqlx::Error> {
        sqlx::query_as::<_, SwapRequest>("SELECT * FROM swap_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    const SWAP_DETAIL_SELECT: &'static str = r#"
        SELECT r.id,
               r.from_user_id,
               TRIM(fu.first_name || ' ' || fu.last_name) AS from_user_name,
               fu.email AS from_user_email,
               r.to_user_id,
               TRIM(tu.first_name || ' ' || tu.last_name) AS to_user_name,
               tu.email AS to_user_email,
               so.name AS skill_offered,
               sw.name AS skill_wanted,
               r.status, r.duration, r.preferred_time, r.message,
               r.created_at, r.updated_at
        FROM swap_requests r
        JOIN users fu ON r.from_user_id = fu.id
        JOIN users tu ON r.to_user_id = tu.id
        JOIN skills so ON r.skill_offered_id = so.id
        JOIN skills sw ON r.skill_wanted_id = sw.id
    "#;

    /// Swaps the user participates in, newest first, names resolved.
    pub async fn swaps_for_user(&self, user_id: &str) -> Result<Vec<SwapDetail>, sqlx::Error> {
        let sql = format!(
            "{} WHERE r.from_user_id = ? OR r.to_user_id = ? ORDER BY r.created_at DESC",
            Self::SWAP_DETAIL_SELECT
        );
        sqlx::query_as::<_, SwapDetail>(&sql)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    /// All swaps, optionally filtered by status, paginated (admin monitor).
    pub async fn list_swaps(
        &self,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SwapDetail>, sqlx::Error> {
        let sql = format!(
            "{} WHERE (? IS NULL OR r.status = ?) ORDER BY r.created_at DESC LIMIT ? OFFSET ?",
            Self::SWAP_DETAIL_SELECT
        );
        sqlx::query_as::<_, SwapDetail>(&sql)
            .bind(status)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    /// All swaps with names resolved, newest first (exports).
    pub async fn list_swap_details(&self) -> Result<Vec<SwapDetail>, sqlx::Error> {
        let sql = format!("{} ORDER BY r.created_at DESC", Self::SWAP_DETAIL_SELECT);
        sqlx::query_as::<_, SwapDetail>(&sql)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count_swaps(&self, status: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM swap_requests WHERE (? IS NULL OR status = ?)")
            .bind(status)
            .bind(status)
            .fetch_one(&self.pool)
            .await
    }

    /// Move a swap request to a new status.
    pub async fn update_swap_status(&self, id: &str, status: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE swap_requests SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(now_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Free-form admin overwrite of status/duration/preferred_time.
    pub async fn admin_modify_swap(
        &self,
        id: &str,
        status: Option<&str>,
        duration: Option<&str>,
        preferred_time: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE swap_requests
            SET status = COALESCE(?, status),
                duration = COALESCE(?, duration),
                preferred_time = COALESCE(?, preferred_time),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(duration)
        .bind(preferred_time)
        .bind(now_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Create the session for an accepted request.
    pub async fn create_session(
        &self,
        swap_request_id: &str,
        scheduled_date: Option<DateTime<Utc>>,
    ) -> Result<SwapSession, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO swap_sessions (id, swap_request_id, scheduled_date, completed, created_at)
            VALUES (?, ?, ?, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(swap_request_id)
        .bind(scheduled_date.map(|d| d.to_rfc3339()))
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, SwapSession>("SELECT * FROM swap_sessions WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
    }

    /// Find the session backing a swap request.
    pub async fn find_session_by_swap(
        &self,
        swap_request_id: &str,
    ) -> Result<Option<SwapSession>, sqlx::Error> {
        sqlx::query_as::<_, SwapSession>(
            "SELECT * FROM swap_sessions WHERE swap_request_id = ?",
        )
        .bind(swap_request_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Complete a swap: request to `completed`, session stamped once, both
    /// participants' completed_swaps bumped. One transaction.
    pub async fn complete_swap(&self, swap_id: &str) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let now = now_rfc3339();

        sqlx::query("UPDATE swap_requests SET status = 'completed', updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(swap_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE swap_sessions
            SET completed = 1, completed_at = COALESCE(completed_at, ?)
            WHERE swap_request_id = ?
            "#,
        )
        .bind(&now)
        .bind(swap_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET completed_swaps = completed_swaps + 1
            WHERE id IN (SELECT from_user_id FROM swap_requests WHERE id = ?)
               OR id IN (SELECT to_user_id FROM swap_requests WHERE id = ?)
            "#,
        )
        .bind(swap_id)
        .bind(swap_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    /// Rating a participant left on a session, if any.
    pub async fn find_rating(
        &self,
        session_id: &str,
        rater_id: &str,
    ) -> Result<Option<SwapRating>, sqlx::Error> {
        sqlx::query_as::<_, SwapRating>(
            "SELECT * FROM swap_ratings WHERE swap_session_id = ? AND rater_id = ?",
        )
        .bind(session_id)
        .bind(rater_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Record a session rating.
    pub async fn create_rating(
        &self,
        session_id: &str,
        rater_id: &str,
        rating: i64,
        comment: &str,
    ) -> Result<SwapRating, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO swap_ratings (id, swap_session_id, rater_id, rating, comment, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(session_id)
        .bind(rater_id)
        .bind(rating)
        .bind(comment)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, SwapRating>("SELECT * FROM swap_ratings WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
    }

    /// Recompute the user's aggregate rating from ratings received.
    pub async fn refresh_user_rating(&self, user_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET rating = COALESCE((
                SELECT ROUND(AVG(sr.rating), 2)
                FROM swap_ratings sr
                JOIN swap_sessions ss ON sr.swap_session_id = ss.id
                JOIN swap_requests r ON ss.swap_request_id = r.id
                WHERE (r.from_user_id = users.id OR r.to_user_id = users.id)
                  AND sr.rater_id != users.id
            ), 0)
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    // 6. Report Methods
    // =========================================================================

    /// File a report against a user.
    pub async fn create_user_report(
        &self,
        reporter_id: &str,
        reported_user_id: &str,
        report_type: &str,
        description: &str,
        evidence: &str,
    ) -> Result<UserReport, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO user_reports
                (id, reporter_id, reported_user_id, report_type, description, evidence,
                 status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(&id)
        .bind(reporter_id)
        .bind(reported_user_id)
        .bind(report_type)
        .bind(description)
        .bind(evidence)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, UserReport>("SELECT * FROM user_reports WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
    }

    /// File a report against a skill.
    pub async fn create_skill_report(
        &self,
        reporter_id: &str,
        skill_id: &str,
        report_type: &str,
        description: &str,
    ) -> Result<SkillReport, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO skill_reports
                (id, reporter_id, skill_id, report_type, description, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(&id)
        .bind(reporter_id)
        .bind(skill_id)
        .bind(report_type)
        .bind(description)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, SkillReport>("SELECT * FROM skill_reports WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
    }

    const USER_REPORT_DETAIL_SELECT: &'static str = r#"
        SELECT r.id,
               r.reporter_id,
               TRIM(rp.first_name || ' ' || rp.last_name) AS reporter_name,
               r.reported_user_id,
               TRIM(ru.first_name || ' ' || ru.last_name) AS reported_user_name,
               r.report_type, r.description, r.evidence, r.status, r.admin_notes,
               r.resolved_by,
               TRIM(rb.first_name || ' ' || rb.last_name) AS resolved_by_name,
               r.resolved_at, r.created_at, r.updated_at
        FROM user_reports r
        JOIN users rp ON r.reporter_id = rp.id
        JOIN users ru ON r.reported_user_id = ru.id
        LEFT JOIN users rb ON r.resolved_by = rb.id
    "#;

    /// All user reports, newest first, names resolved.
    pub async fn list_user_reports(&self) -> Result<Vec<UserReportDetail>, sqlx::Error> {
        let sql = format!("{} ORDER BY r.created_at DESC", Self::USER_REPORT_DETAIL_SELECT);
        sqlx::query_as::<_, UserReportDetail>(&sql)
            .fetch_all(&self.pool)
            .await
    }

    /// One user report with names resolved.
    pub async fn find_user_report(
        &self,
        id: &str,
    ) -> Result<Option<UserReportDetail>, sqlx::Error> {
        let sql = format!("{} WHERE r.id = ?", Self::USER_REPORT_DETAIL_SELECT);
        sqlx::query_as::<_, UserReportDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Update a user report's workflow fields. `resolution` stamps
    /// resolved_by/resolved_at; None leaves them exactly as they are.
    pub async fn update_user_report_status(
        &self,
        id: &str,
        status: &str,
        admin_notes: Option<&str>,
        resolution: Option<(&str, DateTime<Utc>)>,
    ) -> Result<bool, sqlx::Error> {
        let result = match resolution {
            Some((admin_id, at)) => {
                sqlx::query(
                    r#"
                    UPDATE user_reports
                    SET status = ?, admin_notes = COALESCE(?, admin_notes),
                        resolved_by = ?, resolved_at = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(status)
                .bind(admin_notes)
                .bind(admin_id)
                .bind(at.to_rfc3339())
                .bind(now_rfc3339())
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE user_reports
                    SET status = ?, admin_notes = COALESCE(?, admin_notes), updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(status)
                .bind(admin_notes)
                .bind(now_rfc3339())
                .bind(id)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    const SKILL_REPORT_DETAIL_SELECT: &'static str = r#"
        SELECT r.id,
               r.reporter_id,
               TRIM(rp.first_name || ' ' || rp.last_name) AS reporter_name,
               r.skill_id,
               s.name AS skill_name,
               r.report_type, r.description, r.status, r.admin_notes,
               r.resolved_by,
               TRIM(rb.first_name || ' ' || rb.last_name) AS resolved_by_name,
               r.resolved_at, r.created_at, r.updated_at
        FROM skill_reports r
        JOIN users rp ON r.reporter_id = rp.id
        JOIN skills s ON r.skill_id = s.id
        LEFT JOIN users rb ON r.resolved_by = rb.id
    "#;

    /// All skill reports, newest first, names resolved.
    pub async fn list_skill_reports(&self) -> Result<Vec<SkillReportDetail>, sqlx::Error> {
        let sql = format!("{} ORDER BY r.created_at DESC", Self::SKILL_REPORT_DETAIL_SELECT);
        sqlx::query_as::<_, SkillReportDetail>(&sql)
            .fetch_all(&self.pool)
            .await
    }

    /// One skill report with names resolved.
    pub async fn find_skill_report(
        &self,
        id: &str,
    ) -> Result<Option<SkillReportDetail>, sqlx::Error> {
        let sql = format!("{} WHERE r.id = ?", Self::SKILL_REPORT_DETAIL_SELECT);
        sqlx::query_as::<_, SkillReportDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Latest reports filed against one skill (admin rollup view).
    pub async fn skill_reports_for_skill(
        &self,
        skill_id: &str,
        limit: i64,
    ) -> Result<Vec<SkillReportDetail>, sqlx::Error> {
        let sql = format!(
            "{} WHERE r.skill_id = ? ORDER BY r.created_at DESC LIMIT ?",
            Self::SKILL_REPORT_DETAIL_SELECT
        );
        sqlx::query_as::<_, SkillReportDetail>(&sql)
            .bind(skill_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// Update a skill report's workflow fields (same contract as the user
    /// report variant).
    pub async fn update_skill_report_status(
        &self,
        id: &str,
        status: &str,
        admin_notes: Option<&str>,
        resolution: Option<(&str, DateTime<Utc>)>,
    ) -> Result<bool, sqlx::Error> {
        let result = match resolution {
            Some((admin_id, at)) => {
                sqlx::query(
                    r#"
                    UPDATE skill_reports
                    SET status = ?, admin_notes = COALESCE(?, admin_notes),
                        resolved_by = ?, resolved_at = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(status)
                .bind(admin_notes)
                .bind(admin_id)
                .bind(at.to_rfc3339())
                .bind(now_rfc3339())
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE skill_reports
                    SET status = ?, admin_notes = COALESCE(?, admin_notes), updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(status)
                .bind(admin_notes)
                .bind(now_rfc3339())
                .bind(id)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    /// Close every pending report on a skill with one resolution. Returns
    /// the number of reports closed.
    pub async fn close_pending_skill_reports(
        &self,
        skill_id: &str,
        status: &str,
        admin_notes: &str,
        admin_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let now = now_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE skill_reports
            SET status = ?, admin_notes = ?, resolved_by = ?, resolved_at = ?, updated_at = ?
            WHERE skill_id = ? AND status = 'pending'
            "#,
        )
        .bind(status)
        .bind(admin_notes)
        .bind(admin_id)
        .bind(&now)
        .bind(&now)
        .bind(skill_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // 7. Platform Message Methods
    // =========================================================================

    /// Create a platform message.
    pub async fn create_message(
        &self,
        title: &str,
        content: &str,
        message_type: &str,
        is_active: bool,
        created_by: &str,
    ) -> Result<PlatformMessage, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO platform_messages
                (id, title, content, message_type, is_active, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(title)
        .bind(content)
        .bind(message_type)
        .bind(is_active)
        .bind(created_by)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_message_by_id(&id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_message_by_id(
        &self,
        id: &str,
    ) -> Result<Option<PlatformMessage>, sqlx::Error> {
        sqlx::query_as::<_, PlatformMessage>("SELECT * FROM platform_messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Every message, newest first (admin view).
    pub async fn list_messages(&self) -> Result<Vec<PlatformMessage>, sqlx::Error> {
        sqlx::query_as::<_, PlatformMessage>(
            "SELECT * FROM platform_messages ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Active messages, newest first (public feed).
    pub async fn list_active_messages(&self) -> Result<Vec<PlatformMessage>, sqlx::Error> {
        sqlx::query_as::<_, PlatformMessage>(
            "SELECT * FROM platform_messages WHERE is_active = 1 ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Partial message update; absent fields keep their value.
    pub async fn update_message(
        &self,
        id: &str,
        title: Option<&str>,
        content: Option<&str>,
        message_type: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE platform_messages
            SET title = COALESCE(?, title),
                content = COALESCE(?, content),
                message_type = COALESCE(?, message_type),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(message_type)
        .bind(is_active)
        .bind(now_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a message; true if a row was deleted.
    pub async fn delete_message(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM platform_messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
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

    async fn make_swap(db: &Database, from: &User, to: &User) -> SwapRequest {
        let offered = db.create_skill("Guitar", "other", "").await.unwrap();
        let wanted = db.create_skill("Cooking", "other", "").await.unwrap();
        db.create_swap_request(&from.id, &to.id, &offered.id, &wanted.id, "1 hour", "evenings", "")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let db = test_db().await;
        let user = make_user(&db, "alice").await;

        let by_id = db.find_user_by_id(&user.id).await.unwrap();
        let by_email = db.find_user_by_email("alice@example.com").await.unwrap();
        let missing = db.find_user_by_id("missing").await.unwrap();

        assert!(by_id.is_some());
        assert_eq!(by_email.unwrap().username, "alice");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = test_db().await;
        make_user(&db, "alice").await;

        let result = db
            .create_user("id2", "alice2", "alice@example.com", "hash", "A", "B", false)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn ban_sets_all_fields_and_unban_clears_them() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let target = make_user(&db, "target").await;

        let banned = db
            .set_user_ban(&target.id, true, "spam", &admin.id)
            .await
            .unwrap()
            .unwrap();
        assert!(banned.is_banned);
        assert_eq!(banned.ban_reason, "spam");
        assert!(banned.ban_date.is_some());
        assert_eq!(banned.banned_by.as_deref(), Some(admin.id.as_str()));

        let unbanned = db
            .set_user_ban(&target.id, false, "", &admin.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!unbanned.is_banned);
        assert_eq!(unbanned.ban_reason, "");
        assert!(unbanned.ban_date.is_none());
        assert!(unbanned.banned_by.is_none());
    }

    #[tokio::test]
    async fn ban_unknown_user_returns_none() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let result = db.set_user_ban("missing", true, "x", &admin.id).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn user_skill_triple_is_unique() {
        let db = test_db().await;
        let user = make_user(&db, "alice").await;
        let skill = db.create_skill("Guitar", "other", "strings").await.unwrap();

        db.create_user_skill(&user.id, &skill.id, "offered", "expert")
            .await
            .unwrap();
        let dup = db
            .create_user_skill(&user.id, &skill.id, "offered", "expert")
            .await;
        assert!(dup.is_err());

        // Same skill as "wanted" is a different link
        db.create_user_skill(&user.id, &skill.id, "wanted", "")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn complete_swap_bumps_both_participants_once() {
        let db = test_db().await;
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        let swap = make_swap(&db, &alice, &bob).await;

        db.update_swap_status(&swap.id, "accepted").await.unwrap();
        db.create_session(&swap.id, None).await.unwrap();
        db.complete_swap(&swap.id).await.unwrap();

        let alice = db.find_user_by_id(&alice.id).await.unwrap().unwrap();
        let bob = db.find_user_by_id(&bob.id).await.unwrap().unwrap();
        assert_eq!(alice.completed_swaps, 1);
        assert_eq!(bob.completed_swaps, 1);

        let session = db.find_session_by_swap(&swap.id).await.unwrap().unwrap();
        assert!(session.completed);
        let first_stamp = session.completed_at.unwrap();

        // Completing again must not move the timestamp
        db.complete_swap(&swap.id).await.unwrap();
        let session = db.find_session_by_swap(&swap.id).await.unwrap().unwrap();
        assert_eq!(session.completed_at.unwrap(), first_stamp);
    }

    #[tokio::test]
    async fn rating_refresh_updates_ratee_aggregate() {
        let db = test_db().await;
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        let swap = make_swap(&db, &alice, &bob).await;

        db.update_swap_status(&swap.id, "accepted").await.unwrap();
        let session = db.create_session(&swap.id, None).await.unwrap();
        db.complete_swap(&swap.id).await.unwrap();

        // Alice rates the session; the rating lands on Bob's aggregate
        db.create_rating(&session.id, &alice.id, 4, "great").await.unwrap();
        db.refresh_user_rating(&bob.id).await.unwrap();

        let bob = db.find_user_by_id(&bob.id).await.unwrap().unwrap();
        assert!((bob.rating - 4.0).abs() < f64::EPSILON);

        // A second rating from the same rater on the same session is rejected
        let dup = db.create_rating(&session.id, &alice.id, 5, "").await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn close_pending_skill_reports_touches_only_pending() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;
        let reporter = make_user(&db, "reporter").await;
        let skill = db.create_skill("Guitar", "other", "").await.unwrap();

        let r1 = db
            .create_skill_report(&reporter.id, &skill.id, "spam", "desc one")
            .await
            .unwrap();
        let r2 = db
            .create_skill_report(&reporter.id, &skill.id, "misleading", "desc two")
            .await
            .unwrap();
        db.update_skill_report_status(&r2.id, "rejected", None, Some((&admin.id, Utc::now())))
            .await
            .unwrap();

        let closed = db
            .close_pending_skill_reports(&skill.id, "approved", "Skill approved: fine", &admin.id)
            .await
            .unwrap();
        assert_eq!(closed, 1);

        let r1 = db.find_skill_report(&r1.id).await.unwrap().unwrap();
        assert_eq!(r1.status, "approved");
        assert_eq!(r1.admin_notes, "Skill approved: fine");
        assert!(r1.resolved_at.is_some());

        let r2 = db.find_skill_report(&r2.id).await.unwrap().unwrap();
        assert_eq!(r2.status, "rejected");
    }

    #[tokio::test]
    async fn message_crud_roundtrip() {
        let db = test_db().await;
        let admin = make_user(&db, "admin").await;

        let msg = db
            .create_message("Welcome", "Hello all", "announcement", true, &admin.id)
            .await
            .unwrap();
        assert!(msg.is_active);

        db.update_message(&msg.id, None, None, None, Some(false))
            .await
            .unwrap();
        let active = db.list_active_messages().await.unwrap();
        assert!(active.is_empty());

        let all = db.list_messages().await.unwrap();
        assert_eq!(all.len(), 1);

        assert!(db.delete_message(&msg.id).await.unwrap());
        assert!(!db.delete_message(&msg.id).await.unwrap());
    }
}
