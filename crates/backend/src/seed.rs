// =============================================================================
// SkillSwap Backend - Startup Seeding (skill catalog, bootstrap admin)
// =============================================================================

use crate::auth::hash_password;
use crate::config::Config;
use crate::db::Database;
use crate::error::ApiError;

/// Stock skill catalog, inserted when missing.
const SAMPLE_SKILLS: &[(&str, &str, &str)] = &[
    // Programming
    ("Python Programming", "programming", "Learn Python programming language for web development, data science, and automation"),
    ("JavaScript", "programming", "Master JavaScript for frontend and backend web development"),
    ("React Development", "programming", "Build modern web applications with React framework"),
    ("Mobile Development", "mobile", "Develop mobile apps for iOS and Android platforms"),
    ("Web Development", "programming", "Build websites and web applications using modern technologies"),
    // Design
    ("Graphic Design", "design", "Design logos, posters, and visual content"),
    ("UI/UX Design", "design", "Create user interfaces and user experience designs"),
    ("Digital Art", "design", "Create digital artwork using Photoshop, Illustrator, or Procreate"),
    ("Photography", "design", "Learn photography techniques and composition"),
    ("Video Editing", "design", "Edit videos using Premiere Pro, Final Cut, or DaVinci Resolve"),
    // Marketing
    ("Digital Marketing", "marketing", "Learn SEO, social media marketing, and content strategy"),
    ("Content Marketing", "marketing", "Create engaging content for digital platforms"),
    ("Social Media Marketing", "marketing", "Manage social media presence and campaigns"),
    ("Email Marketing", "marketing", "Design and execute email marketing campaigns"),
    ("Brand Strategy", "marketing", "Develop brand identity and marketing strategies"),
    // Business
    ("Project Management", "business", "Manage projects effectively using Agile and Scrum methodologies"),
    ("Business Strategy", "business", "Develop business strategies and market analysis"),
    ("Financial Planning", "business", "Learn personal and business financial planning"),
    ("Public Speaking", "business", "Improve public speaking and presentation skills"),
    ("Leadership", "business", "Develop leadership and team management skills"),
    // Data Science
    ("Data Analysis", "data", "Analyze and visualize data using Python, R, or Excel"),
    ("Machine Learning", "data", "Learn machine learning algorithms and AI applications"),
    ("Data Visualization", "data", "Create compelling data visualizations and dashboards"),
    ("Statistical Analysis", "data", "Apply statistical methods to analyze data"),
    ("Big Data", "data", "Work with large datasets and big data technologies"),
    // Other
    ("Spanish Language", "other", "Learn Spanish language for communication and cultural exchange"),
    ("French Language", "other", "Master French language and culture"),
    ("Guitar", "other", "Learn to play acoustic or electric guitar"),
    ("Cooking", "other", "Learn to cook various cuisines and techniques"),
    ("Yoga", "other", "Practice yoga for flexibility, strength, and mindfulness"),
];

/// Insert any missing catalog entries. Returns the number created.
pub async fn seed_catalog(db: &Database) -> Result<usize, sqlx::Error> {
    let mut created = 0;
    for (name, category, description) in SAMPLE_SKILLS {
        if db.find_skill_by_name(name).await?.is_none() {
            db.create_skill(name, category, description).await?;
            created += 1;
        }
    }
    if created > 0 {
        tracing::info!("Seeded {} catalog skills", created);
    }
    Ok(created)
}

/// Create the bootstrap admin account from config when no admin exists.
pub async fn ensure_bootstrap_admin(db: &Database, config: &Config) -> Result<(), ApiError> {
    if db.admin_exists().await? {
        return Ok(());
    }
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::warn!("No admin account exists and ADMIN_EMAIL/ADMIN_PASSWORD are not set");
        return Ok(());
    };

    if db.find_user_by_email(email).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Bootstrap admin email {email} is taken by a non-admin account"
        )));
    }

    let password_hash = hash_password(password)?;
    let id = uuid::Uuid::new_v4().to_string();
    db.create_user(
        &id,
        &config.admin_username,
        email,
        &password_hash,
        "Admin",
        "User",
        true,
    )
    .await?;

    tracing::info!("Created bootstrap admin account {}", email);
    Ok(())
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

    fn test_config(email: Option<&str>, password: Option<&str>) -> Config {
        Config {
            bind_address: "127.0.0.1:0".into(),
            database_url: "sqlite::memory:".into(),
            jwt_secret: "test-secret".into(),
            jwt_expiry_hours: 24,
            admin_email: email.map(String::from),
            admin_password: password.map(String::from),
            admin_username: "admin".into(),
        }
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let db = test_db().await;

        let first = seed_catalog(&db).await.unwrap();
        assert_eq!(first, SAMPLE_SKILLS.len());

        let second = seed_catalog(&db).await.unwrap();
        assert_eq!(second, 0);
        assert_eq!(db.count_skills().await.unwrap() as usize, SAMPLE_SKILLS.len());
    }

    #[tokio::test]
    async fn bootstrap_admin_created_once() {
        let db = test_db().await;
        let config = test_config(Some("admin@skillswap.com"), Some("admin123"));

        ensure_bootstrap_admin(&db, &config).await.unwrap();
        assert!(db.admin_exists().await.unwrap());

        // Second run is a no-op
        ensure_bootstrap_admin(&db, &config).await.unwrap();
        let admin = db
            .find_user_by_email("admin@skillswap.com")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.is_admin);
    }

    #[tokio::test]
    async fn bootstrap_without_credentials_is_a_noop() {
        let db = test_db().await;
        let config = test_config(None, None);

        ensure_bootstrap_admin(&db, &config).await.unwrap();
        assert!(!db.admin_exists().await.unwrap());
    }
}
