// =============================================================================
// SkillSwap Backend - API Server Entry Point
// =============================================================================
// Table of Contents:
// 1. Imports
// 2. Application State
// 3. Main Entry Point
// 4. Router Setup
// =============================================================================

mod admin;
mod auth;
mod config;
mod db;
mod error;
mod export;
mod reports;
mod seed;
mod skills;
mod stats;
mod swaps;
mod users;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;

// -----------------------------------------------------------------------------
// 2. Application State
// -----------------------------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
}

// -----------------------------------------------------------------------------
// 3. Main Entry Point
// -----------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables from multiple possible locations
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_filename("crates/backend/.env");
    }

    // Load configuration
    let config = Config::from_env()?;
    let bind_addr = config.bind_address.clone();

    // Ensure database directory exists for SQLite
    if config.database_url.starts_with("sqlite:") {
        let db_path = config.database_url.trim_start_matches("sqlite:");
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
    }

    // Initialize database
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    // Seed the skill catalog and the bootstrap admin
    seed::seed_catalog(&db).await?;
    seed::ensure_bootstrap_admin(&db, &config).await?;

    // Create app state
    let state = AppState {
        config: Arc::new(config),
        db,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 SkillSwap API Server running on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// -----------------------------------------------------------------------------
// 4. Router Setup
// -----------------------------------------------------------------------------

fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Auth routes
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh_token))
        .route("/api/auth/me", get(auth::me))
        // User directory & profile
        .route("/api/users", get(users::list_users))
        .route("/api/users/:id", get(users::user_detail))
        .route("/api/profile", get(users::profile).patch(users::update_profile))
        // Skill catalog & user skills
        .route("/api/skills", get(skills::list_skills))
        .route("/api/skills/discover", get(skills::discover_skills))
        .route("/api/user-skills", get(skills::my_skills).post(skills::add_user_skill))
        .route("/api/user-skills/type/:skill_type", get(skills::my_skills_by_type))
        .route("/api/user-skills/:id", delete(skills::remove_user_skill))
        // Swap lifecycle
        .route("/api/swaps", get(swaps::my_swaps).post(swaps::create_swap))
        .route("/api/swaps/:id/respond", post(swaps::respond_to_swap))
        .route("/api/swaps/:id/cancel", post(swaps::cancel_swap))
        .route("/api/swaps/:id/complete", post(swaps::complete_swap))
        .route("/api/swaps/:id/rate", post(swaps::rate_swap))
        // Report submission
        .route("/api/reports/users", post(reports::submit_user_report))
        .route("/api/reports/skills", post(reports::submit_skill_report))
        // Platform message feed
        .route("/api/messages", get(admin::active_messages))
        // Admin: dashboard & statistics
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route("/api/admin/stats/swaps", get(admin::swap_stats))
        // Admin: user management
        .route("/api/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/api/admin/users/:id",
            get(admin::get_user).patch(admin::update_user),
        )
        .route("/api/admin/users/:id/ban", post(admin::ban_user))
        // Admin: platform messages
        .route(
            "/api/admin/messages",
            get(admin::list_messages).post(admin::create_message),
        )
        .route(
            "/api/admin/messages/:id",
            get(admin::get_message)
                .patch(admin::update_message)
                .delete(admin::delete_message),
        )
        // Admin: reports
        .route("/api/admin/reports/users", get(admin::list_user_reports))
        .route(
            "/api/admin/reports/users/:id",
            get(admin::get_user_report).patch(admin::patch_user_report),
        )
        .route("/api/admin/reports/skills", get(admin::list_skill_reports))
        .route(
            "/api/admin/reports/skills/:id",
            get(admin::get_skill_report).patch(admin::patch_skill_report),
        )
        .route("/api/admin/reports/enhanced", get(admin::enhanced_reports))
        // Admin: CSV downloads
        .route(
            "/api/admin/reports/download/enhanced",
            get(export::download_enhanced_report),
        )
        .route(
            "/api/admin/reports/download/:kind",
            get(export::download_report),
        )
        // Admin: skill moderation & swap monitoring
        .route(
            "/api/admin/skills",
            get(admin::list_skills).post(admin::moderate_skill_handler),
        )
        .route(
            "/api/admin/swaps",
            get(admin::monitor_swaps).post(admin::override_swap),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
