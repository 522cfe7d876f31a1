// =============================================================================
// SkillSwap Backend - Authentication & Access Gate
// =============================================================================

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts},
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::{User, UserResponse};
use crate::error::ApiError;
use crate::AppState;

// -----------------------------------------------------------------------------
// JWT Claims
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub exp: i64,     // Expiry timestamp
    pub iat: i64,     // Issued at
}

// -----------------------------------------------------------------------------
// Extractors
// -----------------------------------------------------------------------------

/// Authenticated caller resolved from the bearer token. Banned accounts are
/// rejected here, so no handler behind this extractor sees them.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

/// Authenticated caller with the administrative flag set. Every moderation
/// and reporting handler takes this explicitly; there is no ambient admin
/// state anywhere else.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: User,
}

async fn resolve_caller(parts: &mut Parts, state: &AppState) -> Result<User, ApiError> {
    let token = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = validate_token(token, &state.config.jwt_secret)?;

    let user = state
        .db
        .find_user_by_id(&claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if user.is_banned {
        return Err(ApiError::Forbidden("Account is banned".into()));
    }

    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_caller(parts, state).await?;
        Ok(AuthUser { user })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_caller(parts, state).await?;
        if !user.is_admin {
            return Err(ApiError::Forbidden("Administrator access required".into()));
        }
        Ok(AdminUser { user })
    }
}

// -----------------------------------------------------------------------------
// Request/Response Types
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

// -----------------------------------------------------------------------------
// Helper Functions
// -----------------------------------------------------------------------------

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Invalid stored hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a JWT token for a user.
pub fn generate_token(user_id: &str, secret: &str, expiry_hours: i64) -> Result<String, ApiError> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiry_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token generation failed: {e}")))
}

/// Validate a JWT token and extract claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}

// -----------------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------------

/// Register a new user.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if req.password != req.password_confirm {
        return Err(ApiError::Validation("Passwords don't match".into()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }

    if state.db.find_user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }
    if state.db.find_user_by_username(&req.username).await?.is_some() {
        return Err(ApiError::Conflict("Username already taken".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = uuid::Uuid::new_v4().to_string();
    let user = state
        .db
        .create_user(
            &user_id,
            &req.username,
            &req.email,
            &password_hash,
            &req.first_name,
            &req.last_name,
            false,
        )
        .await?;

    let token = generate_token(&user.id, &state.config.jwt_secret, state.config.jwt_expiry_hours)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Login with email and password.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .db
        .find_user_by_email(&req.email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized);
    }

    if user.is_banned {
        return Err(ApiError::Forbidden("Account is banned".into()));
    }

    state.db.touch_last_login(&user.id).await?;

    let token = generate_token(&user.id, &state.config.jwt_secret, state.config.jwt_expiry_hours)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Get current user from token.
pub async fn me(auth: AuthUser) -> Json<UserResponse> {
    Json(auth.user.into())
}

/// Refresh auth token.
pub async fn refresh_token(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<RefreshResponse>, ApiError> {
    let token = generate_token(
        &auth.user.id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )?;
    Ok(Json(RefreshResponse { token }))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Database;
    use std::sync::Arc;

    async fn test_state() -> AppState {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        AppState {
            config: Arc::new(Config {
                bind_address: "127.0.0.1:0".into(),
                database_url: "sqlite::memory:".into(),
                jwt_secret: "test-secret".into(),
                jwt_expiry_hours: 24,
                admin_email: None,
                admin_password: None,
                admin_username: "admin".into(),
            }),
            db,
        }
    }

    fn register_request(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "hunter22".into(),
            password_confirm: "hunter22".into(),
            first_name: "Test".into(),
            last_name: "User".into(),
        }
    }

    #[test]
    fn password_roundtrip_verifies() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn token_roundtrip_preserves_subject() {
        let token = generate_token("user-1", "secret", 24).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = generate_token("user-1", "secret", 24).unwrap();
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[tokio::test]
    async fn register_rejects_password_mismatch() {
        let state = test_state().await;
        let mut req = register_request("alice@example.com", "alice");
        req.password_confirm = "different".into();

        let result = register(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let state = test_state().await;
        register(State(state.clone()), Json(register_request("alice@example.com", "alice")))
            .await
            .unwrap();

        let result = register(
            State(state),
            Json(register_request("alice@example.com", "alice2")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn login_verifies_credentials_and_stamps_last_login() {
        let state = test_state().await;
        register(State(state.clone()), Json(register_request("alice@example.com", "alice")))
            .await
            .unwrap();

        let ok = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "alice@example.com".into(),
                password: "hunter22".into(),
            }),
        )
        .await
        .unwrap();
        assert!(!ok.0.token.is_empty());

        let user = state
            .db
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(user.last_login.is_some());

        let bad = login(
            State(state),
            Json(LoginRequest {
                email: "alice@example.com".into(),
                password: "wrong".into(),
            }),
        )
        .await;
        assert!(matches!(bad, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn banned_accounts_cannot_login() {
        let state = test_state().await;
        let registered = register(
            State(state.clone()),
            Json(register_request("alice@example.com", "alice")),
        )
        .await
        .unwrap();
        let admin = register(
            State(state.clone()),
            Json(register_request("admin@example.com", "admin")),
        )
        .await
        .unwrap();

        state
            .db
            .set_user_ban(&registered.0.user.id, true, "spam", &admin.0.user.id)
            .await
            .unwrap();

        let result = login(
            State(state),
            Json(LoginRequest {
                email: "alice@example.com".into(),
                password: "hunter22".into(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }
}
