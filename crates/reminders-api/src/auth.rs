use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::{info, warn};

use reminders_db::validate::{MAX_EMAIL_LEN, looks_like_email};
use reminders_db::{Database, ReminderStore};
use reminders_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::{ApiError, blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub store: ReminderStore,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, jwt_secret: String, token_ttl_days: i64) -> AppState {
        Arc::new(Self {
            store: ReminderStore::new(db.clone()),
            db,
            jwt_secret,
            token_ttl_days,
        })
    }
}

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();

    // Validate input
    if email.len() > MAX_EMAIL_LEN || !looks_like_email(&email) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "A valid email is required"));
    }
    if req.password.len() < MIN_PASSWORD_LEN || req.password.len() > MAX_PASSWORD_LEN {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!(
                "Password must be {}-{} characters",
                MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
            ),
        ));
    }

    // Check if email is taken
    let db = state.db.clone();
    let lookup = email.clone();
    if blocking(move || db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(ApiError::new(StatusCode::CONFLICT, "Email already registered"));
    }

    let password_hash = hash_password(&req.password)?;

    let db = state.db.clone();
    let new_email = email.clone();
    let user_id = blocking(move || db.create_user(&new_email, &password_hash, None)).await?;

    let token = create_token(&state.jwt_secret, user_id, &email, state.token_ttl_days)
        .map_err(|_| ApiError::internal())?;

    info!("Registered user {} ({})", user_id, email);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();

    let db = state.db.clone();
    let user = blocking(move || db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Invalid email or password"))?;

    // Verify password
    if !verify_password(&req.password, &user.password)? {
        warn!("Failed login for {}", user.email);
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid email or password"));
    }

    let token = create_token(&state.jwt_secret, user.id, &user.email, state.token_ttl_days)
        .map_err(|_| ApiError::internal())?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        email: user.email,
        token,
    }))
}

/// Argon2id with a fresh random salt, PHC string form.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ApiError::internal())
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(|_| ApiError::internal())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_token(
    secret: &str,
    user_id: i64,
    email: &str,
    ttl_days: i64,
) -> anyhow::Result<String> {
    let exp = chrono::TimeDelta::try_days(ttl_days)
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| anyhow::anyhow!("token lifetime of {} days is out of range", ttl_days))?;
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: exp.timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
