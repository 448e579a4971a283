use crate::billing::{Entitlement, EntitlementProjector};
use crate::db::{self, users};
use crate::extractor::{AuthUser, Claims};
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    Json,
};
use tracing::{error, info};
use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: crate::billing::Role,
    pub plan: Option<crate::billing::PlanType>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

impl From<users::UserRecord> for UserInfo {
    fn from(user: users::UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            plan: user.plan,
        }
    }
}

pub async fn register_user(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<AuthResponse>)> {
    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest("Password too short".into()));
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Message(format!("Hashing failed: {}", e)))?;
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let user = users::insert_user(&pool, &email, name, &hash.to_string(), Utc::now())
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                AppError::Conflict("Email already registered".into())
            } else {
                error!(?e, "DB error while registering user");
                AppError::Db(e)
            }
        })?;
    info!(user_id = %user.id, "user registered");

    let token = issue_token(user.id, &user.email)?;
    let headers = session_cookie(&token)?;
    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

pub async fn login_user(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    let email = payload.email.trim().to_lowercase();
    let user = users::fetch_user_by_email(&pool, &email)
        .await
        .map_err(|e| {
            error!(?e, "DB error while fetching user");
            AppError::Db(e)
        })?
        .ok_or(AppError::Unauthorized)?;
    let parsed = PasswordHash::new(&user.password_hash).map_err(|e| {
        error!(?e, "Hash parse error");
        AppError::Message(format!("Hash error: {}", e))
    })?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(AppError::Unauthorized);
    }

    let token = issue_token(user.id, &user.email)?;
    let headers = session_cookie(&token)?;
    Ok((
        headers,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

pub async fn logout_user() -> (HeaderMap, &'static str) {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::SET_COOKIE,
        HeaderValue::from_static("auth_token=deleted; HttpOnly; Path=/; Max-Age=0"),
    );
    (headers, "Logged out")
}

pub async fn current_user(
    Extension(projector): Extension<EntitlementProjector>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<Entitlement>> {
    Ok(Json(projector.project(user_id).await?))
}

pub fn issue_token(user_id: Uuid, email: &str) -> AppResult<String> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(*crate::config::JWT_EXPIRY_HOURS))
        .ok_or_else(|| AppError::Message("Token expiry out of range".into()))?
        .timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp,
    };
    let secret = crate::config::JWT_SECRET.as_str();
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(?e, "Token encoding error");
        AppError::Message("Token error".into())
    })
}

fn session_cookie(token: &str) -> AppResult<HeaderMap> {
    let value = HeaderValue::from_str(&format!(
        "auth_token={token}; HttpOnly; Secure; SameSite=Strict; Path=/"
    ))
    .map_err(|e| AppError::Message(format!("Cookie error: {}", e)))?;
    let mut headers = HeaderMap::new();
    headers.insert(axum::http::header::SET_COOKIE, value);
    Ok(headers)
}
