use axum::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

use crate::error::AppError;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token_opt = if let Some(authz) = parts.headers.get(axum::http::header::AUTHORIZATION)
        {
            authz
                .to_str()
                .ok()
                .and_then(|s| s.strip_prefix("Bearer ").map(|s| s.to_string()))
        } else if let Some(cookie_header) = parts.headers.get(axum::http::header::COOKIE) {
            let cookies = cookie_header.to_str().unwrap_or("");
            cookies.split(';').find_map(|c| {
                let c = c.trim();
                c.strip_prefix("auth_token=").map(|s| s.to_string())
            })
        } else {
            None
        };
        let token = token_opt.ok_or(AppError::Unauthorized)?;
        let secret = crate::config::JWT_SECRET.as_str();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized)?;
        let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;
        Ok(AuthUser {
            user_id,
            email: decoded.claims.email,
        })
    }
}

/// Operator credential presented in the `x-admin-key` header, if any. Whether it is valid is
/// decided by the ledger's authorizer, not here.
pub struct AdminCredential(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for AdminCredential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Ok(AdminCredential(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[tokio::test]
    async fn token_parsed_from_header() {
        let user_id = Uuid::new_v4();
        let claims = serde_json::json!({
            "sub": user_id.to_string(),
            "email": "dev@example.com",
            "exp": 9999999999u64
        });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        std::env::set_var("JWT_SECRET", "secret");
        let request = Request::builder()
            .header("Authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();
        let mut parts = request.into_parts().0;
        let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "dev@example.com");
    }

    #[tokio::test]
    async fn invalid_token_rejected() {
        std::env::set_var("JWT_SECRET", "secret");
        let request = Request::builder()
            .header("Authorization", "Bearer invalid")
            .body(axum::body::Body::empty())
            .unwrap();
        let mut parts = request.into_parts().0;
        let res = AuthUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(res, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn admin_credential_is_optional() {
        let request = Request::builder()
            .header(ADMIN_KEY_HEADER, " operator ")
            .body(axum::body::Body::empty())
            .unwrap();
        let mut parts = request.into_parts().0;
        let AdminCredential(value) = AdminCredential::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("operator"));

        let request = Request::builder().body(axum::body::Body::empty()).unwrap();
        let mut parts = request.into_parts().0;
        let AdminCredential(value) = AdminCredential::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(value.is_none());
    }
}
