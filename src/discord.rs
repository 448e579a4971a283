use axum::{extract::Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{self, users};
use crate::error::{AppError, AppResult};
use crate::extractor::AuthUser;

/// key: discord-link -> off-band payment contact
#[derive(Debug, Deserialize)]
pub struct LinkDiscordRequest {
    #[serde(alias = "discordUserId", alias = "discordId")]
    pub discord_user_id: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DiscordInfo {
    pub discord_linked: bool,
    pub discord_user_id: Option<String>,
}

pub async fn link_discord(
    Extension(pool): Extension<SqlitePool>,
    AuthUser { user_id, .. }: AuthUser,
    Json(payload): Json<LinkDiscordRequest>,
) -> AppResult<Json<DiscordInfo>> {
    let handle = payload.discord_user_id.trim();
    if handle.is_empty() {
        return Err(AppError::BadRequest("discord_user_id is required".into()));
    }

    let updated = users::set_discord_user_id(&pool, user_id, handle, Utc::now())
        .await
        .map_err(|err| {
            if db::is_unique_violation(&err) {
                AppError::Conflict("discord account already linked to another user".into())
            } else {
                AppError::Db(err)
            }
        })?;
    if updated == 0 {
        return Err(AppError::NotFound("user"));
    }

    info!(%user_id, "discord account linked");
    Ok(Json(DiscordInfo {
        discord_linked: true,
        discord_user_id: Some(handle.to_string()),
    }))
}

pub async fn discord_info(
    Extension(pool): Extension<SqlitePool>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<DiscordInfo>> {
    let user = users::fetch_user(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(DiscordInfo {
        discord_linked: user.discord_user_id.is_some(),
        discord_user_id: user.discord_user_id,
    }))
}
