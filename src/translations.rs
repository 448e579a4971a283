use std::sync::Arc;

use axum::{extract::Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::billing::EntitlementProjector;
use crate::db::{translations, users};
use crate::error::{AppError, AppResult};
use crate::extractor::AuthUser;
use crate::providers::{ProviderId, ProviderRouter, TranslationRequest};
use crate::quota::{QuotaDecision, QuotaGate};

pub use crate::db::translations::TranslationRecord;

pub const HISTORY_LIMIT: i64 = 50;

/// key: translation-service -> gate, route, record
///
/// Usage is recorded only after the provider has returned; a rejected or failed request
/// leaves no trace in the store.
#[derive(Clone)]
pub struct TranslationService {
    pool: SqlitePool,
    router: Arc<ProviderRouter>,
    gate: QuotaGate,
    projector: EntitlementProjector,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslateRequest {
    #[serde(alias = "sourceCode", alias = "code")]
    pub source_code: String,
    #[serde(alias = "sourceLang", alias = "sourceLanguage")]
    pub source_lang: String,
    #[serde(alias = "targetLang", alias = "targetLanguage")]
    pub target_lang: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslationOutcome {
    pub translation_id: Uuid,
    pub output_code: String,
    pub source_lang: String,
    pub target_lang: String,
    pub provider: ProviderId,
    pub quota: QuotaDecision,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeRequest {
    pub code: String,
    #[serde(alias = "lang")]
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeAssistResponse {
    pub output: String,
    pub provider: ProviderId,
}

impl TranslationService {
    pub fn new(
        pool: SqlitePool,
        router: Arc<ProviderRouter>,
        gate: QuotaGate,
        projector: EntitlementProjector,
    ) -> Self {
        Self {
            pool,
            router,
            gate,
            projector,
        }
    }

    pub fn router(&self) -> &ProviderRouter {
        &self.router
    }

    pub async fn translate(
        &self,
        user_id: Uuid,
        request: TranslateRequest,
    ) -> AppResult<TranslationOutcome> {
        require_non_empty(&[
            ("source_code", &request.source_code),
            ("source_lang", &request.source_lang),
            ("target_lang", &request.target_lang),
        ])?;

        let quota = self.admit(user_id, &request.source_code).await?;

        let provider_request = TranslationRequest {
            source_code: request.source_code,
            source_lang: request.source_lang,
            target_lang: request.target_lang,
        };
        let provider = self.router.active();
        let output_code = match self.router.translate(&provider_request).await {
            Ok(output) => output,
            Err(err) => {
                warn!(%user_id, provider = provider.as_str(), error = %err, "translation failed");
                return Err(err.into());
            }
        };

        let mut tx = self.pool.begin().await?;
        let translation_id = translations::insert_translation(
            &mut *tx,
            &translations::NewTranslation {
                user_id,
                source_lang: &provider_request.source_lang,
                target_lang: &provider_request.target_lang,
                source_code: &provider_request.source_code,
                output_code: &output_code,
                provider: provider.as_str(),
            },
            Utc::now(),
        )
        .await?;
        users::increment_translations(&mut *tx, user_id).await?;
        tx.commit().await?;

        info!(
            %user_id,
            %translation_id,
            provider = provider.as_str(),
            line_count = quota.line_count,
            source_lang = %provider_request.source_lang,
            target_lang = %provider_request.target_lang,
            "translation recorded"
        );

        Ok(TranslationOutcome {
            translation_id,
            output_code,
            source_lang: provider_request.source_lang,
            target_lang: provider_request.target_lang,
            provider,
            quota,
        })
    }

    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<TranslationRecord>> {
        Ok(translations::list_for_user(&self.pool, user_id, HISTORY_LIMIT).await?)
    }

    /// Gated like a translation but not recorded.
    pub async fn explain(&self, user_id: Uuid, request: CodeRequest) -> AppResult<String> {
        require_non_empty(&[("code", &request.code), ("language", &request.language)])?;
        self.admit(user_id, &request.code).await?;
        Ok(self.router.explain(&request.code, &request.language).await?)
    }

    pub async fn optimize(&self, user_id: Uuid, request: CodeRequest) -> AppResult<String> {
        require_non_empty(&[("code", &request.code), ("language", &request.language)])?;
        self.admit(user_id, &request.code).await?;
        Ok(self.router.optimize(&request.code, &request.language).await?)
    }

    async fn admit(&self, user_id: Uuid, source: &str) -> AppResult<QuotaDecision> {
        let entitlement = self.projector.project(user_id).await?;
        self.gate
            .authorize_translation(entitlement.role, source)
            .map_err(|err| {
                info!(%user_id, error = %err, "request rejected by quota gate");
                err
            })
    }
}

fn require_non_empty(fields: &[(&str, &String)]) -> AppResult<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{name} is required")));
        }
    }
    Ok(())
}

/// key: translations-api -> rest endpoints
pub async fn translate(
    Extension(service): Extension<TranslationService>,
    AuthUser { user_id, .. }: AuthUser,
    Json(payload): Json<TranslateRequest>,
) -> AppResult<Json<TranslationOutcome>> {
    Ok(Json(service.translate(user_id, payload).await?))
}

pub async fn history(
    Extension(service): Extension<TranslationService>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<Vec<TranslationRecord>>> {
    Ok(Json(service.history(user_id).await?))
}

pub async fn explain(
    Extension(service): Extension<TranslationService>,
    AuthUser { user_id, .. }: AuthUser,
    Json(payload): Json<CodeRequest>,
) -> AppResult<Json<CodeAssistResponse>> {
    let output = service.explain(user_id, payload).await?;
    Ok(Json(CodeAssistResponse {
        output,
        provider: service.router().active(),
    }))
}

pub async fn optimize(
    Extension(service): Extension<TranslationService>,
    AuthUser { user_id, .. }: AuthUser,
    Json(payload): Json<CodeRequest>,
) -> AppResult<Json<CodeAssistResponse>> {
    let output = service.optimize(user_id, payload).await?;
    Ok(Json(CodeAssistResponse {
        output,
        provider: service.router().active(),
    }))
}
