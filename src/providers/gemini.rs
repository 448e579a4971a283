use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    explain_prompt, missing_field, optimize_prompt, send_json, strip_code_fences,
    translate_prompt, trimmed_base, ProviderEndpoint, ProviderId, ProviderResult,
    TranslationAdapter, TranslationRequest,
};

/// Google Gemini `generateContent` integration.
#[derive(Clone)]
pub struct GeminiAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

impl GeminiAdapter {
    pub fn new(client: Client, endpoint: &ProviderEndpoint, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trimmed_base(&endpoint.base_url),
            api_key: api_key.into(),
            model: endpoint.model.clone(),
        }
    }

    async fn generate(&self, prompt: String) -> ProviderResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, "dispatching gemini request");
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };
        let request = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let response: GeminiResponse = send_json(ProviderId::Gemini, request).await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| missing_field(ProviderId::Gemini, "candidates[0].content.parts[0].text"))
    }
}

#[async_trait]
impl TranslationAdapter for GeminiAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn translate(&self, request: &TranslationRequest) -> ProviderResult<String> {
        let text = self.generate(translate_prompt(request)).await?;
        Ok(strip_code_fences(&text))
    }

    async fn explain(&self, code: &str, language: &str) -> ProviderResult<String> {
        self.generate(explain_prompt(code, language)).await
    }

    async fn optimize(&self, code: &str, language: &str) -> ProviderResult<String> {
        let text = self.generate(optimize_prompt(code, language)).await?;
        Ok(strip_code_fences(&text))
    }
}
