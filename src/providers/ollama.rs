use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    missing_field, send_json, strip_code_fences, trimmed_base, ProviderEndpoint, ProviderId,
    ProviderResult, TranslationAdapter, TranslationRequest,
};

/// Local Ollama daemon. Needs no credential.
#[derive(Clone)]
pub struct OllamaAdapter {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaAdapter {
    pub fn new(client: Client, endpoint: &ProviderEndpoint) -> Self {
        Self {
            client,
            base_url: trimmed_base(&endpoint.base_url),
            model: endpoint.model.clone(),
        }
    }
}

#[async_trait]
impl TranslationAdapter for OllamaAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Ollama
    }

    async fn translate(&self, request: &TranslationRequest) -> ProviderResult<String> {
        debug!(model = %self.model, "dispatching ollama request");
        let body = GenerateRequest {
            model: &self.model,
            prompt: format!(
                "Translate this {} code to {}. Only return the translated code:\n\n{}",
                request.source_lang, request.target_lang, request.source_code
            ),
            stream: false,
        };
        let builder = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body);
        let response: GenerateResponse = send_json(ProviderId::Ollama, builder).await?;

        let text = response
            .response
            .ok_or_else(|| missing_field(ProviderId::Ollama, "response"))?;
        Ok(strip_code_fences(&text))
    }
}
