use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    missing_field, send_json, strip_code_fences, trimmed_base, ProviderEndpoint, ProviderId,
    ProviderResult, TranslationAdapter, TranslationRequest,
};

/// Hugging Face hosted inference integration. Only supports translation.
#[derive(Clone)]
pub struct HuggingFaceAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct InferenceOutput {
    generated_text: Option<String>,
}

impl HuggingFaceAdapter {
    pub fn new(client: Client, endpoint: &ProviderEndpoint, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trimmed_base(&endpoint.base_url),
            api_key: api_key.into(),
            model: endpoint.model.clone(),
        }
    }
}

#[async_trait]
impl TranslationAdapter for HuggingFaceAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    async fn translate(&self, request: &TranslationRequest) -> ProviderResult<String> {
        let prompt = format!(
            "Translate this {} code to {}. Only return the translated code:\n\n{}",
            request.source_lang, request.target_lang, request.source_code
        );
        let url = format!("{}/models/{}", self.base_url, self.model);
        debug!(model = %self.model, "dispatching huggingface request");
        let body = InferenceRequest {
            inputs: &prompt,
            parameters: InferenceParameters {
                return_full_text: false,
            },
        };
        let builder = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body);
        let outputs: Vec<InferenceOutput> = send_json(ProviderId::HuggingFace, builder).await?;

        let text = outputs
            .into_iter()
            .next()
            .and_then(|output| output.generated_text)
            .ok_or_else(|| missing_field(ProviderId::HuggingFace, "[0].generated_text"))?;
        // Some text-generation models ignore return_full_text and echo the prompt.
        let text = text.strip_prefix(prompt.as_str()).unwrap_or(&text);
        Ok(strip_code_fences(text.trim_start_matches('\n')))
    }
}
