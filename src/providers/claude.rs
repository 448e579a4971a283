use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    explain_prompt, missing_field, optimize_prompt, send_json, strip_code_fences,
    translate_prompt, trimmed_base, ProviderEndpoint, ProviderId, ProviderResult,
    TranslationAdapter, TranslationRequest,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2000;

/// Anthropic Messages API integration.
#[derive(Clone)]
pub struct ClaudeAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

impl ClaudeAdapter {
    pub fn new(client: Client, endpoint: &ProviderEndpoint, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trimmed_base(&endpoint.base_url),
            api_key: api_key.into(),
            model: endpoint.model.clone(),
        }
    }

    async fn complete(&self, prompt: String) -> ProviderResult<String> {
        debug!(model = %self.model, "dispatching claude request");
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let response: MessagesResponse = send_json(ProviderId::Claude, request).await?;

        response
            .content
            .into_iter()
            .filter(|block| block.kind.as_deref().map_or(true, |kind| kind == "text"))
            .find_map(|block| block.text)
            .ok_or_else(|| missing_field(ProviderId::Claude, "content[0].text"))
    }
}

#[async_trait]
impl TranslationAdapter for ClaudeAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Claude
    }

    async fn translate(&self, request: &TranslationRequest) -> ProviderResult<String> {
        let text = self.complete(translate_prompt(request)).await?;
        Ok(strip_code_fences(&text))
    }

    async fn explain(&self, code: &str, language: &str) -> ProviderResult<String> {
        self.complete(explain_prompt(code, language)).await
    }

    async fn optimize(&self, code: &str, language: &str) -> ProviderResult<String> {
        let text = self.complete(optimize_prompt(code, language)).await?;
        Ok(strip_code_fences(&text))
    }
}
