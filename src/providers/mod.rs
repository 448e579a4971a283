//! Translation backends behind one capability interface.
//!
//! Every adapter performs exactly one outbound call per operation and funnels all
//! transport, status, and decoding problems into [`ProviderError::ProviderFailure`], so
//! callers of [`ProviderRouter`] never see backend-specific error shapes.

pub mod claude;
pub mod gemini;
pub mod huggingface;
pub mod ollama;
pub mod router;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use claude::ClaudeAdapter;
pub use gemini::GeminiAdapter;
pub use huggingface::HuggingFaceAdapter;
pub use ollama::OllamaAdapter;
pub use router::ProviderRouter;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// key: provider-id -> closed adapter set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    HuggingFace,
    Claude,
    Ollama,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Gemini,
        ProviderId::HuggingFace,
        ProviderId::Claude,
        ProviderId::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::HuggingFace => "huggingface",
            ProviderId::Claude => "claude",
            ProviderId::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderId::Gemini),
            "huggingface" => Ok(ProviderId::HuggingFace),
            "claude" => Ok(ProviderId::Claude),
            "ollama" => Ok(ProviderId::Ollama),
            _ => Err(ProviderError::UnknownProvider {
                provider: value.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Translate,
    Explain,
    Optimize,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Translate => "translate",
            Capability::Explain => "explain",
            Capability::Optimize => "optimize",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an outbound provider call did not produce text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureCause {
    Timeout,
    Transport(String),
    Status(u16),
    MalformedResponse(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Timeout => f.write_str("timeout"),
            FailureCause::Transport(detail) => write!(f, "transport: {detail}"),
            FailureCause::Status(code) => write!(f, "status {code}"),
            FailureCause::MalformedResponse(detail) => write!(f, "malformed response: {detail}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider `{provider}`")]
    UnknownProvider { provider: String },
    #[error("provider {provider} failed: {cause}")]
    ProviderFailure {
        provider: ProviderId,
        cause: FailureCause,
    },
    #[error("provider {provider} does not support {capability}")]
    CapabilityUnsupported {
        provider: ProviderId,
        capability: Capability,
    },
    #[error("provider configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    pub fn failure(provider: ProviderId, cause: FailureCause) -> Self {
        ProviderError::ProviderFailure { provider, cause }
    }

    pub fn unsupported(provider: ProviderId, capability: Capability) -> Self {
        ProviderError::CapabilityUnsupported {
            provider,
            capability,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationRequest {
    pub source_code: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// key: provider-adapter -> one backend integration
#[async_trait]
pub trait TranslationAdapter: Send + Sync {
    fn provider(&self) -> ProviderId;

    async fn translate(&self, request: &TranslationRequest) -> ProviderResult<String>;

    async fn explain(&self, _code: &str, _language: &str) -> ProviderResult<String> {
        Err(ProviderError::unsupported(self.provider(), Capability::Explain))
    }

    async fn optimize(&self, _code: &str, _language: &str) -> ProviderResult<String> {
        Err(ProviderError::unsupported(self.provider(), Capability::Optimize))
    }
}

/// Credentials and location of one backend.
#[derive(Clone, Debug, Default)]
pub struct ProviderEndpoint {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct ProviderSettings {
    pub active: String,
    pub timeout: Duration,
    pub gemini: ProviderEndpoint,
    pub huggingface: ProviderEndpoint,
    pub claude: ProviderEndpoint,
    pub ollama: ProviderEndpoint,
}

pub fn http_client(timeout: Duration) -> ProviderResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ProviderError::Configuration(err.to_string()))
}

pub fn translate_prompt(request: &TranslationRequest) -> String {
    format!(
        "Translate this {} code to {}. Only return the translated code, no explanations or markdown:\n\n{}",
        request.source_lang, request.target_lang, request.source_code
    )
}

pub fn explain_prompt(code: &str, language: &str) -> String {
    format!("Explain this {language} code clearly and concisely:\n\n{code}")
}

pub fn optimize_prompt(code: &str, language: &str) -> String {
    format!(
        "Optimize this {language} code for performance and readability. Only return the optimized code:\n\n{code}"
    )
}

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_+#.\-]*[ \t]*\r?\n(.*?)\r?\n?```\s*$")
        .expect("code fence pattern compiles")
});

/// Removes a single Markdown code fence wrapped around the whole output.
pub fn strip_code_fences(text: &str) -> String {
    match CODE_FENCE.captures(text).and_then(|captures| captures.get(1)) {
        Some(body) => body.as_str().to_string(),
        None => text.to_string(),
    }
}

pub(crate) fn trimmed_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Sends one request and decodes a JSON body, mapping every failure to `ProviderFailure`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: ProviderId,
    request: RequestBuilder,
) -> ProviderResult<T> {
    let response = request
        .send()
        .await
        .map_err(|err| transport_failure(provider, err))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::failure(
            provider,
            FailureCause::Status(status.as_u16()),
        ));
    }
    response.json::<T>().await.map_err(|err| {
        if err.is_timeout() {
            ProviderError::failure(provider, FailureCause::Timeout)
        } else {
            ProviderError::failure(
                provider,
                FailureCause::MalformedResponse(err.without_url().to_string()),
            )
        }
    })
}

// Request URLs may carry credentials, so they never reach the error text.
fn transport_failure(provider: ProviderId, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::failure(provider, FailureCause::Timeout)
    } else {
        ProviderError::failure(provider, FailureCause::Transport(err.without_url().to_string()))
    }
}

pub(crate) fn missing_field(provider: ProviderId, path: &str) -> ProviderError {
    ProviderError::failure(
        provider,
        FailureCause::MalformedResponse(format!("{path} missing")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_parse_case_insensitively() {
        assert_eq!("Gemini".parse::<ProviderId>().unwrap(), ProviderId::Gemini);
        assert_eq!(
            " huggingface ".parse::<ProviderId>().unwrap(),
            ProviderId::HuggingFace
        );
        for provider in ProviderId::ALL {
            assert_eq!(provider.as_str().parse::<ProviderId>().unwrap(), provider);
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = "openai".parse::<ProviderId>().unwrap_err();
        assert!(matches!(
            err,
            ProviderError::UnknownProvider { ref provider } if provider == "openai"
        ));
    }

    #[test]
    fn fenced_output_is_unwrapped() {
        let fenced = "```rust\nfn main() {}\n```";
        assert_eq!(strip_code_fences(fenced), "fn main() {}");

        let bare_fence = "\n```\nprint('hi')\nprint('bye')\n```\n";
        assert_eq!(strip_code_fences(bare_fence), "print('hi')\nprint('bye')");
    }

    #[test]
    fn unfenced_output_is_untouched() {
        let plain = "def f():\n    return 1\n";
        assert_eq!(strip_code_fences(plain), plain);

        let inline = "use ```rust``` fences";
        assert_eq!(strip_code_fences(inline), inline);
    }

    #[test]
    fn translate_prompt_names_both_languages() {
        let prompt = translate_prompt(&TranslationRequest {
            source_code: "x = 1".into(),
            source_lang: "python".into(),
            target_lang: "rust".into(),
        });
        assert!(prompt.starts_with("Translate this python code to rust."));
        assert!(prompt.ends_with("x = 1"));
    }

    #[test]
    fn failure_cause_renders_timeout() {
        let err = ProviderError::failure(ProviderId::Ollama, FailureCause::Timeout);
        assert_eq!(err.to_string(), "provider ollama failed: timeout");
    }
}
