use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::{
    http_client, ClaudeAdapter, GeminiAdapter, HuggingFaceAdapter, OllamaAdapter, ProviderError,
    ProviderId, ProviderResult, ProviderSettings, TranslationAdapter, TranslationRequest,
};

/// key: provider-router -> one adapter per request
///
/// The active provider is fixed at construction. Output text is passed through exactly as
/// the adapter returned it.
#[derive(Clone)]
pub struct ProviderRouter {
    active: ProviderId,
    adapters: HashMap<ProviderId, Arc<dyn TranslationAdapter>>,
}

impl std::fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRouter")
            .field("active", &self.active)
            .field("registered", &self.registered())
            .finish()
    }
}

impl ProviderRouter {
    /// Fails with `UnknownProvider` when `active` has no registered adapter.
    pub fn new(
        active: ProviderId,
        adapters: impl IntoIterator<Item = Arc<dyn TranslationAdapter>>,
    ) -> ProviderResult<Self> {
        let adapters: HashMap<ProviderId, Arc<dyn TranslationAdapter>> = adapters
            .into_iter()
            .map(|adapter| (adapter.provider(), adapter))
            .collect();
        if !adapters.contains_key(&active) {
            return Err(ProviderError::UnknownProvider {
                provider: active.to_string(),
            });
        }
        Ok(Self { active, adapters })
    }

    /// Registers every backend whose credentials are present and selects `settings.active`.
    pub fn from_settings(settings: &ProviderSettings) -> ProviderResult<Self> {
        let active: ProviderId = settings.active.parse()?;
        let client = http_client(settings.timeout)?;

        let mut adapters: Vec<Arc<dyn TranslationAdapter>> = Vec::new();
        if let Some(key) = settings.gemini.api_key.as_deref() {
            adapters.push(Arc::new(GeminiAdapter::new(
                client.clone(),
                &settings.gemini,
                key,
            )));
        }
        if let Some(key) = settings.huggingface.api_key.as_deref() {
            adapters.push(Arc::new(HuggingFaceAdapter::new(
                client.clone(),
                &settings.huggingface,
                key,
            )));
        }
        if let Some(key) = settings.claude.api_key.as_deref() {
            adapters.push(Arc::new(ClaudeAdapter::new(
                client.clone(),
                &settings.claude,
                key,
            )));
        }
        adapters.push(Arc::new(OllamaAdapter::new(client, &settings.ollama)));

        let router = Self::new(active, adapters)?;
        info!(
            active = %router.active,
            registered = ?router.registered(),
            "provider router configured"
        );
        Ok(router)
    }

    pub fn active(&self) -> ProviderId {
        self.active
    }

    pub fn registered(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|provider| self.adapters.contains_key(provider))
            .collect()
    }

    fn adapter(&self, provider: ProviderId) -> ProviderResult<&Arc<dyn TranslationAdapter>> {
        self.adapters
            .get(&provider)
            .ok_or_else(|| ProviderError::UnknownProvider {
                provider: provider.to_string(),
            })
    }

    pub async fn translate(&self, request: &TranslationRequest) -> ProviderResult<String> {
        self.translate_with(self.active, request).await
    }

    pub async fn translate_with(
        &self,
        provider: ProviderId,
        request: &TranslationRequest,
    ) -> ProviderResult<String> {
        let adapter = self.adapter(provider)?;
        adapter.translate(request).await.map_err(|err| {
            warn!(%provider, error = %err, "translation provider call failed");
            err
        })
    }

    pub async fn explain(&self, code: &str, language: &str) -> ProviderResult<String> {
        let adapter = self.adapter(self.active)?;
        adapter.explain(code, language).await
    }

    pub async fn optimize(&self, code: &str, language: &str) -> ProviderResult<String> {
        let adapter = self.adapter(self.active)?;
        adapter.optimize(code, language).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Capability, FailureCause, ProviderEndpoint};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct RecordingAdapter {
        provider: ProviderId,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TranslationAdapter for RecordingAdapter {
        fn provider(&self) -> ProviderId {
            self.provider
        }

        async fn translate(&self, request: &TranslationRequest) -> ProviderResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("[{}] {}", self.provider, request.source_code))
        }
    }

    struct FailingAdapter;

    #[async_trait]
    impl TranslationAdapter for FailingAdapter {
        fn provider(&self) -> ProviderId {
            ProviderId::Claude
        }

        async fn translate(&self, _request: &TranslationRequest) -> ProviderResult<String> {
            Err(ProviderError::failure(
                ProviderId::Claude,
                FailureCause::Status(500),
            ))
        }
    }

    fn recording(provider: ProviderId) -> (Arc<dyn TranslationAdapter>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = Arc::new(RecordingAdapter {
            provider,
            calls: calls.clone(),
        });
        (adapter, calls)
    }

    fn request() -> TranslationRequest {
        TranslationRequest {
            source_code: "print(1)".into(),
            source_lang: "python".into(),
            target_lang: "rust".into(),
        }
    }

    fn endpoint(base_url: &str, api_key: Option<&str>) -> ProviderEndpoint {
        ProviderEndpoint {
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
            model: "test-model".to_string(),
        }
    }

    fn settings(active: &str) -> ProviderSettings {
        ProviderSettings {
            active: active.to_string(),
            timeout: Duration::from_secs(5),
            gemini: endpoint("http://127.0.0.1:9", None),
            huggingface: endpoint("http://127.0.0.1:9", None),
            claude: endpoint("http://127.0.0.1:9", Some("key")),
            ollama: endpoint("http://127.0.0.1:9", None),
        }
    }

    #[tokio::test]
    async fn unregistered_active_provider_fails_fast() {
        let (gemini, calls) = recording(ProviderId::Gemini);
        let err = ProviderRouter::new(ProviderId::Claude, vec![gemini]).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::UnknownProvider { ref provider } if provider == "claude"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn override_to_unregistered_provider_makes_no_call() {
        let (gemini, calls) = recording(ProviderId::Gemini);
        let router = ProviderRouter::new(ProviderId::Gemini, vec![gemini]).unwrap();
        let err = router
            .translate_with(ProviderId::Ollama, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn swapping_active_provider_only_changes_adapter() {
        let (gemini, gemini_calls) = recording(ProviderId::Gemini);
        let (ollama, ollama_calls) = recording(ProviderId::Ollama);
        let adapters = vec![gemini, ollama];

        let first = ProviderRouter::new(ProviderId::Gemini, adapters.clone()).unwrap();
        let second = ProviderRouter::new(ProviderId::Ollama, adapters).unwrap();

        let a = first.translate(&request()).await.unwrap();
        let b = second.translate(&request()).await.unwrap();

        assert_eq!(a, "[gemini] print(1)");
        assert_eq!(b, "[ollama] print(1)");
        assert_eq!(gemini_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ollama_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn adapter_failures_pass_through_unchanged() {
        let router = ProviderRouter::new(ProviderId::Claude, vec![
            Arc::new(FailingAdapter) as Arc<dyn TranslationAdapter>
        ])
        .unwrap();
        let err = router.translate(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::ProviderFailure {
                provider: ProviderId::Claude,
                cause: FailureCause::Status(500)
            }
        ));
    }

    #[tokio::test]
    async fn missing_capability_is_reported() {
        let (ollama, _) = recording(ProviderId::Ollama);
        let router = ProviderRouter::new(ProviderId::Ollama, vec![ollama]).unwrap();
        let err = router.explain("x", "python").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::CapabilityUnsupported {
                provider: ProviderId::Ollama,
                capability: Capability::Explain
            }
        ));
    }

    #[test]
    fn settings_register_only_credentialed_backends() {
        let router = ProviderRouter::from_settings(&settings("claude")).unwrap();
        assert_eq!(router.active(), ProviderId::Claude);
        assert_eq!(
            router.registered(),
            vec![ProviderId::Claude, ProviderId::Ollama]
        );
    }

    #[test]
    fn settings_without_credentials_for_active_provider_fail() {
        let err = ProviderRouter::from_settings(&settings("gemini")).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider { .. }));

        let err = ProviderRouter::from_settings(&settings("mystery")).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::UnknownProvider { ref provider } if provider == "mystery"
        ));
    }
}
