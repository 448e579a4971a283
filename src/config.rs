use once_cell::sync::Lazy;
use std::time::Duration;

use crate::providers::{ProviderEndpoint, ProviderSettings};

/// Secret used for JWT signing. Must be set via the `JWT_SECRET` env variable.
pub static JWT_SECRET: Lazy<String> =
    Lazy::new(|| std::env::var("JWT_SECRET").expect("JWT_SECRET must be set"));

/// Lifetime of issued access tokens in hours. Defaults to `24`.
pub static JWT_EXPIRY_HOURS: Lazy<i64> = Lazy::new(|| {
    std::env::var("JWT_EXPIRY_HOURS")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(24)
});

/// Database connection string. Defaults to a local SQLite file created on demand.
pub static DATABASE_URL: Lazy<String> = Lazy::new(|| {
    read_optional_env("DATABASE_URL").unwrap_or_else(|| "sqlite://arx.db?mode=rwc".to_string())
});

/// Shared secret presented by the operator in the `x-admin-key` header when verifying
/// payments. When unset every verification attempt is rejected.
pub static ADMIN_KEY: Lazy<Option<String>> = Lazy::new(|| read_optional_env("ADMIN_KEY"));

/// Operator handle quoted in payment instructions.
pub static DISCORD_OWNER_ID: Lazy<String> =
    Lazy::new(|| read_optional_env("DISCORD_OWNER_ID").unwrap_or_else(|| "owner".to_string()));

/// Translation backend used when a request does not override it. Defaults to `gemini`.
pub static AI_PROVIDER: Lazy<String> =
    Lazy::new(|| read_optional_env("AI_PROVIDER").unwrap_or_else(|| "gemini".to_string()));

/// Upper bound for a single outbound provider call. Defaults to `60` seconds.
pub static PROVIDER_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
    std::env::var("PROVIDER_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(60)
});

/// Maximum number of source lines a free account may submit. Defaults to `100`.
pub static FREE_TIER_LINE_LIMIT: Lazy<usize> = Lazy::new(|| {
    std::env::var("FREE_TIER_LINE_LIMIT")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(100)
});

/// key: billing-config -> lapse scan cadence
pub static BILLING_RENEWAL_SCAN_INTERVAL_SECS: Lazy<u64> = Lazy::new(|| {
    std::env::var("BILLING_RENEWAL_SCAN_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(300)
});

/// Address the HTTP server should bind to. Defaults to `0.0.0.0`.
pub static BIND_ADDRESS: Lazy<String> =
    Lazy::new(|| std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()));

/// Port the HTTP server should listen on. Defaults to `3001`.
pub static BIND_PORT: Lazy<u16> = Lazy::new(|| {
    std::env::var("BIND_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001)
});

/// When set to a truthy value, allows the application to continue running even if database
/// migrations fail. Defaults to `false`.
pub static ALLOW_MIGRATION_FAILURE: Lazy<bool> = Lazy::new(|| {
    std::env::var("ALLOW_MIGRATION_FAILURE")
        .ok()
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            matches!(normalized.as_str(), "1" | "true" | "yes")
        })
        .unwrap_or(false)
});

/// Collects per-provider credentials and endpoints. The router receives this value at
/// construction; adapters never consult the environment themselves.
pub fn provider_settings_from_env() -> ProviderSettings {
    ProviderSettings {
        active: AI_PROVIDER.clone(),
        timeout: Duration::from_secs(*PROVIDER_TIMEOUT_SECS),
        gemini: ProviderEndpoint {
            api_key: read_optional_env("GEMINI_API_KEY"),
            base_url: read_optional_env("GEMINI_BASE_URL").unwrap_or_else(|| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            model: read_optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-1.5-flash".to_string()),
        },
        huggingface: ProviderEndpoint {
            api_key: read_optional_env("HUGGINGFACE_API_KEY"),
            base_url: read_optional_env("HUGGINGFACE_BASE_URL")
                .unwrap_or_else(|| "https://api-inference.huggingface.co".to_string()),
            model: read_optional_env("HUGGINGFACE_MODEL")
                .unwrap_or_else(|| "meta-llama/Llama-2-7b-chat-hf".to_string()),
        },
        claude: ProviderEndpoint {
            api_key: read_optional_env("ANTHROPIC_API_KEY"),
            base_url: read_optional_env("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| "https://api.anthropic.com".to_string()),
            model: read_optional_env("ANTHROPIC_MODEL")
                .unwrap_or_else(|| "claude-3-5-sonnet-20241022".to_string()),
        },
        ollama: ProviderEndpoint {
            api_key: None,
            base_url: read_optional_env("OLLAMA_BASE_URL")
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            model: read_optional_env("OLLAMA_MODEL").unwrap_or_else(|| "mistral".to_string()),
        },
    }
}

fn read_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
