//! Provider configuration read from the environment

use super::GeminiModel;

/// Values people leave in `.env` templates; treated the same as no key
const PLACEHOLDER_KEYS: &[&str] = &[
    "PLACEHOLDER_API_KEY",
    "YOUR_API_KEY",
    "YOUR_API_KEY_HERE",
    "YOUR_GEMINI_API_KEY",
    "CHANGEME",
];

/// Configuration for the LLM provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// Usable credential, if any (placeholders are filtered out)
    pub api_key: Option<String>,
    /// Gateway URL that injects credentials itself
    pub gateway: Option<String>,
    pub model: GeminiModel,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let raw_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .or_else(|| std::env::var("API_KEY").ok());

        let model = match std::env::var("GEMINI_MODEL") {
            Ok(id) => GeminiModel::from_id(&id).unwrap_or_else(|| {
                tracing::warn!(model = %id, "Unknown GEMINI_MODEL, using default");
                GeminiModel::default()
            }),
            Err(_) => GeminiModel::default(),
        };

        Self {
            api_key: raw_key.and_then(|k| usable_key(&k)),
            gateway: std::env::var("LLM_GATEWAY").ok().filter(|g| !g.trim().is_empty()),
            model,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some() || self.gateway.is_some()
    }
}

/// Trim a raw key and reject empty or placeholder values
fn usable_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    let normalized = key.to_ascii_uppercase().replace(['-', ' '], "_");
    if key.is_empty() || PLACEHOLDER_KEYS.contains(&normalized.as_str()) {
        None
    } else {
        Some(key.to_string())
    }
}
