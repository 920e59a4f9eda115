// Configuration module: everything the client needs is read once from the
// process environment (optionally seeded by a `.env` file) and then passed
// by reference to whichever component needs it.

use std::fmt;

use serde::Serialize;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-2.0-pro-exp-02-05";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// API key wrapper whose `Debug` output is redacted.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Sampling parameters sent with every request. Field names follow the
/// remote API's camelCase wire format.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 15000,
            response_mime_type: "text/plain".into(),
        }
    }
}

/// Process-wide settings for one run.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: ApiKey,
    pub model: String,
    pub api_base: String,
    pub generation: GenerationConfig,
}

impl Config {
    /// Load `.env` if present, then read `API_KEY`, `GEMINI_MODEL` and
    /// `GEMINI_API_BASE` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal; the variables may already be exported.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let api_key = non_empty("API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let model = non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());
        let api_base = non_empty("GEMINI_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.into());
        Ok(Config {
            api_key: ApiKey(api_key),
            model,
            api_base,
            generation: GenerationConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup(&[("API_KEY", "secret")])).unwrap();
        assert_eq!(config.api_key.expose(), "secret");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.generation, GenerationConfig::default());
    }

    #[test]
    fn missing_or_blank_key_is_an_error() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("API_KEY", "  ")])),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn overrides_are_honored() {
        let config = Config::from_lookup(lookup(&[
            ("API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("GEMINI_API_BASE", "http://localhost:8080/"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.api_base, "http://localhost:8080");
    }

    #[test]
    fn debug_hides_key() {
        let config = Config::from_lookup(lookup(&[("API_KEY", "hunter2")])).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn generation_config_wire_names() {
        let json = serde_json::to_value(GenerationConfig::default()).unwrap();
        assert_eq!(json["topP"], serde_json::json!(0.95f32));
        assert_eq!(json["topK"], 40);
        assert_eq!(json["maxOutputTokens"], 15000);
        assert_eq!(json["responseMimeType"], "text/plain");
    }
}
