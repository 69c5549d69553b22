use std::env;

use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for the hosted language model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiSettings {
    api_key: String,
    api_model: String,
    api_base_url: String,
}

#[derive(Clone, Debug, Default)]
pub struct AiSettingsDraft {
    pub api_key: Option<String>,
    pub api_model: Option<String>,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AiSettingsError {
    #[error("API key is missing")]
    MissingApiKey,
    #[error("invalid base URL")]
    InvalidBaseUrl,
}

impl AiSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the draft from `STUDY_AI_API_KEY`, `STUDY_AI_MODEL` and
    /// `STUDY_AI_BASE_URL`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("STUDY_AI_API_KEY").ok(),
            api_model: env::var("STUDY_AI_MODEL").ok(),
            api_base_url: env::var("STUDY_AI_BASE_URL").ok(),
        }
    }

    /// Validate and normalize the draft, filling in default model and URL.
    ///
    /// # Errors
    ///
    /// Returns `AiSettingsError` if the key is blank or the base URL is invalid.
    pub fn validate(self) -> Result<AiSettings, AiSettingsError> {
        let api_key = normalize_optional(self.api_key).ok_or(AiSettingsError::MissingApiKey)?;
        let api_model =
            normalize_optional(self.api_model).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base_url =
            normalize_optional(self.api_base_url).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        match Url::parse(&api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(AiSettingsError::InvalidBaseUrl),
        }

        Ok(AiSettings {
            api_key,
            api_model,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl AiSettings {
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn api_model(&self) -> &str {
        &self.api_model
    }

    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base_url)
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
