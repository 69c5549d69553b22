use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use study_core::model::AiSettings;

use crate::ai::prompt::Prompt;
use crate::error::ProviderError;

/// Upper bound for one HTTP round trip to the model.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Generic "generate structured content" call against an OpenAI-compatible
/// chat completions endpoint.
///
/// Every flow goes through [`StructuredClient::generate`]; flows differ only in
/// the prompt they pass and the type they parse.
#[derive(Clone)]
pub struct StructuredClient {
    client: Client,
    settings: Option<AiSettings>,
    temperature: f32,
}

impl StructuredClient {
    #[must_use]
    pub fn new(settings: Option<AiSettings>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            settings,
            temperature: 0.7,
        }
    }

    /// Send a prompt and parse the model's JSON answer into `T`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the client is disabled, the request fails,
    /// the response is empty, or the content is not valid JSON for `T`.
    pub async fn generate<T: DeserializeOwned>(&self, prompt: &Prompt) -> Result<T, ProviderError> {
        let settings = self.settings.as_ref().ok_or(ProviderError::Disabled)?;

        let payload = ChatRequest {
            model: settings.api_model(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(model = settings.api_model(), "requesting structured content");
        let response = self
            .client
            .post(settings.chat_completions_url())
            .bearer_auth(settings.api_key())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        Ok(serde_json::from_str(strip_code_fence(&content))?)
    }
}

/// Models sometimes wrap JSON in a markdown fence despite JSON mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
