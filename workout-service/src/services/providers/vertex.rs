//! Vertex AI provider implementation.
//!
//! Calls the `generateContent` method of a Google publisher model deployed in
//! one project and region. One request per prompt; no streaming, no retries.

use super::{ProviderError, TextProvider};
use crate::config::VertexConfig;
use crate::services::credentials::{well_known_credentials_file, TokenSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Finish reasons that mean the candidate was withheld.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Vertex AI text provider.
pub struct VertexTextProvider {
    model: String,
    url: String,
    client: Client,
    tokens: TokenSource,
}

impl VertexTextProvider {
    pub fn new(config: &VertexConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;
        let tokens = TokenSource::discover(
            config.access_token.as_deref(),
            config.credentials_file.as_deref().map(Path::new),
            well_known_credentials_file(),
            client.clone(),
        )?;

        Ok(Self::with_token_source(config, client, tokens))
    }

    pub fn with_token_source(config: &VertexConfig, client: Client, tokens: TokenSource) -> Self {
        Self {
            model: config.model.clone(),
            url: config.generate_content_url(),
            client,
            tokens,
        }
    }
}

#[async_trait]
impl TextProvider for VertexTextProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let token = self.tokens.token().await?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "Sending request to Vertex AI"
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = describe_body(response.text().await);

            return Err(ProviderError::ApiError(format!(
                "Vertex AI error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        extract_text(api_response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Error body text, or a placeholder when it could not be read.
fn describe_body(body: Result<String, reqwest::Error>) -> String {
    body.unwrap_or_else(|e| format!("<unable to read response body: {}>", e))
}

/// Join the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {}", r));

        return Err(match reason {
            Some(reason) => ProviderError::Blocked(reason),
            None => ProviderError::MalformedResponse("response has no candidates".to_string()),
        });
    };

    let texts: Vec<String> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if texts.is_empty() {
        return Err(match candidate.finish_reason.as_deref() {
            Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason) => {
                ProviderError::Blocked(format!("candidate finished with {}", reason))
            }
            _ => ProviderError::MalformedResponse("candidate has no text".to_string()),
        });
    }

    Ok(texts.concat())
}

// ============================================================================
// Vertex AI Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
