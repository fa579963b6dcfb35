//! Google Gemini provider via the Generative Language API (API-key auth)

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::LlmProvider;

/// Gemini generation client
pub struct GeminiLlm {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl GeminiLlm {
    /// Create from the `[llm]` configuration section
    ///
    /// Returns `Ok(None)` when no API key is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.google.api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Some(Self {
            client,
            api_key,
            model: config.google.model.clone(),
            base_url: config.google.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }))
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model)
    }

    fn build_request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        }
    }
}

#[derive(serde::Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(serde::Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct Part {
    text: String,
}

#[derive(serde::Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(serde::Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(serde::Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Concatenated text of the first candidate
fn extract_text(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::llm("google", "No text in Gemini response"));
    }
    Ok(text)
}

#[async_trait]
impl LlmProvider for GeminiLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!("Generating with Gemini model {}", self.model);

        let response = self
            .client
            .post(format!("{}:generateContent", self.model_url()))
            .query(&[("key", self.api_key.as_str())])
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| Error::llm("google", format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(
                "google",
                format!("Gemini generation failed ({}): {}", status, body),
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::llm("google", format!("Failed to parse Gemini response: {}", e)))?;

        extract_text(parsed)
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .client
            .get(self.model_url())
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "google"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_registered_without_key() {
        let config = LlmConfig::default();
        assert!(GeminiLlm::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_request_uses_camel_case_config() {
        let mut config = LlmConfig::default();
        config.google.api_key = Some("k".to_string());
        let llm = GeminiLlm::from_config(&config).unwrap().unwrap();

        let value = serde_json::to_value(llm.build_request("hello")).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 2048);
        assert!(llm.model_url().ends_with("/v1beta/models/gemini-1.5-flash"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(parsed).unwrap(), "Hello, world");
    }

    #[test]
    fn test_blocked_response_is_error() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(matches!(extract_text(parsed), Err(Error::Llm { .. })));
    }
}
