//! DashScope-style text-generation provider.
//!
//! Speaks the Alibaba DashScope generation API but tolerates
//! OpenAI-compatible response envelopes as well, since deployments may point
//! `ai_api_url` at either surface. The reply text is located by trying, in
//! order: the flat `output.text` field, `output.choices` entries, and
//! top-level `choices` entries (message-content or plain text).

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    services::providers::TextGenProvider,
};

#[derive(Clone)]
pub struct DashScopeProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl DashScopeProvider {
    /// Creates a provider with a fixed request timeout.
    ///
    /// The timeout is the only cancellation mechanism for the remote call;
    /// there are no retries.
    pub fn new(api_key: String, api_url: String, model: String, timeout_secs: u64) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            model,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "input": {
                "messages": [
                    { "role": "user", "content": prompt }
                ]
            },
            "parameters": { "result_format": "text" }
        })
    }

    /// Pulls the reply text out of a response envelope.
    ///
    /// Known shapes: `output.text`; `output.choices[0].message.content`;
    /// `choices[0].message.content`; `choices[0].text`.
    fn extract_reply(payload: &Value) -> Option<String> {
        if let Some(text) = payload["output"]["text"].as_str() {
            return Some(text.to_string());
        }

        for choices in [&payload["output"]["choices"], &payload["choices"]] {
            let Some(first) = choices.as_array().and_then(|c| c.first()) else {
                continue;
            };
            if let Some(content) = first["message"]["content"].as_str() {
                return Some(content.to_string());
            }
            if let Some(text) = first["text"].as_str() {
                return Some(text.to_string());
            }
        }

        None
    }
}

#[async_trait::async_trait]
impl TextGenProvider for DashScopeProvider {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Text-generation API returned status {}: {}",
                status, body
            )));
        }

        let payload: Value = response.json().await?;

        let reply = Self::extract_reply(&payload).ok_or_else(|| {
            tracing::error!(payload = %payload, "Unrecognized text-generation response shape");
            AppError::ExternalApi(format!(
                "Unrecognized text-generation response shape: {}",
                payload
            ))
        })?;

        tracing::info!(
            model = %self.model,
            reply_chars = reply.len(),
            provider = "dashscope",
            "Text generation completed"
        );

        Ok(reply)
    }

    fn name(&self) -> &'static str {
        "dashscope"
    }
}
