//! LLM commentary client for horoscope flavor text.
//!
//! Talks to any OpenAI-compatible chat-completions endpoint. Commentary
//! is decoration, so the same Option contract applies as for every other
//! fetcher: any failure is logged and yields `None`.

use budvabot_core::config::LlmConfig;
use serde_json::{Value, json};

#[derive(Clone)]
pub struct CommentaryClient {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl CommentaryClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// One completion for the given prompt, or `None`.
    pub async fn commentary(&self, system: &str, prompt: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }

        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(crate::FETCH_TIMEOUT)
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!("LLM API returned {}", r.status());
                return None;
            }
            Err(e) => {
                tracing::warn!("LLM request failed: {e}");
                return None;
            }
        };

        let payload: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Unparsable LLM payload: {e}");
                return None;
            }
        };

        extract_content(&payload)
    }
}

fn extract_content(payload: &Value) -> Option<String> {
    payload["choices"]
        .get(0)?
        .pointer("/message/content")?
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
