//! OpenAI Chat Completions API driver.
//!
//! This module implements the [`ChatDriver`] trait for the OpenAI Chat
//! Completions API (`/v1/chat/completions`). The relay sends one text frame
//! per reply, so the driver requests a non-streamed completion and extracts
//! the message content from the first choice.

use super::{ChatDriver, LlmError, LlmSettings, Message};

/// Driver for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait::async_trait]
impl ChatDriver for ChatCompletionsDriver {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let url = self.settings.provider.build_chat_url(&self.settings.base_url);

        let body = serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "messages": messages,
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status,
                body: excerpt(&body),
            });
        }

        let v: serde_json::Value = resp.json().await?;
        extract_reply_text(&v)
    }
}

/// Pull the assistant reply out of a completion response body.
fn extract_reply_text(v: &serde_json::Value) -> Result<String, LlmError> {
    let content = v["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            LlmError::MalformedResponse(format!(
                "no choices[0].message.content in: {}",
                excerpt(&v.to_string())
            ))
        })?;

    if content.is_empty() {
        return Err(LlmError::MalformedResponse(
            "empty reply content".to_string(),
        ));
    }

    Ok(content.to_string())
}

/// Truncate a response body for error messages and logs.
fn excerpt(s: &str) -> String {
    const MAX: usize = 512;
    if s.len() <= MAX {
        s.to_string()
    } else {
        let mut end = MAX;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
