//! CompletionClient implementation for GroqClient (plain + streaming).

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::streaming::for_each_data;
use crate::{Completion, CompletionClient, CompletionError, Message, TokenUsage};

use super::client::{GroqClient, StreamChunk};

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        temperature: f64,
    ) -> Result<Completion, CompletionError> {
        let body = self.build_request_body(messages, model, temperature, false);

        debug!(%model, turns = messages.len(), "chat completion request");

        let response = self
            .http
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                message: GroqClient::error_message(&text),
            });
        }

        let text = response.text().await.map_err(transport_error)?;
        GroqClient::decode_completion(&text)
    }

    async fn complete_streaming(
        &self,
        messages: &[Message],
        model: &str,
        temperature: f64,
        on_chunk: Box<dyn Fn(String) + Send + Sync>,
    ) -> Result<Completion, CompletionError> {
        let body = self.build_request_body(messages, model, temperature, true);

        debug!(%model, turns = messages.len(), "chat completion streaming request");

        let response = self
            .http
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                message: GroqClient::error_message(&text),
            });
        }

        let mut content = String::new();
        let mut usage = TokenUsage::default();

        for_each_data(response, |payload| {
            if payload == "[DONE]" {
                return;
            }
            let chunk: StreamChunk = match serde_json::from_str(&payload) {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(error = %e, "skipping undecodable stream chunk");
                    return;
                }
            };
            if let Some(delta) = chunk.delta_content() {
                content.push_str(delta);
                on_chunk(delta.to_string());
            }
            if let Some(reported) = chunk.usage() {
                usage = reported;
            }
        })
        .await?;

        if content.is_empty() {
            return Err(CompletionError::Malformed(
                "stream contained no content".into(),
            ));
        }

        Ok(Completion { content, usage })
    }
}

fn transport_error(e: reqwest::Error) -> CompletionError {
    CompletionError::Connection(e.to_string())
}
