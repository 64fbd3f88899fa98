//! Groq client struct, request building, and response decoding.

use serde::Deserialize;

use crate::{Completion, CompletionError, Message, TokenUsage};

use super::config::GroqConfig;

/// Groq API client.
pub struct GroqClient {
    pub(crate) config: GroqConfig,
    pub(crate) http: reqwest::Client,
}

impl GroqClient {
    pub fn new(config: GroqConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Build the JSON request body. The transcript is replayed verbatim as
    /// role/content pairs, system message included.
    pub(crate) fn build_request_body(
        &self,
        messages: &[Message],
        model: &str,
        temperature: f64,
        stream: bool,
    ) -> serde_json::Value {
        let msgs: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role,
                    "content": msg.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": msgs,
            "temperature": temperature,
        });

        if stream {
            body["stream"] = serde_json::json!(true);
        }

        body
    }

    /// Decode a non-streaming success body.
    pub(crate) fn decode_completion(body: &str) -> Result<Completion, CompletionError> {
        let response: ChatCompletionResponse =
            serde_json::from_str(body).map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Malformed("response contained no choices".into()))?;

        let content = choice.message.content.unwrap_or_default();
        if content.is_empty() {
            return Err(CompletionError::Malformed(
                "completion contained no content".into(),
            ));
        }

        let usage = response.usage.map(TokenUsage::from).unwrap_or_default();
        Ok(Completion { content, usage })
    }

    /// Pull the provider's message out of a non-2xx body, falling back to a
    /// truncated copy of the raw text.
    pub(crate) fn error_message(body: &str) -> String {
        serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Debug, Deserialize)]
struct ChatMessageBody {
    content: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct WireUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl From<WireUsage> for TokenUsage {
    fn from(wire: WireUsage) -> Self {
        TokenUsage {
            prompt_tokens: wire.prompt_tokens,
            completion_tokens: wire.completion_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// One SSE chunk of a streamed completion. Groq reports usage on the final
/// chunk under `x_groq`.
#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    x_groq: Option<XGroq>,
}

impl StreamChunk {
    pub(crate) fn delta_content(&self) -> Option<&str> {
        self.choices.first()?.delta.content.as_deref()
    }

    pub(crate) fn usage(&self) -> Option<TokenUsage> {
        self.x_groq.as_ref()?.usage.map(TokenUsage::from)
    }
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XGroq {
    usage: Option<WireUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn client() -> GroqClient {
        GroqClient::new(GroqConfig::new("gsk_test"))
    }

    #[test]
    fn request_body_replays_transcript_in_order() {
        let messages = vec![
            Message::system("solo habla español"),
            Message::user("hola"),
        ];
        let body = client().build_request_body(&messages, "gemma2-9b-it", 0.7, false);

        assert_eq!(body["model"], "gemma2-9b-it");
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "solo habla español");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn request_body_sets_stream_flag() {
        let messages = vec![Message::user("hola")];
        let body = client().build_request_body(&messages, "gemma2-9b-it", 1.0, true);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn decodes_a_success_body() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "hola"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let completion = GroqClient::decode_completion(body).unwrap();
        assert_eq!(completion.content, "hola");
        assert_eq!(completion.usage.prompt_tokens, 12);
        assert_eq!(completion.usage.completion_tokens, 3);
        assert_eq!(completion.usage.total_tokens(), 15);
    }

    #[test]
    fn missing_choices_is_malformed() {
        let err = GroqClient::decode_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, CompletionError::Malformed(_)));
    }

    #[test]
    fn null_content_is_malformed() {
        let body = r#"{"choices": [{"message": {"content": null}}]}"#;
        let err = GroqClient::decode_completion(body).unwrap_err();
        assert!(matches!(err, CompletionError::Malformed(_)));
    }

    #[test]
    fn undecodable_body_is_malformed() {
        let err = GroqClient::decode_completion("<html>oops</html>").unwrap_err();
        assert!(matches!(err, CompletionError::Malformed(_)));
    }

    #[test]
    fn error_message_prefers_provider_body() {
        let body = r#"{"error": {"message": "model not found", "type": "invalid_request_error"}}"#;
        assert_eq!(GroqClient::error_message(body), "model not found");
    }

    #[test]
    fn error_message_falls_back_to_raw_text() {
        assert_eq!(GroqClient::error_message("bad gateway"), "bad gateway");
    }

    #[test]
    fn stream_chunk_exposes_delta_and_final_usage() {
        let delta: StreamChunk =
            serde_json::from_str(r#"{"choices": [{"delta": {"content": "ho"}}]}"#).unwrap();
        assert_eq!(delta.delta_content(), Some("ho"));
        assert!(delta.usage().is_none());

        let last: StreamChunk = serde_json::from_str(
            r#"{"choices": [{"delta": {}}], "x_groq": {"usage": {"prompt_tokens": 5, "completion_tokens": 7}}}"#,
        )
        .unwrap();
        assert_eq!(last.delta_content(), None);
        assert_eq!(last.usage().map(|u| u.total_tokens()), Some(12));
    }

    #[test]
    fn system_role_serializes_lowercase_in_body() {
        let body = client().build_request_body(&[Message::system("x")], "gemma2-9b-it", 0.0, false);
        assert_eq!(body["messages"][0]["role"], serde_json::json!(Role::System));
    }
}
