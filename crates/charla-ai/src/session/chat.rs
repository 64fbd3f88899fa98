//! Submit paths for Session (plain + streaming).

use tracing::{debug, warn};

use crate::{Completion, CompletionClient, CompletionError, Message};

use super::manager::Session;
use super::types::BusyGuard;

impl Session {
    /// Append a user turn and request the assistant's reply.
    ///
    /// Blank input (empty after trimming) is ignored: nothing is appended, no
    /// request is made, and `Ok(None)` is returned. On failure the user's
    /// message stays in the transcript — nothing typed is ever silently
    /// discarded — and the error is returned for the caller to display.
    /// `Ok(Some(_))` carries the assistant message that was appended.
    pub async fn submit(
        &mut self,
        client: &dyn CompletionClient,
        text: impl Into<String>,
    ) -> Result<Option<Message>, CompletionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Ok(None);
        }
        let _guard = BusyGuard::acquire(&self.busy)?;

        self.messages.push(Message::user(text));
        let outcome = client
            .complete(&self.messages, self.model.id(), self.temperature)
            .await;
        drop(_guard);
        self.append_reply(outcome).map(Some)
    }

    /// Streaming variant of [`Session::submit`]: content deltas are passed to
    /// `on_chunk` as they arrive, and the transcript is updated once, at the
    /// end, with the full reply.
    pub async fn submit_streaming(
        &mut self,
        client: &dyn CompletionClient,
        text: impl Into<String>,
        on_chunk: Box<dyn Fn(String) + Send + Sync>,
    ) -> Result<Option<Message>, CompletionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Ok(None);
        }
        let _guard = BusyGuard::acquire(&self.busy)?;

        self.messages.push(Message::user(text));
        let outcome = client
            .complete_streaming(&self.messages, self.model.id(), self.temperature, on_chunk)
            .await;
        drop(_guard);
        self.append_reply(outcome).map(Some)
    }

    fn append_reply(
        &mut self,
        outcome: Result<Completion, CompletionError>,
    ) -> Result<Message, CompletionError> {
        let completion = match outcome {
            Ok(completion) => completion,
            Err(e) => {
                warn!(session = %self.id, error = %e, "completion failed");
                return Err(e);
            }
        };

        // An empty reply never lands in the transcript.
        if completion.content.is_empty() {
            warn!(session = %self.id, "completion succeeded with no content");
            return Err(CompletionError::Malformed(
                "completion contained no content".into(),
            ));
        }

        self.tracker.record(self.model.id(), &completion.usage);
        debug!(
            session = %self.id,
            tokens = completion.usage.total_tokens(),
            "assistant reply appended"
        );

        let message = Message::assistant(completion.content, completion.usage);
        self.messages.push(message.clone());
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{postprocess, Role, TokenUsage};

    /// Replays a scripted list of outcomes, one per request.
    struct ScriptedClient {
        replies: Mutex<Vec<Result<Completion, CompletionError>>>,
    }

    impl ScriptedClient {
        fn with(replies: Vec<Result<Completion, CompletionError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            _messages: &[Message],
            _model: &str,
            _temperature: f64,
        ) -> Result<Completion, CompletionError> {
            self.replies.lock().unwrap().remove(0)
        }

        async fn complete_streaming(
            &self,
            messages: &[Message],
            model: &str,
            temperature: f64,
            on_chunk: Box<dyn Fn(String) + Send + Sync>,
        ) -> Result<Completion, CompletionError> {
            let completion = self.complete(messages, model, temperature).await?;
            for chunk in completion.content.split_inclusive(' ') {
                on_chunk(chunk.to_string());
            }
            Ok(completion)
        }
    }

    fn reply(content: &str) -> Result<Completion, CompletionError> {
        Ok(Completion {
            content: content.to_string(),
            usage: TokenUsage {
                prompt_tokens: 3,
                completion_tokens: 5,
            },
        })
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let client = ScriptedClient::with(vec![]);
        let mut session = Session::new();
        assert!(session.submit(&client, "").await.unwrap().is_none());
        assert!(session.submit(&client, "   ").await.unwrap().is_none());
        assert_eq!(session.message_count(), 1);
    }

    #[tokio::test]
    async fn success_appends_user_then_assistant() {
        let client = ScriptedClient::with(vec![reply("¡Hola! ¿Cómo estás?")]);
        let mut session = Session::new();

        let message = session.submit(&client, "Hola").await.unwrap().unwrap();

        assert_eq!(session.message_count(), 3);
        assert_eq!(session.messages()[1].role, Role::User);
        assert_eq!(session.messages()[1].content, "Hola");
        assert_eq!(session.messages()[2].role, Role::Assistant);
        assert_eq!(message.content, "¡Hola! ¿Cómo estás?");
        assert_eq!(message.usage.map(|u| u.total_tokens()), Some(8));
        assert_eq!(session.tracker().request_count(), 1);
    }

    #[tokio::test]
    async fn failure_keeps_the_user_message() {
        let client = ScriptedClient::with(vec![Err(CompletionError::Connection(
            "connection refused".into(),
        ))]);
        let mut session = Session::new();

        let err = session.submit(&client, "Hola").await.unwrap_err();

        assert!(matches!(err, CompletionError::Connection(_)));
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.messages()[1].role, Role::User);
        assert_eq!(session.tracker().request_count(), 0);
    }

    #[tokio::test]
    async fn empty_reply_is_malformed_and_not_appended() {
        let client = ScriptedClient::with(vec![reply("")]);
        let mut session = Session::new();

        let err = session.submit(&client, "Hola").await.unwrap_err();

        assert!(matches!(err, CompletionError::Malformed(_)));
        assert_eq!(session.message_count(), 2);
        assert_ne!(session.messages()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn transcript_stores_raw_reply_processed_only_at_render() {
        let client = ScriptedClient::with(vec![reply("<think>adding</think>[4]")]);
        let mut session = Session::new();

        let message = session.submit(&client, "2+2?").await.unwrap().unwrap();
        assert_eq!(message.content, "<think>adding</think>[4]");

        let rendered = postprocess::process(&message.content);
        assert_eq!(rendered.reasoning.as_deref(), Some("adding"));
        assert_eq!(rendered.display_text, "$4$");
    }

    #[tokio::test]
    async fn streaming_submit_delivers_chunks_and_appends_once() {
        let client = ScriptedClient::with(vec![reply("todo bien")]);
        let mut session = Session::new();

        let seen = std::sync::Arc::new(Mutex::new(String::new()));
        let sink = seen.clone();
        let message = session
            .submit_streaming(
                &client,
                "¿Qué tal?",
                Box::new(move |chunk| sink.lock().unwrap().push_str(&chunk)),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(message.content, "todo bien");
        assert_eq!(*seen.lock().unwrap(), "todo bien");
        assert_eq!(session.message_count(), 3);
    }

    #[tokio::test]
    async fn each_failed_attempt_keeps_its_user_turn() {
        let client = ScriptedClient::with(vec![
            Err(CompletionError::Status {
                status: 429,
                message: "rate limit reached".into(),
            }),
            reply("ahora sí"),
        ]);
        let mut session = Session::new();

        assert!(session.submit(&client, "primer intento").await.is_err());
        let message = session.submit(&client, "segundo intento").await.unwrap();

        assert!(message.is_some());
        // system, user, user, assistant
        assert_eq!(session.message_count(), 4);
        assert_eq!(session.messages()[1].content, "primer intento");
        assert_eq!(session.messages()[2].content, "segundo intento");
    }
}
