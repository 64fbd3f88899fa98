//! Cumulative token accounting across a session's requests.

use std::collections::HashMap;

use crate::TokenUsage;

/// Tracks token usage for the lifetime of a session, broken down by model.
///
/// Survives transcript clears: usage reflects what was actually billed, not
/// what is currently on screen.
#[derive(Debug, Default)]
pub struct TokenTracker {
    total: TokenUsage,
    by_model: HashMap<String, TokenUsage>,
    request_count: u64,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record usage from one completed request.
    pub fn record(&mut self, model: &str, usage: &TokenUsage) {
        self.total.prompt_tokens += usage.prompt_tokens;
        self.total.completion_tokens += usage.completion_tokens;
        self.request_count += 1;

        let entry = self.by_model.entry(model.to_string()).or_default();
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
    }

    pub fn total(&self) -> &TokenUsage {
        &self.total
    }

    pub fn for_model(&self, model: &str) -> Option<&TokenUsage> {
        self.by_model.get(model)
    }

    pub fn total_tokens(&self) -> u64 {
        self.total.total_tokens()
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn reset(&mut self) {
        self.total = TokenUsage::default();
        self.by_model.clear();
        self.request_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(prompt: u64, completion: u64) -> TokenUsage {
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
        }
    }

    #[test]
    fn accumulates_totals_and_request_count() {
        let mut tracker = TokenTracker::new();
        tracker.record("gemma2-9b-it", &usage(10, 5));
        tracker.record("gemma2-9b-it", &usage(20, 15));
        assert_eq!(tracker.total_tokens(), 50);
        assert_eq!(tracker.request_count(), 2);
    }

    #[test]
    fn splits_usage_per_model() {
        let mut tracker = TokenTracker::new();
        tracker.record("gemma2-9b-it", &usage(10, 5));
        tracker.record("llama-3.3-70b-versatile", &usage(1, 2));
        assert_eq!(tracker.for_model("gemma2-9b-it"), Some(&usage(10, 5)));
        assert_eq!(
            tracker.for_model("llama-3.3-70b-versatile"),
            Some(&usage(1, 2))
        );
        assert_eq!(tracker.for_model("otro"), None);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut tracker = TokenTracker::new();
        tracker.record("gemma2-9b-it", &usage(10, 5));
        tracker.reset();
        assert_eq!(tracker.total_tokens(), 0);
        assert_eq!(tracker.request_count(), 0);
        assert_eq!(tracker.for_model("gemma2-9b-it"), None);
    }
}
