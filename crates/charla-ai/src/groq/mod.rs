//! Groq chat completions client.
//!
//! Speaks the OpenAI-compatible wire format over `reqwest`, with plain and
//! SSE-streaming request paths.

mod api;
mod client;
mod config;

pub use client::GroqClient;
pub use config::GroqConfig;
