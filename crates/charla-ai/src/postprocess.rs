//! Render-time post-processing for assistant replies.
//!
//! The transcript stores the raw API text; these transformations are applied
//! only when a reply is displayed. Models distilled from DeepSeek R1 open
//! their replies with a `<think>…</think>` span, which is split off so the
//! front-end can render it apart from the answer. Bracketed math notation
//! `[...]` is rewritten to the `$...$` delimiters markdown renderers expect.

use std::sync::LazyLock;

use regex::Regex;

static THINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>(.*?)</think>").unwrap());

static MATH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]").unwrap());

/// A reply split into its optional reasoning span and the display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub reasoning: Option<String>,
    pub display_text: String,
}

/// Split a raw assistant reply into reasoning and normalized display text.
///
/// Normalization: line endings unified to `\n`, leading indentation stripped
/// per line (trailing and interior whitespace untouched), bracketed spans
/// rewritten per line, lines rejoined with a single `\n` so blank lines keep
/// separating paragraphs.
pub fn process(raw: &str) -> Processed {
    let (reasoning, rest) = extract_reasoning(raw);
    Processed {
        reasoning,
        display_text: normalize(&rest),
    }
}

/// Take the first well-formed `<think>` span out of `raw`. An unterminated
/// opening tag extracts nothing and passes through untouched.
fn extract_reasoning(raw: &str) -> (Option<String>, String) {
    let Some(caps) = THINK_RE.captures(raw) else {
        return (None, raw.to_string());
    };
    let (Some(span), Some(inner)) = (caps.get(0), caps.get(1)) else {
        return (None, raw.to_string());
    };

    let mut rest = String::with_capacity(raw.len() - span.len());
    rest.push_str(&raw[..span.start()]);
    rest.push_str(&raw[span.end()..]);
    (
        Some(inner.as_str().trim().to_string()),
        rest.trim().to_string(),
    )
}

fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = unified
        .split('\n')
        .map(|line| MATH_RE.replace_all(line.trim_start(), "$$${1}$$").into_owned())
        .collect();
    lines.join("\n")
}
