//! Pull a JSON payload out of free-form provider text.
//!
//! Strategies run in a fixed order and the first one that yields an object
//! or array wins:
//!
//! 1. the whole (trimmed) text parses directly
//! 2. a fenced ```` ```json ```` block
//! 3. any fenced ```` ``` ```` block
//! 4. brace-balanced substrings, longest first

use serde_json::Value;

/// One way of locating JSON inside text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    Direct,
    FencedJson,
    FencedGeneric,
    BraceBalanced,
}

impl ExtractionStrategy {
    /// Strategies in the order they are attempted.
    pub const ORDER: [ExtractionStrategy; 4] = [
        Self::Direct,
        Self::FencedJson,
        Self::FencedGeneric,
        Self::BraceBalanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::FencedJson => "fenced_json",
            Self::FencedGeneric => "fenced_generic",
            Self::BraceBalanced => "brace_balanced",
        }
    }

    pub fn extract(&self, text: &str) -> Option<Value> {
        match self {
            Self::Direct => parse_structured(text),
            Self::FencedJson => fenced_blocks(text, true)
                .into_iter()
                .find_map(parse_structured),
            Self::FencedGeneric => fenced_blocks(text, false)
                .into_iter()
                .find_map(parse_structured),
            Self::BraceBalanced => {
                let mut candidates = balanced_substrings(text);
                candidates.sort_by_key(|c| std::cmp::Reverse(c.len()));
                candidates.into_iter().find_map(parse_structured)
            }
        }
    }
}

/// Run every strategy in order and return the first payload found.
pub fn extract_json(text: &str) -> Option<Value> {
    ExtractionStrategy::ORDER.iter().find_map(|strategy| {
        let value = strategy.extract(text)?;
        tracing::trace!(strategy = strategy.as_str(), "Extracted JSON from provider text");
        Some(value)
    })
}

fn parse_structured(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

/// Bodies of ``` fenced blocks. With `json_only`, only blocks tagged `json`.
fn fenced_blocks(text: &str, json_only: bool) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_fence = &rest[open + 3..];
        let newline = after_fence.find('\n');
        let next_fence = after_fence.find("```");
        // a tag line only exists when the fence is followed by a newline
        // before any closing fence
        let (tag, body_start) = match (newline, next_fence) {
            (Some(nl), Some(fence)) if nl < fence => (after_fence[..nl].trim(), nl + 1),
            (Some(nl), None) => (after_fence[..nl].trim(), nl + 1),
            _ => ("", 0),
        };
        let body = &after_fence[body_start..];
        let Some(close) = body.find("```") else {
            break;
        };

        if !json_only || tag.eq_ignore_ascii_case("json") {
            blocks.push(&body[..close]);
        }
        rest = &body[close + 3..];
    }

    blocks
}

/// Every substring that starts with `{` or `[` and ends at its matching
/// closer, ignoring brackets inside string literals.
fn balanced_substrings(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();

    for (start, &b) in bytes.iter().enumerate() {
        if b != b'{' && b != b'[' {
            continue;
        }
        if let Some(end) = matching_close(bytes, start) {
            found.push(&text[start..=end]);
        }
    }

    found
}

fn matching_close(bytes: &[u8], start: usize) -> Option<usize> {
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}
