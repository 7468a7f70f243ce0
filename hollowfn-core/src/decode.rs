//! Response decoding: structured data out of noisy model output.
//!
//! Models add commentary around the requested JSON despite instructions, so
//! the decoder never assumes the raw text parses as-is. It tries the whole
//! text first, then hunts for the outermost balanced JSON fragment, then
//! falls back to a bare boolean or numeric token for scalar replies.

use serde_json::Value;

use crate::error::HollowError;

/// Extract a structured payload from a provider's raw text.
///
/// Fails with a decode error when no parseable fragment exists; the runtime
/// classifies that as retryable, since another attempt may conform.
pub fn decode(raw: &str) -> Result<Value, HollowError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(HollowError::decode("empty response"));
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(value) = extract_fragment(raw) {
        return Ok(value);
    }

    if let Some(value) = extract_bare_scalar(raw) {
        return Ok(value);
    }

    Err(HollowError::decode("no parseable JSON fragment in response"))
}

/// Scan for the outermost balanced `{...}` or `[...]` fragment that parses.
///
/// The scan is string- and escape-aware, so braces inside JSON strings don't
/// unbalance the match. When a candidate fragment fails to parse, scanning
/// resumes at the next opener.
fn extract_fragment(raw: &str) -> Option<Value> {
    let bytes = raw.as_bytes();
    let mut start = 0;

    while let Some(offset) = raw[start..].find(['{', '[']) {
        let open = start + offset;
        if let Some(end) = matching_close(bytes, open) {
            if let Ok(value) = serde_json::from_str(&raw[open..=end]) {
                return Some(value);
            }
        }
        start = open + 1;
    }

    None
}

/// Byte index of the close matching the opener at `open`, if balanced
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
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
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Accept a lone `true`/`false` word or numeric token for scalar-shaped
/// replies
fn extract_bare_scalar(raw: &str) -> Option<Value> {
    for token in raw.split_whitespace() {
        let cleaned = token.trim_matches(|c: char| c.is_ascii_punctuation() && c != '.');
        let cleaned = cleaned.trim_matches('.');
        match cleaned.to_ascii_lowercase().as_str() {
            "true" => return Some(Value::Bool(true)),
            "false" => return Some(Value::Bool(false)),
            _ => {}
        }
        if let Ok(i) = cleaned.parse::<i64>() {
            return Some(Value::from(i));
        }
        if let Ok(f) = cleaned.parse::<f64>() {
            if let Some(n) = serde_json::Number::from_f64(f) {
                return Some(Value::Number(n));
            }
        }
    }
    None
}
