//! Lenient JSON repair
//!
//! Language-model producers often emit almost-JSON: comments, trailing commas,
//! or output cut off by a token limit. The repair passes here run in order of
//! increasing damage to the input and stop at the first one that yields valid
//! JSON.

use std::borrow::Cow;

use log::{debug, warn};
use serde::de::IgnoredAny;

/// Return `input` unchanged when it already parses, otherwise the first
/// repaired form that does. When no pass helps, the input comes back as is
/// and the parser reports the original error.
pub fn repair_json(input: &str) -> Cow<'_, str> {
    if is_valid(input) {
        return Cow::Borrowed(input);
    }

    let cleaned = remove_trailing_commas(&strip_comments(input));
    if is_valid(&cleaned) {
        debug!("repaired JSON by stripping comments and trailing commas");
        return Cow::Owned(cleaned);
    }

    let closed = close_truncated(&cleaned);
    if is_valid(&closed) {
        debug!(
            "repaired truncated JSON by closing it ({} -> {} bytes)",
            input.len(),
            closed.len()
        );
        return Cow::Owned(closed);
    }

    if let Some(truncated) = truncate_to_last_complete_element(&cleaned).filter(|s| is_valid(s)) {
        debug!(
            "repaired truncated JSON by dropping the incomplete tail ({} -> {} bytes)",
            input.len(),
            truncated.len()
        );
        return Cow::Owned(truncated);
    }

    warn!("JSON repair failed, passing input through unchanged");
    Cow::Borrowed(input)
}

fn is_valid(json: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(json).is_ok()
}

/// Tracks whether the scan position is inside a string literal.
#[derive(Default)]
struct Lexer {
    in_string: bool,
    escaped: bool,
}

impl Lexer {
    /// Advance over `ch`; true when `ch` is structural, i.e. outside any string.
    fn step(&mut self, ch: char) -> bool {
        if self.escaped {
            self.escaped = false;
            return false;
        }
        if self.in_string {
            match ch {
                '\\' => self.escaped = true,
                '"' => self.in_string = false,
                _ => {}
            }
            return false;
        }
        if ch == '"' {
            self.in_string = true;
            return false;
        }
        true
    }
}

/// Drop `//` line comments and `/* */` block comments outside strings.
fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut lexer = Lexer::default();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if !lexer.step(ch) || ch != '/' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('/') => {
                while chars.next_if(|&c| c != '\n').is_some() {}
            }
            Some('*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Drop commas directly followed (modulo whitespace) by `]` or `}`.
fn remove_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut lexer = Lexer::default();

    for (i, &ch) in chars.iter().enumerate() {
        if lexer.step(ch) && ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some(']' | '}')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Terminate an open string and close every open bracket, innermost first.
fn close_truncated(input: &str) -> String {
    let mut out = input.trim_end().trim_end_matches(',').to_string();

    let mut lexer = Lexer::default();
    let mut closers = Vec::new();
    let mut last_string_start = 0;
    for (i, ch) in out.char_indices() {
        if !lexer.in_string && ch == '"' {
            last_string_start = i;
        }
        if !lexer.step(ch) {
            continue;
        }
        match ch {
            '[' => closers.push(']'),
            '{' => closers.push('}'),
            ']' | '}' => {
                closers.pop();
            }
            _ => {}
        }
    }

    if lexer.in_string {
        if lexer.escaped {
            out.pop();
        }
        out.push('"');
    }

    // key without a value
    if out.trim_end().ends_with(':') {
        out.truncate(last_string_start);
    }
    let kept = out.trim_end().trim_end_matches(',').len();
    out.truncate(kept);

    while let Some(closer) = closers.pop() {
        out.push(closer);
    }
    out
}

/// Cut a top-level array after its last complete object element.
fn truncate_to_last_complete_element(input: &str) -> Option<String> {
    if !input.trim_start().starts_with('[') {
        return None;
    }

    let mut lexer = Lexer::default();
    let mut depth = 0usize;
    let mut last_end = None;
    for (i, ch) in input.char_indices() {
        if !lexer.step(ch) {
            continue;
        }
        match ch {
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 1 && ch == '}' {
                    last_end = Some(i);
                }
            }
            _ => {}
        }
    }

    let end = last_end?;
    let mut out = input[..=end].to_string();
    out.push(']');
    Some(out)
}
