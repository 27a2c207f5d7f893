//! Compiled `*` wildcard matcher used for key globs and foreign-key patterns
//!
//! A pattern is split on `*` into literal segments. Without a `*` the pattern
//! is an exact match. The first segment is anchored at the start and the last
//! at the end; the segments in between must appear in order.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    source: String,
    segments: Vec<String>,
    wildcard: bool,
    ignore_case: bool,
}

impl GlobPattern {
    /// Case-sensitive pattern (node keys, edge endpoints)
    pub fn new(pattern: &str) -> Self {
        Self::compile(pattern, false)
    }

    /// Case-insensitive pattern (tag keys)
    pub fn new_ignore_case(pattern: &str) -> Self {
        Self::compile(pattern, true)
    }

    fn compile(pattern: &str, ignore_case: bool) -> Self {
        let normalized = if ignore_case {
            pattern.to_lowercase()
        } else {
            pattern.to_string()
        };
        GlobPattern {
            source: pattern.to_string(),
            segments: normalized.split('*').map(str::to_string).collect(),
            wildcard: pattern.contains('*'),
            ignore_case,
        }
    }

    /// True when the text contains a `*`
    pub fn is_glob(text: &str) -> bool {
        text.contains('*')
    }

    pub fn has_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Matches everything (`*`, `**`, ...)
    pub fn matches_all(&self) -> bool {
        self.wildcard && self.segments.iter().all(String::is_empty)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, text: &str) -> bool {
        let lowered;
        let text = if self.ignore_case {
            lowered = text.to_lowercase();
            lowered.as_str()
        } else {
            text
        };

        if !self.wildcard {
            return self.segments[0] == text;
        }

        let first = &self.segments[0];
        let last = &self.segments[self.segments.len() - 1];
        if text.len() < first.len() + last.len() {
            return false;
        }
        if !text.starts_with(first.as_str()) || !text.ends_with(last.as_str()) {
            return false;
        }

        let mut remaining = &text[first.len()..text.len() - last.len()];
        for middle in &self.segments[1..self.segments.len() - 1] {
            match remaining.find(middle.as_str()) {
                Some(pos) => remaining = &remaining[pos + middle.len()..],
                None => return false,
            }
        }
        true
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
