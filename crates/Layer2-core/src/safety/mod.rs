//! Two-tier content-safety filter with sentence-level redaction
//!
//! The strict list hard-blocks terms that must never reach a child-facing
//! surface. The sensitive list names terms that are watched but allowed:
//! death, war, weapons and crime occur legitimately in historical and
//! philosophical narrative and must not trigger blocking. The two sets are
//! disjoint.
//!
//! Matching is whole-word and case-insensitive; `sanitize` drops only the
//! violating sentences and keeps the surrounding safe narrative.

use regex::Regex;
use serde_json::Value;

/// Hard-blocked terms: profanity, explicit sexual content, hate terms,
/// extreme violence, controlled substances, self-harm.
const STRICT_TERMS: &[&str] = &[
    // Profanity
    "fuck", "shit", "bitch", "asshole", "bastard", "cunt", "whore", "slut",
    // Explicit sexual content
    "sex", "sexual", "nude", "naked", "porn", "erotic", "orgasm", "rape", "incest",
    // Hate
    "slur", "lynch", "supremacist",
    // Extreme violence
    "torture", "massacre", "murder", "mutilate", "dismember", "behead", "gore",
    // Controlled substances
    "cocaine", "heroin", "meth", "marijuana", "cannabis", "opioid", "alcohol",
    "tobacco", "cigarette", "vape",
    // Self-harm
    "suicide", "overdose",
];

/// Watched-but-allowed terms. Kept as an explicit list so the boundary
/// with the strict list is reviewable, and so tests can enforce that the
/// two tiers stay disjoint.
const SENSITIVE_TERMS: &[&str] = &[
    "death", "died", "dying", "war", "battle", "weapon", "sword", "gun",
    "soldier", "army", "kill", "killed", "crime", "criminal", "prison",
    "revolution", "plague", "famine", "slavery", "violence",
];

/// Content-safety filter over generated values
#[derive(Debug, Clone)]
pub struct SafetyFilter {
    strict_matcher: Regex,
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyFilter {
    pub fn new() -> Self {
        Self {
            strict_matcher: compile_word_matcher(STRICT_TERMS),
        }
    }

    /// Recursively check a JSON-like value against the strict list.
    ///
    /// Returns `true` if the content is safe. Walks strings, arrays and
    /// object values (keys are structured identifiers and are not checked);
    /// short-circuits on the first violation found anywhere.
    pub fn is_safe(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => self.text_is_safe(s),
            Value::Array(items) => items.iter().all(|item| self.is_safe(item)),
            Value::Object(map) => map.values().all(|item| self.is_safe(item)),
            _ => true,
        }
    }

    /// Whole-word, case-insensitive check of a single string
    pub fn text_is_safe(&self, text: &str) -> bool {
        !self.strict_matcher.is_match(text)
    }

    /// Drop violating sentences, keep the rest.
    ///
    /// Text is split on terminal punctuation (`.`, `!`, `?`); each segment
    /// is evaluated independently and only clean segments are rejoined.
    /// Segments carry their own trailing whitespace, so clean input is
    /// returned byte-identical.
    pub fn sanitize(&self, text: &str) -> String {
        split_segments(text)
            .into_iter()
            .filter(|segment| self.text_is_safe(segment))
            .collect()
    }
}

/// Compile a single alternation regex matching any term as a whole word
fn compile_word_matcher(terms: &[&str]) -> Regex {
    let alternation = terms
        .iter()
        .map(|term| regex::escape(term))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("Failed to compile safety lexicon")
}

/// Split text into sentence-like segments.
///
/// A segment runs through its terminal punctuation and any whitespace that
/// follows, so concatenating all segments reproduces the input exactly.
/// A trailing run with no terminal punctuation is its own segment.
fn split_segments(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut after_terminal = false;

    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            after_terminal = true;
            continue;
        }
        if after_terminal && !c.is_whitespace() {
            segments.push(&text[start..i]);
            start = i;
            after_terminal = false;
        }
    }

    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}
