//! # Classify
//! Contains-AI flag for story titles.
//!
//! A title is AI-related when it mentions "AI" or "A.I" as a whole word.
//! Matching is case-sensitive: "said" or "Ai" never match.

use once_cell::sync::Lazy;
use regex::Regex;

static AI_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bA\.I\b|\bAI\b").expect("ai mention regex"));

/// Returns `true` if the title mentions AI as a whole word.
/// Missing titles are never AI-related.
pub fn contains_ai(title: Option<&str>) -> bool {
    title.is_some_and(|t| AI_MENTION.is_match(t))
}
