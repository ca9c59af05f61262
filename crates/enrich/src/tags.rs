//! Tag extraction from caption text.

use regex::Regex;
use std::sync::OnceLock;

/// Upper bound on tags extracted from a single caption.
pub const MAX_TAGS: usize = 10;

/// Words too generic to be useful as search tags.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from", "is",
    "are", "was", "were", "be", "been", "being", "this", "that", "these", "those", "it", "its", "as",
    "then", "beginning", "ending", "showing", "image", "photo", "picture",
];

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w+\b").expect("static pattern compiles"))
}

/// Extract search tags from a caption.
///
/// Words are lowercased, stop words and anything shorter than three
/// characters are dropped, duplicates collapse to their first occurrence,
/// and the result is capped at [`MAX_TAGS`]. Order follows the caption.
pub fn extract(caption: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for word in word_pattern().find_iter(caption) {
        let word = word.as_str().to_lowercase();
        if word.len() <= 2 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        if !tags.contains(&word) {
            tags.push(word);
        }
        if tags.len() == MAX_TAGS {
            break;
        }
    }
    tags
}

/// Union of several tag lists, preserving first-occurrence order.
///
/// Used to merge a video's description tags with its per-frame tags. Not
/// capped: the inputs already are.
pub fn union<I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut merged: Vec<String> = Vec::new();
    for list in lists {
        for tag in list {
            if !merged.contains(&tag) {
                merged.push(tag);
            }
        }
    }
    merged
}
