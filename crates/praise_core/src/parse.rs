//! Heuristics that turn a raw search result into a [`ParsedMessage`].
//!
//! The chat client renders a recognition as
//! `"<First> got praise! <free text> <First> <Last> ..."`, with the author shown
//! separately. The free text between the marker and the reappearing first name
//! becomes the excerpt used to find the matching card.

use thiserror::Error;

use crate::{ParsedMessage, RawMessageBlock};

/// Excerpts are never compared on more than this many characters.
pub const EXCERPT_MAX: usize = 20;
/// Short excerpts are widened to this many characters (when available).
pub const EXCERPT_MIN: usize = 5;

/// Literal text fragments the parser keys on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFormat {
    /// Separates the salutation from the recognition text.
    pub praise_marker: String,
    /// Start of the annotation the client appends to deactivated accounts.
    pub deletion_marker: String,
    /// Abbreviation markers the client may put into a long first name.
    pub ellipses: Vec<String>,
}

impl Default for MessageFormat {
    fn default() -> Self {
        Self {
            praise_marker: " got praise! ".to_string(),
            deletion_marker: " [Marked ".to_string(),
            ellipses: vec!["...".to_string(), "\u{2026}".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("message body is empty")]
    EmptyBody,
    #[error("praise marker {marker:?} not found in message body")]
    MissingMarker { marker: String },
}

/// Parses one search result into the fields used to verify it.
pub fn parse_message(
    block: &RawMessageBlock,
    format: &MessageFormat,
) -> Result<ParsedMessage, ParseError> {
    let praiser_name = strip_deletion_marker(&block.praiser_raw_label, &format.deletion_marker);

    let first_token = block
        .body_text
        .split_whitespace()
        .next()
        .ok_or(ParseError::EmptyBody)?;
    let praised_first_name = truncate_at_ellipsis(first_token, &format.ellipses);

    let (_, after_marker) = block
        .body_text
        .split_once(format.praise_marker.as_str())
        .ok_or_else(|| ParseError::MissingMarker {
            marker: format.praise_marker.clone(),
        })?;

    let candidate = if praised_first_name.is_empty() {
        after_marker
    } else {
        let needle = format!(" {praised_first_name}");
        after_marker
            .split_once(needle.as_str())
            .map_or(after_marker, |(head, _)| head)
    };

    Ok(ParsedMessage {
        praiser_name: praiser_name.to_string(),
        praised_first_name: praised_first_name.to_string(),
        excerpt: normalize_excerpt(candidate, praised_first_name),
    })
}

/// Drops a trailing deletion annotation such as `" [Marked for deletion]"`.
pub fn strip_deletion_marker<'a>(label: &'a str, marker: &str) -> &'a str {
    label.split_once(marker).map_or(label, |(name, _)| name)
}

fn truncate_at_ellipsis<'a>(token: &'a str, ellipses: &[String]) -> &'a str {
    let cut = ellipses
        .iter()
        .filter_map(|ellipsis| token.find(ellipsis.as_str()))
        .min()
        .unwrap_or(token.len());
    &token[..cut]
}

/// Number of characters of a raw excerpt of length `raw_len` that take part
/// in the card lookup.
///
/// | raw_len   | window                 |
/// |-----------|------------------------|
/// | >= 20     | 20                     |
/// | 6..20     | raw_len                |
/// | 1..=5     | 5                      |
/// | 0         | len(praised_first_name)|
pub fn excerpt_window(raw_len: usize, first_name_len: usize) -> usize {
    match raw_len {
        0 => first_name_len,
        1..=EXCERPT_MIN => EXCERPT_MIN,
        len if len < EXCERPT_MAX => len,
        _ => EXCERPT_MAX,
    }
}

/// Slices `excerpt` to its lookup window. Lengths count characters, not bytes.
pub fn normalize_excerpt(excerpt: &str, praised_first_name: &str) -> String {
    let raw_len = excerpt.chars().count();
    let window = excerpt_window(raw_len, praised_first_name.chars().count());
    excerpt.chars().take(window).collect()
}
