use thiserror::Error;

/// Text read from one search result: the author label and the message body.
/// Produced fresh for every visit of an index and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessageBlock {
    pub praiser_raw_label: String,
    pub body_text: String,
}

impl RawMessageBlock {
    pub fn new(praiser_raw_label: impl Into<String>, body_text: impl Into<String>) -> Self {
        Self {
            praiser_raw_label: praiser_raw_label.into(),
            body_text: body_text.into(),
        }
    }
}

/// The parser's output: enough to look up the recognition card, but not yet
/// confirmed against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub praiser_name: String,
    pub praised_first_name: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("recognition card lists no praised names")]
    NoPraisedNames,
}

/// A verified recognition: one praiser, one or more praised people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PraiseRecord {
    pub praiser_name: String,
    pub praised_first_name: String,
    pub excerpt: String,
    praised_full_names: Vec<String>,
    pub timestamp_raw: String,
}

impl PraiseRecord {
    /// Completes a parsed message with the names and timestamp read from the
    /// matching card. `praised_text` may hold several comma-separated names.
    pub fn from_verified(
        parsed: ParsedMessage,
        praised_text: &str,
        timestamp_raw: impl Into<String>,
    ) -> Result<Self, RecordError> {
        Self::with_names(parsed, split_praised_names(praised_text), timestamp_raw)
    }

    pub fn with_names(
        parsed: ParsedMessage,
        praised_full_names: Vec<String>,
        timestamp_raw: impl Into<String>,
    ) -> Result<Self, RecordError> {
        if praised_full_names.is_empty() {
            return Err(RecordError::NoPraisedNames);
        }
        Ok(Self {
            praiser_name: parsed.praiser_name,
            praised_first_name: parsed.praised_first_name,
            excerpt: parsed.excerpt,
            praised_full_names,
            timestamp_raw: timestamp_raw.into(),
        })
    }

    /// Never empty.
    pub fn praised_full_names(&self) -> &[String] {
        &self.praised_full_names
    }

    /// One submission per praised name, in card order, sharing timestamp and praiser.
    pub fn submissions(&self) -> impl Iterator<Item = SubmissionKey> + '_ {
        self.praised_full_names.iter().map(|praised| SubmissionKey {
            timestamp: self.timestamp_raw.clone(),
            praiser: self.praiser_name.clone(),
            praised: praised.clone(),
        })
    }
}

/// Identity of a single `add_record` call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionKey {
    pub timestamp: String,
    pub praiser: String,
    pub praised: String,
}

/// Splits the praised-name text of a card into individual names.
pub fn split_praised_names(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
