//! Transcript data model and loading.
//!
//! A transcript is an ordered list of [`Message`]s. The scoring engine never looks
//! inside a [`Chunk`] beyond serializing it for key derivation and prompt rendering.

pub mod error;
pub mod recent;
pub mod window;

#[cfg(test)]
mod tests;

pub use error::{TranscriptError, TranscriptResult, WindowError};
pub use recent::{filter_recent, parse_timestamp};
pub use window::{WindowConfig, sliding_windows};

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One line of a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    #[serde(alias = "user", alias = "User")]
    pub speaker: String,
    /// Message body.
    #[serde(alias = "message", alias = "Message")]
    pub text: String,
    /// Timestamp kept verbatim from the source; see [`parse_timestamp`].
    #[serde(
        default,
        alias = "date",
        alias = "Date",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
}

impl Message {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// An ordered, immutable slice of the transcript submitted as one scoring unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    start: usize,
    messages: Vec<Message>,
}

impl Chunk {
    /// Creates a chunk whose first message sits at `start` in the source transcript.
    pub fn new(start: usize, messages: Vec<Message>) -> Self {
        Self { start, messages }
    }

    /// Index of the first message in the source transcript.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end index in the source transcript.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.messages.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[inline]
    pub fn first(&self) -> Option<&Message> {
        self.messages.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Trims every field and drops messages whose text is empty after trimming.
pub fn normalize(messages: Vec<Message>) -> Vec<Message> {
    let before = messages.len();
    let normalized: Vec<Message> = messages
        .into_iter()
        .filter_map(|m| {
            let text = m.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(Message {
                speaker: m.speaker.trim().to_string(),
                text: text.to_string(),
                timestamp: m
                    .timestamp
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
            })
        })
        .collect();

    if normalized.len() != before {
        debug!(
            dropped = before - normalized.len(),
            "Dropped empty transcript messages"
        );
    }
    normalized
}

/// Parses a JSON array of messages and normalizes it.
pub fn parse_json(raw: &str) -> TranscriptResult<Vec<Message>> {
    let messages: Vec<Message> = serde_json::from_str(raw)?;
    Ok(normalize(messages))
}

/// Parses a CSV transcript with a header row and normalizes it.
///
/// Columns are matched by name (`Date,User,Message` or their lowercase and
/// `timestamp,speaker,text` spellings); extra columns are ignored.
pub fn parse_csv(raw: &str) -> TranscriptResult<Vec<Message>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());
    let messages = reader
        .deserialize()
        .collect::<Result<Vec<Message>, csv::Error>>()?;
    Ok(normalize(messages))
}

/// Loads a JSON transcript from disk.
///
/// Accepts objects with `speaker`/`text` or the `user`/`message` column names, plus
/// an optional `date`/`timestamp`.
pub fn load_json(path: &Path) -> TranscriptResult<Vec<Message>> {
    load_with(path, "json", parse_json)
}

/// Loads a CSV transcript from disk.
pub fn load_csv(path: &Path) -> TranscriptResult<Vec<Message>> {
    load_with(path, "csv", parse_csv)
}

/// Loads a transcript, choosing the format from the file extension.
///
/// `.csv` files go through [`load_csv`]; anything else is read as JSON.
pub fn load_transcript(path: &Path) -> TranscriptResult<Vec<Message>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv { load_csv(path) } else { load_json(path) }
}

fn load_with(
    path: &Path,
    format: &'static str,
    parse: fn(&str) -> TranscriptResult<Vec<Message>>,
) -> TranscriptResult<Vec<Message>> {
    if !path.exists() {
        return Err(TranscriptError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(path)?;
    let messages = parse(&raw)?;
    if messages.is_empty() {
        return Err(TranscriptError::Empty {
            path: path.to_path_buf(),
        });
    }

    info!(path = %path.display(), format, messages = messages.len(), "Transcript loaded");
    Ok(messages)
}
