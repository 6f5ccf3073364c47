//! Score and terminal-decision extraction from LLM output.
//!
//! Extraction never fails to the caller: a missing or malformed annotation is
//! reported to a [`DiagnosticSink`] and replaced by a sentinel (`-1.0` for scores,
//! `None` for terminal decisions). Results are cached per message instance.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Deref;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

use super::Message;
use crate::error::{ScoreParseError, TerminalParseError};
use crate::step::Priority;

/// Marker preceding the numeric score in a score message.
pub const SCORE_MARKER: &str = "Total Score:";

/// Score assigned when extraction fails.
pub const INVALID_SCORE: f64 = -1.0;

const TERMINAL_YES: &str = "TERMINAL: YES";
const TERMINAL_NO: &str = "TERMINAL: NO";

/// Extract the score from the last line containing [`SCORE_MARKER`].
pub fn parse_score(content: &str) -> Result<f64, ScoreParseError> {
    let line = content
        .split('\n')
        .rev()
        .find(|line| line.contains(SCORE_MARKER))
        .ok_or(ScoreParseError::MissingMarker)?;
    let value = line.split(SCORE_MARKER).nth(1).unwrap_or_default().trim();
    match value.parse::<f64>() {
        // NaN and infinities would outrank every real score
        Ok(score) if score.is_finite() => Ok(score),
        _ => Err(ScoreParseError::InvalidNumber {
            value: value.to_string(),
        }),
    }
}

/// Case-insensitively look for `TERMINAL: YES` (checked first) or `TERMINAL: NO`.
pub fn parse_terminal(content: &str) -> Result<bool, TerminalParseError> {
    let upper = content.to_uppercase();
    if upper.contains(TERMINAL_YES) {
        Ok(true)
    } else if upper.contains(TERMINAL_NO) {
        Ok(false)
    } else {
        Err(TerminalParseError::MissingMarker)
    }
}

/// An extraction failure handed to a [`DiagnosticSink`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionFailure {
    #[error("Error parsing score ({0})")]
    Score(ScoreParseError),

    #[error("Error parsing terminal check ({0})")]
    Terminal(TerminalParseError),
}

/// Receives non-fatal extraction failures.
pub trait DiagnosticSink {
    /// Report a failure for the given message content.
    fn report(&self, failure: &ExtractionFailure, content: &str);
}

/// Default sink: emits a `warn!` event with the offending content.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, failure: &ExtractionFailure, content: &str) {
        warn!(error = %failure, content = %content, "Failed to extract annotation from message");
    }
}

/// A message carrying a score annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Message", into = "Message")]
pub struct ScoreMessage {
    message: Message,
    score: OnceLock<f64>,
}

impl ScoreMessage {
    /// Wrap a plain message.
    pub fn from_message(message: Message) -> Self {
        Self {
            message,
            score: OnceLock::new(),
        }
    }

    /// Score of the message, `-1.0` if it cannot be extracted.
    pub fn score(&self) -> f64 {
        self.score_with(&TracingSink)
    }

    /// Like [`ScoreMessage::score`], reporting a failure to `sink` on first access.
    pub fn score_with(&self, sink: &dyn DiagnosticSink) -> f64 {
        *self
            .score
            .get_or_init(|| match parse_score(&self.message.content) {
                Ok(score) => score,
                Err(e) => {
                    sink.report(&ExtractionFailure::Score(e), &self.message.content);
                    INVALID_SCORE
                }
            })
    }

    /// The underlying message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Unwrap into the underlying message.
    pub fn into_message(self) -> Message {
        self.message
    }
}

impl Deref for ScoreMessage {
    type Target = Message;

    fn deref(&self) -> &Message {
        &self.message
    }
}

impl From<Message> for ScoreMessage {
    fn from(message: Message) -> Self {
        Self::from_message(message)
    }
}

impl From<ScoreMessage> for Message {
    fn from(message: ScoreMessage) -> Self {
        message.message
    }
}

impl PartialEq for ScoreMessage {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

// Higher scores order first. Distinct messages with equal scores are
// incomparable so that `partial_cmp == Some(Equal)` agrees with `==`.
impl PartialOrd for ScoreMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match Priority(self.score()).cmp(&Priority(other.score())) {
            Ordering::Equal if self != other => None,
            ordering => Some(ordering),
        }
    }
}

/// A message ending in `TERMINAL: YES` or `TERMINAL: NO`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Message", into = "Message")]
pub struct TerminalCheckMessage {
    message: Message,
    is_final: OnceLock<Option<bool>>,
}

impl TerminalCheckMessage {
    /// Wrap a plain message.
    pub fn from_message(message: Message) -> Self {
        Self {
            message,
            is_final: OnceLock::new(),
        }
    }

    /// Terminal decision, `None` when neither marker is present.
    pub fn is_final(&self) -> Option<bool> {
        self.is_final_with(&TracingSink)
    }

    /// Like [`TerminalCheckMessage::is_final`], reporting a failure to `sink` on first access.
    pub fn is_final_with(&self, sink: &dyn DiagnosticSink) -> Option<bool> {
        *self
            .is_final
            .get_or_init(|| match parse_terminal(&self.message.content) {
                Ok(is_final) => Some(is_final),
                Err(e) => {
                    sink.report(&ExtractionFailure::Terminal(e), &self.message.content);
                    None
                }
            })
    }

    /// The underlying message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Unwrap into the underlying message.
    pub fn into_message(self) -> Message {
        self.message
    }
}

impl Deref for TerminalCheckMessage {
    type Target = Message;

    fn deref(&self) -> &Message {
        &self.message
    }
}

impl From<Message> for TerminalCheckMessage {
    fn from(message: Message) -> Self {
        Self::from_message(message)
    }
}

impl From<TerminalCheckMessage> for Message {
    fn from(message: TerminalCheckMessage) -> Self {
        message.message
    }
}

impl PartialEq for TerminalCheckMessage {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}
