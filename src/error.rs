//! Stream error types.

use std::fmt;

/// Categories of stream errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamErrorKind {
    /// Invalid argument (e.g. a negative index, a zero slice step)
    Usage,
    /// Valid request, insufficient data (e.g. an index past the end of a finite stream)
    Range,
    /// An error raised by caller-supplied code while forcing a deferred tail
    Upstream,
    /// Structural equality exceeded its recursion bound; "cannot determine",
    /// which is distinct from "not equal"
    Undecidable,
}

/// A stream error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    /// The category of error
    pub kind: StreamErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl StreamError {
    /// Create a new stream error.
    pub fn new(kind: StreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a usage error (invalid argument).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(StreamErrorKind::Usage, message)
    }

    /// Create a range error (not enough data to satisfy the request).
    pub fn range(message: impl Into<String>) -> Self {
        Self::new(StreamErrorKind::Range, message)
    }

    /// Create an upstream failure (raised while forcing a deferred tail).
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(StreamErrorKind::Upstream, message)
    }

    /// Create an undecidable-comparison error.
    pub fn undecidable(message: impl Into<String>) -> Self {
        Self::new(StreamErrorKind::Undecidable, message)
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StreamErrorKind::Usage => write!(f, "usage error: {}", self.message),
            StreamErrorKind::Range => write!(f, "range error: {}", self.message),
            StreamErrorKind::Upstream => write!(f, "upstream failure: {}", self.message),
            StreamErrorKind::Undecidable => {
                write!(f, "comparison undecidable: {}", self.message)
            }
        }
    }
}

impl std::error::Error for StreamError {}
