//! Error types for decoding, encoding and format detection.
//!
//! Every fallible operation in this crate reports through [`Error`]. The
//! variants follow the stages of a conversion:
//!
//! - **Decode**: malformed input for the attempted format
//! - **Remaining data**: a strict read that left unread bytes behind
//! - **Encode**: a value shape the target format cannot represent
//! - **Resource**: a source or destination that cannot be opened
//! - **No matching format**: auto-detection failed for every registered codec
//!
//! Auto-detection treats [`Error::Decode`] and [`Error::RemainingData`] as
//! recoverable (see [`Error::is_recoverable`]); everything else is returned
//! to the caller untouched.
//!
//! ## Examples
//!
//! ```rust
//! use config_formats::{registry, Error};
//!
//! let result = registry::global().detect(b"{\"a\": 1}}");
//! if let Err(Error::NoMatchingFormat { failures }) = result {
//!     // one entry per registered codec
//!     assert!(failures.iter().any(|f| f.format == "json"));
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Longest remainder preview carried by [`Error::RemainingData`].
pub const PREVIEW_LEN: usize = 30;

/// Represents all possible errors of a conversion.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while writing output
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed input for the attempted codec
    #[error("{format} decode error: {msg}")]
    Decode { format: String, msg: String },

    /// The value has a shape the target codec cannot represent
    #[error("{format} encode error: {msg}")]
    Encode { format: String, msg: String },

    /// A strict read left unread bytes in the input
    #[error("found {len} remaining bytes after parsing {format}: {preview}")]
    RemainingData {
        format: String,
        len: usize,
        preview: String,
    },

    /// The source or destination cannot be opened
    #[error("cannot access {resource}: {msg}")]
    Resource { resource: String, msg: String },

    /// Every registered codec failed to decode the input
    #[error("no registered format could decode the input:{}", summarize(.failures))]
    NoMatchingFormat { failures: Vec<FormatFailure> },

    /// No codec is registered under the given identifier or extension
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// A codec with the same identifier is already registered
    #[error("format {0} is already registered")]
    DuplicateFormat(String),

    /// Malformed query expression or prefix path
    #[error("invalid path {path:?} at position {position}: {msg}")]
    InvalidPath {
        path: String,
        position: usize,
        msg: String,
    },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

/// The reason a single codec was rejected during auto-detection.
#[derive(Debug, Clone)]
pub struct FormatFailure {
    /// Identifier of the rejected codec.
    pub format: String,
    /// Why it was rejected.
    pub error: Error,
}

fn summarize(failures: &[FormatFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("\n  {}: {}", failure.format, failure.error))
        .collect()
}

impl Error {
    /// Creates a decode error for the given format.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_formats::Error;
    ///
    /// let err = Error::decode("json", "expected value");
    /// assert_eq!(err.to_string(), "json decode error: expected value");
    /// ```
    pub fn decode<T: fmt::Display>(format: &str, msg: T) -> Self {
        Error::Decode {
            format: format.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates an encode error for the given format.
    pub fn encode<T: fmt::Display>(format: &str, msg: T) -> Self {
        Error::Encode {
            format: format.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a remaining-data error from the unread tail of an input.
    ///
    /// The preview holds at most [`PREVIEW_LEN`] bytes, escaped, followed by
    /// `...` when the remainder is longer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_formats::Error;
    ///
    /// let err = Error::remaining_data("msgpack", b"\"a\": 1}");
    /// assert!(err.to_string().contains("found 7 remaining bytes"));
    /// ```
    pub fn remaining_data(format: &str, remainder: &[u8]) -> Self {
        let head = &remainder[..remainder.len().min(PREVIEW_LEN)];
        let mut preview = head.escape_ascii().to_string();
        if remainder.len() > PREVIEW_LEN {
            preview.push_str("...");
        }
        Error::RemainingData {
            format: format.to_string(),
            len: remainder.len(),
            preview,
        }
    }

    /// Creates a resource error for a source or destination.
    pub fn resource<T: fmt::Display>(resource: &str, msg: T) -> Self {
        Error::Resource {
            resource: resource.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates an error for a malformed query or prefix path.
    pub fn invalid_path(path: &str, position: usize, msg: &str) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            position,
            msg: msg.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_formats::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for output failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns `true` for failures auto-detection may swallow and move past.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Error::Decode { .. } | Error::RemainingData { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
