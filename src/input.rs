//! Input buffer shared by codecs, and the strict remainder check.
//!
//! Codecs decode from an [`Input`]: a read position over borrowed bytes. A
//! codec that understands "one document" (a MessagePack object, a JSON
//! value) advances past exactly what it parsed; whole-file codecs consume
//! everything. [`check_remainder`] then rejects any bytes left behind.
//!
//! Creating a fresh `Input` over the same slice is how auto-detection gives
//! every codec an untouched view of the data.

use crate::{Error, Result};
use std::io;
use tracing::trace;

/// A forward-only read position over a byte slice.
///
/// # Examples
///
/// ```rust
/// use config_formats::Input;
///
/// let mut input = Input::new(b"abc");
/// assert_eq!(input.take(1), b"a");
/// assert_eq!(input.remaining(), b"bc");
/// input.rewind();
/// assert_eq!(input.position(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct Input<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Input<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Input { bytes, position: 0 }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position >= self.bytes.len()
    }

    /// Consumes up to `n` bytes and returns them.
    pub fn take(&mut self, n: usize) -> &'a [u8] {
        let end = self.bytes.len().min(self.position + n);
        let taken = &self.bytes[self.position..end];
        self.position = end;
        taken
    }

    /// Consumes and returns everything left.
    pub fn take_rest(&mut self) -> &'a [u8] {
        self.take(self.bytes.len() - self.position)
    }

    /// Consumes everything left, which must be UTF-8 text.
    pub fn take_str(&mut self, format: &str) -> Result<&'a str> {
        let rest = self.remaining();
        let text = std::str::from_utf8(rest).map_err(|e| Error::decode(format, e))?;
        self.position = self.bytes.len();
        Ok(text)
    }

    /// Skips ASCII whitespace.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.bytes.get(self.position) {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.position += 1;
        }
    }

    /// Moves the read position back to the start.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl io::Read for Input<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = self.take(buf.len());
        buf[..chunk.len()].copy_from_slice(chunk);
        Ok(chunk.len())
    }
}

/// Fails with [`Error::RemainingData`] if `input` still holds bytes after a
/// codec returned.
///
/// # Examples
///
/// ```rust
/// use config_formats::{check_remainder, Error, Input};
///
/// let mut input = Input::new(b"1 2");
/// input.take(1);
/// assert!(matches!(
///     check_remainder(&mut input, "json"),
///     Err(Error::RemainingData { len: 2, .. })
/// ));
/// ```
pub fn check_remainder(input: &mut Input<'_>, format: &str) -> Result<()> {
    let remainder = input.take_rest();
    trace!(format, remaining = remainder.len(), "strict remainder check");
    if remainder.is_empty() {
        Ok(())
    } else {
        Err(Error::remaining_data(format, remainder))
    }
}
