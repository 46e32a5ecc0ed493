//! Line scanner for text-prefixed buffers.
//!
//! Both splash formats start with a few lines of ASCII text followed by binary data.
//! [`LineScanner`] walks a cursor through such a buffer without ever reading past its
//! end: every structural failure is reported as [`SplashError::MalformedHeader`].

use crate::error::SplashError;

/// Index immediately after the next line feed at or after `pos`.
///
/// Returns `None` when no line feed exists between `pos` and the end of `buf`.
pub fn next_line(
    buf: &[u8],
    pos: usize,
) -> Option<usize> {
    let rest = buf.get(pos..)?;
    rest.iter().position(|&b| b == b'\n').map(|i| pos + i + 1)
}

/// Parse an unsigned decimal prefix of `bytes`.
///
/// Returns the value and the number of digits consumed, or `None` if there are no
/// digits or the value overflows `u32`. Leading whitespace is not skipped.
pub fn parse_decimal(bytes: &[u8]) -> Option<(u32, usize)> {
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    let mut value = 0u32;
    for &byte in &bytes[..digits] {
        value = value.checked_mul(10)?.checked_add(u32::from(byte - b'0'))?;
    }
    Some((value, digits))
}

/// Cursor over a text-prefixed byte buffer.
#[derive(Clone, Debug)]
pub struct LineScanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> LineScanner<'a> {
    /// Create a scanner positioned at the start of `buf`.
    pub const fn new(buf: &'a [u8]) -> Self { Self { buf, pos: 0 } }

    /// Current cursor position.
    #[inline]
    pub const fn position(&self) -> usize { self.pos }

    /// Bytes from the cursor to the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] { &self.buf[self.pos..] }

    /// Move the cursor to the start of the next line.
    pub fn skip_line(&mut self) -> Result<(), SplashError> {
        self.pos = next_line(self.buf, self.pos).ok_or(SplashError::MalformedHeader)?;
        Ok(())
    }

    /// Move the cursor forward by `n` bytes.
    pub fn skip_bytes(
        &mut self,
        n: usize,
    ) -> Result<(), SplashError> {
        let pos = self.pos.checked_add(n).ok_or(SplashError::MalformedHeader)?;
        if pos > self.buf.len() {
            return Err(SplashError::MalformedHeader);
        }
        self.pos = pos;
        Ok(())
    }

    /// Parse an unsigned decimal at the cursor and move past its digits.
    pub fn parse_decimal(&mut self) -> Result<u32, SplashError> {
        let (value, digits) = parse_decimal(self.remaining()).ok_or(SplashError::MalformedHeader)?;
        self.pos += digits;
        Ok(value)
    }

    /// The rest of the current line, without its line feed.
    ///
    /// The cursor is not moved. Fails if the line is not terminated.
    pub fn current_line(&self) -> Result<&'a [u8], SplashError> {
        let end = next_line(self.buf, self.pos).ok_or(SplashError::MalformedHeader)?;
        Ok(&self.buf[self.pos..end - 1])
    }
}

// =============================================================================
// Tests
// =============================================================================
