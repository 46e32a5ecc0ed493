//! Display CPR (colour calibration) token parser.
//!
//! A DisplayCPR file holds nine space-separated signed decimal coefficients that are later
//! programmed into the display's colour-correction hardware.
//!
//! # Acceptance Rule
//!
//! A token is accepted only when exactly nine values were read and their sum is
//! non-zero. An all-zero (unprovisioned) file is therefore rejected even though every
//! token parses.

use crate::config::{DISPLAYCPR_NUM_VALUES, DISPLAYCPR_TOKEN_MAXSIZE};
use crate::error::SplashError;
use crate::line::parse_decimal;

/// Calibration coefficients and whether they have been loaded.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CprInfo {
    values_valid: bool,
    values: [i32; DISPLAYCPR_NUM_VALUES],
}

impl CprInfo {
    /// An unloaded record (all zero, not valid).
    pub const fn new() -> Self {
        Self {
            values_valid: false,
            values: [0; DISPLAYCPR_NUM_VALUES],
        }
    }

    /// Whether a token has been loaded successfully.
    #[inline]
    pub const fn is_valid(&self) -> bool { self.values_valid }

    /// The coefficients in file order.
    #[inline]
    pub const fn values(&self) -> &[i32; DISPLAYCPR_NUM_VALUES] { &self.values }

    /// Parse `buf` and commit the values on success.
    ///
    /// On failure the record keeps whatever it held before.
    pub fn load(
        &mut self,
        buf: &[u8],
    ) -> Result<(), SplashError> {
        self.values = parse_cpr(buf)?;
        self.values_valid = true;
        Ok(())
    }
}

/// The part of a loaded file buffer that holds token text.
///
/// Bounded by [`DISPLAYCPR_TOKEN_MAXSIZE`] and by the first NUL byte (load buffers are
/// zero-filled).
pub fn token_text(buf: &[u8]) -> &[u8] {
    let buf = &buf[..buf.len().min(DISPLAYCPR_TOKEN_MAXSIZE)];
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    &buf[..end]
}

/// Parse a signed decimal prefix: optional `-`, then at least one digit.
///
/// Bytes after the digits are ignored, so a trailing line feed is fine.
fn parse_signed(token: &[u8]) -> Option<i32> {
    let (negative, digits) = match token.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, token),
    };
    let (magnitude, _) = parse_decimal(digits)?;
    let magnitude = i64::from(magnitude);
    i32::try_from(if negative { -magnitude } else { magnitude }).ok()
}

/// Parse nine CPR coefficients from a DisplayCPR buffer.
///
/// Tokens are separated by spaces; repeated spaces are skipped. Parsing stops after
/// nine values, so anything beyond them is ignored.
pub fn parse_cpr(buf: &[u8]) -> Result<[i32; DISPLAYCPR_NUM_VALUES], SplashError> {
    let mut values = [0i32; DISPLAYCPR_NUM_VALUES];
    let mut count = 0;
    let mut sum = 0i64;

    let tokens = token_text(buf).split(|&b| b == b' ').filter(|t| !t.is_empty());
    for token in tokens.take(DISPLAYCPR_NUM_VALUES) {
        let value = parse_signed(token).ok_or_else(|| SplashError::invalid_token(token))?;
        values[count] = value;
        sum += i64::from(value);
        count += 1;
    }

    if count != DISPLAYCPR_NUM_VALUES || sum == 0 {
        return Err(SplashError::InvalidCalibration);
    }
    Ok(values)
}

// =============================================================================
// Tests
// =============================================================================
