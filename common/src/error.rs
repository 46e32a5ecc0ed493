//! Error taxonomy for splash decoding and calibration loading.
//!
//! Every failure is local and terminal for the operation that raised it: the boot flow
//! either shows a splash or continues without one. [`SplashError::code`] and [`status`]
//! keep the legacy `0 = success, negative = failure` contract for callers that only
//! understand integer status codes.

use core::fmt;

use heapless::String;

use crate::config::CPR_TOKEN_REPORT_LEN;

/// Why a decode, blit or calibration load failed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SplashError {
    /// A structural header line is missing or not numeric.
    MalformedHeader,
    /// Declared width or height is zero (or the pixel count overflows).
    InvalidDimensions,
    /// The data stream is shorter than the header declares.
    TruncatedData,
    /// A calibration token has no digits. Carries the (possibly truncated) token text.
    InvalidToken(String<CPR_TOKEN_REPORT_LEN>),
    /// Calibration has the wrong number of values or a zero checksum.
    InvalidCalibration,
    /// A write would land outside the destination framebuffer.
    OutOfBounds,
    /// A boot shell command returned a non-zero status.
    CommandFailed,
    /// The compressed asset could not be inflated.
    DecompressFailed,
}

impl SplashError {
    /// Build an `InvalidToken` error from raw token bytes.
    ///
    /// Non-ASCII bytes are shown as `?`; text beyond the report length is dropped.
    pub fn invalid_token(token: &[u8]) -> Self {
        let mut text: String<CPR_TOKEN_REPORT_LEN> = String::new();
        for &byte in token {
            let c = if byte.is_ascii_graphic() { byte as char } else { '?' };
            if text.push(c).is_err() {
                break;
            }
        }
        Self::InvalidToken(text)
    }

    /// Legacy integer status for this error (always negative).
    pub const fn code(&self) -> i32 {
        match self {
            Self::MalformedHeader => -1,
            Self::InvalidDimensions => -2,
            Self::TruncatedData => -3,
            Self::InvalidToken(_) => -4,
            Self::InvalidCalibration => -5,
            Self::OutOfBounds => -6,
            Self::CommandFailed => -7,
            Self::DecompressFailed => -8,
        }
    }
}

impl fmt::Display for SplashError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::MalformedHeader => write!(f, "malformed header"),
            Self::InvalidDimensions => write!(f, "invalid dimensions"),
            Self::TruncatedData => write!(f, "truncated data"),
            Self::InvalidToken(token) => write!(f, "invalid token [{}]", token),
            Self::InvalidCalibration => write!(f, "invalid calibration"),
            Self::OutOfBounds => write!(f, "write outside framebuffer"),
            Self::CommandFailed => write!(f, "boot command failed"),
            Self::DecompressFailed => write!(f, "decompression failed"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SplashError {
    fn format(
        &self,
        f: defmt::Formatter<'_>,
    ) {
        match self {
            Self::MalformedHeader => defmt::write!(f, "malformed header"),
            Self::InvalidDimensions => defmt::write!(f, "invalid dimensions"),
            Self::TruncatedData => defmt::write!(f, "truncated data"),
            Self::InvalidToken(token) => defmt::write!(f, "invalid token [{=str}]", token.as_str()),
            Self::InvalidCalibration => defmt::write!(f, "invalid calibration"),
            Self::OutOfBounds => defmt::write!(f, "write outside framebuffer"),
            Self::CommandFailed => defmt::write!(f, "boot command failed"),
            Self::DecompressFailed => defmt::write!(f, "decompression failed"),
        }
    }
}

/// Collapse a result to the legacy status code: `0` on success, negative on failure.
pub fn status<T>(result: &Result<T, SplashError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => err.code(),
    }
}

// =============================================================================
// Tests
// =============================================================================
