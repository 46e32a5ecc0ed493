//! gzip inflater for compressed splash assets.
//!
//! Splash images are stored gzip-compressed on the boot partition. This module strips the
//! RFC 1952 member header and inflates the raw deflate body with `miniz_oxide`'s `no_std`
//! core into a caller-provided buffer. The trailer CRC and size are not checked.

use miniz_oxide::inflate::TINFLStatus;
use miniz_oxide::inflate::core::inflate_flags::TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF;
use miniz_oxide::inflate::core::{DecompressorOxide, decompress};

use crate::error::SplashError;
use crate::loader::Decompressor;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const GZIP_METHOD_DEFLATE: u8 = 8;
const GZIP_HEADER_LEN: usize = 10;

// Header flag bits
const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;
const FRESERVED: u8 = 0xE0;

/// Skip a NUL-terminated header field starting at `pos`.
fn skip_cstr(
    src: &[u8],
    pos: usize,
) -> Result<usize, SplashError> {
    let rest = src.get(pos..).ok_or(SplashError::DecompressFailed)?;
    let nul = rest.iter().position(|&b| b == 0).ok_or(SplashError::DecompressFailed)?;
    Ok(pos + nul + 1)
}

/// The raw deflate stream of a gzip member.
pub fn deflate_body(src: &[u8]) -> Result<&[u8], SplashError> {
    let header = src.get(..GZIP_HEADER_LEN).ok_or(SplashError::DecompressFailed)?;
    let flags = header[3];
    if header[..2] != GZIP_MAGIC || header[2] != GZIP_METHOD_DEFLATE || flags & FRESERVED != 0 {
        return Err(SplashError::DecompressFailed);
    }

    let mut pos = GZIP_HEADER_LEN;
    if flags & FEXTRA != 0 {
        let len = src.get(pos..pos + 2).ok_or(SplashError::DecompressFailed)?;
        pos += 2 + usize::from(u16::from_le_bytes([len[0], len[1]]));
    }
    if flags & FNAME != 0 {
        pos = skip_cstr(src, pos)?;
    }
    if flags & FCOMMENT != 0 {
        pos = skip_cstr(src, pos)?;
    }
    if flags & FHCRC != 0 {
        pos += 2;
    }
    src.get(pos..).ok_or(SplashError::DecompressFailed)
}

/// gzip [`Decompressor`] backed by `miniz_oxide`.
///
/// Holds the inflate state (about 11 KB) so it does not land on the stack per call.
pub struct GzipInflater {
    state: DecompressorOxide,
}

impl GzipInflater {
    /// Create an inflater.
    pub fn new() -> Self {
        Self {
            state: DecompressorOxide::new(),
        }
    }
}

impl Default for GzipInflater {
    fn default() -> Self { Self::new() }
}

impl Decompressor for GzipInflater {
    fn decompress(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, SplashError> {
        let body = deflate_body(src)?;
        self.state.init();
        let (status, _, written) = decompress(&mut self.state, body, dst, 0, TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF);
        match status {
            TINFLStatus::Done => Ok(written),
            _ => Err(SplashError::DecompressFailed),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
