//! Raw PPM splash loader (32-bit framebuffer).
//!
//! # Buffer Layout
//!
//! ```text
//! P6\n                  type line, not validated
//! # creator\n           comment line, not validated
//! <width> <height>\n
//! 255\n                 max value line, not validated
//! RGB RGB RGB ...       width * height raw triplets
//! ```
//!
//! Pixels are written 1:1 from the start of the framebuffer without stride or centring.
//! Placement is left to display set-up code, which reads the returned [`ImgInfo`]
//! (see [`present`](crate::present)).

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::Size;

use crate::config::{DEFAULT_BG_COLOR, DEFAULT_IMG_HEIGHT, DEFAULT_IMG_WIDTH};
use crate::error::SplashError;
use crate::framebuffer::{Framebuffer32, PixelWord};
use crate::line::{LineScanner, parse_decimal};

/// Bytes per pixel in the raw PPM body.
pub const PPM_BYTES_PER_PIXEL: usize = 3;

/// Dimensions and background colour of the most recently loaded splash.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ImgInfo {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Background colour, packed `0x00RRGGBB` (taken from the top-left pixel).
    pub bg_color: u32,
}

impl ImgInfo {
    /// Values reported before any splash has been loaded.
    pub const BOOT_DEFAULT: Self = Self {
        width: DEFAULT_IMG_WIDTH,
        height: DEFAULT_IMG_HEIGHT,
        bg_color: DEFAULT_BG_COLOR,
    };

    /// Image size.
    pub const fn size(&self) -> Size { Size::new(self.width, self.height) }

    /// Background colour.
    pub fn background(&self) -> Rgb888 { self.bg_color.to_color() }
}

impl Default for ImgInfo {
    fn default() -> Self { Self::BOOT_DEFAULT }
}

/// Pack an RGB triple as `0x00RRGGBB`.
#[inline]
pub const fn pack_rgb(
    r: u8,
    g: u8,
    b: u8,
) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// A parsed PPM splash with exactly `width * height` pixels of data.
#[derive(Clone, Debug)]
pub struct PpmImage<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> PpmImage<'a> {
    /// Parse the header and bound the pixel data.
    ///
    /// The dimensions line is read through a bounded slice: width, one separator byte,
    /// height. Bytes after the last pixel are ignored.
    pub fn parse(buf: &'a [u8]) -> Result<Self, SplashError> {
        let mut scanner = LineScanner::new(buf);
        scanner.skip_line()?; // type
        scanner.skip_line()?; // creator/comment

        let dims = scanner.current_line()?;
        let (width, digits) = parse_decimal(dims).ok_or(SplashError::MalformedHeader)?;
        let rest = dims.get(digits + 1..).ok_or(SplashError::MalformedHeader)?;
        let (height, _) = parse_decimal(rest).ok_or(SplashError::MalformedHeader)?;
        if width == 0 || height == 0 {
            return Err(SplashError::InvalidDimensions);
        }

        scanner.skip_line()?; // dimensions
        scanner.skip_line()?; // max value

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(PPM_BYTES_PER_PIXEL))
            .ok_or(SplashError::InvalidDimensions)?;
        let pixels = scanner.remaining().get(..len).ok_or(SplashError::TruncatedData)?;

        Ok(Self { width, height, pixels })
    }

    /// Number of pixels in the image.
    #[inline]
    pub const fn pixel_count(&self) -> usize { self.width as usize * self.height as usize }

    /// Packed pixels in row-major order.
    pub fn pixels(&self) -> impl ExactSizeIterator<Item = u32> + 'a {
        self.pixels
            .chunks_exact(PPM_BYTES_PER_PIXEL)
            .map(|rgb| pack_rgb(rgb[0], rgb[1], rgb[2]))
    }

    /// Image info with the top-left pixel as background colour.
    pub fn info(&self) -> ImgInfo {
        ImgInfo {
            width: self.width,
            height: self.height,
            bg_color: pack_rgb(self.pixels[0], self.pixels[1], self.pixels[2]),
        }
    }
}

/// Decode a PPM splash into `fb`, starting at its first pixel.
///
/// Nothing is written unless the header is valid, the data is complete and the image
/// fits in the framebuffer extent.
pub fn display_ppm(
    buf: &[u8],
    fb: &mut Framebuffer32<'_>,
) -> Result<ImgInfo, SplashError> {
    let image = PpmImage::parse(buf)?;
    fb.write_span(0, image.pixels())?;
    Ok(image.info())
}

// =============================================================================
// Tests
// =============================================================================
