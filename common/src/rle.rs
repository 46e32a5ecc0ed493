//! RLE splash decoder and blitter (16-bit framebuffer).
//!
//! # Buffer Layout
//!
//! ```text
//! <width>\n<height>\n\n
//! count_lo count_hi color_lo color_hi   (repeated)
//! ```
//!
//! Width and height are ASCII decimals. Each record is a little-endian 16-bit run length
//! followed by a little-endian RGB565 colour. Runs continue across row boundaries and
//! their counts add up to `width * height`.
//!
//! # Placement
//!
//! The splash is not centred generically. The offset into the panel framebuffer follows
//! the reference hardware layout, see [`placement_offset`].
//!
//! The RLE path never touches [`ImgInfo`](crate::ImgInfo); its size is fixed at build
//! time.

use embedded_graphics::prelude::Size;

use crate::config::{LANDSCAPE_LEFT_COLUMN, PORTRAIT_ROWS_FROM_BOTTOM};
use crate::error::SplashError;
use crate::framebuffer::Framebuffer16;
use crate::line::LineScanner;

/// Size of one run record in bytes.
pub const RLE_RECORD_SIZE: usize = 4;

/// A single run of identical pixels.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Run {
    /// Number of pixels in the run.
    pub count: u32,
    /// RGB565 colour of the run.
    pub color: u16,
}

impl Run {
    /// Decode a 4-byte record.
    ///
    /// A stored count of zero is a 65536-pixel run: the 16-bit counter wraps before it
    /// reaches zero again.
    pub fn from_record(record: [u8; RLE_RECORD_SIZE]) -> Self {
        let count = match u16::from_le_bytes([record[0], record[1]]) {
            0 => 1 << 16,
            n => u32::from(n),
        };
        Self {
            count,
            color: u16::from_le_bytes([record[2], record[3]]),
        }
    }
}

/// A parsed RLE splash whose record stream is known to cover every pixel.
#[derive(Clone, Debug)]
pub struct RleImage<'a> {
    width: usize,
    height: usize,
    records: &'a [u8],
}

impl<'a> RleImage<'a> {
    /// Parse the header and validate the record stream.
    ///
    /// Records after the one that completes `width * height` pixels are ignored.
    pub fn parse(buf: &'a [u8]) -> Result<Self, SplashError> {
        let mut scanner = LineScanner::new(buf);
        let width = scanner.parse_decimal()? as usize;
        scanner.skip_line()?;
        let height = scanner.parse_decimal()? as usize;
        scanner.skip_line()?;
        // Empty separator line
        scanner.skip_bytes(1)?;

        if width == 0 || height == 0 {
            return Err(SplashError::InvalidDimensions);
        }
        let pixel_count = width.checked_mul(height).ok_or(SplashError::InvalidDimensions)?;

        let records = scanner.remaining();
        let mut covered = 0usize;
        for (i, record) in records.chunks_exact(RLE_RECORD_SIZE).enumerate() {
            covered += Run::from_record([record[0], record[1], record[2], record[3]]).count as usize;
            if covered >= pixel_count {
                return Ok(Self {
                    width,
                    height,
                    records: &records[..(i + 1) * RLE_RECORD_SIZE],
                });
            }
        }
        Err(SplashError::TruncatedData)
    }

    /// Image width in pixels.
    #[inline]
    pub const fn width(&self) -> usize { self.width }

    /// Image height in pixels.
    #[inline]
    pub const fn height(&self) -> usize { self.height }

    /// Number of pixels the image covers.
    #[inline]
    pub const fn pixel_count(&self) -> usize { self.width * self.height }

    /// Image size.
    pub fn size(&self) -> Size { Size::new(self.width as u32, self.height as u32) }

    /// Runs in stream order.
    pub fn runs(&self) -> impl Iterator<Item = Run> + 'a {
        self.records
            .chunks_exact(RLE_RECORD_SIZE)
            .map(|r| Run::from_record([r[0], r[1], r[2], r[3]]))
    }
}

/// Framebuffer offset of the splash's first pixel.
///
/// - Portrait (`panel_height > panel_width`): `(panel_height - 450) * panel_width + (panel_width - width) / 2`
/// - Landscape: `(panel_height - height) / 2 * panel_width + 400`
///
/// Division truncates toward zero. A negative offset is `OutOfBounds`.
pub fn placement_offset(
    panel_width: usize,
    panel_height: usize,
    width: usize,
    height: usize,
) -> Result<usize, SplashError> {
    let signed = |v: usize| i64::try_from(v).map_err(|_| SplashError::OutOfBounds);
    let (pw, ph, w, h) = (signed(panel_width)?, signed(panel_height)?, signed(width)?, signed(height)?);

    let offset = if ph > pw {
        (ph - PORTRAIT_ROWS_FROM_BOTTOM)
            .checked_mul(pw)
            .and_then(|rows| rows.checked_add((pw - w) / 2))
    } else {
        ((ph - h) / 2)
            .checked_mul(pw)
            .and_then(|rows| rows.checked_add(LANDSCAPE_LEFT_COLUMN))
    };

    offset
        .and_then(|o| usize::try_from(o).ok())
        .ok_or(SplashError::OutOfBounds)
}

/// Decode an RLE splash into a panel framebuffer.
///
/// The framebuffer's width and height are the physical panel dimensions. The whole
/// destination range is checked before the first write, so a failed call leaves the
/// framebuffer untouched. Returns the decoded image size.
pub fn display_rle(
    buf: &[u8],
    fb: &mut Framebuffer16<'_>,
) -> Result<Size, SplashError> {
    let image = RleImage::parse(buf)?;
    let stride = fb.width();
    let offset = placement_offset(fb.width(), fb.height(), image.width, image.height)?;

    // Only rules out negative portrait centring; landscape rows past the right edge wrap
    // into the next row like the panel's linear memory does
    if image.width > stride {
        return Err(SplashError::OutOfBounds);
    }
    let end = (image.height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(offset))
        .and_then(|v| v.checked_add(image.width))
        .ok_or(SplashError::OutOfBounds)?;
    if end > fb.extent() {
        return Err(SplashError::OutOfBounds);
    }

    let mut runs = image.runs();
    let mut current = Run { count: 0, color: 0 };
    let mut row_start = offset;
    for _ in 0..image.height {
        let mut col = 0;
        while col < image.width {
            if current.count == 0 {
                current = runs.next().ok_or(SplashError::TruncatedData)?;
            }
            let n = (current.count as usize).min(image.width - col);
            fb.fill_span(row_start + col, n, current.color)?;
            current.count -= n as u32;
            col += n;
        }
        row_start += stride;
    }

    Ok(image.size())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::Framebuffer;

    const SENTINEL: u16 = 0xDEAD;

    fn rle_buf(
        width: usize,
        height: usize,
        runs: &[(u16, u16)],
    ) -> Vec<u8> {
        let mut buf = format!("{width}\n{height}\n\n").into_bytes();
        for &(count, color) in runs {
            buf.extend_from_slice(&count.to_le_bytes());
            buf.extend_from_slice(&color.to_le_bytes());
        }
        buf
    }

    #[test]
    fn test_placement_golden_values() {
        // Portrait 600x800 panel, 200x100 splash
        assert_eq!(placement_offset(600, 800, 200, 100), Ok(350 * 600 + 200));
        // Landscape 800x600 panel, 200x100 splash
        assert_eq!(placement_offset(800, 600, 200, 100), Ok(250 * 800 + 400));
    }

    #[test]
    fn test_placement_square_panel_is_landscape() {
        assert_eq!(placement_offset(500, 500, 10, 100), Ok(200 * 500 + 400));
    }

    #[test]
    fn test_placement_truncates_toward_zero() {
        // (601 - 200) / 2 = 200
        assert_eq!(placement_offset(601, 800, 200, 100), Ok(350 * 601 + 200));
        // Image wider than panel: (100 - 103) / 2 = -1, not -2
        assert_eq!(placement_offset(100, 451, 103, 1), Ok(100 - 1));
    }

    #[test]
    fn test_placement_negative_is_out_of_bounds() {
        // Portrait panel shorter than 450 rows
        assert_eq!(placement_offset(100, 300, 50, 50), Err(SplashError::OutOfBounds));
        // Landscape image much taller than panel
        assert_eq!(placement_offset(800, 600, 10, 2000), Err(SplashError::OutOfBounds));
    }

    #[test]
    fn test_parse_header() {
        let buf = rle_buf(3, 2, &[(6, 0x1234)]);
        let image = RleImage::parse(&buf).unwrap();
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.pixel_count(), 6);
        assert_eq!(image.runs().collect::<Vec<_>>(), vec![Run { count: 6, color: 0x1234 }]);
    }

    #[test]
    fn test_parse_ignores_trailing_records() {
        let mut buf = rle_buf(2, 2, &[(4, 1), (9, 2)]);
        buf.extend_from_slice(b"junk");
        let image = RleImage::parse(&buf).unwrap();
        assert_eq!(image.runs().count(), 1);
    }

    #[test]
    fn test_zero_count_is_full_counter_wrap() {
        let buf = rle_buf(256, 256, &[(0, 0xF800)]);
        let image = RleImage::parse(&buf).unwrap();
        assert_eq!(image.runs().next().unwrap().count, 65_536);
    }

    #[test]
    fn test_parse_malformed_header() {
        assert_eq!(RleImage::parse(b"x\n2\n\n").unwrap_err(), SplashError::MalformedHeader);
        assert_eq!(RleImage::parse(b"2\nx\n\n").unwrap_err(), SplashError::MalformedHeader);
        assert_eq!(RleImage::parse(b"2\n2").unwrap_err(), SplashError::MalformedHeader);
        assert_eq!(RleImage::parse(b"2\n2\n").unwrap_err(), SplashError::MalformedHeader);
    }

    #[test]
    fn test_parse_zero_dimensions() {
        let buf = rle_buf(0, 4, &[(4, 0)]);
        assert_eq!(RleImage::parse(&buf).unwrap_err(), SplashError::InvalidDimensions);
        let buf = rle_buf(4, 0, &[(4, 0)]);
        assert_eq!(RleImage::parse(&buf).unwrap_err(), SplashError::InvalidDimensions);
    }

    #[test]
    fn test_parse_truncated_stream() {
        let buf = rle_buf(2, 2, &[(3, 0xFFFF)]);
        assert_eq!(RleImage::parse(&buf).unwrap_err(), SplashError::TruncatedData);

        // Partial trailing record
        let mut buf = rle_buf(2, 2, &[(3, 0xFFFF)]);
        buf.extend_from_slice(&[1, 0, 0xFF]);
        assert_eq!(RleImage::parse(&buf).unwrap_err(), SplashError::TruncatedData);
    }

    #[test]
    fn test_single_run_fills_uniform_region_landscape() {
        // Landscape 404x4 panel: offset = (4 - 2) / 2 * 404 + 400 = 804
        let buf = rle_buf(3, 2, &[(6, 0x07E0)]);
        let mut pixels = vec![SENTINEL; 404 * 4];
        let mut fb = Framebuffer::new(&mut pixels, 404, 4).unwrap();

        let size = display_rle(&buf, &mut fb).unwrap();
        assert_eq!(size, Size::new(3, 2));

        assert_eq!(&pixels[804..807], &[0x07E0; 3]);
        assert_eq!(&pixels[1208..1211], &[0x07E0; 3]);
        assert_eq!(pixels.iter().filter(|&&p| p == 0x07E0).count(), 6);
    }

    #[test]
    fn test_landscape_rows_wrap_past_right_edge() {
        // 800x600 panel, 500x2 image: rows start at column 400 and wrap into the next row
        let buf = rle_buf(500, 2, &[(1000, 0x1234)]);
        let mut pixels = vec![0u16; 800 * 600];
        let mut fb = Framebuffer::new(&mut pixels, 800, 600).unwrap();

        assert_eq!(display_rle(&buf, &mut fb), Ok(Size::new(500, 2)));
        let row = |y: usize| &pixels[y * 800..(y + 1) * 800];
        assert_eq!(&row(299)[400..], &[0x1234; 400]);
        assert_eq!(&row(300)[..100], &[0x1234; 100]);
        assert_eq!(&row(300)[100..400], &[0; 300]);
        assert_eq!(&row(301)[..100], &[0x1234; 100]);
        assert_eq!(row(301)[100], 0);
    }

    #[test]
    fn test_runs_span_rows_portrait() {
        // Portrait 8x452 panel: offset = (452 - 450) * 8 + (8 - 4) / 2 = 18
        let buf = rle_buf(4, 2, &[(3, 0xAAAA), (5, 0xBBBB)]);
        let mut pixels = vec![SENTINEL; 8 * 452];
        let mut fb = Framebuffer::new(&mut pixels, 8, 452).unwrap();

        display_rle(&buf, &mut fb).unwrap();

        assert_eq!(&pixels[16..24], &[SENTINEL, SENTINEL, 0xAAAA, 0xAAAA, 0xAAAA, 0xBBBB, SENTINEL, SENTINEL]);
        assert_eq!(&pixels[24..32], &[SENTINEL, SENTINEL, 0xBBBB, 0xBBBB, 0xBBBB, 0xBBBB, SENTINEL, SENTINEL]);
    }

    #[test]
    fn test_writes_exactly_pixel_count_cells() {
        let runs = [(1, 1), (7, 2), (2, 3), (5, 4), (15, 5)];
        let buf = rle_buf(5, 6, &runs);
        let mut pixels = vec![SENTINEL; 420 * 10];
        let mut fb = Framebuffer::new(&mut pixels, 420, 10).unwrap();

        display_rle(&buf, &mut fb).unwrap();

        let total: u32 = runs.iter().map(|&(c, _)| u32::from(c)).sum();
        assert_eq!(total, 30);
        assert_eq!(pixels.iter().filter(|&&p| p != SENTINEL).count(), 30);
    }

    #[test]
    fn test_out_of_bounds_leaves_framebuffer_untouched() {
        // Image wider than the panel
        let buf = rle_buf(10, 1, &[(10, 1)]);
        let mut pixels = vec![SENTINEL; 8 * 452];
        let mut fb = Framebuffer::new(&mut pixels, 8, 452).unwrap();
        assert_eq!(display_rle(&buf, &mut fb), Err(SplashError::OutOfBounds));

        // Landscape offset column 400 does not fit a 100-pixel-wide panel
        let buf = rle_buf(2, 2, &[(4, 1)]);
        let mut fb = Framebuffer::new(&mut pixels, 100, 3).unwrap();
        assert_eq!(display_rle(&buf, &mut fb), Err(SplashError::OutOfBounds));

        assert!(pixels.iter().all(|&p| p == SENTINEL));
    }

    #[test]
    fn test_truncated_stream_writes_nothing() {
        let buf = rle_buf(3, 2, &[(2, 1), (2, 2)]);
        let mut pixels = vec![SENTINEL; 404 * 4];
        let mut fb = Framebuffer::new(&mut pixels, 404, 4).unwrap();
        assert_eq!(display_rle(&buf, &mut fb), Err(SplashError::TruncatedData));
        assert!(pixels.iter().all(|&p| p == SENTINEL));
    }
}
