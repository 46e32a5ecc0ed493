//! Bounds-checked framebuffer view.
//!
//! The framebuffer memory is owned by the caller (a memory-mapped panel buffer on target,
//! a `Vec` in the simulator and in tests). [`Framebuffer`] only borrows it together with
//! the declared row stride and height, and every write goes through a range check
//! against `width * height`.
//!
//! # Pixel Words
//!
//! | Path | Storage | Colour |
//! |------|---------|--------|
//! | RLE  | `u16`   | `Rgb565` |
//! | PPM  | `u32`   | `Rgb888` packed `0x00RRGGBB` |
//!
//! Both implement [`PixelWord`], so the view also works as an `embedded-graphics`
//! [`DrawTarget`] for display set-up code (clearing, compositing).

use embedded_graphics::pixelcolor::raw::{RawU16, RawU24};
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::error::SplashError;

/// A framebuffer storage word with its matching colour type.
pub trait PixelWord: Copy {
    /// Colour type stored in this word.
    type Color: PixelColor;

    /// Encode a colour as a storage word.
    fn from_color(color: Self::Color) -> Self;

    /// Decode a storage word to a colour.
    fn to_color(self) -> Self::Color;
}

impl PixelWord for u16 {
    type Color = Rgb565;

    #[inline]
    fn from_color(color: Rgb565) -> Self { color.into_storage() }

    #[inline]
    fn to_color(self) -> Rgb565 { RawU16::new(self).into() }
}

impl PixelWord for u32 {
    type Color = Rgb888;

    #[inline]
    fn from_color(color: Rgb888) -> Self { color.into_storage() }

    #[inline]
    fn to_color(self) -> Rgb888 { RawU24::new(self).into() }
}

/// Mutable view of a row-major framebuffer.
pub struct Framebuffer<'a, P> {
    pixels: &'a mut [P],
    width: usize,
    height: usize,
}

/// 16-bit framebuffer used by the RLE path.
pub type Framebuffer16<'a> = Framebuffer<'a, u16>;

/// 32-bit framebuffer used by the PPM path.
pub type Framebuffer32<'a> = Framebuffer<'a, u32>;

impl<'a, P: PixelWord> Framebuffer<'a, P> {
    /// Wrap `pixels` as a `width` x `height` framebuffer.
    ///
    /// Fails with `OutOfBounds` if the slice is smaller than the declared extent.
    pub fn new(
        pixels: &'a mut [P],
        width: usize,
        height: usize,
    ) -> Result<Self, SplashError> {
        let extent = width.checked_mul(height).ok_or(SplashError::OutOfBounds)?;
        if extent > pixels.len() {
            return Err(SplashError::OutOfBounds);
        }
        Ok(Self { pixels, width, height })
    }

    /// Row stride in pixels.
    #[inline]
    pub const fn width(&self) -> usize { self.width }

    /// Number of rows.
    #[inline]
    pub const fn height(&self) -> usize { self.height }

    /// Number of addressable pixels (`width * height`).
    #[inline]
    pub const fn extent(&self) -> usize { self.width * self.height }

    /// The addressable pixels.
    pub fn as_slice(&self) -> &[P] { &self.pixels[..self.extent()] }

    /// Mutable access to `len` pixels starting at `start`.
    pub fn span_mut(
        &mut self,
        start: usize,
        len: usize,
    ) -> Result<&mut [P], SplashError> {
        let end = start.checked_add(len).ok_or(SplashError::OutOfBounds)?;
        if end > self.extent() {
            return Err(SplashError::OutOfBounds);
        }
        Ok(&mut self.pixels[start..end])
    }

    /// Write `value` to `len` pixels starting at `start`.
    pub fn fill_span(
        &mut self,
        start: usize,
        len: usize,
        value: P,
    ) -> Result<(), SplashError> {
        self.span_mut(start, len)?.fill(value);
        Ok(())
    }

    /// Copy `values` into consecutive pixels starting at `start`.
    ///
    /// The whole span is checked before the first write.
    pub fn write_span<I>(
        &mut self,
        start: usize,
        values: I,
    ) -> Result<(), SplashError>
    where
        I: IntoIterator<Item = P>,
        I::IntoIter: ExactSizeIterator,
    {
        let values = values.into_iter();
        let dst = self.span_mut(start, values.len())?;
        for (cell, value) in dst.iter_mut().zip(values) {
            *cell = value;
        }
        Ok(())
    }

    /// Decoded colours of all addressable pixels, row-major.
    pub fn colors(&self) -> impl Iterator<Item = P::Color> + '_ { self.as_slice().iter().map(|&p| p.to_color()) }
}

impl<P: PixelWord> OriginDimensions for Framebuffer<'_, P> {
    fn size(&self) -> Size { Size::new(self.width as u32, self.height as u32) }
}

impl<P: PixelWord> DrawTarget for Framebuffer<'_, P> {
    type Color = P::Color;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) else {
                continue;
            };
            if x < self.width && y < self.height {
                self.pixels[y * self.width + x] = P::from_color(color);
            }
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let drawable_area = area.intersection(&self.bounding_box());
        if drawable_area.size == Size::zero() {
            return Ok(());
        }

        let word = P::from_color(color);
        let x_start = drawable_area.top_left.x as usize;
        let width = drawable_area.size.width as usize;
        for y in drawable_area.rows() {
            let row_start = y as usize * self.width + x_start;
            self.pixels[row_start..row_start + width].fill(word);
        }
        Ok(())
    }

    fn clear(
        &mut self,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let extent = self.extent();
        self.pixels[..extent].fill(P::from_color(color));
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
