//! Display set-up helpers that consume a loaded splash.
//!
//! The PPM path decodes into a linear layer exactly `width * height` pixels long. Display
//! set-up then puts that layer on the panel: background fill with the splash's own
//! background colour, image centred on top.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::error::SplashError;
use crate::framebuffer::{Framebuffer32, PixelWord};
use crate::ppm::ImgInfo;

/// Top-left corner that centres `image` on `panel`.
///
/// An image larger than the panel is anchored at the origin on that axis.
pub fn centered_origin(
    panel: Size,
    image: Size,
) -> Point {
    let x = (panel.width.max(image.width) - image.width) / 2;
    let y = (panel.height.max(image.height) - image.height) / 2;
    Point::new(x as i32, y as i32)
}

/// Clear `panel` to the splash background and draw the decoded layer centred on it.
///
/// `layer` holds the decoded pixels in row-major order. Parts of the image outside the
/// panel are clipped.
pub fn present_splash(
    panel: &mut Framebuffer32<'_>,
    layer: &[u32],
    info: &ImgInfo,
) -> Result<(), SplashError> {
    let pixels = layer
        .get(..info.width as usize * info.height as usize)
        .ok_or(SplashError::TruncatedData)?;

    let area = Rectangle::new(centered_origin(panel.size(), info.size()), info.size());
    let Ok(()) = panel.clear(info.background());
    let Ok(()) = panel.fill_contiguous(&area, pixels.iter().map(|&p| p.to_color()));
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
