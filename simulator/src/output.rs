//! Panel output: PNG export and, with the `window` feature, an SDL window.

use std::path::Path;

use bootsplash_common::framebuffer::{Framebuffer, PixelWord};
use embedded_graphics::pixelcolor::{BinaryColor, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::{OutputSettings, OutputSettingsBuilder, SimulatorDisplay};

/// Copy a framebuffer into a simulator display of the same size.
pub fn to_display<P>(fb: &Framebuffer<'_, P>) -> SimulatorDisplay<P::Color>
where
    P: PixelWord,
    P::Color: From<BinaryColor>,
{
    let mut display = SimulatorDisplay::new(fb.size());
    display
        .fill_contiguous(&Rectangle::new(Point::zero(), fb.size()), fb.colors())
        .ok();
    display
}

/// Output settings for the given pixel scale.
pub fn settings(scale: u32) -> OutputSettings { OutputSettingsBuilder::new().scale(scale).build() }

/// Write the display to `path` as a PNG.
pub fn save_png<C>(
    display: &SimulatorDisplay<C>,
    path: &Path,
    scale: u32,
) -> Result<(), String>
where
    C: PixelColor + Into<Rgb888>,
{
    display
        .to_rgb_output_image(&settings(scale))
        .save_png(path)
        .map_err(|err| format!("cannot write {}: {err}", path.display()))
}

/// Show the display in a window until it is closed.
#[cfg(feature = "window")]
pub fn show<C>(
    display: &SimulatorDisplay<C>,
    scale: u32,
) where
    C: PixelColor + Into<Rgb888>,
{
    let mut window = embedded_graphics_simulator::Window::new("Boot Splash Sim", &settings(scale));
    window.show_static(display);
}

// =============================================================================
// Tests
// =============================================================================
