//! Boot splash core - decoders, blitter and display calibration parsing.
//!
//! This crate holds everything the boot flow needs to put a splash image on a raw
//! framebuffer before any display stack exists:
//!
//! - [`line`]: Line scanner over text-prefixed buffers
//! - [`rle`]: RLE splash decoder with orientation-aware placement (16-bit framebuffer)
//! - [`ppm`]: Raw PPM loader producing [`ImgInfo`] (32-bit framebuffer)
//! - [`cpr`]: Display CPR calibration token parser producing [`CprInfo`]
//! - [`framebuffer`]: Bounds-checked framebuffer view implementing `DrawTarget`
//! - [`gzip`]: gzip inflater used for compressed splash assets
//! - [`loader`]: Boot asset loader orchestrating storage commands and decoders
//! - [`present`]: Display set-up helpers consuming [`ImgInfo`]
//! - [`diag`]: Diagnostics ring buffer (optionally forwarded to defmt)
//! - [`config`]: Placement constants, load addresses and storage locations
//!
//! # no_std Compatibility
//!
//! The crate is `no_std` and never allocates. All buffers (source assets, scratch space and
//! framebuffers) are owned by the caller and passed in as slices.
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test -p bootsplash-common
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), while firmware builds stay `no_std`.

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod config;
pub mod cpr;
pub mod diag;
pub mod error;
pub mod framebuffer;
pub mod gzip;
pub mod line;
pub mod loader;
pub mod ppm;
pub mod present;
pub mod rle;

// Re-export commonly used items
pub use cpr::CprInfo;
pub use error::{SplashError, status};
pub use framebuffer::{Framebuffer, Framebuffer16, Framebuffer32, PixelWord};
pub use gzip::GzipInflater;
pub use loader::{BootAssetLoader, BootShell, Decompressor, SplashSource};
pub use ppm::ImgInfo;
pub use present::{centered_origin, present_splash};
