//! Boot splash configuration constants.
//!
//! All values are compile-time constants. Placement constants and load addresses are
//! specific to the reference hardware and must not be changed without re-checking the
//! splash position on the panel.
//!
//! # Compile-Time Validation
//!
//! Related constants are checked with `const` assertions so an inconsistent edit fails
//! the build instead of corrupting the boot flow.

// =============================================================================
// RLE Splash Placement
// =============================================================================

/// Portrait panels: the splash starts this many rows above the bottom edge.
pub const PORTRAIT_ROWS_FROM_BOTTOM: i64 = 450;

/// Landscape panels: the splash starts at this column.
pub const LANDSCAPE_LEFT_COLUMN: i64 = 400;

// =============================================================================
// Boot Image Info
// =============================================================================

/// Image width reported before any splash has been loaded.
pub const DEFAULT_IMG_WIDTH: u32 = 136;

/// Image height reported before any splash has been loaded.
pub const DEFAULT_IMG_HEIGHT: u32 = 136;

/// Background colour reported before any splash has been loaded (black).
pub const DEFAULT_BG_COLOR: u32 = 0x00_0000;

// =============================================================================
// Display CPR Calibration
// =============================================================================

/// Number of coefficients in a display CPR token.
pub const DISPLAYCPR_NUM_VALUES: usize = 9;

/// Maximum size in bytes of a DisplayCPR file.
pub const DISPLAYCPR_TOKEN_MAXSIZE: usize = 128;

/// Longest token text carried in an `InvalidToken` error.
pub const CPR_TOKEN_REPORT_LEN: usize = 16;

// Nine minimal tokens ("0 " each) must fit
const _: () = assert!(DISPLAYCPR_TOKEN_MAXSIZE >= DISPLAYCPR_NUM_VALUES * 2);

// =============================================================================
// Load Regions
// =============================================================================

/// Physical address the compressed splash is loaded to.
pub const SPLASH_LOAD_ADDR: u32 = 0x8100_0000;

/// Maximum number of bytes `fatload` may read for the compressed splash.
pub const SPLASH_LOAD_MAX: usize = 4_194_304;

/// Maximum size of the decompressed splash.
pub const SPLASH_MAX_SIZE: usize = 0x100_0000;

/// Physical address the DisplayCPR file is loaded to.
pub const CPR_LOAD_ADDR: u32 = 0x8080_0000;

const _: () = assert!(SPLASH_LOAD_MAX <= SPLASH_MAX_SIZE);
const _: () = assert!(CPR_LOAD_ADDR as usize + DISPLAYCPR_TOKEN_MAXSIZE <= SPLASH_LOAD_ADDR as usize);

/// Capacity of a formatted boot shell command.
pub const COMMAND_LEN: usize = 256;

// =============================================================================
// Storage Locations
// =============================================================================

/// A file on a FAT partition of an MMC device.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StorageLocation {
    /// MMC device number.
    pub mmc: u8,
    /// Partition number on the device.
    pub part: u8,
    /// Path of the file inside the partition.
    pub path: &'static str,
}

/// DisplayCPR locations in priority order: `/bootdata` first, then `/rom/devconf`.
pub const CPR_LOCATIONS: [StorageLocation; 2] = [
    StorageLocation {
        mmc: 1,
        part: 5,
        path: "DisplayCPR",
    },
    StorageLocation {
        mmc: 1,
        part: 4,
        path: "devconf/DisplayCPR",
    },
];

/// Default gzip-compressed PPM splash.
pub const DEFAULT_SPLASH: StorageLocation = StorageLocation {
    mmc: 1,
    part: 5,
    path: "splash.ppm.gz",
};

// =============================================================================
// Tests
// =============================================================================
