//! Boot asset loader: storage commands, decompression and decoder dispatch.
//!
//! The loader sits between the boot environment and the decoders. It formats the boot
//! shell commands that pull assets off the MMC, hands the loaded bytes to the right
//! decoder and keeps the committed [`ImgInfo`] and [`CprInfo`] records.
//!
//! # Collaborators
//!
//! - [`BootShell`]: runs a command string and exposes the memory regions files are
//!   loaded to
//! - [`Decompressor`]: inflates a compressed asset into a bounded buffer
//!
//! # Record Ownership
//!
//! The loader is the only writer of both records. A record changes only after a fully
//! successful load, and display set-up code reads it through [`BootAssetLoader::img_info`]
//! and [`BootAssetLoader::cpr_info`] once the boot phase is done.

use core::fmt::Write;

use embedded_graphics::prelude::Size;
use heapless::String;

use crate::config::{
    COMMAND_LEN,
    CPR_LOAD_ADDR,
    CPR_LOCATIONS,
    DISPLAYCPR_TOKEN_MAXSIZE,
    SPLASH_LOAD_ADDR,
    SPLASH_LOAD_MAX,
    SPLASH_MAX_SIZE,
    StorageLocation,
};
use crate::cpr::{CprInfo, token_text};
use crate::diag::DiagLog;
use crate::error::SplashError;
use crate::framebuffer::{Framebuffer16, Framebuffer32};
use crate::ppm::{ImgInfo, display_ppm};
use crate::rle::display_rle;
use crate::{diag_debug, diag_info, diag_warn};

/// Boot environment command interpreter.
pub trait BootShell {
    /// Run a command string such as `mmcinit 1; fatload mmc 1:5 0x81000000 splash.ppm.gz 4194304`.
    ///
    /// Returns `CommandFailed` when any part of the command fails.
    fn run_command(
        &mut self,
        command: &str,
    ) -> Result<(), SplashError>;

    /// Bytes the most recent load wrote at `address`, at most `len` of them.
    ///
    /// The slice ends where the loaded file ends. Region contents left over from an
    /// earlier, longer load must not be returned: CPR token text runs to the end of the
    /// slice, so stale trailing digits would change its value.
    fn memory(
        &self,
        address: u32,
        len: usize,
    ) -> Option<&[u8]>;
}

/// Decompression service for compressed assets.
pub trait Decompressor {
    /// Inflate `src` into `dst`, returning the number of bytes written.
    fn decompress(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, SplashError>;
}

/// Where a compressed PPM splash lives.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SplashSource<'a> {
    /// MMC device number.
    pub mmc: u8,
    /// FAT partition number.
    pub part: u8,
    /// File name inside the partition.
    pub filename: &'a str,
}

impl From<StorageLocation> for SplashSource<'static> {
    fn from(location: StorageLocation) -> Self {
        Self {
            mmc: location.mmc,
            part: location.part,
            filename: location.path,
        }
    }
}

/// Format a `fatload` command for `location` into `address`.
pub fn fatload_command(
    mmc: u8,
    part: u8,
    address: u32,
    path: &str,
    max_len: usize,
) -> Result<String<COMMAND_LEN>, SplashError> {
    let mut command = String::new();
    write!(command, "mmcinit {mmc}; fatload mmc {mmc}:{part} 0x{address:08x} {path} {max_len}")
        .map_err(|_| SplashError::CommandFailed)?;
    Ok(command)
}

/// Loads boot assets and keeps the resulting display records.
pub struct BootAssetLoader<S, D> {
    shell: S,
    inflater: D,
    log: DiagLog,
    img_info: ImgInfo,
    cpr_info: CprInfo,
}

impl<S: BootShell, D: Decompressor> BootAssetLoader<S, D> {
    /// Create a loader with boot-default records.
    pub fn new(
        shell: S,
        inflater: D,
    ) -> Self {
        Self {
            shell,
            inflater,
            log: DiagLog::new(),
            img_info: ImgInfo::BOOT_DEFAULT,
            cpr_info: CprInfo::new(),
        }
    }

    /// Info of the most recently loaded PPM splash (boot default until one loads).
    #[inline]
    pub const fn img_info(&self) -> &ImgInfo { &self.img_info }

    /// Display calibration (not valid until a DisplayCPR file loads).
    #[inline]
    pub const fn cpr_info(&self) -> &CprInfo { &self.cpr_info }

    /// Diagnostics recorded so far.
    #[inline]
    pub const fn log(&self) -> &DiagLog { &self.log }

    /// The boot shell.
    #[inline]
    pub const fn shell(&self) -> &S { &self.shell }

    /// Load a gzip-compressed PPM splash from MMC and decode it into `fb`.
    ///
    /// `scratch` receives the decompressed image (bounded by `SPLASH_MAX_SIZE`). On
    /// success the image info is committed and returned.
    pub fn display_mmc_gzip_ppm(
        &mut self,
        source: &SplashSource<'_>,
        scratch: &mut [u8],
        fb: &mut Framebuffer32<'_>,
    ) -> Result<ImgInfo, SplashError> {
        let result = self.load_gzip_ppm(source, scratch, fb);
        match &result {
            Ok(info) => {
                self.img_info = *info;
                diag_info!(
                    self.log,
                    "splash {} {}x{} bg #{:06x}",
                    source.filename,
                    info.width,
                    info.height,
                    info.bg_color
                );
            }
            Err(err) => diag_warn!(self.log, "splash {} not shown: {}", source.filename, err),
        }
        result
    }

    fn load_gzip_ppm(
        &mut self,
        source: &SplashSource<'_>,
        scratch: &mut [u8],
        fb: &mut Framebuffer32<'_>,
    ) -> Result<ImgInfo, SplashError> {
        let command = fatload_command(source.mmc, source.part, SPLASH_LOAD_ADDR, source.filename, SPLASH_LOAD_MAX)?;
        self.shell.run_command(&command)?;

        let compressed = self
            .shell
            .memory(SPLASH_LOAD_ADDR, SPLASH_LOAD_MAX)
            .ok_or(SplashError::CommandFailed)?;
        let limit = scratch.len().min(SPLASH_MAX_SIZE);
        let len = self.inflater.decompress(compressed, &mut scratch[..limit])?;
        diag_debug!(self.log, "inflated {} -> {} bytes", compressed.len(), len);

        display_ppm(&scratch[..len], fb)
    }

    /// Decode a memory-resident RLE splash into the panel framebuffer.
    ///
    /// The image info record is left alone; RLE splashes have a build-time size.
    pub fn display_rle(
        &mut self,
        rle: &[u8],
        fb: &mut Framebuffer16<'_>,
    ) -> Result<Size, SplashError> {
        let result = display_rle(rle, fb);
        match &result {
            Ok(size) => diag_info!(self.log, "rle splash {}x{}", size.width, size.height),
            Err(err) => diag_warn!(self.log, "rle splash not shown: {}", err),
        }
        result
    }

    /// Load the DisplayCPR calibration from the first location that has one.
    ///
    /// On failure the calibration record keeps its previous state.
    pub fn load_display_cpr(&mut self) -> Result<&CprInfo, SplashError> {
        let mut loaded = false;
        for location in &CPR_LOCATIONS {
            let command = fatload_command(
                location.mmc,
                location.part,
                CPR_LOAD_ADDR,
                location.path,
                DISPLAYCPR_TOKEN_MAXSIZE,
            )?;
            if self.shell.run_command(&command).is_ok() {
                diag_debug!(self.log, "DisplayCPR from mmc {}:{}", location.mmc, location.part);
                loaded = true;
                break;
            }
        }
        if !loaded {
            diag_warn!(self.log, "No DisplayCPR found in /bootdata nor /rom/devconf.");
            return Err(SplashError::CommandFailed);
        }

        let buf = self
            .shell
            .memory(CPR_LOAD_ADDR, DISPLAYCPR_TOKEN_MAXSIZE)
            .ok_or(SplashError::CommandFailed)?;
        match self.cpr_info.load(buf) {
            Ok(()) => {
                diag_info!(self.log, "DisplayCPR {:?}", self.cpr_info.values());
                Ok(&self.cpr_info)
            }
            Err(err) => {
                match &err {
                    SplashError::InvalidToken(token) => diag_warn!(self.log, "invalid CPR value [{}]", token),
                    _ => {
                        let text = core::str::from_utf8(token_text(buf)).unwrap_or("?");
                        diag_warn!(self.log, "Invalid CPR token: [{}]", text.trim_end());
                    }
                }
                Err(err)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::string::String as StdString;
    use std::vec::Vec;

    use super::*;
    use crate::diag::Severity;
    use crate::framebuffer::Framebuffer;
    use crate::gzip::GzipInflater;

    /// In-memory boot shell: files keyed by `(mmc, part, path)`.
    #[derive(Default)]
    struct FakeShell {
        files: BTreeMap<(u8, u8, StdString), Vec<u8>>,
        memory: BTreeMap<u32, Vec<u8>>,
        commands: Vec<StdString>,
    }

    impl FakeShell {
        fn with_file(
            mut self,
            mmc: u8,
            part: u8,
            path: &str,
            data: &[u8],
        ) -> Self {
            self.files.insert((mmc, part, path.into()), data.to_vec());
            self
        }
    }

    impl BootShell for FakeShell {
        fn run_command(
            &mut self,
            command: &str,
        ) -> Result<(), SplashError> {
            self.commands.push(command.into());
            let fatload = command.split(';').nth(1).ok_or(SplashError::CommandFailed)?;
            let args: Vec<&str> = fatload.split_whitespace().collect();
            let (dev, part) = args[2].split_once(':').unwrap();
            let address = u32::from_str_radix(args[3].trim_start_matches("0x"), 16).unwrap();
            let max: usize = args[5].parse().unwrap();
            let key = (dev.parse().unwrap(), part.parse().unwrap(), args[4].into());
            let data = self.files.get(&key).ok_or(SplashError::CommandFailed)?;
            self.memory.insert(address, data[..data.len().min(max)].to_vec());
            Ok(())
        }

        fn memory(
            &self,
            address: u32,
            len: usize,
        ) -> Option<&[u8]> {
            self.memory.get(&address).map(|data| &data[..data.len().min(len)])
        }
    }

    /// Treats the asset as already inflated.
    struct CopyInflater;

    impl Decompressor for CopyInflater {
        fn decompress(
            &mut self,
            src: &[u8],
            dst: &mut [u8],
        ) -> Result<usize, SplashError> {
            let dst = dst.get_mut(..src.len()).ok_or(SplashError::DecompressFailed)?;
            dst.copy_from_slice(src);
            Ok(src.len())
        }
    }

    fn last_message(loader: &BootAssetLoader<FakeShell, CopyInflater>) -> (Severity, StdString) {
        let record = loader.log().latest().unwrap();
        (record.severity, record.text.as_str().into())
    }

    #[test]
    fn test_fatload_command_format() {
        let command = fatload_command(1, 5, 0x8100_0000, "splash.ppm.gz", 4_194_304).unwrap();
        assert_eq!(command.as_str(), "mmcinit 1; fatload mmc 1:5 0x81000000 splash.ppm.gz 4194304");
    }

    #[test]
    fn test_cpr_from_primary_location() {
        let shell = FakeShell::default()
            .with_file(1, 5, "DisplayCPR", b"1 2 3 4 5 6 7 8 9")
            .with_file(1, 4, "devconf/DisplayCPR", b"9 9 9 9 9 9 9 9 9");
        let mut loader = BootAssetLoader::new(shell, CopyInflater);

        let cpr = loader.load_display_cpr().unwrap();
        assert!(cpr.is_valid());
        assert_eq!(cpr.values(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(loader.shell().commands.len(), 1);
    }

    #[test]
    fn test_cpr_ignores_stale_region_bytes() {
        let mut shell = FakeShell::default().with_file(1, 5, "DisplayCPR", b"1 2 3 4 5 6 7 8 9");
        shell.memory.insert(CPR_LOAD_ADDR, b"7 7 7 7 7 7 7 7 9999 77".to_vec());
        let mut loader = BootAssetLoader::new(shell, CopyInflater);

        let cpr = loader.load_display_cpr().unwrap();
        assert_eq!(cpr.values(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_cpr_falls_back_to_devconf() {
        let shell = FakeShell::default().with_file(1, 4, "devconf/DisplayCPR", b"9 8 7 6 5 4 3 2 1\n");
        let mut loader = BootAssetLoader::new(shell, CopyInflater);

        let cpr = loader.load_display_cpr().unwrap();
        assert_eq!(cpr.values(), &[9, 8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(
            loader.shell().commands[1],
            "mmcinit 1; fatload mmc 1:4 0x80800000 devconf/DisplayCPR 128"
        );
    }

    #[test]
    fn test_cpr_missing_everywhere() {
        let mut loader = BootAssetLoader::new(FakeShell::default(), CopyInflater);
        assert_eq!(loader.load_display_cpr().unwrap_err(), SplashError::CommandFailed);
        assert!(!loader.cpr_info().is_valid());
        assert_eq!(
            last_message(&loader),
            (Severity::Warn, "No DisplayCPR found in /bootdata nor /rom/devconf.".into())
        );
    }

    #[test]
    fn test_cpr_invalid_token_logged() {
        let shell = FakeShell::default().with_file(1, 5, "DisplayCPR", b"1 x 3 4 5 6 7 8 9");
        let mut loader = BootAssetLoader::new(shell, CopyInflater);

        assert!(matches!(loader.load_display_cpr(), Err(SplashError::InvalidToken(_))));
        assert!(!loader.cpr_info().is_valid());
        assert_eq!(last_message(&loader), (Severity::Warn, "invalid CPR value [x]".into()));
    }

    #[test]
    fn test_cpr_zero_sum_logged() {
        let shell = FakeShell::default().with_file(1, 5, "DisplayCPR", b"0 0 0 0 0 0 0 0 0\n");
        let mut loader = BootAssetLoader::new(shell, CopyInflater);

        assert_eq!(loader.load_display_cpr().unwrap_err(), SplashError::InvalidCalibration);
        assert_eq!(
            last_message(&loader),
            (Severity::Warn, "Invalid CPR token: [0 0 0 0 0 0 0 0 0]".into())
        );
    }

    #[test]
    fn test_gzip_ppm_commits_img_info() {
        let mut ppm = b"P6\n# boot\n2 1\n255\n".to_vec();
        ppm.extend_from_slice(&[0x10, 0x20, 0x30, 0xFF, 0xFF, 0xFF]);
        let shell = FakeShell::default().with_file(1, 5, "splash.ppm.gz", &ppm);
        let mut loader = BootAssetLoader::new(shell, CopyInflater);
        assert_eq!(loader.img_info(), &ImgInfo::BOOT_DEFAULT);

        let mut scratch = vec![0u8; 256];
        let mut pixels = vec![0u32; 4];
        let mut fb = Framebuffer::new(&mut pixels, 2, 2).unwrap();
        let source = SplashSource::from(crate::config::DEFAULT_SPLASH);

        let info = loader.display_mmc_gzip_ppm(&source, &mut scratch, &mut fb).unwrap();
        assert_eq!(info, ImgInfo { width: 2, height: 1, bg_color: 0x0010_2030 });
        assert_eq!(loader.img_info(), &info);
        assert_eq!(pixels, vec![0x0010_2030, 0x00FF_FFFF, 0, 0]);
    }

    #[test]
    fn test_gzip_ppm_through_inflater() {
        // `P6\n# boot\n4 2\n255\n`, seven #204060 pixels then one #ff0000, gzip -9
        #[rustfmt::skip]
        const SPLASH_GZ: [u8; 45] = [
            0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0x0b, 0x30,
            0xe3, 0x52, 0x56, 0x48, 0xca, 0xcf, 0x2f, 0xe1, 0x32, 0x51, 0x30, 0xe2,
            0x32, 0x32, 0x35, 0xe5, 0x52, 0x70, 0x48, 0xc0, 0x44, 0xff, 0x19, 0x18,
            0x00, 0x8f, 0x7a, 0x77, 0x0c, 0x2a, 0x00, 0x00, 0x00,
        ];
        let shell = FakeShell::default().with_file(1, 5, "splash.ppm.gz", &SPLASH_GZ);
        let mut loader = BootAssetLoader::new(shell, GzipInflater::new());
        let mut scratch = vec![0u8; 64];
        let mut pixels = vec![0u32; 8];
        let mut fb = Framebuffer::new(&mut pixels, 4, 2).unwrap();
        let source = SplashSource::from(crate::config::DEFAULT_SPLASH);

        let info = loader.display_mmc_gzip_ppm(&source, &mut scratch, &mut fb).unwrap();
        assert_eq!(info, ImgInfo { width: 4, height: 2, bg_color: 0x0020_4060 });
        assert_eq!(loader.img_info(), &info);
        assert_eq!(&pixels[..7], &[0x0020_4060; 7]);
        assert_eq!(pixels[7], 0x00FF_0000);
    }

    #[test]
    fn test_failed_splash_keeps_previous_info() {
        let shell = FakeShell::default().with_file(1, 5, "bad.ppm.gz", b"P6\n# boot\n0 1\n255\n");
        let mut loader = BootAssetLoader::new(shell, CopyInflater);
        let mut scratch = vec![0u8; 256];
        let mut pixels = vec![0u32; 4];
        let mut fb = Framebuffer::new(&mut pixels, 2, 2).unwrap();

        let bad = SplashSource { mmc: 1, part: 5, filename: "bad.ppm.gz" };
        assert_eq!(
            loader.display_mmc_gzip_ppm(&bad, &mut scratch, &mut fb),
            Err(SplashError::InvalidDimensions)
        );
        let missing = SplashSource { mmc: 0, part: 1, filename: "none.gz" };
        assert_eq!(
            loader.display_mmc_gzip_ppm(&missing, &mut scratch, &mut fb),
            Err(SplashError::CommandFailed)
        );
        assert_eq!(loader.img_info(), &ImgInfo::BOOT_DEFAULT);
        assert_eq!(last_message(&loader).0, Severity::Warn);
    }

    #[test]
    fn test_scratch_too_small_fails_decompression() {
        let shell = FakeShell::default().with_file(1, 5, "splash.ppm.gz", &[0u8; 64]);
        let mut loader = BootAssetLoader::new(shell, CopyInflater);
        let mut scratch = vec![0u8; 16];
        let mut pixels = vec![0u32; 4];
        let mut fb = Framebuffer::new(&mut pixels, 2, 2).unwrap();
        let source = SplashSource::from(crate::config::DEFAULT_SPLASH);

        assert_eq!(
            loader.display_mmc_gzip_ppm(&source, &mut scratch, &mut fb),
            Err(SplashError::DecompressFailed)
        );
    }

    #[test]
    fn test_rle_does_not_touch_img_info() {
        let mut rle = b"1\n1\n\n".to_vec();
        rle.extend_from_slice(&[1, 0, 0x1F, 0x00]);
        let mut loader = BootAssetLoader::new(FakeShell::default(), CopyInflater);
        let mut pixels = vec![0u16; 404 * 2];
        let mut fb = Framebuffer::new(&mut pixels, 404, 2).unwrap();

        assert_eq!(loader.display_rle(&rle, &mut fb), Ok(Size::new(1, 1)));
        assert_eq!(loader.img_info(), &ImgInfo::BOOT_DEFAULT);
        assert_eq!(pixels[400], 0x001F);
    }
}
