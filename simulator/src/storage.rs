//! Directory-backed boot shell.
//!
//! Plays the part of the boot environment's MMC commands on the host. A storage root
//! laid out as
//!
//! ```text
//! <root>/mmc1/part5/DisplayCPR
//! <root>/mmc1/part5/splash.ppm.gz
//! <root>/mmc1/part4/devconf/DisplayCPR
//! ```
//!
//! answers `mmcinit N` and `fatload mmc D:P 0xADDR FILE MAX` the way the target does:
//! the file is copied into a load region keyed by its address, truncated to `MAX` bytes.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use bootsplash_common::{BootShell, SplashError};

/// Boot shell over a directory tree of MMC partitions.
pub struct DirectoryMmc {
    root: PathBuf,
    initialized: BTreeSet<u8>,
    regions: BTreeMap<u32, Vec<u8>>,
}

impl DirectoryMmc {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            initialized: BTreeSet::new(),
            regions: BTreeMap::new(),
        }
    }

    fn device_dir(
        &self,
        mmc: u8,
    ) -> PathBuf {
        self.root.join(format!("mmc{mmc}"))
    }

    fn mmcinit(
        &mut self,
        args: &[&str],
    ) -> Result<(), SplashError> {
        let [dev] = args else {
            return Err(SplashError::CommandFailed);
        };
        let mmc: u8 = dev.parse().map_err(|_| SplashError::CommandFailed)?;
        if !self.device_dir(mmc).is_dir() {
            return Err(SplashError::CommandFailed);
        }
        self.initialized.insert(mmc);
        Ok(())
    }

    fn fatload(
        &mut self,
        args: &[&str],
    ) -> Result<(), SplashError> {
        let ["mmc", dev_part, addr, file, max] = args else {
            return Err(SplashError::CommandFailed);
        };
        let (mmc, part) = parse_dev_part(dev_part).ok_or(SplashError::CommandFailed)?;
        let address = addr
            .strip_prefix("0x")
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .ok_or(SplashError::CommandFailed)?;
        let max: usize = max.parse().map_err(|_| SplashError::CommandFailed)?;
        if !self.initialized.contains(&mmc) {
            return Err(SplashError::CommandFailed);
        }

        // Plain relative names only; nothing may resolve outside the partition directory
        let file = Path::new(file);
        if !file.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(SplashError::CommandFailed);
        }
        let path = self.device_dir(mmc).join(format!("part{part}")).join(file);
        let mut data = fs::read(&path).map_err(|_| SplashError::CommandFailed)?;
        data.truncate(max);
        self.regions.insert(address, data);
        Ok(())
    }
}

fn parse_dev_part(spec: &str) -> Option<(u8, u8)> {
    let (dev, part) = spec.split_once(':')?;
    Some((dev.parse().ok()?, part.parse().ok()?))
}

impl BootShell for DirectoryMmc {
    fn run_command(
        &mut self,
        command: &str,
    ) -> Result<(), SplashError> {
        for step in command.split(';') {
            let words: Vec<&str> = step.split_whitespace().collect();
            match words.split_first() {
                Some((&"mmcinit", args)) => self.mmcinit(args)?,
                Some((&"fatload", args)) => self.fatload(args)?,
                None => {}
                Some(_) => return Err(SplashError::CommandFailed),
            }
        }
        Ok(())
    }

    fn memory(
        &self,
        address: u32,
        len: usize,
    ) -> Option<&[u8]> {
        self.regions.get(&address).map(|data| &data[..data.len().min(len)])
    }
}

// =============================================================================
// Tests
// =============================================================================
