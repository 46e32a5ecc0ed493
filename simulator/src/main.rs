//! Boot splash simulator for the desktop.
//!
//! Runs the boot splash flow against a directory that stands in for the MMC and writes the
//! resulting panel contents to a PNG (or shows them in a window with the `window`
//! feature).
//!
//! ```text
//! simulator <storage-root> [--panel WxH] [--splash MMC:PART:FILE] [--rle FILE]
//!           [--out FILE] [--scale N]
//! ```
//!
//! The flow mirrors the target: load the DisplayCPR calibration, then either decode a
//! memory-resident RLE splash straight into a 16-bit panel buffer, or load a gzipped PPM
//! from storage into a layer and present it centred on a 32-bit panel. A failed step is
//! reported and the boot continues without it.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]

mod output;
mod storage;

use std::path::PathBuf;
use std::process::ExitCode;
use std::{env, fs};

use bootsplash_common::config::{DEFAULT_SPLASH, SPLASH_MAX_SIZE};
use bootsplash_common::diag::DiagLog;
use bootsplash_common::ppm::PPM_BYTES_PER_PIXEL;
use bootsplash_common::{BootAssetLoader, Framebuffer, GzipInflater, SplashSource, present_splash, status};
use embedded_graphics::prelude::*;

use crate::storage::DirectoryMmc;

/// Panel size used when `--panel` is not given.
const DEFAULT_PANEL: Size = Size::new(480, 800);

/// Command line options.
#[derive(Debug, PartialEq)]
struct Options {
    root: PathBuf,
    panel: Size,
    splash: (u8, u8, String),
    rle: Option<PathBuf>,
    out: PathBuf,
    scale: u32,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut root = None;
        let mut options = Self {
            root: PathBuf::new(),
            panel: DEFAULT_PANEL,
            splash: (DEFAULT_SPLASH.mmc, DEFAULT_SPLASH.part, DEFAULT_SPLASH.path.into()),
            rle: None,
            out: PathBuf::from("splash.png"),
            scale: 1,
        };

        while let Some(arg) = args.next() {
            let mut value = |name: &str| args.next().ok_or_else(|| format!("{name} needs a value"));
            match arg.as_str() {
                "--panel" => options.panel = parse_size(&value("--panel")?)?,
                "--splash" => options.splash = parse_location(&value("--splash")?)?,
                "--rle" => options.rle = Some(value("--rle")?.into()),
                "--out" => options.out = value("--out")?.into(),
                "--scale" => {
                    options.scale = value("--scale")?
                        .parse()
                        .ok()
                        .filter(|&s| s > 0)
                        .ok_or("--scale must be a positive integer")?;
                }
                flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
                _ if root.is_none() => root = Some(PathBuf::from(&arg)),
                _ => return Err(format!("unexpected argument {arg}")),
            }
        }

        options.root = root.ok_or("missing storage root")?;
        Ok(options)
    }
}

fn parse_size(text: &str) -> Result<Size, String> {
    text.split_once('x')
        .and_then(|(w, h)| Some(Size::new(w.parse().ok()?, h.parse().ok()?)))
        .filter(|size| size.width > 0 && size.height > 0)
        .ok_or_else(|| format!("invalid panel size {text}, expected WxH"))
}

fn parse_location(text: &str) -> Result<(u8, u8, String), String> {
    let mut parts = text.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(mmc), Some(part), Some(file)) if !file.is_empty() => {
            let mmc = mmc.parse().map_err(|_| format!("invalid mmc device in {text}"))?;
            let part = part.parse().map_err(|_| format!("invalid partition in {text}"))?;
            Ok((mmc, part, file.into()))
        }
        _ => Err(format!("invalid splash location {text}, expected MMC:PART:FILE")),
    }
}

fn print_log(log: &DiagLog) {
    for record in log.iter() {
        println!("[{}] {:>3} {}", record.severity.tag(), record.seq, record.text);
    }
}

fn main() -> ExitCode {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("usage: simulator <storage-root> [--panel WxH] [--splash MMC:PART:FILE] [--rle FILE] [--out FILE] [--scale N]");
            return ExitCode::FAILURE;
        }
    };

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(options: &Options) -> Result<(), String> {
    let mut loader = BootAssetLoader::new(DirectoryMmc::new(&options.root), GzipInflater::new());

    let cpr = loader.load_display_cpr();
    println!("DisplayCPR status {}", status(&cpr));

    let (panel_width, panel_height) = (options.panel.width as usize, options.panel.height as usize);
    let result = if let Some(path) = &options.rle {
        let rle = fs::read(path).map_err(|err| format!("cannot read {}: {err}", path.display()))?;
        let mut pixels = vec![0u16; panel_width * panel_height];
        let mut panel = Framebuffer::new(&mut pixels, panel_width, panel_height).map_err(|err| err.to_string())?;

        let shown = loader.display_rle(&rle, &mut panel);
        println!("RLE splash status {}", status(&shown));
        emit(&output::to_display(&panel), options)
    } else {
        let (mmc, part, file) = &options.splash;
        let source = SplashSource { mmc: *mmc, part: *part, filename: file };
        let mut scratch = vec![0u8; SPLASH_MAX_SIZE];
        let mut layer_pixels = vec![0u32; SPLASH_MAX_SIZE / PPM_BYTES_PER_PIXEL];
        let layer_len = layer_pixels.len();
        let mut layer = Framebuffer::new(&mut layer_pixels, layer_len, 1).map_err(|err| err.to_string())?;

        let mut pixels = vec![0u32; panel_width * panel_height];
        let mut panel = Framebuffer::new(&mut pixels, panel_width, panel_height).map_err(|err| err.to_string())?;

        let shown = loader.display_mmc_gzip_ppm(&source, &mut scratch, &mut layer);
        println!("PPM splash status {}", status(&shown));
        if shown.is_ok() {
            present_splash(&mut panel, layer.as_slice(), loader.img_info()).map_err(|err| err.to_string())?;
        }
        emit(&output::to_display(&panel), options)
    };

    let info = loader.img_info();
    println!("image {}x{} bg #{:06x}", info.width, info.height, info.bg_color);
    let cpr = loader.cpr_info();
    if cpr.is_valid() {
        println!("calibration {:?}", cpr.values());
    } else {
        println!("calibration not loaded");
    }
    print_log(loader.log());
    result
}

fn emit<C>(
    display: &embedded_graphics_simulator::SimulatorDisplay<C>,
    options: &Options,
) -> Result<(), String>
where
    C: PixelColor + Into<embedded_graphics::pixelcolor::Rgb888>,
{
    output::save_png(display, &options.out, options.scale)?;
    println!("panel written to {}", options.out.display());
    #[cfg(feature = "window")]
    output::show(display, options.scale);
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
