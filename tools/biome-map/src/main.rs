//! Classify a map image into biomes and inspect regions from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use biome_core::render::{highlight, recolor};
use biome_core::{Classification, MapConfig, Palette, PixelBuffer, Position, Region};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "biome-map", about = "Classify map pixels into biomes and select same-biome regions")]
struct Cli {
    /// JSON settings file (palette path, highlight color, parallel).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify every pixel and report per-biome counts.
    Classify {
        #[command(flatten)]
        io: Io,
    },
    /// Classify, then select the region containing (x, y).
    Region {
        #[command(flatten)]
        io: Io,

        /// Column of the clicked pixel.
        #[arg(short, long)]
        x: usize,

        /// Row of the clicked pixel.
        #[arg(short, long)]
        y: usize,
    },
}

#[derive(Args, Debug)]
struct Io {
    /// Input image (png, jpg, jpeg).
    input: PathBuf,

    /// Write the recolored image here.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a JSON report here.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Palette JSON file, overriding the config.
    #[arg(short, long)]
    palette: Option<PathBuf>,
}

// ── Report ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RegionReport {
    x: usize,
    y: usize,
    biome: String,
    size: usize,
    border: Vec<Position>,
}

#[derive(Serialize)]
struct Report<'a> {
    width: usize,
    height: usize,
    histogram: &'a biome_core::Histogram,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<RegionReport>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_and_classify(path: &Path, palette: &Palette, parallel: bool) -> Result<Classification> {
    if !path.exists() {
        bail!("Couldn't load image - file not found: {}", path.display());
    }
    if !is_image_path(path) {
        bail!("File found, but it is not an image, path: {}", path.display());
    }

    let img = image::open(path)
        .with_context(|| format!("Cannot decode {}", path.display()))?
        .to_rgb8();
    let (width, height) = (img.width() as usize, img.height() as usize);
    let pixels = PixelBuffer::new(img.as_raw(), width, height, 3)?;

    let out = classify(pixels, width, height, palette, parallel)?;
    eprintln!("[biome-map] Image loaded, size: {width}x{height}");
    Ok(out)
}

#[cfg(feature = "threading")]
fn classify(pixels: PixelBuffer<'_>, w: usize, h: usize, palette: &Palette, parallel: bool) -> Result<Classification> {
    if parallel {
        return Ok(biome_core::classify_parallel(pixels, w, h, palette)?);
    }
    Ok(biome_core::classify(pixels, w, h, palette)?)
}

#[cfg(not(feature = "threading"))]
fn classify(pixels: PixelBuffer<'_>, w: usize, h: usize, palette: &Palette, parallel: bool) -> Result<Classification> {
    if parallel {
        log::warn!("built without the threading feature; classifying on one thread");
    }
    Ok(biome_core::classify(pixels, w, h, palette)?)
}

fn print_histogram(out: &Classification) {
    eprintln!("Biome data:");
    for (biome, n) in out.histogram.iter() {
        eprintln!("  {}: {n}", biome.name);
    }
}

fn save_rgb(path: &Path, pixels: Vec<u8>, width: usize, height: usize) -> Result<()> {
    let img = image::RgbImage::from_raw(width as u32, height as u32, pixels)
        .context("recolored buffer does not match image size")?;
    img.save(path).with_context(|| format!("failed to save {}", path.display()))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn write_report(path: &Path, report: &Report<'_>) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn region_report(out: &Classification, region: &Region) -> Result<RegionReport> {
    let mut border: Vec<Position> = region.border.iter().copied().collect();
    border.sort_by_key(|p| (p.row, p.column));
    Ok(RegionReport {
        x: region.start.column,
        y: region.start.row,
        biome: region.biome(&out.grid)?.name.clone(),
        size: region.count(),
        border,
    })
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    };

    match cli.command {
        Command::Classify { io } => {
            if io.palette.is_some() {
                config.palette = io.palette.clone();
            }
            let palette = config.palette()?;
            let out = load_and_classify(&io.input, &palette, config.parallel)?;
            print_histogram(&out);

            let (w, h) = (out.grid.width(), out.grid.height());
            if let Some(path) = &io.output {
                save_rgb(path, recolor(&out.grid), w, h)?;
            }
            if let Some(path) = &io.json {
                let report = Report { width: w, height: h, histogram: &out.histogram, region: None };
                write_report(path, &report)?;
            }
        }
        Command::Region { io, x, y } => {
            if io.palette.is_some() {
                config.palette = io.palette.clone();
            }
            let palette = config.palette()?;
            let out = load_and_classify(&io.input, &palette, config.parallel)?;
            let (w, h) = (out.grid.width(), out.grid.height());

            let start = Position::new(x, y);
            let region = biome_core::find_region(&out.grid, start)
                .with_context(|| format!("Cannot select region at ({x}, {y})"))?;
            let report = region_report(&out, &region)?;
            println!("({x}, {y}) - {}, size: {}", report.biome, report.size);

            if let Some(path) = &io.output {
                let mut pixels = recolor(&out.grid);
                highlight(&mut pixels, w, &region.border, config.highlight_color());
                save_rgb(path, pixels, w, h)?;
            }
            if let Some(path) = &io.json {
                let report = Report { width: w, height: h, histogram: &out.histogram, region: Some(report) };
                write_report(path, &report)?;
            }
        }
    }

    Ok(())
}
