//! # Overlay CLI
//!
//! Loads a project document and exports it, or prints a summary.
//!
//! ## Usage
//!
//! ```bash
//! overlay export poster.json --format svg
//! overlay export poster.json --out poster.jpg --asset-dir ./uploads
//! overlay info poster.json --json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `app` - Loading, exporting and summarizing projects

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod app;

pub use app::{export_project, load_project, output_path, run, summarize, ElementSummary, SceneSummary};

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use overlay_core::Color;
use overlay_renderer::{ExportConfig, ExportFormat};

/// Command-line arguments for `overlay`.
#[derive(Debug, Clone, Parser)]
#[command(name = "overlay")]
#[command(about = "Export overlay project documents to PNG, JPEG or SVG")]
#[command(version)]
pub struct CliArgs {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a project to an image or SVG document
    Export(ExportArgs),
    /// Print canvas, asset and layer information
    Info(InfoArgs),
}

/// Arguments for `overlay export`.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Project document (JSON)
    pub project: PathBuf,

    /// Output format; defaults to the `--out` extension, then PNG
    #[arg(long, short)]
    pub format: Option<ExportFormat>,

    /// Output file; defaults to `<project name>.<ext>` in the current directory
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Directory that file asset paths resolve against (defaults to the
    /// project's directory)
    #[arg(long, env = "OVERLAY_ASSET_DIR")]
    pub asset_dir: Option<PathBuf>,

    /// Do not load installed fonts; only the project's custom fonts are used
    #[arg(long, env = "OVERLAY_NO_SYSTEM_FONTS")]
    pub no_system_fonts: bool,

    /// JPEG quality (1-100)
    #[arg(long, default_value = "85", value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,

    /// Canvas color when the project has no background
    #[arg(long, default_value = "#111111", value_parser = parse_color)]
    pub fallback_background: Color,
}

impl ExportArgs {
    /// Format to write: explicit flag, then output extension, then PNG.
    #[must_use]
    pub fn resolved_format(&self) -> ExportFormat {
        self.format
            .or_else(|| {
                self.out
                    .as_ref()
                    .and_then(|out| out.extension())
                    .and_then(|ext| ExportFormat::from_extension(&ext.to_string_lossy()))
            })
            .unwrap_or(ExportFormat::Png)
    }

    /// Renderer configuration from the flags.
    #[must_use]
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            fallback_background: self.fallback_background,
            jpeg_quality: self.jpeg_quality,
            system_fonts: !self.no_system_fonts,
        }
    }
}

/// Arguments for `overlay info`.
#[derive(Debug, Clone, Args)]
pub struct InfoArgs {
    /// Project document (JSON)
    pub project: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_color(input: &str) -> Result<Color, String> {
    Color::parse(input).map_err(|e| e.to_string())
}
