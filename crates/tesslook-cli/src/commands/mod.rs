pub mod config;
pub mod cutout;
pub mod info;
pub mod search;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tesslook_core::decode::decode;
use tesslook_core::io::image_io::save_png;
use tesslook_core::pipeline::{ItemStatus, PipelineConfig, PipelineReport};
use tesslook_core::query::SelectionPolicy;
use tracing::warn;

#[derive(Clone, Copy, ValueEnum)]
pub enum SelectArg {
    First,
    All,
    Best,
}

impl From<SelectArg> for SelectionPolicy {
    fn from(arg: SelectArg) -> Self {
        match arg {
            SelectArg::First => SelectionPolicy::First,
            SelectArg::All => SelectionPolicy::All,
            SelectArg::Best => SelectionPolicy::Best,
        }
    }
}

/// Options shared by the `cutout` and `search` commands.
#[derive(Args)]
pub struct RunOptions {
    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Cutout side length in pixels
    #[arg(long)]
    pub size: Option<u32>,

    /// Label used for the target in figure titles
    #[arg(long)]
    pub name: Option<String>,

    /// Directory for downloaded archives and extracted files
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Directory for rendered figures
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Also write each rendered frame as a grayscale PNG
    #[arg(long)]
    pub export_png: bool,
}

impl RunOptions {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match self.config {
            Some(ref path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                toml::from_str(&contents).context("Invalid pipeline config")?
            }
            None => PipelineConfig::default(),
        };

        if let Some(size) = self.size {
            config.cutout_size = size;
        }
        if let Some(ref name) = self.name {
            config.target_label = Some(name.clone());
        }
        if let Some(ref dir) = self.work_dir {
            config.work_dir = dir.clone();
        }
        if let Some(ref dir) = self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }
}

/// Write a PNG next to each rendered figure. Failures are logged, not fatal.
pub fn export_pngs(report: &PipelineReport, output_dir: &Path) -> Vec<PathBuf> {
    let mut written = Vec::new();
    for item in report.items() {
        let (ItemStatus::Rendered { output, .. }, Some(source)) = (&item.status, &item.source)
        else {
            continue;
        };
        let stem = output
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("tess_sector{}", item.sector));
        let path = output_dir.join(format!("{stem}.png"));

        match decode(source, None).and_then(|frame| save_png(&frame, &path)) {
            Ok(()) => written.push(path),
            Err(e) => warn!(sector = item.sector, error = %e, "PNG export failed"),
        }
    }
    written
}
