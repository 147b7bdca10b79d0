use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_CUTOUT_SIZE;
use crate::query::SelectionPolicy;
use crate::render::FigureOptions;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Downloads and extraction directories go here.
    pub work_dir: PathBuf,
    /// Rendered figures go here.
    pub output_dir: PathBuf,
    /// Side of the square cutout, in pixels.
    pub cutout_size: u32,
    /// Direct mode only; `None` = every sector covering the target.
    pub sector: Option<u32>,
    pub selection: SelectionPolicy,
    /// Radius used when listing sectors that cover the target.
    pub search_radius_deg: f64,
    /// Human-readable target name used in titles.
    pub target_label: Option<String>,
    pub title: TitleConfig,
    pub figure: FigureOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            output_dir: PathBuf::from("plots"),
            cutout_size: DEFAULT_CUTOUT_SIZE,
            sector: None,
            selection: SelectionPolicy::default(),
            search_radius_deg: 0.0,
            target_label: None,
            title: TitleConfig::default(),
            figure: FigureOptions::default(),
        }
    }
}

/// Title templates. `{sector}` and `{target}` are filled in by the
/// pipeline; other fields are header keywords written `{KEY|fallback}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    pub direct: String,
    pub search: String,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            direct: "TESS Sector {sector} FFI Cutout: {target}\n\
                     {OBJECT|Unknown} - Exposure: {TEXP|N/A} s"
                .to_string(),
            search: "TESS Sector {sector}".to_string(),
        }
    }
}
