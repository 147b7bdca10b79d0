pub mod svg;
mod title;

use std::path::PathBuf;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{DEFAULT_COLORBAR_LABEL, DEFAULT_FIGURE_SIZE};
use crate::error::Result;
use crate::frame::DecodedFrame;

pub use svg::SvgBackend;
pub use title::{TitleSegment, TitleTemplate};

/// Display options shared by every figure of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureOptions {
    pub width: u32,
    pub height: u32,
    pub colorbar_label: String,
    pub x_label: String,
    pub y_label: String,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_FIGURE_SIZE.0,
            height: DEFAULT_FIGURE_SIZE.1,
            colorbar_label: DEFAULT_COLORBAR_LABEL.to_string(),
            x_label: "Pixel Column".to_string(),
            y_label: "Pixel Row".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Colormap {
    Gray,
}

impl Colormap {
    /// Color for a position in [0, 1] along the map.
    pub fn rgb(self, t: f64) -> (u8, u8, u8) {
        match self {
            Self::Gray => {
                let g = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
                (g, g, g)
            }
        }
    }
}

/// Where row 0 of the raster is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Lower,
    Upper,
}

/// Linear mapping of data values onto the colormap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearNorm {
    pub vmin: f64,
    pub vmax: f64,
}

impl LinearNorm {
    /// Norm spanning the finite values of `data`; a flat frame is widened
    /// by 0.5 on each side so the scale stays usable.
    pub fn from_frame(frame: &DecodedFrame) -> Self {
        let (vmin, vmax) = frame.finite_range().unwrap_or((0.0, 1.0));
        if vmax > vmin {
            Self { vmin, vmax }
        } else {
            Self {
                vmin: vmin - 0.5,
                vmax: vmax + 0.5,
            }
        }
    }

    pub fn apply(&self, v: f64) -> f64 {
        (v - self.vmin) / (self.vmax - self.vmin)
    }
}

/// What to render: a decoded frame and the template its title is built from.
#[derive(Clone, Debug)]
pub struct RenderSpec<'a> {
    pub frame: &'a DecodedFrame,
    pub title: TitleTemplate,
    /// Stem for saved output, e.g. `tess_sector11`.
    pub name: String,
}

impl RenderSpec<'_> {
    /// Ordered (field name, fallback) pairs the title looks up.
    pub fn title_fields(&self) -> Vec<(&str, &str)> {
        self.title.fields()
    }
}

/// Everything a backend needs to draw one figure.
#[derive(Clone, Debug)]
pub struct Figure<'a> {
    pub name: &'a str,
    pub raster: &'a Array2<f64>,
    pub title: String,
    pub colormap: Colormap,
    pub origin: Origin,
    pub norm: LinearNorm,
    pub options: &'a FigureOptions,
}

/// Rendering context handed to [`render`]. Returns where the figure was
/// saved, if anywhere.
pub trait RenderBackend {
    fn draw(&mut self, figure: &Figure<'_>) -> Result<Option<PathBuf>>;
}

/// Render a frame as a grayscale raster, origin lower-left, with a colorbar.
///
/// Header fields missing from the frame fall back to the template's
/// defaults. Pixel values go to the color mapping unchanged.
pub fn render(
    spec: &RenderSpec<'_>,
    options: &FigureOptions,
    backend: &mut dyn RenderBackend,
) -> Result<Option<PathBuf>> {
    let title = spec.title.render(&spec.frame.header);
    let figure = Figure {
        name: &spec.name,
        raster: &spec.frame.pixels,
        title,
        colormap: Colormap::Gray,
        origin: Origin::Lower,
        norm: LinearNorm::from_frame(spec.frame),
        options,
    };
    debug!(name = %spec.name, title = %figure.title, "Rendering frame");
    backend.draw(&figure)
}
