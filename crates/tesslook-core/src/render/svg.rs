use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::error::{Result, TessError};

use super::{Figure, Origin, RenderBackend};

/// Number of color steps drawn in the colorbar.
const COLORBAR_STEPS: usize = 256;

/// Width in pixels reserved for the colorbar and its labels.
const COLORBAR_WIDTH: i32 = 120;

/// Writes one SVG file per figure into an output directory.
pub struct SvgBackend {
    output_dir: PathBuf,
    saved: Vec<PathBuf>,
}

impl SvgBackend {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            saved: Vec::new(),
        }
    }

    /// Paths written so far.
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }
}

impl RenderBackend for SvgBackend {
    fn draw(&mut self, figure: &Figure<'_>) -> Result<Option<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.svg", figure.name));

        draw_svg(figure, &path).map_err(|e| TessError::Render(e.to_string()))?;

        info!(path = %path.display(), "Figure saved");
        self.saved.push(path.clone());
        Ok(Some(path))
    }
}

fn draw_svg(figure: &Figure<'_>, path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let options = figure.options;
    let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    // One caption line per title line; SVG text does not wrap.
    let mut area = root.clone();
    for line in figure.title.lines() {
        area = area.titled(line, ("sans-serif", 20))?;
    }

    let plot_width = area.dim_in_pixel().0 as i32 - COLORBAR_WIDTH;
    let (plot_area, bar_area) = area.split_horizontally(plot_width);

    let (rows, cols) = figure.raster.dim();
    let mut chart = ChartBuilder::on(&plot_area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..cols as f64, 0f64..rows as f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(options.x_label.as_str())
        .y_desc(options.y_label.as_str())
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;

    chart.draw_series(
        figure
            .raster
            .indexed_iter()
            .filter(|(_, v)| v.is_finite())
            .map(|((row, col), &v)| {
                let y = match figure.origin {
                    Origin::Lower => row as f64,
                    Origin::Upper => (rows - 1 - row) as f64,
                };
                let x = col as f64;
                let (r, g, b) = figure.colormap.rgb(figure.norm.apply(v));
                Rectangle::new([(x, y), (x + 1.0, y + 1.0)], RGBColor(r, g, b).filled())
            }),
    )?;

    let (vmin, vmax) = (figure.norm.vmin, figure.norm.vmax);
    let mut bar = ChartBuilder::on(&bar_area)
        .margin(10)
        .x_label_area_size(40)
        .set_label_area_size(LabelAreaPosition::Right, 70)
        .build_cartesian_2d(0f64..1f64, vmin..vmax)?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc(options.colorbar_label.as_str())
        .y_label_formatter(&|v| format!("{v:.1}"))
        .draw()?;

    let step = (vmax - vmin) / COLORBAR_STEPS as f64;
    bar.draw_series((0..COLORBAR_STEPS).map(|i| {
        let lo = vmin + step * i as f64;
        let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        let (r, g, b) = figure.colormap.rgb(t);
        Rectangle::new([(0.0, lo), (1.0, lo + step)], RGBColor(r, g, b).filled())
    }))?;

    root.present()?;
    Ok(())
}
