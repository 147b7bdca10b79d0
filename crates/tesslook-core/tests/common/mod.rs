use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tesslook_core::error::{Result, TessError};
use tesslook_core::frame::HeaderValue;
use tesslook_core::query::{CutoutService, SectorInfo};
use tesslook_core::render::{Figure, Origin, RenderBackend};
use tesslook_core::target::IcrsCoord;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub mod fits_file;

use fits_file::FitsWriter;

/// Alpha Centauri (ICRS degrees).
pub const ALPHA_CEN: (f64, f64) = (219.9, -60.8339);

/// Frame whose pixel at (row, col) holds `t * 1000 + row * width + col`.
pub fn ramp_frame(width: usize, height: usize, t: usize) -> Vec<f32> {
    (0..width * height)
        .map(|i| (t * 1000 + i) as f32)
        .collect()
}

/// Write a FITS file with an IMAGE cube of `time_steps` ramp frames in extension 1.
pub fn write_cube_fits(
    path: &Path,
    width: usize,
    height: usize,
    time_steps: usize,
    cards: &[(&str, HeaderValue)],
) {
    let frames: Vec<Vec<f32>> = (0..time_steps).map(|t| ramp_frame(width, height, t)).collect();
    let mut writer = FitsWriter::create(path, &[]).unwrap();
    writer.write_image_cube(width, height, &frames, cards).unwrap();
    writer.finalize().unwrap();
}

/// Bytes of a FITS cutout cube, for packing into archives.
pub fn cube_fits_bytes(
    width: usize,
    height: usize,
    time_steps: usize,
    cards: &[(&str, HeaderValue)],
) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.fits");
    write_cube_fits(&path, width, height, time_steps, cards);
    fs::read(&path).unwrap()
}

/// Header cards a TESS cutout typically carries.
pub fn tess_cards(object: &str) -> Vec<(&'static str, HeaderValue)> {
    vec![
        ("OBJECT", HeaderValue::Str(object.to_string())),
        ("TEXP", HeaderValue::Float(1980.0)),
        ("RA_TARG", HeaderValue::Float(219.9)),
        ("DEC_TARG", HeaderValue::Float(-60.8339)),
    ]
}

/// Zip archive bytes holding `members` in the given order.
pub fn zip_bytes(members: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, data) in members {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

pub fn sector_info(sector: u32) -> SectorInfo {
    SectorInfo {
        name: format!("tess-s{sector:04}-1-2"),
        sector,
        camera: 1,
        ccd: 2,
    }
}

// ---------------------------------------------------------------------------
// Fake cutout service
// ---------------------------------------------------------------------------

/// In-memory cutout service. Every covering sector is reported for any
/// position; archives are served from `archives` by sector number.
#[derive(Default)]
pub struct FakeService {
    pub names: HashMap<String, IcrsCoord>,
    pub sectors: Vec<SectorInfo>,
    pub archives: HashMap<u32, Vec<u8>>,
    /// Sectors whose download fails with a service error.
    pub failing: Vec<u32>,
    /// When set, every listing and download is rejected with this message.
    pub reject: Option<String>,
    pub downloads: RefCell<Vec<(u32, u32)>>,
}

impl FakeService {
    pub fn with_sectors(sectors: &[u32]) -> Self {
        Self {
            sectors: sectors.iter().map(|&s| sector_info(s)).collect(),
            ..Default::default()
        }
    }

    pub fn name(mut self, identifier: &str, ra: f64, dec: f64) -> Self {
        self.names.insert(identifier.to_string(), IcrsCoord { ra, dec });
        self
    }

    pub fn archive(mut self, sector: u32, bytes: Vec<u8>) -> Self {
        self.archives.insert(sector, bytes);
        self
    }

    /// Serve a one-member archive holding a `size` x `size` cube for `sector`.
    pub fn cutout(self, sector: u32, size: usize, object: &str) -> Self {
        let fits = cube_fits_bytes(size, size, 2, &tess_cards(object));
        let name = format!("tess-s{sector:04}-1-2_219.900000_-60.833900_{size}x{size}_astrocut.fits");
        self.archive(sector, zip_bytes(&[(name.as_str(), fits)]))
    }

    pub fn downloaded_sectors(&self) -> Vec<u32> {
        self.downloads.borrow().iter().map(|(s, _)| *s).collect()
    }
}

impl CutoutService for FakeService {
    fn resolve_name(&self, identifier: &str) -> Result<Option<IcrsCoord>> {
        Ok(self.names.get(identifier).copied())
    }

    fn list_sectors(&self, _coord: &IcrsCoord, _radius_deg: f64) -> Result<Vec<SectorInfo>> {
        if let Some(ref msg) = self.reject {
            return Err(TessError::QueryRejected(msg.clone()));
        }
        Ok(self.sectors.clone())
    }

    fn download_cutout(
        &self,
        _coord: &IcrsCoord,
        sector: u32,
        size: u32,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        if let Some(ref msg) = self.reject {
            return Err(TessError::QueryRejected(msg.clone()));
        }
        if self.failing.contains(&sector) {
            return Err(TessError::Service(format!("HTTP 503: sector {sector} unavailable")));
        }
        let bytes = self
            .archives
            .get(&sector)
            .ok_or_else(|| TessError::Service(format!("no archive for sector {sector}")))?;
        self.downloads.borrow_mut().push((sector, size));

        fs::create_dir_all(dest_dir)?;
        let path = dest_dir.join(format!("fake_s{sector:04}_{size}.zip"));
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Recording render backend
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct RecordedFigure {
    pub name: String,
    pub title: String,
    pub shape: (usize, usize),
    pub origin: Origin,
    pub vmin: f64,
    pub vmax: f64,
    pub colorbar_label: String,
}

/// Captures every figure instead of drawing it.
#[derive(Default)]
pub struct RecordingBackend {
    pub figures: Vec<RecordedFigure>,
    /// Figures whose name contains this string fail to render.
    pub fail_on: Option<String>,
}

impl RecordingBackend {
    pub fn titles(&self) -> Vec<&str> {
        self.figures.iter().map(|f| f.title.as_str()).collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn draw(&mut self, figure: &Figure<'_>) -> Result<Option<PathBuf>> {
        if let Some(ref pattern) = self.fail_on {
            if figure.name.contains(pattern.as_str()) {
                return Err(TessError::Render(format!("refusing to draw {}", figure.name)));
            }
        }
        self.figures.push(RecordedFigure {
            name: figure.name.to_string(),
            title: figure.title.clone(),
            shape: figure.raster.dim(),
            origin: figure.origin,
            vmin: figure.norm.vmin,
            vmax: figure.norm.vmax,
            colorbar_label: figure.options.colorbar_label.clone(),
        });
        Ok(None)
    }
}
