use std::ffi::c_char;
use std::fs;
use std::path::{Path, PathBuf};

use fitsio::hdu::{FitsHdu, HduInfo};
#[allow(unused_imports)]
use fitsio::images::ReadImage;
use fitsio::{sys, FitsFile};
use ndarray::Array2;

use crate::consts::FLUX_COLUMN;
use crate::error::{Result, TessError};
use crate::frame::{Card, Header, HeaderValue};

/// Room for any keyword, value or comment string cfitsio hands back.
const CARD_BUFFER: usize = 81;

/// Kind of header-data unit, from its position and XTENSION keyword.
#[derive(Clone, Debug, PartialEq)]
pub enum HduKind {
    Primary,
    Image,
    BinTable,
    Other(String),
}

/// Kind and header of one HDU.
#[derive(Clone, Debug)]
pub struct Hdu {
    pub kind: HduKind,
    pub header: Header,
}

impl Hdu {
    /// NAXISn values in FITS axis order (NAXIS1 first).
    pub fn axes(&self) -> Vec<i64> {
        let naxis = self.header.get_int("NAXIS").unwrap_or(0).max(0);
        (1..=naxis)
            .map(|n| self.header.get_int(&format!("NAXIS{n}")).unwrap_or(0))
            .collect()
    }
}

/// A 2D plane taken from a (time, height, width) stack.
#[derive(Clone, Debug)]
pub struct StackPlane {
    pub data: Array2<f64>,
    pub time_steps: usize,
}

/// FITS reader on top of cfitsio.
pub struct FitsReader {
    file: FitsFile,
    path: PathBuf,
    hdus: Vec<Hdu>,
}

impl FitsReader {
    /// Open a FITS file and collect the header of every HDU.
    pub fn open(path: &Path) -> Result<Self> {
        // Surface a missing file as an I/O error rather than a cfitsio status.
        fs::metadata(path)?;
        let mut file = FitsFile::open(path).map_err(|e| fits_error(path, e))?;

        let hdu_count = file.iter().count();
        let mut hdus = Vec::with_capacity(hdu_count);
        for index in 0..hdu_count {
            // Moving to the HDU makes it current for the raw header calls.
            file.hdu(index).map_err(|e| fits_error(path, e))?;
            let header = read_header(&mut file)
                .map_err(|reason| TessError::decode(path, format!("HDU {index}: {reason}")))?;
            let kind = if index == 0 {
                HduKind::Primary
            } else {
                match header.get_str("XTENSION").map(str::trim) {
                    Some("IMAGE") => HduKind::Image,
                    Some("BINTABLE") => HduKind::BinTable,
                    Some(other) => HduKind::Other(other.to_string()),
                    None => HduKind::Other(String::new()),
                }
            };
            hdus.push(Hdu { kind, header });
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
            hdus,
        })
    }

    pub fn hdu_count(&self) -> usize {
        self.hdus.len()
    }

    pub fn hdu(&self, index: usize) -> Option<&Hdu> {
        self.hdus.get(index)
    }

    pub fn hdus(&self) -> &[Hdu] {
        &self.hdus
    }

    /// Read one time step of the data cube held by HDU `index`.
    ///
    /// Image HDUs are read as NAXIS1 = width, NAXIS2 = height, NAXIS3 = time
    /// (a 2-axis image is one time step). Binary tables are read as target
    /// pixel files: one row per time step, the frame in the `FLUX` column.
    /// cfitsio applies BSCALE/BZERO and TSCALn/TZEROn.
    pub fn read_stack_plane(&mut self, index: usize, time: usize) -> Result<StackPlane> {
        let Self { file, path, hdus } = self;
        let path = path.as_path();
        let hdu = hdus.get(index).ok_or_else(|| {
            TessError::decode(
                path,
                format!("extension {index} is absent ({} HDUs)", hdus.len()),
            )
        })?;
        let handle = file.hdu(index).map_err(|e| fits_error(path, e))?;
        match &hdu.kind {
            HduKind::Primary | HduKind::Image => read_image_plane(file, &handle, hdu, path, time),
            HduKind::BinTable => read_table_plane(file, &handle, hdu, path, time),
            HduKind::Other(kind) => Err(TessError::decode(
                path,
                format!("extension {index} is a {kind} HDU, not an image stack"),
            )),
        }
    }
}

fn read_image_plane(
    file: &mut FitsFile,
    handle: &FitsHdu,
    hdu: &Hdu,
    path: &Path,
    time: usize,
) -> Result<StackPlane> {
    let axes = hdu.axes();
    let (width, height, time_steps) = match axes.as_slice() {
        [w, h] => (axis(path, 1, *w)?, axis(path, 2, *h)?, 1),
        [w, h, t] => (axis(path, 1, *w)?, axis(path, 2, *h)?, axis(path, 3, *t)?),
        other => {
            return Err(TessError::decode(
                path,
                format!("unsupported image NAXIS = {}", other.len()),
            ))
        }
    };
    let pixels = plane_pixels(path, width, height, time_steps, time)?;

    // Section bounds are flat pixel offsets; the plane for `time` is contiguous.
    let start = time.checked_mul(pixels).ok_or_else(|| overflow(path))?;
    let end = start.checked_add(pixels).ok_or_else(|| overflow(path))?;
    let raw: Vec<f64> = handle
        .read_section(file, start, end)
        .map_err(|e| TessError::decode(path, format!("cannot read frame {time}: {e}")))?;

    Ok(StackPlane {
        data: to_plane(path, raw, width, height)?,
        time_steps,
    })
}

fn read_table_plane(
    file: &mut FitsFile,
    handle: &FitsHdu,
    hdu: &Hdu,
    path: &Path,
    time: usize,
) -> Result<StackPlane> {
    let HduInfo::TableInfo {
        ref column_descriptions,
        num_rows,
    } = handle.info
    else {
        return Err(TessError::decode(path, "binary table has no column layout"));
    };
    let (column, flux) = column_descriptions
        .iter()
        .enumerate()
        .find(|(_, c)| c.name.trim().eq_ignore_ascii_case(FLUX_COLUMN))
        .ok_or_else(|| {
            TessError::decode(path, format!("binary table has no {FLUX_COLUMN} column"))
        })?;

    let tdim_key = format!("TDIM{}", column + 1);
    let (width, height) = hdu
        .header
        .get_str(&tdim_key)
        .and_then(parse_tdim)
        .ok_or_else(|| TessError::decode(path, format!("{FLUX_COLUMN} column has no TDIM")))?;
    let pixels = plane_pixels(path, width, height, num_rows, time)?;
    if pixels > flux.data_type.repeat {
        return Err(TessError::decode(
            path,
            format!(
                "TDIM ({width},{height}) exceeds {FLUX_COLUMN} repeat count {}",
                flux.data_type.repeat
            ),
        ));
    }

    let raw = read_vector_cell(file, column + 1, time + 1, pixels)
        .map_err(|reason| TessError::decode(path, format!("cannot read row {time}: {reason}")))?;
    Ok(StackPlane {
        data: to_plane(path, raw, width, height)?,
        time_steps: num_rows,
    })
}

/// Validate a frame geometry and return its pixel count.
fn plane_pixels(
    path: &Path,
    width: usize,
    height: usize,
    steps: usize,
    time: usize,
) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(TessError::decode(
            path,
            format!("degenerate frame size {width}x{height}"),
        ));
    }
    if steps == 0 {
        return Err(TessError::decode(path, "stack has no time steps"));
    }
    if time >= steps {
        return Err(TessError::decode(
            path,
            format!("time index {time} out of range (total: {steps})"),
        ));
    }
    let pixels = width.checked_mul(height).ok_or_else(|| overflow(path))?;
    // The whole stack must be addressable, not just the requested plane.
    pixels
        .checked_mul(steps)
        .and_then(|n| n.checked_mul(std::mem::size_of::<f64>()))
        .ok_or_else(|| overflow(path))?;
    Ok(pixels)
}

fn to_plane(path: &Path, raw: Vec<f64>, width: usize, height: usize) -> Result<Array2<f64>> {
    Array2::from_shape_vec((height, width), raw).map_err(|e| {
        TessError::decode(path, format!("cannot shape frame as {width}x{height}: {e}"))
    })
}

fn axis(path: &Path, n: usize, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| TessError::decode(path, format!("negative NAXIS{n} = {value}")))
}

fn overflow(path: &Path) -> TessError {
    TessError::decode(path, "header sizes overflow")
}

fn fits_error(path: &Path, err: fitsio::errors::Error) -> TessError {
    TessError::decode(path, err.to_string())
}

fn check_status(status: i32) -> std::result::Result<(), String> {
    if status == 0 {
        Ok(())
    } else {
        Err(format!("cfitsio status {status}"))
    }
}

/// Collect the value cards of the current HDU. Commentary cards are skipped.
fn read_header(file: &mut FitsFile) -> std::result::Result<Header, String> {
    let mut status = 0;
    let mut count = 0;
    let mut more = 0;
    let raw = unsafe { file.as_raw() };
    unsafe { sys::ffghsp(raw, &mut count, &mut more, &mut status) };
    check_status(status)?;

    let mut header = Header::new();
    for n in 1..=count {
        let mut name = [0 as c_char; CARD_BUFFER];
        let mut value = [0 as c_char; CARD_BUFFER];
        let mut comment = [0 as c_char; CARD_BUFFER];
        unsafe {
            sys::ffgkyn(
                raw,
                n,
                name.as_mut_ptr(),
                value.as_mut_ptr(),
                comment.as_mut_ptr(),
                &mut status,
            )
        };
        check_status(status)?;

        let key = c_text(&name);
        let value = c_text(&value);
        if key.is_empty() || value.is_empty() || matches!(key.as_str(), "COMMENT" | "HISTORY") {
            continue;
        }
        let comment = c_text(&comment);
        header.push(Card {
            key,
            value: parse_value(&value),
            comment: (!comment.is_empty()).then_some(comment),
        });
    }
    Ok(header)
}

/// Read `len` elements of one vector cell. Rows and columns are 1-based.
fn read_vector_cell(
    file: &mut FitsFile,
    column: usize,
    row: usize,
    len: usize,
) -> std::result::Result<Vec<f64>, String> {
    let column = i32::try_from(column).map_err(|_| format!("column {column} out of range"))?;
    let row = i64::try_from(row).map_err(|_| format!("row {row} out of range"))?;
    let count = i64::try_from(len).map_err(|_| format!("cell length {len} out of range"))?;

    let mut out = vec![0.0f64; len];
    let mut any_null = 0;
    let mut status = 0;
    unsafe {
        sys::ffgcvd(
            file.as_raw(),
            column,
            row,
            1,
            count,
            0.0,
            out.as_mut_ptr(),
            &mut any_null,
            &mut status,
        )
    };
    check_status(status)?;
    Ok(out)
}

fn c_text(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).trim_end().to_string()
}

/// Interpret a keyword value string as cfitsio returns it (comment removed).
fn parse_value(raw: &str) -> HeaderValue {
    let raw = raw.trim();

    if let Some(rest) = raw.strip_prefix('\'') {
        // Quoted string: '' is an escaped quote.
        let inner = rest.strip_suffix('\'').unwrap_or(rest);
        return HeaderValue::Str(inner.replace("''", "'").trim_end().to_string());
    }

    match raw {
        "T" => HeaderValue::Bool(true),
        "F" => HeaderValue::Bool(false),
        _ => {
            if let Ok(v) = raw.parse::<i64>() {
                HeaderValue::Int(v)
            } else if let Ok(v) = raw.replace(['D', 'd'], "E").parse::<f64>() {
                HeaderValue::Float(v)
            } else {
                HeaderValue::Raw(raw.to_string())
            }
        }
    }
}

/// Parse the first two axes of a TDIM value such as `(11,13)`.
fn parse_tdim(dim: &str) -> Option<(usize, usize)> {
    let inner = dim.trim().strip_prefix('(')?.strip_suffix(')')?;
    let mut axes = inner.split(',').map(|s| s.trim().parse::<usize>());
    let width = axes.next()?.ok()?;
    let height = axes.next()?.ok()?;
    Some((width, height))
}
