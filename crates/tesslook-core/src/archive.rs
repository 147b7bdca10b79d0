use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use crate::consts::{EXTRACT_DIR_PREFIX, FITS_EXTENSION};
use crate::error::{Result, TessError};

/// One delivered cutout container, produced for a single sector.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveReference {
    /// Local path of the downloaded zip.
    pub path: PathBuf,
    pub sector: u32,
    pub camera: Option<u8>,
    pub ccd: Option<u8>,
}

/// FITS files found in one extraction directory, in archive member order.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedFileSet {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

impl ExtractedFileSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

/// Extraction directory for a sector, e.g. `<work_dir>/tess_cutout_sector3`.
pub fn extraction_dir(work_dir: &Path, sector: u32) -> PathBuf {
    work_dir.join(format!("{EXTRACT_DIR_PREFIX}{sector}"))
}

/// Extract every member of `reference` into `into_dir` and list the FITS files.
///
/// Members are unpacked into a staging directory first and moved into
/// `into_dir` only once the whole archive has been read, so a corrupt archive
/// leaves `into_dir` untouched. Existing files with the same names are
/// replaced, which makes repeated extraction idempotent.
pub fn extract(reference: &ArchiveReference, into_dir: &Path) -> Result<ExtractedFileSet> {
    fs::create_dir_all(into_dir)?;
    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(into_dir)?;

    let members = unpack(&reference.path, staging.path())?;

    let mut files = Vec::new();
    for member in &members {
        let dest = into_dir.join(member);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        if dest.is_file() {
            fs::remove_file(&dest)?;
        }
        fs::rename(staging.path().join(member), &dest)?;
        if is_fits(member) {
            files.push(dest);
        }
    }

    info!(
        archive = %reference.path.display(),
        dir = %into_dir.display(),
        members = members.len(),
        fits_files = files.len(),
        "Extracted cutout archive"
    );

    Ok(ExtractedFileSet {
        dir: into_dir.to_path_buf(),
        files,
    })
}

/// Unpack all file members into `dest`, returning their relative paths.
fn unpack(archive_path: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let corrupt = |reason: String| TessError::archive(archive_path, reason);

    let file = File::open(archive_path).map_err(|e| corrupt(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;

    let mut members = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| corrupt(e.to_string()))?;
        let rel = entry
            .enclosed_name()
            .ok_or_else(|| corrupt(format!("unsafe member path '{}'", entry.name())))?;
        let out_path = dest.join(&rel);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| corrupt(format!("member '{}': {e}", rel.display())))?;

        debug!(member = %rel.display(), bytes = entry.size(), "Unpacked archive member");
        members.push(rel);
    }

    Ok(members)
}

fn is_fits(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(FITS_EXTENSION))
}
