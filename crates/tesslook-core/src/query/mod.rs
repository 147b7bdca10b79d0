pub mod mast;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::archive::{self, extraction_dir, ArchiveReference};
use crate::consts::MAX_CUTOUT_SIZE;
use crate::error::{Result, TessError};
use crate::target::{IcrsCoord, ResolvedTarget};

pub use mast::MastClient;

/// One sector/camera/CCD footprint covering a position.
#[derive(Clone, Debug, PartialEq)]
pub struct SectorInfo {
    /// Service-side name, e.g. `tess-s0003-1-2`.
    pub name: String,
    pub sector: u32,
    pub camera: u8,
    pub ccd: u8,
}

/// The remote archive service. Implementations perform blocking I/O.
pub trait CutoutService {
    /// Resolve an object name or catalog identifier to ICRS.
    /// `Ok(None)` means the service does not know the name.
    fn resolve_name(&self, identifier: &str) -> Result<Option<IcrsCoord>>;

    /// List sector footprints within `radius_deg` of `coord`.
    fn list_sectors(&self, coord: &IcrsCoord, radius_deg: f64) -> Result<Vec<SectorInfo>>;

    /// Download the `size` x `size` cutout zip for one sector into
    /// `dest_dir` and return the local path of the archive.
    fn download_cutout(
        &self,
        coord: &IcrsCoord,
        sector: u32,
        size: u32,
        dest_dir: &Path,
    ) -> Result<PathBuf>;
}

/// Which of several matching sectors to keep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// The first sector in service order.
    #[default]
    First,
    All,
    /// The most recent (highest-numbered) sector.
    Best,
}

impl SelectionPolicy {
    pub fn select(self, mut sectors: Vec<SectorInfo>) -> Vec<SectorInfo> {
        match self {
            Self::All => sectors,
            Self::First => {
                sectors.truncate(1);
                sectors
            }
            Self::Best => {
                // max_by_key keeps the last maximum; reverse so ties go to the first listed.
                let best = sectors.into_iter().rev().max_by_key(|s| s.sector);
                best.into_iter().collect()
            }
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "First"),
            Self::All => write!(f, "All"),
            Self::Best => write!(f, "Best"),
        }
    }
}

/// Parameters of a direct-mode cutout request.
#[derive(Clone, Debug, PartialEq)]
pub struct CutoutRequest {
    pub target: ResolvedTarget,
    /// `None` = every sector covering the target.
    pub sector: Option<u32>,
    /// Side of the square cutout, in pixels.
    pub size: u32,
}

impl CutoutRequest {
    /// Reject requests the service would refuse, before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 || self.size > MAX_CUTOUT_SIZE {
            return Err(TessError::QueryRejected(format!(
                "cutout size {} is outside 1..={MAX_CUTOUT_SIZE}",
                self.size
            )));
        }
        if self.sector == Some(0) {
            return Err(TessError::QueryRejected("sector numbers start at 1".into()));
        }
        Ok(())
    }
}

/// A ready-to-decode FITS product for one sector.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductHandle {
    pub sector: u32,
    pub path: PathBuf,
}

/// What a successfully unpacked sector archive yielded.
#[derive(Clone, Debug, PartialEq)]
pub enum SectorFetch {
    Product(ProductHandle),
    /// The archive unpacked cleanly into `dir` but held no FITS member.
    NoFrameFiles { dir: PathBuf },
}

/// Outcome of fetching one sector in search mode.
#[derive(Debug)]
pub struct SectorProduct {
    pub sector: u32,
    pub product: Result<SectorFetch>,
}

/// Issues cutout queries against a [`CutoutService`].
pub struct CutoutQueryClient<'a> {
    service: &'a dyn CutoutService,
    work_dir: PathBuf,
    search_radius_deg: f64,
}

impl<'a> CutoutQueryClient<'a> {
    /// Downloads and search-mode extractions go under `work_dir`.
    pub fn new(service: &'a dyn CutoutService, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            work_dir: work_dir.into(),
            search_radius_deg: 0.0,
        }
    }

    pub fn with_search_radius(mut self, radius_deg: f64) -> Self {
        self.search_radius_deg = radius_deg;
        self
    }

    /// ICRS position of a resolved target, asking the service for identifiers.
    pub fn coordinates(&self, target: &ResolvedTarget) -> Result<IcrsCoord> {
        match target {
            ResolvedTarget::Position(coord) => Ok(*coord),
            ResolvedTarget::Identifier(name) => self
                .service
                .resolve_name(name)?
                .ok_or_else(|| TessError::QueryRejected(format!("could not resolve '{name}'"))),
        }
    }

    /// Direct mode: download one archive per selected sector.
    ///
    /// An empty result means the service has no coverage for the request.
    pub fn query(
        &self,
        request: &CutoutRequest,
        policy: SelectionPolicy,
    ) -> Result<Vec<ArchiveReference>> {
        request.validate()?;
        let coord = self.coordinates(&request.target)?;

        let mut matching = self.covering_sectors(&coord)?;
        if let Some(sector) = request.sector {
            matching.retain(|s| s.sector == sector);
        }
        if matching.is_empty() {
            info!(query_target = %request.target, sector = ?request.sector, "No sectors cover target");
            return Ok(Vec::new());
        }

        let selected = policy.select(matching);
        info!(
            query_target = %request.target,
            policy = %policy,
            sectors = ?selected.iter().map(|s| s.sector).collect::<Vec<_>>(),
            "Requesting cutouts"
        );

        selected
            .into_iter()
            .map(|info| {
                let path = self.service.download_cutout(
                    &coord,
                    info.sector,
                    request.size,
                    &self.work_dir,
                )?;
                Ok(ArchiveReference {
                    path,
                    sector: info.sector,
                    camera: Some(info.camera),
                    ccd: Some(info.ccd),
                })
            })
            .collect()
    }

    /// Search mode: every sector covering `identifier`, each fetched and
    /// unpacked into a ready-to-decode product.
    ///
    /// Resolution and listing failures are returned as `Err`; a failure to
    /// fetch one sector is carried in that sector's [`SectorProduct`].
    pub fn search_and_fetch(&self, identifier: &str, size: u32) -> Result<Vec<SectorProduct>> {
        let request = CutoutRequest {
            target: ResolvedTarget::Identifier(identifier.to_string()),
            sector: None,
            size,
        };
        request.validate()?;
        let coord = self.coordinates(&request.target)?;
        let sectors = self.covering_sectors(&coord)?;
        info!(
            identifier,
            %coord,
            sectors = sectors.len(),
            "Search found sectors"
        );

        Ok(sectors
            .into_iter()
            .map(|info| {
                let product = self.fetch(&coord, &info, size);
                if let Err(ref e) = product {
                    warn!(sector = info.sector, error = %e, "Failed to fetch sector product");
                }
                SectorProduct {
                    sector: info.sector,
                    product,
                }
            })
            .collect())
    }

    fn fetch(&self, coord: &IcrsCoord, info: &SectorInfo, size: u32) -> Result<SectorFetch> {
        let path = self
            .service
            .download_cutout(coord, info.sector, size, &self.work_dir)?;
        let reference = ArchiveReference {
            path,
            sector: info.sector,
            camera: Some(info.camera),
            ccd: Some(info.ccd),
        };
        let extracted = archive::extract(&reference, &extraction_dir(&self.work_dir, info.sector))?;
        let Some(path) = extracted.files.into_iter().next() else {
            warn!(
                sector = info.sector,
                dir = %extracted.dir.display(),
                "No FITS files found in extracted archive"
            );
            return Ok(SectorFetch::NoFrameFiles { dir: extracted.dir });
        };
        Ok(SectorFetch::Product(ProductHandle {
            sector: info.sector,
            path,
        }))
    }

    /// Listed sectors, one entry per sector number, in service order.
    fn covering_sectors(&self, coord: &IcrsCoord) -> Result<Vec<SectorInfo>> {
        let mut sectors: Vec<SectorInfo> = Vec::new();
        for info in self.service.list_sectors(coord, self.search_radius_deg)? {
            if !sectors.iter().any(|s| s.sector == info.sector) {
                sectors.push(info);
            }
        }
        Ok(sectors)
    }
}
