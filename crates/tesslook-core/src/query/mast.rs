//! Blocking HTTP client for the MAST TESScut and portal services.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::consts::{HTTP_TIMEOUT_SECS, MAST_BASE_URL, MAST_INVOKE_PATH, TESSCUT_API_PATH};
use crate::error::{Result, TessError};
use crate::target::IcrsCoord;

use super::{CutoutService, SectorInfo};

/// [`CutoutService`] backed by https://mast.stsci.edu.
#[derive(Debug, Clone)]
pub struct MastClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SectorResponse {
    #[serde(default)]
    results: Vec<SectorRow>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectorRow {
    sector_name: String,
    sector: String,
    camera: String,
    ccd: String,
}

#[derive(Deserialize)]
struct NameLookupResponse {
    #[serde(rename = "resolvedCoordinate", default)]
    resolved: Vec<NameLookupRow>,
}

#[derive(Deserialize)]
struct NameLookupRow {
    ra: f64,
    decl: f64,
}

#[derive(Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    data: Vec<CatalogRow>,
}

#[derive(Deserialize)]
struct CatalogRow {
    ra: f64,
    dec: f64,
}

impl MastClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(MAST_BASE_URL)
    }

    /// Point the client at another deployment of the same API.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("tesslook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn tesscut_url(&self, endpoint: &str) -> String {
        format!("{}{TESSCUT_API_PATH}/{endpoint}", self.base_url)
    }

    /// Call a MAST portal service with a JSON request document.
    fn invoke<T: for<'de> Deserialize<'de>>(&self, request: serde_json::Value) -> Result<T> {
        let url = format!("{}{MAST_INVOKE_PATH}", self.base_url);
        debug!(%url, %request, "MAST invoke");
        let response = self
            .client
            .get(&url)
            .query(&[("request", request.to_string())])
            .send()?;
        let body = check_status(response)?.text()?;
        serde_json::from_str(&body)
            .map_err(|e| TessError::Service(format!("unexpected MAST response: {e}")))
    }

    fn lookup_tic(&self, tic_id: &str) -> Result<Option<IcrsCoord>> {
        let response: CatalogResponse = self.invoke(json!({
            "service": "Mast.Catalogs.Filtered.Tic",
            "format": "json",
            "params": {
                "columns": "*",
                "filters": [{ "paramName": "ID", "values": [tic_id] }],
            },
        }))?;
        Ok(response
            .data
            .first()
            .map(|row| IcrsCoord { ra: row.ra, dec: row.dec }))
    }

    fn lookup_name(&self, name: &str) -> Result<Option<IcrsCoord>> {
        let response: NameLookupResponse = self.invoke(json!({
            "service": "Mast.Name.Lookup",
            "params": { "input": name, "format": "json" },
        }))?;
        Ok(response
            .resolved
            .first()
            .map(|row| IcrsCoord { ra: row.ra, dec: row.decl }))
    }
}

impl CutoutService for MastClient {
    fn resolve_name(&self, identifier: &str) -> Result<Option<IcrsCoord>> {
        let coord = match tic_number(identifier) {
            Some(id) => self.lookup_tic(id)?,
            None => self.lookup_name(identifier)?,
        };
        info!(identifier, resolved = ?coord, "Resolved target name");
        Ok(coord)
    }

    fn list_sectors(&self, coord: &IcrsCoord, radius_deg: f64) -> Result<Vec<SectorInfo>> {
        let url = self.tesscut_url("sector");
        debug!(%url, ra = coord.ra, dec = coord.dec, radius_deg, "Listing sectors");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("ra", coord.ra.to_string()),
                ("dec", coord.dec.to_string()),
                ("radius", format!("{radius_deg}d")),
            ])
            .send()?;
        let body = check_status(response)?.text()?;
        let parsed: SectorResponse = serde_json::from_str(&body)
            .map_err(|e| TessError::Service(format!("unexpected sector listing: {e}")))?;

        parsed
            .results
            .into_iter()
            .map(|row| {
                Ok(SectorInfo {
                    sector: parse_field("sector", &row.sector, &row.sector_name)?,
                    camera: parse_field("camera", &row.camera, &row.sector_name)?,
                    ccd: parse_field("ccd", &row.ccd, &row.sector_name)?,
                    name: row.sector_name,
                })
            })
            .collect()
    }

    fn download_cutout(
        &self,
        coord: &IcrsCoord,
        sector: u32,
        size: u32,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        fs::create_dir_all(dest_dir)?;
        let url = self.tesscut_url("astrocut");
        info!(sector, size, ra = coord.ra, dec = coord.dec, "Downloading cutout");

        let mut response = check_status(
            self.client
                .get(&url)
                .query(&[
                    ("ra", coord.ra.to_string()),
                    ("dec", coord.dec.to_string()),
                    ("y", size.to_string()),
                    ("x", size.to_string()),
                    ("units", "px".to_string()),
                    ("sector", sector.to_string()),
                ])
                .send()?,
        )?;

        let path = dest_dir.join(format!(
            "tesscut_s{sector:04}_{:.4}_{:+.4}_{size}x{size}.zip",
            coord.ra, coord.dec
        ));
        save_body(&mut response, &path)?;

        debug!(path = %path.display(), "Cutout saved");
        Ok(path)
    }
}

/// Stream `body` to `path` through a `.part` file renamed into place once
/// complete. A failed transfer leaves neither file behind.
fn save_body(body: &mut impl Read, path: &Path) -> Result<()> {
    let partial = path.with_extension("zip.part");
    let mut file = File::create(&partial)?;
    let copied = io::copy(body, &mut file).and_then(|_| file.flush());
    drop(file);
    if let Err(e) = copied {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    fs::rename(&partial, path)?;
    Ok(())
}

/// Map non-success statuses to errors: 4xx is a rejection of the request,
/// anything else a service failure.
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let message = diagnostic(&body).unwrap_or_else(|| status.to_string());
    if status.is_client_error() {
        Err(TessError::QueryRejected(message))
    } else {
        Err(TessError::Service(format!("HTTP {status}: {message}")))
    }
}

fn parse_field<T: std::str::FromStr>(name: &str, value: &str, sector_name: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TessError::Service(format!("bad {name} '{value}' in {sector_name}")))
}

/// Pull the human-readable message out of an error body.
fn diagnostic(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
        for key in ["msg", "message", "error", "detail"] {
            if let Some(serde_json::Value::String(s)) = map.get(key) {
                return Some(s.clone());
            }
        }
    }
    Some(body.to_string())
}

/// The numeric part of a `TIC <n>` identifier.
fn tic_number(identifier: &str) -> Option<&str> {
    let trimmed = identifier.trim();
    let prefix = trimmed.get(..3)?;
    if !prefix.eq_ignore_ascii_case("tic") {
        return None;
    }
    let digits = trimmed[3..].trim_start_matches([' ', '-', '_']);
    (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())).then_some(digits)
}
