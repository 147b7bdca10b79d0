/// File extension of extracted cutout products.
pub const FITS_EXTENSION: &str = "fits";

/// Extension index holding the cutout stack.
pub const CUTOUT_HDU_INDEX: usize = 1;

/// Binary-table column carrying calibrated flux in target pixel files.
pub const FLUX_COLUMN: &str = "FLUX";

/// Default square cutout size in pixels.
pub const DEFAULT_CUTOUT_SIZE: u32 = 100;

/// Largest cutout side accepted before a request is sent.
pub const MAX_CUTOUT_SIZE: u32 = 2048;

/// Base URL of the MAST portal.
pub const MAST_BASE_URL: &str = "https://mast.stsci.edu";

/// Path of the TESScut REST API under the MAST portal.
pub const TESSCUT_API_PATH: &str = "/tesscut/api/v0.1";

/// Path of the MAST portal service invocation endpoint.
pub const MAST_INVOKE_PATH: &str = "/api/v0/invoke";

/// HTTP timeout for cutout downloads. Large multi-sector cutouts are slow.
pub const HTTP_TIMEOUT_SECS: u64 = 600;

/// Prefix of per-sector extraction directories.
pub const EXTRACT_DIR_PREFIX: &str = "tess_cutout_sector";

/// Fallback substituted for a title field with no explicit fallback.
pub const DEFAULT_TITLE_FALLBACK: &str = "Unknown";

/// Default colorbar label.
pub const DEFAULT_COLORBAR_LABEL: &str = "Flux (e-/s)";

/// Default figure size in pixels.
pub const DEFAULT_FIGURE_SIZE: (u32, u32) = (800, 800);

/// North galactic pole right ascension (ICRS, degrees).
pub const GALACTIC_POLE_RA: f64 = 192.859_508;

/// North galactic pole declination (ICRS, degrees).
pub const GALACTIC_POLE_DEC: f64 = 27.128_336;

/// Galactic longitude of the north celestial pole (degrees).
pub const GALACTIC_NCP_LON: f64 = 122.932;
