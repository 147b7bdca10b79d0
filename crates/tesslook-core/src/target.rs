use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{GALACTIC_NCP_LON, GALACTIC_POLE_DEC, GALACTIC_POLE_RA};
use crate::error::{Result, TessError};

/// Coordinate system a sky position is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateFrame {
    Icrs,
    /// FK5 at equinox J2000; differs from ICRS by well under an arcsecond.
    Fk5,
    /// Galactic longitude / latitude.
    Galactic,
}

impl FromStr for CoordinateFrame {
    type Err = TessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "icrs" => Ok(Self::Icrs),
            "fk5" => Ok(Self::Fk5),
            "galactic" => Ok(Self::Galactic),
            other => Err(TessError::InvalidCoordinate(format!(
                "unrecognized coordinate frame '{other}'"
            ))),
        }
    }
}

impl fmt::Display for CoordinateFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Icrs => write!(f, "icrs"),
            Self::Fk5 => write!(f, "fk5"),
            Self::Galactic => write!(f, "galactic"),
        }
    }
}

/// What the user asked to look at.
#[derive(Clone, Debug, PartialEq)]
pub enum TargetSpec {
    /// `ra` / `dec` carry longitude / latitude of `frame`, in degrees.
    SkyPosition {
        ra: f64,
        dec: f64,
        frame: CoordinateFrame,
    },
    CatalogIdentifier(String),
}

impl TargetSpec {
    pub fn icrs(ra: f64, dec: f64) -> Self {
        Self::SkyPosition {
            ra,
            dec,
            frame: CoordinateFrame::Icrs,
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::CatalogIdentifier(name.into())
    }
}

/// ICRS position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IcrsCoord {
    pub ra: f64,
    pub dec: f64,
}

impl fmt::Display for IcrsCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RA {:.4} Dec {:+.4}", self.ra, self.dec)
    }
}

/// Canonical target accepted by the cutout service.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedTarget {
    Position(IcrsCoord),
    /// Name resolution is left to the service.
    Identifier(String),
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(coord) => write!(f, "{coord}"),
            Self::Identifier(name) => write!(f, "{name}"),
        }
    }
}

/// Validate a target spec and convert it to its canonical form.
pub fn resolve(spec: &TargetSpec) -> Result<ResolvedTarget> {
    match spec {
        TargetSpec::SkyPosition { ra, dec, frame } => {
            check_range("ra", *ra, (0.0..360.0).contains(ra))?;
            check_range("dec", *dec, (-90.0..=90.0).contains(dec))?;
            let coord = match frame {
                CoordinateFrame::Icrs | CoordinateFrame::Fk5 => IcrsCoord {
                    ra: *ra,
                    dec: *dec,
                },
                CoordinateFrame::Galactic => galactic_to_icrs(*ra, *dec),
            };
            Ok(ResolvedTarget::Position(coord))
        }
        TargetSpec::CatalogIdentifier(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(TessError::InvalidCoordinate(
                    "catalog identifier is empty".into(),
                ));
            }
            Ok(ResolvedTarget::Identifier(name.to_string()))
        }
    }
}

fn check_range(axis: &str, value: f64, ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(TessError::InvalidCoordinate(format!(
            "{axis} = {value} is out of range"
        )))
    }
}

/// Rotate galactic (l, b) into ICRS (ra, dec).
fn galactic_to_icrs(l: f64, b: f64) -> IcrsCoord {
    let (l, b) = (l.to_radians(), b.to_radians());
    let pole_dec = GALACTIC_POLE_DEC.to_radians();
    let dl = GALACTIC_NCP_LON.to_radians() - l;

    let sin_dec = b.sin() * pole_dec.sin() + b.cos() * pole_dec.cos() * dl.cos();
    let dec = sin_dec.clamp(-1.0, 1.0).asin();
    let y = b.cos() * dl.sin();
    let x = b.sin() * pole_dec.cos() - b.cos() * pole_dec.sin() * dl.cos();
    let ra = (GALACTIC_POLE_RA + y.atan2(x).to_degrees()).rem_euclid(360.0);

    IcrsCoord {
        ra,
        dec: dec.to_degrees(),
    }
}
