//! Coordinate Reference System handling
//!
//! EPSG-code based. PROJ definitions for the systems this pipeline meets in
//! practice (geographic WGS84, Web Mercator, the French Lambert family and
//! the UTM grid) live in a built-in table, so no libproj binding is needed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Coordinate Reference System, identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// Get the EPSG code
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Parse an authority string such as `EPSG:4326`, or a bare code.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let code = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);
        code.parse::<u32>()
            .map(Self::from_epsg)
            .map_err(|_| Error::UnknownCrs(s.to_string()))
    }

    /// PROJ definition string for this CRS.
    ///
    /// Codes covered by the built-in table:
    /// - EPSG 4326 (WGS84 geographic) and 3857 (Web Mercator)
    /// - EPSG 2154 (Lambert-93) and 27572 (Lambert zone II, NTF)
    /// - EPSG 326xx (UTM zone xx North) and 327xx (UTM zone xx South)
    ///
    /// Anything else is an `UnknownCrs` error.
    pub fn proj_string(&self) -> Result<String> {
        match self.epsg {
            4326 => Ok("+proj=longlat +datum=WGS84 +no_defs".to_string()),
            3857 => Ok(
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 \
                 +units=m +no_defs"
                    .to_string(),
            ),
            2154 => Ok(
                "+proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44 +x_0=700000 +y_0=6600000 \
                 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs"
                    .to_string(),
            ),
            27572 => Ok(
                "+proj=lcc +lat_1=46.8 +lat_0=46.8 +lon_0=0 +k_0=0.99987742 +x_0=600000 \
                 +y_0=2200000 +a=6378249.2 +b=6356515 +towgs84=-168,-60,320,0,0,0,0 +pm=paris \
                 +units=m +no_defs"
                    .to_string(),
            ),
            code @ 32601..=32660 => Ok(format!(
                "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
                code - 32600
            )),
            code @ 32701..=32760 => Ok(format!(
                "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
                code - 32700
            )),
            _ => Err(Error::UnknownCrs(self.to_string())),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}
