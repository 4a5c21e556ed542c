use std::fmt::Display;

use gdal::spatial_ref::{AxisMappingStrategy, SpatialRef};
use log::debug;

use crate::errors::Result;

/// Coordinate reference system attached to a dataset.
///
/// A source without CRS metadata is [Crs::Unknown]; it is never guessed.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub enum Crs {
    #[default]
    Unknown,
    Epsg(u32),
    Wkt(String),
}

impl Crs {
    pub fn is_known(&self) -> bool {
        !matches!(self, Crs::Unknown)
    }

    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn from_spatial_ref(srs: &SpatialRef) -> Self {
        let authority = srs.auth_name().ok();
        let code = srs.auth_code().ok();
        match (authority.as_deref(), code) {
            (Some(name), Some(code)) if name.eq_ignore_ascii_case("EPSG") && code > 0 => {
                Crs::Epsg(code as u32)
            }
            _ => match srs.to_wkt() {
                Ok(wkt) if !wkt.is_empty() => Crs::Wkt(wkt),
                _ => Crs::Unknown,
            },
        }
    }

    /// Parses the WKT GDAL reports for raster datasets, empty meaning unknown.
    pub(crate) fn from_projection(projection: &str) -> Self {
        if projection.trim().is_empty() {
            return Crs::Unknown;
        }
        match SpatialRef::from_wkt(projection) {
            Ok(srs) => Crs::from_spatial_ref(&srs),
            Err(err) => {
                debug!("keeping unparsable projection as text: {err}");
                Crs::Wkt(projection.to_string())
            }
        }
    }

    /// Spatial reference with x/y in longitude, latitude order.
    pub(crate) fn to_spatial_ref(&self) -> Result<Option<SpatialRef>> {
        let mut srs = match self {
            Crs::Unknown => return Ok(None),
            Crs::Epsg(code) => SpatialRef::from_epsg(*code)?,
            Crs::Wkt(wkt) => SpatialRef::from_wkt(wkt)?,
        };
        srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        Ok(Some(srs))
    }
}

impl From<u32> for Crs {
    fn from(value: u32) -> Self {
        Crs::Epsg(value)
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Crs::Unknown => f.write_str("unknown"),
            Crs::Epsg(code) => write!(f, "EPSG:{code}"),
            Crs::Wkt(wkt) => f.write_str(wkt),
        }
    }
}
