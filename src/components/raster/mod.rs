pub mod reader;
pub mod writer;

use std::{collections::HashMap, fmt::Debug, path::Path};

use geo::AffineTransform;
use ndarray::Array2;

use crate::{
    components::{codec::RasterCodec, crs::Crs, drivers::DriverInfo, source::Source},
    errors::{GeoIoError, Result},
};

pub use reader::{BandSelection, RasterReadOptions};
pub use writer::{Compression, RasterWriteOptions, StorageType};

/// Spatial header shared by every band of a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterHeader {
    pub width: usize,
    pub height: usize,
    /// Pixel to map coordinates.
    pub transform: AffineTransform,
    pub crs: Crs,
}

impl RasterHeader {
    pub fn new(width: usize, height: usize, transform: AffineTransform, crs: Crs) -> Self {
        Self {
            width,
            height,
            transform,
            crs,
        }
    }

    /// North-up header from the top left corner and the cell size.
    pub fn north_up(
        width: usize,
        height: usize,
        origin: (f64, f64),
        cell_size: (f64, f64),
        crs: Crs,
    ) -> Self {
        let transform =
            AffineTransform::new(cell_size.0, 0., origin.0, 0., -cell_size.1.abs(), origin.1);
        Self::new(width, height, transform, crs)
    }

    /// (rows, columns), the shape of every band array.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.transform.xoff(), self.transform.yoff())
    }

    pub fn resolution(&self) -> (f64, f64) {
        (self.transform.a(), self.transform.e())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterBand {
    pub description: String,
    pub values: Array2<f64>,
    pub no_data: Option<f64>,
}

impl RasterBand {
    pub fn new(values: Array2<f64>) -> Self {
        Self {
            description: String::new(),
            values,
            no_data: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_no_data(mut self, no_data: f64) -> Self {
        self.no_data = Some(no_data);
        self
    }

    pub fn is_no_data(&self, value: f64) -> bool {
        match self.no_data {
            Some(no_data) if no_data.is_nan() => value.is_nan(),
            Some(no_data) => value == no_data,
            None => false,
        }
    }

    /// Finite (min, max) ignoring no-data cells.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|value| value.is_finite() && !self.is_no_data(*value))
            .fold(None, |acc, value| match acc {
                None => Some((value, value)),
                Some((min, max)) => Some((min.min(value), max.max(value))),
            })
    }
}

/// Bands on one grid, in source order.
#[derive(Clone, PartialEq)]
pub struct RasterDataset {
    header: RasterHeader,
    bands: Vec<RasterBand>,
    metadata: HashMap<String, String>,
}

impl Debug for RasterDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bands: Vec<&str> = self
            .bands
            .iter()
            .map(|band| band.description.as_str())
            .collect();
        f.debug_struct("RasterDataset")
            .field("header", &self.header)
            .field("bands", &bands)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl RasterDataset {
    pub fn new(header: RasterHeader) -> Self {
        Self {
            header,
            bands: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn from_bands(header: RasterHeader, bands: impl IntoIterator<Item = RasterBand>) -> Result<Self> {
        let mut dataset = Self::new(header);
        for band in bands {
            dataset.push_band(band)?;
        }
        Ok(dataset)
    }

    pub fn push_band(&mut self, band: RasterBand) -> Result<()> {
        if band.values.dim() != self.header.shape() {
            return Err(GeoIoError::HeaderMismatch {
                band: self.bands.len() + 1,
                found: band.values.dim(),
                expected: self.header.shape(),
            });
        }
        self.bands.push(band);
        Ok(())
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub(crate) fn set_metadata(&mut self, metadata: HashMap<String, String>) {
        self.metadata = metadata;
    }

    pub fn header(&self) -> &RasterHeader {
        &self.header
    }

    pub fn bands(&self) -> &[RasterBand] {
        &self.bands
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// 1-based, like the formats it is read from.
    pub fn band(&self, index: usize) -> Result<&RasterBand> {
        index
            .checked_sub(1)
            .and_then(|index| self.bands.get(index))
            .ok_or(GeoIoError::BandIndexOutOfRange {
                locator: "in-memory raster".to_string(),
                requested: index,
                available: self.bands.len(),
            })
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }
}

/// Header and band count, read without touching cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSummary {
    pub header: RasterHeader,
    pub band_count: usize,
    pub driver: String,
}

/// Codec for every raster driver GDAL provides.
#[derive(Debug, Default, Clone, Copy)]
pub struct GdalRasterCodec;

impl RasterCodec for GdalRasterCodec {
    fn summary(
        &self,
        source: &Source,
        driver: &DriverInfo,
        options: &RasterReadOptions,
    ) -> Result<RasterSummary> {
        reader::gdal_reader::summary(source, driver, options)
    }

    fn decode(
        &self,
        source: &Source,
        driver: &DriverInfo,
        options: &RasterReadOptions,
    ) -> Result<RasterDataset> {
        reader::gdal_reader::decode(source, driver, options)
    }

    fn encode(
        &self,
        dataset: &RasterDataset,
        destination: &Path,
        driver: &DriverInfo,
        options: &RasterWriteOptions,
    ) -> Result<()> {
        writer::gdal_writer::encode(dataset, destination, driver, options)
    }
}
