use std::{fmt::Debug, path::Path};

use crate::{
    components::{
        drivers::DriverInfo,
        raster::{RasterDataset, RasterReadOptions, RasterSummary, RasterWriteOptions},
        source::Source,
        vector::{VectorDataset, VectorReadOptions, VectorWriteOptions},
    },
    errors::Result,
};

/// A decoded dataset together with the driver that decoded it.
#[derive(Debug, Clone)]
pub struct Decoded<D> {
    pub dataset: D,
    pub driver: String,
}

pub trait VectorCodec: Debug + Send + Sync {
    /// Layer names in source order, without decoding features.
    fn layer_names(
        &self,
        source: &Source,
        driver: &DriverInfo,
        options: &VectorReadOptions,
    ) -> Result<Vec<String>>;
    fn decode(
        &self,
        source: &Source,
        driver: &DriverInfo,
        options: &VectorReadOptions,
    ) -> Result<VectorDataset>;
    fn encode(
        &self,
        dataset: &VectorDataset,
        destination: &Path,
        driver: &DriverInfo,
        options: &VectorWriteOptions,
    ) -> Result<()>;
}

pub trait RasterCodec: Debug + Send + Sync {
    fn summary(
        &self,
        source: &Source,
        driver: &DriverInfo,
        options: &RasterReadOptions,
    ) -> Result<RasterSummary>;
    fn decode(
        &self,
        source: &Source,
        driver: &DriverInfo,
        options: &RasterReadOptions,
    ) -> Result<RasterDataset>;
    fn encode(
        &self,
        dataset: &RasterDataset,
        destination: &Path,
        driver: &DriverInfo,
        options: &RasterWriteOptions,
    ) -> Result<()>;
}
