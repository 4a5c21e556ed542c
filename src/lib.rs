mod components;
mod errors;
mod geoio;

use std::path::Path;

pub use components::{
    codec, crs, drivers, raster, render, service, source, vector, AttributeValue,
    BandSelection, Column, ColumnType, Compression, Crs, Decoded, DriverEntry, DriverInfo,
    DriverKind, DriverRegistry, Feature, GeometryEncoding, GeometryKind, LayerSelector,
    RasterBand, RasterCodec, RasterDataset, RasterHeader, RasterReadOptions, RasterSummary,
    RasterWriteOptions, Record, ResolvedDriver, Schema, Source, StorageType, VectorCodec,
    VectorDataset, VectorReadOptions, VectorWriteOptions, WriteMode,
};
pub use components::render::render_band;
pub use components::service::{
    Capabilities, CoverageQuery, FeatureQuery, LayerSummary, ServiceConfig, ServiceKind,
    WebServiceClient,
};
pub use errors::{GeoIoError, Result};
pub use geoio::GeoIo;

/// Reads one vector layer with the built-in drivers.
pub fn read_vector(
    source: impl Into<Source>,
    options: &VectorReadOptions,
) -> Result<Decoded<VectorDataset>> {
    GeoIo::default().read_vector(source, options)
}

pub fn list_layers(source: impl Into<Source>, options: &VectorReadOptions) -> Result<Vec<String>> {
    GeoIo::default().list_layers(source, options)
}

pub fn write_vector(
    dataset: &VectorDataset,
    destination: impl AsRef<Path>,
    options: &VectorWriteOptions,
) -> Result<()> {
    GeoIo::default().write_vector(dataset, destination, options)
}

/// Reads the selected bands of a raster with the built-in drivers.
pub fn read_raster(source: impl Into<Source>, options: &RasterReadOptions) -> Result<RasterDataset> {
    GeoIo::default().read_raster(source, options)
}

pub fn read_raster_header(
    source: impl Into<Source>,
    options: &RasterReadOptions,
) -> Result<RasterSummary> {
    GeoIo::default().read_raster_header(source, options)
}

pub fn write_raster(
    dataset: &RasterDataset,
    destination: impl AsRef<Path>,
    options: &RasterWriteOptions,
) -> Result<()> {
    GeoIo::default().write_raster(dataset, destination, options)
}
