pub mod backends;
pub mod codec;
pub mod crs;
pub mod drivers;
pub mod raster;
pub mod render;
pub mod service;
pub mod source;
pub mod vector;

pub use codec::{Decoded, RasterCodec, VectorCodec};
pub use crs::Crs;
pub use drivers::{DriverEntry, DriverInfo, DriverKind, DriverRegistry, ResolvedDriver};
pub use raster::{
    BandSelection, Compression, RasterBand, RasterDataset, RasterHeader, RasterReadOptions,
    RasterSummary, RasterWriteOptions, StorageType,
};
pub use source::Source;
pub use vector::{
    AttributeValue, Column, ColumnType, Feature, GeometryEncoding, GeometryKind, LayerSelector,
    Record, Schema, VectorDataset, VectorReadOptions, VectorWriteOptions, WriteMode,
};
