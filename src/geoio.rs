use std::path::Path;

use crate::{
    components::{
        codec::Decoded,
        drivers::{DriverKind, DriverRegistry, ResolvedDriver},
        raster::{RasterDataset, RasterReadOptions, RasterSummary, RasterWriteOptions},
        source::Source,
        vector::{VectorDataset, VectorReadOptions, VectorWriteOptions},
    },
    errors::{GeoIoError, Result},
};

/// Entry point for reading and writing datasets through a driver registry.
#[derive(Debug, Clone, Default)]
pub struct GeoIo {
    registry: DriverRegistry,
}

fn missing_codec(source: &Source, driver: &ResolvedDriver, kind: DriverKind) -> GeoIoError {
    GeoIoError::UnsupportedFormat {
        locator: format!("{source} (driver {})", driver.name()),
        kind: kind.to_string(),
    }
}

impl GeoIo {
    pub fn new(registry: DriverRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DriverRegistry {
        &mut self.registry
    }

    pub fn read_vector(
        &self,
        source: impl Into<Source>,
        options: &VectorReadOptions,
    ) -> Result<Decoded<VectorDataset>> {
        let source = source.into();
        let driver = self
            .registry
            .resolve(&source, DriverKind::Vector, options.driver.as_deref())?;
        let codec = driver
            .vector()
            .ok_or_else(|| missing_codec(&source, &driver, DriverKind::Vector))?;
        Ok(Decoded {
            dataset: codec.decode(&source, driver.info(), options)?,
            driver: driver.name().to_string(),
        })
    }

    /// Layer names in source order; index 0 is what [GeoIo::read_vector] reads by default.
    pub fn list_layers(
        &self,
        source: impl Into<Source>,
        options: &VectorReadOptions,
    ) -> Result<Vec<String>> {
        let source = source.into();
        let driver = self
            .registry
            .resolve(&source, DriverKind::Vector, options.driver.as_deref())?;
        let codec = driver
            .vector()
            .ok_or_else(|| missing_codec(&source, &driver, DriverKind::Vector))?;
        codec.layer_names(&source, driver.info(), options)
    }

    pub fn write_vector(
        &self,
        dataset: &VectorDataset,
        destination: impl AsRef<Path>,
        options: &VectorWriteOptions,
    ) -> Result<()> {
        let destination = destination.as_ref();
        let target = Source::from(destination);
        let driver = self
            .registry
            .resolve(&target, DriverKind::Vector, options.driver.as_deref())?;
        let codec = driver
            .vector()
            .ok_or_else(|| missing_codec(&target, &driver, DriverKind::Vector))?;
        codec.encode(dataset, destination, driver.info(), options)
    }

    pub fn read_raster(
        &self,
        source: impl Into<Source>,
        options: &RasterReadOptions,
    ) -> Result<RasterDataset> {
        let source = source.into();
        let driver = self
            .registry
            .resolve(&source, DriverKind::Raster, options.driver.as_deref())?;
        let codec = driver
            .raster()
            .ok_or_else(|| missing_codec(&source, &driver, DriverKind::Raster))?;
        codec.decode(&source, driver.info(), options)
    }

    /// Header and band count without reading any cell.
    pub fn read_raster_header(
        &self,
        source: impl Into<Source>,
        options: &RasterReadOptions,
    ) -> Result<RasterSummary> {
        let source = source.into();
        let driver = self
            .registry
            .resolve(&source, DriverKind::Raster, options.driver.as_deref())?;
        let codec = driver
            .raster()
            .ok_or_else(|| missing_codec(&source, &driver, DriverKind::Raster))?;
        codec.summary(&source, driver.info(), options)
    }

    pub fn write_raster(
        &self,
        dataset: &RasterDataset,
        destination: impl AsRef<Path>,
        options: &RasterWriteOptions,
    ) -> Result<()> {
        let destination = destination.as_ref();
        let target = Source::from(destination);
        let driver = self
            .registry
            .resolve(&target, DriverKind::Raster, options.driver.as_deref())?;
        let codec = driver
            .raster()
            .ok_or_else(|| missing_codec(&target, &driver, DriverKind::Raster))?;
        codec.encode(dataset, destination, driver.info(), options)
    }
}
