use std::path::Path;

use gdal::vector::{Geometry as GdalGeometry, ToGdal};
use log::info;

use crate::{
    components::{
        backends::gdal_backend::remove_destination,
        codec::VectorCodec,
        crs::Crs,
        drivers::DriverInfo,
        source::Source,
        vector::{
            Feature, LayerSelector, Schema, VectorDataset, VectorReadOptions, VectorWriteOptions,
            WriteMode,
        },
    },
    errors::{GeoIoError, Result},
};

const INLINE_LAYER: &str = "wkt";

/// Geometry-only codec for WKT text: inline geometry strings and `.wkt`
/// files with one geometry per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct WktCodec;

impl WktCodec {
    fn layer_name(source: &Source) -> String {
        source
            .as_path()
            .and_then(|path| path.file_stem())
            .map_or(INLINE_LAYER.to_string(), |stem| {
                stem.to_string_lossy().into_owned()
            })
    }

    fn text(source: &Source, driver: &DriverInfo) -> Result<String> {
        match source {
            Source::Inline(text) => Ok(text.clone()),
            Source::Path(path) if path.is_file() => Ok(std::fs::read_to_string(path)?),
            Source::Path(_) => Err(GeoIoError::SourceNotFound {
                locator: source.to_string(),
                reason: "no such file".to_string(),
            }),
            Source::Url(_) | Source::Connection(_) => Err(GeoIoError::UnsupportedFormat {
                locator: source.to_string(),
                kind: driver.name().to_string(),
            }),
        }
    }

    fn check_layer(source: &Source, layer: &LayerSelector) -> Result<String> {
        let name = Self::layer_name(source);
        match layer {
            LayerSelector::Index(0) => Ok(name),
            LayerSelector::Name(requested) if *requested == name => Ok(name),
            _ => Err(GeoIoError::LayerNotFound {
                locator: source.to_string(),
                layer: layer.to_string(),
                available: name,
            }),
        }
    }
}

impl VectorCodec for WktCodec {
    fn layer_names(
        &self,
        source: &Source,
        driver: &DriverInfo,
        _options: &VectorReadOptions,
    ) -> Result<Vec<String>> {
        Self::text(source, driver)?;
        Ok(vec![Self::layer_name(source)])
    }

    fn decode(
        &self,
        source: &Source,
        driver: &DriverInfo,
        options: &VectorReadOptions,
    ) -> Result<VectorDataset> {
        let text = Self::text(source, driver)?;
        let name = Self::check_layer(source, &options.layer)?;
        let lines: Vec<&str> = match source {
            Source::Inline(_) => vec![text.trim()],
            _ => text.lines().map(str::trim).filter(|line| !line.is_empty()).collect(),
        };
        let mut dataset = VectorDataset::new(name, Crs::Unknown, Schema::default());
        for (line, wkt) in lines.into_iter().enumerate() {
            let geometry = GdalGeometry::from_wkt(wkt)
                .and_then(|geometry| geometry.to_geo())
                .map_err(|err| {
                    GeoIoError::parse(source, driver.name(), format!("line {}: {err}", line + 1))
                })?;
            dataset.push(Feature::new(geometry))?;
        }
        info!("read {} geometries from {source}", dataset.len());
        Ok(dataset)
    }

    fn encode(
        &self,
        dataset: &VectorDataset,
        destination: &Path,
        driver: &DriverInfo,
        options: &VectorWriteOptions,
    ) -> Result<()> {
        if destination.exists() {
            match options.mode {
                WriteMode::Create => {
                    return Err(GeoIoError::DestinationExists {
                        destination: destination.display().to_string(),
                        layer: dataset.name().to_string(),
                    })
                }
                WriteMode::ReplaceLayer | WriteMode::Overwrite => {
                    remove_destination(destination, driver)?
                }
            }
        }
        let mut lines = Vec::with_capacity(dataset.len());
        for feature in dataset.features() {
            match &feature.geometry {
                Some(geometry) => lines.push(geometry.to_gdal()?.wkt()?),
                None => lines.push("GEOMETRYCOLLECTION EMPTY".to_string()),
            }
        }
        lines.push(String::new());
        std::fs::write(destination, lines.join("\n")).map_err(|err| {
            GeoIoError::from(err).while_writing(destination, driver.name(), None)
        })?;
        info!(
            "wrote {} geometries to {}",
            dataset.len(),
            destination.display()
        );
        Ok(())
    }
}
