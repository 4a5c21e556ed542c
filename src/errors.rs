use std::{fmt::Display, path::Path};

pub type Result<T> = std::result::Result<T, GeoIoError>;

#[derive(thiserror::Error, Debug)]
pub enum GeoIoError {
    #[error("Could not open {locator}: {reason}")]
    SourceNotFound { locator: String, reason: String },
    #[error("Layer {layer} not found in {locator}, available layers: [{available}]")]
    LayerNotFound {
        locator: String,
        layer: String,
        available: String,
    },
    #[error("Band {requested} requested from {locator}, which has {available} band(s)")]
    BandIndexOutOfRange {
        locator: String,
        requested: usize,
        available: usize,
    },
    #[error("Failed to decode {locator} with driver {driver}: {message}")]
    ParseError {
        locator: String,
        driver: String,
        message: String,
    },
    #[error("No registered {kind} driver matches {locator}")]
    UnsupportedFormat { locator: String, kind: String },
    #[error("Destination {destination} already exists (layer {layer}), choose a write mode that permits replacing it")]
    DestinationExists { destination: String, layer: String },
    #[error("Failed to write {destination} with driver {driver}: {message}")]
    WriteError {
        destination: String,
        driver: String,
        message: String,
    },
    #[error("Request to {url} failed: {message}")]
    NetworkError { url: String, message: String },
    #[error("Service at {url} reported a fault: {message}")]
    ServiceError { url: String, message: String },
    #[error("Type {type_name} is not offered by {url}, available types: [{available}]")]
    UnknownType {
        url: String,
        type_name: String,
        available: String,
    },
    #[error("Feature {feature} has attribute {column} which is not part of the schema")]
    SchemaMismatch { feature: usize, column: String },
    #[error("Band {band} has shape {found:?}, raster header expects {expected:?}")]
    HeaderMismatch {
        band: usize,
        found: (usize, usize),
        expected: (usize, usize),
    },
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
}

impl GeoIoError {
    pub(crate) fn parse(locator: impl Display, driver: impl Display, message: impl Display) -> Self {
        GeoIoError::ParseError {
            locator: locator.to_string(),
            driver: driver.to_string(),
            message: message.to_string(),
        }
    }

    /// Attaches the write target to a bare gdal or io failure.
    pub(crate) fn while_writing(
        self,
        destination: &Path,
        driver: &str,
        layer: Option<&str>,
    ) -> Self {
        match &self {
            GeoIoError::GdalError(_) | GeoIoError::IoError(_) => GeoIoError::WriteError {
                destination: destination.display().to_string(),
                driver: driver.to_string(),
                message: match layer {
                    Some(layer) => format!("layer {layer}: {self}"),
                    None => self.to_string(),
                },
            },
            _ => self,
        }
    }

    pub(crate) fn network(url: impl Display, message: impl Display) -> Self {
        GeoIoError::NetworkError {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn service(url: impl Display, message: impl Display) -> Self {
        GeoIoError::ServiceError {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}
