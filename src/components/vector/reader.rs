use std::fmt::Display;

/// Which layer of a multi-layer source to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSelector {
    Index(usize),
    Name(String),
}

impl Default for LayerSelector {
    fn default() -> Self {
        LayerSelector::Index(0)
    }
}

impl Display for LayerSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerSelector::Index(index) => write!(f, "#{index}"),
            LayerSelector::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for LayerSelector {
    fn from(value: usize) -> Self {
        LayerSelector::Index(value)
    }
}

impl From<&str> for LayerSelector {
    fn from(value: &str) -> Self {
        LayerSelector::Name(value.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct VectorReadOptions {
    pub driver: Option<String>,
    pub layer: LayerSelector,
    /// Driver open options as `KEY=VALUE`.
    pub open_options: Vec<String>,
}

impl VectorReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn layer(mut self, layer: impl Into<LayerSelector>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn open_option(mut self, key: &str, value: &str) -> Self {
        self.open_options.push(format!("{key}={value}"));
        self
    }

    /// Columns holding point coordinates in delimited text sources.
    pub fn coordinate_columns(self, x: &str, y: &str) -> Self {
        self.open_option("X_POSSIBLE_NAMES", x)
            .open_option("Y_POSSIBLE_NAMES", y)
            .open_option("KEEP_GEOM_COLUMNS", "NO")
    }

    /// Column holding geometry text in delimited text sources.
    pub fn geometry_column(self, column: &str) -> Self {
        self.open_option("GEOM_POSSIBLE_NAMES", column)
            .open_option("KEEP_GEOM_COLUMNS", "NO")
    }
}

/// Vector decoding through GDAL/OGR
pub mod gdal_reader {
    use super::*;
    use gdal::{
        vector::{FieldValue, LayerAccess, OGRFieldType},
        Dataset as GdalDataset, GdalOpenFlags,
    };
    use itertools::Itertools;
    use log::info;

    use crate::{
        components::{
            backends::gdal_backend::open_dataset,
            crs::Crs,
            drivers::DriverInfo,
            source::Source,
            vector::{AttributeValue, Column, ColumnType, Feature, Record, Schema, VectorDataset},
        },
        errors::{GeoIoError, Result},
    };

    fn column_type(field_type: OGRFieldType::Type) -> ColumnType {
        match field_type {
            OGRFieldType::OFTInteger | OGRFieldType::OFTInteger64 => ColumnType::Integer,
            OGRFieldType::OFTReal => ColumnType::Real,
            OGRFieldType::OFTDate => ColumnType::Date,
            OGRFieldType::OFTDateTime => ColumnType::DateTime,
            _ => ColumnType::Text,
        }
    }

    /// Dates and date-times become ISO-8601 text, lists comma-joined text.
    pub(crate) fn attribute(value: Option<FieldValue>) -> AttributeValue {
        let Some(value) = value else {
            return AttributeValue::Null;
        };
        match value {
            FieldValue::IntegerValue(value) => AttributeValue::Integer(value.into()),
            FieldValue::Integer64Value(value) => AttributeValue::Integer(value),
            FieldValue::RealValue(value) => AttributeValue::Real(value),
            FieldValue::StringValue(value) => AttributeValue::Text(value),
            FieldValue::DateValue(date) => {
                AttributeValue::Text(date.format("%Y-%m-%d").to_string())
            }
            FieldValue::DateTimeValue(date_time) => AttributeValue::Text(date_time.to_rfc3339()),
            FieldValue::IntegerListValue(values) => AttributeValue::Text(values.iter().join(",")),
            FieldValue::Integer64ListValue(values) => {
                AttributeValue::Text(values.iter().join(","))
            }
            FieldValue::RealListValue(values) => AttributeValue::Text(values.iter().join(",")),
            FieldValue::StringListValue(values) => AttributeValue::Text(values.iter().join(",")),
        }
    }

    /// Drivers that know their feature count must deliver that many features.
    pub(crate) fn check_count(
        source: &Source,
        driver: &DriverInfo,
        layer: &str,
        announced: Option<u64>,
        decoded: usize,
    ) -> Result<()> {
        match announced {
            Some(announced) if announced as usize != decoded => Err(GeoIoError::parse(
                source,
                driver.name(),
                format!(
                    "layer {layer} announces {announced} features but {decoded} could be decoded"
                ),
            )),
            _ => Ok(()),
        }
    }

    fn open_vector(
        source: &Source,
        driver: &DriverInfo,
        options: &VectorReadOptions,
    ) -> Result<GdalDataset> {
        open_dataset(
            source,
            driver,
            GdalOpenFlags::GDAL_OF_VECTOR | GdalOpenFlags::GDAL_OF_READONLY,
            &options.open_options,
        )
    }

    fn names(dataset: &GdalDataset) -> Vec<String> {
        dataset.layers().map(|layer| layer.name()).collect()
    }

    pub fn layer_names(
        source: &Source,
        driver: &DriverInfo,
        options: &VectorReadOptions,
    ) -> Result<Vec<String>> {
        Ok(names(&open_vector(source, driver, options)?))
    }

    pub fn decode(
        source: &Source,
        driver: &DriverInfo,
        options: &VectorReadOptions,
    ) -> Result<VectorDataset> {
        let dataset = open_vector(source, driver, options)?;
        let selected = match &options.layer {
            LayerSelector::Index(index) => dataset.layer(*index),
            LayerSelector::Name(name) => dataset.layer_by_name(name),
        };
        let mut layer = selected.map_err(|_| GeoIoError::LayerNotFound {
            locator: source.to_string(),
            layer: options.layer.to_string(),
            available: names(&dataset).iter().join(", "),
        })?;

        let schema: Schema = layer
            .defn()
            .fields()
            .map(|field| Column::new(field.name(), column_type(field.field_type())))
            .collect();
        let crs = layer
            .spatial_ref()
            .map_or(Crs::Unknown, |srs| Crs::from_spatial_ref(&srs));
        let announced = layer.try_feature_count();

        let mut vector = VectorDataset::new(layer.name(), crs, schema);
        for (index, feature) in layer.features().enumerate() {
            let geometry = feature
                .geometry()
                .map(|geometry| geometry.to_geo())
                .transpose()
                .map_err(|err| {
                    GeoIoError::parse(source, driver.name(), format!("feature {index}: {err}"))
                })?;
            let attributes: Record = feature
                .fields()
                .map(|(name, value)| (name, attribute(value)))
                .collect();
            vector.push(Feature {
                geometry,
                attributes,
            })?;
        }

        check_count(source, driver, vector.name(), announced, vector.len())?;

        info!(
            "read {} features from layer {} of {source} ({})",
            vector.len(),
            vector.name(),
            driver.name()
        );
        Ok(vector)
    }
}
