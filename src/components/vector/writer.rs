/// What to do when the destination already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with `DestinationExists` unless a new layer can be added to the file.
    #[default]
    Create,
    /// Replace the named layer and keep the others; single-layer formats are replaced whole.
    ReplaceLayer,
    /// Remove the destination and its companion files first.
    Overwrite,
}

/// Textual geometry column layout for delimited text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryEncoding {
    AsWkt,
    AsXy,
}

impl GeometryEncoding {
    fn layer_option(self) -> &'static str {
        match self {
            GeometryEncoding::AsWkt => "GEOMETRY=AS_WKT",
            GeometryEncoding::AsXy => "GEOMETRY=AS_XY",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VectorWriteOptions {
    pub driver: Option<String>,
    /// Defaults to the dataset name.
    pub layer_name: Option<String>,
    pub mode: WriteMode,
    /// Dataset creation options as `KEY=VALUE`.
    pub dataset_options: Vec<String>,
    /// Layer creation options as `KEY=VALUE`.
    pub layer_options: Vec<String>,
    pub geometry_encoding: Option<GeometryEncoding>,
}

impl VectorWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn layer_name(mut self, layer_name: impl Into<String>) -> Self {
        self.layer_name = Some(layer_name.into());
        self
    }

    pub fn mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn dataset_option(mut self, key: &str, value: &str) -> Self {
        self.dataset_options.push(format!("{key}={value}"));
        self
    }

    pub fn layer_option(mut self, key: &str, value: &str) -> Self {
        self.layer_options.push(format!("{key}={value}"));
        self
    }

    pub fn geometry_encoding(mut self, encoding: GeometryEncoding) -> Self {
        self.geometry_encoding = Some(encoding);
        self
    }

    pub(crate) fn layer_creation_options(&self) -> Vec<String> {
        let mut options = self.layer_options.clone();
        if let Some(encoding) = self.geometry_encoding {
            options.push(encoding.layer_option().to_string());
        }
        options
    }
}

/// Vector encoding through GDAL/OGR
pub mod gdal_writer {
    use std::path::Path;

    use gdal::{
        vector::{
            Feature as GdalFeature, FieldValue, LayerAccess, LayerOptions, OGRFieldType,
            OGRwkbGeometryType, ToGdal,
        },
        Dataset as GdalDataset, DriverManager, GdalOpenFlags,
    };
    use log::{debug, info};

    use super::*;
    use crate::{
        components::{
            backends::gdal_backend::{open_dataset, remove_destination, string_list},
            drivers::DriverInfo,
            source::Source,
            vector::{AttributeValue, ColumnType, GeometryKind, VectorDataset},
        },
        errors::{GeoIoError, Result},
    };

    fn field_type(kind: ColumnType) -> OGRFieldType::Type {
        match kind {
            ColumnType::Integer => OGRFieldType::OFTInteger64,
            ColumnType::Real => OGRFieldType::OFTReal,
            ColumnType::Text => OGRFieldType::OFTString,
            ColumnType::Date => OGRFieldType::OFTDate,
            ColumnType::DateTime => OGRFieldType::OFTDateTime,
        }
    }

    fn geometry_type(kind: Option<GeometryKind>) -> OGRwkbGeometryType::Type {
        match kind {
            Some(GeometryKind::Point) => OGRwkbGeometryType::wkbPoint,
            Some(GeometryKind::LineString) => OGRwkbGeometryType::wkbLineString,
            Some(GeometryKind::Polygon) => OGRwkbGeometryType::wkbPolygon,
            Some(GeometryKind::MultiPoint) => OGRwkbGeometryType::wkbMultiPoint,
            Some(GeometryKind::MultiLineString) => OGRwkbGeometryType::wkbMultiLineString,
            Some(GeometryKind::MultiPolygon) => OGRwkbGeometryType::wkbMultiPolygon,
            Some(GeometryKind::GeometryCollection) => OGRwkbGeometryType::wkbGeometryCollection,
            None => OGRwkbGeometryType::wkbUnknown,
        }
    }

    fn field_value(value: &AttributeValue) -> Option<FieldValue> {
        match value {
            AttributeValue::Null => None,
            AttributeValue::Integer(value) => Some(FieldValue::Integer64Value(*value)),
            AttributeValue::Real(value) => Some(FieldValue::RealValue(*value)),
            AttributeValue::Text(value) => Some(FieldValue::StringValue(value.clone())),
        }
    }

    fn exists_error(destination: &Path, layer: &str) -> GeoIoError {
        GeoIoError::DestinationExists {
            destination: destination.display().to_string(),
            layer: layer.to_string(),
        }
    }

    fn create_dataset(
        destination: &Path,
        driver: &DriverInfo,
        options: &VectorWriteOptions,
    ) -> Result<GdalDataset> {
        let gdal_driver = DriverManager::get_driver_by_name(driver.name())?;
        let creation_options = string_list(&options.dataset_options)?;
        Ok(gdal_driver.create_with_band_type_with_options::<u8, _>(
            destination,
            0,
            0,
            0,
            &creation_options,
        )?)
    }

    /// Opens or creates the destination according to the write mode,
    /// returning the dataset and whether an existing layer is being replaced.
    fn prepare_destination(
        destination: &Path,
        layer_name: &str,
        driver: &DriverInfo,
        options: &VectorWriteOptions,
    ) -> Result<(GdalDataset, bool)> {
        if !destination.exists() {
            return Ok((create_dataset(destination, driver, options)?, false));
        }
        let replace_whole = match options.mode {
            WriteMode::Overwrite => true,
            WriteMode::ReplaceLayer => !driver.multi_layer_write(),
            WriteMode::Create => false,
        };
        if replace_whole {
            remove_destination(destination, driver)?;
            return Ok((create_dataset(destination, driver, options)?, false));
        }
        if !driver.multi_layer_write() {
            return Err(exists_error(destination, layer_name));
        }

        let dataset = open_dataset(
            &Source::from(destination),
            driver,
            GdalOpenFlags::GDAL_OF_VECTOR | GdalOpenFlags::GDAL_OF_UPDATE,
            &[],
        )?;
        let layer_exists = dataset.layer_by_name(layer_name).is_ok();
        match (options.mode, layer_exists) {
            (WriteMode::Create, true) => Err(exists_error(destination, layer_name)),
            (_, layer_exists) => Ok((dataset, layer_exists)),
        }
    }

    pub fn encode(
        vector: &VectorDataset,
        destination: &Path,
        driver: &DriverInfo,
        options: &VectorWriteOptions,
    ) -> Result<()> {
        let layer_name = options
            .layer_name
            .clone()
            .unwrap_or_else(|| vector.name().to_string());
        write_layer(vector, destination, &layer_name, driver, options).map_err(|err| {
            err.while_writing(destination, driver.name(), Some(layer_name.as_str()))
        })?;
        info!(
            "wrote {} features to layer {layer_name} of {} ({})",
            vector.len(),
            destination.display(),
            driver.name()
        );
        Ok(())
    }

    fn write_layer(
        vector: &VectorDataset,
        destination: &Path,
        layer_name: &str,
        driver: &DriverInfo,
        options: &VectorWriteOptions,
    ) -> Result<()> {
        let (mut dataset, replacing) =
            prepare_destination(destination, layer_name, driver, options)?;

        let mut layer_options = options.layer_creation_options();
        if replacing {
            layer_options.push("OVERWRITE=YES".to_string());
        }
        let layer_options: Vec<&str> = layer_options.iter().map(String::as_str).collect();
        let srs = vector.crs().to_spatial_ref()?;
        debug!(
            "creating layer {layer_name} in {} with {layer_options:?}",
            destination.display()
        );
        let layer = dataset.create_layer(LayerOptions {
            name: layer_name,
            srs: srs.as_ref(),
            ty: geometry_type(vector.common_kind()),
            options: (!layer_options.is_empty()).then_some(layer_options.as_slice()),
        })?;

        let fields: Vec<(&str, OGRFieldType::Type)> = vector
            .schema()
            .iter()
            .map(|column| (column.name.as_str(), field_type(column.kind)))
            .collect();
        layer.create_defn_fields(&fields)?;

        for feature in vector.features() {
            let mut gdal_feature = GdalFeature::new(layer.defn())?;
            if let Some(geometry) = &feature.geometry {
                gdal_feature.set_geometry(geometry.to_gdal()?)?;
            }
            for (field_index, column) in vector.schema().iter().enumerate() {
                match field_value(feature.attributes.value(&column.name)) {
                    Some(value) => gdal_feature.set_field(field_index, &value)?,
                    None => gdal_feature.set_field_null(field_index)?,
                }
            }
            gdal_feature.create(&layer)?;
        }
        Ok(())
    }
}
