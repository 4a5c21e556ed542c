pub mod reader;
pub mod wkt;
pub mod writer;

use std::{collections::HashMap, fmt::Display, path::Path};

use geo::{BoundingRect, Geometry, Rect};
use shrinkwraprs::Shrinkwrap;

use crate::{
    components::{codec::VectorCodec, crs::Crs, drivers::DriverInfo, source::Source},
    errors::{GeoIoError, Result},
};

pub use reader::{LayerSelector, VectorReadOptions};
pub use writer::{GeometryEncoding, VectorWriteOptions, WriteMode};

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(value) => Some(*value as f64),
            AttributeValue::Real(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Integer(value.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Real(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttributeValue::Null, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    /// Values are [AttributeValue::Text] in `YYYY-MM-DD` form.
    Date,
    /// Values are [AttributeValue::Text] in RFC 3339 form.
    DateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered attribute columns shared by every feature of a dataset.
#[derive(Shrinkwrap, Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema(Vec<Column>);

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self(columns)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|column| column.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|column| column.name.as_str()).collect()
    }
}

impl FromIterator<Column> for Schema {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Attribute row of one feature, keyed by column name.
#[derive(Shrinkwrap, Debug, Clone, Default, PartialEq)]
#[shrinkwrap(mutable, unsafe_ignore_visibility)]
pub struct Record(HashMap<String, AttributeValue>);

impl Record {
    pub fn value(&self, column: &str) -> &AttributeValue {
        self.0.get(column).unwrap_or(&AttributeValue::Null)
    }
}

impl FromIterator<(String, AttributeValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub attributes: Record,
}

impl Feature {
    pub fn new(geometry: impl Into<Option<Geometry<f64>>>) -> Self {
        Self {
            geometry: geometry.into(),
            attributes: Record::default(),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(column.into(), value.into());
        self
    }

    pub fn kind(&self) -> Option<GeometryKind> {
        self.geometry.as_ref().map(GeometryKind::of)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    pub fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Line(_) | Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
                GeometryKind::Polygon
            }
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    /// Single-part kind of a multi-part kind, itself otherwise.
    pub fn single(self) -> Self {
        match self {
            GeometryKind::MultiPoint => GeometryKind::Point,
            GeometryKind::MultiLineString => GeometryKind::LineString,
            GeometryKind::MultiPolygon => GeometryKind::Polygon,
            other => other,
        }
    }
}

impl Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Features sharing one CRS and one [Schema].
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDataset {
    name: String,
    crs: Crs,
    schema: Schema,
    features: Vec<Feature>,
}

impl VectorDataset {
    pub fn new(name: impl Into<String>, crs: Crs, schema: Schema) -> Self {
        Self {
            name: name.into(),
            crs,
            schema,
            features: Vec::new(),
        }
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = Feature>) -> Result<Self> {
        for feature in features {
            self.push(feature)?;
        }
        Ok(self)
    }

    /// Appends a feature, filling columns it lacks with [AttributeValue::Null].
    pub fn push(&mut self, mut feature: Feature) -> Result<()> {
        if let Some(column) = feature
            .attributes
            .keys()
            .find(|column| !self.schema.contains(column))
        {
            return Err(GeoIoError::SchemaMismatch {
                feature: self.features.len(),
                column: column.clone(),
            });
        }
        for column in self.schema.iter() {
            feature
                .attributes
                .entry(column.name.clone())
                .or_insert(AttributeValue::Null);
        }
        self.features.push(feature);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.names()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn geometry_kinds(&self) -> Vec<Option<GeometryKind>> {
        self.features.iter().map(Feature::kind).collect()
    }

    /// Kind shared by every geometry, `None` when mixed or empty.
    pub fn common_kind(&self) -> Option<GeometryKind> {
        let mut kinds = self.features.iter().filter_map(Feature::kind);
        let first = kinds.next()?;
        kinds.all(|kind| kind == first).then_some(first)
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(|feature| feature.geometry.as_ref()?.bounding_rect())
            .reduce(|acc, rect| {
                Rect::new(
                    (acc.min().x.min(rect.min().x), acc.min().y.min(rect.min().y)),
                    (acc.max().x.max(rect.max().x), acc.max().y.max(rect.max().y)),
                )
            })
    }
}

/// Codec for every vector driver GDAL provides.
#[derive(Debug, Default, Clone, Copy)]
pub struct GdalVectorCodec;

impl VectorCodec for GdalVectorCodec {
    fn layer_names(
        &self,
        source: &Source,
        driver: &DriverInfo,
        options: &VectorReadOptions,
    ) -> Result<Vec<String>> {
        reader::gdal_reader::layer_names(source, driver, options)
    }

    fn decode(
        &self,
        source: &Source,
        driver: &DriverInfo,
        options: &VectorReadOptions,
    ) -> Result<VectorDataset> {
        reader::gdal_reader::decode(source, driver, options)
    }

    fn encode(
        &self,
        dataset: &VectorDataset,
        destination: &Path,
        driver: &DriverInfo,
        options: &VectorWriteOptions,
    ) -> Result<()> {
        writer::gdal_writer::encode(dataset, destination, driver, options)
    }
}
