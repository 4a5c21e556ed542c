#![allow(dead_code)]

use geo::{point, polygon, Geometry};
use geoio::{
    Column, ColumnType, Crs, Feature, RasterBand, RasterDataset, RasterHeader, Schema,
    VectorDataset,
};
use ndarray::Array2;
use rstest::fixture;
use tempfile::TempDir;

#[fixture]
pub fn scratch() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Whether the linked GDAL was built with `driver`.
pub fn has_driver(driver: &str) -> bool {
    let available = gdal::DriverManager::get_driver_by_name(driver).is_ok();
    if !available {
        log::warn!("GDAL driver {driver} unavailable, skipping");
    }
    available
}

pub fn country_schema() -> Schema {
    Schema::new(vec![
        Column::new("name", ColumnType::Text),
        Column::new("iso_a3", ColumnType::Text),
        Column::new("pop_est", ColumnType::Integer),
        Column::new("gdp_md", ColumnType::Real),
    ])
}

/// `n` one-degree squares laid out row by row from the antimeridian.
pub fn countries(n: usize) -> VectorDataset {
    let features = (0..n).map(|i| {
        let x = -180.0 + (i % 360) as f64;
        let y = -80.0 + (i / 360) as f64;
        let square = polygon![
            (x: x, y: y),
            (x: x + 1.0, y: y),
            (x: x + 1.0, y: y + 1.0),
            (x: x, y: y + 1.0),
            (x: x, y: y),
        ];
        Feature::new(Geometry::Polygon(square))
            .with("name", format!("Country {i}"))
            .with("iso_a3", format!("C{i:02}"))
            .with("pop_est", 1_000 * i as i64)
            .with("gdp_md", i as f64 * 1.5)
    });
    VectorDataset::new("countries", Crs::Epsg(4326), country_schema())
        .with_features(features)
        .unwrap()
}

pub fn cities(crs: Crs) -> VectorDataset {
    let schema = Schema::new(vec![
        Column::new("name", ColumnType::Text),
        Column::new("pop", ColumnType::Integer),
    ]);
    VectorDataset::new("cities", crs, schema)
        .with_features([
            Feature::new(Geometry::Point(point!(x: 2.35, y: 48.86)))
                .with("name", "Paris")
                .with("pop", 2_102_650),
            Feature::new(Geometry::Point(point!(x: 139.69, y: 35.69)))
                .with("name", "Tokyo")
                .with("pop", 13_960_000),
            Feature::new(Geometry::Point(point!(x: -43.2, y: -22.91)))
                .with("name", "Rio de Janeiro")
                .with("pop", 6_748_000),
        ])
        .unwrap()
}

/// `bands` bands of `width` x `height` cells; band `b` holds `b * 100 + cell index`.
pub fn grid(width: usize, height: usize, bands: usize) -> RasterDataset {
    let header = RasterHeader::north_up(width, height, (135.0, 36.0), (0.01, 0.01), Crs::Epsg(4326));
    let bands = (1..=bands).map(|band| {
        let values = Array2::from_shape_fn((height, width), |(row, col)| {
            (band * 100 + row * width + col) as f64
        });
        RasterBand::new(values).with_description(format!("band {band}"))
    });
    RasterDataset::from_bands(header, bands).unwrap()
}
