/// Which bands of a raster to read, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandSelection {
    Single(usize),
    All,
}

impl Default for BandSelection {
    fn default() -> Self {
        BandSelection::Single(1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RasterReadOptions {
    pub driver: Option<String>,
    pub bands: BandSelection,
    /// Driver open options as `KEY=VALUE`.
    pub open_options: Vec<String>,
}

impl RasterReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn band(mut self, band: usize) -> Self {
        self.bands = BandSelection::Single(band);
        self
    }

    pub fn all_bands(mut self) -> Self {
        self.bands = BandSelection::All;
        self
    }

    pub fn open_option(mut self, key: &str, value: &str) -> Self {
        self.open_options.push(format!("{key}={value}"));
        self
    }
}

/// Raster decoding through GDAL
pub mod gdal_reader {
    use super::*;
    use gdal::{Dataset as GdalDataset, GdalOpenFlags, Metadata as GdalMetadata};
    use log::{debug, info};
    use ndarray::Array2;

    use crate::{
        components::{
            backends::gdal_backend::{affine_from_gdal, filter_metadata_gdal, open_dataset},
            crs::Crs,
            drivers::DriverInfo,
            raster::{RasterBand, RasterDataset, RasterHeader, RasterSummary},
            source::Source,
        },
        errors::{GeoIoError, Result},
    };

    const IDENTITY: [f64; 6] = [0., 1., 0., 0., 0., 1.];

    fn open_raster(
        source: &Source,
        driver: &DriverInfo,
        options: &RasterReadOptions,
    ) -> Result<GdalDataset> {
        open_dataset(
            source,
            driver,
            GdalOpenFlags::GDAL_OF_RASTER | GdalOpenFlags::GDAL_OF_READONLY,
            &options.open_options,
        )
    }

    fn header_from_gdal(dataset: &GdalDataset) -> RasterHeader {
        let (width, height) = dataset.raster_size();
        let transform = dataset.geo_transform().unwrap_or_else(|err| {
            debug!("no geotransform, using pixel coordinates: {err}");
            IDENTITY
        });
        RasterHeader::new(
            width,
            height,
            affine_from_gdal(transform),
            Crs::from_projection(&dataset.projection()),
        )
    }

    fn band_indexes(
        source: &Source,
        selection: BandSelection,
        available: usize,
    ) -> Result<Vec<usize>> {
        match selection {
            BandSelection::All => Ok((1..=available).collect()),
            BandSelection::Single(index) if index >= 1 && index <= available => Ok(vec![index]),
            BandSelection::Single(index) => Err(GeoIoError::BandIndexOutOfRange {
                locator: source.to_string(),
                requested: index,
                available,
            }),
        }
    }

    pub fn summary(
        source: &Source,
        driver: &DriverInfo,
        options: &RasterReadOptions,
    ) -> Result<RasterSummary> {
        let dataset = open_raster(source, driver, options)?;
        Ok(RasterSummary {
            header: header_from_gdal(&dataset),
            band_count: dataset.raster_count(),
            driver: driver.name().to_string(),
        })
    }

    pub fn decode(
        source: &Source,
        driver: &DriverInfo,
        options: &RasterReadOptions,
    ) -> Result<RasterDataset> {
        let dataset = open_raster(source, driver, options)?;
        let header = header_from_gdal(&dataset);
        let (width, height) = (header.width, header.height);
        let indexes = band_indexes(source, options.bands, dataset.raster_count())?;

        let mut raster = RasterDataset::new(header);
        for index in indexes {
            let band = dataset.rasterband(index)?;
            let buffer = band
                .read_as::<f64>((0, 0), (width, height), (width, height), None)
                .map_err(|err| {
                    GeoIoError::parse(source, driver.name(), format!("band {index}: {err}"))
                })?;
            let values = Array2::from_shape_vec((height, width), buffer.data().to_vec())?;
            let mut decoded = RasterBand::new(values);
            decoded.description = band.description().unwrap_or_default();
            decoded.no_data = band.no_data_value();
            raster.push_band(decoded)?;
        }
        raster.set_metadata(filter_metadata_gdal(&dataset));

        info!(
            "read {} band(s) of {width}x{height} from {source} ({})",
            raster.band_count(),
            driver.name()
        );
        Ok(raster)
    }

}
