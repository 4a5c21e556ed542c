use std::fmt::Display;

/// Cell type of the written file. Values are cast with `as` semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageType {
    /// 0 for zero cells, 1 otherwise.
    Bit1,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    #[default]
    Float32,
    Float64,
}

impl Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageType::Bit1 => "Bit1",
            StorageType::Int8 => "Int8",
            StorageType::UInt8 => "UInt8",
            StorageType::Int16 => "Int16",
            StorageType::UInt16 => "UInt16",
            StorageType::Int32 => "Int32",
            StorageType::UInt32 => "UInt32",
            StorageType::Float32 => "Float32",
            StorageType::Float64 => "Float64",
        };
        f.write_str(name)
    }
}

/// GTiff compression codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Lzw,
    Deflate,
    PackBits,
}

impl Compression {
    fn creation_option(self) -> &'static str {
        match self {
            Compression::Lzw => "COMPRESS=LZW",
            Compression::Deflate => "COMPRESS=DEFLATE",
            Compression::PackBits => "COMPRESS=PACKBITS",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RasterWriteOptions {
    pub driver: Option<String>,
    pub storage: StorageType,
    /// Creation options as `KEY=VALUE`, passed through unchanged.
    pub creation_options: Vec<String>,
    pub overwrite: bool,
}

impl RasterWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn storage(mut self, storage: StorageType) -> Self {
        self.storage = storage;
        self
    }

    pub fn creation_option(mut self, key: &str, value: &str) -> Self {
        self.creation_options.push(format!("{key}={value}"));
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.creation_options
            .push(compression.creation_option().to_string());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    fn creation_options_for(&self, driver: &str) -> Vec<String> {
        let mut options = self.creation_options.clone();
        let has_nbits = options
            .iter()
            .any(|option| option.to_ascii_uppercase().starts_with("NBITS="));
        let gtiff = driver.eq_ignore_ascii_case("GTiff");
        if self.storage == StorageType::Bit1 && gtiff && !has_nbits {
            options.push("NBITS=1".to_string());
        }
        options
    }
}

/// Raster encoding through GDAL
pub mod gdal_writer {
    use std::path::Path;

    use gdal::{
        raster::{Buffer, GdalType},
        Dataset as GdalDataset, DriverManager, Metadata as GdalMetadata,
    };
    use log::{debug, info};
    use num_traits::AsPrimitive;

    use super::*;
    use crate::{
        components::{
            backends::gdal_backend::{affine_to_gdal, remove_destination, string_list},
            drivers::DriverInfo,
            raster::RasterDataset,
        },
        errors::{GeoIoError, Result},
    };

    const STAGING_DRIVER: &str = "MEM";

    fn stage<T>(raster: &RasterDataset, convert: impl Fn(f64) -> T) -> Result<GdalDataset>
    where
        T: GdalType + Copy,
    {
        let header = raster.header();
        let (width, height) = (header.width, header.height);
        let staging = DriverManager::get_driver_by_name(STAGING_DRIVER)?;
        let mut dataset =
            staging.create_with_band_type::<T, _>("", width, height, raster.band_count())?;

        dataset.set_geo_transform(&affine_to_gdal(&header.transform))?;
        if let Some(srs) = header.crs.to_spatial_ref()? {
            dataset.set_projection(&srs.to_wkt()?)?;
        }
        for (key, value) in raster.metadata() {
            dataset.set_metadata_item(key, value, "")?;
        }

        for (index, band) in raster.bands().iter().enumerate() {
            let mut gdal_band = dataset.rasterband(index + 1)?;
            let data: Vec<T> = band.values.iter().map(|value| convert(*value)).collect();
            let mut buffer = Buffer::new((width, height), data);
            gdal_band.write((0, 0), (width, height), &mut buffer)?;
            if let Some(no_data) = band.no_data {
                gdal_band.set_no_data_value(Some(no_data))?;
            }
            if !band.description.is_empty() {
                gdal_band.set_description(&band.description)?;
            }
        }
        Ok(dataset)
    }

    fn cast<T>(raster: &RasterDataset) -> Result<GdalDataset>
    where
        T: GdalType + Copy + 'static,
        f64: AsPrimitive<T>,
    {
        stage::<T>(raster, |value| value.as_())
    }

    fn staged(raster: &RasterDataset, storage: StorageType) -> Result<GdalDataset> {
        match storage {
            StorageType::Bit1 => stage::<u8>(raster, |value| u8::from(value != 0.0)),
            StorageType::Int8 => cast::<i8>(raster),
            StorageType::UInt8 => cast::<u8>(raster),
            StorageType::Int16 => cast::<i16>(raster),
            StorageType::UInt16 => cast::<u16>(raster),
            StorageType::Int32 => cast::<i32>(raster),
            StorageType::UInt32 => cast::<u32>(raster),
            StorageType::Float32 => cast::<f32>(raster),
            StorageType::Float64 => cast::<f64>(raster),
        }
    }

    pub fn encode(
        raster: &RasterDataset,
        destination: &Path,
        driver: &DriverInfo,
        options: &RasterWriteOptions,
    ) -> Result<()> {
        if destination.exists() {
            if !options.overwrite {
                return Err(GeoIoError::DestinationExists {
                    destination: destination.display().to_string(),
                    layer: "raster".to_string(),
                });
            }
            remove_destination(destination, driver)
                .map_err(|err| err.while_writing(destination, driver.name(), None))?;
        }
        copy_staged(raster, destination, driver, options)
            .map_err(|err| err.while_writing(destination, driver.name(), None))?;

        info!(
            "wrote {} band(s) as {} to {} ({})",
            raster.band_count(),
            options.storage,
            destination.display(),
            driver.name()
        );
        Ok(())
    }

    fn copy_staged(
        raster: &RasterDataset,
        destination: &Path,
        driver: &DriverInfo,
        options: &RasterWriteOptions,
    ) -> Result<()> {
        let staged = staged(raster, options.storage)?;
        let target = DriverManager::get_driver_by_name(driver.name())?;
        let creation_options = options.creation_options_for(driver.name());
        debug!(
            "copying {} staged band(s) to {} with {creation_options:?}",
            raster.band_count(),
            driver.name()
        );
        staged.create_copy(&target, destination, &string_list(&creation_options)?)?;
        Ok(())
    }
}
