use std::path::Path;

use image::GrayAlphaImage;
use log::info;
use rayon::prelude::*;

use crate::{
    components::raster::{RasterBand, RasterDataset},
    errors::{GeoIoError, Result},
};

/// Linear stretch of a band between its finite min and max.
struct Stretch {
    min: f64,
    span: f64,
}

impl Stretch {
    fn of(band: &RasterBand) -> Option<Self> {
        band.range().map(|(min, max)| Self {
            min,
            span: max - min,
        })
    }

    fn shade(&self, band: &RasterBand, value: f64) -> [u8; 2] {
        if !value.is_finite() || band.is_no_data(value) {
            return [0, 0];
        }
        let level = if self.span > 0. {
            ((value - self.min) / self.span * 255.).round()
        } else {
            0.
        };
        [level.clamp(0., 255.) as u8, u8::MAX]
    }
}

/// Grey levels and alpha for every cell, row by row.
pub(crate) fn shade_band(band: &RasterBand) -> Vec<u8> {
    let Some(stretch) = Stretch::of(band) else {
        return vec![0; band.values.len() * 2];
    };
    let cells: Vec<f64> = band.values.iter().copied().collect();
    cells
        .par_iter()
        .flat_map_iter(|value| stretch.shade(band, *value))
        .collect()
}

/// Writes band `band_index` (1-based) as a grey + alpha quick-look image.
///
/// The image format follows the destination extension. No-data and
/// non-finite cells are transparent.
pub fn render_band(
    dataset: &RasterDataset,
    band_index: usize,
    destination: impl AsRef<Path>,
) -> Result<()> {
    let destination = destination.as_ref();
    let band = dataset.band(band_index)?;
    let (height, width) = dataset.header().shape();
    let pixels = shade_band(band);
    let image = GrayAlphaImage::from_raw(width as u32, height as u32, pixels).ok_or_else(|| {
        GeoIoError::HeaderMismatch {
            band: band_index,
            found: band.values.dim(),
            expected: (height, width),
        }
    })?;
    image.save(destination)?;
    info!(
        "rendered band {band_index} ({width}x{height}) to {}",
        destination.display()
    );
    Ok(())
}
