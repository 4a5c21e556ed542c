/// Helpers shared by the gdal codecs
pub mod gdal_backend {
    use std::{collections::HashMap, path::Path};

    use gdal::{
        cpl::CslStringList, Dataset as GdalDataset, DatasetOptions, GdalOpenFlags,
        Metadata as GdalMetadata, MetadataEntry as GdalMetadataEntry,
    };
    use geo::AffineTransform;
    use log::debug;

    use crate::{
        components::{drivers::DriverInfo, source::Source},
        errors::{GeoIoError, Result},
    };

    pub fn affine_from_gdal(gdal_transform: [f64; 6]) -> AffineTransform {
        AffineTransform::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        )
    }

    pub fn affine_to_gdal(transform: &AffineTransform) -> [f64; 6] {
        [
            transform.xoff(),
            transform.a(),
            transform.b(),
            transform.yoff(),
            transform.d(),
            transform.e(),
        ]
    }

    pub fn filter_metadata_gdal(metadata: &impl GdalMetadata) -> HashMap<String, String> {
        GdalMetadata::metadata(metadata)
            .filter_map(|GdalMetadataEntry { domain, key, value }| {
                if domain.eq("") {
                    Some((key, value))
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn string_list(items: &[String]) -> Result<CslStringList> {
        let mut list = CslStringList::new();
        for item in items {
            list.add_string(item)?;
        }
        Ok(list)
    }

    /// Opens `source` restricted to `driver`.
    ///
    /// A missing local path or an unreachable remote/connection locator is
    /// [GeoIoError::SourceNotFound]; an existing file GDAL cannot decode is
    /// [GeoIoError::ParseError].
    pub fn open_dataset(
        source: &Source,
        driver: &DriverInfo,
        open_flags: GdalOpenFlags,
        open_options: &[String],
    ) -> Result<GdalDataset> {
        if let Some(path) = source.as_path() {
            if !path.exists() {
                return Err(GeoIoError::SourceNotFound {
                    locator: source.to_string(),
                    reason: "no such file or directory".to_string(),
                });
            }
        }
        let allowed_drivers = [driver.name()];
        let open_options: Vec<&str> = open_options.iter().map(String::as_str).collect();
        let options = DatasetOptions {
            open_flags,
            allowed_drivers: Some(allowed_drivers.as_slice()),
            open_options: (!open_options.is_empty()).then_some(open_options.as_slice()),
            ..Default::default()
        };
        debug!("opening {source} with {} {open_options:?}", driver.name());
        GdalDataset::open_ex(source.gdal_path(), options).map_err(|err| match source {
            Source::Path(_) | Source::Inline(_) => GeoIoError::parse(source, driver.name(), err),
            Source::Url(_) | Source::Connection(_) => GeoIoError::SourceNotFound {
                locator: source.to_string(),
                reason: err.to_string(),
            },
        })
    }

    /// Removes `destination` together with the companion files of its driver.
    pub fn remove_destination(destination: &Path, driver: &DriverInfo) -> Result<()> {
        for file in driver.destination_files(destination) {
            debug!("removing {}", file.display());
            if file.is_dir() {
                std::fs::remove_dir_all(&file)?;
            } else {
                std::fs::remove_file(&file)?;
            }
        }
        Ok(())
    }

}
