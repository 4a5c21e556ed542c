use std::{
    cmp::Reverse,
    fmt::Display,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;

use crate::{
    components::{
        codec::{RasterCodec, VectorCodec},
        raster::GdalRasterCodec,
        source::Source,
        vector::{wkt::WktCodec, GdalVectorCodec},
    },
    errors::{GeoIoError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Vector,
    Raster,
}

impl Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverKind::Vector => f.write_str("vector"),
            DriverKind::Raster => f.write_str("raster"),
        }
    }
}

/// Static description of a driver: what it is called and which locators it claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverInfo {
    name: String,
    extensions: Vec<String>,
    prefixes: Vec<String>,
    sidecars: Vec<String>,
    priority: i32,
    multi_layer_write: bool,
}

impl DriverInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extensions: Vec::new(),
            prefixes: Vec::new(),
            sidecars: Vec::new(),
            priority: 0,
            multi_layer_write: false,
        }
    }

    pub fn with_extensions<const N: usize>(mut self, extensions: [&str; N]) -> Self {
        self.extensions
            .extend(extensions.iter().map(|ext| ext.to_ascii_lowercase()));
        self
    }

    /// Connection string prefixes, e.g. `PG:`.
    pub fn with_prefixes<const N: usize>(mut self, prefixes: [&str; N]) -> Self {
        self.prefixes.extend(prefixes.iter().map(|p| p.to_string()));
        self
    }

    /// Extensions of companion files that belong to a destination and are
    /// removed with it, e.g. `dbf` for a shapefile.
    pub fn with_sidecars<const N: usize>(mut self, sidecars: [&str; N]) -> Self {
        self.sidecars.extend(sidecars.iter().map(|s| s.to_string()));
        self
    }

    /// Higher wins when several drivers claim the same extension.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether new layers can be added to an existing file.
    pub fn with_multi_layer_write(mut self, multi_layer_write: bool) -> Self {
        self.multi_layer_write = multi_layer_write;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn multi_layer_write(&self) -> bool {
        self.multi_layer_write
    }

    fn claims_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|ext| ext == extension)
    }

    fn claims_prefix(&self, locator: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            locator
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
    }

    /// The destination itself followed by every companion file that exists.
    pub fn destination_files(&self, destination: &Path) -> Vec<PathBuf> {
        let mut files = vec![destination.to_path_buf()];
        files.extend(
            self.sidecars
                .iter()
                .map(|sidecar| destination.with_extension(sidecar)),
        );
        let mut aux = destination.as_os_str().to_owned();
        aux.push(".aux.xml");
        files.push(PathBuf::from(aux));
        files.retain(|file| file.exists());
        files.dedup();
        files
    }
}

/// Registry entry pairing a [DriverInfo] with its codecs.
#[derive(Debug, Clone)]
pub struct DriverEntry {
    info: DriverInfo,
    vector: Option<Arc<dyn VectorCodec>>,
    raster: Option<Arc<dyn RasterCodec>>,
}

impl DriverEntry {
    pub fn new(info: DriverInfo) -> Self {
        Self {
            info,
            vector: None,
            raster: None,
        }
    }

    pub fn with_vector(mut self, codec: Arc<dyn VectorCodec>) -> Self {
        self.vector = Some(codec);
        self
    }

    pub fn with_raster(mut self, codec: Arc<dyn RasterCodec>) -> Self {
        self.raster = Some(codec);
        self
    }

    pub fn info(&self) -> &DriverInfo {
        &self.info
    }

    pub fn supports(&self, kind: DriverKind) -> bool {
        match kind {
            DriverKind::Vector => self.vector.is_some(),
            DriverKind::Raster => self.raster.is_some(),
        }
    }
}

/// Driver picked for one locator.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedDriver<'a> {
    entry: &'a DriverEntry,
}

impl<'a> ResolvedDriver<'a> {
    pub fn name(&self) -> &'a str {
        self.entry.info.name()
    }

    pub fn info(&self) -> &'a DriverInfo {
        &self.entry.info
    }

    pub(crate) fn vector(&self) -> Option<&'a dyn VectorCodec> {
        self.entry.vector.as_deref()
    }

    pub(crate) fn raster(&self) -> Option<&'a dyn RasterCodec> {
        self.entry.raster.as_deref()
    }
}

/// Maps locators and driver names to codecs.
///
/// Resolution order: explicit driver name, inline text, connection prefix,
/// folder of shapefiles, file extension. When several drivers claim an
/// extension the highest priority wins, then the earliest registered.
#[derive(Debug, Clone)]
pub struct DriverRegistry {
    entries: Vec<DriverEntry>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DriverRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn builtin() -> Self {
        let gdal_vector: Arc<dyn VectorCodec> = Arc::new(GdalVectorCodec);
        let gdal_raster: Arc<dyn RasterCodec> = Arc::new(GdalRasterCodec);
        let vector = |info: DriverInfo| DriverEntry::new(info).with_vector(Arc::clone(&gdal_vector));
        let raster = |info: DriverInfo| DriverEntry::new(info).with_raster(Arc::clone(&gdal_raster));

        let mut registry = Self::empty();
        registry
            .register(
                vector(
                    DriverInfo::new("ESRI Shapefile")
                        .with_extensions(["shp"])
                        .with_sidecars(["shx", "dbf", "prj", "cpg", "qix", "sbn", "sbx"]),
                ),
            )
            .register(vector(
                DriverInfo::new("GeoJSON").with_extensions(["geojson", "json"]),
            ))
            .register(vector(DriverInfo::new("KML").with_extensions(["kml"])))
            .register(vector(DriverInfo::new("GPX").with_extensions(["gpx"])))
            .register(vector(
                DriverInfo::new("CSV")
                    .with_extensions(["csv"])
                    .with_sidecars(["csvt", "prj"]),
            ))
            .register(
                DriverEntry::new(
                    DriverInfo::new("GPKG")
                        .with_extensions(["gpkg"])
                        .with_sidecars(["gpkg-wal", "gpkg-shm"])
                        .with_multi_layer_write(true),
                )
                .with_vector(Arc::clone(&gdal_vector))
                .with_raster(Arc::clone(&gdal_raster)),
            )
            .register(vector(
                DriverInfo::new("SQLite")
                    .with_extensions(["sqlite", "db"])
                    .with_multi_layer_write(true),
            ))
            .register(vector(
                DriverInfo::new("GML")
                    .with_extensions(["gml"])
                    .with_sidecars(["xsd", "gfs"]),
            ))
            .register(vector(DriverInfo::new("PostgreSQL").with_prefixes(["PG:"])))
            .register(vector(DriverInfo::new("WFS").with_prefixes(["WFS:"])))
            .register(
                DriverEntry::new(DriverInfo::new("WKT").with_extensions(["wkt"]))
                    .with_vector(Arc::new(WktCodec)),
            )
            .register(raster(
                DriverInfo::new("GTiff").with_extensions(["tif", "tiff"]),
            ))
            .register(raster(
                DriverInfo::new("AAIGrid")
                    .with_extensions(["asc"])
                    .with_sidecars(["prj"]),
            ))
            .register(raster(
                DriverInfo::new("RRASTER")
                    .with_extensions(["grd", "gri"])
                    .with_sidecars(["grd", "gri"])
                    .with_priority(10),
            ))
            .register(raster(DriverInfo::new("GSAG").with_extensions(["grd"])));
        registry
    }

    pub fn register(&mut self, entry: DriverEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = &DriverEntry> {
        self.entries.iter()
    }

    pub fn by_name(&self, name: &str, kind: DriverKind) -> Option<ResolvedDriver<'_>> {
        self.entries
            .iter()
            .find(|entry| entry.info.name.eq_ignore_ascii_case(name) && entry.supports(kind))
            .map(|entry| ResolvedDriver { entry })
    }

    pub fn by_extension(&self, extension: &str, kind: DriverKind) -> Option<ResolvedDriver<'_>> {
        let extension = extension.to_ascii_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.supports(kind) && entry.info.claims_extension(&extension))
            .min_by_key(|(index, entry)| (Reverse(entry.info.priority), *index))
            .map(|(_, entry)| ResolvedDriver { entry })
    }

    fn by_prefix(&self, locator: &str, kind: DriverKind) -> Option<ResolvedDriver<'_>> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.supports(kind) && entry.info.claims_prefix(locator))
            .min_by_key(|(index, entry)| (Reverse(entry.info.priority), *index))
            .map(|(_, entry)| ResolvedDriver { entry })
    }

    pub fn resolve(
        &self,
        source: &Source,
        kind: DriverKind,
        explicit: Option<&str>,
    ) -> Result<ResolvedDriver<'_>> {
        let resolved = match explicit {
            Some(name) => self.by_name(name, kind),
            None => match source {
                Source::Inline(_) if source.is_inline_json() => self.by_name("GeoJSON", kind),
                Source::Inline(_) => self.by_name("WKT", kind),
                Source::Connection(connection) => self.by_prefix(connection, kind),
                Source::Path(path) if path.is_dir() => {
                    folder_extension(path).and_then(|ext| self.by_extension(&ext, kind))
                }
                _ => source
                    .extension()
                    .and_then(|ext| self.by_extension(&ext, kind)),
            },
        };
        match resolved {
            Some(driver) => {
                debug!("resolved {kind} driver {} for {source}", driver.name());
                Ok(driver)
            }
            None => Err(GeoIoError::UnsupportedFormat {
                locator: match explicit {
                    Some(name) => format!("{source} (driver {name})"),
                    None => source.to_string(),
                },
                kind: kind.to_string(),
            }),
        }
    }
}

/// A folder source is read as a shapefile collection when it holds any.
fn folder_extension(path: &Path) -> Option<String> {
    std::fs::read_dir(path)
        .ok()?
        .filter_map(|entry| entry.ok())
        .any(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"))
        })
        .then(|| "shp".to_string())
}
