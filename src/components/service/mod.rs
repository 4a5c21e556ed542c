//! Blocking client for OGC Web Feature and Web Coverage Services.
//!
//! Every response body is streamed to a temporary directory, decoded with the
//! driver its output format implies and removed before the call returns.

pub mod capabilities;
pub mod config;
mod download;

use std::{fmt::Display, time::Duration};

use itertools::Itertools;
use log::{debug, info};
use reqwest::{blocking::Client, Url};

use crate::{
    components::{
        codec::Decoded,
        raster::{RasterDataset, RasterReadOptions},
        source::Source,
        vector::{VectorDataset, VectorReadOptions},
    },
    errors::{GeoIoError, Result},
    geoio::GeoIo,
};

pub use capabilities::{Capabilities, LayerSummary};
pub use config::ServiceConfig;

use capabilities::{parse_document, OwsDocument};
use download::{status_message, Download};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Wfs,
    Wcs,
}

impl ServiceKind {
    pub fn default_version(self) -> &'static str {
        match self {
            ServiceKind::Wfs => "1.1.0",
            ServiceKind::Wcs => "2.0.1",
        }
    }
}

impl Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::Wfs => f.write_str("WFS"),
            ServiceKind::Wcs => f.write_str("WCS"),
        }
    }
}

/// WFS `GetFeature` parameters.
#[derive(Debug, Clone, Default)]
pub struct FeatureQuery {
    pub type_name: String,
    pub cql_filter: Option<String>,
    pub max_features: Option<usize>,
    /// GML when unset.
    pub output_format: Option<String>,
    pub srs_name: Option<String>,
}

impl FeatureQuery {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn cql_filter(mut self, filter: impl Into<String>) -> Self {
        self.cql_filter = Some(filter.into());
        self
    }

    pub fn max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn output_format(mut self, output_format: impl Into<String>) -> Self {
        self.output_format = Some(output_format.into());
        self
    }

    pub fn srs_name(mut self, srs_name: impl Into<String>) -> Self {
        self.srs_name = Some(srs_name.into());
        self
    }

    /// Driver and file extension for the response body.
    fn response_driver(&self) -> (&'static str, &'static str) {
        let format = self
            .output_format
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if format.contains("json") {
            ("GeoJSON", "geojson")
        } else if format.contains("csv") {
            ("CSV", "csv")
        } else {
            ("GML", "gml")
        }
    }
}

/// Axis range of a WCS 2.0 `subset` parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Subset {
    pub axis: String,
    pub low: f64,
    pub high: f64,
}

impl Display for Subset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({},{})", self.axis, self.low, self.high)
    }
}

/// WCS `GetCoverage` parameters.
///
/// `subsets` drive 2.x requests; 1.x servers expect `bbox`, `crs` and,
/// for 1.0, the output `size`.
#[derive(Debug, Clone)]
pub struct CoverageQuery {
    pub coverage_id: String,
    pub format: String,
    pub subsets: Vec<Subset>,
    /// `[min_x, min_y, max_x, max_y]` in `crs`.
    pub bbox: Option<[f64; 4]>,
    /// Authority code such as `EPSG:4326`; WGS 84 when unset.
    pub crs: Option<String>,
    /// Output width and height in cells.
    pub size: Option<(usize, usize)>,
}

impl CoverageQuery {
    pub fn new(coverage_id: impl Into<String>) -> Self {
        Self {
            coverage_id: coverage_id.into(),
            format: "image/tiff".to_string(),
            subsets: Vec::new(),
            bbox: None,
            crs: None,
            size: None,
        }
    }

    pub fn bbox(mut self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        self.bbox = Some([min_x, min_y, max_x, max_y]);
        self
    }

    pub fn crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.size = Some((width, height));
        self
    }

    fn crs_code(&self) -> &str {
        self.crs.as_deref().unwrap_or("EPSG:4326")
    }

    /// `EPSG:4326` as `urn:ogc:def:crs:EPSG::4326`.
    fn crs_urn(&self) -> String {
        let code = self.crs_code();
        match code.split_once(':') {
            Some((authority, number)) if !code.starts_with("urn:") => {
                format!("urn:ogc:def:crs:{authority}::{number}")
            }
            _ => code.to_string(),
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn subset(mut self, axis: impl Into<String>, low: f64, high: f64) -> Self {
        self.subsets.push(Subset {
            axis: axis.into(),
            low,
            high,
        });
        self
    }

    fn response_driver(&self) -> (&'static str, &'static str) {
        let format = self.format.to_ascii_lowercase();
        if format.contains("aaigrid") || format.contains("ascii") {
            ("AAIGrid", "asc")
        } else {
            ("GTiff", "tif")
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebServiceClient {
    base_url: Url,
    kind: ServiceKind,
    version: String,
    config: ServiceConfig,
    http: Client,
    io: GeoIo,
}

impl WebServiceClient {
    pub fn new(base_url: &str, kind: ServiceKind, config: &ServiceConfig) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| GeoIoError::network(base_url, format!("invalid URL: {err}")))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|err| GeoIoError::network(&base_url, err))?;
        Ok(Self {
            base_url,
            kind,
            version: kind.default_version().to_string(),
            config: config.clone(),
            http,
            io: GeoIo::default(),
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Decodes responses with `io` instead of the built-in drivers.
    pub fn with_io(mut self, io: GeoIo) -> Self {
        self.io = io;
        self
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn is_version_1(&self) -> bool {
        self.version.starts_with("1.")
    }

    fn request_url(&self, request: &str, params: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("service", &self.kind.to_string())
            .append_pair("version", &self.version)
            .append_pair("request", request)
            .extend_pairs(params.iter().map(|(key, value)| (*key, value.as_str())));
        url
    }

    pub fn capabilities_url(&self) -> Url {
        self.request_url("GetCapabilities", &[])
    }

    pub fn get_capabilities(&self) -> Result<Capabilities> {
        let url = self.capabilities_url();
        debug!("GET {url}");
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|err| GeoIoError::network(&url, err))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| GeoIoError::network(&url, err))?;
        if status.is_client_error() || status.is_server_error() {
            return Err(GeoIoError::service(&url, status_message(status, &body)));
        }
        match parse_document(&body).map_err(|message| GeoIoError::service(&url, message))? {
            OwsDocument::Exception(message) => Err(GeoIoError::service(&url, message)),
            OwsDocument::Capabilities(capabilities) => {
                info!(
                    "{} {} at {} offers {} layer(s)",
                    self.kind,
                    capabilities.version,
                    self.base_url,
                    capabilities.layers.len()
                );
                Ok(capabilities)
            }
        }
    }

    fn check_offered(&self, name: &str) -> Result<()> {
        let capabilities = self.get_capabilities()?;
        if capabilities.layer(name).is_none() {
            return Err(GeoIoError::UnknownType {
                url: self.base_url.to_string(),
                type_name: name.to_string(),
                available: capabilities.layer_names().iter().join(", "),
            });
        }
        Ok(())
    }

    pub fn feature_url(&self, query: &FeatureQuery) -> Url {
        let (type_key, count_key) = if self.is_version_1() {
            ("typeName", "maxFeatures")
        } else {
            ("typeNames", "count")
        };
        let mut params = vec![(type_key, query.type_name.clone())];
        if let Some(max_features) = query.max_features {
            params.push((count_key, max_features.to_string()));
        }
        if let Some(filter) = &query.cql_filter {
            params.push(("cql_filter", filter.clone()));
        }
        if let Some(format) = &query.output_format {
            params.push(("outputFormat", format.clone()));
        }
        if let Some(srs_name) = &query.srs_name {
            params.push(("srsName", srs_name.clone()));
        }
        self.request_url("GetFeature", &params)
    }

    pub fn get_features(&self, query: &FeatureQuery) -> Result<Decoded<VectorDataset>> {
        self.check_offered(&query.type_name)?;
        let url = self.feature_url(query);
        let (driver, extension) = query.response_driver();
        let download = Download::fetch(
            &self.http,
            url.as_str(),
            &format!("features.{extension}"),
            self.config.scratch_dir.as_deref(),
        )?;
        let mut decoded = self.io.read_vector(
            Source::from(download.path()),
            &VectorReadOptions::new().driver(driver),
        )?;
        decoded.dataset.set_name(query.type_name.as_str());
        info!(
            "fetched {} features of {} from {}",
            decoded.dataset.len(),
            query.type_name,
            self.base_url
        );
        Ok(decoded)
    }

    pub fn coverage_url(&self, query: &CoverageQuery) -> Url {
        let bbox = query.bbox.map(|bbox| bbox.iter().join(","));
        let mut params = Vec::new();
        if self.version.starts_with("1.0") {
            params.push(("coverage", query.coverage_id.clone()));
            params.push(("format", query.format.clone()));
            params.push(("crs", query.crs_code().to_string()));
            if let Some(bbox) = bbox {
                params.push(("bbox", bbox));
            }
            if let Some((width, height)) = query.size {
                params.push(("width", width.to_string()));
                params.push(("height", height.to_string()));
            }
        } else if self.is_version_1() {
            params.push(("identifier", query.coverage_id.clone()));
            params.push(("format", query.format.clone()));
            if let Some(bbox) = bbox {
                params.push(("BoundingBox", format!("{bbox},{}", query.crs_urn())));
            }
            params.push(("GridBaseCRS", query.crs_urn()));
        } else {
            params.push(("coverageId", query.coverage_id.clone()));
            params.push(("format", query.format.clone()));
            params.extend(
                query
                    .subsets
                    .iter()
                    .map(|subset| ("subset", subset.to_string())),
            );
        }
        self.request_url("GetCoverage", &params)
    }

    pub fn get_coverage(&self, query: &CoverageQuery) -> Result<RasterDataset> {
        self.check_offered(&query.coverage_id)?;
        let url = self.coverage_url(query);
        let (driver, extension) = query.response_driver();
        let download = Download::fetch(
            &self.http,
            url.as_str(),
            &format!("coverage.{extension}"),
            self.config.scratch_dir.as_deref(),
        )?;
        let raster = self.io.read_raster(
            Source::from(download.path()),
            &RasterReadOptions::new().driver(driver).all_bands(),
        )?;
        info!(
            "fetched coverage {} ({} band(s)) from {}",
            query.coverage_id,
            raster.band_count(),
            self.base_url
        );
        Ok(raster)
    }
}
