mod common;

use std::{
    io::{BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    path::Path,
    sync::Arc,
    thread,
};

use common::{grid, scratch};
use geoio::{
    write_raster, CoverageQuery, FeatureQuery, GeoIoError, GeometryKind, RasterWriteOptions,
    ServiceConfig, ServiceKind, WebServiceClient,
};
use rstest::rstest;
use tempfile::TempDir;

const WFS_CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:WFS_Capabilities version="1.1.0" xmlns:wfs="http://www.opengis.net/wfs" xmlns:ows="http://www.opengis.net/ows">
  <ows:ServiceIdentification><ows:Title>Test WFS</ows:Title></ows:ServiceIdentification>
  <ows:OperationsMetadata>
    <ows:Operation name="GetCapabilities"/>
    <ows:Operation name="GetFeature"/>
  </ows:OperationsMetadata>
  <FeatureTypeList>
    <FeatureType><Name>demo:cities</Name><Title>Cities</Title></FeatureType>
    <FeatureType><Name>demo:broken</Name></FeatureType>
    <FeatureType><Name>demo:faulty</Name></FeatureType>
  </FeatureTypeList>
</wfs:WFS_Capabilities>"#;

const WCS_CAPABILITIES: &str = r#"<wcs:Capabilities version="2.0.1" xmlns:wcs="http://www.opengis.net/wcs/2.0" xmlns:ows="http://www.opengis.net/ows/2.0">
  <ows:ServiceIdentification><ows:ServiceType>OGC WCS</ows:ServiceType></ows:ServiceIdentification>
  <wcs:Contents><wcs:CoverageSummary><wcs:CoverageId>dem</wcs:CoverageId></wcs:CoverageSummary></wcs:Contents>
</wcs:Capabilities>"#;

const WCS_1_0_CAPABILITIES: &str = r#"<WCS_Capabilities version="1.0.0" xmlns="http://www.opengis.net/wcs">
  <Service><name>WCS</name><label>Terrain</label></Service>
  <ContentMetadata><CoverageOfferingBrief><name>dem</name><label>Elevation</label></CoverageOfferingBrief></ContentMetadata>
</WCS_Capabilities>"#;

const CITIES: &str = r#"{"type": "FeatureCollection", "features": [
  {"type": "Feature", "properties": {"name": "Paris"}, "geometry": {"type": "Point", "coordinates": [2.35, 48.86]}},
  {"type": "Feature", "properties": {"name": "Tokyo"}, "geometry": {"type": "Point", "coordinates": [139.69, 35.69]}}
]}"#;

const EXCEPTION: &str = r#"<?xml version="1.0"?>
<ows:ExceptionReport version="1.1.0" xmlns:ows="http://www.opengis.net/ows">
  <ows:Exception exceptionCode="NoApplicableCode"><ows:ExceptionText>Datastore demo is offline</ows:ExceptionText></ows:Exception>
</ows:ExceptionReport>"#;

struct Reply {
    status: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Reply {
    fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: "200 OK",
            content_type,
            body: body.into(),
        }
    }
}

type Route = dyn Fn(&str) -> Reply + Send + Sync;

/// Answers every request on a local port with `route(request target)`.
fn serve(route: Arc<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let route = Arc::clone(&route);
            thread::spawn(move || respond(stream, route.as_ref()));
        }
    });
    format!("http://{address}/ows")
}

fn respond(mut stream: TcpStream, route: &Route) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
            break;
        }
    }
    let target = request_line.split_whitespace().nth(1).unwrap_or_default();
    let reply = route(target);
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.content_type,
        reply.body.len()
    );
    stream.write_all(head.as_bytes()).unwrap();
    stream.write_all(&reply.body).unwrap();
}

fn wfs_route(target: &str) -> Reply {
    if target.contains("request=GetCapabilities") {
        Reply::ok("text/xml", WFS_CAPABILITIES)
    } else if target.contains("cities") {
        Reply::ok("application/json", CITIES)
    } else if target.contains("faulty") {
        Reply::ok("text/xml", EXCEPTION)
    } else {
        Reply {
            status: "500 Internal Server Error",
            content_type: "text/plain",
            body: b"upstream timeout".to_vec(),
        }
    }
}

fn config(scratch: &Path) -> ServiceConfig {
    ServiceConfig::default()
        .with_timeout_secs(10)
        .with_scratch_dir(scratch)
}

fn is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[rstest]
#[test_log::test]
fn lists_offered_feature_types(scratch: TempDir) {
    let url = serve(Arc::new(wfs_route));
    let client = WebServiceClient::new(&url, ServiceKind::Wfs, &config(scratch.path())).unwrap();
    let capabilities = client.get_capabilities().unwrap();
    assert_eq!(capabilities.service, "WFS");
    assert_eq!(capabilities.title.as_deref(), Some("Test WFS"));
    assert!(capabilities.supports("GetFeature"));
    assert_eq!(
        capabilities.layer_names(),
        vec!["demo:cities", "demo:broken", "demo:faulty"]
    );
}

#[rstest]
#[test_log::test]
fn fetches_features_as_geojson(scratch: TempDir) {
    let url = serve(Arc::new(wfs_route));
    let client = WebServiceClient::new(&url, ServiceKind::Wfs, &config(scratch.path())).unwrap();
    let query = FeatureQuery::new("cities")
        .max_features(10)
        .output_format("application/json");
    let decoded = client.get_features(&query).unwrap();
    assert_eq!(decoded.driver, "GeoJSON");
    assert_eq!(decoded.dataset.name(), "cities");
    assert_eq!(decoded.dataset.len(), 2);
    assert_eq!(decoded.dataset.common_kind(), Some(GeometryKind::Point));
    assert!(is_empty(scratch.path()));
}

#[rstest]
#[test_log::test]
fn exception_report_is_a_service_error(scratch: TempDir) {
    let url = serve(Arc::new(wfs_route));
    let client = WebServiceClient::new(&url, ServiceKind::Wfs, &config(scratch.path())).unwrap();
    let query = FeatureQuery::new("demo:faulty").output_format("application/json");
    match client.get_features(&query).unwrap_err() {
        GeoIoError::ServiceError { message, .. } => {
            assert_eq!(message, "Datastore demo is offline")
        }
        other => panic!("unexpected {other}"),
    }
    assert!(is_empty(scratch.path()));
}

#[rstest]
#[test_log::test]
fn http_failure_is_a_service_error(scratch: TempDir) {
    let url = serve(Arc::new(wfs_route));
    let client = WebServiceClient::new(&url, ServiceKind::Wfs, &config(scratch.path())).unwrap();
    let query = FeatureQuery::new("demo:broken");
    match client.get_features(&query).unwrap_err() {
        GeoIoError::ServiceError { message, .. } => {
            assert_eq!(message, "HTTP 500 Internal Server Error: upstream timeout")
        }
        other => panic!("unexpected {other}"),
    }
    assert!(is_empty(scratch.path()));
}

#[rstest]
#[test_log::test]
fn unknown_type_lists_the_offered_ones(scratch: TempDir) {
    let url = serve(Arc::new(wfs_route));
    let client = WebServiceClient::new(&url, ServiceKind::Wfs, &config(scratch.path())).unwrap();
    match client.get_features(&FeatureQuery::new("demo:lakes")).unwrap_err() {
        GeoIoError::UnknownType {
            type_name,
            available,
            ..
        } => {
            assert_eq!(type_name, "demo:lakes");
            assert_eq!(available, "demo:cities, demo:broken, demo:faulty");
        }
        other => panic!("unexpected {other}"),
    }
}

#[rstest]
#[test_log::test]
fn unreachable_service_is_a_network_error(scratch: TempDir) {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = WebServiceClient::new(
        &format!("http://{address}/ows"),
        ServiceKind::Wfs,
        &config(scratch.path()),
    )
    .unwrap();
    let err = client.get_capabilities().unwrap_err();
    assert!(matches!(err, GeoIoError::NetworkError { .. }), "{err}");
}

#[rstest]
#[test_log::test]
fn fetches_a_coverage(scratch: TempDir) {
    let source = tempfile::tempdir().unwrap();
    let tiff_path = source.path().join("dem.tif");
    let written = grid(6, 4, 1);
    write_raster(&written, &tiff_path, &RasterWriteOptions::default()).unwrap();
    let tiff = std::fs::read(&tiff_path).unwrap();

    let route = move |target: &str| {
        if target.contains("request=GetCapabilities") {
            Reply::ok("text/xml", WCS_CAPABILITIES)
        } else {
            assert!(target.contains("coverageId=dem"), "{target}");
            assert!(target.contains("subset=Lat%2835%2C36%29"), "{target}");
            Reply::ok("image/tiff", tiff.clone())
        }
    };
    let url = serve(Arc::new(route));
    let client = WebServiceClient::new(&url, ServiceKind::Wcs, &config(scratch.path())).unwrap();
    let query = CoverageQuery::new("dem").subset("Lat", 35.0, 36.0);
    let raster = client.get_coverage(&query).unwrap();
    assert_eq!(raster.header().shape(), (4, 6));
    assert_eq!(raster.band(1).unwrap().values, written.band(1).unwrap().values);
    assert!(is_empty(scratch.path()));

    let err = client.get_coverage(&CoverageQuery::new("slope")).unwrap_err();
    assert!(matches!(err, GeoIoError::UnknownType { .. }), "{err}");
}

#[rstest]
#[test_log::test]
fn fetches_a_wcs_1_0_coverage(scratch: TempDir) {
    let source = tempfile::tempdir().unwrap();
    let tiff_path = source.path().join("dem.tif");
    let written = grid(4, 3, 1);
    write_raster(&written, &tiff_path, &RasterWriteOptions::default()).unwrap();
    let tiff = std::fs::read(&tiff_path).unwrap();

    let route = move |target: &str| {
        if target.contains("request=GetCapabilities") {
            Reply::ok("text/xml", WCS_1_0_CAPABILITIES)
        } else {
            assert!(target.contains("coverage=dem"), "{target}");
            assert!(target.contains("crs=EPSG%3A4326"), "{target}");
            assert!(target.contains("bbox=135%2C35.97%2C135.04%2C36"), "{target}");
            assert!(target.contains("width=4&height=3"), "{target}");
            Reply::ok("image/tiff", tiff.clone())
        }
    };
    let url = serve(Arc::new(route));
    let client = WebServiceClient::new(&url, ServiceKind::Wcs, &config(scratch.path()))
        .unwrap()
        .with_version("1.0.0");
    let query = CoverageQuery::new("dem")
        .bbox(135.0, 35.97, 135.04, 36.0)
        .size(4, 3);
    let raster = client.get_coverage(&query).unwrap();
    assert_eq!(raster.header().shape(), (3, 4));
    assert_eq!(raster.band(1).unwrap().values, written.band(1).unwrap().values);
    assert!(is_empty(scratch.path()));
}
