use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use reqwest::Url;

const WKT_TAGS: [&str; 7] = [
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
    "GEOMETRYCOLLECTION",
];

/// Where a dataset is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// File or folder on the local filesystem.
    Path(PathBuf),
    /// `http(s)` resource, read through ranged requests.
    Url(String),
    /// Driver connection string, e.g. `PG:dbname=gis`.
    Connection(String),
    /// Raw GeoJSON or WKT text.
    Inline(String),
}

impl Source {
    /// Name handed to GDAL when opening this source.
    pub fn gdal_path(&self) -> String {
        match self {
            Source::Path(path) => path.to_string_lossy().into_owned(),
            Source::Url(url) => format!("/vsicurl/{url}"),
            Source::Connection(connection) => connection.clone(),
            Source::Inline(text) => text.clone(),
        }
    }

    /// Lowercase extension of the file (or URL path) this source points to.
    pub fn extension(&self) -> Option<String> {
        match self {
            Source::Path(path) => extension_of(path),
            Source::Url(url) => {
                let url = Url::parse(url).ok()?;
                let last = url.path_segments()?.next_back()?;
                extension_of(Path::new(last))
            }
            Source::Connection(_) | Source::Inline(_) => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Source::Path(path) => Some(path),
            _ => None,
        }
    }

    pub(crate) fn is_inline_json(&self) -> bool {
        matches!(self, Source::Inline(text) if text.trim_start().starts_with('{'))
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn looks_like_json(text: &str) -> bool {
    let text = text.trim();
    text.starts_with('{') && text.ends_with('}')
}

fn looks_like_wkt(text: &str) -> bool {
    let upper = text.trim().to_ascii_uppercase();
    if !(upper.ends_with(')') || upper.ends_with("EMPTY")) {
        return false;
    }
    let opens_body = |rest: &str| {
        let rest = rest.trim_start();
        rest.starts_with('(') || rest.starts_with("EMPTY")
    };
    WKT_TAGS.iter().any(|tag| {
        upper.strip_prefix(tag).is_some_and(|rest| {
            opens_body(rest)
                || ["ZM", "Z", "M"]
                    .iter()
                    .any(|dim| rest.trim_start().strip_prefix(dim).is_some_and(opens_body))
        })
    })
}

fn connection_prefix(text: &str) -> bool {
    match text.split_once(':') {
        Some((prefix, _)) => {
            prefix.len() >= 2 && prefix.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        let lower = value.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(value.to_string())
        } else if Path::new(value).exists() {
            Source::Path(PathBuf::from(value))
        } else if looks_like_json(value) || looks_like_wkt(value) {
            Source::Inline(value.to_string())
        } else if connection_prefix(value) {
            Source::Connection(value.to_string())
        } else {
            Source::Path(PathBuf::from(value))
        }
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Source::from(value.as_str())
    }
}

impl From<&Path> for Source {
    fn from(value: &Path) -> Self {
        Source::Path(value.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(value: PathBuf) -> Self {
        Source::Path(value)
    }
}

impl From<&PathBuf> for Source {
    fn from(value: &PathBuf) -> Self {
        Source::Path(value.clone())
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
            Source::Connection(connection) => f.write_str(connection),
            Source::Inline(text) => {
                let head: String = text.chars().take(40).collect();
                if head.len() < text.len() {
                    write!(f, "inline text `{head}...`")
                } else {
                    write!(f, "inline text `{head}`")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("data/world.gpkg", Source::Path(PathBuf::from("data/world.gpkg")))]
    #[case("C:\\data\\dem.tif", Source::Path(PathBuf::from("C:\\data\\dem.tif")))]
    #[case(
        "https://example.org/zones.geojson",
        Source::Url("https://example.org/zones.geojson".into())
    )]
    #[case("PG:dbname=gis", Source::Connection("PG:dbname=gis".into()))]
    #[case("POINT (1 2)", Source::Inline("POINT (1 2)".into()))]
    #[case("multipolygon EMPTY", Source::Inline("multipolygon EMPTY".into()))]
    #[case("POINT (1.5 2.25)", Source::Inline("POINT (1.5 2.25)".into()))]
    #[case("Polygon (1).shp", Source::Path(PathBuf::from("Polygon (1).shp")))]
    #[case("point (copy).geojson", Source::Path(PathBuf::from("point (copy).geojson")))]
    #[case("{backup}.geojson", Source::Path(PathBuf::from("{backup}.geojson")))]
    #[case(
        "{\"type\": \"FeatureCollection\", \"features\": []}",
        Source::Inline("{\"type\": \"FeatureCollection\", \"features\": []}".into())
    )]
    fn classifies_locators(#[case] locator: &str, #[case] expected: Source) {
        assert_eq!(Source::from(locator), expected);
    }

    #[rstest]
    #[case("https://example.org/a/b/dem.TIF?token=1", Some("tif"))]
    #[case("https://example.org/wfs?request=GetCapabilities", None)]
    #[case("/tmp/points.csv", Some("csv"))]
    fn extracts_extensions(#[case] locator: &str, #[case] expected: Option<&str>) {
        assert_eq!(Source::from(locator).extension().as_deref(), expected);
    }

    #[test]
    fn urls_go_through_vsicurl() {
        let source = Source::from("https://example.org/world.gpkg");
        assert_eq!(source.gdal_path(), "/vsicurl/https://example.org/world.gpkg");
    }

    #[test]
    fn long_inline_text_is_shortened_in_messages() {
        let text = format!("POINT ({} 2)", "1".repeat(80));
        let shown = Source::from(text.as_str()).to_string();
        assert!(shown.ends_with("...`"));
        assert!(shown.len() < text.len());
    }
}
