use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use tempfile::TempDir;

use crate::{
    components::service::capabilities::{is_exception_root, parse_document, root_element, OwsDocument},
    errors::{GeoIoError, Result},
};

/// Bytes inspected when looking for an exception report in place of data.
const SNIFF_LEN: u64 = 64 * 1024;

/// A response body streamed to its own temporary directory.
///
/// The directory is removed when the download is dropped; a failed removal
/// is logged with the orphaned path.
#[derive(Debug)]
pub(crate) struct Download {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Download {
    pub(crate) fn fetch(
        client: &reqwest::blocking::Client,
        url: &str,
        file_name: &str,
        scratch_dir: Option<&Path>,
    ) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("geoio-");
        let dir = match scratch_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        let download = Self {
            path: dir.path().join(file_name),
            dir: Some(dir),
        };

        debug!("GET {url}");
        let mut response = client
            .get(url)
            .send()
            .map_err(|err| GeoIoError::network(url, err))?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().unwrap_or_default();
            return Err(GeoIoError::service(url, status_message(status, &body)));
        }
        let mut file = File::create(&download.path)?;
        let written = response
            .copy_to(&mut file)
            .map_err(|err| GeoIoError::network(url, err))?;
        debug!("streamed {written} bytes to {}", download.path.display());

        if let Some(message) = download.exception()? {
            return Err(GeoIoError::service(url, message));
        }
        Ok(download)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Text of an OWS exception report when the body is one.
    fn exception(&self) -> Result<Option<String>> {
        let mut head = Vec::new();
        File::open(&self.path)?
            .take(SNIFF_LEN)
            .read_to_end(&mut head)?;
        let head = String::from_utf8_lossy(&head);
        if !root_element(&head).is_some_and(|root| is_exception_root(&root)) {
            return Ok(None);
        }
        let body = std::fs::read_to_string(&self.path)?;
        Ok(Some(match parse_document(&body) {
            Ok(OwsDocument::Exception(message)) => message,
            Ok(OwsDocument::Capabilities(_)) | Err(_) => body,
        }))
    }
}

impl Drop for Download {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(err) = dir.close() {
                warn!("could not remove download directory {}: {err}", path.display());
            }
        }
    }
}

/// Status line plus the service's own explanation when it sent one.
pub(crate) fn status_message(status: reqwest::StatusCode, body: &str) -> String {
    match parse_document(body) {
        Ok(OwsDocument::Exception(message)) if !message.is_empty() => {
            format!("HTTP {status}: {message}")
        }
        _ if body.trim().is_empty() => format!("HTTP {status}"),
        _ => {
            let excerpt: String = body.trim().chars().take(200).collect();
            format!("HTTP {status}: {excerpt}")
        }
    }
}
