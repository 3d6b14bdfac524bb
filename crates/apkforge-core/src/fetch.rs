//! Remote archive download.
//!
//! One attempt per call, no retries; the caller decides whether re-running is
//! worth it. A failed download may leave a partial file in the cache
//! directory, which the next attempt overwrites.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::types::ForgeError;

/// Capability interface over the download-and-cache facility.
pub trait Fetcher {
    /// Downloads `url` into `dest_dir`, returning the local file path.
    ///
    /// Transport failures surface as [`ForgeError::Network`]; callers
    /// re-signal them with a description of what was being downloaded.
    fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, ForgeError>;
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, ForgeError> {
        let filename = url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ForgeError::Config(format!("cannot derive a file name from {url}")))?;
        fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(filename);

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ForgeError::Network(format!("requesting {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(ForgeError::Network(format!(
                "fetching {url}: server returned {}",
                response.status()
            )));
        }

        let mut file = fs::File::create(&dest)?;
        io::copy(&mut response, &mut file)
            .map_err(|e| ForgeError::Network(format!("reading response body from {url}: {e}")))?;
        Ok(dest)
    }
}
