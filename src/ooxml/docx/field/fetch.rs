//! Retrieval of picture bytes.
//!
//! A picture source is a URL when it parses as one with a scheme longer than
//! one character; `C:\img.png` is a Windows path, not a URL with scheme `c`.
//! Anything else is a filesystem path, relative to the base directory.
use super::error::{FieldError, Result};
use super::options::TransformOptions;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode_str;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Where a picture's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureSource {
    Url(Url),
    Path(PathBuf),
}

impl PictureSource {
    pub fn display(&self) -> String {
        match self {
            Self::Url(url) => url.to_string(),
            Self::Path(path) => path.display().to_string(),
        }
    }
}

/// Interpret the source argument of a picture field.
pub fn resolve_source(source: &str, base_directory: Option<&Path>) -> PictureSource {
    if let Ok(url) = Url::parse(source) {
        if url.scheme().len() > 1 {
            return PictureSource::Url(url);
        }
    }
    let path = Path::new(source);
    match base_directory {
        Some(base) if path.is_relative() => PictureSource::Path(base.join(path)),
        _ => PictureSource::Path(path.to_path_buf()),
    }
}

/// Fetches picture bytes for every supported kind of source.
///
/// The HTTP client is built on first use, so documents without remote
/// pictures never start one.
pub struct SourceFetcher {
    timeout: Duration,
    user_agent: String,
    #[cfg(feature = "remote")]
    client: std::sync::OnceLock<std::result::Result<reqwest::blocking::Client, String>>,
}

impl SourceFetcher {
    pub fn new(options: &TransformOptions) -> Self {
        Self {
            timeout: options.http_timeout,
            user_agent: options.user_agent.clone(),
            #[cfg(feature = "remote")]
            client: std::sync::OnceLock::new(),
        }
    }

    /// Bytes of one source.
    pub fn fetch(&self, source: &PictureSource) -> Result<Vec<u8>> {
        match source {
            PictureSource::Path(path) => {
                std::fs::read(path).map_err(|e| FieldError::resolution(&path.display().to_string(), e))
            },
            PictureSource::Url(url) => match url.scheme() {
                "http" | "https" => self.fetch_http(url),
                "data" => decode_data_url(url),
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| FieldError::resolution(url.as_str(), "not a local file URL"))?;
                    std::fs::read(&path).map_err(|e| FieldError::resolution(url.as_str(), e))
                },
                scheme => Err(FieldError::resolution(
                    url.as_str(),
                    format!("unsupported URL scheme {}", scheme),
                )),
            },
        }
    }

    /// Bytes of every source, in input order.
    pub fn fetch_all(&self, sources: &[PictureSource], parallel: bool) -> Vec<Result<Vec<u8>>> {
        debug!(count = sources.len(), parallel, "fetching picture sources");
        if parallel {
            sources.par_iter().map(|source| self.fetch(source)).collect()
        } else {
            sources.iter().map(|source| self.fetch(source)).collect()
        }
    }

    #[cfg(feature = "remote")]
    fn fetch_http(&self, url: &Url) -> Result<Vec<u8>> {
        let client = self
            .client
            .get_or_init(|| {
                reqwest::blocking::Client::builder()
                    .timeout(self.timeout)
                    .user_agent(self.user_agent.as_str())
                    .build()
                    .map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| FieldError::resolution(url.as_str(), e))?;

        let response = client
            .get(url.as_str())
            .send()
            .map_err(|e| FieldError::resolution(url.as_str(), e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FieldError::resolution(url.as_str(), format!("HTTP {}", status)));
        }
        let body = response
            .bytes()
            .map_err(|e| FieldError::resolution(url.as_str(), e))?;
        Ok(body.to_vec())
    }

    #[cfg(not(feature = "remote"))]
    fn fetch_http(&self, url: &Url) -> Result<Vec<u8>> {
        let _ = (self.timeout, &self.user_agent);
        Err(FieldError::resolution(
            url.as_str(),
            "remote pictures need the `remote` feature",
        ))
    }
}

/// Payload of a `data:` URL, e.g. `data:image/png;base64,iVBOR...`.
fn decode_data_url(url: &Url) -> Result<Vec<u8>> {
    let rest = url.as_str().strip_prefix("data:").unwrap_or(url.path());
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| FieldError::resolution(url.as_str(), "data URL without payload"))?;
    let bytes: Vec<u8> = percent_decode_str(payload).collect();

    if meta.ends_with(";base64") {
        let compact: Vec<u8> = bytes.into_iter().filter(|b| !b.is_ascii_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map_err(|e| FieldError::resolution(url.as_str(), e))
    } else {
        Ok(bytes)
    }
}
