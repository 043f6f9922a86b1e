//! Options for the field transform pass.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout for fetching remote pictures.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for resolving and embedding pictures.
///
/// # Examples
///
/// ```rust
/// use mergefields::TransformOptions;
/// use std::time::Duration;
///
/// let options = TransformOptions::new()
///     .with_base_directory("/srv/letters/images")
///     .with_http_timeout(Duration::from_secs(5))
///     .with_parallel_fetch(false);
/// assert!(!options.parallel_fetch);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Directory that relative picture paths resolve against.
    ///
    /// Defaults to the directory of the opened document.
    pub base_directory: Option<PathBuf>,
    /// Timeout for one remote fetch
    pub http_timeout: Duration,
    /// `User-Agent` header for remote fetches
    pub user_agent: String,
    /// Fetch picture sources concurrently before embedding
    pub parallel_fetch: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            base_directory: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            parallel_fetch: true,
        }
    }
}

impl TransformOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_base_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_directory = Some(dir.into());
        self
    }

    #[inline]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    #[inline]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[inline]
    pub fn with_parallel_fetch(mut self, parallel: bool) -> Self {
        self.parallel_fetch = parallel;
        self
    }

    /// Use `dir` as the base directory unless one is already set.
    pub(crate) fn or_base_directory(mut self, dir: Option<&Path>) -> Self {
        if self.base_directory.is_none() {
            self.base_directory = dir.map(Path::to_path_buf);
        }
        self
    }
}
