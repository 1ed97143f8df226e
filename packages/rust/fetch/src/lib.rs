//! Content fetching for prompt items: local files, URLs, and directory walks.
//!
//! The resolver only sees the [`Fetcher`] trait. [`TextFetcher`] is the real
//! implementation: it reads local files, issues a single blocking GET for
//! URLs, and walks directories with [`walkdir`].

mod http;
mod walk;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use ctxkit_shared::{CtxKitError, HttpSettings, ResolvedPath, Result};

pub use walk::list_files;

/// Source of item text and directory listings.
pub trait Fetcher {
    /// Fetch the text at `path`, trimmed of leading/trailing whitespace.
    fn fetch_text(&self, path: &ResolvedPath) -> Result<String>;

    /// List the files under `dir` whose extension is in `exts`.
    ///
    /// `max_depth` of 0 is unbounded; files directly inside `dir` are at
    /// depth 1. Results are sorted by (parent directory, file name).
    fn list_files(
        &self,
        dir: &ResolvedPath,
        exts: &BTreeSet<String>,
        max_depth: u32,
    ) -> Result<Vec<PathBuf>>;
}

/// Filesystem and HTTP backed [`Fetcher`].
pub struct TextFetcher {
    client: Client,
}

impl TextFetcher {
    /// Create a fetcher whose HTTP client follows `settings`.
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        Ok(Self {
            client: http::build_client(settings)?,
        })
    }
}

impl Fetcher for TextFetcher {
    fn fetch_text(&self, path: &ResolvedPath) -> Result<String> {
        match path {
            ResolvedPath::Local(path) => read_local(path),
            ResolvedPath::Remote(url) => http::get_text(&self.client, url),
        }
    }

    fn list_files(
        &self,
        dir: &ResolvedPath,
        exts: &BTreeSet<String>,
        max_depth: u32,
    ) -> Result<Vec<PathBuf>> {
        match dir {
            ResolvedPath::Local(dir) => walk::list_files(dir, exts, max_depth),
            ResolvedPath::Remote(url) => Err(CtxKitError::RemoteDirectory { url: url.clone() }),
        }
    }
}

/// Read a local UTF-8 text file and trim it.
#[instrument(skip_all, fields(path = %path.display()))]
fn read_local(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|e| CtxKitError::io(path, e))?;
    debug!(bytes = text.len(), "read local file");
    Ok(text.trim().to_string())
}
