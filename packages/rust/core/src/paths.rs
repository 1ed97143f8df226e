//! Item path resolution: URL detection and base-relative normalization.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use ctxkit_shared::paths::normalize;
use ctxkit_shared::{BaseDir, ResolvedPath};

/// Whether `path` is a URL (`scheme:` prefix, lowercase scheme).
pub fn is_url(path: &str) -> bool {
    static URL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[a-z]+:").expect("valid regex"));
    URL_RE.is_match(path)
}

/// Resolve an item path against the current base.
///
/// URLs and absolute paths are returned unchanged. Relative paths are joined
/// with the base: lexically normalized for a local base, URL-joined for a
/// remote one.
pub fn resolve(path: &str, base: &BaseDir) -> ResolvedPath {
    if is_url(path) {
        return ResolvedPath::Remote(path.to_string());
    }
    if Path::new(path).is_absolute() {
        return ResolvedPath::Local(path.into());
    }

    match base {
        BaseDir::Local(dir) => ResolvedPath::Local(normalize(&dir.join(path))),
        BaseDir::Remote(url) => match url.join(path) {
            Ok(joined) => ResolvedPath::Remote(joined.into()),
            Err(_) => ResolvedPath::Local(normalize(Path::new(path))),
        },
    }
}
