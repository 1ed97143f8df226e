//! Recursive directory listing for `dir` items.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use walkdir::WalkDir;

use ctxkit_shared::paths::normalize;
use ctxkit_shared::{CtxKitError, Result};

/// List the files under `dir` whose extension (with leading dot) is in `exts`.
///
/// - An empty `exts` matches nothing.
/// - Symlinked subdirectories are followed; a link loop is an error.
/// - Files directly inside `dir` are at depth 1; `max_depth` 0 is unbounded.
/// - Paths are `dir`-prefixed and normalized, sorted by
///   (parent directory, file name) so each directory's files stay together.
#[instrument(skip(exts), fields(dir = %dir.display()))]
pub fn list_files(dir: &Path, exts: &BTreeSet<String>, max_depth: u32) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(dir).map_err(|e| CtxKitError::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(CtxKitError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        ));
    }

    let mut walker = WalkDir::new(dir).follow_links(true).min_depth(1);
    if max_depth > 0 {
        walker = walker.max_depth(max_depth as usize);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| exts.contains(&format!(".{ext}")));
        if matches {
            files.push(normalize(path));
        }
    }

    files.sort_by_cached_key(|path| sort_key(path));

    debug!(count = files.len(), "directory listed");
    Ok(files)
}

/// (parent directory, file name) as strings.
fn sort_key(path: &Path) -> (String, String) {
    let parent = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (parent, name)
}

fn walk_error(dir: &Path, err: walkdir::Error) -> CtxKitError {
    let path = err.path().unwrap_or(dir).to_path_buf();
    match err.into_io_error() {
        Some(source) => CtxKitError::io(path, source),
        None => CtxKitError::io(
            path,
            std::io::Error::other("filesystem loop while walking directory"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn rel(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn matches_extensions_recursively() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "test.txt", "Hello!");
        write(tmp.path(), "subdir/sub.txt", "Goodbye!");
        write(tmp.path(), "subdir/skip.md", "nope");

        let files = list_files(tmp.path(), &exts(&[".txt"]), 0).unwrap();
        assert_eq!(rel(tmp.path(), &files), vec!["test.txt", "subdir/sub.txt"]);
    }

    #[test]
    fn empty_extension_set_matches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "test.txt", "Hello!");

        let files = list_files(tmp.path(), &BTreeSet::new(), 0).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "upper.TXT", "x");
        write(tmp.path(), "lower.txt", "y");

        let files = list_files(tmp.path(), &exts(&[".txt"]), 0).unwrap();
        assert_eq!(rel(tmp.path(), &files), vec!["lower.txt"]);
    }

    #[test]
    fn depth_one_is_top_level_only() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "test.txt", "Hello!");
        write(tmp.path(), "subdir/sub.txt", "Goodbye!");
        write(tmp.path(), "subdir/deeper/deep.txt", "Deep");

        let files = list_files(tmp.path(), &exts(&[".txt"]), 1).unwrap();
        assert_eq!(rel(tmp.path(), &files), vec!["test.txt"]);

        let files = list_files(tmp.path(), &exts(&[".txt"]), 2).unwrap();
        assert_eq!(rel(tmp.path(), &files), vec!["test.txt", "subdir/sub.txt"]);
    }

    #[test]
    fn groups_by_directory_before_file_name() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "z.txt", "z");
        write(tmp.path(), "a/y.txt", "y");
        write(tmp.path(), "a-b/x.txt", "x");

        let files = list_files(tmp.path(), &exts(&[".txt"]), 0).unwrap();
        // A flat string sort would give a-b/x.txt, a/y.txt, z.txt.
        assert_eq!(
            rel(tmp.path(), &files),
            vec!["z.txt", "a/y.txt", "a-b/x.txt"]
        );
    }

    #[test]
    fn relative_root_is_normalized() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "docs/guide.md", "guide");

        let dir = tmp.path().join("docs/../docs/.");
        let files = list_files(&dir, &exts(&[".md"]), 0).unwrap();
        assert_eq!(files, vec![tmp.path().join("docs").join("guide.md")]);
    }

    #[test]
    fn missing_directory_is_not_found() {
        let err = list_files(Path::new("not-found/unknown"), &exts(&[".txt"]), 0).unwrap_err();
        assert!(matches!(err, CtxKitError::NotFound { .. }));
        assert_eq!(
            err.to_string(),
            "No such file or directory, \"not-found/unknown\""
        );
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinked_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "real/a.txt", "linked");
        write(tmp.path(), "root/own.txt", "own");
        std::os::unix::fs::symlink("../real", tmp.path().join("root/linked")).unwrap();

        let root = tmp.path().join("root");
        let files = list_files(&root, &exts(&[".txt"]), 0).unwrap();
        assert_eq!(rel(&root, &files), vec!["own.txt", "linked/a.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "root/own.txt", "own");
        std::os::unix::fs::symlink(".", tmp.path().join("root/self")).unwrap();

        let err = list_files(&tmp.path().join("root"), &exts(&[".txt"]), 0).unwrap_err();
        assert!(matches!(err, CtxKitError::Io { .. }), "{err:?}");
        assert!(err.to_string().contains("filesystem loop"), "{err}");
    }

    #[test]
    fn file_is_not_a_directory() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "file.txt", "x");

        let err = list_files(&tmp.path().join("file.txt"), &exts(&[".txt"]), 0).unwrap_err();
        assert!(matches!(err, CtxKitError::Io { .. }));
    }
}
