//! Core domain types for ctxkit prompt configurations.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

// ---------------------------------------------------------------------------
// Config / Item
// ---------------------------------------------------------------------------

/// A validated prompt configuration: a non-empty ordered list of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub items: Vec<Item>,
}

/// A single prompt item. Exactly one kind per item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Nested configuration file path or URL.
    Config(String),
    /// Literal prompt message.
    Message(String),
    /// Multi-line prompt message, joined with newlines.
    Long(Vec<String>),
    /// File path or URL text, emitted verbatim.
    Include(String),
    /// File path or URL text, wrapped in `<path>` tags.
    File(String),
    /// A directory's matching files, each wrapped like [`Item::File`].
    Dir(DirItem),
    /// Variable definition.
    Var(VarItem),
}

impl Item {
    /// The JSON member name for this item kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Message(_) => "message",
            Self::Long(_) => "long",
            Self::Include(_) => "include",
            Self::File(_) => "file",
            Self::Dir(_) => "dir",
            Self::Var(_) => "var",
        }
    }
}

/// A `dir` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirItem {
    /// Directory path (may contain variable references).
    pub path: String,
    /// File extensions to include, with or without the leading dot.
    pub exts: Vec<String>,
    /// Maximum traversal depth; 0 is unbounded.
    pub depth: u32,
}

impl DirItem {
    /// Extensions normalized to the `.ext` form.
    ///
    /// An empty set matches no files.
    pub fn normalized_exts(&self) -> BTreeSet<String> {
        self.exts
            .iter()
            .map(|ext| format!(".{}", ext.trim_start_matches('.')))
            .collect()
    }
}

/// A `var` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarItem {
    pub name: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// ResolvedPath
// ---------------------------------------------------------------------------

/// An item path after variable substitution and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    /// A local filesystem path.
    Local(PathBuf),
    /// A URL, kept exactly as written.
    Remote(String),
}

impl ResolvedPath {
    /// The directory that relative paths inside this resource resolve against.
    pub fn parent_base(&self) -> BaseDir {
        match self {
            Self::Local(path) => BaseDir::Local(parent_dir(path)),
            Self::Remote(url) => match Url::parse(url) {
                Ok(url) => BaseDir::Remote(url),
                Err(_) => BaseDir::Local(parent_dir(Path::new(url))),
            },
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

// ---------------------------------------------------------------------------
// BaseDir
// ---------------------------------------------------------------------------

/// The location relative item paths resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseDir {
    /// A local directory.
    Local(PathBuf),
    /// The URL of a remotely loaded config; relative paths are URL-joined.
    Remote(Url),
}

impl Default for BaseDir {
    fn default() -> Self {
        Self::Local(PathBuf::from("."))
    }
}

impl fmt::Display for BaseDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}
