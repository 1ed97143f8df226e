//! Config resolution: flattens a config tree into ordered prompt fragments.
//!
//! Resolution is a single depth-first, left-to-right pass driven by an
//! explicit stack of item iterators. Each frame carries the base directory
//! its relative paths resolve against; the variable table is shared by every
//! frame, so a `var` item is visible to everything processed after it.
//!
//! Errors are fail-fast: the first fetch, listing, parse, or validation
//! error is yielded and the iterator ends.

use std::collections::VecDeque;
use std::path::PathBuf;

use tracing::{debug, instrument};

use ctxkit_fetch::Fetcher;
use ctxkit_shared::{BaseDir, Config, CtxKitError, Item, ResolvedPath, Result, parse_config};

use crate::paths;
use crate::variables::Variables;

/// Separator placed between fragments in the assembled prompt.
pub const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Lazily resolve `config` into prompt fragments.
pub fn resolve_items<'a>(
    config: Config,
    variables: &'a mut Variables,
    base: BaseDir,
    fetcher: &'a dyn Fetcher,
) -> Fragments<'a> {
    Fragments {
        fetcher,
        variables,
        stack: vec![Frame::new(config, base, None)],
        pending_files: VecDeque::new(),
        finished: false,
    }
}

/// Resolve `config` and join its fragments with a blank line.
#[instrument(skip_all, fields(items = config.items.len(), base = %base))]
pub fn process_config(
    config: Config,
    variables: &mut Variables,
    base: BaseDir,
    fetcher: &dyn Fetcher,
) -> Result<String> {
    let fragments = resolve_items(config, variables, base, fetcher).collect::<Result<Vec<_>>>()?;
    debug!(fragments = fragments.len(), "config resolved");
    Ok(fragments.join(FRAGMENT_SEPARATOR))
}

/// Wrap file text in `<path>` tags.
///
/// The newline before the closing tag is omitted when the text is empty.
pub fn file_fragment(path: &ResolvedPath, text: &str) -> String {
    let newline = if text.is_empty() { "" } else { "\n" };
    format!("<{path}>\n{text}{newline}</{path}>")
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

struct Frame {
    items: std::vec::IntoIter<Item>,
    base: BaseDir,
    /// Where the config was loaded from; `None` for the root.
    source: Option<ResolvedPath>,
}

impl Frame {
    fn new(config: Config, base: BaseDir, source: Option<ResolvedPath>) -> Self {
        Self {
            items: config.items.into_iter(),
            base,
            source,
        }
    }
}

/// Iterator over the fragments of a config tree. See [`resolve_items`].
pub struct Fragments<'a> {
    fetcher: &'a dyn Fetcher,
    variables: &'a mut Variables,
    stack: Vec<Frame>,
    /// Files of the current `dir` item not yet emitted.
    pending_files: VecDeque<PathBuf>,
    finished: bool,
}

impl Iterator for Fragments<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(fragment)) => Some(Ok(fragment)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl Fragments<'_> {
    /// Run items until one produces a fragment or the tree is exhausted.
    fn advance(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(file) = self.pending_files.pop_front() {
                let path = ResolvedPath::Local(file);
                let text = self.fetcher.fetch_text(&path)?;
                return Ok(Some(file_fragment(&path, &text)));
            }

            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            let Some(item) = frame.items.next() else {
                self.stack.pop();
                continue;
            };
            let base = frame.base.clone();

            if let Some(fragment) = self.step(item, &base)? {
                return Ok(Some(fragment));
            }
        }
    }

    fn step(&mut self, item: Item, base: &BaseDir) -> Result<Option<String>> {
        debug!(kind = item.kind(), depth = self.stack.len(), "resolving item");

        match item {
            Item::Config(path) => {
                let path = self.resolve_path(&path, base);
                if self.stack.iter().any(|frame| frame.source.as_ref() == Some(&path)) {
                    return Err(CtxKitError::ConfigCycle {
                        path: path.to_string(),
                    });
                }
                let text = self.fetcher.fetch_text(&path)?;
                let config = parse_config(&text, &path.to_string())?;
                let nested_base = path.parent_base();
                debug!(%path, base = %nested_base, items = config.items.len(), "entering config");
                self.stack.push(Frame::new(config, nested_base, Some(path)));
                Ok(None)
            }
            Item::Include(path) => {
                let path = self.resolve_path(&path, base);
                self.fetcher.fetch_text(&path).map(Some)
            }
            Item::File(path) => {
                let path = self.resolve_path(&path, base);
                let text = self.fetcher.fetch_text(&path)?;
                Ok(Some(file_fragment(&path, &text)))
            }
            Item::Dir(dir) => {
                let path = self.resolve_path(&dir.path, base);
                let files = self
                    .fetcher
                    .list_files(&path, &dir.normalized_exts(), dir.depth)?;
                if files.is_empty() {
                    return Err(CtxKitError::EmptyDirectory {
                        path: PathBuf::from(path.to_string()),
                    });
                }
                debug!(%path, files = files.len(), "expanding directory");
                self.pending_files.extend(files);
                Ok(None)
            }
            Item::Var(var) => {
                let value = self.variables.substitute(&var.value);
                self.variables.set(var.name, value);
                Ok(None)
            }
            Item::Message(text) => Ok(Some(self.variables.substitute(&text))),
            Item::Long(lines) => Ok(Some(self.variables.substitute(&lines.join("\n")))),
        }
    }

    fn resolve_path(&self, raw: &str, base: &BaseDir) -> ResolvedPath {
        paths::resolve(&self.variables.substitute(raw), base)
    }
}
