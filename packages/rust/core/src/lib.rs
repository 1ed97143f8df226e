//! Prompt assembly for ctxkit.
//!
//! This crate turns a validated [`Config`](ctxkit_shared::Config) into prompt
//! text: item paths are resolved ([`paths`]), `{{name}}` references are
//! substituted ([`variables`]), and nested configs and directories are
//! flattened into ordered fragments ([`resolver`]).

pub mod paths;
pub mod resolver;
pub mod variables;

pub use resolver::{FRAGMENT_SEPARATOR, Fragments, file_fragment, process_config, resolve_items};
pub use variables::Variables;
