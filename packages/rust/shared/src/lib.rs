//! Shared types, error model, and settings for ctxkit.
//!
//! This crate is the foundation depended on by all other ctxkit crates.
//! It provides:
//! - [`CtxKitError`]: the unified error type
//! - Domain types ([`Config`], [`Item`], [`ResolvedPath`], [`BaseDir`])
//! - The configuration document validator ([`schema`])
//! - Lexical path normalization ([`paths::normalize`])
//! - Settings ([`Settings`], settings file loading)

pub mod config;
pub mod error;
pub mod paths;
pub mod schema;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    GrokSettings, HttpSettings, Settings, init_settings, load_settings, load_settings_from,
    resolve_api_key, settings_dir, settings_file_path,
};
pub use error::{CtxKitError, Result};
pub use schema::{CONFIG_SCHEMA_DOC, parse_config, validate_config};
pub use types::{BaseDir, Config, DirItem, Item, ResolvedPath, VarItem};
