//! Shared types, error model, and configuration for siteforge.
//!
//! This crate is the foundation depended on by all other siteforge crates.
//! It provides:
//! - [`SiteforgeError`] — the unified error type
//! - Domain types ([`ContentNode`], [`FileNode`], [`PageRequest`], [`NodeId`])
//! - Configuration ([`SiteConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    PathsConfig, SiteConfig, SourcesConfig, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{Result, SiteforgeError};
pub use types::{
    ContentNode, FileNode, Frontmatter, NodeFields, NodeId, NodeKind, PageManifest, PageRequest,
    RESOLVABLE_EXTENSIONS, SourcePath,
};
