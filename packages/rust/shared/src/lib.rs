//! Shared types, error model, and configuration for the DCP core.
//!
//! This crate is the foundation depended on by all other DCP crates.
//! It provides:
//! - [`DcpError`], the unified error type
//! - The canonical query model ([`QuerySettings`], [`Filters`], [`Interval`])
//! - Typed provider configuration ([`ProviderDefinition`], [`TypeDefinition`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod provider;
pub mod types;
pub mod util;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LoggingConfig, StorageConfig, config_dir, config_file_path, expand_home,
    init_config, load_config, load_config_from,
};
pub use error::{DcpError, Result};
pub use provider::{
    Content, FIELD_DCP_TYPE, FIELD_NAME, FIELD_TYPE,
    IndexDefinition, PreprocessorSpec, ProviderDefinition, TypeDefinition,
};
pub use types::{
    DefaultedFields, Filters, Interval, MATCH_ALL_QUERY, PastInterval, QuerySettings, SortBy,
};
pub use util::{is_blank, trim_to_null};
