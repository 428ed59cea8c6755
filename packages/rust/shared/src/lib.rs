//! Shared types, error model, and configuration for releasebot.
//!
//! This crate is the foundation depended on by all other releasebot crates.
//! It provides:
//! - [`ReleaseBotError`]: the unified error type
//! - Domain types ([`Entry`], [`Headline`], [`EntryKey`])
//! - Configuration ([`AppConfig`], config loading and validation)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_CONFIG_FILE, LedgerConfig, LoggingConfig, RedditConfig, SourceConfig,
    init_config, load_config_from,
};
pub use error::{ReleaseBotError, Result};
pub use types::{Entry, EntryKey, Headline, split_date_title};
