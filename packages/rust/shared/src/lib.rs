//! Shared types, error model, and configuration for Lekcjonarz.
//!
//! This crate is the foundation depended on by all other Lekcjonarz crates.
//! It provides:
//! - [`LekcjonarzError`]: the unified error type
//! - Domain types ([`Job`], [`ReadingBlock`], [`DaySet`], [`FailureRecord`])
//! - The filesystem-name sanitizer
//! - Configuration ([`AppConfig`], [`CrawlConfig`], [`ExtractConfig`], config loading)

pub mod config;
pub mod error;
pub mod sanitize;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, ExtractConfig, ExtractSection, HeuristicsConfig, HttpConfig,
    HttpSection, SiglaRules, SiteConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, render_config,
};
pub use error::{LekcjonarzError, Result, StructureFault};
pub use sanitize::{sanitize_folder_label, sanitize_name};
pub use types::{
    ACCLAMATION, DaySet, FailureRecord, Job, PSALM_RESPONSORY, ReadingBlock, SpecialCase,
};
