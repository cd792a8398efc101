//! Shared types, error model, and configuration for GuideVault.
//!
//! This crate is the foundation depended on by all other GuideVault crates.
//! It provides:
//! - [`GuideVaultError`] — the unified error type
//! - Domain types ([`SessionMeta`], [`QuestionEntry`], [`GuideSubmission`], ...)
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ProvidersConfig, StoresConfig, TimezoneConfig, config_dir, config_file_path,
    expand_home, init_config, load_config, load_config_from,
};
pub use error::{GuideVaultError, Result};
pub use types::{
    AgentAssignment, AgentProfile, Channel, ExtractionSummary, GuideSubmission, QuestionEntry,
    QueueInfo, SessionMeta, SessionTimestamps,
};
