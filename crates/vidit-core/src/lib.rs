//! Shared domain types, configuration, and the persistence capability for vidit.
//!
//! Every other crate in the workspace speaks in terms of [`Source`], [`Item`],
//! and the [`Store`] trait defined here. Nothing in this crate performs I/O
//! except [`load_app_config`], which reads `.env` and the process environment.

mod app_config;
mod config;
pub mod items;
pub mod memory_store;
pub mod sources;
pub mod store;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use items::{Item, PLACEHOLDER_SCORE};
pub use memory_store::MemoryStore;
pub use sources::{Source, SourceKind};
pub use store::{SourceUpdate, Store, StoreError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown source kind: {0:?}")]
    UnknownSourceKind(String),
}
