//! assetsync core library: domain types, configuration and errors.
//!
//! - [`types`]: keys, releases, inventories and the action plan
//! - [`config`]: [`DeployConfig`] and its file/env layering
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::DeployConfig;
pub use error::ConfigError;
pub use types::{
    Action, Drift, KeepReason, LocalFile, LocalInventory, ObjectKey, Plan, PlanCounts, PlanEntry,
    Release, RemoteInventory, RemoteObject, RELEASE_METADATA_KEY,
};
