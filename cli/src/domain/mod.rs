//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod deployment;
pub mod envfile;
pub mod error;
pub mod fleet;
pub mod rules;
pub mod setting;
pub mod storage;

pub use deployment::{CloudConfig, DeploymentConfig, DeploymentKind, LocalConfig};
pub use error::{
    ConfigError, DestroyError, ProvisioningError, UriError, ValidationCause, ValidationError,
    ValidationErrors,
};
pub use fleet::{ProbeReport, ProbeStatus, RemoteDeploymentRecord};
pub use rules::{RemoteResource, ResourceKind, Rule};
pub use setting::{Choice, FieldReader, Setting, Settings};
pub use storage::{BackendConfig, StorageUri};
