//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, provisioning and compose drivers, archive fetching, and the Google
//! Cloud and HTTP clients.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod compose;
pub mod env;
pub mod fetch;
pub mod fs;
pub mod google;
pub mod health;
pub mod terraform;
