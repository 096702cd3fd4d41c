//! Command implementations

pub mod deploy;
pub mod destroy;
pub mod form;
pub mod list;
