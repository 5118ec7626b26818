//! CLI command implementations.

pub(crate) mod cert;
pub(crate) mod check;
pub(crate) mod config;
pub(crate) mod policy;
