//! CLI command implementations.

pub(crate) mod delta;
pub(crate) mod download;
pub(crate) mod info;
pub(crate) mod invoke;
pub(crate) mod sources;
