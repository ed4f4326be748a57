//! Capabilities of the host process: defined constants and object creation.

pub mod constants;
pub mod object_factory;
