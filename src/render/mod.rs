//! Projection renderer contract and the software backend.

pub(crate) mod backend;
pub(crate) mod cpu;
pub(crate) mod targets;
