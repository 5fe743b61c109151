//! Per-frame projection: filter state machine, plane staging and stream driving.

pub(crate) mod filter;
pub(crate) mod staging;
pub(crate) mod stream;
