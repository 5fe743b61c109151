//! Filter options and the output geometry derived from them.

pub(crate) mod options;
pub(crate) mod sizing;
