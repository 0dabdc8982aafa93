//! Stage A: rearrangement detection and clumping.

pub(crate) mod classify;
pub(crate) mod clump;
pub(crate) mod filter;
pub(crate) mod oracle;
pub(crate) mod overlap;
pub(crate) mod writer;
