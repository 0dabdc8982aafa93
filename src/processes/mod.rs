pub mod clump;
pub mod link;

pub use clump::{ClumpArgs, clump_process};
pub use link::{LinkArgs, link_process};
