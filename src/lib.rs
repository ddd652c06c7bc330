//! Single-linkage clustering of distance matrices, and the heatmap
//! data preparation built on top of it.

pub mod libs;

pub use crate::libs::io::*;
