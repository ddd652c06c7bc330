pub mod corr;
pub mod error;
pub mod heatmap;
pub mod io;
pub mod linkage;
pub mod matrix;

pub use error::{HeatmapError, MatrixError};
pub use linkage::{slink, Linkage, MergeTree};
pub use matrix::DistanceMatrix;
