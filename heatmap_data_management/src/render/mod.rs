mod heatmap;
mod markers;

pub use heatmap::*;
pub use markers::*;
