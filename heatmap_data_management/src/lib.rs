use std::{fmt, path::{Path, PathBuf}};

use const_format::concatcp;

pub mod binning;
pub mod geometry;
mod gpx_util;
pub mod render;
mod data_store;

pub use data_store::*;
pub use gpx_util::{read_gpx, read_gpx_from};

pub const DATA_DIR: &str = "data/";
pub const GPX_DIR: &str = concatcp!(DATA_DIR, "gpx");
pub const ASSET_DIR: &str = concatcp!(DATA_DIR, "assets");
pub const SNAPSHOT_PATH: &str = concatcp!(DATA_DIR, "coordinates.bin");
pub const MAP_OUTPUT_PATH: &str = concatcp!(DATA_DIR, "heatmap.html");

#[derive(Debug)]
pub enum DataStoreError {
    Parse(String),
    Io(String),
    InvalidStep(f64),
    InvalidBinWidth(String),
    Snapshot(String),
    Render(String),
}

impl fmt::Display for DataStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataStoreError::Parse(msg) => write!(f, "parse error: {msg}"),
            DataStoreError::Io(msg) => write!(f, "io error: {msg}"),
            DataStoreError::InvalidStep(step) => write!(f, "resampling step must be positive and finite, got {step}"),
            DataStoreError::InvalidBinWidth(msg) => write!(f, "invalid time bin width: {msg}"),
            DataStoreError::Snapshot(msg) => write!(f, "snapshot error: {msg}"),
            DataStoreError::Render(msg) => write!(f, "render error: {msg}"),
        }
    }
}

impl std::error::Error for DataStoreError {}

/// Resolves a relative path against the project root, falling back to the working directory.
pub fn project_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }

    match project_root::get_project_root() {
        Ok(root) => root.join(path),
        Err(_) => path.to_path_buf(),
    }
}
