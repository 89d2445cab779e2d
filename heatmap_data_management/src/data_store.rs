use std::{fs::File, io::{BufReader, BufWriter}, path::{Path, PathBuf}, sync::Arc};

use chrono::TimeDelta;
use heatmap_lib::{track_point::TrackPoint, track_table::{mean_lat_lon, TrackTable}};
use serde::{Deserialize, Serialize};

use crate::{binning::{bin_by_time, DEFAULT_BIN_WIDTH}, geometry::{BritishNationalGrid, Equirectangular, Projection, Resampler, DEFAULT_STEP_METRES}, DataStoreError};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum ProjectionKind {
    BritishNationalGrid,
    Equirectangular { reference_latitude: f64 },
}

impl ProjectionKind {
    pub fn build(&self) -> Box<dyn Projection + Send + Sync> {
        match *self {
            ProjectionKind::BritishNationalGrid => Box::new(BritishNationalGrid),
            ProjectionKind::Equirectangular { reference_latitude } => Box::new(Equirectangular::new(reference_latitude)),
        }
    }
}

/// How each file is reduced before aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Bucket width for averaging single-segment files. `None` disables binning.
    pub time_bin: Option<TimeDelta>,
    /// Spacing of the resampled output. `None` keeps the (binned) points as they are.
    pub step_metres: Option<f64>,
    pub projection: ProjectionKind,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            time_bin: Some(DEFAULT_BIN_WIDTH),
            step_metres: Some(DEFAULT_STEP_METRES),
            projection: ProjectionKind::BritishNationalGrid,
        }
    }
}

/// The options a snapshot was built with, in a serializable form.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
struct BuildSettings {
    time_bin_ms: Option<i64>,
    step_metres: Option<f64>,
    projection: ProjectionKind,
}

impl From<&LoadOptions> for BuildSettings {
    fn from(options: &LoadOptions) -> Self {
        Self {
            time_bin_ms: options.time_bin.map(|width| width.num_milliseconds()),
            step_metres: options.step_metres,
            projection: options.projection,
        }
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    settings: Option<BuildSettings>,
    dataset: &'a Dataset,
}

#[derive(Deserialize)]
struct Snapshot {
    settings: Option<BuildSettings>,
    dataset: Dataset,
}

/// All points from all loaded files, concatenated in load order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Dataset {
    pub sources: Vec<String>,
    pub track_points: Vec<TrackPoint>,
}

impl Dataset {
    /// Concatenates tables in order. Points shared between files are kept.
    pub fn aggregate(tables: impl IntoIterator<Item = TrackTable>) -> Self {
        let mut dataset = Dataset::default();
        for table in tables {
            dataset.sources.push(table.source);
            dataset.track_points.extend(table.track_points);
        }
        dataset
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStats {
    pub files: usize,
    pub points: usize,
    pub mean_lat_lon: Option<(f64, f64)>,
}

/// Read-only handle to the combined dataset. Cloning shares the same data.
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    dataset: Arc<Dataset>,
    settings: Option<BuildSettings>,
}

impl DataStore {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            settings: None,
        }
    }

    /// Reads, reduces and aggregates the files in the given order. The first failing file aborts the load.
    pub fn load<P: AsRef<Path>>(paths: &[P], options: &LoadOptions) -> Result<Self, DataStoreError> {
        let resampler = options.step_metres
            .map(|step| Resampler::new(options.projection.build(), step))
            .transpose()?;

        let mut tables = Vec::with_capacity(paths.len());
        for path in paths {
            let table = crate::read_gpx(path)?;
            tables.push(reduce(table, options, resampler.as_ref())?);
        }

        let dataset = Dataset::aggregate(tables);
        tracing::info!("Loaded {} points from {} files", dataset.track_points.len(), dataset.sources.len());
        Ok(Self {
            dataset: Arc::new(dataset),
            settings: Some(options.into()),
        })
    }

    pub fn load_dir(dir: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, DataStoreError> {
        let paths = gpx_files(dir.as_ref())?;
        if paths.is_empty() {
            tracing::warn!("No GPX files found in {}", dir.as_ref().display());
        }
        Self::load(&paths, options)
    }

    /// Uses the snapshot when present and built with the same options, otherwise reads the GPX
    /// directory and writes a fresh snapshot.
    pub fn load_or_build(gpx_dir: impl AsRef<Path>, snapshot: impl AsRef<Path>, options: &LoadOptions, rebuild: bool) -> Result<Self, DataStoreError> {
        let snapshot = snapshot.as_ref();
        if !rebuild && snapshot.exists() {
            tracing::info!("Reading dataset snapshot {}", snapshot.display());
            match Self::load_snapshot(snapshot) {
                Ok(store) if store.built_with(options) => return Ok(store),
                Ok(_) => tracing::warn!("Snapshot {} was built with different options, rebuilding", snapshot.display()),
                Err(e) => tracing::warn!("{e}, rebuilding"),
            }
        }

        let store = Self::load_dir(gpx_dir, options)?;
        store.save_snapshot(snapshot)?;
        Ok(store)
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), DataStoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DataStoreError::Io(format!("Failed to create directory {}: {e}", parent.display())))?;
        }

        let file = File::create(path)
            .map_err(|e| DataStoreError::Io(format!("Failed to create {}: {e}", path.display())))?;
        let snapshot = SnapshotRef {
            settings: self.settings,
            dataset: self.dataset.as_ref(),
        };
        bincode::serialize_into(BufWriter::new(file), &snapshot)
            .map_err(|e| DataStoreError::Snapshot(format!("Failed to write {}: {e}", path.display())))?;

        tracing::debug!("Wrote snapshot {}", path.display());
        Ok(())
    }

    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, DataStoreError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| DataStoreError::Io(format!("Failed to open {}: {e}", path.display())))?;
        let snapshot: Snapshot = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| DataStoreError::Snapshot(format!("Failed to read {}: {e}", path.display())))?;
        Ok(Self {
            dataset: Arc::new(snapshot.dataset),
            settings: snapshot.settings,
        })
    }

    /// False for stores built by hand with [`DataStore::new`] and for other load options.
    pub fn built_with(&self, options: &LoadOptions) -> bool {
        self.settings == Some(BuildSettings::from(options))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn track_points(&self) -> &[TrackPoint] {
        &self.dataset.track_points
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            files: self.dataset.sources.len(),
            points: self.dataset.track_points.len(),
            mean_lat_lon: mean_lat_lon(&self.dataset.track_points),
        }
    }
}

/// Bins single-segment files with complete timestamps, then resamples.
fn reduce<P: Projection>(mut table: TrackTable, options: &LoadOptions, resampler: Option<&Resampler<P>>) -> Result<TrackTable, DataStoreError> {
    if let Some(width) = options.time_bin {
        if table.is_single_segment() && table.has_complete_timestamps() {
            if let Some(binned) = bin_by_time(&table.track_points, width)? {
                table.track_points = binned;
            }
        } else {
            tracing::debug!("{}: {} segments or missing timestamps, not binning", table.source, table.segment_count);
        }
    }

    if let Some(resampler) = resampler {
        table.track_points = resampler.resample(&table.track_points);
    }

    match table.mean_lat_lon() {
        Some((lat, lon)) => tracing::info!("{}: {} points, mean lat: {lat:.5}, mean lon: {lon:.5}", table.source, table.len()),
        None => tracing::info!("{}: no points", table.source),
    }

    Ok(table)
}

/// `*.gpx` files in a directory, sorted by path.
pub fn gpx_files(dir: &Path) -> Result<Vec<PathBuf>, DataStoreError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| DataStoreError::Io(format!("Failed to read directory {}: {e}", dir.display())))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| DataStoreError::Io(format!("Failed to read directory {}: {e}", dir.display())))?
            .path();

        let is_gpx = path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"));
        if is_gpx && path.is_file() {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}
