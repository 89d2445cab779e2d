use serde::{Deserialize, Serialize};

use super::track_point::TrackPoint;

/// The points read from one GPX file, flattened over all of its segments.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TrackTable {
    pub source: String,
    pub track_count: usize,
    pub segment_count: usize,
    pub track_points: Vec<TrackPoint>,
}

impl TrackTable {
    pub fn new(source: String, track_count: usize, segment_count: usize, track_points: Vec<TrackPoint>) -> Self {
        Self {
            source,
            track_count,
            segment_count,
            track_points,
        }
    }

    /// True for the common layout of exactly one track holding exactly one segment.
    pub fn is_single_segment(&self) -> bool {
        self.track_count == 1 && self.segment_count == 1
    }

    /// True when every point carries a timestamp. An empty table counts as complete.
    pub fn has_complete_timestamps(&self) -> bool {
        self.track_points.iter().all(|p| p.timestamp.is_some())
    }

    pub fn len(&self) -> usize {
        self.track_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_points.is_empty()
    }

    /// Mean latitude and longitude over the present coordinates.
    pub fn mean_lat_lon(&self) -> Option<(f64, f64)> {
        mean_lat_lon(&self.track_points)
    }
}

pub fn mean_lat_lon(points: &[TrackPoint]) -> Option<(f64, f64)> {
    let (mut lat_sum, mut lon_sum, mut n) = (0., 0., 0usize);
    for (lat, lon) in points.iter().filter_map(TrackPoint::lat_lon) {
        lat_sum += lat;
        lon_sum += lon;
        n += 1;
    }

    if n == 0 {
        None
    } else {
        Some((lat_sum / n as f64, lon_sum / n as f64))
    }
}
