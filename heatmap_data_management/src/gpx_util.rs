use std::{fs::File, io::{BufReader, Read}, path::Path};

use chrono::{DateTime, Utc};
use heatmap_lib::{track_point::TrackPoint, track_table::TrackTable};
use time::OffsetDateTime;

use crate::DataStoreError;

pub fn read_gpx(path: impl AsRef<Path>) -> Result<TrackTable, DataStoreError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| DataStoreError::Io(format!("Failed to open {}: {e}", path.display())))?;
    read_gpx_from(BufReader::new(file), &path.display().to_string())
}

/// Parses a GPX document and flattens every segment of every track, in document order.
pub fn read_gpx_from<R: Read>(reader: R, source: &str) -> Result<TrackTable, DataStoreError> {
    let gpx = gpx::read(reader)
        .map_err(|e| DataStoreError::Parse(format!("{source} is not valid GPX: {e}")))?;

    let track_count = gpx.tracks.len();
    let segment_count = gpx.tracks.iter().map(|track| track.segments.len()).sum();

    let mut track_points = Vec::with_capacity(
        gpx.tracks.iter()
            .flat_map(|track| track.segments.iter())
            .map(|segment| segment.points.len())
            .sum(),
    );

    for segment in gpx.tracks.iter().flat_map(|track| track.segments.iter()) {
        for point in &segment.points {
            let timestamp = match &point.time {
                Some(time) => Some(to_utc(time.clone().into()).ok_or_else(|| {
                    DataStoreError::Parse(format!("{source} has a point with an out of range timestamp"))
                })?),
                None => None,
            };

            let position = point.point();
            track_points.push(TrackPoint::new(position.x(), position.y(), point.elevation, timestamp));
        }
    }

    if track_count != 1 || segment_count != 1 {
        tracing::debug!("{source}: flattened {segment_count} segments from {track_count} tracks");
    }

    Ok(TrackTable::new(source.to_string(), track_count, segment_count, track_points))
}

fn to_utc(time: OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.unix_timestamp(), time.nanosecond())
}
