use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use heatmap_lib::track_point::TrackPoint;

use crate::DataStoreError;

pub const DEFAULT_BIN_WIDTH: TimeDelta = TimeDelta::minutes(1);

#[derive(Default)]
struct Bucket {
    lon_sum: f64,
    lat_sum: f64,
    points: usize,
    ele_sum: f64,
    elevations: usize,
}

impl Bucket {
    fn add(&mut self, point: &TrackPoint) {
        self.lon_sum += point.longitude;
        self.lat_sum += point.latitude;
        self.points += 1;
        if let Some(ele) = point.elevation {
            self.ele_sum += ele;
            self.elevations += 1;
        }
    }

    fn mean(&self, start: DateTime<Utc>) -> TrackPoint {
        let n = self.points as f64;
        let elevation = (self.elevations > 0).then(|| self.ele_sum / self.elevations as f64);
        TrackPoint::new(self.lon_sum / n, self.lat_sum / n, elevation, Some(start))
    }
}

/// Groups points into fixed width time buckets and replaces each bucket with its mean position.
///
/// Returns `Ok(None)` when any point lacks a timestamp, as binning needs a complete time series.
/// The output is ordered by bucket start and each point's timestamp is its bucket start.
pub fn bin_by_time(points: &[TrackPoint], width: TimeDelta) -> Result<Option<Vec<TrackPoint>>, DataStoreError> {
    let width_us = width.num_microseconds()
        .filter(|us| *us > 0)
        .ok_or_else(|| DataStoreError::InvalidBinWidth(format!("{width} is not a positive duration")))?;

    let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();
    for point in points {
        let Some(timestamp) = point.timestamp else {
            return Ok(None);
        };
        let start = timestamp.timestamp_micros().div_euclid(width_us) * width_us;
        buckets.entry(start).or_default().add(point);
    }

    buckets.into_iter()
        .map(|(start, bucket)| {
            DateTime::from_timestamp_micros(start)
                .map(|start| bucket.mean(start))
                .ok_or_else(|| DataStoreError::InvalidBinWidth(format!("bucket start {start}us is out of range")))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2020, 6, 1, h, m, s).unwrap())
    }

    #[test]
    fn groups_by_minute() {
        let points = vec![
            TrackPoint::new(-2.0, 54.0, Some(100.), at(10, 0, 15)),
            TrackPoint::new(-2.2, 54.2, Some(110.), at(10, 0, 45)),
            TrackPoint::new(-2.5, 54.5, None, at(10, 1, 5)),
        ];

        let binned = bin_by_time(&points, DEFAULT_BIN_WIDTH).unwrap().unwrap();

        assert_eq!(binned.len(), 2);
        assert_eq!(binned[0].timestamp, at(10, 0, 0));
        assert!((binned[0].longitude - -2.1).abs() < 1e-12);
        assert!((binned[0].latitude - 54.1).abs() < 1e-12);
        assert_eq!(binned[0].elevation, Some(105.));

        assert_eq!(binned[1].timestamp, at(10, 1, 0));
        assert_eq!(binned[1].longitude, -2.5);
        assert_eq!(binned[1].elevation, None);
    }

    #[test]
    fn output_follows_bucket_order() {
        let points = vec![
            TrackPoint::new(1., 1., None, at(10, 5, 0)),
            TrackPoint::new(2., 2., None, at(10, 2, 0)),
            TrackPoint::new(3., 3., None, at(10, 5, 59)),
        ];

        let binned = bin_by_time(&points, DEFAULT_BIN_WIDTH).unwrap().unwrap();
        let lons: Vec<f64> = binned.iter().map(|p| p.longitude).collect();
        assert_eq!(lons, vec![2., 2.]);
        assert_eq!(binned[0].timestamp, at(10, 2, 0));
        assert_eq!(binned[1].timestamp, at(10, 5, 0));
    }

    #[test]
    fn skipped_when_a_timestamp_is_missing() {
        let points = vec![
            TrackPoint::new(1., 1., None, at(10, 0, 0)),
            TrackPoint::new(2., 2., None, None),
        ];
        assert_eq!(bin_by_time(&points, DEFAULT_BIN_WIDTH).unwrap(), None);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(bin_by_time(&[], DEFAULT_BIN_WIDTH).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn floors_before_the_epoch() {
        let before = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 30).unwrap();
        let points = vec![TrackPoint::new(0., 0., None, Some(before))];
        let binned = bin_by_time(&points, DEFAULT_BIN_WIDTH).unwrap().unwrap();
        assert_eq!(binned[0].timestamp, Some(Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 0).unwrap()));
    }

    #[test]
    fn rejects_non_positive_width() {
        assert!(matches!(bin_by_time(&[], TimeDelta::zero()), Err(DataStoreError::InvalidBinWidth(_))));
        assert!(matches!(bin_by_time(&[], TimeDelta::seconds(-60)), Err(DataStoreError::InvalidBinWidth(_))));
    }
}
