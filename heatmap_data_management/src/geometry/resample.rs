use geo_types::Coord;
use heatmap_lib::track_point::TrackPoint;

use crate::DataStoreError;

use super::Projection;

pub const DEFAULT_STEP_METRES: f64 = 10.0;

/// A projected point and its distance along the path from the first point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPoint {
    pub position: Coord,
    pub cumulative_distance: f64,
}

/// Resamples tracks at a uniform along-path spacing.
///
/// Longitude and latitude are interpolated independently against the cumulative planar
/// distance, so dense or slow sections no longer outweigh sparse ones on the heatmap.
/// Elevation and time are dropped from the output.
#[derive(Debug, Clone)]
pub struct Resampler<P: Projection> {
    projection: P,
    step: f64,
}

impl<P: Projection> Resampler<P> {
    pub fn new(projection: P, step: f64) -> Result<Self, DataStoreError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(DataStoreError::InvalidStep(step));
        }

        Ok(Self { projection, step })
    }

    pub fn planar_path(&self, points: &[TrackPoint]) -> Vec<PlanarPoint> {
        let mut path: Vec<PlanarPoint> = Vec::with_capacity(points.len());

        for point in points {
            let position = self.projection.project(point.longitude, point.latitude);
            let cumulative_distance = match path.last() {
                Some(prev) => prev.cumulative_distance + (position.x - prev.position.x).hypot(position.y - prev.position.y),
                None => 0.0,
            };
            path.push(PlanarPoint { position, cumulative_distance });
        }

        path
    }

    /// Target distances `k * step` for every `k` with `k * step < total`.
    pub fn sample_distances(&self, total: f64) -> impl Iterator<Item = f64> {
        let step = self.step;
        (0u64..)
            .map(move |k| k as f64 * step)
            .take_while(move |d| *d < total)
    }

    pub fn resample(&self, points: &[TrackPoint]) -> Vec<TrackPoint> {
        if points.len() < 2 {
            return Vec::new();
        }

        let path = self.planar_path(points);
        let distances: Vec<f64> = path.iter().map(|p| p.cumulative_distance).collect();
        let total = distances.last().copied().unwrap_or(0.0);

        // NaN coordinates poison the total; treat as nothing to traverse
        if !total.is_finite() || total <= 0.0 {
            return Vec::new();
        }

        let lons: Vec<f64> = points.iter().map(|p| p.longitude).collect();
        let lats: Vec<f64> = points.iter().map(|p| p.latitude).collect();

        self.sample_distances(total)
            .map(|d| TrackPoint::resampled(interpolate(d, &distances, &lons), interpolate(d, &distances, &lats)))
            .collect()
    }
}

/// Piecewise linear interpolation of `values` sampled at the non-decreasing `xs`.
///
/// Outside the sampled range the end values are held. Where `xs` repeats, the last sample at
/// that position is used, so the denominator is never zero.
pub fn interpolate(x: f64, xs: &[f64], values: &[f64]) -> f64 {
    debug_assert_eq!(xs.len(), values.len());
    let n = xs.len().min(values.len());
    if n == 0 {
        return f64::NAN;
    }

    // Index of the last sample with xs[i] <= x
    let upper = xs[..n].partition_point(|d| *d <= x);
    if upper == 0 {
        return values[0];
    }
    if upper >= n {
        return values[n - 1];
    }

    let i = upper - 1;
    let t = (x - xs[i]) / (xs[upper] - xs[i]);
    values[i] + t * (values[upper] - values[i])
}

#[cfg(test)]
mod tests {
    use geo_types::coord;

    use super::*;
    use crate::geometry::{BritishNationalGrid, Equirectangular};

    /// Treats longitude/latitude as planar meters.
    struct Identity;

    impl Projection for Identity {
        fn project(&self, longitude: f64, latitude: f64) -> Coord {
            coord! { x: longitude, y: latitude }
        }
    }

    fn pt(x: f64, y: f64) -> TrackPoint {
        TrackPoint::new(x, y, Some(50.), None)
    }

    #[test]
    fn rejects_bad_steps() {
        assert!(matches!(Resampler::new(Identity, 0.0), Err(DataStoreError::InvalidStep(_))));
        assert!(matches!(Resampler::new(Identity, -1.0), Err(DataStoreError::InvalidStep(_))));
        assert!(matches!(Resampler::new(Identity, f64::NAN), Err(DataStoreError::InvalidStep(_))));
        assert!(matches!(Resampler::new(Identity, f64::INFINITY), Err(DataStoreError::InvalidStep(_))));
    }

    #[test]
    fn cumulative_distance_starts_at_zero() {
        let resampler = Resampler::new(Identity, 10.0).unwrap();
        let path = resampler.planar_path(&[pt(0., 0.), pt(3., 4.), pt(3., 4.), pt(3., 10.)]);

        let distances: Vec<f64> = path.iter().map(|p| p.cumulative_distance).collect();
        assert_eq!(distances, vec![0., 5., 5., 11.]);
    }

    #[test]
    fn sample_count_is_ceil_of_total_over_step() {
        let resampler = Resampler::new(Identity, 10.0).unwrap();

        for (end, expected) in [(25.0, 3), (30.0, 3), (30.5, 4), (0.5, 1), (10.0, 1)] {
            let out = resampler.resample(&[pt(0., 0.), pt(end, 0.)]);
            assert_eq!(out.len(), expected, "path of length {end}");
            assert_eq!(out.len(), (end / 10.0_f64).ceil() as usize);
        }
    }

    #[test]
    fn samples_sit_at_multiples_of_step() {
        let resampler = Resampler::new(Identity, 10.0).unwrap();
        // L-shaped path: 20 east then 15 north
        let out = resampler.resample(&[pt(0., 0.), pt(20., 0.), pt(20., 15.)]);

        let got: Vec<(f64, f64)> = out.iter().map(|p| (p.longitude, p.latitude)).collect();
        assert_eq!(got, vec![(0., 0.), (10., 0.), (20., 0.), (20., 10.)]);
    }

    #[test]
    fn first_sample_is_first_point() {
        let points = [pt(-2.9, 54.1), pt(-2.8, 54.2), pt(-2.7, 54.25)];
        let out = Resampler::new(BritishNationalGrid, 10.0).unwrap().resample(&points);

        assert_eq!(out[0].longitude, -2.9);
        assert_eq!(out[0].latitude, 54.1);
    }

    #[test]
    fn output_drops_elevation_and_time() {
        let out = Resampler::new(Identity, 1.0).unwrap().resample(&[pt(0., 0.), pt(3., 0.)]);
        assert!(out.iter().all(|p| p.elevation.is_none() && p.timestamp.is_none()));
    }

    #[test]
    fn samples_are_bounded_by_their_segment() {
        let points = [pt(-2.0, 54.0), pt(-2.001, 54.003), pt(-2.004, 54.0035), pt(-2.0045, 54.001)];
        let resampler = Resampler::new(BritishNationalGrid, 10.0).unwrap();
        let path = resampler.planar_path(&points);
        let out = resampler.resample(&points);

        assert!(!out.is_empty());
        for (k, sample) in out.iter().enumerate() {
            let d = k as f64 * 10.0;
            let seg = path.windows(2).position(|w| w[0].cumulative_distance <= d && d < w[1].cumulative_distance).unwrap();
            let (a, b) = (points[seg], points[seg + 1]);
            assert!(sample.longitude >= a.longitude.min(b.longitude) && sample.longitude <= a.longitude.max(b.longitude));
            assert!(sample.latitude >= a.latitude.min(b.latitude) && sample.latitude <= a.latitude.max(b.latitude));
        }
    }

    #[test]
    fn spacing_is_uniform_in_metres() {
        let points = [pt(-2.0, 54.0), pt(-2.0, 54.01)];
        let resampler = Resampler::new(BritishNationalGrid, 10.0).unwrap();
        let out = resampler.resample(&points);

        let path = resampler.planar_path(&out);
        for w in path.windows(2) {
            let gap = w[1].cumulative_distance - w[0].cumulative_distance;
            assert!((gap - 10.0).abs() < 0.01, "gap {gap}");
        }
    }

    #[test]
    fn short_tracks_are_empty() {
        let resampler = Resampler::new(Identity, 10.0).unwrap();
        assert!(resampler.resample(&[]).is_empty());
        assert!(resampler.resample(&[pt(1., 1.)]).is_empty());
    }

    #[test]
    fn zero_length_track_is_empty() {
        let resampler = Resampler::new(Equirectangular::new(54.0), 10.0).unwrap();
        assert!(resampler.resample(&[pt(-2., 54.), pt(-2., 54.), pt(-2., 54.)]).is_empty());
    }

    #[test]
    fn interpolate_matches_np_interp() {
        let xs = [0., 5., 5., 10.];
        let ys = [0., 1., 3., 4.];

        assert_eq!(interpolate(-1., &xs, &ys), 0.);
        assert_eq!(interpolate(2.5, &xs, &ys), 0.5);
        // Repeated x takes the later sample
        assert_eq!(interpolate(5., &xs, &ys), 3.);
        assert_eq!(interpolate(7.5, &xs, &ys), 3.5);
        assert_eq!(interpolate(10., &xs, &ys), 4.);
        assert_eq!(interpolate(11., &xs, &ys), 4.);
        assert!(interpolate(1., &[], &[]).is_nan());
    }
}
