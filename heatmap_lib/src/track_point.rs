use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded position. Longitude and latitude are WGS84 degrees, elevation is in meters.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl TrackPoint {
    pub fn new(longitude: f64, latitude: f64, elevation: Option<f64>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            longitude,
            latitude,
            elevation,
            timestamp,
        }
    }

    /// A point produced by interpolation. Elevation and time are not carried through.
    pub fn resampled(longitude: f64, latitude: f64) -> Self {
        Self::new(longitude, latitude, None, None)
    }

    /// Returns `(lat, lon)` when both coordinates are present. NaN and infinities count as missing.
    pub fn lat_lon(&self) -> Option<(f64, f64)> {
        if self.latitude.is_finite() && self.longitude.is_finite() {
            Some((self.latitude, self.longitude))
        } else {
            None
        }
    }
}
