use std::{fmt, ops::RangeInclusive};

use serde::{Deserialize, Serialize};

pub const RADIUS_RANGE: RangeInclusive<u32> = 1..=30;
pub const BLUR_RANGE: RangeInclusive<u32> = 1..=20;
pub const MIN_OPACITY_RANGE: RangeInclusive<f64> = 0.1..=1.0;
pub const MIN_OPACITY_STEP: f64 = 0.1;

pub const DEFAULT_RADIUS: u32 = 10;
pub const DEFAULT_BLUR: u32 = 15;
pub const DEFAULT_MIN_OPACITY: f64 = 0.4;

/// Rendering parameters controlled by the dashboard sliders.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct HeatmapParams {
    pub radius: u32,
    pub blur: u32,
    pub min_opacity: f64,
}

impl Default for HeatmapParams {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            blur: DEFAULT_BLUR,
            min_opacity: DEFAULT_MIN_OPACITY,
        }
    }
}

impl HeatmapParams {
    pub fn new(radius: u32, blur: u32, min_opacity: f64) -> Self {
        Self {
            radius,
            blur,
            min_opacity,
        }
    }

    /// The values the reset button restores, regardless of current state.
    pub fn reset(&mut self) -> Self {
        *self = Self::default();
        *self
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if !RADIUS_RANGE.contains(&self.radius) {
            return Err(ParamError::Radius(self.radius));
        }
        if !BLUR_RANGE.contains(&self.blur) {
            return Err(ParamError::Blur(self.blur));
        }
        if !min_opacity_allowed(self.min_opacity) {
            return Err(ParamError::MinOpacity(self.min_opacity));
        }
        Ok(())
    }
}

/// In range and on the slider grid, give or take float noise such as 0.30000000000000004.
fn min_opacity_allowed(opacity: f64) -> bool {
    const TOLERANCE: f64 = 1e-9;

    let steps = opacity / MIN_OPACITY_STEP;
    opacity.is_finite()
        && *MIN_OPACITY_RANGE.start() - TOLERANCE <= opacity
        && opacity <= *MIN_OPACITY_RANGE.end() + TOLERANCE
        && (steps - steps.round()).abs() < TOLERANCE
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamError {
    Radius(u32),
    Blur(u32),
    MinOpacity(f64),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::Radius(r) => write!(f, "radius {r} outside {}..={}", RADIUS_RANGE.start(), RADIUS_RANGE.end()),
            ParamError::Blur(b) => write!(f, "blur {b} outside {}..={}", BLUR_RANGE.start(), BLUR_RANGE.end()),
            ParamError::MinOpacity(o) => write!(f, "min_opacity {o} outside {}..={} in steps of {MIN_OPACITY_STEP}", MIN_OPACITY_RANGE.start(), MIN_OPACITY_RANGE.end()),
        }
    }
}

impl std::error::Error for ParamError {}

/// Where the map opens.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MapView {
    pub centre_lat: f64,
    pub centre_lon: f64,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            centre_lat: 54.083797,
            centre_lon: -2.858426,
            zoom: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_defaults() {
        let mut params = HeatmapParams::new(27, 3, 0.9);
        let reset = params.reset();
        assert_eq!(reset, params);
        assert_eq!((reset.radius, reset.blur, reset.min_opacity), (10, 15, 0.4));

        let mut untouched = HeatmapParams::default();
        assert_eq!(untouched.reset(), HeatmapParams::new(10, 15, 0.4));
    }

    #[test]
    fn validate_bounds() {
        assert!(HeatmapParams::default().validate().is_ok());
        assert!(HeatmapParams::new(1, 1, 0.1).validate().is_ok());
        assert!(HeatmapParams::new(30, 20, 1.0).validate().is_ok());
        assert!(HeatmapParams::new(10, 15, 0.1 + 0.2).validate().is_ok());

        assert_eq!(HeatmapParams::new(0, 15, 0.4).validate(), Err(ParamError::Radius(0)));
        assert_eq!(HeatmapParams::new(31, 15, 0.4).validate(), Err(ParamError::Radius(31)));
        assert_eq!(HeatmapParams::new(10, 21, 0.4).validate(), Err(ParamError::Blur(21)));
        assert!(matches!(HeatmapParams::new(10, 15, 0.0).validate(), Err(ParamError::MinOpacity(_))));
        assert!(matches!(HeatmapParams::new(10, 15, f64::NAN).validate(), Err(ParamError::MinOpacity(_))));
    }

    #[test]
    fn min_opacity_must_sit_on_the_slider_grid() {
        assert!(HeatmapParams::new(10, 15, 0.7).validate().is_ok());
        assert!(HeatmapParams::new(10, 15, 0.1 * 3.0).validate().is_ok());

        for opacity in [0.06, 0.08, 1.04, 0.37, 1.1] {
            assert_eq!(
                HeatmapParams::new(10, 15, opacity).validate(),
                Err(ParamError::MinOpacity(opacity)),
                "{opacity} should be rejected"
            );
        }
    }

    #[test]
    fn missing_query_fields_fall_back_to_defaults() {
        let params: HeatmapParams = serde_json::from_str(r#"{"radius": 20}"#).unwrap();
        assert_eq!(params, HeatmapParams::new(20, 15, 0.4));
    }
}
