use std::{collections::HashSet, path::Path};

use heatmap_lib::{heatmap_params::{HeatmapParams, MapView}, track_point::TrackPoint};

use crate::{DataStore, DataStoreError};

use super::{load_marker_popups, ImageMarker, MarkerPopup};

const LEAFLET_VERSION: &str = "1.9.4";
const LEAFLET_HEAT_VERSION: &str = "0.2.0";

/// `[lat, lon]` pairs with incomplete points removed and exact duplicates dropped.
/// The first occurrence of each pair keeps its position.
pub fn sanitize_points(points: &[TrackPoint]) -> Vec<[f64; 2]> {
    let mut seen = HashSet::with_capacity(points.len());
    points.iter()
        .filter_map(TrackPoint::lat_lon)
        // + 0.0 folds -0.0 into 0.0
        .filter(|(lat, lon)| seen.insert(((lat + 0.0).to_bits(), (lon + 0.0).to_bits())))
        .map(|(lat, lon)| [lat, lon])
        .collect()
}

/// Builds Leaflet heatmap documents. Marker images are read once, when the renderer is created.
#[derive(Debug, Clone, Default)]
pub struct HeatmapRenderer {
    view: MapView,
    markers: Vec<MarkerPopup>,
}

impl HeatmapRenderer {
    pub fn new(view: MapView) -> Self {
        Self {
            view,
            markers: Vec::new(),
        }
    }

    pub fn with_markers(mut self, asset_dir: &Path, markers: &[ImageMarker]) -> Self {
        self.markers = load_marker_popups(asset_dir, markers);
        tracing::debug!("Loaded {} of {} map markers", self.markers.len(), markers.len());
        self
    }

    pub fn markers(&self) -> &[MarkerPopup] {
        &self.markers
    }

    pub fn render(&self, store: &DataStore, params: &HeatmapParams) -> Result<String, DataStoreError> {
        let points = sanitize_points(store.track_points());
        let points_json = serde_json::to_string(&points)
            .map_err(|e| DataStoreError::Render(format!("Failed to encode heat points: {e}")))?;
        let markers_json = serde_json::to_string(&self.markers)
            .map_err(|e| DataStoreError::Render(format!("Failed to encode markers: {e}")))?;

        tracing::debug!("Rendering {} heat points with {:?}", points.len(), params);

        Ok(format!(r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.heat@{LEAFLET_HEAT_VERSION}/dist/leaflet-heat.js"></script>
<style>html, body, #map {{ width: 100%; height: 100%; margin: 0; padding: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
const map = L.map("map").setView([{lat}, {lon}], {zoom});
L.tileLayer("https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
    maxZoom: 18,
    attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
L.heatLayer({points_json}, {{ radius: {radius}, blur: {blur}, minOpacity: {min_opacity} }}).addTo(map);
for (const marker of {markers_json}) {{
    L.marker([marker.lat, marker.lon])
        .bindPopup('<img src="' + marker.image + '" style="height:180px;">', {{ minWidth: 200, maxWidth: 200 }})
        .bindTooltip("Click me!")
        .addTo(map);
}}
</script>
</body>
</html>
"#,
            lat = self.view.centre_lat,
            lon = self.view.centre_lon,
            zoom = self.view.zoom,
            radius = params.radius,
            blur = params.blur,
            min_opacity = params.min_opacity,
        ))
    }

    /// Renders and writes the document, creating parent directories. Returns the document.
    pub fn render_to_file(&self, store: &DataStore, params: &HeatmapParams, path: &Path) -> Result<String, DataStoreError> {
        let html = self.render(store, params)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DataStoreError::Io(format!("Failed to create directory {}: {e}", parent.display())))?;
        }
        std::fs::write(path, &html)
            .map_err(|e| DataStoreError::Io(format!("Failed to write {}: {e}", path.display())))?;

        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{render::IMAGE_MARKERS, Dataset};

    fn store(points: Vec<TrackPoint>) -> DataStore {
        DataStore::new(Dataset { sources: vec!["test.gpx".into()], track_points: points })
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("heatmap_render_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn sanitize_drops_nulls_and_duplicates() {
        let points = vec![
            TrackPoint::resampled(-2.0, 54.0),
            TrackPoint::resampled(-2.1, 54.1),
            TrackPoint::resampled(-2.0, 54.0),
            TrackPoint::resampled(-2.2, f64::NAN),
            TrackPoint::resampled(-2.1, 54.1),
        ];

        assert_eq!(sanitize_points(&points), vec![[54.0, -2.0], [54.1, -2.1]]);
    }

    #[test]
    fn sanitize_keeps_points_sharing_one_coordinate() {
        let points = vec![TrackPoint::resampled(-2.0, 54.0), TrackPoint::resampled(-2.5, 54.0)];
        assert_eq!(sanitize_points(&points).len(), 2);
    }

    #[test]
    fn signed_zeros_are_the_same_coordinate() {
        let points = vec![
            TrackPoint::resampled(0.0, 51.5),
            TrackPoint::resampled(-0.0, 51.5),
            TrackPoint::resampled(-0.0, -0.0),
            TrackPoint::resampled(0.0, 0.0),
        ];
        let sanitized = sanitize_points(&points);
        assert_eq!(sanitized.len(), 2);
        assert_eq!(sanitized[0][1].to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn document_carries_parameters() {
        let renderer = HeatmapRenderer::new(MapView::default());
        let html = renderer
            .render(&store(vec![TrackPoint::resampled(-2.0, 54.0), TrackPoint::resampled(-2.0, 54.0)]), &HeatmapParams::new(12, 7, 0.6))
            .unwrap();

        assert!(html.contains("L.heatLayer([[54.0,-2.0]], { radius: 12, blur: 7, minOpacity: 0.6 })"));
        assert!(html.contains("setView([54.083797, -2.858426], 6)"));
        assert!(html.contains("for (const marker of [])"));
    }

    #[test]
    fn empty_dataset_still_renders() {
        let html = HeatmapRenderer::default().render(&DataStore::default(), &HeatmapParams::default()).unwrap();
        assert!(html.contains("L.heatLayer([], { radius: 10, blur: 15, minOpacity: 0.4 })"));
    }

    #[test]
    fn markers_are_embedded() {
        let dir = scratch_dir("markers");
        std::fs::write(dir.join("Harry.png"), b"abc").unwrap();

        let renderer = HeatmapRenderer::new(MapView::default()).with_markers(&dir, &IMAGE_MARKERS);
        assert_eq!(renderer.markers().len(), 1);

        let html = renderer.render(&DataStore::default(), &HeatmapParams::default()).unwrap();
        assert!(html.contains(r#""name":"Harry","lat":54.4569,"lon":-2.9498,"image":"data:image/png;base64,YWJj""#));
        assert!(html.contains("Click me!"));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn writes_document_to_file() {
        let dir = scratch_dir("output");
        let path = dir.join("maps").join("heatmap.html");

        let html = HeatmapRenderer::default()
            .render_to_file(&store(vec![TrackPoint::resampled(-2.0, 54.0)]), &HeatmapParams::default(), &path)
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), html);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
