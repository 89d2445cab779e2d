use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;

use crate::DataStoreError;

/// A fixed map annotation showing `<name>.png` from the asset directory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMarker {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl ImageMarker {
    pub const fn new(name: &'static str, latitude: f64, longitude: f64) -> Self {
        Self { name, latitude, longitude }
    }
}

pub const IMAGE_MARKERS: [ImageMarker; 8] = [
    ImageMarker::new("Darren", 51.5525, -0.8051),
    ImageMarker::new("Dovestones", 53.5312, -1.9740),
    ImageMarker::new("Ewan", 53.5056, -2.2919),
    ImageMarker::new("Harry", 54.4569, -2.9498),
    ImageMarker::new("John", 57.2236, -2.3219),
    ImageMarker::new("Jon", 53.5312, -1.9740),
    ImageMarker::new("Laura", 53.2756, -2.7396),
    ImageMarker::new("Stephen", 53.4262, -2.3313),
];

/// A marker whose image has been read and encoded, ready to embed in a map document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarkerPopup {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub image: String,
}

/// Reads an image file into a `data:` URI.
pub fn embed_image(path: &Path) -> Result<String, DataStoreError> {
    let bytes = std::fs::read(path)
        .map_err(|e| DataStoreError::Io(format!("Failed to read image {}: {e}", path.display())))?;

    let mime = match path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.to_ascii_lowercase()).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    };

    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Loads the image for every marker. A marker whose image is missing is logged and left out.
pub fn load_marker_popups(asset_dir: &Path, markers: &[ImageMarker]) -> Vec<MarkerPopup> {
    markers.iter()
        .filter_map(|marker| {
            let path = asset_dir.join(format!("{}.png", marker.name));
            match embed_image(&path) {
                Ok(image) => Some(MarkerPopup {
                    name: marker.name.to_string(),
                    lat: marker.latitude,
                    lon: marker.longitude,
                    image,
                }),
                Err(err) => {
                    tracing::warn!("Skipping marker {}: {err}", marker.name);
                    None
                }
            }
        })
        .collect()
}
