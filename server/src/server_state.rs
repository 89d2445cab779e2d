use std::path::PathBuf;

use heatmap_data_management::{render::HeatmapRenderer, DataStore};
use tokio::sync::Mutex;

pub struct ServerState {
    // Loaded once at startup and only read afterwards.
    pub data_store: DataStore,
    pub renderer: HeatmapRenderer,
    pub dashboard: String,
    // Every render overwrites this file, so renders take the lock.
    pub map_output: PathBuf,
    pub render_lock: Mutex<()>,
}

impl ServerState {
    pub fn new(data_store: DataStore, renderer: HeatmapRenderer, dashboard: String, map_output: PathBuf) -> Self {
        Self {
            data_store,
            renderer,
            dashboard,
            map_output,
            render_lock: Mutex::new(()),
        }
    }
}
