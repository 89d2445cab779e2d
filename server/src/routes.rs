use std::{path::Path, sync::Arc};

use axum::{
    extract::{Query, State}, http::StatusCode, response::{Html, IntoResponse, Response}, routing::get, Json, Router
};
use heatmap_lib::heatmap_params::HeatmapParams;
use tower_http::services::ServeDir;

use crate::server_state::ServerState;

pub fn router(state: Arc<ServerState>, asset_dir: &Path) -> Router {
    Router::new()
        .nest_service("/assets", ServeDir::new(asset_dir))
        .route("/", get(get_dashboard))
        .route("/map", get(get_map))
        .route("/reset", get(get_reset))
        .with_state(state)
}

pub async fn get_dashboard(State(state): State<Arc<ServerState>>) -> Html<String> {
    Html(state.dashboard.clone())
}

/// Renders the heatmap for the slider values and returns the document.
pub async fn get_map(State(state): State<Arc<ServerState>>, Query(params): Query<HeatmapParams>) -> Response {
    if let Err(err) = params.validate() {
        tracing::warn!("Rejected map request: {err}");
        return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
    }

    let _guard = state.render_lock.lock().await;
    match state.renderer.render_to_file(&state.data_store, &params, &state.map_output) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::error!("Failed to render map: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}

/// The slider values restored by the reset button.
pub async fn get_reset() -> Json<HeatmapParams> {
    Json(HeatmapParams::default())
}
