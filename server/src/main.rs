use std::{fs::OpenOptions, net::{IpAddr, SocketAddr}, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use heatmap_data_management::{
    geometry::DEFAULT_STEP_METRES, project_path, render::{HeatmapRenderer, IMAGE_MARKERS}, DataStore, LoadOptions,
    ASSET_DIR, GPX_DIR, MAP_OUTPUT_PATH, SNAPSHOT_PATH,
};
use heatmap_lib::heatmap_params::MapView;
use server::{dashboard, routes, server_state::ServerState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(about = "Serves the interactive GPX heatmap dashboard", long_about = None)]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,
    #[arg(long, default_value_t = 8050)]
    port: u16,
    /// Directory scanned for *.gpx files when no snapshot exists
    #[arg(long, default_value = GPX_DIR)]
    gpx_dir: PathBuf,
    #[arg(long, default_value = SNAPSHOT_PATH)]
    snapshot: PathBuf,
    /// Re-read the GPX files even if a snapshot exists
    #[arg(long)]
    rebuild: bool,
    /// Resampling distance in metres
    #[arg(long, default_value_t = DEFAULT_STEP_METRES)]
    step: f64,
    /// Branding and marker images
    #[arg(long, default_value = ASSET_DIR)]
    assets: PathBuf,
    /// Where each rendered map document is written
    #[arg(long, default_value = MAP_OUTPUT_PATH)]
    output: PathBuf,
    #[arg(long, default_value = "log")]
    log_dir: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_dir = project_path(&args.log_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("server.log"))
        .context("Failed to open server log")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=debug,heatmap_data_management=info", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Reading data...");

    let options = LoadOptions {
        step_metres: Some(args.step),
        ..Default::default()
    };
    let data_store = DataStore::load_or_build(project_path(&args.gpx_dir), project_path(&args.snapshot), &options, args.rebuild)?;

    let asset_dir = project_path(&args.assets);
    let renderer = HeatmapRenderer::new(MapView::default()).with_markers(&asset_dir, &IMAGE_MARKERS);
    let page = dashboard::render_dashboard(&dashboard::available_logos(&asset_dir));

    let stats = data_store.stats();
    tracing::info!("Done. {} points from {} files", stats.points, stats.files);

    let server_state = Arc::new(ServerState::new(data_store, renderer, page, project_path(&args.output)));
    let app = routes::router(server_state, &asset_dir);

    let addr = SocketAddr::from((args.bind, args.port));
    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
