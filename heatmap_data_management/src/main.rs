use std::path::PathBuf;

use anyhow::Context;
use chrono::TimeDelta;
use clap::{Args, Parser, Subcommand, ValueEnum};
use heatmap_data_management::{
    geometry::DEFAULT_STEP_METRES, project_path, render::{HeatmapRenderer, IMAGE_MARKERS}, DataStore, LoadOptions,
    ProjectionKind, ASSET_DIR, GPX_DIR, MAP_OUTPUT_PATH, SNAPSHOT_PATH,
};
use heatmap_lib::heatmap_params::{HeatmapParams, MapView, DEFAULT_BLUR, DEFAULT_MIN_OPACITY, DEFAULT_RADIUS};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "HeatmapCLI")]
#[command(about = "Builds the GPX coordinate dataset and writes heatmaps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read every GPX file in a directory and write the dataset snapshot
    Build {
        #[command(flatten)]
        load: LoadArgs,
        /// Snapshot file to write
        #[arg(long, default_value = SNAPSHOT_PATH)]
        snapshot: PathBuf,
    },
    /// Write a heatmap document from the given GPX files, or from the snapshot when none are given
    Render {
        files: Vec<PathBuf>,
        #[command(flatten)]
        load: LoadArgs,
        #[arg(long, default_value = SNAPSHOT_PATH)]
        snapshot: PathBuf,
        #[arg(short, long, default_value = MAP_OUTPUT_PATH)]
        output: PathBuf,
        #[arg(long, default_value_t = DEFAULT_RADIUS)]
        radius: u32,
        #[arg(long, default_value_t = DEFAULT_BLUR)]
        blur: u32,
        #[arg(long, default_value_t = DEFAULT_MIN_OPACITY)]
        min_opacity: f64,
        /// Directory holding the marker images
        #[arg(long, default_value = ASSET_DIR)]
        assets: PathBuf,
        /// Leave out the image markers
        #[arg(long)]
        no_markers: bool,
    },
    /// Print point counts and mean position of the dataset snapshot
    Stats {
        #[arg(long, default_value = SNAPSHOT_PATH)]
        snapshot: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ProjectionArg {
    /// British National Grid
    Bng,
    /// Equirectangular around the map centre latitude
    Local,
}

#[derive(Args)]
struct LoadArgs {
    /// Directory scanned for *.gpx files
    #[arg(long, default_value = GPX_DIR)]
    gpx_dir: PathBuf,
    /// Resampling distance in metres
    #[arg(long, default_value_t = DEFAULT_STEP_METRES)]
    step: f64,
    /// Keep original point spacing
    #[arg(long)]
    no_resample: bool,
    /// Width of the time buckets used to average single track files, in seconds
    #[arg(long, default_value_t = 60)]
    bin_seconds: i64,
    #[arg(long)]
    no_binning: bool,
    #[arg(long, value_enum, default_value_t = ProjectionArg::Bng)]
    projection: ProjectionArg,
}

impl LoadArgs {
    fn options(&self) -> anyhow::Result<LoadOptions> {
        let bin_width = TimeDelta::try_seconds(self.bin_seconds)
            .with_context(|| format!("Bin width of {} seconds is out of range", self.bin_seconds))?;

        Ok(LoadOptions {
            time_bin: (!self.no_binning).then_some(bin_width),
            step_metres: (!self.no_resample).then_some(self.step),
            projection: match self.projection {
                ProjectionArg::Bng => ProjectionKind::BritishNationalGrid,
                ProjectionArg::Local => ProjectionKind::Equirectangular { reference_latitude: MapView::default().centre_lat },
            },
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { load, snapshot } => {
            let store = DataStore::load_dir(project_path(&load.gpx_dir), &load.options()?)?;
            store.save_snapshot(project_path(&snapshot))?;
            let stats = store.stats();
            println!("Wrote {} points from {} files to {}", stats.points, stats.files, snapshot.display());
        },
        Commands::Render { files, load, snapshot, output, radius, blur, min_opacity, assets, no_markers } => {
            let params = HeatmapParams::new(radius, blur, min_opacity);
            params.validate()?;

            let store = if files.is_empty() {
                DataStore::load_or_build(project_path(&load.gpx_dir), project_path(&snapshot), &load.options()?, false)?
            } else {
                DataStore::load(&files, &load.options()?)?
            };

            let mut renderer = HeatmapRenderer::new(MapView::default());
            if !no_markers {
                renderer = renderer.with_markers(&project_path(&assets), &IMAGE_MARKERS);
            }

            let output = project_path(&output);
            renderer.render_to_file(&store, &params, &output)
                .with_context(|| format!("Failed to render heatmap to {}", output.display()))?;
            println!("Wrote {}", output.display());
        },
        Commands::Stats { snapshot } => {
            let store = DataStore::load_snapshot(project_path(&snapshot))?;
            let stats = store.stats();
            println!("Files:  {}", stats.files);
            println!("Points: {}", stats.points);
            match stats.mean_lat_lon {
                Some((lat, lon)) => println!("Mean lat: {lat}, Mean lon: {lon}"),
                None => println!("Mean lat: -, Mean lon: -"),
            }
            for source in &store.dataset().sources {
                println!("  {source}");
            }
        },
    }

    Ok(())
}
