use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use futures::channel::oneshot;
use pointcluster::rendering::AnnotationAnchor;
use pointcluster::{
    load_feature_collection, scatter, ClusterPipeline, ClusterPreview, LatLng, MemoryStyle,
    PipelineConfig,
};

/// Point set shown by the demo: Alaskan airstrips plus a few outliers
const DEMO_POINTS: [(f64, f64); 18] = [
    (65.5942, -152.0732),
    (63.1224, -150.4048),
    (63.1016, -151.5129),
    (63.0781, -151.3597),
    (34.299667, -118.497),
    (12.0623, -87.6901),
    (63.0719, -151.5053),
    (20.2873, -178.4576),
    (63.1725, -148.789),
    (36.421833, -120.993164),
    (33.656333, -117.0155),
    (63.0879, -151.512),
    (63.0933, -149.6538),
    (63.2272, -151.5325),
    (63.0844, -149.4752),
    (61.8518, -150.8597),
    (62.9656, -149.7142),
    (61.2705, -151.2484),
];

/// Renders a clustered point layer into an in-memory style and prints it
#[derive(Debug, Parser)]
#[command(name = "pointcluster-app", version)]
struct Args {
    /// GeoJSON file to take points from instead of the built-in demo set
    #[arg(long)]
    geojson: Option<PathBuf>,

    /// Pipeline configuration (JSON, any subset of fields)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra jittered points around the camera center
    #[arg(long, default_value_t = 0)]
    scatter: usize,

    /// Jitter band in meters, as MIN,MAX
    #[arg(long, value_delimiter = ',', num_args = 2, default_values_t = [100, 5000])]
    scatter_meters: Vec<u32>,

    /// Cluster radius override, in pixels
    #[arg(long)]
    radius: Option<i32>,

    /// Cluster max zoom override
    #[arg(long)]
    max_zoom: Option<i32>,

    /// Zoom level used for the cluster preview
    #[arg(long, default_value_t = 2.0)]
    zoom: f64,

    /// Print the full style document
    #[arg(long)]
    print_style: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            PipelineConfig::from_json_str(&raw)?
        }
        None => PipelineConfig::default(),
    };
    if let Some(radius) = args.radius {
        config.cluster.radius = radius;
    }
    if let Some(max_zoom) = args.max_zoom {
        config.cluster.max_zoom = max_zoom;
    }
    let pipeline = ClusterPipeline::new(config.clone())?;

    // A missing bundled file is fatal; a malformed one just yields no points
    let mut points: Vec<LatLng> = match &args.geojson {
        Some(path) => load_feature_collection(path)?
            .iter()
            .map(|feature| feature.geometry)
            .collect(),
        None => DEMO_POINTS.iter().copied().map(LatLng::from).collect(),
    };

    let center = LatLng::new(40.669957, -103.5917968);
    if args.scatter > 0 {
        let (min, max) = (args.scatter_meters[0], args.scatter_meters[1]);
        points.extend(scatter(center, args.scatter, min, max));
    }
    log::info!("rendering {} points", points.len());

    let mut style = MemoryStyle::new();
    let (done_tx, done_rx) = oneshot::channel::<Vec<AnnotationAnchor>>();
    pipeline.attach(&mut style, points, move |report| {
        for failure in report.failures() {
            log::error!("{} '{}' was not registered", failure.item, failure.id);
        }
        let _ = done_tx.send(report.annotations.clone());
    });

    // Stand-in for the engine fetching its style over the network
    tokio::time::sleep(Duration::from_millis(50)).await;
    style.finish_loading();

    let annotations = done_rx
        .await
        .context("style loaded but the pipeline never completed")?;
    println!("{} annotation anchors", annotations.len());
    for anchor in annotations.iter().take(5) {
        println!(
            "  {} -> ({:.4}, {:.4})",
            anchor.feature_id, anchor.coordinate.lat, anchor.coordinate.lng
        );
    }

    if let Some(source) = style.source(&config.ids.source) {
        let preview = ClusterPreview::new(source.options())
            .with_point_count_property(&config.ids.point_count);
        let rendered = preview.run(&source.data, args.zoom);
        let clusters = rendered.iter().filter(|f| f.is_cluster()).count();
        println!(
            "zoom {}: {} clusters, {} individual points",
            args.zoom,
            clusters,
            rendered.len() - clusters
        );
    }
    println!("layers (bottom to top): {}", style.layer_ids().join(", "));

    if args.print_style {
        println!("{}", serde_json::to_string_pretty(&style.to_style_json())?);
    }
    Ok(())
}
