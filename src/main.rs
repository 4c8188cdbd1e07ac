//! Segment the customers of a CSV file and write the run report and charts.
//!
//! ```sh
//! segmentree --input customers.csv --linkage average --n-clusters 4 --pca-components 3
//! ```
//!
//! With `--compare-linkage`, a second run with another linkage strategy is scored against the first
//! by B-Cubed and the agreement is added to the report.
//!
//! Writes `run_<id>.json`, `dendrogram_run_<id>.png`, `scatter_plot_run_<id>.png` and
//! `distribution_run_<id>.png` to the output directory. A chart that fails to render is
//! reported and skipped; the run itself still succeeds.
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{error, info, warn};

use segmentree::config::{OutputSettings, DEFAULT_CLUSTERS};
use segmentree::{
    render_dendrogram, render_distribution, render_scatter, run_clustering,
    ClusteringRequest, Dataset, DendrogramContext, LinkageMethod, Result
};

/// Hierarchical customer segmentation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file with a header row
    #[arg(short, long)]
    input : PathBuf,

    /// Linkage strategy: ward, complete, average or single
    #[arg(short, long, default_value = "ward")]
    linkage : LinkageMethod,

    /// Number of flat clusters, from 2 to 15
    #[arg(short = 'k', long, default_value_t = DEFAULT_CLUSTERS)]
    n_clusters : usize,

    /// Reduce the encoded features to this many principal components first (at least 2)
    #[arg(short, long)]
    pca_components : Option<usize>,

    /// Also cluster with this linkage strategy and report how closely it agrees with the main run
    #[arg(long)]
    compare_linkage : Option<LinkageMethod>,

    /// Column for the scatter plot's horizontal axis (defaults to the first numeric feature)
    #[arg(long)]
    scatter_x : Option<String>,

    /// Column for the scatter plot's vertical axis (defaults to the second numeric feature)
    #[arg(long)]
    scatter_y : Option<String>,

    /// Identifier used in the names of the output files
    #[arg(long, default_value = "1")]
    run_id : String,

    /// Directory the report and charts are written to
    #[arg(short, long, env = "SEGMENTREE_OUTPUT_DIR", default_value = "output")]
    output_dir : PathBuf
}

impl Args {
    fn request(&self) -> ClusteringRequest {
        let request = ClusteringRequest::new(self.linkage, self.n_clusters);
        match self.pca_components {
            Some(components) => request.with_pca(components),
            None => request
        }
    }
}

/// Write one chart, or log why it could not be drawn.
fn save_chart(name : &str, path : &Path, rendered : Result<Vec<u8>>) {
    match rendered.and_then(|bytes| fs::write(path, bytes).map_err(Into::into)) {
        Ok(()) => info!("Saved {} to {}", name, path.display()),
        Err(err) => warn!("Skipping {}: {}", name, err)
    }
}

fn run(args : &Args) -> Result<()> {
    let dataset = Dataset::from_path(&args.input)?;
    info!("Loaded {} rows and {} columns from {}", dataset.n_rows(), dataset.n_cols(), args.input.display());

    let clustering = run_clustering(&dataset, &args.request())?;

    let settings = OutputSettings::new(&args.output_dir);
    fs::create_dir_all(settings.output_dir())?;
    let mut report = clustering.to_json(&dataset)?;
    if let Some(other) = args.compare_linkage {
        let candidate = run_clustering(&dataset, &ClusteringRequest { linkage : other, ..args.request() })?;
        let comparison = clustering.compare_with(&candidate)?;
        info!(
            "{} agrees with {}: precision {:.3}, recall {:.3}, F {:.3}",
            other, args.linkage, comparison.precision, comparison.recall, comparison.f_measure
        );
        if let Some(fields) = report.as_object_mut() {
            fields.insert("comparison".to_string(), serde_json::to_value(&comparison)?);
        }
    }
    let report_path = settings.report_path(&args.run_id);
    serde_json::to_writer_pretty(File::create(&report_path)?, &report)?;
    info!("Saved report to {}", report_path.display());

    let context = match args.input.file_stem() {
        Some(stem) => DendrogramContext::default().with_dataset_label(stem.to_string_lossy()),
        None => DendrogramContext::default()
    };
    save_chart("dendrogram", &settings.dendrogram_path(&args.run_id), render_dendrogram(&clustering.linkage, &context));

    let numeric = &clustering.feature_config.numeric_features;
    let feature_x = args.scatter_x.clone().or_else(|| numeric.first().cloned());
    let feature_y = args.scatter_y.clone().or_else(|| numeric.get(1).or_else(|| numeric.first()).cloned());
    match (feature_x, feature_y) {
        (Some(x), Some(y)) => {
            let rows = clustering.labeled_rows(&dataset);
            save_chart("scatter plot", &settings.scatter_path(&args.run_id), render_scatter(&rows, &x, &y));
        },
        _ => warn!("Skipping scatter plot: no numeric features to plot")
    }

    save_chart("distribution chart", &settings.distribution_path(&args.run_id), render_distribution(&clustering.metrics.cluster_sizes));
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        error!("Clustering failed: {}", err);
        process::exit(1);
    }
}
