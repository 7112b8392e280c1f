use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use quantum::{Geometry, ReadoutType, Shots};
use reservoir::{
    output::{embedding_header, read_csv, write_csv},
    scale_to_detuning_range, spectral_range, DetuningLayer, LayerConfig,
};
use rng::OndRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Quantum reservoir embedding of reduced features (Rydberg detuning layer)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV of reduced training features (samples × atoms)
    #[arg(long)]
    input: PathBuf,

    /// Output CSV for training embeddings
    #[arg(long, default_value = "embeddings.csv")]
    output: PathBuf,

    /// Optional CSV of test features, scaled with the training spectral range
    #[arg(long)]
    test_input: Option<PathBuf>,

    /// Output CSV for test embeddings
    #[arg(long, default_value = "test_embeddings.csv")]
    test_output: PathBuf,

    /// Input CSVs start directly with data; by default the first row is a header
    #[arg(long)]
    no_header: bool,

    /// JSON layer configuration; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Atom layout: chain | square | triangular | ring | honeycomb
    #[arg(long)]
    geometry: Option<Geometry>,

    /// Atom count (default: input width)
    #[arg(long)]
    n_atoms: Option<usize>,

    /// Lattice spacing in µm
    #[arg(long)]
    lattice_spacing: Option<f64>,

    /// Rabi frequency in rad/µs
    #[arg(long)]
    rabi_freq: Option<f64>,

    /// Evolution time in µs
    #[arg(long)]
    evolution_time: Option<f64>,

    /// Number of piecewise-constant time steps
    #[arg(long)]
    time_steps: Option<usize>,

    /// Readout: probability | correlation
    #[arg(long)]
    readout_type: Option<ReadoutType>,

    /// Detuning per unit of scaled input
    #[arg(long)]
    encoding_scale: Option<f64>,

    /// Half-width of the detuning range the features are scaled into
    #[arg(long, default_value_t = 6.0)]
    detuning_max: f64,

    /// Skip scaling; the input is already in detuning units
    #[arg(long)]
    no_scale: bool,

    /// Shots per sample
    #[arg(long, default_value_t = 1000)]
    n_shots: usize,

    /// Exact readout from the state vector (ignores --n-shots)
    #[arg(long)]
    analytic: bool,

    /// RNG seed (full reproducibility)
    #[arg(long, default_value = "default-seed")]
    seed: String,

    /// Worker threads (0 = Rayon default)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Per-layer memory budget in bytes
    #[arg(long)]
    memory_budget: Option<u64>,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let train_raw = read_csv(&args.input, !args.no_header)
        .with_context(|| format!("reading {}", args.input.display()))?;
    if train_raw.nrows() == 0 {
        bail!("{} contains no samples", args.input.display());
    }
    info!(samples = train_raw.nrows(), features = train_raw.ncols(), "training features loaded");

    let config = build_config(&args, train_raw.ncols())?;
    if config.n_atoms != train_raw.ncols() {
        bail!(
            "input has {} features but the layer has {} atoms",
            train_raw.ncols(),
            config.n_atoms
        );
    }

    let spectral = spectral_range(train_raw.as_ref());
    let scale = |m: faer::Mat<f64>| -> anyhow::Result<faer::Mat<f64>> {
        if args.no_scale {
            Ok(m)
        } else {
            Ok(scale_to_detuning_range(m.as_ref(), spectral, args.detuning_max)?)
        }
    };
    if !args.no_scale {
        info!(spectral, detuning_max = args.detuning_max, "scaling features to detuning range");
    }
    let train = scale(train_raw)?;

    let layer = DetuningLayer::new(config)?;
    let shots = if args.analytic {
        Shots::Analytic
    } else {
        Shots::Sampled(args.n_shots)
    };
    let mut rng = OndRng::new(args.seed.as_bytes());
    let header = embedding_header(layer.config().n_atoms, layer.embedding_dim());

    let embeddings = layer.apply_layer(train.as_ref(), shots, !args.no_progress, &mut rng)?;
    write_csv(&args.output, &header, embeddings.as_ref())
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(path = %args.output.display(), rows = embeddings.nrows(), "training embeddings written");

    if let Some(test_path) = &args.test_input {
        let test_raw = read_csv(test_path, !args.no_header)
            .with_context(|| format!("reading {}", test_path.display()))?;
        let test = scale(test_raw)?;

        let max = spectral_range(test.as_ref());
        if !args.no_scale && max > args.detuning_max {
            warn!(max, detuning_max = args.detuning_max, "test features exceed the training detuning range");
        }

        let test_embeddings = layer.apply_layer(test.as_ref(), shots, !args.no_progress, &mut rng)?;
        write_csv(&args.test_output, &header, test_embeddings.as_ref())
            .with_context(|| format!("writing {}", args.test_output.display()))?;
        info!(path = %args.test_output.display(), rows = test_embeddings.nrows(), "test embeddings written");
    }

    Ok(())
}

fn build_config(args: &Args, input_width: usize) -> anyhow::Result<LayerConfig> {
    let mut config = match &args.config {
        Some(path) => LayerConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LayerConfig {
            n_atoms: input_width,
            ..LayerConfig::default()
        },
    };

    if let Some(v) = args.geometry {
        config.geometry = v;
    }
    if let Some(v) = args.n_atoms {
        config.n_atoms = v;
    }
    if let Some(v) = args.lattice_spacing {
        config.lattice_spacing = v;
    }
    if let Some(v) = args.rabi_freq {
        config.rabi_freq = v;
    }
    if let Some(v) = args.evolution_time {
        config.t_end = v;
    }
    if let Some(v) = args.time_steps {
        config.n_steps = v;
    }
    if let Some(v) = args.readout_type {
        config.readout_type = v;
    }
    if let Some(v) = args.encoding_scale {
        config.encoding_scale = v;
    }
    if let Some(v) = args.memory_budget {
        config.memory_budget_bytes = v;
    }
    if args.threads > 0 {
        config.threads = args.threads;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_is_expected_unless_disabled() {
        let args = Args::try_parse_from(["qrc_embed", "--input", "train.csv"]).unwrap();
        assert!(!args.no_header);

        let args = Args::try_parse_from(["qrc_embed", "--input", "train.csv", "--no-header"]).unwrap();
        assert!(args.no_header);
    }

    #[test]
    fn flags_override_defaults_and_atoms_follow_input_width() {
        let args = Args::try_parse_from([
            "qrc_embed",
            "--input",
            "train.csv",
            "--geometry",
            "ring",
            "--readout-type",
            "correlation",
            "--threads",
            "2",
        ])
        .unwrap();
        let config = build_config(&args, 5).unwrap();
        assert_eq!(config.n_atoms, 5);
        assert_eq!(config.geometry, Geometry::Ring);
        assert_eq!(config.readout_type, ReadoutType::Correlation);
        assert_eq!(config.threads, 2);
    }
}
