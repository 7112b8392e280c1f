use clap::Parser;
use faer::Mat;
use quantum::{Geometry, ReadoutType, Shots};
use rayon::prelude::*;
use reservoir::{DetuningLayer, LayerConfig};
use rng::OndRng;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about = "Shot-noise sweep: sampled vs analytic readout error")]
struct Args {
    /// Number of atoms
    #[arg(long, default_value_t = 6)]
    n_atoms: usize,

    /// Atom layout
    #[arg(long, default_value = "chain")]
    geometry: Geometry,

    /// Readout: probability | correlation
    #[arg(long, default_value = "correlation")]
    readout_type: ReadoutType,

    /// Lattice spacing in µm
    #[arg(long, default_value_t = 10.0)]
    lattice_spacing: f64,

    /// Rabi frequency in rad/µs
    #[arg(long, default_value_t = 6.283)]
    rabi_freq: f64,

    /// Evolution time in µs
    #[arg(long, default_value_t = 4.0)]
    evolution_time: f64,

    /// Time steps
    #[arg(long, default_value_t = 40)]
    time_steps: usize,

    /// Input values are drawn uniformly from ±detuning_max
    #[arg(long, default_value_t = 6.0)]
    detuning_max: f64,

    /// Number of random input samples
    #[arg(long, default_value_t = 8)]
    samples: usize,

    /// Comma-separated list of shot counts
    #[arg(long, value_delimiter = ',', default_values_t = [10usize, 100, 1000, 10000])]
    shots: Vec<usize>,

    /// Independent repetitions per shot count
    #[arg(long, default_value_t = 8)]
    repeats: usize,

    /// RNG seed
    #[arg(long, default_value = "shot-sweep")]
    seed: String,

    /// Output CSV path
    #[arg(long, default_value = "shot_sweep.csv")]
    out: String,
}

fn main() {
    let args = Args::parse();

    let shot_counts = args.shots.clone();
    if shot_counts.is_empty() || shot_counts.contains(&0) {
        eprintln!("shots must contain at least one positive integer value");
        std::process::exit(1);
    }
    if args.repeats == 0 || args.samples == 0 {
        eprintln!("repeats and samples must be > 0");
        std::process::exit(1);
    }

    let config = LayerConfig::new(
        args.geometry,
        args.n_atoms,
        args.lattice_spacing,
        args.rabi_freq,
        args.evolution_time,
        args.time_steps,
        args.readout_type,
        1.0,
    )
    // repeats run in parallel, so each layer call stays single-threaded
    .with_threads(1);
    let layer = match DetuningLayer::new(config) {
        Ok(layer) => layer,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    let mut rng = OndRng::new(args.seed.as_bytes());
    let x = Mat::from_fn(args.samples, args.n_atoms, |_, _| {
        (2.0 * rng.next_f64(b"INPUT") - 1.0) * args.detuning_max
    });

    let start = Instant::now();
    let exact = match layer.apply_layer(x.as_ref(), Shots::Analytic, false, &mut rng) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("ERROR: analytic reference failed: {}", err);
            std::process::exit(1);
        }
    };
    println!(
        "analytic reference: {} samples x {} features in {:.3} s",
        exact.nrows(),
        exact.ncols(),
        start.elapsed().as_secs_f64()
    );

    let file = File::create(&args.out).expect("failed to create CSV file");
    let mut w = BufWriter::new(file);
    writeln!(w, "shots,mean_abs_error,max_abs_error,scaled_error").expect("failed to write header");

    for &shots in &shot_counts {
        let errors: Vec<(f64, f64)> = (0..args.repeats)
            .into_par_iter()
            .map(|r| {
                let seed = format!("{}-shots-{}-rep-{}", args.seed, shots, r);
                let mut rep_rng = OndRng::new(seed.as_bytes());
                let est = layer
                    .apply_layer(x.as_ref(), Shots::Sampled(shots), false, &mut rep_rng)
                    .expect("sampled readout failed");
                deviation(&est, &exact)
            })
            .collect();

        let mean = errors.iter().map(|e| e.0).sum::<f64>() / errors.len() as f64;
        let max = errors.iter().map(|e| e.1).fold(0.0, f64::max);
        let scaled = mean * (shots as f64).sqrt();

        writeln!(w, "{},{},{},{}", shots, mean, max, scaled).expect("failed to write row");
        println!(
            "shots={:>7}  mean|d|={:.3e}  max|d|={:.3e}  mean|d|*sqrt(shots)={:.3}",
            shots, mean, max, scaled
        );
    }
}

fn deviation(est: &Mat<f64>, exact: &Mat<f64>) -> (f64, f64) {
    let mut sum = 0.0;
    let mut max = 0.0f64;
    for i in 0..exact.nrows() {
        for j in 0..exact.ncols() {
            let d = (est.read(i, j) - exact.read(i, j)).abs();
            sum += d;
            max = max.max(d);
        }
    }
    (sum / (exact.nrows() * exact.ncols()) as f64, max)
}
