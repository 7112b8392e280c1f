use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use faer::{Mat, MatRef};
use indicatif::{ProgressBar, ProgressStyle};
use quantum::{
    evolution::evolve,
    hamiltonian::dense_footprint_bytes,
    readout::readout,
    AtomArray, Drive, HamiltonianSchedule, InteractionMatrix, InteractionTerm, NormTolerance,
    QuantumError, QuantumResult, RydbergHamiltonian, Shots, StateVector,
};
use rayon::prelude::*;
use rng::OndRng;
use tracing::{debug, info};

use crate::config::LayerConfig;
use crate::error::{LayerError, LayerResult};

/// Quantum reservoir that embeds detuning-encoded samples.
///
/// Geometry and interaction data are fixed at construction and shared
/// read-only by all workers; each sample owns its Hamiltonian, state and
/// shot statistics for the duration of its evolution.
pub struct DetuningLayer {
    config: LayerConfig,
    atoms: AtomArray,
    interactions: InteractionMatrix,
    interaction_term: InteractionTerm,
    tolerance: NormTolerance,
}

impl DetuningLayer {
    pub fn new(config: LayerConfig) -> LayerResult<Self> {
        config.validate()?;

        let atoms = AtomArray::build(config.geometry, config.n_atoms, config.lattice_spacing)?;
        let interactions = InteractionMatrix::van_der_waals(&atoms, config.c6)?;
        let interaction_term = InteractionTerm::new(&interactions);

        if config.print_params {
            info!(
                geometry = %config.geometry,
                n_atoms = config.n_atoms,
                lattice_spacing = config.lattice_spacing,
                rabi_freq = config.rabi_freq,
                t_end = config.t_end,
                n_steps = config.n_steps,
                readout = %config.readout_type,
                encoding_scale = config.encoding_scale,
                blockade_radius = interactions.blockade_radius(config.rabi_freq),
                embedding_dim = config.embedding_dim(),
                "detuning layer ready"
            );
        }

        Ok(Self {
            config,
            atoms,
            interactions,
            interaction_term,
            tolerance: NormTolerance::default(),
        })
    }

    pub fn with_tolerance(mut self, tolerance: NormTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn atoms(&self) -> &AtomArray {
        &self.atoms
    }

    pub fn interactions(&self) -> &InteractionMatrix {
        &self.interactions
    }

    pub fn embedding_dim(&self) -> usize {
        self.config.embedding_dim()
    }

    pub fn blockade_radius(&self) -> f64 {
        self.interactions.blockade_radius(self.config.rabi_freq)
    }

    /// Build the drive for one row and evolve `|0…0⟩` to `t_end`.
    pub fn final_state(&self, x: &[f64]) -> QuantumResult<StateVector> {
        let drive = Drive::from_sample(
            x,
            self.config.n_atoms,
            self.config.rabi_freq,
            self.config.encoding_scale,
        )?;
        let h = RydbergHamiltonian::assemble(&self.interaction_term, &drive)?;
        let schedule = HamiltonianSchedule::frozen(h, self.config.t_end, self.config.n_steps)?;
        evolve(&schedule, self.tolerance)
    }

    /// Embedding of a single row.
    pub fn embed_sample(
        &self,
        x: &[f64],
        shots: Shots,
        rng: &mut OndRng,
    ) -> QuantumResult<Vec<f64>> {
        let psi = self.final_state(x)?;
        readout(&psi, self.config.readout_type, shots, rng)
    }

    /// Embed every row of `x` (samples × atoms) into an M × D matrix.
    ///
    /// One child generator per row is forked from `rng` before any work is
    /// dispatched, so the result does not depend on the worker count.
    pub fn apply_layer(
        &self,
        x: MatRef<'_, f64>,
        shots: Shots,
        show_progress: bool,
        rng: &mut OndRng,
    ) -> LayerResult<Mat<f64>> {
        self.apply_layer_with_cancel(x, shots, show_progress, rng, &AtomicBool::new(false))
    }

    /// Like [`Self::apply_layer`]; once `cancel` is raised no further
    /// samples start and the call returns [`LayerError::Cancelled`].
    pub fn apply_layer_with_cancel(
        &self,
        x: MatRef<'_, f64>,
        shots: Shots,
        show_progress: bool,
        rng: &mut OndRng,
        cancel: &AtomicBool,
    ) -> LayerResult<Mat<f64>> {
        shots.validate()?;
        self.validate_input(x)?;

        let m = x.nrows();
        let d = self.embedding_dim();
        let workers = self.worker_count();
        let streams: Vec<OndRng> = (0..m).map(|i| rng.fork(b"SAMPLE", i as u64)).collect();

        info!(samples = m, shots = %shots, workers, "applying detuning layer");
        let start = Instant::now();
        let progress = progress_bar(m as u64, show_progress);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;

        let rows: LayerResult<Vec<Vec<f64>>> = pool.install(|| {
            streams
                .into_par_iter()
                .enumerate()
                .map(|(index, mut sample_rng)| {
                    if cancel.load(Ordering::Relaxed) {
                        return Err(LayerError::Cancelled);
                    }
                    let row: Vec<f64> = (0..x.ncols()).map(|j| x.read(index, j)).collect();
                    let features = self
                        .embed_sample(&row, shots, &mut sample_rng)
                        .map_err(|source| LayerError::Sample { index, source })?;
                    debug!(sample = index, "embedded");
                    progress.inc(1);
                    Ok(features)
                })
                .collect()
        });
        progress.finish_and_clear();
        let rows = rows?;

        info!(
            samples = m,
            elapsed_s = start.elapsed().as_secs_f64(),
            "detuning layer applied"
        );

        Ok(Mat::from_fn(m, d, |i, j| rows[i][j]))
    }

    /// Whole-batch checks that must pass before any simulation starts.
    fn validate_input(&self, x: MatRef<'_, f64>) -> LayerResult<()> {
        let n = self.config.n_atoms;
        if x.ncols() != n {
            return Err(QuantumError::DimensionMismatch {
                expected: n,
                got: x.ncols(),
            }
            .into());
        }

        for i in 0..x.nrows() {
            for j in 0..n {
                let v = x.read(i, j);
                let message = if !v.is_finite() {
                    Some(format!("value {} at atom {} is not finite", v, j))
                } else {
                    match self.config.detuning_max {
                        Some(limit) if v.abs() > limit => Some(format!(
                            "value {} at atom {} lies outside ±{}",
                            v, j, limit
                        )),
                        _ => None,
                    }
                };
                if let Some(message) = message {
                    return Err(LayerError::Sample {
                        index: i,
                        source: QuantumError::Config(message),
                    });
                }
            }
        }
        Ok(())
    }

    /// Threads in flight, bounded by the memory budget.
    fn worker_count(&self) -> usize {
        let threads = if self.config.threads > 0 {
            self.config.threads
        } else {
            rayon::current_num_threads()
        };
        let per_sample = dense_footprint_bytes(self.config.n_atoms).max(1);
        let by_memory = u128::from(self.config.memory_budget_bytes) / per_sample;
        let by_memory = usize::try_from(by_memory).unwrap_or(usize::MAX);
        threads.min(by_memory).max(1)
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} samples ({eta})",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantum::{Geometry, ReadoutType};

    fn small_layer() -> DetuningLayer {
        let cfg = LayerConfig::new(
            Geometry::Chain,
            3,
            6.0,
            1.5,
            1.0,
            5,
            ReadoutType::Probability,
            1.0,
        )
        .with_threads(2);
        DetuningLayer::new(cfg).unwrap()
    }

    #[test]
    fn worker_count_respects_memory_budget() {
        let cfg = LayerConfig::default()
            .with_threads(16)
            .with_memory_budget(dense_footprint_bytes(8) as u64 * 3);
        let layer = DetuningLayer::new(cfg).unwrap();
        assert_eq!(layer.worker_count(), 3);
    }

    #[test]
    fn rejects_wrong_width_before_simulating() {
        let layer = small_layer();
        let x = Mat::<f64>::zeros(2, 4);
        let mut rng = OndRng::new(b"w");
        let res = layer.apply_layer(x.as_ref(), Shots::Analytic, false, &mut rng);
        assert!(matches!(
            res,
            Err(LayerError::Quantum(QuantumError::DimensionMismatch { expected: 3, got: 4 }))
        ));
    }

    #[test]
    fn reports_index_of_bad_sample() {
        let layer = small_layer();
        let x = Mat::from_fn(3, 3, |i, j| if i == 2 && j == 1 { f64::NAN } else { 0.1 });
        let mut rng = OndRng::new(b"nan");
        match layer.apply_layer(x.as_ref(), Shots::Analytic, false, &mut rng) {
            Err(LayerError::Sample { index, .. }) => assert_eq!(index, 2),
            other => panic!("unexpected result: {:?}", other.map(|m| m.nrows())),
        }
    }

    #[test]
    fn cancelled_batch_returns_error() {
        let layer = small_layer();
        let x = Mat::<f64>::zeros(4, 3);
        let mut rng = OndRng::new(b"c");
        let cancel = AtomicBool::new(true);
        let res = layer.apply_layer_with_cancel(x.as_ref(), Shots::Analytic, false, &mut rng, &cancel);
        assert!(matches!(res, Err(LayerError::Cancelled)));
    }

    #[test]
    fn numerical_fault_names_the_sample() {
        let layer = small_layer().with_tolerance(NormTolerance {
            step: -1.0,
            final_state: 1e-8,
        });
        let x = Mat::<f64>::zeros(1, 3);
        let mut rng = OndRng::new(b"fault");
        match layer.apply_layer(x.as_ref(), Shots::Analytic, false, &mut rng) {
            Err(LayerError::Sample {
                index,
                source: QuantumError::Numerical { step: 0, .. },
            }) => assert_eq!(index, 0),
            other => panic!("unexpected result: {:?}", other.map(|m| m.nrows())),
        }
    }

    #[test]
    fn builds_without_parameter_summary() {
        let cfg = LayerConfig::default().with_print_params(false);
        let layer = DetuningLayer::new(cfg).unwrap();
        assert!(!layer.config().print_params);
        assert_eq!(layer.embedding_dim(), 8);
    }
}
