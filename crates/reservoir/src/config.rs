use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use quantum::{
    hamiltonian::check_resources, Geometry, QuantumError, QuantumResult, ReadoutType, DEFAULT_C6,
};
use serde::{Deserialize, Serialize};

use crate::error::LayerResult;

/// 8 GiB: enough for one 13-atom sample or many smaller ones in flight.
pub const DEFAULT_MEMORY_BUDGET: u64 = 8 << 30;

/// Immutable construction parameters of a [`crate::DetuningLayer`].
///
/// Units follow the neutral-atom convention: micrometres for lengths,
/// microseconds for time, rad/µs for frequencies and energies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayerConfig {
    pub geometry: Geometry,
    pub n_atoms: usize,
    pub lattice_spacing: f64,
    pub rabi_freq: f64,
    pub t_end: f64,
    pub n_steps: usize,
    pub readout_type: ReadoutType,
    /// Multiplier from a scaled input value to the atom's detuning.
    pub encoding_scale: f64,
    /// Van-der-Waals coefficient, rad·µm⁶/µs.
    pub c6: f64,
    /// When set, inputs outside `±detuning_max` are rejected.
    pub detuning_max: Option<f64>,
    pub memory_budget_bytes: u64,
    /// Worker threads for `apply_layer` (0 = rayon default).
    pub threads: usize,
    /// Log the parameter summary when the layer is built.
    pub print_params: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            geometry: Geometry::Chain,
            n_atoms: 8,
            lattice_spacing: 10.0,
            rabi_freq: 2.0 * std::f64::consts::PI,
            t_end: 4.0,
            n_steps: 40,
            readout_type: ReadoutType::Probability,
            encoding_scale: 1.0,
            c6: DEFAULT_C6,
            detuning_max: None,
            memory_budget_bytes: DEFAULT_MEMORY_BUDGET,
            threads: 0,
            print_params: true,
        }
    }
}

impl LayerConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        geometry: Geometry,
        n_atoms: usize,
        lattice_spacing: f64,
        rabi_freq: f64,
        t_end: f64,
        n_steps: usize,
        readout_type: ReadoutType,
        encoding_scale: f64,
    ) -> Self {
        Self {
            geometry,
            n_atoms,
            lattice_spacing,
            rabi_freq,
            t_end,
            n_steps,
            readout_type,
            encoding_scale,
            ..Self::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> LayerResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: LayerConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_c6(mut self, c6: f64) -> Self {
        self.c6 = c6;
        self
    }

    pub fn with_detuning_max(mut self, detuning_max: f64) -> Self {
        self.detuning_max = Some(detuning_max);
        self
    }

    pub fn with_memory_budget(mut self, bytes: u64) -> Self {
        self.memory_budget_bytes = bytes;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_print_params(mut self, print_params: bool) -> Self {
        self.print_params = print_params;
        self
    }

    /// Output width of the layer.
    pub fn embedding_dim(&self) -> usize {
        self.readout_type.embedding_dim(self.n_atoms)
    }

    /// Checks every field; the resource guard runs last so cheap mistakes
    /// are reported first.
    pub fn validate(&self) -> QuantumResult<()> {
        if self.n_atoms == 0 {
            return Err(config_err("n_atoms must be at least 1"));
        }
        positive("lattice_spacing", self.lattice_spacing)?;
        non_negative("rabi_freq", self.rabi_freq)?;
        non_negative("t_end", self.t_end)?;
        if self.n_steps == 0 {
            return Err(config_err("n_steps must be at least 1"));
        }
        if !self.encoding_scale.is_finite() {
            return Err(config_err("encoding_scale must be finite"));
        }
        non_negative("c6", self.c6)?;
        if let Some(limit) = self.detuning_max {
            positive("detuning_max", limit)?;
        }

        check_resources(self.n_atoms, u128::from(self.memory_budget_bytes))
    }
}

fn config_err(msg: &str) -> QuantumError {
    QuantumError::Config(msg.to_string())
}

fn positive(name: &str, v: f64) -> QuantumResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(QuantumError::Config(format!("{} must be positive and finite, got {}", name, v)))
    }
}

fn non_negative(name: &str, v: f64) -> QuantumResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(QuantumError::Config(format!("{} must be non-negative and finite, got {}", name, v)))
    }
}
