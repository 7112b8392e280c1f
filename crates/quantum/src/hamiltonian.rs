//! Dense Rydberg Hamiltonian
//!
//!   H = (Ω/2) Σ_i X_i − Σ_i Δ_i n_i + Σ_{i<j} V_ij n_i n_j
//!
//! over the `2^N` computational basis. Atom `i` is bit `i` of the basis
//! index; a set bit means the atom is excited.

use faer::{Mat, MatRef};

use crate::error::{QuantumError, QuantumResult};
use crate::interaction::InteractionMatrix;
use crate::C64;

/// Hard cap on register width for the dense representation.
pub const MAX_ATOMS: usize = 16;

/// Estimated bytes held by one in-flight sample: the Hamiltonian, its
/// eigenvectors and the eigensolver workspace, each `4^N` complex entries.
pub fn dense_footprint_bytes(n_atoms: usize) -> u128 {
    if n_atoms >= 60 {
        return u128::MAX;
    }
    let dim = 1u128 << n_atoms;
    3 * std::mem::size_of::<C64>() as u128 * dim * dim
}

/// Fail before allocation if `n_atoms` cannot be simulated within `budget_bytes`.
pub fn check_resources(n_atoms: usize, budget_bytes: u128) -> QuantumResult<()> {
    let required = dense_footprint_bytes(n_atoms);
    if n_atoms > MAX_ATOMS || required > budget_bytes {
        return Err(QuantumError::Resource {
            n_atoms,
            required_bytes: required,
            budget_bytes,
        });
    }
    Ok(())
}

/// The constant interaction term, stored as its diagonal
/// `E_int(b) = Σ_{i<j} V_ij b_i b_j`.
#[derive(Debug, Clone)]
pub struct InteractionTerm {
    n: usize,
    diagonal: Vec<f64>,
}

impl InteractionTerm {
    pub fn new(v: &InteractionMatrix) -> Self {
        let n = v.n_atoms();
        let diagonal = (0..1usize << n)
            .map(|b| {
                v.pairs()
                    .filter(|&(i, j, _)| (b >> i) & 1 == 1 && (b >> j) & 1 == 1)
                    .map(|(_, _, vij)| vij)
                    .sum()
            })
            .collect();
        Self { n, diagonal }
    }

    pub fn n_atoms(&self) -> usize {
        self.n
    }

    pub fn energy(&self, basis: usize) -> f64 {
        self.diagonal[basis]
    }
}

/// Per-sample drive: uniform Rabi frequency and per-atom detunings.
#[derive(Debug, Clone, PartialEq)]
pub struct Drive {
    pub rabi_freq: f64,
    pub detunings: Vec<f64>,
}

impl Drive {
    /// Encode one input row: `Δ_i = x[i] · encoding_scale`.
    pub fn from_sample(
        x: &[f64],
        n_atoms: usize,
        rabi_freq: f64,
        encoding_scale: f64,
    ) -> QuantumResult<Self> {
        if x.len() != n_atoms {
            return Err(QuantumError::DimensionMismatch {
                expected: n_atoms,
                got: x.len(),
            });
        }
        if let Some(i) = x.iter().position(|v| !v.is_finite()) {
            return Err(QuantumError::Config(format!(
                "input value {} at atom {} is not finite",
                x[i], i
            )));
        }

        Ok(Self {
            rabi_freq,
            detunings: x.iter().map(|v| v * encoding_scale).collect(),
        })
    }
}

/// Hermitian `2^N × 2^N` operator for one piecewise-constant interval.
#[derive(Debug, Clone)]
pub struct RydbergHamiltonian {
    n: usize,
    matrix: Mat<C64>,
}

impl RydbergHamiltonian {
    pub fn assemble(interaction: &InteractionTerm, drive: &Drive) -> QuantumResult<Self> {
        let n = interaction.n_atoms();
        if drive.detunings.len() != n {
            return Err(QuantumError::DimensionMismatch {
                expected: n,
                got: drive.detunings.len(),
            });
        }

        let dim = 1usize << n;
        let half_rabi = C64::new(0.5 * drive.rabi_freq, 0.0);
        let mut matrix = Mat::<C64>::zeros(dim, dim);

        for b in 0..dim {
            let mut diag = interaction.energy(b);
            for (i, delta) in drive.detunings.iter().enumerate() {
                if (b >> i) & 1 == 1 {
                    diag -= delta;
                }
            }
            matrix.write(b, b, C64::new(diag, 0.0));

            if drive.rabi_freq != 0.0 {
                for i in 0..n {
                    matrix.write(b, b ^ (1 << i), half_rabi);
                }
            }
        }

        Ok(Self { n, matrix })
    }

    pub fn n_atoms(&self) -> usize {
        self.n
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> MatRef<'_, C64> {
        self.matrix.as_ref()
    }

    /// Largest `|H_ij − conj(H_ji)|`.
    pub fn hermiticity_error(&self) -> f64 {
        let dim = self.dim();
        let mut worst = 0.0f64;
        for i in 0..dim {
            for j in i..dim {
                let d = self.matrix.read(i, j) - self.matrix.read(j, i).conj();
                worst = worst.max(d.norm());
            }
        }
        worst
    }
}

/// Sequence of `n_steps` equal intervals over `[0, t_end]`. Steps index into
/// a small set of distinct operators so that identical intervals share one.
#[derive(Debug, Clone)]
pub struct HamiltonianSchedule {
    operators: Vec<RydbergHamiltonian>,
    steps: Vec<usize>,
    dt: f64,
}

impl HamiltonianSchedule {
    /// Schedule whose every interval uses `h`; the detuning is held fixed
    /// for the whole evolution window.
    pub fn frozen(h: RydbergHamiltonian, t_end: f64, n_steps: usize) -> QuantumResult<Self> {
        if n_steps == 0 {
            return Err(QuantumError::Config("n_steps must be at least 1".into()));
        }
        if !t_end.is_finite() || t_end < 0.0 {
            return Err(QuantumError::Config(format!(
                "evolution time must be finite and non-negative, got {}",
                t_end
            )));
        }

        Ok(Self {
            operators: vec![h],
            steps: vec![0; n_steps],
            dt: t_end / n_steps as f64,
        })
    }

    pub fn n_atoms(&self) -> usize {
        self.operators[0].n_atoms()
    }

    pub fn n_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn step(&self, k: usize) -> &RydbergHamiltonian {
        &self.operators[self.steps[k]]
    }

    /// `(operator id, operator)` per step, in time order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &RydbergHamiltonian)> + '_ {
        self.steps.iter().map(move |&id| (id, &self.operators[id]))
    }
}
