use crate::error::{QuantumError, QuantumResult};
use crate::C64;

/// Dense state vector over `2^N` basis states.
#[derive(Clone, Debug)]
pub struct StateVector {
    n: usize,
    amps: Vec<C64>,
}

impl StateVector {
    /// All atoms in the ground state, `|0…0⟩`.
    pub fn new_zero(n: usize) -> Self {
        Self::basis(n, 0)
    }

    pub fn basis(n: usize, index: usize) -> Self {
        let mut amps = vec![C64::new(0.0, 0.0); 1 << n];
        amps[index] = C64::new(1.0, 0.0);
        Self { n, amps }
    }

    pub fn from_amplitudes(n: usize, amps: Vec<C64>) -> QuantumResult<Self> {
        if amps.len() != 1 << n {
            return Err(QuantumError::DimensionMismatch {
                expected: 1 << n,
                got: amps.len(),
            });
        }
        Ok(Self { n, amps })
    }

    pub fn n_atoms(&self) -> usize {
        self.n
    }

    pub fn dim(&self) -> usize {
        self.amps.len()
    }

    pub fn amplitudes(&self) -> &[C64] {
        &self.amps
    }

    pub(crate) fn amplitudes_mut(&mut self) -> &mut [C64] {
        &mut self.amps
    }

    pub fn norm(&self) -> f64 {
        self.amps.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt()
    }

    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for a in &mut self.amps {
                *a /= norm;
            }
        }
    }

    /// Born probabilities `|ψ_b|²`.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amps.iter().map(|a| a.norm_sqr()).collect()
    }

    /// `|⟨self|other⟩|²`.
    pub fn fidelity(&self, other: &StateVector) -> f64 {
        self.amps
            .iter()
            .zip(&other.amps)
            .map(|(a, b)| a.conj() * b)
            .sum::<C64>()
            .norm_sqr()
    }
}
