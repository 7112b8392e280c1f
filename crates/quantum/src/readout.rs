//! Reduction of a measured register to a fixed-length feature vector.
//!
//! Layout of the returned vector:
//! - `Probability`: `⟨n_0⟩ … ⟨n_{N−1}⟩`
//! - `Correlation`: the `N` marginals, then `⟨n_i n_j⟩ − ⟨n_i⟩⟨n_j⟩` for
//!   every pair `i < j` in lexicographic order.

use std::fmt;
use std::str::FromStr;

use rng::OndRng;
use serde::{Deserialize, Serialize};

use crate::error::{QuantumError, QuantumResult};
use crate::measurement::{ShotSample, ShotSampler};
use crate::state::StateVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadoutType {
    Probability,
    Correlation,
}

impl ReadoutType {
    /// Feature count for an `n_atoms` register.
    pub fn embedding_dim(self, n_atoms: usize) -> usize {
        match self {
            ReadoutType::Probability => n_atoms,
            ReadoutType::Correlation => n_atoms + n_atoms * n_atoms.saturating_sub(1) / 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReadoutType::Probability => "probability",
            ReadoutType::Correlation => "correlation",
        }
    }
}

impl fmt::Display for ReadoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReadoutType {
    type Err = QuantumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "probability" | "prob" | "z" => Ok(ReadoutType::Probability),
            "correlation" | "correlations" | "zz" => Ok(ReadoutType::Correlation),
            other => Err(QuantumError::Config(format!(
                "unknown readout type '{}', expected probability or correlation",
                other
            ))),
        }
    }
}

/// How the measurement statistics are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shots {
    /// Exact moments from `|ψ|²`, no shot noise.
    Analytic,
    /// Empirical moments from this many projective measurements.
    Sampled(usize),
}

impl Shots {
    /// `None` selects the analytic path.
    pub fn from_count(count: Option<usize>) -> Self {
        count.map_or(Shots::Analytic, Shots::Sampled)
    }

    pub fn validate(self) -> QuantumResult<()> {
        match self {
            Shots::Sampled(0) => Err(QuantumError::Config(
                "shot count must be at least 1 (use analytic mode for exact readout)".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Shots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shots::Analytic => f.write_str("analytic"),
            Shots::Sampled(n) => write!(f, "{}", n),
        }
    }
}

/// First and second moments of the excitation numbers.
struct Moments {
    n: usize,
    marginals: Vec<f64>,
    pairs: Vec<f64>,
}

impl Moments {
    fn new(n: usize, with_pairs: bool) -> Self {
        let n_pairs = if with_pairs { n * n.saturating_sub(1) / 2 } else { 0 };
        Self {
            n,
            marginals: vec![0.0; n],
            pairs: vec![0.0; n_pairs],
        }
    }

    fn accumulate(&mut self, outcome: ShotSample, weight: f64) {
        for i in 0..self.n {
            if outcome.is_excited(i) {
                self.marginals[i] += weight;
            }
        }
        if self.pairs.is_empty() {
            return;
        }
        let mut k = 0;
        for i in 0..self.n {
            let ei = outcome.is_excited(i);
            for j in i + 1..self.n {
                if ei && outcome.is_excited(j) {
                    self.pairs[k] += weight;
                }
                k += 1;
            }
        }
    }

    fn into_features(self, readout: ReadoutType) -> Vec<f64> {
        match readout {
            ReadoutType::Probability => self.marginals,
            ReadoutType::Correlation => {
                let mut out = self.marginals.clone();
                let mut k = 0;
                for i in 0..self.n {
                    for j in i + 1..self.n {
                        out.push(self.pairs[k] - self.marginals[i] * self.marginals[j]);
                        k += 1;
                    }
                }
                out
            }
        }
    }
}

/// Exact readout from the Born distribution.
pub fn analytic_readout(psi: &StateVector, readout: ReadoutType) -> Vec<f64> {
    let mut m = Moments::new(psi.n_atoms(), readout == ReadoutType::Correlation);
    for (b, p) in psi.probabilities().into_iter().enumerate() {
        if p > 0.0 {
            m.accumulate(ShotSample(b), p);
        }
    }
    m.into_features(readout)
}

/// Empirical readout from `shots` joint projective measurements.
pub fn sampled_readout(
    psi: &StateVector,
    readout: ReadoutType,
    shots: usize,
    rng: &mut OndRng,
) -> QuantumResult<Vec<f64>> {
    Shots::Sampled(shots).validate()?;

    let sampler = ShotSampler::new(psi);
    let weight = 1.0 / shots as f64;
    let mut m = Moments::new(psi.n_atoms(), readout == ReadoutType::Correlation);
    for _ in 0..shots {
        m.accumulate(sampler.draw(rng), weight);
    }
    Ok(m.into_features(readout))
}

/// Dispatch on the shot mode. The generator is untouched in analytic mode.
pub fn readout(
    psi: &StateVector,
    readout: ReadoutType,
    shots: Shots,
    rng: &mut OndRng,
) -> QuantumResult<Vec<f64>> {
    match shots {
        Shots::Analytic => Ok(analytic_readout(psi, readout)),
        Shots::Sampled(n) => sampled_readout(psi, readout, n, rng),
    }
}
