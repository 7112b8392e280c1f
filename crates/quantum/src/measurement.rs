use rng::OndRng;

use crate::state::StateVector;

/// One projective measurement of the whole register; bit `i` is atom `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShotSample(pub usize);

impl ShotSample {
    #[inline]
    pub fn is_excited(self, atom: usize) -> bool {
        (self.0 >> atom) & 1 == 1
    }

    /// Bitstring with atom 0 first.
    pub fn to_bitstring(self, n_atoms: usize) -> String {
        (0..n_atoms)
            .map(|i| if self.is_excited(i) { '1' } else { '0' })
            .collect()
    }
}

/// Inverse-CDF sampler over the joint distribution `|ψ_b|²`.
///
/// Outcomes are drawn for the whole register at once, so correlations
/// between entangled atoms are preserved.
pub struct ShotSampler {
    cdf: Vec<f64>,
}

impl ShotSampler {
    pub fn new(psi: &StateVector) -> Self {
        Self::from_probabilities(&psi.probabilities())
    }

    pub fn from_probabilities(probs: &[f64]) -> Self {
        let mut acc = 0.0;
        let cdf = probs
            .iter()
            .map(|&p| {
                acc += p.max(0.0);
                acc
            })
            .collect();
        Self { cdf }
    }

    pub fn draw(&self, rng: &mut OndRng) -> ShotSample {
        let total = self.cdf.last().copied().unwrap_or(0.0);
        if total <= 0.0 {
            return ShotSample(0);
        }

        let x = rng.next_f64(b"MEASURE_SHOT") * total;
        let idx = self.cdf.partition_point(|&c| c <= x);
        ShotSample(idx.min(self.cdf.len() - 1))
    }
}

/// Draw `shots` independent outcomes from `psi`.
pub fn sample_shots(psi: &StateVector, shots: usize, rng: &mut OndRng) -> Vec<ShotSample> {
    let sampler = ShotSampler::new(psi);
    (0..shots).map(|_| sampler.draw(rng)).collect()
}
