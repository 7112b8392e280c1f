use crate::error::{QuantumError, QuantumResult};
use crate::geometry::AtomArray;

/// Rydberg van-der-Waals coefficient for the 70S state of Rb-87,
/// `2π × 862690 MHz·µm⁶`, in rad·µm⁶/µs.
pub const DEFAULT_C6: f64 = 2.0 * std::f64::consts::PI * 862_690.0;

/// Pairwise couplings `V_ij = C6 / r_ij^6`, dense and symmetric.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMatrix {
    n: usize,
    c6: f64,
    values: Vec<f64>,
}

impl InteractionMatrix {
    pub fn van_der_waals(atoms: &AtomArray, c6: f64) -> QuantumResult<Self> {
        if !c6.is_finite() || c6 < 0.0 {
            return Err(QuantumError::Config(format!(
                "C6 coefficient must be finite and non-negative, got {}",
                c6
            )));
        }

        let n = atoms.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in i + 1..n {
                let r = atoms.distance(i, j);
                if r <= f64::EPSILON {
                    return Err(QuantumError::Config(format!(
                        "atoms {} and {} coincide",
                        i, j
                    )));
                }
                let v = c6 / r.powi(6);
                values[i * n + j] = v;
                values[j * n + i] = v;
            }
        }

        Ok(Self { n, c6, values })
    }

    pub fn n_atoms(&self) -> usize {
        self.n
    }

    pub fn c6(&self) -> f64 {
        self.c6
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Upper-triangle pairs `(i, j, V_ij)` with `i < j`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.n).flat_map(move |i| (i + 1..self.n).map(move |j| (i, j, self.get(i, j))))
    }

    /// Distance below which a single excitation blocks its neighbour:
    /// `R_b = (C6 / Ω)^(1/6)`.
    pub fn blockade_radius(&self, rabi_freq: f64) -> f64 {
        if rabi_freq <= 0.0 {
            return f64::INFINITY;
        }
        (self.c6 / rabi_freq).powf(1.0 / 6.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    #[test]
    fn symmetric_zero_diagonal_and_decaying() {
        let atoms = AtomArray::build(Geometry::Chain, 4, 1.0).unwrap();
        let v = InteractionMatrix::van_der_waals(&atoms, 64.0).unwrap();

        for i in 0..4 {
            assert_eq!(v.get(i, i), 0.0);
            for j in 0..4 {
                assert_eq!(v.get(i, j), v.get(j, i));
                assert!(v.get(i, j) >= 0.0);
            }
        }
        assert!((v.get(0, 1) - 64.0).abs() < 1e-12);
        assert!((v.get(0, 2) - 1.0).abs() < 1e-12);
        assert!(v.get(0, 3) < v.get(0, 2));
    }

    #[test]
    fn pairs_cover_upper_triangle_in_order() {
        let atoms = AtomArray::build(Geometry::Ring, 4, 1.0).unwrap();
        let v = InteractionMatrix::van_der_waals(&atoms, 1.0).unwrap();
        let idx: Vec<(usize, usize)> = v.pairs().map(|(i, j, _)| (i, j)).collect();
        assert_eq!(idx, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn blockade_radius_matches_nearest_neighbour_scale() {
        let atoms = AtomArray::build(Geometry::Chain, 2, 1.0).unwrap();
        let v = InteractionMatrix::van_der_waals(&atoms, 64.0).unwrap();
        assert!((v.blockade_radius(1.0) - 2.0).abs() < 1e-12);
        assert!(v.blockade_radius(0.0).is_infinite());
    }

    #[test]
    fn rejects_negative_c6() {
        let atoms = AtomArray::build(Geometry::Chain, 2, 1.0).unwrap();
        assert!(InteractionMatrix::van_der_waals(&atoms, -1.0).is_err());
    }
}
