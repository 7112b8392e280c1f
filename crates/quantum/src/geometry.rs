//! Atom layouts.
//!
//! Lattice geometries are filled row-major and truncated after `n` sites:
//! site `i` sits in row `i / w`, column `i % w`, where `w` is the row width
//! of the layout. This order fixes the interaction matrix for every `n`,
//! including counts that do not tile the lattice.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QuantumError, QuantumResult};

/// Named atom layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    /// Atoms at `(i·s, 0)`.
    Chain,
    /// Square lattice, `ceil(sqrt(n))` columns.
    Square,
    /// Triangular lattice, odd rows shifted by `s/2`.
    Triangular,
    /// Regular polygon with nearest-neighbour chord `s`.
    Ring,
    /// Hexagonal lattice with bond length `s`, two sites per unit cell.
    Honeycomb,
}

impl Geometry {
    pub const ALL: [Geometry; 5] = [
        Geometry::Chain,
        Geometry::Square,
        Geometry::Triangular,
        Geometry::Ring,
        Geometry::Honeycomb,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Geometry::Chain => "chain",
            Geometry::Square => "square",
            Geometry::Triangular => "triangular",
            Geometry::Ring => "ring",
            Geometry::Honeycomb => "honeycomb",
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Geometry {
    type Err = QuantumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Geometry::ALL
            .into_iter()
            .find(|g| g.name() == key)
            .ok_or_else(|| {
                QuantumError::Config(format!(
                    "unknown geometry '{}', expected one of chain, square, triangular, ring, honeycomb",
                    s
                ))
            })
    }
}

/// Immutable atom positions in micrometres.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomArray {
    geometry: Geometry,
    spacing: f64,
    positions: Vec<[f64; 3]>,
}

impl AtomArray {
    pub fn build(geometry: Geometry, n_atoms: usize, spacing: f64) -> QuantumResult<Self> {
        if n_atoms == 0 {
            return Err(QuantumError::Config("atom count must be at least 1".into()));
        }
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(QuantumError::Config(format!(
                "lattice spacing must be positive and finite, got {}",
                spacing
            )));
        }

        let positions = match geometry {
            Geometry::Chain => chain(n_atoms, spacing),
            Geometry::Square => square(n_atoms, spacing),
            Geometry::Triangular => triangular(n_atoms, spacing),
            Geometry::Ring => ring(n_atoms, spacing),
            Geometry::Honeycomb => honeycomb(n_atoms, spacing),
        };
        debug_assert_eq!(positions.len(), n_atoms);

        Ok(Self {
            geometry,
            spacing,
            positions,
        })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    pub fn distance(&self, i: usize, j: usize) -> f64 {
        let a = self.positions[i];
        let b = self.positions[j];
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
    }
}

fn row_width(n: usize) -> usize {
    (n as f64).sqrt().ceil() as usize
}

fn chain(n: usize, s: f64) -> Vec<[f64; 3]> {
    (0..n).map(|i| [i as f64 * s, 0.0, 0.0]).collect()
}

fn square(n: usize, s: f64) -> Vec<[f64; 3]> {
    let w = row_width(n);
    (0..n)
        .map(|i| [(i % w) as f64 * s, (i / w) as f64 * s, 0.0])
        .collect()
}

fn triangular(n: usize, s: f64) -> Vec<[f64; 3]> {
    let w = row_width(n);
    let pitch = s * 3.0_f64.sqrt() / 2.0;
    (0..n)
        .map(|i| {
            let row = i / w;
            let shift = if row % 2 == 1 { 0.5 * s } else { 0.0 };
            [(i % w) as f64 * s + shift, row as f64 * pitch, 0.0]
        })
        .collect()
}

fn ring(n: usize, s: f64) -> Vec<[f64; 3]> {
    match n {
        1 => vec![[0.0, 0.0, 0.0]],
        2 => vec![[-0.5 * s, 0.0, 0.0], [0.5 * s, 0.0, 0.0]],
        _ => {
            let radius = s / (2.0 * (PI / n as f64).sin());
            (0..n)
                .map(|i| {
                    let phi = 2.0 * PI * i as f64 / n as f64;
                    [radius * phi.cos(), radius * phi.sin(), 0.0]
                })
                .collect()
        }
    }
}

fn honeycomb(n: usize, s: f64) -> Vec<[f64; 3]> {
    let cells = n.div_ceil(2);
    let w = row_width(cells);
    let sqrt3 = 3.0_f64.sqrt();
    let a1 = [sqrt3 * s, 0.0];
    let a2 = [0.5 * sqrt3 * s, 1.5 * s];

    let mut out = Vec::with_capacity(n);
    for cell in 0..cells {
        let (c, r) = ((cell % w) as f64, (cell / w) as f64);
        let origin = [c * a1[0] + r * a2[0], c * a1[1] + r * a2[1]];
        out.push([origin[0], origin[1], 0.0]);
        out.push([origin[0], origin[1] + s, 0.0]);
    }
    out.truncate(n);
    out
}
