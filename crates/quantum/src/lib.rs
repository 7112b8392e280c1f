//! Dense state-vector simulation of a driven Rydberg register.
//!
//! The pipeline for one input row is
//! [`AtomArray`] → [`InteractionMatrix`] → [`RydbergHamiltonian`] →
//! [`evolve`] → [`readout()`]. Geometry and interaction data are built once
//! and shared; everything after that is per-sample.

pub mod error;
pub mod evolution;
pub mod geometry;
pub mod hamiltonian;
pub mod interaction;
pub mod measurement;
pub mod readout;
pub mod state;

pub use error::{QuantumError, QuantumResult};
pub use evolution::{evolve, NormTolerance, Propagator};
pub use geometry::{AtomArray, Geometry};
pub use hamiltonian::{Drive, HamiltonianSchedule, InteractionTerm, RydbergHamiltonian};
pub use interaction::{InteractionMatrix, DEFAULT_C6};
pub use measurement::{ShotSample, ShotSampler};
pub use readout::{readout, ReadoutType, Shots};
pub use state::StateVector;

pub type C64 = num_complex::Complex64;
