//! Quantum reservoir layer: detuning-encoded samples in, measured
//! embeddings out.
//!
//! ```no_run
//! use faer::Mat;
//! use quantum::{Geometry, ReadoutType, Shots};
//! use reservoir::{DetuningLayer, LayerConfig};
//! use rng::OndRng;
//!
//! let config = LayerConfig::new(Geometry::Chain, 4, 8.0, 6.28, 2.0, 20, ReadoutType::Correlation, 1.0);
//! let layer = DetuningLayer::new(config)?;
//!
//! let x = Mat::from_fn(16, 4, |i, j| ((i + j) as f64).sin());
//! let mut rng = OndRng::new(b"seed");
//! let embeddings = layer.apply_layer(x.as_ref(), Shots::Sampled(1000), true, &mut rng)?;
//! assert_eq!(embeddings.ncols(), 10);
//! # Ok::<(), reservoir::LayerError>(())
//! ```

pub mod config;
pub mod error;
pub mod layer;
pub mod output;
pub mod scaling;

pub use config::LayerConfig;
pub use error::{LayerError, LayerResult};
pub use layer::DetuningLayer;
pub use scaling::{scale_to_detuning_range, spectral_range};
