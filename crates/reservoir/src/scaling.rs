//! Mapping of reduced features onto the detuning range.
//!
//! The spectral range is measured on training data and reused for the test
//! split, so both land on the same physical scale.

use faer::{Mat, MatRef};

use crate::error::{LayerError, LayerResult};

/// Largest absolute entry of `x`.
pub fn spectral_range(x: MatRef<'_, f64>) -> f64 {
    let mut max = 0.0f64;
    for j in 0..x.ncols() {
        for i in 0..x.nrows() {
            max = max.max(x.read(i, j).abs());
        }
    }
    max
}

/// `x · detuning_max / spectral`, so that training data spans
/// `[−detuning_max, +detuning_max]`.
pub fn scale_to_detuning_range(
    x: MatRef<'_, f64>,
    spectral: f64,
    detuning_max: f64,
) -> LayerResult<Mat<f64>> {
    if !spectral.is_finite() || spectral <= 0.0 {
        return Err(LayerError::Scaling(format!(
            "spectral range must be positive and finite, got {}",
            spectral
        )));
    }
    if !detuning_max.is_finite() || detuning_max <= 0.0 {
        return Err(LayerError::Scaling(format!(
            "detuning_max must be positive and finite, got {}",
            detuning_max
        )));
    }

    let factor = detuning_max / spectral;
    Ok(Mat::from_fn(x.nrows(), x.ncols(), |i, j| x.read(i, j) * factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_data_fills_the_range() {
        let x = Mat::from_fn(3, 2, |i, j| (i as f64 - 1.0) * (j as f64 + 1.0));
        let spectral = spectral_range(x.as_ref());
        assert_eq!(spectral, 2.0);

        let scaled = scale_to_detuning_range(x.as_ref(), spectral, 6.0).unwrap();
        assert!((spectral_range(scaled.as_ref()) - 6.0).abs() < 1e-12);
        assert!((scaled.read(0, 1) + 6.0).abs() < 1e-12);
    }

    #[test]
    fn zero_spectral_range_is_rejected() {
        let x = Mat::<f64>::zeros(2, 2);
        assert!(matches!(
            scale_to_detuning_range(x.as_ref(), spectral_range(x.as_ref()), 1.0),
            Err(LayerError::Scaling(_))
        ));
    }
}
