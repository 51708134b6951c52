//! Input normalization.
//!
//! Measurements arrive as flat slices, vectors or single-column matrices and
//! leave as an `n x 1` column matrix, so every downstream computation can
//! treat them as a gradient matrix with one estimand coordinate.

use nalgebra::{DMatrix, DVector};

use crate::error::{PowerError, Result};
use crate::types::WeightVector;

/// A source of measurements that can be reshaped into a single column.
pub trait Measurements {
    /// Number of rows and columns this input presents.
    fn shape(&self) -> (usize, usize);

    /// Copy the values into an `n x 1` column matrix.
    ///
    /// Only called once `shape()` has reported at most one column.
    fn to_column(&self) -> DMatrix<f64>;
}

impl Measurements for [f64] {
    fn shape(&self) -> (usize, usize) {
        (self.len(), 1)
    }

    fn to_column(&self) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.len(), 1, self)
    }
}

impl Measurements for Vec<f64> {
    fn shape(&self) -> (usize, usize) {
        self.as_slice().shape()
    }

    fn to_column(&self) -> DMatrix<f64> {
        self.as_slice().to_column()
    }
}

impl<const N: usize> Measurements for [f64; N] {
    fn shape(&self) -> (usize, usize) {
        (N, 1)
    }

    fn to_column(&self) -> DMatrix<f64> {
        self.as_slice().to_column()
    }
}

impl Measurements for DVector<f64> {
    fn shape(&self) -> (usize, usize) {
        (self.len(), 1)
    }

    fn to_column(&self) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.len(), 1, self.as_slice())
    }
}

impl Measurements for DMatrix<f64> {
    fn shape(&self) -> (usize, usize) {
        self.shape()
    }

    fn to_column(&self) -> DMatrix<f64> {
        // A 0-column matrix still has a row count worth keeping.
        if self.ncols() == 0 {
            DMatrix::zeros(self.nrows(), 1)
        } else {
            self.clone()
        }
    }
}

impl<T: Measurements + ?Sized> Measurements for &T {
    fn shape(&self) -> (usize, usize) {
        (**self).shape()
    }

    fn to_column(&self) -> DMatrix<f64> {
        (**self).to_column()
    }
}

/// Reshape `input` into an `n x 1` column matrix.
///
/// # Errors
///
/// - [`PowerError::InvalidShape`] if the input has more than one column.
/// - [`PowerError::NonFiniteValue`] if any value is NaN or infinite.
pub fn as_column<M: Measurements + ?Sized>(name: &'static str, input: &M) -> Result<DMatrix<f64>> {
    let (_, columns) = input.shape();
    if columns > 1 {
        return Err(PowerError::InvalidShape { name, columns });
    }
    let column = input.to_column();
    if let Some(index) = column.iter().position(|x| !x.is_finite()) {
        return Err(PowerError::NonFiniteValue { name, index });
    }
    Ok(column)
}

/// Build the weight vector for `len` samples.
///
/// Passes supplied weights through after validation, or returns all ones.
///
/// # Errors
///
/// - [`PowerError::WeightLength`] if `weights` does not have exactly `len` entries.
/// - [`PowerError::InvalidWeights`] if any weight is negative or not finite.
pub fn weight_vector(name: &'static str, len: usize, weights: Option<&[f64]>) -> Result<WeightVector> {
    match weights {
        None => Ok(WeightVector::from_element(len, 1.0)),
        Some(w) => {
            if w.len() != len {
                return Err(PowerError::WeightLength {
                    name,
                    expected: len,
                    actual: w.len(),
                });
            }
            if w.iter().any(|x| !x.is_finite() || *x < 0.0) {
                return Err(PowerError::InvalidWeights { name });
            }
            Ok(WeightVector::from_column_slice(w))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_becomes_column() {
        let col = as_column("Y", &[1.0, 2.0, 3.0][..]).unwrap();
        assert_eq!(col.shape(), (3, 1));
        assert_eq!(col[(2, 0)], 3.0);
    }

    #[test]
    fn test_single_column_matrix_passes_through() {
        let m = DMatrix::from_column_slice(2, 1, &[4.0, 5.0]);
        let col = as_column("Yhat", &m).unwrap();
        assert_eq!(col, m);
    }

    #[test]
    fn test_multi_column_rejected() {
        let m = DMatrix::<f64>::zeros(4, 2);
        let err = as_column("Yhat_unlabeled", &m).unwrap_err();
        assert_eq!(
            err,
            PowerError::InvalidShape {
                name: "Yhat_unlabeled",
                columns: 2
            }
        );
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let err = as_column("Y", &[1.0, f64::NAN, 3.0][..]).unwrap_err();
        assert_eq!(err, PowerError::NonFiniteValue { name: "Y", index: 1 });

        let m = DMatrix::from_column_slice(2, 1, &[0.0, f64::NEG_INFINITY]);
        let err = as_column("Yhat", &m).unwrap_err();
        assert_eq!(err, PowerError::NonFiniteValue { name: "Yhat", index: 1 });
    }

    #[test]
    fn test_empty_vector_is_zero_rows() {
        let col = as_column("Yhat_unlabeled", &Vec::<f64>::new()).unwrap();
        assert_eq!(col.shape(), (0, 1));
    }

    #[test]
    fn test_default_weights_are_ones() {
        let w = weight_vector("w", 3, None).unwrap();
        assert_eq!(w.as_slice(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_weight_length_checked() {
        let err = weight_vector("w", 3, Some(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(
            err,
            PowerError::WeightLength {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = weight_vector("w_unlabeled", 2, Some(&[1.0, -0.5])).unwrap_err();
        assert_eq!(err, PowerError::InvalidWeights { name: "w_unlabeled" });
    }
}
