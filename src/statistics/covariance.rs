//! Covariance estimation for gradient matrices.
//!
//! Two flavours are needed by the power analysis:
//!
//! - Population (divisor `n`) cross-covariance between two paired gradient
//!   matrices measured on the same labeled rows.
//! - Sample (divisor `m - 1`) covariance of predicted gradients pooled across
//!   the labeled and unlabeled sets. This is accumulated with Welford's
//!   algorithm per set and combined with Chan's merge, so the two sets never
//!   need to be concatenated.

use nalgebra::DMatrix;

use crate::types::{CoordVector, GradientMatrix, SquareMatrix};

/// Online covariance accumulator using Welford's algorithm.
///
/// Holds the running mean and `M2 = Σ(x - μ)(x - μ)ᵀ` for `d`-dimensional
/// rows; [`finalize`](Self::finalize) turns M2 into the unbiased covariance.
#[derive(Debug, Clone)]
pub struct WelfordCovariance {
    /// Count of rows accumulated so far.
    n: usize,
    /// Running mean of rows.
    mean: CoordVector,
    /// Sum of outer products.
    m2: SquareMatrix,
}

impl WelfordCovariance {
    /// Create an empty accumulator for `d`-dimensional rows.
    pub fn new(d: usize) -> Self {
        Self {
            n: 0,
            mean: CoordVector::zeros(d),
            m2: SquareMatrix::zeros(d, d),
        }
    }

    /// Accumulate every row of `rows`.
    pub fn from_rows(rows: &GradientMatrix) -> Self {
        let mut acc = Self::new(rows.ncols());
        for row in rows.row_iter() {
            acc.update(&row.transpose());
        }
        acc
    }

    /// Update the accumulator with one row.
    ///
    /// ```text
    /// δ  = x - μₙ₋₁
    /// μₙ = μₙ₋₁ + δ/n
    /// M2ₙ = M2ₙ₋₁ + δ·(x - μₙ)ᵀ
    /// ```
    pub fn update(&mut self, x: &CoordVector) {
        self.n += 1;
        let n = self.n as f64;

        let delta = x - &self.mean;
        self.mean += &delta / n;
        let delta2 = x - &self.mean;

        self.m2 += delta * delta2.transpose();
    }

    /// Merge another accumulator into this one (Chan et al.).
    ///
    /// ```text
    /// n_AB  = n_A + n_B
    /// δ     = μ_B - μ_A
    /// μ_AB  = (n_A·μ_A + n_B·μ_B) / n_AB
    /// M2_AB = M2_A + M2_B + (n_A·n_B/n_AB)·δ·δᵀ
    /// ```
    pub fn merge(&mut self, other: &Self) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = other.clone();
            return;
        }

        let n_a = self.n as f64;
        let n_b = other.n as f64;
        let n_ab = n_a + n_b;

        let delta = &other.mean - &self.mean;
        self.mean = (&self.mean * n_a + &other.mean * n_b) / n_ab;

        let correction = &delta * delta.transpose() * (n_a * n_b / n_ab);
        self.m2 = &self.m2 + &other.m2 + correction;

        self.n += other.n;
    }

    /// Unbiased sample covariance `M2 / (n - 1)`.
    ///
    /// With fewer than two rows there is no spread to estimate and the zero
    /// matrix is returned.
    pub fn finalize(&self) -> SquareMatrix {
        let d = self.mean.len();
        if self.n < 2 {
            return SquareMatrix::zeros(d, d);
        }
        &self.m2 / (self.n - 1) as f64
    }

    /// Number of rows accumulated.
    pub fn count(&self) -> usize {
        self.n
    }
}

/// Column means of a gradient matrix.
pub fn column_means(grads: &GradientMatrix) -> CoordVector {
    if grads.nrows() == 0 {
        return CoordVector::zeros(grads.ncols());
    }
    grads.row_mean().transpose()
}

/// Subtract each column's mean from that column.
pub fn center_columns(grads: &GradientMatrix) -> GradientMatrix {
    let means = column_means(grads);
    let mut centered = grads.clone();
    for (j, mut col) in centered.column_iter_mut().enumerate() {
        col.add_scalar_mut(-means[j]);
    }
    centered
}

/// Population cross-covariance `(1/n) · aᵀ · b` of two centered matrices.
///
/// Both matrices must have the same number of rows.
pub fn cross_covariance(a_centered: &GradientMatrix, b_centered: &GradientMatrix) -> SquareMatrix {
    let n = a_centered.nrows() as f64;
    a_centered.transpose() * b_centered / n
}

/// Sample covariance of the rows of `first` followed by the rows of `second`.
///
/// Equivalent to the covariance of the vertically stacked matrix.
pub fn pooled_covariance(first: &GradientMatrix, second: &GradientMatrix) -> SquareMatrix {
    let mut acc = WelfordCovariance::from_rows(first);
    acc.merge(&WelfordCovariance::from_rows(second));
    acc.finalize()
}

/// Diagonal of `h · m · h`.
pub fn sandwich_diagonal(h: &SquareMatrix, m: &SquareMatrix) -> CoordVector {
    let product: DMatrix<f64> = h * m * h;
    product.diagonal()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> GradientMatrix {
        GradientMatrix::from_column_slice(values.len(), 1, values)
    }

    /// Batch sample covariance of stacked rows, for comparison.
    fn batch_covariance(rows: &GradientMatrix) -> SquareMatrix {
        let centered = center_columns(rows);
        centered.transpose() * &centered / (rows.nrows() - 1) as f64
    }

    #[test]
    fn test_centering_removes_mean() {
        let g = column(&[1.0, 2.0, 3.0, 6.0]);
        let c = center_columns(&g);
        assert!(c.sum().abs() < 1e-12);
        assert!((c[(0, 0)] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cross_covariance_divides_by_n() {
        let a = center_columns(&column(&[1.0, 2.0, 3.0, 4.0]));
        let b = center_columns(&column(&[2.0, 1.0, 4.0, 3.0]));
        let cov = cross_covariance(&a, &b);
        assert!((cov[(0, 0)] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_pooled_matches_stacked() {
        let labeled = column(&[2.0, 1.0, 4.0, 3.0]);
        let unlabeled = column(&[0.0, 5.0]);
        let pooled = pooled_covariance(&labeled, &unlabeled);
        // mean 2.5, sum of squares 17.5, divisor 5
        assert!((pooled[(0, 0)] - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_pooled_with_empty_unlabeled() {
        let labeled = column(&[1.0, 2.0, 3.0, 4.0]);
        let empty = GradientMatrix::zeros(0, 1);
        let pooled = pooled_covariance(&labeled, &empty);
        assert!((pooled[(0, 0)] - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_welford_numerical_equivalence() {
        let rows = GradientMatrix::from_fn(100, 3, |i, j| ((i * 7 + j * 13) % 17) as f64);

        let batch = batch_covariance(&rows);
        let welford = WelfordCovariance::from_rows(&rows).finalize();

        for i in 0..3 {
            for j in 0..3 {
                let diff = (batch[(i, j)] - welford[(i, j)]).abs();
                assert!(
                    diff < 1e-9,
                    "Mismatch at ({}, {}): batch={}, welford={}",
                    i,
                    j,
                    batch[(i, j)],
                    welford[(i, j)]
                );
            }
        }
    }

    #[test]
    fn test_welford_merge_correctness() {
        let a = GradientMatrix::from_fn(50, 2, |i, j| (i as f64) * (j as f64 + 1.0));
        let b = GradientMatrix::from_fn(30, 2, |i, j| ((i * 3 + j) % 7) as f64 - 2.0);

        let mut merged = WelfordCovariance::from_rows(&a);
        merged.merge(&WelfordCovariance::from_rows(&b));
        assert_eq!(merged.count(), 80);

        let mut stacked = GradientMatrix::zeros(80, 2);
        stacked.rows_mut(0, 50).copy_from(&a);
        stacked.rows_mut(50, 30).copy_from(&b);
        let expected = batch_covariance(&stacked);
        let got = merged.finalize();

        for i in 0..2 {
            for j in 0..2 {
                assert!(
                    (expected[(i, j)] - got[(i, j)]).abs() < 1e-9,
                    "Merge mismatch at ({}, {})",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_welford_edge_cases() {
        let empty = WelfordCovariance::new(2);
        assert_eq!(empty.finalize(), SquareMatrix::zeros(2, 2));

        let mut one = WelfordCovariance::new(1);
        one.update(&CoordVector::from_element(1, 42.0));
        assert_eq!(one.finalize()[(0, 0)], 0.0);
    }

    #[test]
    fn test_sandwich_with_identity() {
        let m = SquareMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 3.0]);
        let h = SquareMatrix::identity(2, 2);
        let diag = sandwich_diagonal(&h, &m);
        assert_eq!(diag.as_slice(), &[2.0, 3.0]);
    }
}
