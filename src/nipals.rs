// src/nipals.rs
//
// Leading principal components by repeated rank-1 extraction and deflation
// (Nonlinear Iterative Partial Least Squares).

use log::{debug, warn};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};

use crate::error::PcaError;

/// Convergence threshold on the change of the squared score norm between iterations.
pub const NIPALS_TOLERANCE: f64 = 1e-9;
/// Hard cap on iterations spent on a single component.
pub const NIPALS_MAX_ITERATIONS: usize = 100;
/// A residual whose squared Frobenius norm falls below this fraction of the input's
/// has no variance left; what remains is deflation round-off.
pub const NIPALS_EXHAUSTION_RATIO: f64 = 1e-12;

/// One rank-1 factor `score · loadingᵗ` of a data matrix.
#[derive(Debug, Clone)]
pub struct NipalsComponent {
    /// Unit-norm direction in feature space. Shape: (n_features)
    pub loading: Array1<f64>,
    /// Projection of every row onto `loading`. Shape: (n_samples)
    pub score: Array1<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl NipalsComponent {
    /// Squared norm of the score vector, i.e. the variance captured times `n - 1`.
    pub fn score_sum_of_squares(&self) -> f64 {
        self.score.dot(&self.score)
    }
}

/// Extracts the dominant rank-1 factor of `x`.
///
/// The score starts as the column of `x` with the largest absolute sum. Each
/// iteration sets `loading = Xᵗ·score / ‖Xᵗ·score‖` and `score = X·loading`, until
/// `‖score‖²` changes by less than `NIPALS_TOLERANCE` or `NIPALS_MAX_ITERATIONS` is hit.
/// A residual with nothing left to explain yields a zero loading and a zero score.
pub fn extract_component(x: &Array2<f64>) -> NipalsComponent {
    let (n_samples, n_features) = x.dim();

    let start_column = x
        .map_axis(Axis(0), |column| column.iter().map(|v| v.abs()).sum::<f64>())
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (idx, &sum)| if sum > best.1 { (idx, sum) } else { best })
        .0;

    let mut score = if n_features == 0 {
        Array1::zeros(n_samples)
    } else {
        x.column(start_column).to_owned()
    };
    let mut loading = Array1::<f64>::zeros(n_features);
    let mut previous_ss = score.dot(&score);

    for iteration in 1..=NIPALS_MAX_ITERATIONS {
        let mut candidate = x.t().dot(&score);
        let norm = candidate.dot(&candidate).sqrt();
        if norm <= 0.0 || !norm.is_finite() {
            return NipalsComponent {
                loading: Array1::zeros(n_features),
                score: Array1::zeros(n_samples),
                iterations: iteration,
                converged: true,
            };
        }
        candidate /= norm;
        loading = candidate;
        score = x.dot(&loading);

        let current_ss = score.dot(&score);
        if (current_ss - previous_ss).abs() < NIPALS_TOLERANCE {
            return NipalsComponent {
                loading,
                score,
                iterations: iteration,
                converged: true,
            };
        }
        previous_ss = current_ss;
    }

    NipalsComponent {
        loading,
        score,
        iterations: NIPALS_MAX_ITERATIONS,
        converged: false,
    }
}

/// Removes the variance captured by `component` from `x` in place: `X ← X − score·loadingᵗ`.
pub fn deflate(x: &mut Array2<f64>, component: &NipalsComponent) {
    let score_col = component.score.view().insert_axis(Axis(1));
    let loading_row = component.loading.view().insert_axis(Axis(0));
    *x -= &score_col.dot(&loading_row);
}

/// Unit vector orthogonal to every row of `previous`, built by Gram-Schmidt from the
/// standard basis vector that keeps the most norm after projection.
/// `previous` must have fewer rows than columns.
fn orthogonal_complement_direction(previous: ArrayView2<f64>) -> Array1<f64> {
    let n_features = previous.ncols();
    let mut best = Array1::<f64>::zeros(n_features);
    let mut best_norm = 0.0;
    for j in 0..n_features {
        let mut candidate = Array1::<f64>::zeros(n_features);
        candidate[j] = 1.0;
        // Two passes keep the projection orthogonal to working precision.
        for _ in 0..2 {
            for row in previous.rows() {
                let overlap = row.dot(&candidate);
                candidate.scaled_add(-overlap, &row);
            }
        }
        let norm = candidate.dot(&candidate).sqrt();
        if norm > best_norm {
            best_norm = norm;
            best = candidate;
        }
    }
    if best_norm > 0.0 {
        best /= best_norm;
    }
    best
}

fn sum_of_squares(x: &Array2<f64>) -> f64 {
    x.iter().map(|v| v * v).sum()
}

/// Computes the `n_components` leading components of the adjusted data matrix.
///
/// Returns `(components, eigenvalues)` where `components` has shape
/// (n_features, n_components) with one loading per column. Each eigenvalue is the
/// captured variance `‖score‖² / (n_samples - 1)` rather than the bare sum of squares
/// `‖score‖²` of textbook NIPALS, so the spectrum lines up with the SVD and
/// covariance strategies.
///
/// Once the residual is exhausted (the data has lower rank than `n_components`), the
/// remaining loadings complete an orthonormal basis and carry eigenvalue 0.
pub fn nipals(data: &Array2<f64>, n_components: usize) -> Result<(Array2<f64>, Array1<f64>), PcaError> {
    let (n_samples, n_features) = data.dim();
    if n_components == 0 || n_components > n_features {
        return Err(PcaError::InvalidComponentCount {
            requested: n_components,
            available: n_features,
        });
    }
    let dof = n_samples.saturating_sub(1).max(1) as f64;
    let exhausted_below = NIPALS_EXHAUSTION_RATIO * sum_of_squares(data);

    // Loadings are assembled as rows and transposed at the end.
    let mut loading_rows = Array2::<f64>::zeros((n_components, n_features));
    let mut eigenvalues = Array1::<f64>::zeros(n_components);
    let mut residual = data.clone();

    for i in 0..n_components {
        if sum_of_squares(&residual) <= exhausted_below {
            warn!(
                "NIPALS residual exhausted at component {}; completing the basis with zero-variance directions.",
                i
            );
            let direction = orthogonal_complement_direction(loading_rows.slice(s![..i, ..]));
            loading_rows.slice_mut(s![i, ..]).assign(&direction);
            continue;
        }

        let component = extract_component(&residual);
        if !component.converged {
            warn!(
                "NIPALS component {} did not converge within {} iterations.",
                i, NIPALS_MAX_ITERATIONS
            );
        }
        let captured = component.score_sum_of_squares();
        debug!(
            "NIPALS component {}: {} iteration(s), sum of squares {:.6e}",
            i, component.iterations, captured
        );

        loading_rows.slice_mut(s![i, ..]).assign(&component.loading);
        eigenvalues[i] = captured / dof;
        deflate(&mut residual, &component);
    }

    Ok((loading_rows.reversed_axes(), eigenvalues))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn rank_one_matrix_is_recovered_in_one_component() {
        // Rows are multiples of [3, 4] / 5.
        let x = array![[3.0, 4.0], [6.0, 8.0], [-3.0, -4.0]];
        let component = extract_component(&x);
        assert!(component.converged);
        assert_abs_diff_eq!(component.loading[0].abs(), 0.6, epsilon = 1e-9);
        assert_abs_diff_eq!(component.loading[1].abs(), 0.8, epsilon = 1e-9);
        assert_abs_diff_eq!(component.score_sum_of_squares(), 25.0 + 100.0 + 25.0, epsilon = 1e-9);

        let mut residual = x.clone();
        deflate(&mut residual, &component);
        assert!(residual.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn exhausted_residual_gives_zero_component() {
        let x = Array2::<f64>::zeros((3, 2));
        let component = extract_component(&x);
        assert!(component.converged);
        assert!(component.loading.iter().all(|&v| v == 0.0));
        assert_eq!(component.score_sum_of_squares(), 0.0);
    }

    #[test]
    fn loadings_are_orthonormal_and_eigenvalues_descending() {
        let x = array![
            [2.0, 0.5, -1.0],
            [-1.0, 1.5, 0.0],
            [0.5, -2.0, 1.0],
            [-1.5, 0.0, 0.0]
        ];
        let centered = &x - &x.mean_axis(Axis(0)).unwrap();
        let (components, eigenvalues) = nipals(&centered, 3).unwrap();
        assert_eq!(components.dim(), (3, 3));
        let gram = components.t().dot(&components);
        assert_abs_diff_eq!(gram, Array2::<f64>::eye(3), epsilon = 1e-6);
        for pair in eigenvalues.windows(2) {
            assert!(pair[0] >= pair[1] - 1e-9);
        }
    }

    #[test]
    fn rank_deficient_data_completes_an_orthonormal_basis() {
        // Rank one after centering; the second and third loadings only span what is left.
        let x = array![[1.0, 2.0, 0.0], [3.0, 4.0, 0.0], [5.0, 6.0, 0.0]];
        let centered = &x - &x.mean_axis(Axis(0)).unwrap();
        let (components, eigenvalues) = nipals(&centered, 3).unwrap();
        let gram = components.t().dot(&components);
        assert_abs_diff_eq!(gram, Array2::<f64>::eye(3), epsilon = 1e-9);
        // ‖X‖²_F = 16 over n - 1 = 2.
        assert_abs_diff_eq!(eigenvalues[0], 8.0, epsilon = 1e-9);
        assert_eq!(eigenvalues[1], 0.0);
        assert_eq!(eigenvalues[2], 0.0);
    }

    #[test]
    fn zero_matrix_yields_standard_basis() {
        let x = Array2::<f64>::zeros((4, 2));
        let (components, eigenvalues) = nipals(&x, 2).unwrap();
        assert_abs_diff_eq!(components.t().dot(&components), Array2::<f64>::eye(2), epsilon = 1e-12);
        assert!(eigenvalues.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn too_many_components_are_rejected() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(matches!(
            nipals(&x, 3),
            Err(PcaError::InvalidComponentCount { requested: 3, available: 2 })
        ));
        assert!(nipals(&x, 0).is_err());
    }
}
