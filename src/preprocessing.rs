// src/preprocessing.rs

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::PcaError;

/// Per-column statistics captured while adjusting the training data.
/// They are replayed unchanged on every later `predict`/`invert` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjustment {
    /// Column means of the raw data, present iff centering was applied.
    /// Shape: (n_features)
    pub means: Option<Array1<f64>>,
    /// Sample standard deviations of the retained columns, present iff scaling was applied.
    /// Shape: (n_features - excluded_features.len())
    pub stdevs: Option<Array1<f64>>,
    /// Original indices of zero-variance columns that were dropped, ascending.
    pub excluded_features: Vec<usize>,
}

/// Centers and (optionally) scales a copy of `data`.
///
/// Scaling is only performed together with centering. Standard deviations use the
/// `n - 1` sample convention, so callers must pass at least 2 rows when `scale` is set.
///
/// Columns whose standard deviation is exactly zero either abort the adjustment with
/// `PcaError::DegenerateInput` or, when `ignore_zero_variance` is set, are removed from
/// the working matrix and recorded in `Adjustment::excluded_features` by their original index.
///
/// The input is never modified; the returned working matrix is a fresh allocation.
pub fn adjust(
    data: ArrayView2<f64>,
    center: bool,
    scale: bool,
    ignore_zero_variance: bool,
) -> Result<(Array2<f64>, Adjustment), PcaError> {
    if !center {
        return Ok((data.to_owned(), Adjustment::default()));
    }

    let means = data.mean_axis(Axis(0)).ok_or(PcaError::EmptyInput)?;
    let mut working = &data - &means;

    if !scale {
        debug!("Centered {}x{} data matrix.", working.nrows(), working.ncols());
        return Ok((
            working,
            Adjustment {
                means: Some(means),
                ..Adjustment::default()
            },
        ));
    }

    let all_stdevs = working.std_axis(Axis(0), 1.0);
    let mut excluded_features = Vec::new();
    for (column, &stdev) in all_stdevs.iter().enumerate() {
        if stdev == 0.0 {
            if !ignore_zero_variance {
                return Err(PcaError::DegenerateInput { column });
            }
            excluded_features.push(column);
        }
    }

    let stdevs = if excluded_features.is_empty() {
        all_stdevs
    } else {
        warn!(
            "Excluding {} zero-variance column(s) from scaling: {:?}",
            excluded_features.len(),
            excluded_features
        );
        let kept = kept_columns(working.ncols(), &excluded_features);
        working = working.select(Axis(1), &kept);
        all_stdevs.select(Axis(0), &kept)
    };
    working /= &stdevs;

    debug!(
        "Centered and scaled data matrix; working shape {:?}, {} column(s) excluded.",
        working.dim(),
        excluded_features.len()
    );
    Ok((
        working,
        Adjustment {
            means: Some(means),
            stdevs: Some(stdevs),
            excluded_features,
        },
    ))
}

/// Indices in `0..n_columns` that are not listed in `excluded`.
pub(crate) fn kept_columns(n_columns: usize, excluded: &[usize]) -> Vec<usize> {
    (0..n_columns).filter(|c| !excluded.contains(c)).collect()
}

impl Adjustment {
    /// Applies the recorded centering, column exclusion and scaling to new data.
    pub fn replay(&self, data: ArrayView2<f64>) -> Result<Array2<f64>, PcaError> {
        let mut working = match &self.means {
            Some(means) => {
                if data.ncols() != means.len() {
                    return Err(PcaError::DimensionMismatch {
                        expected: means.len(),
                        found: data.ncols(),
                        context: "predict input columns",
                    });
                }
                &data - means
            }
            None => data.to_owned(),
        };

        if let Some(stdevs) = &self.stdevs {
            if !self.excluded_features.is_empty() {
                let kept = kept_columns(working.ncols(), &self.excluded_features);
                working = working.select(Axis(1), &kept);
            }
            if working.ncols() != stdevs.len() {
                return Err(PcaError::DimensionMismatch {
                    expected: stdevs.len(),
                    found: working.ncols(),
                    context: "predict input columns after exclusion",
                });
            }
            working /= stdevs;
        }
        Ok(working)
    }

    /// Undoes scaling and centering on data reconstructed in the adjusted space.
    ///
    /// Excluded columns are re-inserted at their original positions. They were constant
    /// in the training data, so their restored value is the recorded mean.
    pub fn restore(&self, mut reconstructed: Array2<f64>) -> Result<Array2<f64>, PcaError> {
        if let Some(stdevs) = &self.stdevs {
            if reconstructed.ncols() != stdevs.len() {
                return Err(PcaError::DimensionMismatch {
                    expected: stdevs.len(),
                    found: reconstructed.ncols(),
                    context: "reconstructed columns",
                });
            }
            reconstructed *= stdevs;
        }

        if let Some(means) = &self.means {
            let expected_kept = means.len().saturating_sub(self.excluded_features.len());
            if reconstructed.ncols() != expected_kept {
                return Err(PcaError::DimensionMismatch {
                    expected: expected_kept,
                    found: reconstructed.ncols(),
                    context: "reconstructed columns",
                });
            }
            if !self.excluded_features.is_empty() {
                let mut full = Array2::<f64>::zeros((reconstructed.nrows(), means.len()));
                let kept = kept_columns(means.len(), &self.excluded_features);
                for (source, &target) in kept.iter().enumerate() {
                    full.column_mut(target).assign(&reconstructed.column(source));
                }
                reconstructed = full;
            }
            reconstructed += means;
        }
        Ok(reconstructed)
    }
}
