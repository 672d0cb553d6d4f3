use super::Model;
use crate::error::{Error, Result};
use crate::mat_util::{cholesky_factor, cholesky_solve, with_bias_column};
use crate::{DenseMat, DenseMatView};
use const_default::ConstDefault;
use itertools::izip;
use log::{debug, warn};
use ndarray::Axis;

/// Pivots at or below this fraction of the largest diagonal entry count as singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// The first fallback alpha, relative to the mean diagonal entry of the Gram matrix.
const FALLBACK_ALPHA_SCALE: f64 = 1e-10;

/// Number of times alpha is raised before giving up on a singular system.
const MAX_FALLBACK_ATTEMPTS: usize = 8;

/// Hyper-parameter settings for fitting ridge regression weights.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HyperParam {
    /// Strength of the L2 penalty on the weights, intercepts included.
    pub alpha: f64,
    /// Scale each feature column to unit L2 norm before solving.
    ///
    /// The returned weights are mapped back, so they apply to unscaled feature vectors.
    pub normalize: bool,
}

impl ConstDefault for HyperParam {
    const DEFAULT: Self = Self {
        alpha: 1.,
        normalize: false,
    };
}

impl Default for HyperParam {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl HyperParam {
    /// Check validity of hyper-parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0. {
            Err(Error::InvalidHyperParam(format!(
                "alpha must be a non-negative finite number, but is {}",
                self.alpha
            )))
        } else {
            Ok(())
        }
    }

    /// Fit one-vs-all ridge regression weights.
    ///
    /// Minimizes |[1, X] W^T - Y|^2 + alpha |W|^2 in closed form, where X is N x D and Y is the
    /// N x K one-hot target matrix. The resulting model has a K x (D+1) weight matrix.
    pub fn train(&self, features: DenseMatView, targets: DenseMatView) -> Result<Model> {
        self.validate()?;
        if features.nrows() != targets.nrows() {
            return Err(Error::RowCountMismatch {
                features: features.nrows(),
                labels: targets.nrows(),
            });
        }
        if features.nrows() == 0 {
            return Err(Error::EmptyDataSet);
        }
        if targets.ncols() == 0 {
            return Err(Error::EmptyLabels);
        }

        let mut design = with_bias_column(features);
        let column_norms = if self.normalize {
            Some(normalize_columns(&mut design))
        } else {
            None
        };

        let gram = design.t().dot(&design);
        let rhs = design.t().dot(&targets);
        let (weights_t, alpha) = solve_regularized(&gram, rhs.view(), self.alpha)?;

        let mut weights = weights_t.reversed_axes();
        if let Some(norms) = column_norms {
            for (mut column, &norm) in izip!(weights.axis_iter_mut(Axis(1)), &norms) {
                column /= norm;
            }
        }
        debug!(
            "Fitted {} x {} weights with alpha = {:e}",
            weights.nrows(),
            weights.ncols(),
            alpha
        );

        Model::from_weights(weights)
    }
}

/// Scale every column except the leading bias column to unit L2 norm.
///
/// Returns the divisor applied to each column; all-zero columns and the bias column keep 1.
fn normalize_columns(design: &mut DenseMat) -> Vec<f64> {
    let mut norms = vec![1.; design.ncols()];
    for (mut column, norm) in izip!(design.axis_iter_mut(Axis(1)), &mut norms).skip(1) {
        let length = column.dot(&column).sqrt();
        if length > 0. {
            column /= length;
            *norm = length;
        }
    }
    norms
}

/// Solve (G + alpha I) X = B via Cholesky factorization.
///
/// If the system is singular at the requested alpha, which happens when alpha is (close to) zero
/// and the design matrix is rank-deficient, alpha is raised to a small floor and then by factors
/// of 10 until the factorization succeeds. Returns the solution and the alpha actually used.
fn solve_regularized(gram: &DenseMat, rhs: DenseMatView, alpha: f64) -> Result<(DenseMat, f64)> {
    let diag = gram.diag();
    let max_diag = diag.fold(0f64, |m, &v| m.max(v));
    let min_pivot = max_diag * PIVOT_TOLERANCE;
    let alpha_floor = FALLBACK_ALPHA_SCALE * diag.mean().unwrap_or(1.).max(f64::MIN_POSITIVE);

    let mut alpha = alpha;
    for attempt in 0..=MAX_FALLBACK_ATTEMPTS {
        let mut regularized = gram.clone();
        regularized.diag_mut().map_inplace(|v| *v += alpha);
        if let Some(l) = cholesky_factor(regularized.view(), min_pivot) {
            return Ok((cholesky_solve(l.view(), rhs), alpha));
        }
        if attempt == MAX_FALLBACK_ATTEMPTS {
            break;
        }

        let raised = if alpha < alpha_floor {
            alpha_floor
        } else {
            alpha * 10.
        };
        warn!(
            "Normal equations are singular with alpha = {:e}; retrying with alpha = {:e}",
            alpha, raised
        );
        alpha = raised;
    }

    Err(Error::SingularSystem { alpha })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encode_labels;
    use ndarray::array;

    fn hyper_param(alpha: f64) -> HyperParam {
        HyperParam {
            alpha,
            ..HyperParam::DEFAULT
        }
    }

    #[test]
    fn test_train_exact_fit() {
        let model = hyper_param(0.)
            .train(array![[0.], [1.]].view(), array![[0.], [1.]].view())
            .unwrap();
        assert_eq!((1, 2), model.weights().dim());
        assert_approx_eq!(0., model.weights()[[0, 0]]);
        assert_approx_eq!(1., model.weights()[[0, 1]]);
    }

    #[test]
    fn test_train_with_penalty() {
        // (X'^T X' + I) w = X'^T y with X' = [[1, 0], [1, 1]] and y = [0, 1]
        let model = hyper_param(1.)
            .train(array![[0.], [1.]].view(), array![[0.], [1.]].view())
            .unwrap();
        assert_approx_eq!(0.2, model.weights()[[0, 0]]);
        assert_approx_eq!(0.4, model.weights()[[0, 1]]);
    }

    #[test]
    fn test_train_shape() {
        let features = array![
            [0.1, 0.5, 0.2],
            [0.9, 0.1, 0.4],
            [0.3, 0.3, 0.8],
            [0.7, 0.6, 0.1],
            [0.2, 0.9, 0.5],
        ];
        let (_, targets) = encode_labels(&["a", "b", "c", "d", "a"]).unwrap();
        for &alpha in &[1e-15, 1e-3, 1., 10.] {
            let model = hyper_param(alpha)
                .train(features.view(), targets.view())
                .unwrap();
            assert_eq!((4, 4), model.weights().dim());
            assert_eq!(4, model.n_labels());
            assert_eq!(3, model.n_features());
            assert!(model.weights().iter().all(|w| w.is_finite()));
        }
    }

    #[test]
    fn test_train_rank_deficient() {
        // The feature column duplicates the bias column, so X'^T X' is singular
        let features = array![[1.], [1.], [1.]];
        let (_, targets) = encode_labels(&["a", "b", "a"]).unwrap();
        let model = hyper_param(0.)
            .train(features.view(), targets.view())
            .unwrap();
        assert_eq!((2, 2), model.weights().dim());
        assert!(model.weights().iter().all(|w| w.is_finite()));

        // Both columns carry the same information, so their weights are split evenly and the
        // score of each class is its frequency
        let scores = model.predict_scores(array![1.].view()).unwrap();
        assert_approx_eq!(2. / 3., scores[0], 1e-6);
        assert_approx_eq!(1. / 3., scores[1], 1e-6);
        assert_approx_eq!(model.weights()[[0, 0]], model.weights()[[0, 1]], 1e-4);
    }

    #[test]
    fn test_train_normalized() {
        // Without a penalty the least squares solution is unique, so scaling columns must not
        // change the weights
        let features = array![[0., 10.], [1., 0.], [2., 30.], [4., 10.], [3., 20.]];
        let targets = array![[1.], [0.], [2.], [3.], [1.]];
        let plain = hyper_param(0.)
            .train(features.view(), targets.view())
            .unwrap();
        let normalized = HyperParam {
            alpha: 0.,
            normalize: true,
        }
        .train(features.view(), targets.view())
        .unwrap();
        for (&w1, &w2) in plain.weights().iter().zip(normalized.weights().iter()) {
            assert_approx_eq!(w1, w2, 1e-6);
        }
    }

    #[test]
    fn test_normalize_columns() {
        let mut design = array![[1., 3., 0.], [1., 4., 0.]];
        let norms = normalize_columns(&mut design);
        assert_eq!(vec![1., 5., 1.], norms);
        assert_eq!(array![[1., 0.6, 0.], [1., 0.8, 0.]], design);
    }

    #[test]
    fn test_solve_regularized_fallback() {
        let gram = array![[2., 2.], [2., 2.]];
        let rhs = array![[1.], [1.]];
        let (solution, alpha) = solve_regularized(&gram, rhs.view(), 0.).unwrap();
        assert!(alpha > 0.);
        assert_approx_eq!(0.25, solution[[0, 0]], 1e-4);
        assert_approx_eq!(0.25, solution[[1, 0]], 1e-4);
        assert_approx_eq!(0.5, solution[[0, 0]] + solution[[1, 0]], 1e-8);

        let (_, alpha) = solve_regularized(&gram, rhs.view(), 0.5).unwrap();
        assert_eq!(0.5, alpha);
    }

    #[test]
    fn test_validate() {
        assert!(HyperParam::DEFAULT.validate().is_ok());
        assert!(hyper_param(0.).validate().is_ok());
        assert!(hyper_param(-1.).validate().is_err());
        assert!(hyper_param(f64::NAN).validate().is_err());
        assert!(hyper_param(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_train_errors() {
        assert!(matches!(
            hyper_param(1.).train(array![[0.], [1.]].view(), array![[1.]].view()),
            Err(Error::RowCountMismatch {
                features: 2,
                labels: 1
            })
        ));
        assert!(matches!(
            hyper_param(1.).train(DenseMat::zeros((0, 2)).view(), DenseMat::zeros((0, 1)).view()),
            Err(Error::EmptyDataSet)
        ));
        assert!(matches!(
            hyper_param(-1.).train(array![[0.]].view(), array![[1.]].view()),
            Err(Error::InvalidHyperParam(_))
        ));
    }
}
