use super::TrainHyperParam;
use crate::data::LabelIndex;
use crate::error::{Error, Result};
use crate::mat_util::rescale_by_global_max;
use crate::util::create_progress_bar;
use crate::{DataSet, DenseMat, DenseMatView};
use itertools::izip;
use log::info;
use ndarray::{concatenate, s, Axis};
use rand::Rng;
use std::fmt;

/// Regularization strengths evaluated when none are given, in order.
pub const DEFAULT_ALPHAS: [f64; 10] = [1e-15, 1e-10, 1e-8, 1e-5, 1e-4, 1e-3, 1e-2, 1., 5., 10.];

/// Classification accuracy on the test rows for one regularization strength.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Accuracy {
    alpha: f64,
    hits: usize,
    total: usize,
}

impl Accuracy {
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Share of correct predictions, in [0, 100].
    pub fn percentage(&self) -> f64 {
        self.hits as f64 / self.total as f64 * 100.
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Accuracy = {:?}% ({}/{}) while alpha = {}",
            self.percentage(),
            self.hits,
            self.total,
            format_alpha(self.alpha)
        )
    }
}

/// Render alpha the way the sweep list is usually written: whole numbers without a fraction,
/// small and large values with a signed two-digit exponent (`1`, `0.001`, `1e-08`).
fn format_alpha(alpha: f64) -> String {
    let repr = format!("{:?}", alpha);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr.strip_suffix(".0").unwrap_or(&repr).to_string(),
    }
}

/// Fit on rows [0, split) and measure accuracy on rows [split, N).
///
/// A test row counts as a hit only if the predicted one-hot vector equals its target row.
pub fn evaluate<R: Rng + ?Sized>(
    features: DenseMatView,
    targets: DenseMatView,
    split: usize,
    hyper_param: &TrainHyperParam,
    rng: &mut R,
) -> Result<Accuracy> {
    let n_examples = features.nrows();
    if targets.nrows() != n_examples {
        return Err(Error::RowCountMismatch {
            features: n_examples,
            labels: targets.nrows(),
        });
    }
    if split > n_examples {
        return Err(Error::InvalidSplit { split, n_examples });
    }
    if split == n_examples {
        return Err(Error::NoTestExamples { split });
    }
    if split == 0 {
        return Err(Error::EmptyDataSet);
    }

    let model = hyper_param.train(
        features.slice(s![..split, ..]),
        targets.slice(s![..split, ..]),
    )?;

    let test_features = features.slice(s![split.., ..]);
    let test_targets = targets.slice(s![split.., ..]);
    let total = test_features.nrows();

    let mut pb = create_progress_bar(total as u64);
    let start_t = time::precise_time_s();
    let mut hits = 0;
    for (feature_vec, target) in izip!(test_features.outer_iter(), test_targets.outer_iter()) {
        if model.predict(feature_vec, rng)? == target {
            hits += 1;
        }
        pb.inc();
    }
    pb.finish();
    info!(
        "Done testing on {} examples with alpha = {:e}; it took {:.2}s",
        total,
        hyper_param.alpha,
        time::precise_time_s() - start_t
    );

    Ok(Accuracy {
        alpha: hyper_param.alpha,
        hits,
        total,
    })
}

/// Training and test data merged into one globally rescaled matrix.
///
/// Rows before `split` come from the training set, the rest from the test set.
pub struct Experiment {
    label_index: LabelIndex,
    features: DenseMat,
    targets: DenseMat,
    split: usize,
}

impl Experiment {
    /// Merge a training and a test set.
    ///
    /// Labels of both sets share one index, training labels first. Features of both sets are
    /// concatenated and divided by their single largest value.
    pub fn from_datasets(train: &DataSet, test: &DataSet) -> Result<Self> {
        if train.n_features() != test.n_features() {
            return Err(Error::DimensionMismatch {
                row: train.n_examples(),
                expected: train.n_features(),
                found: test.n_features(),
            });
        }

        let labels = || train.labels().iter().chain(test.labels());
        let label_index = LabelIndex::from_labels(labels());
        let targets = label_index.one_hot(labels())?;

        let features = concatenate(
            Axis(0),
            &[train.feature_matrix()?.view(), test.feature_matrix()?.view()],
        )?;
        let features = rescale_by_global_max(features.view());

        info!(
            "Prepared {} training and {} test examples with {} features and {} labels",
            train.n_examples(),
            test.n_examples(),
            features.ncols(),
            label_index.n_labels()
        );
        Ok(Self {
            label_index,
            features,
            targets,
            split: train.n_examples(),
        })
    }

    pub fn label_index(&self) -> &LabelIndex {
        &self.label_index
    }

    pub fn features(&self) -> DenseMatView<'_> {
        self.features.view()
    }

    pub fn targets(&self) -> DenseMatView<'_> {
        self.targets.view()
    }

    pub fn split(&self) -> usize {
        self.split
    }

    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        hyper_param: &TrainHyperParam,
        rng: &mut R,
    ) -> Result<Accuracy> {
        evaluate(
            self.features.view(),
            self.targets.view(),
            self.split,
            hyper_param,
            rng,
        )
    }

    /// Evaluate each alpha in order, reporting every result as soon as it is available.
    ///
    /// Stops at the first failure.
    pub fn sweep<R, F>(
        &self,
        alphas: &[f64],
        normalize: bool,
        rng: &mut R,
        mut report: F,
    ) -> Result<Vec<Accuracy>>
    where
        R: Rng + ?Sized,
        F: FnMut(&Accuracy),
    {
        let mut accuracies = Vec::with_capacity(alphas.len());
        for &alpha in alphas {
            let hyper_param = TrainHyperParam { alpha, normalize };
            let accuracy = self.evaluate(&hyper_param, rng)?;
            report(&accuracy);
            accuracies.push(accuracy);
        }
        Ok(accuracies)
    }
}
