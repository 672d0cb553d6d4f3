pub mod eval;
pub mod ridge;

use crate::error::{Error, Result};
use crate::mat_util::find_max_indices;
use crate::{DenseMat, DenseMatView, DenseVec, DenseVecView};
use ndarray::s;
use rand::seq::SliceRandom;
use rand::Rng;

pub use self::ridge::HyperParam as TrainHyperParam;

/// A one-vs-all linear classifier.
///
/// Row k of the K x (D+1) weight matrix scores class k; column 0 holds the intercepts.
#[derive(Clone, Debug)]
pub struct Model {
    weights: DenseMat,
}

impl Model {
    pub(crate) fn from_weights(weights: DenseMat) -> Result<Self> {
        if weights.nrows() == 0 {
            return Err(Error::EmptyLabels);
        }
        assert!(weights.ncols() > 0);
        Ok(Self { weights })
    }

    pub fn n_labels(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols() - 1
    }

    pub fn weights(&self) -> DenseMatView<'_> {
        self.weights.view()
    }

    /// Compute the score of each class for a feature vector, i.e. W [1, x].
    pub fn predict_scores(&self, feature_vec: DenseVecView) -> Result<DenseVec> {
        if feature_vec.len() != self.n_features() {
            return Err(Error::DimensionMismatch {
                row: 0,
                expected: self.n_features(),
                found: feature_vec.len(),
            });
        }
        Ok(self.weights.slice(s![.., 1..]).dot(&feature_vec) + self.weights.column(0))
    }

    /// Predict the class index with the highest score.
    ///
    /// If several classes share the highest score, one of them is picked uniformly at random.
    pub fn predict_index<R: Rng + ?Sized>(
        &self,
        feature_vec: DenseVecView,
        rng: &mut R,
    ) -> Result<usize> {
        let scores = self.predict_scores(feature_vec)?;
        let winners = find_max_indices(scores.view()).map_err(|_| Error::NonFiniteScore)?;
        winners.choose(rng).copied().ok_or(Error::EmptyLabels)
    }

    /// Predict a one-hot vector of length K marking the winning class.
    pub fn predict<R: Rng + ?Sized>(
        &self,
        feature_vec: DenseVecView,
        rng: &mut R,
    ) -> Result<DenseVec> {
        let winner = self.predict_index(feature_vec, rng)?;
        let mut one_hot = DenseVec::zeros(self.n_labels());
        one_hot[winner] = 1.;
        Ok(one_hot)
    }
}
