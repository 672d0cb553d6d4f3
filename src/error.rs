use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse feature \"{token}\" on line {line}")]
    Parse { line: usize, token: String },

    #[error("line {line} has no feature columns")]
    MissingFeatures { line: usize },

    #[error("row {row} has {found} features, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{features} feature rows but {labels} label rows")]
    RowCountMismatch { features: usize, labels: usize },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error("data set has no examples")]
    EmptyDataSet,

    #[error("label list is empty")]
    EmptyLabels,

    #[error("label \"{0}\" is not in the label index")]
    UnknownLabel(String),

    #[error("split index {split} is out of range for {n_examples} examples")]
    InvalidSplit { split: usize, n_examples: usize },

    #[error("no test examples after split index {split}")]
    NoTestExamples { split: usize },

    #[error("invalid hyper-parameter: {0}")]
    InvalidHyperParam(String),

    #[error("normal equations stayed singular after raising alpha to {alpha:e}")]
    SingularSystem { alpha: f64 },

    #[error("score vector contains NaN")]
    NonFiniteScore,
}
