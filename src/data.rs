use crate::error::{Error, Result};
use crate::DenseMat;
use hashbrown::HashMap;
use itertools::Itertools;
use log::info;
use ndarray::Array2;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Where the class label sits in each comma-separated line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LabelPosition {
    /// The first field is the label.
    Head,
    /// The last field is the label.
    Tail,
}

/// A data set loaded in memory.
#[derive(Clone, Debug)]
pub struct DataSet {
    pub(crate) n_features: usize,
    pub(crate) feature_lists: Vec<Vec<f64>>,
    pub(crate) labels: Vec<String>,
}

/// Parse a comma-separated line of numeric features and one label token.
///
/// `line_no` is 1-based and only used for error reporting.
fn parse_csv_line(
    line: &str,
    line_no: usize,
    label_position: LabelPosition,
) -> Result<(Vec<f64>, String)> {
    let tokens = line.split(',').map(str::trim).collect_vec();
    let (label, feature_tokens) = match label_position {
        LabelPosition::Head => tokens.split_first(),
        LabelPosition::Tail => tokens.split_last(),
    }
    .filter(|(_, rest)| !rest.is_empty())
    .ok_or(Error::MissingFeatures { line: line_no })?;

    let features = feature_tokens
        .iter()
        .map(|token| {
            // "nan" and "inf" parse as floats but are not usable feature values
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| Error::Parse {
                    line: line_no,
                    token: token.to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((features, label.to_string()))
}

/// Assemble feature rows into a dense matrix.
///
/// Every row must have as many features as the first one.
pub fn feature_matrix(feature_lists: &[Vec<f64>]) -> Result<DenseMat> {
    let n_features = check_feature_counts(feature_lists)?;
    let values = feature_lists.iter().flatten().cloned().collect_vec();
    Ok(Array2::from_shape_vec((feature_lists.len(), n_features), values)?)
}

fn check_feature_counts(feature_lists: &[Vec<f64>]) -> Result<usize> {
    let n_features = feature_lists.first().ok_or(Error::EmptyDataSet)?.len();
    for (row, features) in feature_lists.iter().enumerate() {
        if features.len() != n_features {
            return Err(Error::DimensionMismatch {
                row,
                expected: n_features,
                found: features.len(),
            });
        }
    }
    Ok(n_features)
}

impl DataSet {
    /// Create a data set from parsed rows, checking that all rows have the same width.
    pub fn from_records(feature_lists: Vec<Vec<f64>>, labels: Vec<String>) -> Result<Self> {
        if feature_lists.len() != labels.len() {
            return Err(Error::RowCountMismatch {
                features: feature_lists.len(),
                labels: labels.len(),
            });
        }
        let n_features = check_feature_counts(&feature_lists)?;
        Ok(Self {
            n_features,
            feature_lists,
            labels,
        })
    }

    /// Load a comma-separated data file.
    ///
    /// Blank lines are skipped. Every other line must hold at least one numeric feature and a
    /// label, which is either the first or the last field depending on `label_position`.
    pub fn load_csv_file(path: impl AsRef<Path>, label_position: LabelPosition) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading data from {}", path.display());
        let start_t = time::precise_time_s();

        let io_error = |source: std::io::Error| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_error)?);

        let mut feature_lists = Vec::new();
        let mut labels = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(io_error)?;
            if line.trim().is_empty() {
                continue;
            }
            let (features, label) = parse_csv_line(&line, i + 1, label_position)?;
            feature_lists.push(features);
            labels.push(label);
        }

        let dataset = Self::from_records(feature_lists, labels)?;
        info!(
            "Loaded {} examples with {} features; it took {:.2}s",
            dataset.n_examples(),
            dataset.n_features,
            time::precise_time_s() - start_t
        );
        Ok(dataset)
    }

    pub fn n_examples(&self) -> usize {
        self.feature_lists.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn feature_matrix(&self) -> Result<DenseMat> {
        feature_matrix(&self.feature_lists)
    }
}

/// Maps label tokens to dense class indices.
///
/// Indices are handed out in the order labels are first seen, so the same label sequence
/// always produces the same assignment.
#[derive(Clone, Debug, Default)]
pub struct LabelIndex {
    label_to_index: HashMap<String, usize>,
    index_to_label: Vec<String>,
}

impl LabelIndex {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        for label in labels {
            index.insert(label.as_ref());
        }
        index
    }

    /// Add a label if unseen; returns its index either way.
    pub fn insert(&mut self, label: &str) -> usize {
        if let Some(&index) = self.label_to_index.get(label) {
            return index;
        }
        self.index_to_label.push(label.to_owned());
        let index = self.index_to_label.len() - 1;
        self.label_to_index.insert(label.to_owned(), index);
        index
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.label_to_index.get(label).copied()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.index_to_label.get(index).map(String::as_str)
    }

    pub fn n_labels(&self) -> usize {
        self.index_to_label.len()
    }

    /// Encode labels as an N x K indicator matrix, one 1 per row at the label's column.
    pub fn one_hot<I, S>(&self, labels: I) -> Result<DenseMat>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indices = labels
            .into_iter()
            .map(|label| {
                let label = label.as_ref();
                self.index_of(label)
                    .ok_or_else(|| Error::UnknownLabel(label.to_owned()))
            })
            .collect::<Result<Vec<_>>>()?;
        if indices.is_empty() {
            return Err(Error::EmptyLabels);
        }

        let mut one_hot = DenseMat::zeros((indices.len(), self.n_labels()));
        for (row, &index) in indices.iter().enumerate() {
            one_hot[[row, index]] = 1.;
        }
        Ok(one_hot)
    }
}

/// Build a label index from `labels` and encode them as a one-hot matrix.
pub fn encode_labels<S: AsRef<str>>(labels: &[S]) -> Result<(LabelIndex, DenseMat)> {
    let index = LabelIndex::from_labels(labels);
    let one_hot = index.one_hot(labels)?;
    Ok((index, one_hot))
}
