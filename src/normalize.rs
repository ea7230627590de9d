//! Per-dimension label standardization

use crate::{
    dataset::{Dataset, RawExample},
    error::{Error, Result},
};

/// Mean and population standard deviation of every label dimension.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Statistics {
    pub fn compute(dataset: &Dataset) -> Result<Self> {
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let n = dataset.len() as f64;
        let dim = dataset.label_dim();

        let mut mean = vec![0.0; dim];
        for label in dataset.labels() {
            for (m, v) in mean.iter_mut().zip(label) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; dim];
        for label in dataset.labels() {
            for ((s, v), m) in var.iter_mut().zip(label).zip(&mean) {
                *s += (v - m).powi(2);
            }
        }
        let std = var.into_iter().map(|s| (s / n).sqrt()).collect();

        Ok(Self { mean, std })
    }

    /// Indices of the dimensions with zero variance. Standardizing them
    /// divides by zero.
    pub fn degenerate_dimensions(&self) -> Vec<usize> {
        self.std
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn apply(&self, label: &[f64]) -> Vec<f64> {
        label
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }
}

/// A dataset whose labels have been standardized, along with the statistics
/// used to do it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedDataset {
    pub(crate) examples: Vec<RawExample>,
    pub(crate) stats: Statistics,
}

impl NormalizedDataset {
    pub fn examples(&self) -> &[RawExample] {
        &self.examples
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Standardize every label to zero mean and unit variance per dimension.
/// `dataset` is left untouched.
pub fn normalize(dataset: &Dataset) -> Result<NormalizedDataset> {
    let stats = Statistics::compute(dataset)?;
    let degenerate = stats.degenerate_dimensions();
    if !degenerate.is_empty() {
        log::warn!(
            "label dimensions {degenerate:?} have zero variance, \
             normalized values will not be finite"
        );
    }
    let examples = dataset
        .examples()
        .iter()
        .map(|e| RawExample {
            smiles: e.smiles.clone(),
            label: stats.apply(&e.label),
        })
        .collect();
    Ok(NormalizedDataset { examples, stats })
}
