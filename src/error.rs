use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline errors. Per-molecule problems are reported through
/// [crate::featurize::FeaturizationFailure] instead and never end up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported dataset format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("dataset is missing the '{0}' column")]
    MissingColumn(String),

    #[error("example {index}: {reason}")]
    InvalidExample { index: usize, reason: String },

    #[error("example {index}: label has {found} values, expected {expected}")]
    LabelDimension {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("cannot compute label statistics over an empty dataset")]
    EmptyDataset,

    #[error("featurizer '{0}' is not available in this build")]
    FeaturizerUnavailable(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
