//! Prepare molecular datasets for graph learning: standardize the labels,
//! turn every SMILES string into a graph annotated with its rings, and write
//! the graphs to disk.

pub mod config;
pub mod dataset;
pub mod error;
pub mod featurize;
pub mod graph;
pub mod normalize;
pub mod pipeline;
#[cfg(feature = "rdkit")]
pub mod rdkit;
pub mod rings;
pub mod smiles;

pub use config::Config;
pub use dataset::{Dataset, RawExample};
pub use error::{Error, Result};
pub use featurize::{FeaturizationFailure, Featurizer, SmilesFeaturizer};
pub use graph::MolGraph;
pub use pipeline::{persist, run, Preprocessor, Report};
