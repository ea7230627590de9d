use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeaturizerKind {
    #[default]
    Native,
    /// goes through rdkit, needs the `rdkit` feature
    Rdkit,
}

/// Settings for one preprocessing run. Every field has a default, so a config
/// file only needs to list what it changes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    /// CSV columns to use as labels, in order. `None` takes every column
    /// except the SMILES and id columns
    pub label_columns: Option<Vec<String>>,
    /// draw a progress bar while featurizing
    pub progress: bool,
    pub featurizer: FeaturizerKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/MoleculeNet/qm9/raw/qm9.csv"),
            output: PathBuf::from("processed_qm9.json"),
            label_columns: None,
            progress: true,
            featurizer: FeaturizerKind::Native,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| Error::io(path, e))?;
        let r: Self = serde_json::from_reader(BufReader::new(f))?;
        Ok(r)
    }
}
