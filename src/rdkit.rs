// an alternative front end for the featurizer: let rdkit (MolFromSmiles,
// MolToSmiles) validate and canonicalize the input first, then build the graph
// from the canonical SMILES with the native parser
use pyo3::{prelude::PyAnyMethods, types::PyModule, PyResult, Python};

use crate::{
    error::{Error, Result},
    featurize::{featurize_molecule, FeaturizationFailure, Featurizer},
    graph::MolGraph,
    smiles::Molecule,
};

/// canonical SMILES for `smiles` according to rdkit, or `None` if rdkit could
/// not make a molecule out of it
fn to_canonical(smiles: &str) -> PyResult<Option<String>> {
    Python::with_gil(|py| {
        let chem = PyModule::import_bound(py, "rdkit.Chem")?;
        let mol = chem.call_method1("MolFromSmiles", (smiles,))?;
        if mol.is_none() {
            return Ok(None);
        }
        chem.call_method1("MolToSmiles", (mol,))?.extract().map(Some)
    })
}

pub fn canonicalize(smiles: &str) -> Result<String, FeaturizationFailure> {
    to_canonical(smiles)
        .map_err(|e| FeaturizationFailure::Backend(e.to_string()))?
        .ok_or_else(|| {
            FeaturizationFailure::Backend(format!("rdkit rejected {smiles}"))
        })
}

#[derive(Clone, Copy, Debug)]
pub struct RdkitFeaturizer {
    _private: (),
}

impl RdkitFeaturizer {
    /// fails if the python interpreter can't import rdkit
    pub fn new() -> Result<Self> {
        Python::with_gil(|py| PyModule::import_bound(py, "rdkit.Chem").map(|_| ()))
            .map_err(|e| {
                log::error!("importing rdkit failed: {e}");
                Error::FeaturizerUnavailable("rdkit".to_owned())
            })?;
        Ok(Self { _private: () })
    }
}

impl Featurizer for RdkitFeaturizer {
    fn featurize(&self, smiles: &str) -> Result<MolGraph, FeaturizationFailure> {
        let canonical = canonicalize(smiles)?;
        let mol = Molecule::parse(&canonical)?;
        let mut graph = featurize_molecule(&canonical, &mol)?;
        graph.smiles = smiles.to_owned();
        Ok(graph)
    }
}
