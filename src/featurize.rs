//! Turning SMILES strings into [MolGraph]s

use thiserror::Error;

use crate::{
    graph::{AtomFeatures, BondFeatures, MolGraph},
    rings::RingInfo,
    smiles::{BondOrder, Molecule, SmilesError},
};

/// Why one molecule could not be featurized. These never abort a pipeline
/// run, the molecule is skipped instead.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FeaturizationFailure {
    #[error("invalid SMILES: {0}")]
    Parse(#[from] SmilesError),
    #[error("atom {atom} ({symbol}) has {valence} bonds, more than any allowed valence")]
    Valence {
        atom: usize,
        symbol: String,
        valence: usize,
    },
    #[error("{0}")]
    Backend(String),
}

/// Converts a SMILES string into a graph with ring annotations. The returned
/// graph has an empty label.
pub trait Featurizer {
    fn featurize(&self, smiles: &str) -> Result<MolGraph, FeaturizationFailure>;
}

impl<F: Featurizer + ?Sized> Featurizer for Box<F> {
    fn featurize(&self, smiles: &str) -> Result<MolGraph, FeaturizationFailure> {
        (**self).featurize(smiles)
    }
}

impl<F: Featurizer + ?Sized> Featurizer for &F {
    fn featurize(&self, smiles: &str) -> Result<MolGraph, FeaturizationFailure> {
        (**self).featurize(smiles)
    }
}

/// The built-in featurizer, using this crate's SMILES parser and ring
/// perception.
#[derive(Clone, Copy, Debug, Default)]
pub struct SmilesFeaturizer;

impl Featurizer for SmilesFeaturizer {
    fn featurize(&self, smiles: &str) -> Result<MolGraph, FeaturizationFailure> {
        let mol = Molecule::parse(smiles)?;
        featurize_molecule(smiles, &mol)
    }
}

/// Build the graph for an already parsed `mol`. `smiles` is only recorded on
/// the result.
pub fn featurize_molecule(
    smiles: &str,
    mol: &Molecule,
) -> Result<MolGraph, FeaturizationFailure> {
    if mol.atom_count() == 0 {
        return Err(SmilesError::Empty.into());
    }
    let rings = RingInfo::perceive(mol);

    let atoms = mol
        .atoms()
        .enumerate()
        .map(|(i, atom)| -> Result<AtomFeatures, FeaturizationFailure> {
            let num_hs =
                mol.hydrogens(i).ok_or_else(|| FeaturizationFailure::Valence {
                    atom: i,
                    symbol: atom.symbol().to_owned(),
                    valence: mol.explicit_valence(i),
                })?;
            Ok(AtomFeatures {
                atomic_number: atom.atomic_number,
                aromatic: atom.aromatic,
                degree: mol.degree(i),
                formal_charge: atom.charge,
                num_hs,
                chirality: atom.chiral.clone(),
                isotope: atom.isotope,
                in_ring: rings.atom_in_ring(i),
                ring_count: rings.atom_rings[i].len(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut edge_index = Vec::with_capacity(2 * mol.bond_count());
    let mut edges = Vec::with_capacity(2 * mol.bond_count());
    for (i, bond) in mol.bonds().enumerate() {
        let features = BondFeatures {
            order: bond.order,
            aromatic: bond.order == BondOrder::Aromatic,
            in_ring: rings.bond_in_ring[i],
        };
        edge_index.push([bond.atom1, bond.atom2]);
        edge_index.push([bond.atom2, bond.atom1]);
        edges.push(features.clone());
        edges.push(features);
    }

    Ok(MolGraph {
        smiles: smiles.to_owned(),
        atoms,
        edge_index,
        edges,
        circle_index: rings.rings,
        y: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn featurize(s: &str) -> Result<MolGraph, FeaturizationFailure> {
        SmilesFeaturizer.featurize(s)
    }

    #[test]
    fn ethanol() {
        let got = featurize("CCO").unwrap();
        assert_eq!(got.num_nodes(), 3);
        assert_eq!(got.num_edges(), 4);
        assert_eq!(got.edge_index, vec![[0, 1], [1, 0], [1, 2], [2, 1]]);
        assert_eq!(got.num_rings(), 0);
        let hs: Vec<_> = got.atoms.iter().map(|a| a.num_hs).collect();
        assert_eq!(hs, vec![3, 2, 1]);
        assert!(got.y.is_empty());
        assert_eq!(got.smiles, "CCO");
    }

    #[test]
    fn benzene() {
        let got = featurize("c1ccccc1").unwrap();
        assert_eq!(got.circle_index, vec![vec![0, 1, 2, 3, 4, 5]]);
        assert!(got.atoms.iter().all(|a| a.aromatic && a.num_hs == 1));
        assert!(got.atoms.iter().all(|a| a.in_ring && a.ring_count == 1));
        assert!(got.edges.iter().all(|e| e.aromatic && e.in_ring));
    }

    #[test]
    fn cyclopropanone() {
        let got = featurize("O=C1CC1").unwrap();
        assert_eq!(got.num_rings(), 1);
        assert_eq!(got.circle_index[0].len(), 3);
        assert!(!got.atoms[0].in_ring);
        assert_eq!(got.edges[0].order, BondOrder::Double);
        assert!(!got.edges[0].in_ring);
    }

    #[test]
    fn charged() {
        let got = featurize("[NH4+]").unwrap();
        assert_eq!(got.atoms[0].formal_charge, 1);
        assert_eq!(got.atoms[0].num_hs, 4);
        assert_eq!(got.num_edges(), 0);
    }

    #[test]
    fn failures() {
        assert!(matches!(
            featurize("invalid!!"),
            Err(FeaturizationFailure::Parse(_))
        ));
        assert!(matches!(
            featurize("[CH99999999999999999999999999]"),
            Err(FeaturizationFailure::Parse(SmilesError::InvalidBracket { .. }))
        ));
        assert_eq!(
            featurize("CC(C)(C)(C)C"),
            Err(FeaturizationFailure::Valence {
                atom: 1,
                symbol: "C".to_owned(),
                valence: 5,
            })
        );
    }

    #[test]
    fn deterministic() {
        let s = "CC1=CC2=C(C=C1)N=C(N2)C1CC1";
        assert_eq!(featurize(s).unwrap(), featurize(s).unwrap());
    }
}
