//! The processed representation of one molecule

use serde::{Deserialize, Serialize};

use crate::smiles::{BondOrder, Chiral};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtomFeatures {
    pub atomic_number: usize,
    pub aromatic: bool,
    pub degree: usize,
    pub formal_charge: isize,
    /// implicit and explicit hydrogens together
    pub num_hs: usize,
    pub chirality: Chiral,
    pub isotope: Option<usize>,
    pub in_ring: bool,
    /// number of perceived rings the atom belongs to
    pub ring_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BondFeatures {
    pub order: BondOrder,
    pub aromatic: bool,
    pub in_ring: bool,
}

/// A molecular graph with its ring annotations and target label.
///
/// Every bond appears twice in `edge_index`, once in each direction, and
/// `edges[i]` describes `edge_index[i]`. `circle_index` holds one entry per
/// ring listing its atoms in ring order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MolGraph {
    pub smiles: String,
    pub atoms: Vec<AtomFeatures>,
    pub edge_index: Vec<[usize; 2]>,
    pub edges: Vec<BondFeatures>,
    pub circle_index: Vec<Vec<usize>>,
    pub y: Vec<f64>,
}

impl MolGraph {
    pub fn num_nodes(&self) -> usize {
        self.atoms.len()
    }

    /// number of directed edges, twice the number of bonds
    pub fn num_edges(&self) -> usize {
        self.edge_index.len()
    }

    pub fn num_rings(&self) -> usize {
        self.circle_index.len()
    }

    /// the same graph carrying `label` as its target
    pub fn with_label(mut self, label: Vec<f64>) -> Self {
        self.y = label;
        self
    }
}
