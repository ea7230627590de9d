//! SMILES parser

use petgraph::{
    graph::{NodeIndex, UnGraph},
    visit::EdgeRef,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::{element::default_valences, parser::Parser, scanner::scan};

pub(crate) mod element;
mod parser;
mod scanner;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chiral {
    #[default]
    None,
    /// `@`
    Anticlockwise,
    /// `@@`
    Clockwise,
    /// the extended forms like `@TH1` or `@OH12`, kept verbatim
    Other(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    /// 0 for the `*` wildcard
    pub atomic_number: usize,
    pub aromatic: bool,
    pub isotope: Option<usize>,
    pub charge: isize,
    /// hydrogen count written in a bracket atom. `None` for atoms outside of
    /// brackets, whose hydrogens are implicit
    pub n_hydrogens: Option<usize>,
    pub chiral: Chiral,
    pub class: Option<usize>,
}

impl Atom {
    /// an atom from the organic subset, written without brackets
    pub(crate) fn organic(atomic_number: usize, aromatic: bool) -> Self {
        Self {
            atomic_number,
            aromatic,
            isotope: None,
            charge: 0,
            n_hydrogens: None,
            chiral: Chiral::None,
            class: None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        element::symbol(self.atomic_number)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    Up,
    Down,
}

impl BondOrder {
    /// contribution of the bond to each endpoint's valence. aromatic bonds
    /// count as one, the missing electrons are accounted for per atom
    pub fn valence(&self) -> usize {
        match self {
            BondOrder::Single
            | BondOrder::Aromatic
            | BondOrder::Up
            | BondOrder::Down => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

/// Bonds are stored with `atom1 < atom2`
#[derive(Clone, Debug, PartialEq)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Self {
            atom1,
            atom2,
            order,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    Empty,
    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("unknown element '{symbol}' at {pos}")]
    UnknownElement { symbol: String, pos: usize },
    #[error("unterminated bracket atom starting at {0}")]
    UnterminatedBracket(usize),
    #[error("invalid bracket atom at {pos}: {reason}")]
    InvalidBracket { pos: usize, reason: String },
    #[error("unbalanced parenthesis at {0}")]
    UnbalancedParen(usize),
    #[error("empty branch at {0}")]
    EmptyBranch(usize),
    #[error("branch at {0} has no preceding atom")]
    BranchWithoutAtom(usize),
    #[error("bond at {0} has no preceding atom")]
    BondWithoutAtom(usize),
    #[error("bond at {0} is not followed by an atom")]
    DanglingBond(usize),
    #[error("ring closure {label} opened at {pos} is never closed")]
    UnclosedRing { label: usize, pos: usize },
    #[error("ring closure {label} at {pos} bonds an atom to itself")]
    SelfBond { label: usize, pos: usize },
    #[error("duplicate bond between atoms {0} and {1}")]
    DuplicateBond(usize, usize),
    #[error("conflicting bond orders for ring closure {label} at {pos}")]
    RingBondConflict { label: usize, pos: usize },
}

/// Atoms are the nodes and bond orders the edges of an undirected graph.
/// Node and edge indices follow the order atoms and bonds appear in the
/// SMILES, and every edge is stored from its lower to its higher atom.
#[derive(Clone, Debug)]
pub struct Molecule {
    graph: UnGraph<Atom, BondOrder>,
}

impl Molecule {
    pub fn parse(s: &str) -> Result<Self, SmilesError> {
        let tokens = scan(s)?;
        Parser::new(tokens).parse()
    }

    pub(crate) fn from_graph(graph: UnGraph<Atom, BondOrder>) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &UnGraph<Atom, BondOrder> {
        &self.graph
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn atom(&self, atom: usize) -> &Atom {
        &self.graph[NodeIndex::new(atom)]
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.graph.node_weights()
    }

    /// bonds in input order
    pub fn bonds(&self) -> impl Iterator<Item = Bond> + '_ {
        self.graph.edge_references().map(|e| {
            Bond::new(e.source().index(), e.target().index(), *e.weight())
        })
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.graph.edges(NodeIndex::new(atom)).count()
    }

    /// sum of the valence contributions of every bond to `atom`
    pub fn explicit_valence(&self, atom: usize) -> usize {
        self.graph
            .edges(NodeIndex::new(atom))
            .map(|e| e.weight().valence())
            .sum()
    }

    /// Total number of hydrogens on `atom`. Bracket atoms carry their own
    /// count. Atoms from the organic subset are filled up to the lowest
    /// default valence that fits, with aromatic atoms giving one electron to
    /// the ring. `None` means no default valence fits.
    pub fn hydrogens(&self, atom: usize) -> Option<usize> {
        let a = self.atom(atom);
        if let Some(h) = a.n_hydrogens {
            return Some(h);
        }
        let allowed = default_valences(a.atomic_number);
        let Some(&lowest) = allowed.first() else {
            // the wildcard
            return Some(0);
        };
        let explicit = self.explicit_valence(atom);
        if a.aromatic {
            allowed
                .iter()
                .any(|&v| v >= explicit)
                .then(|| lowest.saturating_sub(explicit + 1))
        } else {
            allowed.iter().find(|&&v| v >= explicit).map(|v| v - explicit)
        }
    }
}

impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        self.atoms().eq(other.atoms()) && self.bonds().eq(other.bonds())
    }
}
