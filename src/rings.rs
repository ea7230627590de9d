//! Ring perception.
//!
//! For every bond the smallest ring through it is found with a breadth-first
//! search between its endpoints that is not allowed to use the bond itself.
//! The candidates are sorted by size and kept greedily as long as they are
//! linearly independent over GF(2), treating each ring as the set of its
//! bonds, until the cyclomatic number of the molecule is reached. Fundamental
//! cycles of a spanning forest are used as a fallback for the rare graphs
//! where the per-bond rings don't span the whole cycle space.

use petgraph::{
    algo::connected_components,
    graph::{EdgeIndex, NodeIndex, UnGraph},
    visit::{Bfs, EdgeFiltered, EdgeRef},
};

use crate::smiles::{Atom, BondOrder, Molecule};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RingInfo {
    /// atom indices of each ring in traversal order, smallest rings first
    pub rings: Vec<Vec<usize>>,
    /// bond indices of each ring
    pub ring_bonds: Vec<Vec<usize>>,
    /// for every atom, the indices into `rings` of the rings containing it
    pub atom_rings: Vec<Vec<usize>>,
    pub bond_in_ring: Vec<bool>,
}

type AtomGraph = UnGraph<Atom, BondOrder>;

/// a ring or path as its atoms and the bonds between them
type Walk = (Vec<usize>, Vec<usize>);

/// a set of bonds as a bit vector, for the independence test
#[derive(Clone, Debug, PartialEq)]
struct BondSet(Vec<u64>);

impl BondSet {
    fn new(nbonds: usize, bonds: &[usize]) -> Self {
        let mut bits = vec![0; nbonds.div_ceil(64)];
        for &b in bonds {
            bits[b / 64] |= 1 << (b % 64);
        }
        Self(bits)
    }

    fn lowest(&self) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * 64 + w.trailing_zeros() as usize)
    }

    fn xor(&mut self, other: &BondSet) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a ^= b;
        }
    }
}

/// Row-reduced basis of the cycle space found so far. Each entry is stored
/// under its lowest set bit.
struct Basis(Vec<Option<BondSet>>);

impl Basis {
    fn new(nbonds: usize) -> Self {
        Self(vec![None; nbonds])
    }

    /// add `set` to the basis if it is independent of it, returning whether
    /// it was added
    fn insert(&mut self, mut set: BondSet) -> bool {
        while let Some(pivot) = set.lowest() {
            match &self.0[pivot] {
                Some(row) => set.xor(row),
                None => {
                    self.0[pivot] = Some(set);
                    return true;
                }
            }
        }
        false
    }
}

/// shortest path of atoms from `from` to `to` that doesn't use bond
/// `excluded`, together with the bonds along it
fn shortest_path(
    graph: &AtomGraph,
    from: NodeIndex,
    to: NodeIndex,
    excluded: EdgeIndex,
) -> Option<Walk> {
    let g = EdgeFiltered::from_fn(graph, |e| e.id() != excluded);
    // the first dequeued atom to reach each atom is its parent, the same
    // order the search itself discovers them in
    let mut parent: Vec<Option<(NodeIndex, EdgeIndex)>> =
        vec![None; graph.node_count()];
    let mut bfs = Bfs::new(&g, from);
    while let Some(atom) = bfs.next(&g) {
        if atom == to {
            break;
        }
        for e in graph.edges(atom).filter(|e| e.id() != excluded) {
            let next = e.target();
            if next != from && parent[next.index()].is_none() {
                parent[next.index()] = Some((atom, e.id()));
            }
        }
    }
    if parent[to.index()].is_none() {
        return None;
    }
    let mut atoms = vec![to.index()];
    let mut bonds = Vec::new();
    let mut cur = to;
    while let Some((p, b)) = parent[cur.index()] {
        atoms.push(p.index());
        bonds.push(b.index());
        cur = p;
    }
    atoms.reverse();
    bonds.reverse();
    Some((atoms, bonds))
}

/// fundamental cycles of a breadth-first spanning forest, one per bond that
/// is not part of the forest
fn fundamental_cycles(graph: &AtomGraph) -> Vec<Walk> {
    let n = graph.node_count();
    let mut parent: Vec<Option<(usize, usize)>> = vec![None; n];
    let mut depth = vec![0; n];
    let mut seen = vec![false; n];
    let mut tree_bond = vec![false; graph.edge_count()];
    for root in graph.node_indices() {
        if seen[root.index()] {
            continue;
        }
        seen[root.index()] = true;
        let mut bfs = Bfs::new(graph, root);
        while let Some(atom) = bfs.next(graph) {
            for e in graph.edges(atom) {
                let next = e.target().index();
                if seen[next] {
                    continue;
                }
                seen[next] = true;
                tree_bond[e.id().index()] = true;
                parent[next] = Some((atom.index(), e.id().index()));
                depth[next] = depth[atom.index()] + 1;
            }
        }
    }

    let mut ret = Vec::new();
    for bond in graph.edge_references() {
        let i = bond.id().index();
        if tree_bond[i] {
            continue;
        }
        // walk both endpoints up to their common ancestor
        let (mut a, mut b) = (bond.source().index(), bond.target().index());
        let (mut up_a, mut up_b) = (vec![a], vec![b]);
        let mut bonds = vec![i];
        while a != b {
            if depth[a] >= depth[b] {
                let Some((p, pb)) = parent[a] else { break };
                bonds.push(pb);
                a = p;
                up_a.push(a);
            } else {
                let Some((p, pb)) = parent[b] else { break };
                bonds.push(pb);
                b = p;
                up_b.push(b);
            }
        }
        // the common ancestor ends both walks
        up_b.pop();
        up_a.extend(up_b.into_iter().rev());
        ret.push((up_a, bonds));
    }
    ret
}

impl RingInfo {
    pub fn perceive(mol: &Molecule) -> Self {
        let graph = mol.graph();
        let natoms = graph.node_count();
        let nbonds = graph.edge_count();
        let mut info = Self {
            rings: Vec::new(),
            ring_bonds: Vec::new(),
            atom_rings: vec![Vec::new(); natoms],
            bond_in_ring: vec![false; nbonds],
        };

        let target =
            (nbonds + connected_components(graph)).saturating_sub(natoms);
        if target == 0 {
            return info;
        }

        let mut candidates = Vec::new();
        for bond in graph.edge_references() {
            let (atom1, atom2) = (bond.source(), bond.target());
            // walk back from atom2 so the ring reads atom1, atom2, ...
            if let Some((mut atoms, mut bonds)) =
                shortest_path(graph, atom2, atom1, bond.id())
            {
                info.bond_in_ring[bond.id().index()] = true;
                atoms.pop();
                atoms.insert(0, atom1.index());
                bonds.insert(0, bond.id().index());
                candidates.push((atoms, bonds));
            }
        }
        // stable, so equal sizes keep their discovery order
        candidates.sort_by_key(|(atoms, _)| atoms.len());

        let mut basis = Basis::new(nbonds);
        let mut accept = |info: &mut Self, atoms: Vec<usize>, bonds: Vec<usize>| {
            if basis.insert(BondSet::new(nbonds, &bonds)) {
                info.rings.push(atoms);
                info.ring_bonds.push(bonds);
            }
        };
        for (atoms, bonds) in candidates {
            if info.rings.len() == target {
                break;
            }
            accept(&mut info, atoms, bonds);
        }
        if info.rings.len() < target {
            let mut fallback = fundamental_cycles(graph);
            fallback.sort_by_key(|(atoms, _)| atoms.len());
            for (atoms, bonds) in fallback {
                if info.rings.len() == target {
                    break;
                }
                accept(&mut info, atoms, bonds);
            }
        }

        for (r, atoms) in info.rings.iter().enumerate() {
            for &a in atoms {
                info.atom_rings[a].push(r);
            }
        }
        info
    }

    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    pub fn atom_in_ring(&self, atom: usize) -> bool {
        !self.atom_rings[atom].is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perceive(s: &str) -> RingInfo {
        RingInfo::perceive(&Molecule::parse(s).unwrap())
    }

    #[test]
    fn acyclic() {
        let got = perceive("CC(C)CO");
        assert_eq!(got.num_rings(), 0);
        assert!(got.bond_in_ring.iter().all(|b| !b));
    }

    #[test]
    fn benzene() {
        let got = perceive("c1ccccc1");
        assert_eq!(got.rings, vec![vec![0, 1, 2, 3, 4, 5]]);
        assert!(got.bond_in_ring.iter().all(|&b| b));
    }

    #[test]
    fn cyclopropanone() {
        let got = perceive("O=C1CC1");
        assert_eq!(got.num_rings(), 1);
        assert_eq!(got.rings[0].len(), 3);
        assert!(!got.atom_in_ring(0));
        assert!(!got.bond_in_ring[0]);
        assert!((1..4).all(|a| got.atom_in_ring(a)));
    }

    #[test]
    fn naphthalene() {
        let got = perceive("c1ccc2ccccc2c1");
        assert_eq!(got.num_rings(), 2);
        assert!(got.rings.iter().all(|r| r.len() == 6));
        // the fusion atoms are in both rings
        let shared: Vec<_> = (0..10).filter(|&a| got.atom_rings[a].len() == 2).collect();
        assert_eq!(shared, vec![3, 8]);
    }

    #[test]
    fn spiro() {
        // methylspiro[2.2]pentane
        let got = perceive("CC1CC12CC2");
        assert_eq!(got.num_rings(), 2);
        assert_eq!(got.atom_rings[3], vec![0, 1]);
        assert!(!got.atom_in_ring(0));
    }

    #[test]
    fn bicyclobutane() {
        let got = perceive("C12CC1C2");
        assert_eq!(got.num_rings(), 2);
        // the bridgehead bond is shared
        assert_eq!(got.ring_bonds.iter().filter(|r| r.contains(&2)).count(), 2);
    }

    #[test]
    fn cubane() {
        let got = perceive("C12C3C4C1C5C2C3C45");
        assert_eq!(got.num_rings(), 5);
        assert!(got.rings.iter().all(|r| r.len() == 4));
    }

    #[test]
    fn disconnected_rings() {
        let got = perceive("C1CC1.C1CCC1");
        assert_eq!(got.num_rings(), 2);
        assert_eq!(got.rings[0].len(), 3);
        assert_eq!(got.rings[1].len(), 4);
    }

    #[test]
    fn fundamental_cycle_walk() {
        let mol = Molecule::parse("C1CCCCC1").unwrap();
        let cycles = fundamental_cycles(mol.graph());
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].0.len(), 6);
        assert_eq!(cycles[0].1.len(), 6);
    }
}
