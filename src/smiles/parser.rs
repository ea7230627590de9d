//! Parser for SMILES. Grammar:
//!
//! smiles -> chain ( "." chain )*
//! chain -> atom ( bond? ( atom | ring ) | branch )*
//! branch -> "(" bond? chain ")"
//! ring -> bond? DIGIT | bond? "%" DIGIT DIGIT
//!
//! The tokens are turned directly into atoms and bonds without an
//! intermediate AST. Open branches are kept on a stack of the atoms they hang
//! off of, and open ring closures in a table keyed by their label, so labels
//! can be reused once they are closed.

use std::collections::BTreeMap;

use petgraph::graph::{NodeIndex, UnGraph};

use super::{scanner::Token, Atom, BondOrder, Molecule, SmilesError};

/// an open ring closure: the atom it started on, where it started, and the
/// bond order written with the opening label, if any
type OpenRing = (usize, usize, Option<BondOrder>);

pub(super) struct Parser {
    /// `tokens` represents a single input SMILES string decomposed into a
    /// sequence of tokens tagged with their offset in the input
    tokens: Vec<(usize, Token)>,
    cur: usize,
}

impl Parser {
    pub(super) fn new(tokens: Vec<(usize, Token)>) -> Self {
        Self { tokens, cur: 0 }
    }

    #[inline]
    fn at_end(&self) -> bool {
        self.peek().is_end()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.cur].1
    }

    fn advance(&mut self) -> (usize, Token) {
        let ret = self.tokens[self.cur].clone();
        if !self.at_end() {
            self.cur += 1;
        }
        ret
    }

    pub(super) fn parse(mut self) -> Result<Molecule, SmilesError> {
        if self.at_end() {
            return Err(SmilesError::Empty);
        }
        let mut graph: UnGraph<Atom, BondOrder> = UnGraph::default();
        // the atom the next bond attaches to, None at the start of a chain
        let mut prev: Option<usize> = None;
        let mut pending: Option<(usize, BondOrder)> = None;
        let mut branches: Vec<(usize, usize)> = Vec::new();
        // ordered so that the reported unclosed ring is deterministic
        let mut rings: BTreeMap<usize, OpenRing> = BTreeMap::new();

        loop {
            let (pos, token) = self.advance();
            match token {
                Token::Atom(atom) => {
                    let idx = graph.add_node(atom).index();
                    if let Some(p) = prev {
                        let order = pending.take().map(|(_, o)| o);
                        add_bond(&mut graph, p, idx, order)?;
                    }
                    prev = Some(idx);
                }
                Token::Bond(order) => {
                    if prev.is_none() {
                        return Err(SmilesError::BondWithoutAtom(pos));
                    }
                    if let Some((p, _)) = pending {
                        return Err(SmilesError::DanglingBond(p));
                    }
                    pending = Some((pos, order));
                }
                Token::Ring(label) => {
                    let Some(atom) = prev else {
                        return Err(SmilesError::BondWithoutAtom(pos));
                    };
                    let order = pending.take().map(|(_, o)| o);
                    match rings.remove(&label) {
                        Some((other, _, open_order)) => {
                            let order = match (open_order, order) {
                                (Some(a), Some(b)) if a != b => {
                                    return Err(SmilesError::RingBondConflict {
                                        label,
                                        pos,
                                    })
                                }
                                (a, b) => a.or(b),
                            };
                            if other == atom {
                                return Err(SmilesError::SelfBond { label, pos });
                            }
                            add_bond(&mut graph, other, atom, order)?;
                        }
                        None => {
                            rings.insert(label, (atom, pos, order));
                        }
                    }
                }
                Token::LParen => {
                    let Some(atom) = prev else {
                        return Err(SmilesError::BranchWithoutAtom(pos));
                    };
                    if let Some((p, _)) = pending {
                        return Err(SmilesError::DanglingBond(p));
                    }
                    if matches!(self.peek(), Token::RParen) {
                        return Err(SmilesError::EmptyBranch(pos));
                    }
                    branches.push((atom, pos));
                }
                Token::RParen => {
                    if let Some((p, _)) = pending {
                        return Err(SmilesError::DanglingBond(p));
                    }
                    let Some((atom, _)) = branches.pop() else {
                        return Err(SmilesError::UnbalancedParen(pos));
                    };
                    prev = Some(atom);
                }
                Token::Dot => {
                    if let Some((p, _)) = pending {
                        return Err(SmilesError::DanglingBond(p));
                    }
                    if prev.is_none() {
                        return Err(SmilesError::BondWithoutAtom(pos));
                    }
                    prev = None;
                }
                Token::End => {
                    if let Some((p, _)) = pending {
                        return Err(SmilesError::DanglingBond(p));
                    }
                    if let Some(&(_, p)) = branches.first() {
                        return Err(SmilesError::UnbalancedParen(p));
                    }
                    if let Some((&label, &(_, p, _))) = rings.iter().next() {
                        return Err(SmilesError::UnclosedRing { label, pos: p });
                    }
                    break;
                }
            }
        }
        Ok(Molecule::from_graph(graph))
    }
}

fn add_bond(
    graph: &mut UnGraph<Atom, BondOrder>,
    a: usize,
    b: usize,
    order: Option<BondOrder>,
) -> Result<(), SmilesError> {
    let (atom1, atom2) =
        (NodeIndex::new(a.min(b)), NodeIndex::new(a.max(b)));
    if graph.contains_edge(atom1, atom2) {
        return Err(SmilesError::DuplicateBond(atom1.index(), atom2.index()));
    }
    let aromatic = graph[atom1].aromatic && graph[atom2].aromatic;
    let order = order.unwrap_or(if aromatic {
        BondOrder::Aromatic
    } else {
        BondOrder::Single
    });
    graph.add_edge(atom1, atom2, order);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::smiles::{scanner::scan, Bond};

    use super::*;

    fn bonds(mol: &Molecule) -> Vec<Bond> {
        mol.bonds().collect()
    }

    fn parse(s: &str) -> Result<Molecule, SmilesError> {
        Parser::new(scan(s)?).parse()
    }

    #[test]
    fn parse_branches() {
        // isobutanol
        let got = parse("CC(C)CO").unwrap();
        assert_eq!(got.atom_count(), 5);
        use BondOrder as B;
        let want = vec![
            Bond::new(0, 1, B::Single),
            Bond::new(1, 2, B::Single),
            Bond::new(1, 3, B::Single),
            Bond::new(3, 4, B::Single),
        ];
        assert_eq!(bonds(&got), want);
    }

    #[test]
    fn parse_rings() {
        use BondOrder as B;
        let got = parse("O=C1CC1").unwrap();
        let want = vec![
            Bond::new(0, 1, B::Double),
            Bond::new(1, 2, B::Single),
            Bond::new(2, 3, B::Single),
            Bond::new(1, 3, B::Single),
        ];
        assert_eq!(bonds(&got), want);

        let got = parse("c1ccccc1").unwrap();
        assert_eq!(got.bond_count(), 6);
        assert!(got.bonds().all(|b| b.order == B::Aromatic));

        // the order may be written on either side of the closure
        let got = parse("C=1CCCCC1").unwrap();
        assert_eq!(bonds(&got)[5], Bond::new(0, 5, B::Double));
        let got = parse("C1CCCCC=1").unwrap();
        assert_eq!(bonds(&got)[5], Bond::new(0, 5, B::Double));
    }

    #[test]
    fn reused_ring_label() {
        // biphenyl-like reuse of label 1
        let got = parse("C1CC1C1CC1").unwrap();
        assert_eq!(got.atom_count(), 6);
        assert_eq!(got.bond_count(), 7);
    }

    #[test]
    fn disconnected() {
        let got = parse("[Na+].[Cl-]").unwrap();
        assert_eq!(got.atom_count(), 2);
        assert_eq!(got.bond_count(), 0);
    }

    #[test]
    fn parse_errors() {
        use SmilesError as E;
        assert_eq!(parse(""), Err(E::Empty));
        assert_eq!(parse("=C"), Err(E::BondWithoutAtom(0)));
        assert_eq!(parse("CC="), Err(E::DanglingBond(2)));
        assert_eq!(parse("C(C"), Err(E::UnbalancedParen(1)));
        assert_eq!(parse("CC)C"), Err(E::UnbalancedParen(2)));
        assert_eq!(parse("C()C"), Err(E::EmptyBranch(1)));
        assert_eq!(parse("(C)C"), Err(E::BranchWithoutAtom(0)));
        assert_eq!(parse("C1CC"), Err(E::UnclosedRing { label: 1, pos: 1 }));
        assert_eq!(parse("C11"), Err(E::SelfBond { label: 1, pos: 2 }));
        assert_eq!(parse("C12CC12"), Err(E::DuplicateBond(0, 2)));
        assert_eq!(
            parse("C=1CC#1"),
            Err(E::RingBondConflict { label: 1, pos: 6 })
        );
    }
}
