//! Candidate matches between witnesses.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::types::collation::NodeId;
use crate::types::sigil::Sigil;
use crate::types::vertex::{BranchPath, VertexId};

/// Dense identifier of a match within one match list.
///
/// Assigned in discovery order, which makes it the deterministic final
/// tie-break for every ordering the selector uses.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchId(u32);

impl MatchId {
    /// Create a `MatchId` from a raw list index.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw list index.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// One witness's side of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSide {
    /// The matched vertex in that witness's graph.
    pub vertex: VertexId,
    /// That witness's rank at the vertex, recorded at discovery time.
    pub rank: u32,
    /// The vertex's branch path.
    pub branch_path: BranchPath,
}

/// An unordered association between one token vertex per witness (2..N)
/// judged equivalent.
///
/// Matches are pure data: they hold vertex ids into the witness graphs,
/// never the vertices themselves. Equality is by participating vertex set —
/// the per-side ranks are bookkeeping, not identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    sides: BTreeMap<Sigil, MatchSide>,
}

impl Match {
    /// Create a match between two witnesses.
    pub fn between(sigil_a: Sigil, side_a: MatchSide, sigil_b: Sigil, side_b: MatchSide) -> Self {
        let mut sides = BTreeMap::new();
        sides.insert(sigil_a, side_a);
        sides.insert(sigil_b, side_b);
        Self { sides }
    }

    /// Create a match from an arbitrary set of sides (2..N witnesses).
    pub fn from_sides(sides: BTreeMap<Sigil, MatchSide>) -> Self {
        Self { sides }
    }

    /// The participating witness sigils, in sigil order.
    pub fn sigils(&self) -> impl Iterator<Item = &Sigil> {
        self.sides.keys()
    }

    /// All sides, in sigil order.
    pub fn sides(&self) -> impl Iterator<Item = (&Sigil, &MatchSide)> {
        self.sides.iter()
    }

    /// The side for a given witness, if it participates.
    pub fn side(&self, sigil: &Sigil) -> Option<&MatchSide> {
        self.sides.get(sigil)
    }

    /// Whether the given witness participates in this match.
    pub fn involves(&self, sigil: &Sigil) -> bool {
        self.sides.contains_key(sigil)
    }

    /// The lowest rank among all participating witnesses except `sigil`.
    ///
    /// Used as the deterministic tie-break when sorting a witness's match
    /// view: among matches at the same own-witness rank, the one anchored
    /// earliest in any other witness sorts first.
    pub fn lowest_rank_for_witnesses_other_than(&self, sigil: &Sigil) -> Option<u32> {
        self.sides
            .iter()
            .filter(|(s, _)| *s != sigil)
            .map(|(_, side)| side.rank)
            .min()
    }

    /// The participating (sigil, vertex) set — the identity of this match.
    pub fn vertex_set(&self) -> BTreeSet<(&Sigil, VertexId)> {
        self.sides.iter().map(|(s, side)| (s, side.vertex)).collect()
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.vertex_set() == other.vertex_set()
    }
}

impl Eq for Match {}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M[")?;
        for (i, (sigil, side)) in self.sides.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}#{}", sigil, side.vertex, side.rank)?;
        }
        write!(f, "]")
    }
}

/// A potential match projected onto the growing collation graph, for the
/// witness currently being merged.
///
/// One side is a node already in the collation graph (with its rank under
/// the base ranking computed before the merge); the other side is a vertex
/// of the in-merge witness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollatedMatch {
    /// Identity within this merge's collated-match list (discovery order).
    pub id: MatchId,
    /// The target node in the collation graph.
    pub node: NodeId,
    /// The node's rank under the base ranking.
    pub node_rank: u32,
    /// The in-merge witness's vertex.
    pub vertex: VertexId,
    /// The witness's rank at that vertex.
    pub witness_rank: u32,
    /// The vertex's branch path within the witness.
    pub witness_branch_path: BranchPath,
}

impl fmt::Display for CollatedMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CM[{}@r{} <- {}#{}]",
            self.node, self.node_rank, self.vertex, self.witness_rank
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(vertex: u32, rank: u32) -> MatchSide {
        MatchSide {
            vertex: VertexId::new(vertex),
            rank,
            branch_path: vec![0],
        }
    }

    #[test]
    fn test_match_is_unordered() {
        let m1 = Match::between(Sigil::from("A"), side(3, 1), Sigil::from("B"), side(7, 2));
        let m2 = Match::between(Sigil::from("B"), side(7, 2), Sigil::from("A"), side(3, 1));
        assert_eq!(m1, m2);
    }

    #[test]
    fn test_equality_ignores_ranks() {
        let m1 = Match::between(Sigil::from("A"), side(3, 1), Sigil::from("B"), side(7, 2));
        let m2 = Match::between(Sigil::from("A"), side(3, 9), Sigil::from("B"), side(7, 9));
        assert_eq!(m1, m2);
    }

    #[test]
    fn test_lowest_rank_for_witnesses_other_than() {
        let sides = BTreeMap::from([
            (Sigil::from("A"), side(0, 1)),
            (Sigil::from("B"), side(1, 2)),
            (Sigil::from("C"), side(2, 3)),
            (Sigil::from("D"), side(3, 4)),
        ]);
        let m = Match::from_sides(sides);
        assert_eq!(
            m.lowest_rank_for_witnesses_other_than(&Sigil::from("A")),
            Some(2)
        );
        assert_eq!(
            m.lowest_rank_for_witnesses_other_than(&Sigil::from("D")),
            Some(1)
        );
    }
}
