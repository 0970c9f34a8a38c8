//! Decision-search states over collated matches.

use crate::types::matching::{CollatedMatch, MatchId};
use crate::types::vertex::branch_paths_overlap;

/// One state of the match-selection search: the matches chosen so far and
/// the matches still undecided.
///
/// Immutable value type: [`QuantumCollatedMatchList::choose_match`] and
/// [`QuantumCollatedMatchList::discard_match`] always return a new state.
/// Chosen and potential are disjoint at all times; a match removed from
/// potential never reappears, and matches invalidated by a choice are
/// removed atomically with that choice.
#[derive(Debug, Clone)]
pub struct QuantumCollatedMatchList {
    chosen: Vec<CollatedMatch>,
    potential: Vec<CollatedMatch>,
}

/// Hashable identity of a state: the chosen and potential match-id sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    chosen: Vec<MatchId>,
    potential: Vec<MatchId>,
}

impl QuantumCollatedMatchList {
    /// The initial state: nothing chosen, everything potential.
    pub fn new(potential: Vec<CollatedMatch>) -> Self {
        Self {
            chosen: Vec::new(),
            potential,
        }
    }

    /// The committed matches.
    pub fn chosen(&self) -> &[CollatedMatch] {
        &self.chosen
    }

    /// The still-undecided matches.
    pub fn potential(&self) -> &[CollatedMatch] {
        &self.potential
    }

    /// Whether the state is fully determined (goal test).
    pub fn is_determined(&self) -> bool {
        self.potential.is_empty()
    }

    /// Chosen plus potential: the matches not yet lost.
    pub fn total_size(&self) -> usize {
        self.chosen.len() + self.potential.len()
    }

    /// Commit the potential match with the given id, atomically removing
    /// every potential match it invalidates.
    ///
    /// A potential match is invalidated by the choice when it:
    /// 1. shares the chosen match's collation-graph target node, or
    /// 2. shares the chosen match's witness-source vertex, or
    /// 3. ranks lower in the collation graph while its witness branch path
    ///    overlaps the chosen match's (it would force the witness backward
    ///    at an already-fixed position), or
    /// 4. ranks lower on the witness side than the chosen match.
    ///
    /// Together these enforce monotonicity: once the witness is matched at
    /// graph rank R, no earlier-ranked potential match for that witness or
    /// that target node remains viable.
    pub fn choose_match(&self, id: MatchId) -> Self {
        let Some(position) = self.potential.iter().position(|m| m.id == id) else {
            return self.clone();
        };
        let picked = self.potential[position].clone();
        let mut chosen = self.chosen.clone();
        let potential = self
            .potential
            .iter()
            .filter(|p| p.id != id && !Self::invalidated_by(&picked, p))
            .cloned()
            .collect();
        chosen.push(picked);
        Self { chosen, potential }
    }

    /// Drop the potential match with the given id. No cascading
    /// invalidation.
    pub fn discard_match(&self, id: MatchId) -> Self {
        Self {
            chosen: self.chosen.clone(),
            potential: self
                .potential
                .iter()
                .filter(|m| m.id != id)
                .cloned()
                .collect(),
        }
    }

    fn invalidated_by(picked: &CollatedMatch, other: &CollatedMatch) -> bool {
        other.node == picked.node
            || other.vertex == picked.vertex
            || (other.node_rank < picked.node_rank
                && branch_paths_overlap(&other.witness_branch_path, &picked.witness_branch_path))
            || other.witness_rank < picked.witness_rank
    }

    /// The hashable identity of this state.
    pub fn key(&self) -> StateKey {
        let mut chosen: Vec<MatchId> = self.chosen.iter().map(|m| m.id).collect();
        let mut potential: Vec<MatchId> = self.potential.iter().map(|m| m.id).collect();
        chosen.sort();
        potential.sort();
        StateKey { chosen, potential }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::collation::NodeId;
    use crate::types::vertex::VertexId;

    pub(crate) fn cm(
        id: u32,
        node: u32,
        node_rank: u32,
        vertex: u32,
        witness_rank: u32,
        branch_path: &[u32],
    ) -> CollatedMatch {
        CollatedMatch {
            id: MatchId::new(id),
            node: NodeId::new(node),
            node_rank,
            vertex: VertexId::new(vertex),
            witness_rank,
            witness_branch_path: branch_path.to_vec(),
        }
    }

    #[test]
    fn test_choose_moves_match() {
        let state = QuantumCollatedMatchList::new(vec![cm(0, 2, 1, 2, 1, &[0])]);
        let next = state.choose_match(MatchId::new(0));
        assert_eq!(next.chosen().len(), 1);
        assert!(next.is_determined());
        // Original state untouched.
        assert_eq!(state.chosen().len(), 0);
        assert_eq!(state.potential().len(), 1);
    }

    #[test]
    fn test_choose_invalidates_same_node() {
        let state = QuantumCollatedMatchList::new(vec![
            cm(0, 2, 1, 2, 1, &[0]),
            cm(1, 2, 1, 3, 2, &[0]),
        ]);
        let next = state.choose_match(MatchId::new(0));
        assert!(next.is_determined());
        assert_eq!(next.chosen().len(), 1);
    }

    #[test]
    fn test_choose_invalidates_same_vertex() {
        let state = QuantumCollatedMatchList::new(vec![
            cm(0, 2, 1, 2, 1, &[0]),
            cm(1, 3, 2, 2, 1, &[0]),
        ]);
        let next = state.choose_match(MatchId::new(0));
        assert!(next.is_determined());
    }

    #[test]
    fn test_choose_invalidates_lower_witness_rank() {
        let state = QuantumCollatedMatchList::new(vec![
            cm(0, 2, 1, 2, 1, &[0]),
            cm(1, 3, 2, 3, 2, &[0]),
        ]);
        // Choosing the later match kills the earlier one.
        let next = state.choose_match(MatchId::new(1));
        assert!(next.is_determined());
        assert_eq!(next.chosen()[0].id, MatchId::new(1));
    }

    #[test]
    fn test_lower_node_rank_on_sibling_branch_survives() {
        // Same witness rank, lower node rank, non-overlapping branch paths:
        // parallel variant content, both can stand.
        let state = QuantumCollatedMatchList::new(vec![
            cm(0, 4, 3, 2, 2, &[0, 1]),
            cm(1, 3, 2, 3, 2, &[0, 2]),
        ]);
        let next = state.choose_match(MatchId::new(0));
        assert_eq!(next.potential().len(), 1);
        assert_eq!(next.potential()[0].id, MatchId::new(1));
    }

    #[test]
    fn test_lower_node_rank_overlapping_branch_invalidated() {
        let state = QuantumCollatedMatchList::new(vec![
            cm(0, 4, 3, 2, 2, &[0]),
            cm(1, 3, 2, 3, 2, &[0, 1]),
        ]);
        let next = state.choose_match(MatchId::new(0));
        assert!(next.is_determined());
    }

    #[test]
    fn test_discard_removes_exactly_one() {
        let state = QuantumCollatedMatchList::new(vec![
            cm(0, 2, 1, 2, 1, &[0]),
            cm(1, 3, 2, 3, 2, &[0]),
        ]);
        let next = state.discard_match(MatchId::new(0));
        assert_eq!(next.chosen().len(), 0);
        assert_eq!(next.potential().len(), 1);
        assert_eq!(next.potential()[0].id, MatchId::new(1));
    }

    #[test]
    fn test_key_identity() {
        let a = QuantumCollatedMatchList::new(vec![
            cm(0, 2, 1, 2, 1, &[0]),
            cm(1, 3, 2, 3, 2, &[0]),
        ]);
        let via_choose_then = a.choose_match(MatchId::new(1));
        let b = QuantumCollatedMatchList::new(vec![
            cm(1, 3, 2, 3, 2, &[0]),
        ])
        .choose_match(MatchId::new(1));
        assert_eq!(via_choose_then.key(), b.key());
    }
}
