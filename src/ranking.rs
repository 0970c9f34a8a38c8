//! Topological ranking of witness and collation graphs.
//!
//! A rank is a topological generation number: roots sit at rank 0 and every
//! other node at `1 + max(rank of predecessors)` — the longest-path depth.
//! Ranks are the ordering oracle for match discovery, the selector's
//! invalidation rule, and the tie-breaks that keep collation deterministic.

use std::collections::{BTreeMap, VecDeque};

use crate::error::CollateError;
use crate::types::collation::{CollationGraph, NodeId};
use crate::types::vertex::VertexId;
use crate::types::witness::VariantWitnessGraph;

/// Rank assignment over one graph: a total function from id to rank, plus
/// the inverse grouping for O(1) "same generation" queries.
#[derive(Debug, Clone)]
pub struct Ranking<I> {
    by_id: BTreeMap<I, u32>,
    by_rank: BTreeMap<u32, Vec<I>>,
}

impl<I: Copy + Ord> Ranking<I> {
    /// The rank of an id.
    ///
    /// Ranking is total over the graph it was computed from, so a missing
    /// id means the caller mixed ids across graphs.
    pub fn apply(&self, id: I) -> u32 {
        self.by_id
            .get(&id)
            .copied()
            .expect("ranking is total over the ranked graph")
    }

    /// All ids at the given rank, in id order.
    pub fn group(&self, rank: u32) -> &[I] {
        self.by_rank.get(&rank).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The highest assigned rank.
    pub fn max_rank(&self) -> u32 {
        self.by_rank.keys().next_back().copied().unwrap_or(0)
    }

    /// Deferred-worklist rank computation.
    ///
    /// Ids may arrive in any order: an id whose predecessors are not all
    /// ranked yet is requeued. A full cycle of deferrals without progress
    /// means the input has a cycle, which violates the acyclicity contract.
    fn compute<P>(ids: Vec<I>, predecessors: P, context: &str) -> Result<Self, CollateError>
    where
        P: Fn(I) -> Vec<I>,
    {
        let mut by_id: BTreeMap<I, u32> = BTreeMap::new();
        let mut queue: VecDeque<I> = ids.into();
        let mut deferred_in_row = 0usize;

        while let Some(id) = queue.pop_front() {
            let preds = predecessors(id);
            let rank = if preds.is_empty() {
                Some(0)
            } else {
                preds
                    .iter()
                    .map(|p| by_id.get(p).copied())
                    .collect::<Option<Vec<u32>>>()
                    .and_then(|ranks| ranks.into_iter().max())
                    .map(|max| max + 1)
            };
            match rank {
                Some(r) => {
                    by_id.insert(id, r);
                    deferred_in_row = 0;
                }
                None => {
                    deferred_in_row += 1;
                    if deferred_in_row > queue.len() {
                        return Err(CollateError::CycleDetected {
                            context: context.to_string(),
                        });
                    }
                    queue.push_back(id);
                }
            }
        }

        let mut by_rank: BTreeMap<u32, Vec<I>> = BTreeMap::new();
        for (id, rank) in &by_id {
            by_rank.entry(*rank).or_default().push(*id);
        }
        Ok(Self { by_id, by_rank })
    }
}

impl Ranking<VertexId> {
    /// Rank a witness graph. The start sentinel gets rank 0.
    pub fn of_witness(graph: &VariantWitnessGraph) -> Result<Self, CollateError> {
        Self::compute(
            graph.vertex_ids().collect(),
            |id| graph.vertex(id).incoming().collect(),
            &format!("witness graph {}", graph.sigil()),
        )
    }
}

impl Ranking<NodeId> {
    /// Rank the collation graph. The root node gets rank 0.
    pub fn of_collation(graph: &CollationGraph) -> Result<Self, CollateError> {
        Self::compute(
            graph.node_ids().collect(),
            |id| graph.in_neighbors(id).collect(),
            "collation graph",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sigil::Sigil;
    use crate::types::token::Token;

    fn branching_witness() -> VariantWitnessGraph {
        // start -> a -> b -> d -> end
        //            \-> c --^
        let sigil = Sigil::from("A");
        let mut g = VariantWitnessGraph::new(sigil.clone());
        let mk = |s: &Sigil, raw: &str, i: u32| Token::new(s.clone(), raw, i, vec![]);
        let a = g.add_token_vertex(mk(&sigil, "a ", 0), vec![0]);
        let b = g.add_token_vertex(mk(&sigil, "b ", 1), vec![0, 1]);
        let c = g.add_token_vertex(mk(&sigil, "c ", 2), vec![0, 2]);
        let d = g.add_token_vertex(mk(&sigil, "d", 3), vec![0]);
        g.add_edge(g.start(), a);
        g.add_edge(a, b);
        g.add_edge(a, c);
        g.add_edge(b, d);
        g.add_edge(c, d);
        g.add_edge(d, g.end());
        g
    }

    #[test]
    fn test_ranks_longest_path() {
        let g = branching_witness();
        let ranking = Ranking::of_witness(&g).unwrap();
        assert_eq!(ranking.apply(g.start()), 0);
        assert_eq!(ranking.apply(VertexId::new(2)), 1); // a
        assert_eq!(ranking.apply(VertexId::new(3)), 2); // b
        assert_eq!(ranking.apply(VertexId::new(4)), 2); // c
        assert_eq!(ranking.apply(VertexId::new(5)), 3); // d
        assert_eq!(ranking.apply(g.end()), 4);
        assert_eq!(ranking.max_rank(), 4);
    }

    #[test]
    fn test_rank_groups() {
        let g = branching_witness();
        let ranking = Ranking::of_witness(&g).unwrap();
        assert_eq!(ranking.group(2), &[VertexId::new(3), VertexId::new(4)]);
        assert!(ranking.group(9).is_empty());
    }

    #[test]
    fn test_rank_monotone_along_edges() {
        let g = branching_witness();
        let ranking = Ranking::of_witness(&g).unwrap();
        for v in g.vertex_ids() {
            for w in g.vertex(v).outgoing() {
                assert!(ranking.apply(v) < ranking.apply(w));
            }
        }
    }

    #[test]
    fn test_cycle_is_fatal() {
        let mut g = branching_witness();
        // d -> a closes a cycle.
        g.add_edge(VertexId::new(5), VertexId::new(2));
        let err = Ranking::of_witness(&g).unwrap_err();
        assert!(matches!(err, CollateError::CycleDetected { .. }));
    }
}
