//! Deterministic topological traversal of a witness graph.
//!
//! A traversal emits every vertex exactly once, in an order where a vertex
//! appears only after all of its incoming edges have been satisfied by
//! prior emissions. It is one-shot: construct a new traversal per pass.

use std::collections::{BTreeMap, VecDeque};

use crate::error::CollateError;
use crate::types::vertex::VertexId;
use crate::types::witness::VariantWitnessGraph;

/// Compute the topological emission order of a witness graph.
///
/// Starts at the start sentinel and follows outgoing edges, emitting a
/// vertex once its incoming-edge visit count reaches its in-degree
/// (reference counting, no separate topological sort pass). Ready vertices
/// are queued in discovery order, and adjacency sets iterate by `VertexId`,
/// so the order is fully deterministic.
///
/// Fails fast on structural corruption: a vertex visited more often than it
/// has incoming edges, or a traversal that ends before emitting every
/// vertex (unreachable vertex or cycle). Both are fatal input-contract
/// violations, not user-facing errors.
pub fn topological_order(graph: &VariantWitnessGraph) -> Result<Vec<VertexId>, CollateError> {
    let mut satisfied: BTreeMap<VertexId, usize> = BTreeMap::new();
    let mut order = Vec::with_capacity(graph.vertex_count());
    let mut queue = VecDeque::from([graph.start()]);

    while let Some(vertex) = queue.pop_front() {
        order.push(vertex);
        for target in graph.vertex(vertex).outgoing() {
            let seen = satisfied.entry(target).or_insert(0);
            *seen += 1;
            let in_degree = graph.vertex(target).in_degree();
            if *seen == in_degree {
                queue.push_back(target);
            } else if *seen > in_degree {
                return Err(CollateError::TraversalOverrun {
                    sigil: graph.sigil().clone(),
                    vertex: target,
                });
            }
        }
    }

    if order.len() != graph.vertex_count() {
        return Err(CollateError::IncompleteTraversal {
            sigil: graph.sigil().clone(),
            emitted: order.len(),
            total: graph.vertex_count(),
        });
    }
    Ok(order)
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
    fn test_emits_all_vertices_once() {
        let g = branching_witness();
        let order = topological_order(&g).unwrap();
        assert_eq!(order.len(), g.vertex_count());
        let mut seen = order.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), order.len());
    }

    #[test]
    fn test_respects_edge_direction() {
        let g = branching_witness();
        let order = topological_order(&g).unwrap();
        let position: std::collections::BTreeMap<_, _> =
            order.iter().enumerate().map(|(i, v)| (*v, i)).collect();
        for v in g.vertex_ids() {
            for w in g.vertex(v).outgoing() {
                assert!(position[&v] < position[&w]);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let g = branching_witness();
        assert_eq!(topological_order(&g).unwrap(), topological_order(&g).unwrap());
    }

    #[test]
    fn test_unreachable_vertex_is_fatal() {
        let sigil = Sigil::from("A");
        let mut g = branching_witness();
        // Vertex with no incoming edge: never satisfied, never emitted.
        let orphan = g.add_token_vertex(Token::new(sigil, "x", 9, vec![]), vec![0]);
        g.add_edge(orphan, g.end());
        let err = topological_order(&g).unwrap_err();
        assert!(matches!(err, CollateError::IncompleteTraversal { .. }));
    }
}
