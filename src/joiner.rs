//! Join pass: coalesce unbranched same-sigil node chains.
//!
//! A chain of collation nodes where each link has exactly one outgoing and
//! one incoming edge, both nodes carry identical sigil sets, and every
//! witness's tokens share the same markup parent path, reads as one run of
//! uninterrupted text. The join pass rewrites such chains into single nodes
//! with concatenated token content. It is a pure rewrite for readability of
//! the output: the original graph is untouched, tokens are joined into new
//! token values, and applying the pass twice changes nothing.

use std::collections::BTreeMap;
use tracing::debug;

use crate::types::collation::{CollationGraph, NodeId};
use crate::types::sigil::Sigil;
use crate::types::vertex::BranchPath;

/// Whether the single edge `a -> b` may be collapsed.
fn can_join(graph: &CollationGraph, a: NodeId, b: NodeId) -> bool {
    let node_a = graph.node(a);
    let node_b = graph.node(b);
    if node_a.is_sentinel() || node_b.is_sentinel() {
        return false;
    }
    let sigils_a: Vec<&Sigil> = node_a.sigils().collect();
    let sigils_b: Vec<&Sigil> = node_b.sigils().collect();
    if sigils_a != sigils_b {
        return false;
    }
    sigils_a.iter().all(|s| {
        match (node_a.token_for(s), node_b.token_for(s)) {
            (Some(ta), Some(tb)) => ta.parent_path() == tb.parent_path(),
            _ => false,
        }
    })
}

/// The unique join successor of `a`, if the chain may continue through it.
fn join_successor(graph: &CollationGraph, a: NodeId) -> Option<NodeId> {
    let mut outgoing = graph.outgoing_edges(a);
    let (_, edge) = outgoing.next()?;
    if outgoing.next().is_some() {
        return None;
    }
    let b = edge.target;
    if graph.incoming_edges(b).count() != 1 {
        return None;
    }
    can_join(graph, a, b).then_some(b)
}

/// Coalesce unbranched same-sigil chains, returning a new graph.
///
/// Idempotent: `join(&join(g))` has the same fingerprint as `join(g)`.
pub fn join(graph: &CollationGraph) -> CollationGraph {
    // Maximal chains in topological order. A node is a chain head iff no
    // chain continues into it.
    let order = graph.topological_order();
    let mut continued_into: BTreeMap<NodeId, bool> = BTreeMap::new();
    for &n in &order {
        if let Some(next) = join_successor(graph, n) {
            continued_into.insert(next, true);
        }
    }

    let mut chains: Vec<Vec<NodeId>> = Vec::new();
    for &head in &order {
        if graph.node(head).is_sentinel() || continued_into.get(&head).copied().unwrap_or(false) {
            continue;
        }
        let mut chain = vec![head];
        let mut last = head;
        while let Some(next) = join_successor(graph, last) {
            chain.push(next);
            last = next;
        }
        chains.push(chain);
    }

    // Rebuild. Sentinels keep their places; each chain becomes one node.
    let mut joined = CollationGraph::new();
    for sigil in graph.sigils() {
        joined.add_sigil(sigil.clone());
    }

    let mut node_map: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    node_map.insert(graph.start(), joined.start());
    node_map.insert(graph.end(), joined.end());

    for chain in &chains {
        let new_node = joined.add_node();
        for &member in chain {
            node_map.insert(member, new_node);
        }
        let head = graph.node(chain[0]);
        let sigils: Vec<Sigil> = head.sigils().cloned().collect();
        for sigil in sigils {
            let token = chain
                .iter()
                .filter_map(|&m| graph.node(m).token_for(&sigil))
                .cloned()
                .reduce(|acc, t| acc.joined_with(&t))
                .expect("chain members carry a token for every chain sigil");
            let branch_path: BranchPath = head
                .branch_path_for(&sigil)
                .cloned()
                .unwrap_or_else(|| vec![0]);
            joined.node_mut(new_node).set_token(sigil, token, branch_path);
        }
    }

    for edge in graph.edges() {
        let source = node_map[&edge.source];
        let target = node_map[&edge.target];
        if source == target {
            // Intra-chain link, absorbed into the joined node.
            continue;
        }
        joined.add_edge_with_sigils(source, target, edge.sigils.iter().cloned());
    }

    for (markup_id, markup_node) in graph.markup_nodes() {
        let new_markup =
            joined.add_markup_node(markup_node.sigil.clone(), markup_node.markup.clone());
        for node in graph.nodes_for_markup(markup_id) {
            joined.link_markup(new_markup, node_map[&node]);
        }
    }

    debug!(
        before = graph.node_count(),
        after = joined.node_count(),
        "join pass complete"
    );
    joined
}
