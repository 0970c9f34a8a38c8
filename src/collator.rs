//! The collator: incremental construction of the collation graph.
//!
//! The first witness seeds the graph one node per token. Every further
//! witness is merged in sequence: its potential matches are projected onto
//! the graph under a base ranking computed from the graph state so far, the
//! selector picks the optimal consistent subset, and the witness's
//! traversal is walked in lockstep — matched vertices fuse their token into
//! the existing node, unmatched vertices get brand-new nodes, and edges are
//! wired through one shared routine that unions sigil sets on duplicate
//! (source, target) pairs.
//!
//! Merging is strictly sequential: witness k+1 needs the base ranking of
//! the graph after witness k. The collator owns the graph exclusively for
//! the duration of one `collate` call; the result is immutable thereafter.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::CollatorConfig;
use crate::error::CollateError;
use crate::joiner::join;
use crate::matcher::{find_potential_matches, PotentialMatches};
use crate::ranking::Ranking;
use crate::selector::select_optimal_matches;
use crate::traversal::topological_order;
use crate::types::collation::{CollationGraph, NodeId};
use crate::types::matching::{CollatedMatch, MatchId};
use crate::types::vertex::{VertexId, VertexKind};
use crate::types::witness::VariantWitnessGraph;

/// Mapping from one witness's vertices to collation nodes.
///
/// Total after that witness's merge: every vertex, sentinels included, has
/// exactly one node.
type VertexNodeMap = BTreeMap<VertexId, NodeId>;

/// Collates witness graphs into one collation graph.
pub struct Collator {
    config: CollatorConfig,
}

impl Default for Collator {
    fn default() -> Self {
        Self::new(CollatorConfig::default())
    }
}

impl Collator {
    /// Create a collator with the given configuration.
    pub fn new(config: CollatorConfig) -> Self {
        Self { config }
    }

    /// The configuration.
    pub fn config(&self) -> &CollatorConfig {
        &self.config
    }

    /// Collate the witnesses, in the order given, into a collation graph.
    ///
    /// Runs to completion on the calling thread; there is no partial
    /// result. Witness order is part of the input: merging in a different
    /// order is a different collation.
    pub fn collate(
        &self,
        witnesses: &[VariantWitnessGraph],
    ) -> Result<CollationGraph, CollateError> {
        if witnesses.is_empty() {
            return Err(CollateError::NoWitnesses);
        }
        let mut sigils = BTreeSet::new();
        for w in witnesses {
            if !sigils.insert(w.sigil().clone()) {
                return Err(CollateError::DuplicateSigil(w.sigil().clone()));
            }
        }

        let potential = find_potential_matches(witnesses)?;
        let mut graph = CollationGraph::new();
        let mut maps: Vec<VertexNodeMap> = Vec::with_capacity(witnesses.len());

        maps.push(initialize(&mut graph, &witnesses[0])?);
        for k in 1..witnesses.len() {
            let map = merge(&mut graph, witnesses, k, &maps, &potential)?;
            maps.push(map);
        }

        debug!(
            witnesses = witnesses.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "collation complete"
        );
        if self.config.join_after_merge {
            graph = join(&graph);
        }
        Ok(graph)
    }
}

/// Seed the collation graph from the first witness: one node per
/// non-sentinel vertex, root and end from the sentinels, branch paths
/// copied, edges mirroring the witness graph.
fn initialize(
    graph: &mut CollationGraph,
    witness: &VariantWitnessGraph,
) -> Result<VertexNodeMap, CollateError> {
    let order = topological_order(witness)?;
    let mut map = VertexNodeMap::new();
    map.insert(witness.start(), graph.start());
    map.insert(witness.end(), graph.end());

    for &v in &order {
        let vertex = witness.vertex(v);
        if let VertexKind::Token(token) = &vertex.kind {
            let node = graph.add_node();
            graph
                .node_mut(node)
                .set_token(witness.sigil().clone(), token.clone(), vertex.branch_path.clone());
            map.insert(v, node);
        }
    }

    graph.add_sigil(witness.sigil().clone());
    copy_markup(graph, witness, &map);
    add_edges_for_witness(graph, witness, &map)?;
    debug!(witness = %witness.sigil(), nodes = graph.node_count(), "initialized collation graph");
    Ok(map)
}

/// Merge one further witness into the collation graph.
fn merge(
    graph: &mut CollationGraph,
    witnesses: &[VariantWitnessGraph],
    k: usize,
    maps: &[VertexNodeMap],
    potential: &PotentialMatches,
) -> Result<VertexNodeMap, CollateError> {
    let witness = &witnesses[k];
    let sigil = witness.sigil().clone();

    let base_ranking = Ranking::of_collation(graph)?;
    let collated = project_matches(witnesses, k, maps, potential, &base_ranking)?;
    debug!(witness = %sigil, collated = collated.len(), "projected potential matches");

    let chosen = select_optimal_matches(&sigil, collated)?;
    let matched_node: BTreeMap<VertexId, NodeId> =
        chosen.iter().map(|m| (m.vertex, m.node)).collect();

    let order = topological_order(witness)?;
    let mut map = VertexNodeMap::new();
    map.insert(witness.start(), graph.start());
    map.insert(witness.end(), graph.end());

    for &v in &order {
        let vertex = witness.vertex(v);
        let VertexKind::Token(token) = &vertex.kind else {
            continue;
        };
        let node = match matched_node.get(&v) {
            // A chosen match: fuse this witness's token into the existing
            // node instead of creating a new one.
            Some(&node) => node,
            // Witness-unique content: a brand-new node.
            None => graph.add_node(),
        };
        graph
            .node_mut(node)
            .set_token(sigil.clone(), token.clone(), vertex.branch_path.clone());
        map.insert(v, node);
    }

    graph.add_sigil(sigil);
    copy_markup(graph, witness, &map);
    add_edges_for_witness(graph, witness, &map)?;
    Ok(map)
}

/// Project the discovered matches for witness `k` onto the collation graph:
/// every match pairing witness `k` with an already-merged witness becomes a
/// [`CollatedMatch`] against that witness's collation node, ranked under
/// the base ranking. Distinct matches landing on the same (node, vertex)
/// pair collapse into one.
fn project_matches(
    witnesses: &[VariantWitnessGraph],
    k: usize,
    maps: &[VertexNodeMap],
    potential: &PotentialMatches,
    base_ranking: &Ranking<NodeId>,
) -> Result<Vec<CollatedMatch>, CollateError> {
    let sigil = witnesses[k].sigil();
    let mut collated: Vec<CollatedMatch> = Vec::new();
    let mut seen: BTreeSet<(NodeId, VertexId)> = BTreeSet::new();

    for m in potential.sorted_for_witness(sigil) {
        let Some(own) = m.side(sigil) else {
            continue;
        };
        for (other_sigil, other_side) in m.sides() {
            if other_sigil == sigil {
                continue;
            }
            let Some(other_index) = (0..k).find(|i| witnesses[*i].sigil() == other_sigil) else {
                // The other witness is not merged yet; this match will be
                // projected when it is.
                continue;
            };
            let node = *maps[other_index].get(&other_side.vertex).ok_or_else(|| {
                CollateError::UnmappedVertex {
                    sigil: other_sigil.clone(),
                    vertex: other_side.vertex,
                }
            })?;
            if seen.insert((node, own.vertex)) {
                collated.push(CollatedMatch {
                    id: MatchId::new(collated.len() as u32),
                    node,
                    node_rank: base_ranking.apply(node),
                    vertex: own.vertex,
                    witness_rank: own.rank,
                    witness_branch_path: own.branch_path.clone(),
                });
            }
        }
    }
    Ok(collated)
}

/// Carry a witness's markup spans onto the collation graph as markup nodes
/// linked to the collation nodes that hold their tokens.
fn copy_markup(graph: &mut CollationGraph, witness: &VariantWitnessGraph, map: &VertexNodeMap) {
    for (markup_id, markup) in witness.markup_spans() {
        let markup_node = graph.add_markup_node(witness.sigil().clone(), markup.clone());
        for v in witness.vertices_for_markup(markup_id) {
            if let Some(&node) = map.get(v) {
                graph.link_markup(markup_node, node);
            }
        }
    }
}

/// The shared edge-adding routine: for every (vertex, node) mapping, add a
/// directed edge from each real predecessor's node, unioning into an
/// existing edge when one already connects the same (source, target) pair.
fn add_edges_for_witness(
    graph: &mut CollationGraph,
    witness: &VariantWitnessGraph,
    map: &VertexNodeMap,
) -> Result<(), CollateError> {
    for (&v, &node) in map {
        for p in witness.vertex(v).incoming() {
            let source = *map.get(&p).ok_or_else(|| CollateError::UnmappedVertex {
                sigil: witness.sigil().clone(),
                vertex: p,
            })?;
            graph.add_edge_with_sigils(source, node, [witness.sigil().clone()]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sigil::Sigil;
    use crate::types::token::Token;

    fn linear_witness(sigil: &str, words: &[&str]) -> VariantWitnessGraph {
        let sigil = Sigil::from(sigil);
        let mut g = VariantWitnessGraph::new(sigil.clone());
        let mut prev = g.start();
        for (i, word) in words.iter().enumerate() {
            let v = g.add_token_vertex(
                Token::new(sigil.clone(), *word, i as u32, vec!["xml".to_string()]),
                vec![0],
            );
            g.add_edge(prev, v);
            prev = v;
        }
        g.add_edge(prev, g.end());
        g
    }

    fn unjoined() -> Collator {
        Collator::new(CollatorConfig::unjoined())
    }

    #[test]
    fn test_empty_witness_set_is_error() {
        let err = unjoined().collate(&[]).unwrap_err();
        assert!(matches!(err, CollateError::NoWitnesses));
    }

    #[test]
    fn test_duplicate_sigil_is_error() {
        let a = linear_witness("A", &["x "]);
        let b = linear_witness("A", &["y "]);
        let err = unjoined().collate(&[a, b]).unwrap_err();
        assert!(matches!(err, CollateError::DuplicateSigil(_)));
    }

    #[test]
    fn test_single_witness_mirrors_its_graph() {
        let a = linear_witness("A", &["x ", "y ", "z"]);
        let graph = unjoined().collate(&[a]).unwrap();
        // start + end + one node per token.
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.sigils(), &[Sigil::from("A")]);
    }

    #[test]
    fn test_identical_witnesses_fully_fuse() {
        let a = linear_witness("A", &["x ", "y "]);
        let b = linear_witness("B", &["x ", "y "]);
        let graph = unjoined().collate(&[a, b]).unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        for id in graph.node_ids() {
            let node = graph.node(id);
            if !node.is_sentinel() {
                assert_eq!(node.witness_count(), 2);
            }
        }
        // Every edge carries both sigils.
        for edge in graph.edges() {
            assert_eq!(edge.sigils.len(), 2);
        }
    }

    #[test]
    fn test_divergent_content_branches() {
        let a = linear_witness("A", &["x ", "mid ", "z"]);
        let b = linear_witness("B", &["x ", "other ", "z"]);
        let graph = unjoined().collate(&[a, b]).unwrap();
        // Shared x and z; divergent mid/other.
        assert_eq!(graph.node_count(), 6);
        let mids: Vec<_> = graph
            .node_ids()
            .filter(|id| graph.node(*id).witness_count() == 1)
            .collect();
        assert_eq!(mids.len(), 2);
    }

    #[test]
    fn test_vertex_to_node_mapping_total() {
        let a = linear_witness("A", &["x ", "y "]);
        let b = linear_witness("B", &["y ", "w "]);
        let witnesses = vec![a, b];
        let potential = find_potential_matches(&witnesses).unwrap();
        let mut graph = CollationGraph::new();
        let map_a = initialize(&mut graph, &witnesses[0]).unwrap();
        assert_eq!(map_a.len(), witnesses[0].vertex_count());
        let map_b = merge(&mut graph, &witnesses, 1, &[map_a], &potential).unwrap();
        assert_eq!(map_b.len(), witnesses[1].vertex_count());
    }
}
