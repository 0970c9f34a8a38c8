//! The per-witness variant graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::markup::{Markup, MarkupId};
use crate::types::sigil::Sigil;
use crate::types::token::Token;
use crate::types::vertex::{BranchPath, TokenVertex, VertexId, VertexKind};

/// DAG of one witness's tokens, with start/end sentinels.
///
/// Built once by the importer and read-only afterward. All vertices live in
/// an arena owned by the graph and are addressed by [`VertexId`]; adjacency
/// uses `BTreeSet` so every iteration order is deterministic.
///
/// Invariant: acyclic, with exactly one start vertex from which every vertex
/// is reachable and exactly one end vertex reachable from every vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantWitnessGraph {
    sigil: Sigil,
    vertices: Vec<TokenVertex>,
    start: VertexId,
    end: VertexId,
    markup: Vec<Markup>,
    markup_to_vertices: BTreeMap<MarkupId, Vec<VertexId>>,
    vertex_to_markup: BTreeMap<VertexId, Vec<MarkupId>>,
}

impl VariantWitnessGraph {
    /// Create a new witness graph containing only the two sentinels.
    pub fn new(sigil: Sigil) -> Self {
        let start_vertex = TokenVertex::new(VertexKind::Start, sigil.clone(), vec![0]);
        let end_vertex = TokenVertex::new(VertexKind::End, sigil.clone(), vec![0]);
        Self {
            sigil,
            vertices: vec![start_vertex, end_vertex],
            start: VertexId::new(0),
            end: VertexId::new(1),
            markup: Vec::new(),
            markup_to_vertices: BTreeMap::new(),
            vertex_to_markup: BTreeMap::new(),
        }
    }

    /// The witness sigil.
    pub fn sigil(&self) -> &Sigil {
        &self.sigil
    }

    /// The start sentinel.
    pub fn start(&self) -> VertexId {
        self.start
    }

    /// The end sentinel.
    pub fn end(&self) -> VertexId {
        self.end
    }

    /// Number of vertices, sentinels included.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Look up a vertex by id.
    ///
    /// Ids are only ever minted by this graph, so the index is always valid.
    pub fn vertex(&self, id: VertexId) -> &TokenVertex {
        &self.vertices[id.as_u32() as usize]
    }

    /// All vertex ids in arena order (which is creation order).
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len() as u32).map(VertexId::new)
    }

    /// Add a token vertex and return its id.
    pub fn add_token_vertex(&mut self, token: Token, branch_path: BranchPath) -> VertexId {
        let id = VertexId::new(self.vertices.len() as u32);
        self.vertices
            .push(TokenVertex::new(VertexKind::Token(token), self.sigil.clone(), branch_path));
        id
    }

    /// Add a directed edge. Duplicate edges between the same pair collapse.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId) {
        self.vertices[from.as_u32() as usize].outgoing.insert(to);
        self.vertices[to.as_u32() as usize].incoming.insert(from);
    }

    /// Register a markup span and return its id.
    pub fn register_markup(&mut self, markup: Markup) -> MarkupId {
        let id = MarkupId::new(self.markup.len() as u32);
        self.markup.push(markup);
        id
    }

    /// Record that a vertex falls inside a markup span.
    pub fn attach_markup(&mut self, vertex: VertexId, markup: MarkupId) {
        self.markup_to_vertices.entry(markup).or_default().push(vertex);
        self.vertex_to_markup.entry(vertex).or_default().push(markup);
    }

    /// Look up a markup span by id.
    pub fn markup(&self, id: MarkupId) -> &Markup {
        &self.markup[id.as_u32() as usize]
    }

    /// All markup spans in registration order.
    pub fn markup_spans(&self) -> impl Iterator<Item = (MarkupId, &Markup)> + '_ {
        self.markup
            .iter()
            .enumerate()
            .map(|(i, m)| (MarkupId::new(i as u32), m))
    }

    /// The ordered vertices covered by a markup span.
    pub fn vertices_for_markup(&self, id: MarkupId) -> &[VertexId] {
        self.markup_to_vertices.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The markup spans covering a vertex, outermost first.
    pub fn markup_for_vertex(&self, id: VertexId) -> &[MarkupId] {
        self.vertex_to_markup.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_graph() -> VariantWitnessGraph {
        // start -> a -> b -> end
        let sigil = Sigil::from("A");
        let mut g = VariantWitnessGraph::new(sigil.clone());
        let a = g.add_token_vertex(Token::new(sigil.clone(), "a ", 0, vec![]), vec![0]);
        let b = g.add_token_vertex(Token::new(sigil, "b", 1, vec![]), vec![0]);
        g.add_edge(g.start(), a);
        g.add_edge(a, b);
        g.add_edge(b, g.end());
        g
    }

    #[test]
    fn test_sentinels_present() {
        let g = VariantWitnessGraph::new(Sigil::from("A"));
        assert_eq!(g.vertex_count(), 2);
        assert!(g.vertex(g.start()).is_sentinel());
        assert!(g.vertex(g.end()).is_sentinel());
    }

    #[test]
    fn test_adjacency() {
        let g = make_graph();
        let start_out: Vec<_> = g.vertex(g.start()).outgoing().collect();
        assert_eq!(start_out, vec![VertexId::new(2)]);
        assert_eq!(g.vertex(g.end()).in_degree(), 1);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut g = make_graph();
        let a = VertexId::new(2);
        g.add_edge(g.start(), a);
        assert_eq!(g.vertex(a).in_degree(), 1);
    }

    #[test]
    fn test_markup_registry_round_trip() {
        let mut g = make_graph();
        let m = g.register_markup(Markup::new("del"));
        let a = VertexId::new(2);
        g.attach_markup(a, m);
        assert_eq!(g.vertices_for_markup(m), &[a]);
        assert_eq!(g.markup_for_vertex(a), &[m]);
        assert_eq!(g.markup(m).tag, "del");
    }
}
