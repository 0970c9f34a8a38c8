//! The collation graph: the output of collating all witnesses.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::canonical::canonical_hash_hex;
use crate::types::markup::Markup;
use crate::types::sigil::Sigil;
use crate::types::token::Token;
use crate::types::vertex::BranchPath;

/// Dense collation node identifier within the graph's arena.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a `NodeId` from a raw arena index.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw arena index.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Dense edge identifier within the graph's edge arena.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(u32);

impl EdgeId {
    /// Create an `EdgeId` from a raw arena index.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw arena index.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Dense markup node identifier.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkupNodeId(u32);

impl MarkupNodeId {
    /// Create a `MarkupNodeId` from a raw arena index.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw arena index.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// A collation node.
///
/// Holds, per witness sigil, the token that landed there plus that witness's
/// branch path at that point. Tokens from multiple witnesses mean those
/// witnesses agree verbatim at this point; a single witness means variant
/// content. An empty token map marks a sentinel (start/end) node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollationNode {
    tokens: BTreeMap<Sigil, Token>,
    branch_paths: BTreeMap<Sigil, BranchPath>,
}

impl CollationNode {
    /// The token this witness contributed, if any.
    pub fn token_for(&self, sigil: &Sigil) -> Option<&Token> {
        self.tokens.get(sigil)
    }

    /// The branch path this witness had at this point, if any.
    pub fn branch_path_for(&self, sigil: &Sigil) -> Option<&BranchPath> {
        self.branch_paths.get(sigil)
    }

    /// Sigils of the witnesses that placed a token here, in sigil order.
    pub fn sigils(&self) -> impl Iterator<Item = &Sigil> {
        self.tokens.keys()
    }

    /// All (sigil, token) pairs, in sigil order.
    pub fn tokens(&self) -> impl Iterator<Item = (&Sigil, &Token)> {
        self.tokens.iter()
    }

    /// Number of witnesses that placed a token here.
    pub fn witness_count(&self) -> usize {
        self.tokens.len()
    }

    /// Whether this is a sentinel (start/end) node.
    pub fn is_sentinel(&self) -> bool {
        self.tokens.is_empty()
    }

    pub(crate) fn set_token(&mut self, sigil: Sigil, token: Token, branch_path: BranchPath) {
        self.tokens.insert(sigil.clone(), token);
        self.branch_paths.insert(sigil, branch_path);
    }
}

/// A directed collation edge, labeled with the sigils that traverse it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollationEdge {
    /// Source node.
    pub source: NodeId,
    /// Target node.
    pub target: NodeId,
    /// Witnesses whose traversal uses this edge.
    pub sigils: BTreeSet<Sigil>,
}

/// A markup node: one witness's markup span carried onto the collation graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupNode {
    /// Owning witness sigil.
    pub sigil: Sigil,
    /// The markup span.
    pub markup: Markup,
}

/// The collation graph.
///
/// A DAG with a single root (start) node and a single end node; every node
/// is reachable from the root, and every non-root node has at least one
/// incoming edge labeled with the sigils that produced it. Built
/// incrementally by the collator, one witness merge at a time, and immutable
/// once collation returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollationGraph {
    sigils: Vec<Sigil>,
    nodes: Vec<CollationNode>,
    edges: Vec<CollationEdge>,
    outgoing: BTreeMap<NodeId, Vec<EdgeId>>,
    incoming: BTreeMap<NodeId, Vec<EdgeId>>,
    start: NodeId,
    end: NodeId,
    markup_nodes: Vec<MarkupNode>,
    markup_links: BTreeMap<MarkupNodeId, BTreeSet<NodeId>>,
}

impl CollationGraph {
    /// Create an empty collation graph with start and end sentinel nodes.
    pub(crate) fn new() -> Self {
        Self {
            sigils: Vec::new(),
            nodes: vec![CollationNode::default(), CollationNode::default()],
            edges: Vec::new(),
            outgoing: BTreeMap::new(),
            incoming: BTreeMap::new(),
            start: NodeId::new(0),
            end: NodeId::new(1),
            markup_nodes: Vec::new(),
            markup_links: BTreeMap::new(),
        }
    }

    /// The root (start) node.
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// The end node.
    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Sigils of all merged witnesses, in merge order.
    pub fn sigils(&self) -> &[Sigil] {
        &self.sigils
    }

    pub(crate) fn add_sigil(&mut self, sigil: Sigil) {
        self.sigils.push(sigil);
    }

    /// Number of nodes, sentinels included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> &CollationNode {
        &self.nodes[id.as_u32() as usize]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut CollationNode {
        &mut self.nodes[id.as_u32() as usize]
    }

    /// All node ids in arena order (which is creation order).
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId::new)
    }

    /// Append a fresh, empty node and return its id.
    pub(crate) fn add_node(&mut self) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(CollationNode::default());
        id
    }

    /// All edges in creation order.
    pub fn edges(&self) -> &[CollationEdge] {
        &self.edges
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: EdgeId) -> &CollationEdge {
        &self.edges[id.as_u32() as usize]
    }

    /// Add an edge labeled with `sigils`, unioning into an existing edge if
    /// one already connects the same (source, target) pair.
    pub(crate) fn add_edge_with_sigils(
        &mut self,
        source: NodeId,
        target: NodeId,
        sigils: impl IntoIterator<Item = Sigil>,
    ) {
        if let Some(edge_id) = self
            .outgoing
            .get(&source)
            .and_then(|out| out.iter().find(|e| self.edges[e.as_u32() as usize].target == target))
            .copied()
        {
            self.edges[edge_id.as_u32() as usize].sigils.extend(sigils);
            return;
        }
        let id = EdgeId::new(self.edges.len() as u32);
        self.edges.push(CollationEdge {
            source,
            target,
            sigils: sigils.into_iter().collect(),
        });
        self.outgoing.entry(source).or_default().push(id);
        self.incoming.entry(target).or_default().push(id);
    }

    /// Outgoing edges of a node, in creation order.
    pub fn outgoing_edges(&self, id: NodeId) -> impl Iterator<Item = (EdgeId, &CollationEdge)> {
        self.outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .map(|e| (*e, &self.edges[e.as_u32() as usize]))
    }

    /// Incoming edges of a node, in creation order.
    pub fn incoming_edges(&self, id: NodeId) -> impl Iterator<Item = (EdgeId, &CollationEdge)> {
        self.incoming
            .get(&id)
            .into_iter()
            .flatten()
            .map(|e| (*e, &self.edges[e.as_u32() as usize]))
    }

    /// Outgoing neighbor nodes, in edge-creation order.
    pub fn out_neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing_edges(id).map(|(_, e)| e.target)
    }

    /// Incoming neighbor nodes, in edge-creation order.
    pub fn in_neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming_edges(id).map(|(_, e)| e.source)
    }

    /// Add a markup node and return its id.
    pub(crate) fn add_markup_node(&mut self, sigil: Sigil, markup: Markup) -> MarkupNodeId {
        let id = MarkupNodeId::new(self.markup_nodes.len() as u32);
        self.markup_nodes.push(MarkupNode { sigil, markup });
        id
    }

    /// Link a markup node to a collation node holding one of its tokens.
    pub(crate) fn link_markup(&mut self, markup_node: MarkupNodeId, node: NodeId) {
        self.markup_links.entry(markup_node).or_default().insert(node);
    }

    /// All markup nodes in creation order.
    pub fn markup_nodes(&self) -> impl Iterator<Item = (MarkupNodeId, &MarkupNode)> {
        self.markup_nodes
            .iter()
            .enumerate()
            .map(|(i, m)| (MarkupNodeId::new(i as u32), m))
    }

    /// The collation nodes a markup node covers.
    pub fn nodes_for_markup(&self, id: MarkupNodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.markup_links.get(&id).into_iter().flatten().copied()
    }

    /// Deterministic topological order of all nodes.
    ///
    /// Kahn's algorithm with a `BTreeSet` ready-set: among nodes whose
    /// predecessors are all emitted, the lowest `NodeId` goes first. The
    /// graph is acyclic by construction, so this is total.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut remaining: BTreeMap<NodeId, usize> = self
            .node_ids()
            .map(|n| (n, self.incoming_edges(n).count()))
            .collect();
        let mut ready: BTreeSet<NodeId> = remaining
            .iter()
            .filter(|(_, c)| **c == 0)
            .map(|(n, _)| *n)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = ready.iter().next().copied() {
            ready.remove(&node);
            order.push(node);
            for target in self.out_neighbors(node) {
                if let Some(c) = remaining.get_mut(&target) {
                    *c -= 1;
                    if *c == 0 {
                        ready.insert(target);
                    }
                }
            }
        }
        order
    }

    /// Content-derived fingerprint of the full graph topology and labels.
    ///
    /// Same witnesses, same order, same config: identical fingerprint.
    pub fn fingerprint(&self) -> String {
        #[derive(Serialize)]
        struct NodeRepr<'a> {
            id: u32,
            tokens: BTreeMap<&'a str, &'a str>,
            branch_paths: BTreeMap<&'a str, &'a [u32]>,
        }
        #[derive(Serialize)]
        struct EdgeRepr<'a> {
            source: u32,
            target: u32,
            sigils: Vec<&'a str>,
        }
        #[derive(Serialize)]
        struct GraphRepr<'a> {
            sigils: Vec<&'a str>,
            start: u32,
            end: u32,
            nodes: Vec<NodeRepr<'a>>,
            edges: Vec<EdgeRepr<'a>>,
        }

        let nodes = self
            .topological_order()
            .into_iter()
            .map(|id| {
                let node = self.node(id);
                NodeRepr {
                    id: id.as_u32(),
                    tokens: node.tokens().map(|(s, t)| (s.as_str(), t.raw())).collect(),
                    branch_paths: node
                        .branch_paths
                        .iter()
                        .map(|(s, p)| (s.as_str(), p.as_slice()))
                        .collect(),
                }
            })
            .collect();
        let mut edges: Vec<&CollationEdge> = self.edges.iter().collect();
        edges.sort_by_key(|e| (e.source, e.target));
        let edges = edges
            .into_iter()
            .map(|e| EdgeRepr {
                source: e.source.as_u32(),
                target: e.target.as_u32(),
                sigils: e.sigils.iter().map(Sigil::as_str).collect(),
            })
            .collect();

        canonical_hash_hex(&GraphRepr {
            sigils: self.sigils.iter().map(Sigil::as_str).collect(),
            start: self.start.as_u32(),
            end: self.end.as_u32(),
            nodes,
            edges,
        })
    }
}
