//! Export surface for finished collation graphs.
//!
//! The core does not define a wire format; it defines a stable, ordered
//! export value that any serialization must be able to round-trip without
//! disturbing topology. Node identity in the export is the arena index,
//! edge order is canonical (source, target), node order is topological.

pub mod dot;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::canonical::canonical_hash_hex;
use crate::types::collation::CollationGraph;
use crate::types::sigil::Sigil;
use crate::COLLATION_KERNEL_SCHEMA_VERSION;

/// One exported token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedToken {
    /// Raw content as transcribed.
    pub raw: String,
    /// Normalized comparison form.
    pub normalized: String,
    /// Monotonic index within the owning witness.
    pub index: u32,
    /// Markup ancestor path.
    pub parent_path: Vec<String>,
}

/// One exported collation node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedNode {
    /// Arena index of the node.
    pub id: u32,
    /// Per-sigil tokens, in sigil order.
    pub tokens: BTreeMap<String, ExportedToken>,
    /// Per-sigil branch paths, in sigil order.
    pub branch_paths: BTreeMap<String, Vec<u32>>,
}

/// One exported edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedEdge {
    /// Source node arena index.
    pub source: u32,
    /// Target node arena index.
    pub target: u32,
    /// Sigils traversing this edge, in sigil order.
    pub sigils: Vec<String>,
}

/// Stable, ordered export of a collation graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollationGraphExport {
    /// Kernel schema version the export was produced under.
    pub schema_version: String,
    /// Merged witness sigils, in merge order.
    pub sigils: Vec<String>,
    /// Arena index of the root node.
    pub start: u32,
    /// Arena index of the end node.
    pub end: u32,
    /// Nodes in topological order.
    pub nodes: Vec<ExportedNode>,
    /// Edges in canonical (source, target) order.
    pub edges: Vec<ExportedEdge>,
    /// Fingerprint of the exported graph.
    pub fingerprint: String,
}

impl CollationGraphExport {
    /// Build the export of a finished collation graph.
    pub fn from_graph(graph: &CollationGraph) -> Self {
        let nodes = graph
            .topological_order()
            .into_iter()
            .map(|id| {
                let node = graph.node(id);
                ExportedNode {
                    id: id.as_u32(),
                    tokens: node
                        .tokens()
                        .map(|(s, t)| {
                            (
                                s.as_str().to_string(),
                                ExportedToken {
                                    raw: t.raw().to_string(),
                                    normalized: t.normalized().to_string(),
                                    index: t.index(),
                                    parent_path: t.parent_path().to_vec(),
                                },
                            )
                        })
                        .collect(),
                    branch_paths: node
                        .sigils()
                        .filter_map(|s| {
                            node.branch_path_for(s)
                                .map(|p| (s.as_str().to_string(), p.clone()))
                        })
                        .collect(),
                }
            })
            .collect();

        let mut edges: Vec<ExportedEdge> = graph
            .edges()
            .iter()
            .map(|e| ExportedEdge {
                source: e.source.as_u32(),
                target: e.target.as_u32(),
                sigils: e.sigils.iter().map(|s| s.as_str().to_string()).collect(),
            })
            .collect();
        edges.sort_by_key(|e| (e.source, e.target));

        let mut export = Self {
            schema_version: COLLATION_KERNEL_SCHEMA_VERSION.to_string(),
            sigils: graph.sigils().iter().map(Sigil::as_str).map(String::from).collect(),
            start: graph.start().as_u32(),
            end: graph.end().as_u32(),
            nodes,
            edges,
            fingerprint: String::new(),
        };
        export.fingerprint = canonical_hash_hex(&(
            &export.schema_version,
            &export.sigils,
            export.start,
            export.end,
            &export.nodes,
            &export.edges,
        ));
        export
    }
}
