//! Dot serialization of a collation graph.
//!
//! Deterministic: nodes in topological order, edges in (source, target)
//! order, sigils in sigil order. The output string is stable across runs
//! for identical graphs, so it doubles as an acceptance fixture format.

use crate::types::collation::{CollationGraph, NodeId};
use crate::types::sigil::Sigil;

fn escape(content: &str) -> String {
    content
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Node label: sigils grouped by identical raw content, so full agreement
/// reads as one line (`A,B: text`) and partial divergence as one line per
/// variant. Milestone tokens render as their element tag.
fn node_label(graph: &CollationGraph, id: NodeId) -> String {
    let node = graph.node(id);
    let mut groups: Vec<(String, Vec<&Sigil>)> = Vec::new();
    for (sigil, token) in node.tokens() {
        let content = if token.is_milestone() {
            format!("<{}/>", token.parent_tag().unwrap_or("milestone"))
        } else {
            token.raw().to_string()
        };
        match groups.iter_mut().find(|(c, _)| *c == content) {
            Some((_, sigils)) => sigils.push(sigil),
            None => groups.push((content, vec![sigil])),
        }
    }
    groups
        .iter()
        .map(|(content, sigils)| {
            let sigils: Vec<&str> = sigils.iter().map(|s| s.as_str()).collect();
            format!("{}: {}", sigils.join(","), escape(content))
        })
        .collect::<Vec<_>>()
        .join("\\n")
}

/// Render the graph in dot format.
pub fn to_dot(graph: &CollationGraph) -> String {
    let mut out = String::new();
    out.push_str("digraph CollationGraph {\n");
    out.push_str("  rankdir=LR\n");

    for id in graph.topological_order() {
        if graph.node(id).is_sentinel() {
            out.push_str(&format!("  n{} [shape=doublecircle;label=\"\"]\n", id.as_u32()));
        } else {
            out.push_str(&format!(
                "  n{} [label=\"{}\"]\n",
                id.as_u32(),
                node_label(graph, id)
            ));
        }
    }

    let mut edges: Vec<_> = graph.edges().iter().collect();
    edges.sort_by_key(|e| (e.source, e.target));
    for edge in edges {
        let sigils: Vec<&str> = edge.sigils.iter().map(|s| s.as_str()).collect();
        out.push_str(&format!(
            "  n{} -> n{} [label=\"{}\"]\n",
            edge.source.as_u32(),
            edge.target.as_u32(),
            sigils.join(",")
        ));
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collator::Collator;
    use crate::import::import_witness;

    #[test]
    fn test_dot_exact_output_full_agreement() {
        let a = import_witness("A", "<xml>a b</xml>").unwrap();
        let b = import_witness("B", "<xml>a b</xml>").unwrap();
        let graph = Collator::default().collate(&[a, b]).unwrap();
        let expected = "digraph CollationGraph {\n\
                        \x20 rankdir=LR\n\
                        \x20 n0 [shape=doublecircle;label=\"\"]\n\
                        \x20 n2 [label=\"A,B: a b\"]\n\
                        \x20 n1 [shape=doublecircle;label=\"\"]\n\
                        \x20 n0 -> n2 [label=\"A,B\"]\n\
                        \x20 n2 -> n1 [label=\"A,B\"]\n\
                        }\n";
        assert_eq!(to_dot(&graph), expected);
    }

    #[test]
    fn test_dot_groups_agreeing_sigils() {
        let a = import_witness("A", "<xml>x mid z</xml>").unwrap();
        let b = import_witness("B", "<xml>x other z</xml>").unwrap();
        let graph = Collator::default().collate(&[a, b]).unwrap();
        let dot = to_dot(&graph);
        assert!(dot.contains("[label=\"A,B: x \"]"));
        assert!(dot.contains("[label=\"A: mid \"]"));
        assert!(dot.contains("[label=\"B: other \"]"));
    }

    #[test]
    fn test_dot_deterministic() {
        let mk = || {
            let a = import_witness("A", "<xml>p q r</xml>").unwrap();
            let b = import_witness("B", "<xml>p x r</xml>").unwrap();
            Collator::default().collate(&[a, b]).unwrap()
        };
        assert_eq!(to_dot(&mk()), to_dot(&mk()));
    }
}
