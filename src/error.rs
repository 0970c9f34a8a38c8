//! Error taxonomy for the collation kernel.

use crate::types::sigil::Sigil;
use crate::types::vertex::VertexId;

/// Fatal errors raised by the collation core.
///
/// Every variant is a structural or internal-invariant violation: the
/// algorithms are deterministic and pure given their inputs, so re-running
/// with the same inputs reproduces the same outcome. There is no partial
/// success — either a full, consistent collation graph is produced, or
/// nothing is.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CollateError {
    /// No witnesses were supplied.
    #[error("cannot collate an empty witness set")]
    NoWitnesses,

    /// Two witnesses share the same sigil.
    #[error("duplicate witness sigil: {0}")]
    DuplicateSigil(Sigil),

    /// A cycle was found while ranking a graph that is guaranteed acyclic
    /// by construction. Indicates a bug in the upstream producer or in
    /// kernel invariant maintenance, never a user-correctable condition.
    #[error("cycle detected while ranking {context}")]
    CycleDetected {
        /// Which graph was being ranked.
        context: String,
    },

    /// A traversal tried to visit a vertex more times than it has incoming
    /// edges. Signals structural corruption of the witness graph.
    #[error("traversal overrun at {vertex} in witness {sigil}")]
    TraversalOverrun {
        /// The corrupted witness.
        sigil: Sigil,
        /// The over-visited vertex.
        vertex: VertexId,
    },

    /// A traversal terminated without emitting every vertex: some vertex is
    /// unreachable from the start sentinel or sits on a cycle.
    #[error("traversal of witness {sigil} emitted {emitted} of {total} vertices")]
    IncompleteTraversal {
        /// The witness being traversed.
        sigil: Sigil,
        /// Vertices actually emitted.
        emitted: usize,
        /// Vertices in the graph.
        total: usize,
    },

    /// The selector's open set emptied before reaching a goal state. The
    /// search space is finite and a trivial discard-everything path to a
    /// goal always exists, so this is an assertion failure, not a search
    /// outcome.
    #[error("match selection search exhausted for witness {sigil}")]
    SearchExhausted {
        /// The witness being merged when the search died.
        sigil: Sigil,
    },

    /// A merge step needed the collation node for a vertex that was never
    /// mapped. The vertex-to-node mapping is total after every merge, so
    /// this is an internal-invariant violation.
    #[error("no collation node mapped for {vertex} of witness {sigil}")]
    UnmappedVertex {
        /// The witness being merged.
        sigil: Sigil,
        /// The unmapped vertex.
        vertex: VertexId,
    },
}
