//! Core types for the collation kernel.

pub mod collation;
pub mod markup;
pub mod matching;
pub mod sigil;
pub mod token;
pub mod vertex;
pub mod witness;

pub use collation::{
    CollationEdge, CollationGraph, CollationNode, EdgeId, MarkupNode, MarkupNodeId, NodeId,
};
pub use markup::{Markup, MarkupId};
pub use matching::{CollatedMatch, Match, MatchId, MatchSide};
pub use sigil::Sigil;
pub use token::Token;
pub use vertex::{branch_paths_overlap, BranchPath, TokenVertex, VertexId, VertexKind};
pub use witness::VariantWitnessGraph;
