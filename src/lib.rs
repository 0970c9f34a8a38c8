//! # collation-kernel
//!
//! Deterministic alignment of variant text witnesses into collation graphs.
//!
//! A witness is one transcription of a source text, itself a DAG because of
//! textual variation (insertions, deletions, substitutions). The kernel
//! answers one question:
//!
//! > Given several witnesses of the same text, where do they agree and
//! > where do they diverge?
//!
//! ## Core Contract
//!
//! 1. Import each witness into a [`VariantWitnessGraph`] (token DAG with
//!    start/end sentinels and branch paths for nested variation)
//! 2. Discover every candidate cross-witness match, rank-annotated
//! 3. Select the optimal consistent match subset per witness with a
//!    best-first search
//! 4. Fold each witness into one [`CollationGraph`] whose nodes hold the
//!    agreeing tokens and whose edges carry witness sigil sets
//!
//! ## Architecture
//!
//! ```text
//! XML source → Importer → VariantWitnessGraph (one per witness)
//!                              ↓
//!                  Ranking + Traversal → Matcher (all witness pairs)
//!                              ↓
//!              Selector (best-first search, per witness merge)
//!                              ↓
//!              Collator → CollationGraph → join pass → export/dot
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same witnesses + same order + same config → identical graph
//!   fingerprint, export, and dot output
//! - Every map keyed on graph identity is a `BTreeMap` over dense arena
//!   indices; every tie-break is total and documented
//! - Collation runs to completion on the calling thread: witnesses merge
//!   strictly sequentially and the graph is immutable once `collate`
//!   returns

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod collator;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod joiner;
pub mod matcher;
pub mod normalize;
pub mod ranking;
pub mod selector;
pub mod traversal;
pub mod types;

// Re-exports
pub use types::{
    branch_paths_overlap, BranchPath, CollatedMatch, CollationEdge, CollationGraph, CollationNode,
    EdgeId, Markup,
    MarkupId, MarkupNode, MarkupNodeId, Match, MatchId, MatchSide, NodeId, Sigil, Token,
    TokenVertex, VariantWitnessGraph, VertexId, VertexKind,
};

pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use collator::Collator;
pub use config::CollatorConfig;
pub use error::CollateError;
pub use export::dot::to_dot;
pub use export::CollationGraphExport;
pub use import::{import_witness, ImportError};
pub use joiner::join;
pub use matcher::{find_potential_matches, tokens_match, PotentialMatches};
pub use normalize::{normalize_token, NORMALIZATION_VERSION};
pub use ranking::Ranking;
pub use selector::select_optimal_matches;
pub use selector::state::QuantumCollatedMatchList;
pub use traversal::topological_order;

/// Schema version for all kernel types.
/// Increment on breaking changes to any exported type.
pub const COLLATION_KERNEL_SCHEMA_VERSION: &str = "1.0.0";

/// Default config version identifier.
pub const DEFAULT_CONFIG_VERSION: &str = "collator_config_v1";
