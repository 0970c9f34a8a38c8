//! Optimal match selection.
//!
//! Given the collated potential matches for one witness against the current
//! collation graph, pick a maximal, mutually-consistent subset. The
//! combinatorial space of consistent match sets is explored with a
//! best-first graph search over [`QuantumCollatedMatchList`] states:
//!
//! - g-cost: "lost potential" so far — how many matches have been
//!   permanently lost relative to the starting potential;
//! - edge cost: the absolute change in (chosen + potential) size;
//! - heuristic: the state's own sunk loss, mirrored. Loss never decreases
//!   along a path, so the sunk loss is a lower bound on total path cost and
//!   the search pops states in lost-potential order: the first determined
//!   state popped is loss-minimal. (A remaining-potential estimate would
//!   reward early commitment and let a cheap-looking transposition beat a
//!   longer, lossless alignment.)
//! - neighbors: the earliest still-potential match under two independent
//!   total orders — graph-rank-major and witness-rank-major — each branched
//!   on "choose" vs "discard". Branching on every candidate would explode
//!   combinatorially; two probe points bound the branching factor at four
//!   while still guaranteeing progress toward a determined state.
//!
//! All orderings break ties by discovery order, so repeated runs on the
//! same input walk the identical search tree.

pub mod state;

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, trace};

use crate::error::CollateError;
use crate::types::matching::{CollatedMatch, MatchId};
use crate::types::sigil::Sigil;
use self::state::QuantumCollatedMatchList;

/// Open-set entry: f-cost ordered, ties broken by insertion sequence.
#[derive(Debug)]
struct OpenEntry {
    f: usize,
    seq: u64,
    state_index: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.seq == other.seq
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: invert so the lowest f (then the
        // earliest insertion) pops first.
        match self.f.cmp(&other.f) {
            Ordering::Equal => self.seq.cmp(&other.seq).reverse(),
            ord => ord.reverse(),
        }
    }
}

/// The earliest potential match under (node rank, witness rank, id).
fn first_by_node_rank(potential: &[CollatedMatch]) -> Option<MatchId> {
    potential
        .iter()
        .min_by_key(|m| (m.node_rank, m.witness_rank, m.id))
        .map(|m| m.id)
}

/// The earliest potential match under (witness rank, node rank, id).
fn first_by_witness_rank(potential: &[CollatedMatch]) -> Option<MatchId> {
    potential
        .iter()
        .min_by_key(|m| (m.witness_rank, m.node_rank, m.id))
        .map(|m| m.id)
}

/// Run the selection search and return the goal state's chosen matches,
/// sorted by witness rank (the order the merge walks them in).
///
/// The search space is finite and the discard-everything path always
/// reaches a determined state, so an exhausted open set is an internal
/// invariant violation, surfaced as [`CollateError::SearchExhausted`] —
/// never a silent partial result.
pub fn select_optimal_matches(
    sigil: &Sigil,
    matches: Vec<CollatedMatch>,
) -> Result<Vec<CollatedMatch>, CollateError> {
    let start = QuantumCollatedMatchList::new(matches);
    let start_total = start.total_size();

    let mut states: Vec<QuantumCollatedMatchList> = Vec::new();
    let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
    let mut closed: HashSet<state::StateKey> = HashSet::new();
    let mut seq: u64 = 0;
    let mut expanded: u64 = 0;

    states.push(start);
    open.push(OpenEntry {
        f: 0,
        seq,
        state_index: 0,
    });

    while let Some(entry) = open.pop() {
        let current = states[entry.state_index].clone();
        if current.is_determined() {
            let mut chosen = current.chosen().to_vec();
            chosen.sort_by_key(|m| (m.witness_rank, m.node_rank, m.id));
            debug!(
                witness = %sigil,
                chosen = chosen.len(),
                lost = start_total - chosen.len(),
                expanded,
                "match selection complete"
            );
            return Ok(chosen);
        }
        if !closed.insert(current.key()) {
            continue;
        }
        expanded += 1;

        let mut probes: Vec<MatchId> = Vec::with_capacity(2);
        if let Some(id) = first_by_node_rank(current.potential()) {
            probes.push(id);
        }
        if let Some(id) = first_by_witness_rank(current.potential()) {
            if !probes.contains(&id) {
                probes.push(id);
            }
        }

        for id in probes {
            for neighbor in [current.choose_match(id), current.discard_match(id)] {
                if closed.contains(&neighbor.key()) {
                    continue;
                }
                let g = start_total - neighbor.total_size();
                // Mirrored-loss heuristic: h == g, see module docs.
                let f = g + g;
                seq += 1;
                trace!(witness = %sigil, f, g, "push search state");
                states.push(neighbor);
                open.push(OpenEntry {
                    f,
                    seq,
                    state_index: states.len() - 1,
                });
            }
        }
    }

    Err(CollateError::SearchExhausted {
        sigil: sigil.clone(),
    })
}
