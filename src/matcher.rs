//! Potential match discovery across witnesses.
//!
//! For every unordered pair of witnesses, every pair of non-sentinel
//! vertices is tested for equivalence; each hit becomes a [`Match`]
//! annotated with both witnesses' ranks, and each pair additionally gets a
//! synthesized match between its end sentinels so that every witness pair
//! has at least one match bounding the selection search.
//!
//! Complexity is O(N² · V²) over N witnesses of V vertices. That is the
//! known scalability ceiling of this matcher; downstream consumers assert
//! exact match sets and counts, so the asymptotics are part of the
//! contract, not an implementation detail to optimize away.

use std::collections::BTreeSet;
use tracing::debug;

use crate::error::CollateError;
use crate::ranking::Ranking;
use crate::traversal::topological_order;
use crate::types::matching::{Match, MatchSide};
use crate::types::sigil::Sigil;
use crate::types::token::Token;
use crate::types::vertex::VertexId;
use crate::types::witness::VariantWitnessGraph;

/// Token equivalence, per the matching contract:
///
/// - both normalized contents non-empty: equal iff normalized contents are
///   equal (case- and whitespace-insensitive content match);
/// - both milestones: equal iff their immediate structural parent tag
///   matches;
/// - otherwise: equal iff raw contents are equal (conservative fallback).
pub fn tokens_match(a: &Token, b: &Token) -> bool {
    if !a.normalized().is_empty() && !b.normalized().is_empty() {
        a.normalized() == b.normalized()
    } else if a.is_milestone() && b.is_milestone() {
        a.parent_tag() == b.parent_tag()
    } else {
        a.raw() == b.raw()
    }
}

/// The universe of potential matches over a witness set.
#[derive(Debug, Clone)]
pub struct PotentialMatches {
    matches: Vec<Match>,
}

impl PotentialMatches {
    /// All matches, in discovery order.
    pub fn all(&self) -> &[Match] {
        &self.matches
    }

    /// Number of discovered matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether no matches were discovered.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The matches involving one witness, sorted by that witness's rank,
    /// ties broken by the lowest rank among the match's other participating
    /// witnesses, then by discovery order.
    ///
    /// The selection search explores neighbors in this order; its result
    /// determinism depends on this sort being reproducible.
    pub fn sorted_for_witness(&self, sigil: &Sigil) -> Vec<&Match> {
        let mut view: Vec<(usize, &Match)> = self
            .matches
            .iter()
            .enumerate()
            .filter(|(_, m)| m.involves(sigil))
            .collect();
        view.sort_by_key(|(discovery, m)| {
            let own_rank = m.side(sigil).map(|s| s.rank).unwrap_or(u32::MAX);
            let other_rank = m
                .lowest_rank_for_witnesses_other_than(sigil)
                .unwrap_or(u32::MAX);
            (own_rank, other_rank, *discovery)
        });
        view.into_iter().map(|(_, m)| m).collect()
    }
}

/// Discover all potential matches between every pair of witnesses.
pub fn find_potential_matches(
    witnesses: &[VariantWitnessGraph],
) -> Result<PotentialMatches, CollateError> {
    let rankings = witnesses
        .iter()
        .map(Ranking::of_witness)
        .collect::<Result<Vec<_>, _>>()?;
    let orders = witnesses
        .iter()
        .map(topological_order)
        .collect::<Result<Vec<_>, _>>()?;

    let mut matches: Vec<Match> = Vec::new();
    let mut seen: BTreeSet<Vec<(Sigil, VertexId)>> = BTreeSet::new();
    let mut push = |m: Match| {
        let key: Vec<(Sigil, VertexId)> = m
            .sides()
            .map(|(s, side)| (s.clone(), side.vertex))
            .collect();
        if seen.insert(key) {
            matches.push(m);
        }
    };

    for i in 0..witnesses.len() {
        for j in (i + 1)..witnesses.len() {
            let (wa, wb) = (&witnesses[i], &witnesses[j]);
            for &va in &orders[i] {
                let Some(ta) = wa.vertex(va).token() else {
                    continue;
                };
                for &vb in &orders[j] {
                    let Some(tb) = wb.vertex(vb).token() else {
                        continue;
                    };
                    if tokens_match(ta, tb) {
                        push(Match::between(
                            wa.sigil().clone(),
                            MatchSide {
                                vertex: va,
                                rank: rankings[i].apply(va),
                                branch_path: wa.vertex(va).branch_path.clone(),
                            },
                            wb.sigil().clone(),
                            MatchSide {
                                vertex: vb,
                                rank: rankings[j].apply(vb),
                                branch_path: wb.vertex(vb).branch_path.clone(),
                            },
                        ));
                    }
                }
            }
            // Every witness pair matches at its end sentinels; this bounds
            // the selection search space from below.
            push(Match::between(
                wa.sigil().clone(),
                MatchSide {
                    vertex: wa.end(),
                    rank: rankings[i].apply(wa.end()),
                    branch_path: wa.vertex(wa.end()).branch_path.clone(),
                },
                wb.sigil().clone(),
                MatchSide {
                    vertex: wb.end(),
                    rank: rankings[j].apply(wb.end()),
                    branch_path: wb.vertex(wb.end()).branch_path.clone(),
                },
            ));
        }
    }

    debug!(
        witnesses = witnesses.len(),
        matches = matches.len(),
        "potential match discovery complete"
    );
    Ok(PotentialMatches { matches })
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_tokens_match_normalized() {
        let a = Token::new(Sigil::from("A"), "The ", 0, vec![]);
        let b = Token::new(Sigil::from("B"), "the", 0, vec![]);
        assert!(tokens_match(&a, &b));
    }

    #[test]
    fn test_tokens_match_milestone_by_parent_tag() {
        let a = Token::new(Sigil::from("A"), "", 0, vec!["xml".into(), "lb".into()]);
        let b = Token::new(Sigil::from("B"), "", 0, vec!["xml".into(), "lb".into()]);
        let c = Token::new(Sigil::from("B"), "", 0, vec!["xml".into(), "pb".into()]);
        assert!(tokens_match(&a, &b));
        assert!(!tokens_match(&a, &c));
    }

    #[test]
    fn test_tokens_no_match_across_kinds() {
        let milestone = Token::new(Sigil::from("A"), "", 0, vec!["lb".into()]);
        let word = Token::new(Sigil::from("B"), "word ", 0, vec![]);
        assert!(!tokens_match(&milestone, &word));
    }

    #[test]
    fn test_end_sentinel_match_always_present() {
        let a = linear_witness("A", &["x "]);
        let b = linear_witness("B", &["y "]);
        let potential = find_potential_matches(&[a, b]).unwrap();
        // No content in common: only the end-sentinel match.
        assert_eq!(potential.len(), 1);
    }

    #[test]
    fn test_repeated_content_matches_all_pairs() {
        let a = linear_witness("A", &["b ", "b "]);
        let b = linear_witness("B", &["b "]);
        let potential = find_potential_matches(&[a, b]).unwrap();
        // 2 x 1 content matches + end match.
        assert_eq!(potential.len(), 3);
    }

    #[test]
    fn test_sorted_view_rank_then_other_rank() {
        let a = linear_witness("A", &["x ", "y "]);
        let b = linear_witness("B", &["y ", "x "]);
        let potential = find_potential_matches(&[a, b]).unwrap();
        let view = potential.sorted_for_witness(&Sigil::from("A"));
        // A's "x" (rank 1) before A's "y" (rank 2), end match last.
        assert_eq!(view.len(), 3);
        assert_eq!(view[0].side(&Sigil::from("A")).unwrap().rank, 1);
        assert_eq!(view[1].side(&Sigil::from("A")).unwrap().rank, 2);
    }

    #[test]
    fn test_three_witness_union() {
        let a = linear_witness("A", &["w "]);
        let b = linear_witness("B", &["w "]);
        let c = linear_witness("C", &["w "]);
        let potential = find_potential_matches(&[a, b, c]).unwrap();
        // Three pairs, each with one content match and one end match.
        assert_eq!(potential.len(), 6);
    }
}
