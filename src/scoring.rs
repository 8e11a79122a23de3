//! Relevance scoring between a store key and a query.
//!
//! Single terms score on a 0..=100 scale:
//!
//! | rule                      | score                          |
//! |---------------------------|--------------------------------|
//! | key equals term           | 100                            |
//! | key starts with term      | 80                             |
//! | key contains term         | 60                             |
//! | shared leading characters | `common * 50 / term_len`       |
//! | nothing shared            | 0                              |
//!
//! A query containing `+` is compound: every sub-term is scored on its own
//! and the best one counts double, topped up by the average of the rest.

use serde::Serialize;

pub const EXACT_SCORE: u32 = 100;
pub const PREFIX_SCORE: u32 = 80;
pub const CONTAINS_SCORE: u32 = 60;
/// Ceiling for a partial leading-character match.
pub const PARTIAL_SCORE: u32 = 50;

/// Separator between the sub-terms of a compound query.
pub const TERM_SEPARATOR: char = '+';

/// Score one key against one term, ignoring case.
///
/// # Examples
///
/// ```
/// use keymatch::scoring::score_term;
///
/// assert_eq!(score_term("apple", "APPLE"), 100);
/// assert_eq!(score_term("APPLEPIE", "apple"), 80);
/// assert_eq!(score_term("PINEAPPLE", "APPLE"), 60);
/// assert_eq!(score_term("APRON", "APPLE"), 20);
/// ```
pub fn score_term(key: &str, term: &str) -> u32 {
    score_upper(&key.to_uppercase(), &term.to_uppercase())
}

/// Score an already-uppercased key against an already-uppercased term.
fn score_upper(key: &str, term: &str) -> u32 {
    if key == term {
        return EXACT_SCORE;
    }
    if key.starts_with(term) {
        return PREFIX_SCORE;
    }
    if key.contains(term) {
        return CONTAINS_SCORE;
    }

    let common = term
        .chars()
        .zip(key.chars())
        .take_while(|(t, k)| t == k)
        .count();
    if common == 0 {
        return 0;
    }

    // Exact floor of common / term_len * 50.
    let term_len = term.chars().count();
    (common * PARTIAL_SCORE as usize / term_len) as u32
}

/// Whether the query is made of several `+`-joined terms.
pub fn is_compound(query: &str) -> bool {
    query.contains(TERM_SEPARATOR)
}

/// Split a compound query into its trimmed, non-empty, uppercased terms.
pub fn split_terms(query: &str) -> Vec<String> {
    query
        .to_uppercase()
        .split(TERM_SEPARATOR)
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// Score a key against a full query, compound or not.
///
/// ```
/// use keymatch::scoring::score_query;
///
/// // "APP" is a prefix (80), "PIE" is contained (60): 80 * 2 + 60
/// assert_eq!(score_query("APPLEPIE", "app+pie"), 220);
/// assert_eq!(score_query("APPLEPIE", "kiwi+lime"), 0);
/// ```
pub fn score_query(key: &str, query: &str) -> u32 {
    let key = key.to_uppercase();
    if !is_compound(query) {
        return score_upper(&key, &query.to_uppercase());
    }

    let scores: Vec<u32> = split_terms(query)
        .iter()
        .map(|term| score_upper(&key, term))
        .collect();
    Aggregate::from_scores(&scores).total
}

/// Combined view of a compound query's per-term scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    /// First occurrence of the maximal term score.
    pub highest: u32,
    /// Integer average of every other term score.
    pub other_average: u32,
    /// Number of terms scoring above zero.
    pub matched: usize,
    pub total: u32,
}

impl Aggregate {
    /// Fold per-term scores, in query order, into one score.
    ///
    /// Only a strictly greater score displaces the running highest, so a
    /// later term tying the maximum is averaged with the others instead.
    pub fn from_scores(scores: &[u32]) -> Self {
        let matched = scores.iter().filter(|&&s| s > 0).count();
        if matched == 0 {
            return Self::default();
        }

        let mut highest = 0;
        let mut other_total = 0;
        for &score in scores {
            if score > highest {
                other_total += highest;
                highest = score;
            } else {
                other_total += score;
            }
        }

        let other_average = if matched > 1 {
            other_total / (matched as u32 - 1)
        } else {
            0
        };

        Self {
            highest,
            other_average,
            matched,
            total: highest * 2 + other_average,
        }
    }
}

/// Score of a single term within a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermScore {
    pub term: String,
    pub score: u32,
}

/// How a key's score against a query was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub key: String,
    pub query: String,
    pub compound: bool,
    pub terms: Vec<TermScore>,
    /// Present for compound queries only.
    pub aggregate: Option<Aggregate>,
    pub total: u32,
}

/// Score a key against a query and keep every intermediate value.
///
/// `explain(key, query).total` always equals `score_query(key, query)`.
pub fn explain(key: &str, query: &str) -> ScoreBreakdown {
    let key_upper = key.to_uppercase();
    let compound = is_compound(query);

    let raw_terms = if compound {
        split_terms(query)
    } else {
        vec![query.to_uppercase()]
    };
    let terms: Vec<TermScore> = raw_terms
        .into_iter()
        .map(|term| TermScore {
            score: score_upper(&key_upper, &term),
            term,
        })
        .collect();

    let (aggregate, total) = if compound {
        let scores: Vec<u32> = terms.iter().map(|t| t.score).collect();
        let aggregate = Aggregate::from_scores(&scores);
        (Some(aggregate), aggregate.total)
    } else {
        (None, terms[0].score)
    };

    ScoreBreakdown {
        key: key.to_string(),
        query: query.to_string(),
        compound,
        terms,
        aggregate,
        total,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn exact_match_scores_100() {
        assert_eq!(score_term("APPLE", "APPLE"), 100);
    }

    #[test]
    fn prefix_match_scores_80() {
        assert_eq!(score_term("APPLEPIE", "APPLE"), 80);
    }

    #[test]
    fn contains_match_scores_60() {
        assert_eq!(score_term("PINEAPPLE", "APPLE"), 60);
    }

    #[test]
    fn partial_prefix_is_proportional() {
        // "AP" shared, term length 5: floor(2 / 5 * 50)
        assert_eq!(score_term("APRON", "APPLE"), 20);
        // "A" shared, term length 3: floor(16.66)
        assert_eq!(score_term("AXE", "ABC"), 16);
    }

    #[test]
    fn partial_prefix_stops_at_shorter_string() {
        // key is a strict prefix of the term
        assert_eq!(score_term("APP", "APPLE"), 30);
    }

    #[test]
    fn partial_score_is_exact_floor() {
        // 29 / 50 * 50 in floating point truncates to 28
        let key = "A".repeat(29);
        let term = "A".repeat(50);
        assert_eq!(score_term(&key, &term), 29);
    }

    #[test]
    fn no_common_prefix_scores_zero() {
        assert_eq!(score_term("BANANA", "APPLE"), 0);
    }

    #[test]
    fn scoring_ignores_case() {
        assert_eq!(score_term("apple", "ApPlE"), 100);
        assert_eq!(score_term("Pineapple", "apple"), 60);
    }

    #[test]
    fn rules_apply_in_order() {
        // "AA" is both a prefix and contained later on; prefix wins
        assert_eq!(score_term("AAXAA", "AA"), 80);
    }

    #[test]
    fn single_term_query_is_not_trimmed() {
        assert_eq!(score_query("APPLE", "apple"), 100);
        assert_eq!(score_query("APPLE", " apple"), 0);
    }

    #[test]
    fn compound_query_weights_the_strongest_term() {
        assert_eq!(score_query("APPLEPIE", "APP+PIE"), 220);
    }

    #[test]
    fn compound_query_trims_terms() {
        assert_eq!(score_query("APPLEPIE", " app + pie "), 220);
    }

    #[test]
    fn compound_query_without_matches_scores_zero() {
        assert_eq!(score_query("APPLEPIE", "KIWI+LIME"), 0);
    }

    #[test]
    fn compound_query_ignores_empty_terms() {
        assert_eq!(score_query("APPLEPIE", "APP++PIE+"), 220);
        assert_eq!(score_query("APPLEPIE", "+"), 0);
    }

    #[test]
    fn single_matching_term_has_no_average() {
        // only "APPLEPIE" matches: 100 * 2, other average skipped
        assert_eq!(score_query("APPLEPIE", "APPLEPIE+KIWI"), 200);
    }

    #[test]
    fn tied_maximum_counts_as_other() {
        let agg = Aggregate::from_scores(&[80, 80, 60]);
        assert_eq!(agg.highest, 80);
        // 80 and 60 are "other": (80 + 60) / 2
        assert_eq!(agg.other_average, 70);
        assert_eq!(agg.total, 230);
    }

    #[test]
    fn later_higher_score_demotes_previous_highest() {
        let agg = Aggregate::from_scores(&[20, 100, 60]);
        assert_eq!(agg.highest, 100);
        assert_eq!(agg.other_average, 40);
        assert_eq!(agg.total, 240);
    }

    #[test]
    fn zero_scores_count_in_total_but_not_divisor() {
        // matched = 2, other total = 0 + 20
        let agg = Aggregate::from_scores(&[0, 60, 20]);
        assert_eq!(agg.matched, 2);
        assert_eq!(agg.other_average, 20);
        assert_eq!(agg.total, 140);
    }

    #[test]
    fn average_truncates() {
        // (60 + 25) / 2
        let agg = Aggregate::from_scores(&[100, 60, 25]);
        assert_eq!(agg.other_average, 42);
        assert_eq!(agg.total, 242);
    }

    #[test]
    fn explain_single_term() {
        let breakdown = explain("Pineapple", "apple");
        assert!(!breakdown.compound);
        assert_eq!(
            breakdown.terms,
            vec![TermScore {
                term: "APPLE".to_string(),
                score: 60,
            }]
        );
        assert_eq!(breakdown.aggregate, None);
        assert_eq!(breakdown.total, 60);
    }

    #[test]
    fn explain_compound_query() {
        let breakdown = explain("APPLEPIE", "app + pie");
        assert!(breakdown.compound);
        let terms: Vec<(&str, u32)> = breakdown
            .terms
            .iter()
            .map(|t| (t.term.as_str(), t.score))
            .collect();
        assert_eq!(terms, vec![("APP", 80), ("PIE", 60)]);
        let agg = breakdown.aggregate.unwrap();
        assert_eq!((agg.highest, agg.other_average, agg.matched), (80, 60, 2));
        assert_eq!(breakdown.total, 220);
    }

    proptest! {
        #[test]
        fn single_term_scores_are_bounded(
            key in "[A-Z]{0,12}",
            term in "[A-Z]{1,12}",
        ) {
            prop_assert!(score_term(&key, &term) <= EXACT_SCORE);
        }

        #[test]
        fn compound_scores_are_bounded(
            key in "[A-Z]{0,12}",
            terms in proptest::collection::vec("[A-Z]{1,6}", 1..5),
        ) {
            let query = terms.join("+");
            prop_assert!(score_query(&key, &query) <= 3 * EXACT_SCORE);
        }

        #[test]
        fn explain_agrees_with_score_query(
            key in "[A-Z]{0,12}",
            query in "[A-Z+ ]{1,16}",
        ) {
            prop_assert_eq!(
                explain(&key, &query).total,
                score_query(&key, &query)
            );
        }
    }
}
