use std::{collections::HashMap, ops::ControlFlow};

use rayon::prelude::*;
use serde::Serialize;

use crate::{
    error::{Error, Result},
    scoring,
    store::KeyStore,
    terms,
};

/// A validated, non-empty search query.
///
/// Matching is case-insensitive; the query text is kept as typed so that
/// every candidate is scored against exactly what the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
}

impl Query {
    /// Reject an empty query before any store access happens.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::EmptyQuery);
        }
        Ok(Self {
            raw: raw.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Prefixes used to scan the store for this query.
    pub fn probe_terms(&self) -> Vec<String> {
        terms::expand(&self.raw)
    }

    /// Relevance of `key` to this query.
    pub fn score(&self, key: &str) -> u32 {
        scoring::score_query(key, &self.raw)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A record visited by a scan, scored against the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub key: String,
    pub value: String,
    pub score: u32,
}

/// Outcome of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    Found(Candidate),
    NotFound,
}

impl Match {
    pub fn is_found(&self) -> bool {
        matches!(self, Match::Found(_))
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Match::Found(c) => Some(c),
            Match::NotFound => None,
        }
    }
}

/// Best candidate per key, accumulated across all probe scans.
#[derive(Debug, Default)]
pub struct ResultSet {
    entries: HashMap<String, Candidate>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `candidate` if its key is new or it beats the stored score.
    ///
    /// On equal scores the entry seen first stays. Returns whether the
    /// set changed.
    pub fn merge(&mut self, candidate: Candidate) -> bool {
        match self.entries.get(&candidate.key) {
            Some(existing) if existing.score >= candidate.score => false,
            _ => {
                self.entries.insert(candidate.key.clone(), candidate);
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Candidate> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The highest-scoring candidate.
    ///
    /// Equal top scores resolve to the lexicographically smallest key, so
    /// the result does not depend on scan or hashing order.
    pub fn into_best(self) -> Match {
        self.entries
            .into_values()
            .min_by(|a, b| {
                b.score.cmp(&a.score).then_with(|| a.key.cmp(&b.key))
            })
            .map_or(Match::NotFound, Match::Found)
    }
}

/// Scan the store once per probe term and score every visited key.
///
/// Store failures only cost recall: a key whose value cannot be read is
/// skipped, and a probe whose scan fails contributes whatever it visited
/// before failing.
pub fn collect_candidates(store: &dyn KeyStore, query: &Query) -> ResultSet {
    let mut results = ResultSet::new();

    for term in query.probe_terms() {
        let before = results.len();
        let mut visit = |key: &str| -> ControlFlow<()> {
            match store.get(key) {
                Ok(value) => {
                    results.merge(Candidate {
                        key: key.to_string(),
                        score: query.score(key),
                        value,
                    });
                }
                Err(e) => {
                    tracing::debug!(key, error = %e, "skipping unreadable key");
                }
            }
            ControlFlow::Continue(())
        };

        if let Err(e) = store.scan_prefix(&term, &mut visit) {
            tracing::warn!(%term, error = %e, "prefix scan failed");
        }
        tracing::debug!(
            %term,
            new_keys = results.len() - before,
            "probe complete"
        );
    }

    results
}

/// Resolve a query to its single best record.
///
/// # Examples
///
/// ```
/// use keymatch::{
///     search::{self, Match, Query},
///     store::MemoryStore,
/// };
///
/// let store: MemoryStore = [
///     ("APPLE", "img/apple.png"),
///     ("APPLEPIE", "img/applepie.png"),
/// ]
/// .into_iter()
/// .collect();
///
/// let query = Query::parse("applepie").unwrap();
/// match search::search(&store, &query) {
///     Match::Found(best) => assert_eq!(best.value, "img/applepie.png"),
///     Match::NotFound => unreachable!(),
/// }
/// ```
pub fn search(store: &dyn KeyStore, query: &Query) -> Match {
    let best = collect_candidates(store, query).into_best();
    match &best {
        Match::Found(c) => {
            tracing::debug!(
                %query,
                key = %c.key,
                score = c.score,
                "best match"
            );
        }
        Match::NotFound => tracing::debug!(%query, "no match"),
    }
    best
}

/// Resolve many queries in parallel, one independent search each.
///
/// Results are returned in the order of `queries`.
pub fn search_batch(store: &dyn KeyStore, queries: &[Query]) -> Vec<Match> {
    queries.par_iter().map(|q| search(store, q)).collect()
}

/// Serializable summary of one search, used for JSON output.
#[derive(Debug, Serialize)]
pub struct MatchReport<'a> {
    pub query: &'a str,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl<'a> MatchReport<'a> {
    pub fn new(query: &'a Query, outcome: &'a Match) -> Self {
        let best = outcome.candidate();
        Self {
            query: query.as_str(),
            found: best.is_some(),
            key: best.map(|c| c.key.as_str()),
            value: best.map(|c| c.value.as_str()),
            score: best.map(|c| c.score),
        }
    }
}

/// Format a search outcome for human-readable terminal output.
pub fn format_human(outcome: &Match) -> String {
    match outcome {
        Match::Found(c) => format!("[{}] {}\n     {}", c.score, c.key, c.value),
        Match::NotFound => "No match found.".to_string(),
    }
}

/// Format a search outcome as a single JSON object.
pub fn format_json(query: &Query, outcome: &Match) -> Result<String> {
    Ok(serde_json::to_string(&MatchReport::new(query, outcome))?)
}
