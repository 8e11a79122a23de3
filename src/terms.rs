//! Probe term expansion.
//!
//! A query is widened into up to three uppercase prefixes (roughly 30%,
//! 60% and 100% of its length). Each prefix drives one prefix scan, so a
//! query with a typo near its end still reaches keys that share its head.
//! Probe terms only decide which keys are visited; relevance is always
//! scored against the original query.

/// Queries this short (in chars) are probed as-is.
pub const SHORT_QUERY_LEN: usize = 3;

/// Expand a query into its probe terms.
///
/// The result is never empty for a non-empty query, every term is
/// uppercase, lengths are strictly increasing and the last term is the
/// whole uppercased query.
///
/// # Examples
///
/// ```
/// use keymatch::terms::expand;
///
/// assert_eq!(expand("pie"), vec!["PIE"]);
/// assert_eq!(expand("pineapple"), vec!["PI", "PINEA", "PINEAPPLE"]);
/// ```
pub fn expand(query: &str) -> Vec<String> {
    let upper = query.to_uppercase();
    let len = upper.chars().count();
    if len <= SHORT_QUERY_LEN {
        return vec![upper];
    }

    let mut terms = Vec::with_capacity(3);

    // floor(0.3 * len), at least one char
    let first_cut = (len * 3 / 10).max(1);
    terms.push(char_prefix(&upper, first_cut).to_string());

    // floor(0.6 * len)
    let second_cut = len * 6 / 10;
    if second_cut > first_cut {
        terms.push(char_prefix(&upper, second_cut).to_string());
    }

    terms.push(upper);
    terms
}

/// The first `n` chars of `s`, or all of `s` if it is shorter.
fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
