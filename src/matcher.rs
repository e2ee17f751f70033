//! Answer matching for incoming chat guesses.
//!
//! Two passes: exact containment first, then fuzzy similarity gated by a
//! caller-supplied threshold. Personal and competition rounds use different
//! thresholds (see [`crate::types`]); that asymmetry is deliberate.

use strsim::jaro_winkler;

/// A successful match of a guess against one of the accepted answers.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessMatch {
    /// The accepted answer (canonical spelling) the guess matched.
    pub answer: String,
    /// Whether the match came from the exact containment pass.
    pub exact: bool,
    /// Similarity score in [0, 1]; 1.0 for exact matches.
    pub score: f64,
}

/// Decide whether `raw` is a correct guess for any of `accepted`.
///
/// Both sides are lowercased and trimmed. The exact pass accepts the guess
/// when it contains an accepted answer as a substring, so "the big one"
/// matches "big one" without the threshold ever being consulted. Only when
/// no containment is found does the fuzzy pass run: the highest Jaro-Winkler
/// score across the accepted answers is compared against `threshold`, and a
/// score exactly at the threshold still counts.
///
/// Empty or whitespace-only guesses never match; empty accepted entries are
/// skipped, so a target without an alias works fine.
pub fn match_guess(raw: &str, accepted: &[&str], threshold: f64) -> Option<GuessMatch> {
    let guess = raw.trim().to_lowercase();
    if guess.is_empty() {
        return None;
    }

    let candidates: Vec<(String, &str)> = accepted
        .iter()
        .filter_map(|a| {
            let norm = a.trim().to_lowercase();
            if norm.is_empty() {
                None
            } else {
                Some((norm, *a))
            }
        })
        .collect();

    // Exact pass: containment identifies the answer on its own.
    for (norm, original) in &candidates {
        if guess.contains(norm.as_str()) {
            return Some(GuessMatch {
                answer: (*original).to_string(),
                exact: true,
                score: 1.0,
            });
        }
    }

    // Fuzzy pass: best-scoring accepted answer, gated by the threshold.
    let mut best: Option<(f64, &str)> = None;
    for (norm, original) in &candidates {
        let score = jaro_winkler(&guess, norm);
        if best.map_or(true, |(b, _)| score > b) {
            best = Some((score, *original));
        }
    }

    match best {
        Some((score, original)) if score >= threshold => Some(GuessMatch {
            answer: original.to_string(),
            exact: false,
            score,
        }),
        _ => None,
    }
}
