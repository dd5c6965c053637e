//! Approximate name matching on character bigrams.
//!
//! Names are lowercased and padded with a space on each side; the score of
//! a pair is the cosine similarity of their bigram count vectors. Equal
//! scores are ordered by Jaro-Winkler similarity.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rapidfuzz::distance::jaro_winkler;

type Profile = BTreeMap<(char, char), f64>;

fn profile(text: &str) -> Profile {
    let padded: Vec<char> = format!(" {} ", text.trim().to_lowercase()).chars().collect();
    let mut counts = Profile::new();
    for pair in padded.windows(2) {
        *counts.entry((pair[0], pair[1])).or_default() += 1.0;
    }
    counts
}

fn norm(profile: &Profile) -> f64 {
    profile.values().map(|v| v * v).sum::<f64>().sqrt()
}

fn cosine(a: &Profile, b: &Profile) -> f64 {
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .filter_map(|(bigram, count)| b.get(bigram).map(|other| count * other))
        .sum();
    dot / denom
}

/// A reference name with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct StrMatch {
    pub reference: String,
    pub score: f64,
}

/// Matches free-text names against a fixed list of reference names.
#[derive(Debug, Clone)]
pub struct StrMatcher {
    references: Vec<(String, Profile)>,
}

impl StrMatcher {
    pub fn new<I, S>(references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let references = references
            .into_iter()
            .map(Into::into)
            .map(|name: String| {
                let p = profile(&name);
                (name, p)
            })
            .collect();
        Self { references }
    }

    /// Similarity of two names in `[0, 1]`.
    pub fn similarity(a: &str, b: &str) -> f64 {
        cosine(&profile(a), &profile(b))
    }

    /// Best matching reference, or `None` when no score reaches `threshold`.
    pub fn best_match(&self, query: &str, threshold: f64) -> Option<StrMatch> {
        let query_profile = profile(query);
        let query_lower = query.trim().to_lowercase();
        let mut best: Option<(f64, f64, &str)> = None;
        for (name, reference) in &self.references {
            let score = cosine(&query_profile, reference);
            if score < threshold {
                continue;
            }
            let tie_break =
                jaro_winkler::similarity(query_lower.chars(), name.to_lowercase().chars());
            let better = match best {
                None => true,
                Some((best_score, best_tie, _)) => match score.total_cmp(&best_score) {
                    Ordering::Greater => true,
                    Ordering::Equal => tie_break > best_tie,
                    Ordering::Less => false,
                },
            };
            if better {
                best = Some((score, tie_break, name));
            }
        }
        best.map(|(score, _, name)| StrMatch {
            reference: name.to_string(),
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> StrMatcher {
        StrMatcher::new(["Sodium", "Potassium", "Glucose (fasting)", "Hemoglobin", "Hematocrit"])
    }

    #[test]
    fn identical_names_score_one() {
        assert!((StrMatcher::similarity("Sodium", "sodium ") - 1.0).abs() < 1e-12);
        assert_eq!(StrMatcher::similarity("", "abc"), 0.0);
    }

    #[test]
    fn finds_closest_reference() {
        let m = matcher();
        let hit = m.best_match("glucose", 0.2).expect("match");
        assert_eq!(hit.reference, "Glucose (fasting)");
        assert!(hit.score > 0.5);
        assert_eq!(m.best_match("hemoglobin_blood", 0.2).expect("match").reference, "Hemoglobin");
    }

    #[test]
    fn threshold_filters_weak_matches() {
        let m = matcher();
        assert!(m.best_match("zzz", 0.2).is_none());
        assert!(m.best_match("sodium", 1.01).is_none());
    }
}
