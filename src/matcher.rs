use crate::index::SearchIndex;
use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Matcher, Utf32Str};

/// Floor for a perfect field match so the weighted product stays informative.
const EPSILON: f64 = f64::EPSILON;

pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// One item's match for one term.
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
    /// Position of the item in the indexed list.
    pub item: usize,
    /// Normalized dissimilarity in `[0, 1]`, 0 being exact.
    pub distance: f64,
    /// Keys whose field matched the term.
    pub matched_keys: Vec<usize>,
}

/// Approximate string search over a [`SearchIndex`].
///
/// Implementations return matches in their own relevance order (best first).
pub trait ApproximateMatcher {
    fn search(&mut self, index: &SearchIndex, term: &str, min_match_len: usize) -> Vec<TermMatch>;
}

pub struct FuzzyMatcher {
    matcher: Matcher,
    threshold: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }

    /// `threshold` is the largest per-field distance still counted as a match.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl ApproximateMatcher for FuzzyMatcher {
    fn search(&mut self, index: &SearchIndex, term: &str, min_match_len: usize) -> Vec<TermMatch> {
        if index.is_empty() {
            return Vec::new();
        }
        let atom = Atom::new(term, CaseMatching::Ignore, Normalization::Smart, AtomKind::Fuzzy, false);

        let mut buf = Vec::new();
        // The term scored against itself is the best any field can do
        let perfect = atom
            .score(Utf32Str::new(term, &mut buf), &mut self.matcher)
            .unwrap_or(0)
            .max(1) as f64;

        let mut indices = Vec::new();
        let mut matches = Vec::new();

        for item in 0..index.len() {
            let mut matched_keys = Vec::new();
            let mut distance = 1.0;

            for field in index.fields(item) {
                indices.clear();
                let Some(score) = atom.indices(field.text.slice(..), &mut self.matcher, &mut indices) else {
                    continue;
                };
                if longest_run(&mut indices) < min_match_len {
                    continue;
                }
                let field_distance = (1.0 - score as f64 / perfect).clamp(0.0, 1.0);
                if field_distance > self.threshold {
                    continue;
                }
                distance *= field_distance.max(EPSILON).powf(index.normalized_weight(field.key));
                matched_keys.push(field.key);
            }

            if !matched_keys.is_empty() {
                matches.push(TermMatch {
                    item,
                    distance,
                    matched_keys,
                });
            }
        }

        // Stable: equal distances keep index order
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches
    }
}

/// Length of the longest run of consecutive matched positions.
fn longest_run(indices: &mut [u32]) -> usize {
    indices.sort_unstable();
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<u32> = None;
    for &i in indices.iter() {
        run = match prev {
            Some(p) if i == p + 1 => run + 1,
            Some(p) if i == p => run,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(i);
    }
    best
}
