//! Relevance ranking of items against a whitespace-separated, multi-term query.
//!
//! A single term is answered straight from the matcher. Several terms are
//! matched independently and combined: an item survives only if every term
//! matched it, and the whole query yields nothing as soon as one term matches
//! no item at all.

use crate::index::SearchIndex;
use crate::matcher::{ApproximateMatcher, TermMatch};
use crate::model::{Item, WeightedKey};
use log::debug;
use std::collections::HashMap;

const MIN_MATCH_LEN: usize = 2;

#[derive(Default)]
struct Aggregate {
    position: usize,
    hits: usize,
    score: f64,
}

/// Lower-cased, non-empty query terms.
pub fn terms(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Ranks `items` against `query`.
///
/// `index` must have been built from `items` and `keys`; when it is absent,
/// or visibly built from another list, a throwaway index is built here.
pub fn rank<'a, M>(
    matcher: &mut M,
    items: &'a [Item],
    query: &str,
    keys: &[WeightedKey],
    index: Option<&SearchIndex>,
) -> Vec<&'a Item>
where
    M: ApproximateMatcher + ?Sized,
{
    let terms = terms(query);
    if terms.is_empty() {
        return items.iter().collect();
    }

    let owned;
    let index = match index {
        Some(index) if index.len() == items.len() => index,
        stale => {
            if stale.is_some() {
                debug!("rank: index does not match {} items, rebuilding", items.len());
            }
            owned = SearchIndex::build(items, keys);
            &owned
        }
    };

    if let [term] = terms.as_slice() {
        let min_len = term.chars().count().min(MIN_MATCH_LEN);
        return matcher
            .search(index, term, min_len)
            .into_iter()
            .map(|m| &items[m.item])
            .collect();
    }

    let mut results: HashMap<&str, Aggregate> = HashMap::new();
    let mut term_hits = 0;

    for term in &terms {
        let min_len = term.chars().count().min(MIN_MATCH_LEN);
        let matches = matcher.search(index, term, min_len);
        if matches.is_empty() {
            continue;
        }
        term_hits += 1;

        for m in matches {
            let weight = highest_matched_weight(&m, index);
            let entry = results.entry(items[m.item].id.as_str()).or_insert_with(|| Aggregate {
                position: m.item,
                ..Aggregate::default()
            });
            entry.hits += 1;
            entry.score += (1.0 - m.distance) * weight;
        }
    }

    // One term that finds nothing anywhere voids the whole query
    if term_hits != terms.len() {
        return Vec::new();
    }

    let mut survivors: Vec<Aggregate> = results
        .into_values()
        .filter(|a| a.hits == terms.len())
        .collect();

    // Position first so the score sort below is stable with respect to input order
    survivors.sort_by_key(|a| a.position);
    survivors.sort_by(|a, b| b.score.total_cmp(&a.score));

    survivors.into_iter().map(|a| &items[a.position]).collect()
}

fn highest_matched_weight(m: &TermMatch, index: &SearchIndex) -> f64 {
    m.matched_keys
        .iter()
        .map(|&key| index.weight(key))
        .max_by(f64::total_cmp)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::FuzzyMatcher;
    use crate::model::default_search_keys;

    fn ids(items: &[&Item]) -> Vec<String> {
        items.iter().map(|i| i.id.clone()).collect()
    }

    fn lights() -> Vec<Item> {
        vec![
            Item::new("a1", "Kitchen Light"),
            Item::new("a2", "Living Room Light"),
            Item::new("a3", "Kitchen Fan"),
        ]
    }

    fn run(items: &[Item], query: &str) -> Vec<String> {
        let keys = default_search_keys();
        ids(&rank(&mut FuzzyMatcher::new(), items, query, &keys, None))
    }

    #[test]
    fn two_terms_intersect() {
        assert_eq!(run(&lights(), "kitchen light"), vec!["a1"]);
    }

    #[test]
    fn term_order_does_not_matter() {
        let items = lights();
        let keys = default_search_keys();
        let mut matcher = FuzzyMatcher::new();
        let index = SearchIndex::build(&items, &keys);

        let forward = rank(&mut matcher, &items, "kitchen light", &keys, Some(&index));
        let reversed = rank(&mut matcher, &items, "light kitchen", &keys, Some(&index));
        assert_eq!(ids(&forward), ids(&reversed));
    }

    #[test]
    fn unmatched_term_voids_query() {
        // "kitchen" alone matches two items, "zzz" matches none
        assert!(run(&lights(), "kitchen zzz").is_empty());
        assert!(run(&[Item::new("x", "x")], "zzz").is_empty());
    }

    #[test]
    fn empty_query_is_identity() {
        let items = lights();
        assert_eq!(run(&items, ""), vec!["a1", "a2", "a3"]);
        assert_eq!(run(&items, "   \t "), vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn single_term_uses_engine_order() {
        let items = vec![
            Item::new("b", "Bedroom").with_secondary("Light strip"),
            Item::new("a", "Light"),
        ];
        assert_eq!(run(&items, "light"), vec!["a", "b"]);
    }

    #[test]
    fn single_term_membership_matches_aggregation() {
        let items = lights();
        let keys = default_search_keys();
        let mut matcher = FuzzyMatcher::new();
        let index = SearchIndex::build(&items, &keys);

        let mut fast = ids(&rank(&mut matcher, &items, "light", &keys, Some(&index)));
        // Repeating the term takes the aggregation path with the same membership
        let mut slow = ids(&rank(&mut matcher, &items, "light light", &keys, Some(&index)));
        fast.sort();
        slow.sort();
        assert_eq!(fast, slow);
    }

    #[test]
    fn ranking_is_deterministic() {
        let items = lights();
        assert_eq!(run(&items, "li ro"), run(&items, "li ro"));
        assert_eq!(run(&items, "kitchen"), run(&items, "kitchen"));
    }

    #[test]
    fn heavier_key_wins() {
        let keys = vec![WeightedKey::new("primary", 10.0), WeightedKey::new("secondary", 1.0)];
        let items = vec![
            Item::new("weak", "Porch").with_secondary("Garden Lamp"),
            Item::new("strong", "Garden Lamp").with_secondary("Porch"),
        ];
        let ranked = rank(&mut FuzzyMatcher::new(), &items, "garden lamp", &keys, None);
        assert_eq!(ids(&ranked), vec!["strong", "weak"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let items = vec![
            Item::new("1", "Desk Lamp"),
            Item::new("2", "Desk Lamp"),
            Item::new("3", "Desk Lamp"),
        ];
        let keys = vec![WeightedKey::new("primary", 1.0)];
        let ranked = rank(&mut FuzzyMatcher::new(), &items, "desk lamp", &keys, None);
        assert_eq!(ids(&ranked), vec!["1", "2", "3"]);
    }

    #[test]
    fn null_labels_never_match() {
        let mut keys = default_search_keys();
        keys.push(WeightedKey::new("search_labels.alias", 5.0));
        let items = vec![
            Item::new("x", "Sensor").with_label("alias", None),
            Item::new("y", "Sensor").with_label("alias", Some("porch")),
        ];
        let ranked = rank(&mut FuzzyMatcher::new(), &items, "sensor porch", &keys, None);
        assert_eq!(ids(&ranked), vec!["y"]);
    }

    #[test]
    fn empty_keys_match_nothing() {
        let items = lights();
        let ranked = rank(&mut FuzzyMatcher::new(), &items, "kitchen", &[], None);
        assert!(ranked.is_empty());
    }

    #[test]
    fn short_terms_are_not_rejected_for_length() {
        assert_eq!(run(&lights(), "k fan"), vec!["a3"]);
    }

    #[test]
    fn stale_index_is_rebuilt() {
        let items = lights();
        let keys = default_search_keys();
        let stale = SearchIndex::build(&items[..1], &keys);
        let ranked = rank(&mut FuzzyMatcher::new(), &items, "living", &keys, Some(&stale));
        assert_eq!(ids(&ranked), vec!["a2"]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        const WORDS: [&str; 8] = ["kitchen", "light", "living", "room", "fan", "garage", "door", "lamp"];

        fn catalog() -> impl Strategy<Value = Vec<Item>> {
            proptest::collection::vec((0..WORDS.len(), 0..WORDS.len(), proptest::option::of(0..WORDS.len())), 0..12)
                .prop_map(|rows| {
                    rows.into_iter()
                        .enumerate()
                        .map(|(i, (a, b, secondary))| {
                            let item = Item::new(format!("i{i}"), format!("{} {}", WORDS[a], WORDS[b]));
                            match secondary {
                                Some(s) => item.with_secondary(WORDS[s]),
                                None => item,
                            }
                        })
                        .collect()
                })
        }

        fn term() -> impl Strategy<Value = String> {
            (0..WORDS.len(), 2..6usize).prop_map(|(w, len)| WORDS[w].chars().take(len).collect())
        }

        fn id_set(items: &[&Item]) -> BTreeSet<String> {
            items.iter().map(|i| i.id.clone()).collect()
        }

        proptest! {
            #[test]
            fn two_terms_keep_exactly_the_common_matches(items in catalog(), a in term(), b in term()) {
                let keys = default_search_keys();
                let index = SearchIndex::build(&items, &keys);
                let mut matcher = FuzzyMatcher::new();

                let first = id_set(&rank(&mut matcher, &items, &a, &keys, Some(&index)));
                let second = id_set(&rank(&mut matcher, &items, &b, &keys, Some(&index)));
                let both = rank(&mut matcher, &items, &format!("{a} {b}"), &keys, Some(&index));

                let expected: BTreeSet<String> = first.intersection(&second).cloned().collect();
                prop_assert_eq!(id_set(&both), expected);
            }

            #[test]
            fn ranking_repeats_exactly(items in catalog(), a in term(), b in term()) {
                let keys = default_search_keys();
                let query = format!("{a} {b}");
                let once = ids(&rank(&mut FuzzyMatcher::new(), &items, &query, &keys, None));
                let again = ids(&rank(&mut FuzzyMatcher::new(), &items, &query, &keys, None));
                prop_assert_eq!(once, again);
            }

            #[test]
            fn single_term_agrees_with_aggregation(items in catalog(), a in term()) {
                let keys = default_search_keys();
                let mut matcher = FuzzyMatcher::new();
                let fast = id_set(&rank(&mut matcher, &items, &a, &keys, None));
                let slow = id_set(&rank(&mut matcher, &items, &format!("{a} {a}"), &keys, None));
                prop_assert_eq!(fast, slow);
            }
        }
    }
}
