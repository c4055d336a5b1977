use crate::model::{Item, WeightedKey};
use log::debug;
use nucleo_matcher::Utf32String;
use std::sync::Arc;

/// One searchable field of one item, pre-converted for the matcher.
pub struct IndexedField {
    pub key: usize,
    pub text: Utf32String,
}

/// Pre-processed search fields for a fixed `(items, keys)` pair.
///
/// Building walks every key of every item once; rankers reuse the result on
/// every keystroke instead of re-resolving and re-encoding fields.
pub struct SearchIndex {
    fields: Vec<Vec<IndexedField>>,
    weights: Vec<f64>,
    total_weight: f64,
}

impl SearchIndex {
    pub fn build(items: &[Item], keys: &[WeightedKey]) -> Self {
        let fields = items
            .iter()
            .map(|item| {
                keys.iter()
                    .enumerate()
                    .filter_map(|(key, wk)| {
                        item.field(&wk.path).map(|text| IndexedField {
                            key,
                            text: Utf32String::from(text),
                        })
                    })
                    .collect()
            })
            .collect();

        let weights: Vec<f64> = keys.iter().map(|k| k.weight).collect();
        let total_weight = weights.iter().sum();

        Self {
            fields,
            weights,
            total_weight,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self, item: usize) -> &[IndexedField] {
        &self.fields[item]
    }

    pub fn weight(&self, key: usize) -> f64 {
        self.weights[key]
    }

    /// Share of the summed key weight carried by `key`.
    pub fn normalized_weight(&self, key: usize) -> f64 {
        if self.total_weight > 0.0 {
            self.weights[key] / self.total_weight
        } else {
            0.0
        }
    }
}

/// Memoizes one [`SearchIndex`] by identity of the item and key lists.
///
/// Holding the `Arc`s keeps the compared allocations alive, so a fresh list
/// can never reuse the address of the one the index was built from. Mutating
/// a list behind the same `Arc` is not detected.
#[derive(Default)]
pub struct IndexCache {
    source: Option<(Arc<[Item]>, Arc<[WeightedKey]>)>,
    index: Option<Arc<SearchIndex>>,
    builds: usize,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, items: &Arc<[Item]>, keys: &Arc<[WeightedKey]>) -> Arc<SearchIndex> {
        let fresh = match (&self.source, &self.index) {
            (Some((i, k)), Some(index)) if Arc::ptr_eq(i, items) && Arc::ptr_eq(k, keys) => {
                Some(index.clone())
            }
            _ => None,
        };
        if let Some(index) = fresh {
            return index;
        }

        debug!("SearchIndex: building for {} items, {} keys", items.len(), keys.len());
        let index = Arc::new(SearchIndex::build(items, keys));
        self.source = Some((items.clone(), keys.clone()));
        self.index = Some(index.clone());
        self.builds += 1;
        index
    }

    /// How many times an index has been built; used to observe memoization.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn clear(&mut self) {
        self.source = None;
        self.index = None;
    }
}
