use crate::model::{Item, VirtualEntry};
use std::sync::Arc;

/// A materialized candidate snapshot. Returning the same `Arc` for an
/// unchanged list lets the picker reuse its search index.
pub type Candidates = Arc<[VirtualEntry]>;

pub trait CandidateProvider {
    /// `None` while the candidates are still loading.
    fn get_items(&self, query: Option<&str>, section: Option<&str>) -> Option<Candidates>;

    /// Synthetic suggestions for the current query, e.g. "create new …".
    fn get_additional_items(&self, _query: Option<&str>) -> Vec<Item> {
        Vec::new()
    }
}

pub mod json;
pub mod list;
