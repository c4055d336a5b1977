use crate::model::{Item, VirtualEntry};
use crate::sources::{CandidateProvider, Candidates};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Id prefix of the "create new" suggestion.
pub const CREATE_ID_PREFIX: &str = "___create___:";

/// An in-memory candidate list, optionally partitioned into sections.
///
/// Snapshots are built once, so repeated lookups hand out the same `Arc`.
pub struct ListSource {
    all: Candidates,
    sections: HashMap<String, Candidates>,
    create_label: Option<String>,
}

impl ListSource {
    pub fn new(entries: Vec<VirtualEntry>) -> Self {
        Self {
            all: entries.into(),
            sections: HashMap::new(),
            create_label: None,
        }
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self::new(items.into_iter().map(VirtualEntry::Item).collect())
    }

    /// Registers the entries shown while section `id` is selected.
    pub fn with_section(mut self, id: impl Into<String>, items: Vec<Item>) -> Self {
        let entries: Vec<VirtualEntry> = items.into_iter().map(VirtualEntry::Item).collect();
        self.sections.insert(id.into(), entries.into());
        self
    }

    /// Offers a "create" suggestion for every non-empty query. `{query}` in
    /// the label is replaced with the query text.
    pub fn with_create_label(mut self, label: impl Into<String>) -> Self {
        self.create_label = Some(label.into());
        self
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

impl CandidateProvider for ListSource {
    fn get_items(&self, _query: Option<&str>, section: Option<&str>) -> Option<Candidates> {
        match section {
            None => Some(self.all.clone()),
            Some(id) => match self.sections.get(id) {
                Some(entries) => Some(entries.clone()),
                None => {
                    debug!("ListSource: unknown section '{}', empty list", id);
                    Some(Arc::from(Vec::new()))
                }
            },
        }
    }

    fn get_additional_items(&self, query: Option<&str>) -> Vec<Item> {
        match (query, &self.create_label) {
            (Some(query), Some(label)) if !query.is_empty() => vec![Item::new(
                format!("{CREATE_ID_PREFIX}{query}"),
                label.replace("{query}", query),
            )],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_stable_snapshots() {
        let source = ListSource::from_items(vec![Item::new("a", "A")]).with_section("s", vec![Item::new("b", "B")]);
        let first = source.get_items(None, None).unwrap();
        let second = source.get_items(Some("x"), None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let section = source.get_items(None, Some("s")).unwrap();
        assert_eq!(section.len(), 1);
        assert!(source.get_items(None, Some("missing")).unwrap().is_empty());
    }

    #[test]
    fn create_suggestion_needs_a_query() {
        let source = ListSource::from_items(vec![]).with_create_label("Create \"{query}\"");
        assert!(source.get_additional_items(None).is_empty());
        assert!(source.get_additional_items(Some("")).is_empty());

        let extra = source.get_additional_items(Some("Garage"));
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].id, "___create___:Garage");
        assert_eq!(extra[0].primary, "Create \"Garage\"");
    }
}
