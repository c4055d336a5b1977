use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Item {
    pub id: String,            // Unique within one candidate set
    pub primary: String,       // Main label, always searchable
    #[serde(default)]
    pub secondary: Option<String>,
    // Named extra search strings; a null value means "not present"
    #[serde(default)]
    pub search_labels: HashMap<String, Option<String>>,
    #[serde(default)]
    pub sorting_label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_path: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            primary: primary.into(),
            ..Self::default()
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    pub fn with_label(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.search_labels.insert(name.into(), value.map(str::to_string));
        self
    }

    pub fn with_sorting_label(mut self, label: impl Into<String>) -> Self {
        self.sorting_label = Some(label.into());
        self
    }

    /// Resolves a key path against this item. Absent fields and `null`
    /// search labels resolve to `None` and therefore never match.
    pub fn field(&self, path: &KeyPath) -> Option<&str> {
        match path.segments() {
            [one] => match one.as_str() {
                "id" => Some(&self.id),
                "primary" => Some(&self.primary),
                "secondary" => self.secondary.as_deref(),
                "sorting_label" => self.sorting_label.as_deref(),
                _ => None,
            },
            [group, name] if group == "search_labels" => {
                self.search_labels.get(name).and_then(|v| v.as_deref())
            }
            _ => None,
        }
    }
}

/// Dotted path into an [`Item`], e.g. `primary` or `search_labels.alias`.
///
/// Deserializes from either a dotted string or an array of segments; both
/// spellings of the same path compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether the path names a field an [`Item`] can carry.
    pub fn is_known(&self) -> bool {
        match self.segments() {
            [one] => matches!(one.as_str(), "id" | "primary" | "secondary" | "sorting_label"),
            [group, name] => group == "search_labels" && !name.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        // ["search_labels.alias"] and ["search_labels", "alias"] are the same key
        Self(segments.iter().flat_map(|s| s.split('.')).map(str::to_string).collect())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl<'de> Deserialize<'de> for KeyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Dotted(String),
            Segments(Vec<String>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Dotted(s) => KeyPath::from(s.as_str()),
            Raw::Segments(v) => KeyPath::from(v),
        })
    }
}

/// A searchable field and its relative importance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedKey {
    pub path: KeyPath,
    pub weight: f64,
}

impl WeightedKey {
    pub fn new(path: &str, weight: f64) -> Self {
        Self {
            path: KeyPath::from(path),
            weight,
        }
    }
}

pub fn default_search_keys() -> Vec<WeightedKey> {
    vec![
        WeightedKey::new("primary", 10.0),
        WeightedKey::new("secondary", 7.0),
        WeightedKey::new("id", 3.0),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelKind {
    NoResults,
    Empty,
    Padding,
}

/// One row of the flat list the cursor and renderer walk over.
#[derive(Debug, Clone, PartialEq)]
pub enum VirtualEntry {
    Item(Item),
    SectionHeader(String),
    Sentinel(SentinelKind),
}

impl VirtualEntry {
    pub fn is_selectable(&self) -> bool {
        matches!(self, VirtualEntry::Item(_))
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            VirtualEntry::Item(item) => Some(item),
            _ => None,
        }
    }
}

impl From<Item> for VirtualEntry {
    fn from(item: Item) -> Self {
        VirtualEntry::Item(item)
    }
}
