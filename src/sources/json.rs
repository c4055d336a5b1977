use crate::model::{Item, VirtualEntry};
use crate::sources::list::ListSource;
use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum FileEntry {
    Header { header: String },
    Item(FileItem),
}

#[derive(Deserialize)]
struct FileItem {
    #[serde(default)]
    section: Option<String>,
    #[serde(flatten)]
    item: Item,
}

/// Parses a JSON array of items and `{ "header": "…" }` rows.
///
/// Items carrying a `section` id are also listed under that section.
pub fn parse_items(content: &str) -> Result<ListSource> {
    let rows: Vec<FileEntry> = serde_json::from_str(content).context("invalid items file")?;

    let mut entries = Vec::with_capacity(rows.len());
    let mut sections: Vec<(String, Vec<Item>)> = Vec::new();

    for row in rows {
        match row {
            FileEntry::Header { header } => entries.push(VirtualEntry::SectionHeader(header)),
            FileEntry::Item(FileItem { section, item }) => {
                if let Some(section) = section {
                    match sections.iter_mut().find(|(id, _)| *id == section) {
                        Some((_, items)) => items.push(item.clone()),
                        None => sections.push((section, vec![item.clone()])),
                    }
                }
                entries.push(VirtualEntry::Item(item));
            }
        }
    }

    Ok(sections
        .into_iter()
        .fold(ListSource::new(entries), |source, (id, items)| source.with_section(id, items)))
}

pub fn load_items(path: &Path) -> Result<ListSource> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let source = parse_items(&content)?;
    info!("JsonSource: loaded {} entries from {:?}", source.len(), path);
    Ok(source)
}
