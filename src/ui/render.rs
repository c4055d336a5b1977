use crate::config::PickerConfig;
use crate::model::{SentinelKind, VirtualEntry};

/// How the renderer should move its window after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    /// Initial pin on the current value.
    Center(usize),
    /// Bring the active row into view with as little movement as possible.
    Nearest(usize),
    Keep,
}

/// Draws a window of the entry list. Only the visible rows need to exist.
pub trait RenderWindow {
    fn render_window(&mut self, entries: &[VirtualEntry], active: Option<usize>, scroll: ScrollTarget);
}

/// Plain-text renderer with a fixed number of rows.
pub struct TextRenderer {
    rows: usize,
    offset: usize,
    len: usize,
    query: String,
    not_found_label: String,
    empty_label: String,
    lines: Vec<String>,
}

impl TextRenderer {
    pub fn new(rows: usize, picker: &PickerConfig) -> Self {
        Self {
            rows: rows.max(1),
            offset: 0,
            len: 0,
            query: String::new(),
            not_found_label: picker.not_found_label.clone(),
            empty_label: picker.empty_label.clone(),
            lines: Vec::new(),
        }
    }

    /// Query shown in the "no results" row; `{query}` in the label is replaced.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// First and last visible entry indices.
    pub fn visible_range(&self) -> Option<(usize, usize)> {
        if self.len == 0 {
            return None;
        }
        Some((self.offset, (self.offset + self.rows).min(self.len) - 1))
    }

    /// Manual scrolling; callers should also release the pin.
    pub fn scroll_by(&mut self, delta: isize) {
        self.offset = self.offset.saturating_add_signed(delta).min(self.max_offset());
    }

    fn max_offset(&self) -> usize {
        self.len.saturating_sub(self.rows)
    }

    fn format_entry(&self, entry: &VirtualEntry, active: bool) -> String {
        let marker = if active { '>' } else { ' ' };
        match entry {
            VirtualEntry::Item(item) => match &item.secondary {
                Some(secondary) => format!("{marker} {}  ({secondary})", item.primary),
                None => format!("{marker} {}", item.primary),
            },
            VirtualEntry::SectionHeader(label) => format!("-- {label} --"),
            VirtualEntry::Sentinel(SentinelKind::NoResults) => {
                format!("  {}", self.not_found_label.replace("{query}", &self.query))
            }
            VirtualEntry::Sentinel(SentinelKind::Empty) => format!("  {}", self.empty_label),
            VirtualEntry::Sentinel(SentinelKind::Padding) => String::new(),
        }
    }
}

impl RenderWindow for TextRenderer {
    fn render_window(&mut self, entries: &[VirtualEntry], active: Option<usize>, scroll: ScrollTarget) {
        self.len = entries.len();

        match scroll {
            ScrollTarget::Center(i) => self.offset = i.saturating_sub(self.rows / 2),
            ScrollTarget::Nearest(i) => {
                if i < self.offset {
                    self.offset = i;
                } else if i >= self.offset + self.rows {
                    self.offset = i + 1 - self.rows;
                }
            }
            ScrollTarget::Keep => {}
        }
        self.offset = self.offset.min(self.max_offset());

        self.lines = entries
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(self.rows)
            .map(|(i, entry)| self.format_entry(entry, active == Some(i)))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;

    fn entries(n: usize) -> Vec<VirtualEntry> {
        (0..n).map(|i| VirtualEntry::Item(Item::new(i.to_string(), format!("Item {i}")))).collect()
    }

    #[test]
    fn nearest_scrolls_only_when_needed() {
        let list = entries(10);
        let mut renderer = TextRenderer::new(3, &PickerConfig::default());

        renderer.render_window(&list, Some(1), ScrollTarget::Nearest(1));
        assert_eq!(renderer.offset(), 0);

        renderer.render_window(&list, Some(4), ScrollTarget::Nearest(4));
        assert_eq!(renderer.offset(), 2);
        assert_eq!(renderer.lines()[2], "> Item 4");

        // Moving back inside the window does not scroll
        renderer.render_window(&list, Some(3), ScrollTarget::Nearest(3));
        assert_eq!(renderer.offset(), 2);
    }

    #[test]
    fn center_pins_and_clamps() {
        let list = entries(10);
        let mut renderer = TextRenderer::new(5, &PickerConfig::default());
        renderer.render_window(&list, None, ScrollTarget::Center(5));
        assert_eq!(renderer.visible_range(), Some((3, 7)));

        renderer.render_window(&list, None, ScrollTarget::Center(9));
        assert_eq!(renderer.visible_range(), Some((5, 9)));
    }

    #[test]
    fn manual_scroll_is_bounded() {
        let list = entries(4);
        let mut renderer = TextRenderer::new(2, &PickerConfig::default());
        renderer.render_window(&list, None, ScrollTarget::Keep);
        renderer.scroll_by(10);
        assert_eq!(renderer.offset(), 2);
        renderer.scroll_by(-10);
        assert_eq!(renderer.offset(), 0);
    }

    #[test]
    fn sentinels_use_configured_labels() {
        let picker = PickerConfig {
            not_found_label: "Nothing for '{query}'".into(),
            ..PickerConfig::default()
        };
        let mut renderer = TextRenderer::new(5, &picker);
        renderer.set_query("zzz");
        renderer.render_window(
            &[
                VirtualEntry::SectionHeader("Rooms".into()),
                VirtualEntry::Sentinel(SentinelKind::NoResults),
                VirtualEntry::Sentinel(SentinelKind::Padding),
            ],
            None,
            ScrollTarget::Keep,
        );
        assert_eq!(renderer.lines(), ["-- Rooms --", "  Nothing for 'zzz'", ""]);
    }
}
