//! Keyboard cursor over a flat [`VirtualEntry`] list.
//!
//! The cursor is either idle or sitting on an `Item` entry; headers and
//! sentinels are never landed on. Every transition returns the resulting
//! index so the caller can scroll it into view.

use crate::model::VirtualEntry;

/// What the cursor needs to know about the session to pick a default entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorContext<'a> {
    pub has_query: bool,
    pub current_value: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCursor {
    active: Option<usize>,
}

fn first_selectable(entries: &[VirtualEntry]) -> Option<usize> {
    entries.iter().position(VirtualEntry::is_selectable)
}

fn last_selectable(entries: &[VirtualEntry]) -> Option<usize> {
    entries.iter().rposition(VirtualEntry::is_selectable)
}

pub fn selectable_count(entries: &[VirtualEntry]) -> usize {
    entries.iter().filter(|e| e.is_selectable()).count()
}

impl SelectionCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while idle.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn reset(&mut self) {
        self.active = None;
    }

    /// The entry a fresh interaction starts from.
    ///
    /// While searching this is the best match; otherwise the entry holding
    /// the current value, falling back to the first selectable entry.
    pub fn initializer(entries: &[VirtualEntry], ctx: &CursorContext<'_>) -> Option<usize> {
        if !ctx.has_query {
            if let Some(value) = ctx.current_value {
                let current = entries
                    .iter()
                    .position(|e| e.as_item().is_some_and(|item| item.id == value));
                if current.is_some() {
                    return current;
                }
            }
        }
        first_selectable(entries)
    }

    pub fn move_next(&mut self, entries: &[VirtualEntry], ctx: &CursorContext<'_>) -> Option<usize> {
        if entries.is_empty() {
            return self.active;
        }
        self.active = match self.active {
            None => Self::initializer(entries, ctx),
            Some(i) => entries
                .iter()
                .enumerate()
                .skip(i + 1)
                .find(|(_, e)| e.is_selectable())
                .map(|(j, _)| j)
                .or(Some(i)),
        };
        self.active
    }

    pub fn move_prev(&mut self, entries: &[VirtualEntry]) -> Option<usize> {
        if entries.is_empty() {
            return self.active;
        }
        if let Some(i) = self.active {
            self.active = entries[..i.min(entries.len())]
                .iter()
                .rposition(VirtualEntry::is_selectable)
                .or(Some(i));
        }
        self.active
    }

    pub fn move_first(&mut self, entries: &[VirtualEntry]) -> Option<usize> {
        if let Some(first) = first_selectable(entries) {
            self.active = Some(first);
        }
        self.active
    }

    pub fn move_last(&mut self, entries: &[VirtualEntry]) -> Option<usize> {
        if let Some(last) = last_selectable(entries) {
            self.active = Some(last);
        }
        self.active
    }

    /// Puts the cursor on `index` if that entry is selectable.
    pub fn select(&mut self, entries: &[VirtualEntry], index: usize) -> Option<usize> {
        if entries.get(index).is_some_and(VirtualEntry::is_selectable) {
            self.active = Some(index);
        }
        self.active
    }

    /// Drops the active index if it no longer lands on a selectable entry.
    pub fn revalidate(&mut self, entries: &[VirtualEntry]) {
        if let Some(i) = self.active {
            if !entries.get(i).is_some_and(VirtualEntry::is_selectable) {
                self.active = None;
            }
        }
    }

    /// Index of the entry to accept, if any.
    ///
    /// A list with a single selectable entry always accepts that entry. An
    /// idle cursor is first moved to its initializer.
    pub fn commit(&mut self, entries: &[VirtualEntry], ctx: &CursorContext<'_>) -> Option<usize> {
        if selectable_count(entries) == 1 {
            return first_selectable(entries);
        }
        if self.active.is_none() {
            self.active = Self::initializer(entries, ctx);
        }
        self.active
            .filter(|&i| entries.get(i).is_some_and(VirtualEntry::is_selectable))
    }
}
