use crate::config::{Config, PickerConfig, PresentationMode};
use crate::cursor::{CursorContext, SelectionCursor};
use crate::events::{SelectionEvent, SelectionListeners};
use crate::index::IndexCache;
use crate::matcher::FuzzyMatcher;
use crate::model::{Item, SentinelKind, VirtualEntry, WeightedKey};
use crate::ranker;
use crate::sources::{CandidateProvider, Candidates};
use crate::ui::render::{RenderWindow, ScrollTarget};
use log::{debug, info};
use std::cmp::Ordering;
use std::sync::Arc;

/// Post-filter run on every non-empty query: `(query, filtered, all items)`.
pub type SearchFn = Box<dyn Fn(&str, Vec<VirtualEntry>, &[Item]) -> Vec<VirtualEntry>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Open,
    Committed,
    Cancelled,
}

/// The candidate list the session last saw, with its items pulled out for ranking.
struct Snapshot {
    candidates: Candidates,
    items: Arc<[Item]>,
    has_headers: bool,
}

/// Everything that lives for one opened picker and dies when it closes.
pub struct SessionState {
    phase: SessionPhase,
    query: String,
    section: Option<String>,
    entries: Vec<VirtualEntry>,
    cursor: SelectionCursor,
    pinned: bool,
    loading: bool,
    section_title: Option<String>,
    snapshot: Option<Snapshot>,
    index: IndexCache,
}

impl SessionState {
    fn new(section: Option<String>) -> Self {
        Self {
            phase: SessionPhase::Open,
            query: String::new(),
            section,
            entries: Vec::new(),
            cursor: SelectionCursor::new(),
            pinned: true,
            loading: false,
            section_title: None,
            snapshot: None,
            index: IndexCache::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn index_builds(&self) -> usize {
        self.index.builds()
    }
}

pub struct ComboBox<P: CandidateProvider> {
    provider: P,
    picker: PickerConfig,
    keys: Arc<[WeightedKey]>,
    matcher: FuzzyMatcher,
    current_value: Option<String>,
    search_fn: Option<SearchFn>,
    listeners: SelectionListeners,
    session: Option<SessionState>,
}

impl<P: CandidateProvider> ComboBox<P> {
    pub fn new(provider: P, config: &Config) -> Self {
        let matcher = FuzzyMatcher::with_threshold(config.search.threshold);
        debug!(
            "ComboBox: {} search keys, threshold {}",
            config.search.keys.len(),
            matcher.threshold()
        );
        Self {
            provider,
            picker: config.picker.clone(),
            keys: config.search.keys.clone().into(),
            matcher,
            current_value: None,
            search_fn: None,
            listeners: SelectionListeners::new(),
            session: None,
        }
    }

    pub fn with_search_fn(
        mut self,
        search_fn: impl Fn(&str, Vec<VirtualEntry>, &[Item]) -> Vec<VirtualEntry> + 'static,
    ) -> Self {
        self.search_fn = Some(Box::new(search_fn));
        self
    }

    /// The externally owned, already selected id.
    pub fn set_current_value(&mut self, value: Option<String>) {
        self.current_value = value;
    }

    pub fn on_selection(&mut self, handler: impl FnMut(&SelectionEvent) + 'static) {
        self.listeners.register(handler);
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn open(&mut self) {
        self.open_in_section(None);
    }

    pub fn open_in_section(&mut self, section: Option<String>) {
        info!("ComboBox: open, section={:?}", section);
        self.session = Some(SessionState::new(section));
        self.refresh(true);
    }

    /// Dismissal without a pick (escape, focus loss).
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.phase == SessionPhase::Open {
                debug!("ComboBox: cancelled");
                session.phase = SessionPhase::Cancelled;
                session.cursor.reset();
            }
        }
    }

    /// Drops the session, including its search index.
    pub fn close(&mut self) {
        self.session = None;
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.phase == SessionPhase::Open)
    }

    pub fn query(&self) -> &str {
        self.session.as_ref().map_or("", |s| s.query.as_str())
    }

    pub fn section(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.section.as_deref())
    }

    pub fn entries(&self) -> &[VirtualEntry] {
        self.session
            .as_ref()
            .map(|s| s.entries.as_slice())
            .unwrap_or_default()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.cursor.active())
    }

    pub fn is_loading(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.loading)
    }

    pub fn section_title(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.section_title.as_deref())
    }

    pub fn set_query(&mut self, query: &str) {
        let query = query.trim();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let changed = session.query != query;
        session.query = query.to_string();
        self.refresh(changed);
    }

    pub fn clear_search(&mut self) {
        self.set_query("");
    }

    /// Selecting the active section again goes back to all sections.
    pub fn set_section(&mut self, section: Option<&str>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.section = match section {
            Some(id) if session.section.as_deref() == Some(id) => None,
            other => other.map(str::to_string),
        };
        debug!("ComboBox: section={:?}", session.section);
        self.refresh(true);

        if let Some(session) = self.session.as_mut() {
            session.pinned = false;
            session.section_title = None;
        }
    }

    /// Re-reads the provider, e.g. once a loading collaborator has data.
    pub fn reload(&mut self) {
        self.refresh(false);
    }

    fn refresh(&mut self, reset_cursor: bool) {
        let Self {
            provider,
            picker,
            keys,
            matcher,
            search_fn,
            session,
            ..
        } = self;
        let Some(session) = session.as_mut() else {
            return;
        };

        let section = session.section.as_deref();
        let entries = match provider.get_items(Some(session.query.as_str()), section) {
            None => {
                debug!("ComboBox: candidates still loading");
                session.loading = true;
                session.snapshot = None;
                Vec::new()
            }
            Some(candidates) => {
                session.loading = false;
                let sort = picker.sections.is_empty();
                let snapshot = refresh_snapshot(&mut session.snapshot, candidates, sort);
                let mut entries = if session.query.is_empty() {
                    raw_entries(snapshot, sort)
                } else {
                    let index = session.index.get(&snapshot.items, keys);
                    ranker::rank(matcher, &snapshot.items, &session.query, &keys[..], Some(index.as_ref()))
                        .into_iter()
                        .cloned()
                        .map(VirtualEntry::Item)
                        .collect()
                };

                let query = (!session.query.is_empty()).then_some(session.query.as_str());
                let real_empty = !entries.iter().any(VirtualEntry::is_selectable);
                entries.extend(provider.get_additional_items(query).into_iter().map(VirtualEntry::Item));

                if let (Some(search_fn), Some(query)) = (search_fn.as_ref(), query) {
                    entries = search_fn(query, entries, &snapshot.items[..]);
                }

                if real_empty && !picker.allow_custom_value {
                    entries.push(VirtualEntry::Sentinel(if query.is_some() {
                        SentinelKind::NoResults
                    } else {
                        SentinelKind::Empty
                    }));
                }

                if let Some(query) = query {
                    if picker.allow_custom_value && !snapshot.items.iter().any(|i| i.id == query) {
                        entries.push(VirtualEntry::Item(
                            Item::new(query, picker.custom_value_label.as_str())
                                .with_secondary(format!("\"{query}\"")),
                        ));
                    }
                }
                entries
            }
        };

        let mut entries = entries;
        if picker.mode == PresentationMode::Dialog && !session.loading {
            entries.push(VirtualEntry::Sentinel(SentinelKind::Padding));
        }

        if reset_cursor || entries != session.entries {
            session.cursor.reset();
            session.pinned = true;
        } else {
            session.cursor.revalidate(&entries);
        }
        session.entries = entries;

        info!(
            "ComboBox: query='{}', section={:?}, entries={}",
            session.query,
            session.section,
            session.entries.len()
        );
    }

    fn cursor_context(&self) -> CursorContext<'_> {
        CursorContext {
            has_query: !self.query().is_empty(),
            current_value: self.current_value.as_deref(),
        }
    }

    fn with_cursor(
        &mut self,
        step: impl FnOnce(&mut SelectionCursor, &[VirtualEntry], &CursorContext<'_>) -> Option<usize>,
    ) -> Option<usize> {
        let session = self.session.as_mut()?;
        if session.phase != SessionPhase::Open {
            return None;
        }
        let ctx = CursorContext {
            has_query: !session.query.is_empty(),
            current_value: self.current_value.as_deref(),
        };
        step(&mut session.cursor, session.entries.as_slice(), &ctx)
    }

    pub fn move_next(&mut self) -> Option<usize> {
        self.with_cursor(|cursor, entries, ctx| cursor.move_next(entries, ctx))
    }

    pub fn move_prev(&mut self) -> Option<usize> {
        self.with_cursor(|cursor, entries, _| cursor.move_prev(entries))
    }

    pub fn move_first(&mut self) -> Option<usize> {
        self.with_cursor(|cursor, entries, _| cursor.move_first(entries))
    }

    pub fn move_last(&mut self) -> Option<usize> {
        self.with_cursor(|cursor, entries, _| cursor.move_last(entries))
    }

    /// Pointer hover over a row.
    pub fn hover(&mut self, index: usize) -> Option<usize> {
        self.with_cursor(|cursor, entries, _| cursor.select(entries, index))
    }

    /// Keyboard focus entering the list puts an idle cursor on the best match
    /// or on the current value. Without either the cursor stays idle.
    pub fn focus_list(&mut self) -> Option<usize> {
        self.with_cursor(|cursor, entries, ctx| {
            if cursor.is_idle() {
                let target = SelectionCursor::initializer(entries, ctx).filter(|&i| {
                    ctx.has_query
                        || entries[i]
                            .as_item()
                            .is_some_and(|item| Some(item.id.as_str()) == ctx.current_value)
                });
                if let Some(i) = target {
                    cursor.select(entries, i);
                }
            }
            cursor.active()
        })
    }

    /// Accepts the highlighted entry (Enter, or Mod+Enter with `new_tab`).
    pub fn commit_active(&mut self, new_tab: bool) -> Option<SelectionEvent> {
        let index = self.with_cursor(|cursor, entries, ctx| cursor.commit(entries, ctx))?;
        self.emit(index, new_tab, false)
    }

    /// Accepts the entry at `index` directly, as a click does. The emitted id
    /// is trimmed.
    pub fn click(&mut self, index: usize, new_tab: bool) -> Option<SelectionEvent> {
        let index = self.with_cursor(|cursor, entries, _| {
            entries.get(index).filter(|e| e.is_selectable())?;
            cursor.select(entries, index)
        })?;
        self.emit(index, new_tab, true)
    }

    fn emit(&mut self, index: usize, new_tab: bool, trim_id: bool) -> Option<SelectionEvent> {
        let session = self.session.as_mut()?;
        let item = session.entries.get(index)?.as_item()?;
        let id = if trim_id { item.id.trim() } else { item.id.as_str() };
        let event = SelectionEvent {
            id: id.to_string(),
            index,
            new_tab,
        };
        session.phase = SessionPhase::Committed;
        info!("ComboBox: selected '{}' at {} (new_tab={})", event.id, index, new_tab);
        self.listeners.emit(&event);
        Some(event)
    }

    /// Index the list is centered on while the initial pin holds.
    pub fn pin_index(&self) -> Option<usize> {
        let session = self.session.as_ref()?;
        if !session.pinned || self.current_value.is_none() {
            return None;
        }
        Some(SelectionCursor::initializer(&session.entries, &self.cursor_context()).unwrap_or(0))
    }

    /// The user scrolled by hand; stop pinning the current value.
    pub fn user_scrolled(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.pinned = false;
        }
    }

    /// Tracks the sticky section title for the renderer's visible window.
    pub fn visible_range_changed(&mut self, first: usize, _last: usize) {
        let show = !self.picker.sections.is_empty();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.section_title = if show && session.section.is_none() {
            sticky_title(&session.entries, first)
        } else {
            None
        };
    }

    pub fn scroll_target(&self) -> ScrollTarget {
        match (self.active_index(), self.pin_index()) {
            (Some(active), _) => ScrollTarget::Nearest(active),
            (None, Some(pin)) => ScrollTarget::Center(pin),
            (None, None) => ScrollTarget::Keep,
        }
    }

    pub fn render<R: RenderWindow>(&self, renderer: &mut R) {
        renderer.render_window(self.entries(), self.active_index(), self.scroll_target());
    }
}

fn refresh_snapshot(slot: &mut Option<Snapshot>, candidates: Candidates, sort: bool) -> &Snapshot {
    let current = slot
        .take()
        .filter(|s| Arc::ptr_eq(&s.candidates, &candidates));
    slot.insert(current.unwrap_or_else(|| build_snapshot(candidates, sort)))
}

fn build_snapshot(candidates: Candidates, sort: bool) -> Snapshot {
    let has_headers = candidates
        .iter()
        .any(|e| matches!(e, VirtualEntry::SectionHeader(_)));
    let mut items: Vec<Item> = candidates.iter().filter_map(VirtualEntry::as_item).cloned().collect();
    if sort && !has_headers {
        items.sort_by(compare_sorting_labels);
    }
    Snapshot {
        candidates,
        items: items.into(),
        has_headers,
    }
}

fn raw_entries(snapshot: &Snapshot, sorted: bool) -> Vec<VirtualEntry> {
    if sorted && !snapshot.has_headers {
        snapshot.items.iter().cloned().map(VirtualEntry::Item).collect()
    } else {
        snapshot.candidates.to_vec()
    }
}

/// Case-insensitive by sorting label; unlabelled items keep their order after labelled ones.
fn compare_sorting_labels(a: &Item, b: &Item) -> Ordering {
    match (&a.sorting_label, &b.sorting_label) {
        (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sticky_title(entries: &[VirtualEntry], first: usize) -> Option<String> {
    if matches!(entries.get(first), Some(VirtualEntry::SectionHeader(_)) | None) {
        return None;
    }
    entries[..first].iter().rev().find_map(|e| match e {
        VirtualEntry::SectionHeader(label) => Some(label.clone()),
        _ => None,
    })
}
