/// A committed pick. Carries both the `value-changed` id and the
/// `index-selected` position within the last rendered entry list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    pub id: String,
    pub index: usize,
    /// Modifier held while committing; hosts open the result in a new tab.
    pub new_tab: bool,
}

type Handler = Box<dyn FnMut(&SelectionEvent)>;

#[derive(Default)]
pub struct SelectionListeners {
    handlers: Vec<Handler>,
}

impl SelectionListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl FnMut(&SelectionEvent) + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn emit(&mut self, event: &SelectionEvent) {
        for handler in self.handlers.iter_mut() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
