//! Search-and-select core for picker widgets: multi-term fuzzy ranking over
//! weighted item fields, and a keyboard cursor over a sectioned result list.

pub mod config;
pub mod cursor;
pub mod events;
pub mod index;
pub mod matcher;
pub mod model;
pub mod ranker;
pub mod sources;
pub mod state;
pub mod ui;

pub use config::{load_config, Config};
pub use cursor::SelectionCursor;
pub use events::SelectionEvent;
pub use model::{Item, SentinelKind, VirtualEntry, WeightedKey};
pub use state::ComboBox;
