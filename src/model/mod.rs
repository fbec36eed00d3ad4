//! Observable media items, their registry, and the UI-thread plumbing around them.

pub mod coalescer;
pub mod dispatcher;
pub mod item;
pub mod observable;
pub mod registry;

pub use coalescer::{Coalescer, Debouncer};
pub use dispatcher::{Dispatcher, UiTask, UiThread};
pub use item::{FieldListener, ItemField, ItemSnapshot, MediaItem};
pub use observable::Observable;
pub use registry::{AddedItems, Registry, RegistryEvent, display_order};
