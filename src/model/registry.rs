//! Ordered, observable set of media items, unique by path.

use log::debug;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, Weak};

use super::item::{FieldListener, ItemField, MediaItem};

/// Change notifications emitted by the [`Registry`].
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryEvent {
    Inserted(Vec<PathBuf>),
    /// Items were reordered in place.
    Sorted,
    FieldChanged { path: PathBuf, field: ItemField },
}

type Listener = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;

/// Items created by one [`Registry::add`] call, split by kind.
#[derive(Debug, Default)]
pub struct AddedItems {
    pub images: Vec<Arc<MediaItem>>,
    pub videos: Vec<Arc<MediaItem>>,
}

impl AddedItems {
    pub fn len(&self) -> usize {
        self.images.len() + self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Images first, then videos.
    pub fn all(&self) -> Vec<Arc<MediaItem>> {
        self.images.iter().chain(&self.videos).cloned().collect()
    }
}

/// Display order: creation timestamp ascending (unknown first), then path.
pub fn display_order(a: &MediaItem, b: &MediaItem) -> Ordering {
    (a.creation_timestamp(), a.path()).cmp(&(b.creation_timestamp(), b.path()))
}

#[derive(Default)]
pub struct Registry {
    items: RwLock<Vec<Arc<MediaItem>>>,
    listeners: RwLock<Vec<Listener>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(&self, listener: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
        self.listeners.write().unwrap().push(Arc::new(listener));
    }

    fn emit(&self, event: RegistryEvent) {
        let listeners: Vec<_> = self.listeners.read().unwrap().clone();
        for listener in &listeners {
            listener(&event);
        }
    }

    /// Add files not already present. Unrecognized extensions are skipped. New items get
    /// field listeners that re-emit their changes as [`RegistryEvent::FieldChanged`].
    ///
    /// The presence check and the append happen under one write lock, so concurrent calls
    /// never insert the same path twice.
    pub fn add(self: &Arc<Self>, files: &[PathBuf]) -> AddedItems {
        let mut added = AddedItems::default();
        let paths: Vec<PathBuf> = {
            let mut items = self.items.write().unwrap();
            let mut seen: HashSet<PathBuf> =
                items.iter().map(|i| i.path().to_path_buf()).collect();
            for file in files {
                if !seen.insert(file.clone()) {
                    continue;
                }
                let Some(item) = MediaItem::from_file(file) else {
                    debug!("Ignoring unsupported file {}", file.display());
                    continue;
                };
                let item = Arc::new(item);
                item.subscribe_fields(self.field_listener());
                if item.kind().is_video() {
                    added.videos.push(item);
                } else {
                    added.images.push(item);
                }
            }
            let new_items = added.all();
            let paths = new_items.iter().map(|i| i.path().to_path_buf()).collect();
            items.extend(new_items);
            paths
        };
        if !paths.is_empty() {
            self.emit(RegistryEvent::Inserted(paths));
        }
        added
    }

    fn field_listener(self: &Arc<Self>) -> FieldListener {
        let registry: Weak<Registry> = Arc::downgrade(self);
        Arc::new(move |path: &Path, field: ItemField| {
            if let Some(registry) = registry.upgrade() {
                registry.emit(RegistryEvent::FieldChanged {
                    path: path.to_path_buf(),
                    field,
                });
            }
        })
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items in current order. The registry lock is not held after return.
    pub fn snapshot(&self) -> Vec<Arc<MediaItem>> {
        self.items.read().unwrap().clone()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<MediaItem>> {
        self.items
            .read()
            .unwrap()
            .iter()
            .find(|i| i.path() == path)
            .cloned()
    }

    /// Items whose path is in `paths`, in registry order.
    pub fn select(&self, paths: &[PathBuf]) -> Vec<Arc<MediaItem>> {
        let wanted: HashSet<&Path> = paths.iter().map(PathBuf::as_path).collect();
        self.items
            .read()
            .unwrap()
            .iter()
            .filter(|i| wanted.contains(i.path()))
            .cloned()
            .collect()
    }

    /// Reorder in place by [`display_order`]. Emits `Sorted` only when the order changed.
    pub fn sort(&self) {
        let changed = {
            let mut items = self.items.write().unwrap();
            // Read each key once; other threads may still be writing fields.
            let mut keyed: Vec<_> = items
                .iter()
                .map(|i| ((i.creation_timestamp(), i.path().to_path_buf()), Arc::clone(i)))
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            let changed = keyed
                .iter()
                .zip(items.iter())
                .any(|((_, new), old)| !Arc::ptr_eq(new, old));
            if changed {
                *items = keyed.into_iter().map(|(_, item)| item).collect();
            }
            changed
        };
        if changed {
            self.emit(RegistryEvent::Sorted);
        }
    }

    pub fn count_in_progress(&self) -> usize {
        self.items
            .read()
            .unwrap()
            .iter()
            .filter(|i| i.in_progress())
            .count()
    }
}
