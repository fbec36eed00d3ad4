//! Per-item mutual exclusion.
//!
//! One slot (mutex + condvar) per path. Batches always lock in ascending path order, which is
//! what keeps two overlapping batches from deadlocking. The item's `in_progress` flag is only
//! written by the current holder (set after taking the slot, cleared before giving it back), and
//! never while a slot mutex is held, so its listeners may call back into the table.

use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use super::error_handler::JobError;
use crate::model::MediaItem;

#[derive(Default)]
struct Slot {
    held: Mutex<bool>,
    released: Condvar,
}

#[derive(Default)]
pub struct LockTable {
    slots: Mutex<HashMap<PathBuf, Arc<Slot>>>,
    closed: AtomicBool,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, path: &Path) -> Arc<Slot> {
        let mut slots = self.slots.lock().unwrap();
        Arc::clone(slots.entry(path.to_path_buf()).or_default())
    }

    /// Block until `item` is free, then take it. Fails with `Interrupted` once the table is closed.
    pub fn acquire<'a>(&'a self, item: &Arc<MediaItem>) -> Result<ItemGuard<'a>, JobError> {
        self.lock_item(item)?;
        Ok(ItemGuard {
            table: self,
            item: Arc::clone(item),
        })
    }

    /// Take every item, in ascending path order. Duplicates are locked once.
    /// If interrupted midway, the items already taken are released before returning.
    pub fn acquire_many<'a>(&'a self, items: &[Arc<MediaItem>]) -> Result<BatchGuard<'a>, JobError> {
        let mut sorted: Vec<Arc<MediaItem>> = items.to_vec();
        sorted.sort_by(|a, b| a.path().cmp(b.path()));
        sorted.dedup_by(|a, b| a.path() == b.path());

        let mut guard = BatchGuard {
            table: self,
            held: Vec::with_capacity(sorted.len()),
        };
        for item in sorted {
            self.lock_item(&item)?;
            guard.held.push(item);
        }
        Ok(guard)
    }

    fn lock_item(&self, item: &MediaItem) -> Result<(), JobError> {
        let slot = self.slot(item.path());
        let mut held = slot.held.lock().unwrap();
        while *held {
            if self.is_closed() {
                return Err(JobError::Interrupted);
            }
            debug!("Waiting for lock on {}", item.path().display());
            held = slot.released.wait(held).unwrap();
        }
        if self.is_closed() {
            return Err(JobError::Interrupted);
        }
        *held = true;
        drop(held);
        item.set_in_progress(true);
        Ok(())
    }

    /// Free `item` and wake one waiter.
    fn release(&self, item: &MediaItem) {
        item.set_in_progress(false);
        let slot = self.slot(item.path());
        let mut held = slot.held.lock().unwrap();
        *held = false;
        drop(held);
        slot.released.notify_one();
    }

    pub fn is_held(&self, path: &Path) -> bool {
        let slot = self.slots.lock().unwrap().get(path).cloned();
        slot.is_some_and(|s| *s.held.lock().unwrap())
    }

    /// Wake every waiter and make further acquires fail with `Interrupted`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let slots: Vec<Arc<Slot>> = self.slots.lock().unwrap().values().cloned().collect();
        for slot in slots {
            // Taking the mutex orders the flag store before any waiter's re-check.
            let _held = slot.held.lock().unwrap();
            slot.released.notify_all();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// One held item. Released on drop.
pub struct ItemGuard<'a> {
    table: &'a LockTable,
    item: Arc<MediaItem>,
}

impl ItemGuard<'_> {
    pub fn item(&self) -> &Arc<MediaItem> {
        &self.item
    }
}

impl Drop for ItemGuard<'_> {
    fn drop(&mut self) {
        self.table.release(&self.item);
    }
}

/// A sorted set of held items. Items can be released one by one; the rest go on drop.
pub struct BatchGuard<'a> {
    table: &'a LockTable,
    held: Vec<Arc<MediaItem>>,
}

impl BatchGuard<'_> {
    /// Items still held, in lock order.
    pub fn items(&self) -> &[Arc<MediaItem>] {
        &self.held
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.held.iter().map(|i| i.path().to_path_buf()).collect()
    }

    /// Release one item early. No-op if it is not part of this batch (or already released).
    pub fn release(&mut self, path: &Path) {
        if let Some(pos) = self.held.iter().position(|i| i.path() == path) {
            let item = self.held.remove(pos);
            self.table.release(&item);
        }
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        for item in self.held.drain(..).rev() {
            self.table.release(&item);
        }
    }
}
