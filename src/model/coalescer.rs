//! Once-per-interval refresh of derived state (display order, in-progress count).
//!
//! A burst of qualifying changes arms the timer once. When it fires the pending flag is cleared
//! first, then the computation is posted to the UI thread, so changes made while the computation
//! runs arm a new refresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use super::dispatcher::Dispatcher;
use super::item::ItemField;
use super::registry::{Registry, RegistryEvent};
use crate::pipeline::timer::TimerHandle;

type Computation = Arc<dyn Fn() + Send + Sync>;

/// Collapses triggers within `interval` into a single run of `computation` on the UI thread.
#[derive(Clone)]
pub struct Debouncer {
    pending: Arc<AtomicBool>,
    interval: Duration,
    timer: TimerHandle,
    dispatcher: Arc<dyn Dispatcher>,
    computation: Computation,
}

impl Debouncer {
    pub fn new(
        timer: TimerHandle,
        dispatcher: Arc<dyn Dispatcher>,
        interval: Duration,
        computation: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            pending: Arc::new(AtomicBool::new(false)),
            interval,
            timer,
            dispatcher,
            computation: Arc::new(computation),
        }
    }

    /// Arm the timer unless a refresh is already pending.
    pub fn trigger(&self) {
        if self
            .pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let pending = Arc::clone(&self.pending);
        let dispatcher = Arc::clone(&self.dispatcher);
        let computation = Arc::clone(&self.computation);
        self.timer.schedule(
            self.interval,
            Box::new(move || {
                pending.store(false, Ordering::SeqCst);
                dispatcher.post(Box::new(move || computation()));
            }),
        );
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

/// The two debouncers wired to a registry.
pub struct Coalescer {
    pub sort: Debouncer,
    pub count: Debouncer,
}

impl Coalescer {
    /// Subscribe to `registry`: timestamp changes and insertions re-sort, in-progress changes
    /// recount. `on_count` receives the fresh count on the UI thread.
    pub fn attach(
        registry: &Arc<Registry>,
        timer: TimerHandle,
        dispatcher: Arc<dyn Dispatcher>,
        interval: Duration,
        on_count: impl Fn(usize) + Send + Sync + 'static,
    ) -> Self {
        let weak: Weak<Registry> = Arc::downgrade(registry);
        let sort = Debouncer::new(timer.clone(), Arc::clone(&dispatcher), interval, {
            let weak = weak.clone();
            move || {
                if let Some(registry) = weak.upgrade() {
                    registry.sort();
                }
            }
        });
        let count = Debouncer::new(timer, dispatcher, interval, move || {
            if let Some(registry) = weak.upgrade() {
                on_count(registry.count_in_progress());
            }
        });

        let (sort_trigger, count_trigger) = (sort.clone(), count.clone());
        registry.subscribe(move |event| match event {
            RegistryEvent::Inserted(_)
            | RegistryEvent::FieldChanged {
                field: ItemField::CreationTimestamp,
                ..
            } => sort_trigger.trigger(),
            RegistryEvent::FieldChanged {
                field: ItemField::InProgress,
                ..
            } => count_trigger.trigger(),
            _ => {}
        });
        Self { sort, count }
    }
}
