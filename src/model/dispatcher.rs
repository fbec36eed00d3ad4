//! The single "UI" thread that owns writes to observable item fields.
//!
//! Other threads never mutate item fields directly; they post closures here. Tasks run in
//! FIFO order per posting thread.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use log::debug;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

pub type UiTask = Box<dyn FnOnce() + Send>;

/// Capability to run a closure on the UI thread. The only thing the core needs from a front end.
pub trait Dispatcher: Send + Sync {
    fn post(&self, task: UiTask);
}

enum UiMessage {
    Run(UiTask),
    Stop,
}

/// A dedicated thread draining posted tasks.
pub struct UiThread {
    tx: Sender<UiMessage>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl UiThread {
    pub fn spawn() -> Arc<Self> {
        let (tx, rx) = unbounded::<UiMessage>();
        let handle = thread::Builder::new()
            .name("ui-dispatcher".to_string())
            .spawn(move || ui_loop(rx))
            .ok();
        if handle.is_none() {
            log::error!("could not start UI dispatcher thread; posted tasks will be dropped");
        }
        Arc::new(Self {
            tx,
            handle: Mutex::new(handle),
        })
    }

    /// Block until every task posted before this call has run.
    /// Must not be called from the UI thread itself.
    pub fn sync(&self) {
        let (done_tx, done_rx) = bounded::<()>(1);
        self.post(Box::new(move || {
            let _ = done_tx.send(());
        }));
        let _ = done_rx.recv();
    }

    /// Run what is queued, then stop the thread.
    pub fn stop(&self) {
        let _ = self.tx.send(UiMessage::Stop);
        if let Some(handle) = self.handle.lock().unwrap().take()
            && handle.thread().id() != thread::current().id()
        {
            let _ = handle.join();
        }
    }
}

impl Dispatcher for UiThread {
    fn post(&self, task: UiTask) {
        if self.tx.send(UiMessage::Run(task)).is_err() {
            debug!("UI dispatcher stopped; dropping task");
        }
    }
}

fn ui_loop(rx: Receiver<UiMessage>) {
    while let Ok(message) = rx.recv() {
        match message {
            UiMessage::Run(task) => task(),
            UiMessage::Stop => break,
        }
    }
    debug!("UI dispatcher exited");
}
