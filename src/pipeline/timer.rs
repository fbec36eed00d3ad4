//! Single-threaded delayed-task executor.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::debug;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::thread;
use std::time::{Duration, Instant};

pub type TimerTask = Box<dyn FnOnce() + Send>;

enum TimerMessage {
    Schedule(Instant, TimerTask),
    Stop,
}

struct Entry {
    due: Instant,
    seq: u64,
    task: TimerTask,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        (self.due, self.seq) == (other.due, other.seq)
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Cloneable handle to the timer thread.
#[derive(Clone)]
pub struct TimerHandle {
    tx: Sender<TimerMessage>,
}

impl TimerHandle {
    /// Start the timer thread. It runs until [`TimerHandle::stop`] or until every handle is dropped.
    pub fn spawn() -> std::io::Result<Self> {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("scheduled-tasks".to_string())
            .spawn(move || timer_loop(rx))?;
        Ok(Self { tx })
    }

    /// Run `task` on the timer thread once `delay` has elapsed.
    pub fn schedule(&self, delay: Duration, task: TimerTask) {
        let _ = self
            .tx
            .send(TimerMessage::Schedule(Instant::now() + delay, task));
    }

    /// Stop the thread; tasks not yet due are dropped.
    pub fn stop(&self) {
        let _ = self.tx.send(TimerMessage::Stop);
    }
}

fn timer_loop(rx: Receiver<TimerMessage>) {
    let mut queue: BinaryHeap<Reverse<Entry>> = BinaryHeap::new();
    let mut seq = 0u64;
    loop {
        let now = Instant::now();
        while queue.peek().is_some_and(|Reverse(e)| e.due <= now) {
            if let Some(Reverse(entry)) = queue.pop() {
                (entry.task)();
            }
        }

        let message = match queue.peek() {
            Some(Reverse(next)) => match rx.recv_timeout(next.due.saturating_duration_since(now)) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
        };
        match message {
            TimerMessage::Schedule(due, task) => {
                queue.push(Reverse(Entry { due, seq, task }));
                seq += 1;
            }
            TimerMessage::Stop => break,
        }
    }
    debug!("Timer thread exited with {} pending task(s)", queue.len());
}
