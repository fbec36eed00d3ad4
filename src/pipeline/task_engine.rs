//! Fixed pool of worker threads draining an unbounded job queue, plus the scheduled-task timer.
//!
//! Submission never blocks. Shutdown is abrupt: running children are killed, lock waits fail
//! with `Interrupted`, queued jobs are discarded. Workers are never joined; they exit once the
//! queue disconnects and do not keep the process alive.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use super::context::{JobContext, PipelineResources};
use super::error_handler::ErrorHandler;
use super::jobs::Job;
use super::timer::TimerHandle;

struct Submission {
    job: Box<dyn Job>,
    on_error: ErrorHandler,
}

struct Shared {
    resources: PipelineResources,
    shutdown: AtomicBool,
    outstanding: Mutex<usize>,
    idle: Condvar,
}

impl Shared {
    fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn finished(&self, count: usize) {
        let mut outstanding = self.outstanding.lock().unwrap();
        *outstanding = outstanding.saturating_sub(count);
        if *outstanding == 0 {
            self.idle.notify_all();
        }
    }
}

/// Marks one submission done when dropped, even if the job panicked.
struct Done<'a>(&'a Shared);

impl Drop for Done<'_> {
    fn drop(&mut self) {
        self.0.finished(1);
    }
}

pub struct TaskEngine {
    shared: Arc<Shared>,
    tx: Mutex<Option<Sender<Submission>>>,
    rx: Receiver<Submission>,
    timer: TimerHandle,
}

impl TaskEngine {
    /// Start `workers` job threads and the timer thread.
    pub fn start(resources: PipelineResources, workers: usize) -> std::io::Result<Self> {
        let (tx, rx) = unbounded::<Submission>();
        let shared = Arc::new(Shared {
            resources,
            shutdown: AtomicBool::new(false),
            outstanding: Mutex::new(0),
            idle: Condvar::new(),
        });
        for i in 0..workers.max(1) {
            let rx = rx.clone();
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(format!("background-tasks-{i}"))
                .spawn(move || worker_loop(rx, shared))?;
        }
        let timer = TimerHandle::spawn()?;
        debug!("Task engine started with {} worker(s)", workers.max(1));
        Ok(Self {
            shared,
            tx: Mutex::new(Some(tx)),
            rx,
            timer,
        })
    }

    pub fn resources(&self) -> &PipelineResources {
        &self.shared.resources
    }

    pub fn timer(&self) -> TimerHandle {
        self.timer.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.is_shut_down()
    }

    /// Queue `job`; errors it returns go to `on_error`. Dropped after shutdown.
    pub fn submit(&self, job: Box<dyn Job>, on_error: ErrorHandler) {
        let tx = self.tx.lock().unwrap();
        let Some(tx) = tx.as_ref() else {
            debug!("Engine shut down; dropping {} job", job.name());
            return;
        };
        *self.shared.outstanding.lock().unwrap() += 1;
        if tx.send(Submission { job, on_error }).is_err() {
            self.shared.finished(1);
        }
    }

    /// Block until the queue is empty and no job is running.
    pub fn wait_idle(&self) {
        let mut outstanding = self.shared.outstanding.lock().unwrap();
        while *outstanding > 0 {
            outstanding = self.shared.idle.wait(outstanding).unwrap();
        }
    }

    /// Interrupt running jobs, discard queued ones, stop the timer. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down task engine");
        // Closing the channel lets idle workers exit.
        self.tx.lock().unwrap().take();
        self.shared.resources.locks.close();
        self.shared.resources.runner.kill_all();

        let discarded = self.rx.try_iter().count();
        if discarded > 0 {
            warn!("Discarded {discarded} queued job(s)");
            self.shared.finished(discarded);
        }
        self.timer.stop();
    }
}

fn worker_loop(rx: Receiver<Submission>, shared: Arc<Shared>) {
    while let Ok(Submission { job, on_error }) = rx.recv() {
        let _done = Done(&shared);
        if shared.is_shut_down() {
            continue;
        }
        let name = job.name();
        debug!("Starting {name} job");
        let ctx = JobContext::new(&shared.resources, &on_error);
        match job.run(&ctx) {
            Ok(()) => debug!("Finished {name} job"),
            Err(e) => ctx.report(e),
        }
    }
    debug!("Worker {:?} exited", thread::current().name());
}
