use geotagger::model::{ItemField, MediaItem, UiThread};
use geotagger::pipeline::{
    ErrorHandler, Job, JobContext, JobError, LockTable, PipelineResources, TaskEngine,
};
use geotagger::MediaKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

fn item(name: &str) -> Arc<MediaItem> {
    Arc::new(MediaItem::new(format!("/media/{name}"), MediaKind::Image))
}

fn collecting_handler() -> (ErrorHandler, Arc<Mutex<Vec<String>>>) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let handler: ErrorHandler = Arc::new(move |e: JobError| sink.lock().unwrap().push(e.to_string()));
    (handler, errors)
}

// --- lock table ---

#[test]
fn test_acquire_sets_in_progress_and_drop_releases() {
    let table = LockTable::new();
    let a = item("a.jpg");
    {
        let guard = table.acquire(&a).unwrap();
        assert!(guard.item().in_progress());
        assert!(table.is_held(a.path()));
    }
    assert!(!a.in_progress());
    assert!(!table.is_held(a.path()));
}

#[test]
fn test_acquire_many_sorts_and_dedups() {
    let table = LockTable::new();
    let (a, b, c) = (item("a.jpg"), item("b.jpg"), item("c.jpg"));
    let guard = table
        .acquire_many(&[c.clone(), a.clone(), b.clone(), a.clone()])
        .unwrap();
    assert_eq!(
        guard.paths(),
        vec![
            PathBuf::from("/media/a.jpg"),
            PathBuf::from("/media/b.jpg"),
            PathBuf::from("/media/c.jpg")
        ]
    );
    assert!([&a, &b, &c].iter().all(|i| i.in_progress()));
    drop(guard);
    assert!([&a, &b, &c].iter().all(|i| !i.in_progress()));
}

#[test]
fn test_batch_release_one_early() {
    let table = LockTable::new();
    let (a, b) = (item("a.jpg"), item("b.jpg"));
    let mut guard = table.acquire_many(&[a.clone(), b.clone()]).unwrap();
    guard.release(a.path());
    assert!(!a.in_progress());
    assert!(b.in_progress());
    guard.release(a.path());
    assert_eq!(guard.items().len(), 1);
    drop(guard);
    assert!(!b.in_progress());
}

#[test]
fn test_waiter_gets_lock_after_release() {
    let table = Arc::new(LockTable::new());
    let a = item("a.jpg");
    let guard = table.acquire(&a).unwrap();

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let (table, a) = (Arc::clone(&table), Arc::clone(&a));
        thread::spawn(move || {
            let _g = table.acquire(&a).unwrap();
            tx.send(()).unwrap();
        })
    };
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    drop(guard);
    rx.recv_timeout(Duration::from_secs(2)).unwrap();
    waiter.join().unwrap();
    assert!(!a.in_progress());
}

#[test]
fn test_close_interrupts_waiters() {
    let table = Arc::new(LockTable::new());
    let a = item("a.jpg");
    let _held = table.acquire(&a).unwrap();

    let waiter = {
        let (table, a) = (Arc::clone(&table), Arc::clone(&a));
        thread::spawn(move || table.acquire(&a).map(|_| ()))
    };
    thread::sleep(Duration::from_millis(50));
    table.close();
    let result = waiter.join().unwrap();
    assert!(matches!(result, Err(JobError::Interrupted)));
    assert!(matches!(table.acquire(&item("b.jpg")), Err(JobError::Interrupted)));
}

#[test]
fn test_overlapping_batches_do_not_deadlock() {
    let table = Arc::new(LockTable::new());
    let items: Vec<_> = ["a.jpg", "b.jpg", "c.jpg", "d.jpg"].iter().map(|n| item(n)).collect();
    // Opposite input orders on intersecting sets.
    let batch1 = vec![items[2].clone(), items[1].clone(), items[0].clone()];
    let batch2 = vec![items[1].clone(), items[2].clone(), items[3].clone()];

    let handles: Vec<_> = [batch1, batch2]
        .into_iter()
        .map(|batch| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for _ in 0..500 {
                    let _g = table.acquire_many(&batch).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert!(items.iter().all(|i| !i.in_progress()));
}

#[test]
fn test_in_progress_listener_can_query_lock_table() {
    let table = Arc::new(LockTable::new());
    let a = item("a.jpg");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (query, sink) = (Arc::clone(&table), Arc::clone(&seen));
    a.subscribe_fields(Arc::new(move |path: &Path, field: ItemField| {
        if field == ItemField::InProgress {
            sink.lock().unwrap().push(query.is_held(path));
        }
    }));

    let (tx, rx) = mpsc::channel();
    let worker = {
        let (table, a) = (Arc::clone(&table), Arc::clone(&a));
        thread::spawn(move || {
            drop(table.acquire(&a).unwrap());
            tx.send(()).unwrap();
        })
    };
    rx.recv_timeout(Duration::from_secs(2))
        .expect("listener blocked on the lock table");
    worker.join().unwrap();

    // Both flips happen while the caller still owns the item.
    assert_eq!(*seen.lock().unwrap(), vec![true, true]);
    assert!(!table.is_held(a.path()));
}

// --- task engine ---

struct CountingJob {
    runs: Arc<AtomicUsize>,
    delay: Duration,
}

impl Job for CountingJob {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn run(self: Box<Self>, _ctx: &JobContext<'_>) -> Result<(), JobError> {
        thread::sleep(self.delay);
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingJob;

impl Job for FailingJob {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn run(self: Box<Self>, _ctx: &JobContext<'_>) -> Result<(), JobError> {
        Err(JobError::NonZeroExit {
            name: "exiftool".into(),
            code: 2,
            stderr: "bad file".into(),
        })
    }
}

fn engine() -> TaskEngine {
    TaskEngine::start(PipelineResources::new(UiThread::spawn()), 2).unwrap()
}

#[test]
fn test_engine_runs_all_jobs_and_waits_idle() {
    let engine = engine();
    let runs = Arc::new(AtomicUsize::new(0));
    let (handler, errors) = collecting_handler();
    for _ in 0..10 {
        engine.submit(
            Box::new(CountingJob {
                runs: Arc::clone(&runs),
                delay: Duration::from_millis(5),
            }),
            Arc::clone(&handler),
        );
    }
    engine.wait_idle();
    assert_eq!(runs.load(Ordering::SeqCst), 10);
    assert!(errors.lock().unwrap().is_empty());
    engine.shutdown();
}

#[test]
fn test_engine_routes_errors_and_keeps_going() {
    let engine = engine();
    let runs = Arc::new(AtomicUsize::new(0));
    let (handler, errors) = collecting_handler();
    engine.submit(Box::new(FailingJob), Arc::clone(&handler));
    engine.submit(
        Box::new(CountingJob {
            runs: Arc::clone(&runs),
            delay: Duration::ZERO,
        }),
        handler,
    );
    engine.wait_idle();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(
        *errors.lock().unwrap(),
        vec!["exiftool exited with error code 2: bad file".to_string()]
    );
    engine.shutdown();
}

#[test]
fn test_engine_shutdown_discards_queue() {
    let engine = engine();
    let runs = Arc::new(AtomicUsize::new(0));
    let (handler, _errors) = collecting_handler();
    for _ in 0..20 {
        engine.submit(
            Box::new(CountingJob {
                runs: Arc::clone(&runs),
                delay: Duration::from_millis(50),
            }),
            Arc::clone(&handler),
        );
    }
    thread::sleep(Duration::from_millis(20));
    engine.shutdown();
    engine.wait_idle();
    assert!(runs.load(Ordering::SeqCst) <= 2, "only in-flight jobs finish");

    // Submissions after shutdown are dropped.
    engine.submit(
        Box::new(CountingJob {
            runs: Arc::clone(&runs),
            delay: Duration::ZERO,
        }),
        handler,
    );
    engine.wait_idle();
    assert!(engine.is_shut_down());
}

#[test]
fn test_job_error_exit_codes() {
    let spawn = JobError::SpawnFailure {
        name: "convert".into(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    };
    assert_eq!(spawn.exit_code(), Some(-1));
    assert!(spawn.to_string().starts_with("convert could not be started"));
    assert_eq!(JobError::Interrupted.exit_code(), None);
}
