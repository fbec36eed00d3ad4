use chrono::NaiveDate;
use geotagger::model::{
    Debouncer, Dispatcher, ItemField, MediaItem, Observable, Registry, RegistryEvent, UiThread,
};
use geotagger::pipeline::TimerHandle;
use geotagger::{GeoLocation, MediaKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"").unwrap();
    path
}

fn day(d: u32) -> Option<chrono::NaiveDateTime> {
    NaiveDate::from_ymd_opt(2020, 1, d)
        .unwrap()
        .and_hms_opt(12, 0, 0)
}

fn order(registry: &Registry) -> Vec<PathBuf> {
    registry
        .snapshot()
        .iter()
        .map(|i| i.path().to_path_buf())
        .collect()
}

// --- observable ---

#[test]
fn test_observable_notifies_only_on_change() {
    let cell = Observable::new(1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    cell.subscribe(move |v| sink.lock().unwrap().push(*v));

    assert!(cell.set(2));
    assert!(!cell.set(2));
    assert!(cell.set(3));
    assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
    assert_eq!(cell.get(), 3);
}

// --- media item ---

#[test]
fn test_item_from_file_seeds_fs_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let path = touch(dir.path(), "a.jpg");
    let item = MediaItem::from_file(&path).unwrap();
    assert_eq!(item.kind(), MediaKind::Image);
    assert!(item.creation_timestamp().is_some());
    assert!(!item.in_progress());
    assert!(MediaItem::from_file(&dir.path().join("notes.txt")).is_none());
}

#[test]
fn test_apply_metadata_never_clears_fields() {
    let item = MediaItem::new("/p/a.mp4", MediaKind::Video);
    item.set_creation_timestamp(day(1));
    item.set_geolocation(GeoLocation::new(1.0, 2.0));

    item.apply_metadata(&geotagger::MetadataRecord {
        duration_seconds: Some(10.0),
        frame_rate: Some(30.0),
        ..Default::default()
    });
    assert_eq!(item.creation_timestamp(), day(1));
    assert_eq!(item.geolocation(), GeoLocation::new(1.0, 2.0));
    assert_eq!(item.video_timing(), Some((10.0, 30.0)));
}

// --- registry ---

#[test]
fn test_registry_add_filters_existing_paths() {
    let dir = tempfile::tempdir().unwrap();
    let a = touch(dir.path(), "a.jpg");
    let b = touch(dir.path(), "b.mov");
    let c = touch(dir.path(), "c.png");
    let registry = Registry::new();

    let first = registry.add(&[a.clone(), b.clone()]);
    assert_eq!((first.images.len(), first.videos.len()), (1, 1));

    let second = registry.add(&[b.clone(), c.clone(), c.clone(), a.clone()]);
    assert_eq!(second.len(), 1);
    assert_eq!(second.images[0].path(), c.as_path());
    assert_eq!(registry.len(), 3);

    assert!(registry.add(&[a, b, c]).is_empty());
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_registry_ignores_unsupported_files() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        touch(dir.path(), "notes.txt"),
        touch(dir.path(), ".a.thumb"),
        touch(dir.path(), "a.jpg"),
    ];
    let registry = Registry::new();
    assert_eq!(registry.add(&files).len(), 1);
    assert_eq!(order(&registry), vec![dir.path().join("a.jpg")]);
}

#[test]
fn test_registry_sort_by_timestamp_then_path() {
    let dir = tempfile::tempdir().unwrap();
    let a = touch(dir.path(), "a.jpg");
    let b = touch(dir.path(), "b.jpg");
    let c = touch(dir.path(), "c.jpg");
    let d = touch(dir.path(), "d.jpg");
    let registry = Registry::new();
    registry.add(&[a.clone(), b.clone(), c.clone(), d.clone()]);

    registry.get(&a).unwrap().set_creation_timestamp(day(3));
    registry.get(&b).unwrap().set_creation_timestamp(day(1));
    registry.get(&c).unwrap().set_creation_timestamp(day(3));
    registry.get(&d).unwrap().set_creation_timestamp(None);
    registry.sort();

    assert_eq!(order(&registry), vec![d, b, a, c]);
}

#[test]
fn test_registry_events() {
    let dir = tempfile::tempdir().unwrap();
    let a = touch(dir.path(), "a.jpg");
    let b = touch(dir.path(), "b.jpg");
    let registry = Registry::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    registry.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    registry.add(&[b.clone(), a.clone()]);
    registry
        .get(&a)
        .unwrap()
        .set_geolocation(GeoLocation::new(1.0, 1.0));
    registry.get(&a).unwrap().set_creation_timestamp(day(1));
    registry.get(&b).unwrap().set_creation_timestamp(day(2));
    registry.sort();
    registry.sort();

    let events = events.lock().unwrap();
    assert_eq!(events[0], RegistryEvent::Inserted(vec![b.clone(), a.clone()]));
    assert!(events.contains(&RegistryEvent::FieldChanged {
        path: a.clone(),
        field: ItemField::Geolocation,
    }));
    let sorted = events
        .iter()
        .filter(|e| **e == RegistryEvent::Sorted)
        .count();
    assert_eq!(sorted, 1, "second sort changes nothing");
}

#[test]
fn test_registry_select_and_count_in_progress() {
    let dir = tempfile::tempdir().unwrap();
    let a = touch(dir.path(), "a.jpg");
    let b = touch(dir.path(), "b.jpg");
    let registry = Registry::new();
    registry.add(&[a.clone(), b.clone()]);

    let selected = registry.select(&[b.clone(), dir.path().join("missing.jpg")]);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].path(), b.as_path());
    assert_eq!(registry.count_in_progress(), 0);
}

#[test]
fn test_concurrent_adds_keep_paths_unique() {
    let dir = tempfile::tempdir().unwrap();
    let files: Arc<Vec<PathBuf>> = Arc::new(
        (0..300)
            .map(|i| touch(dir.path(), &format!("img{i:03}.jpg")))
            .collect(),
    );

    for _ in 0..20 {
        let registry = Registry::new();
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let (registry, barrier, files) =
                    (Arc::clone(&registry), Arc::clone(&barrier), Arc::clone(&files));
                thread::spawn(move || {
                    barrier.wait();
                    registry.add(&files).len()
                })
            })
            .collect();
        let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(inserted, 300, "each path is inserted by exactly one call");
        assert_eq!(registry.len(), 300);
    }
}

// --- UI dispatcher ---

#[test]
fn test_ui_thread_runs_tasks_in_order() {
    let ui = UiThread::spawn();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for i in 0..20 {
        let seen = Arc::clone(&seen);
        ui.post(Box::new(move || seen.lock().unwrap().push(i)));
    }
    ui.sync();
    assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<_>>());
    ui.stop();
}

#[test]
fn test_ui_thread_sync_after_stop_returns() {
    let ui = UiThread::spawn();
    ui.stop();
    ui.sync();
}

// --- coalescing ---

#[test]
fn test_debouncer_collapses_burst_into_one_run() {
    let ui = UiThread::spawn();
    let timer = TimerHandle::spawn().unwrap();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let debouncer = Debouncer::new(timer.clone(), ui.clone(), Duration::from_millis(100), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    for _ in 0..50 {
        debouncer.trigger();
    }
    assert!(debouncer.is_pending());
    thread::sleep(Duration::from_millis(400));
    ui.sync();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!debouncer.is_pending());

    // Re-armed after firing.
    debouncer.trigger();
    thread::sleep(Duration::from_millis(400));
    ui.sync();
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    timer.stop();
    ui.stop();
}

#[test]
fn test_coalescer_sorts_registry_after_timestamp_changes() {
    let dir = tempfile::tempdir().unwrap();
    let a = touch(dir.path(), "a.jpg");
    let b = touch(dir.path(), "b.jpg");
    let ui = UiThread::spawn();
    let timer = TimerHandle::spawn().unwrap();
    let registry = Registry::new();
    let counts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&counts);
    let _coalescer = geotagger::model::Coalescer::attach(
        &registry,
        timer.clone(),
        ui.clone(),
        Duration::from_millis(50),
        move |n| sink.lock().unwrap().push(n),
    );

    registry.add(&[a.clone(), b.clone()]);
    registry.get(&a).unwrap().set_creation_timestamp(day(9));
    registry.get(&b).unwrap().set_creation_timestamp(day(1));
    thread::sleep(Duration::from_millis(300));
    ui.sync();
    assert_eq!(order(&registry), vec![b, a]);
    assert!(counts.lock().unwrap().is_empty(), "no in-progress change yet");

    timer.stop();
    ui.stop();
}

// --- timer ---

#[test]
fn test_timer_runs_tasks_in_due_order() {
    let timer = TimerHandle::spawn().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for (delay, tag) in [(120, "late"), (20, "early"), (60, "middle")] {
        let seen = Arc::clone(&seen);
        timer.schedule(
            Duration::from_millis(delay),
            Box::new(move || seen.lock().unwrap().push(tag)),
        );
    }
    thread::sleep(Duration::from_millis(400));
    assert_eq!(*seen.lock().unwrap(), vec!["early", "middle", "late"]);
    timer.stop();
}

#[test]
fn test_dispatcher_is_object_safe() {
    let ui: Arc<dyn Dispatcher> = UiThread::spawn();
    let (tx, rx) = std::sync::mpsc::channel();
    ui.post(Box::new(move || tx.send(7).unwrap()));
    assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 7);
}
