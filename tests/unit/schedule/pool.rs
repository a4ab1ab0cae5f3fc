use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::*;

fn counting_task() -> (Arc<AtomicUsize>, TickTask) {
    let n = Arc::new(AtomicUsize::new(0));
    let c = n.clone();
    (
        n,
        Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

#[test]
fn zero_workers_is_rejected() {
    assert!(matches!(TickPool::new(0), Err(TileReelError::Config(_))));
}

#[test]
fn fires_repeatedly_until_cancelled() {
    let pool = TickPool::new(2).unwrap();
    assert_eq!(pool.worker_count(), 2);
    let (n, task) = counting_task();
    let handle = pool.schedule_fixed_rate(Duration::ZERO, Duration::from_millis(10), task);
    assert_eq!(pool.scheduled(), 1);

    thread::sleep(Duration::from_millis(200));
    assert!(handle.cancel());
    assert!(handle.is_cancelled());
    assert_eq!(pool.scheduled(), 0);

    // Let any in-flight firing finish, then the count must stay put.
    thread::sleep(Duration::from_millis(30));
    let after_cancel = n.load(Ordering::SeqCst);
    assert!(after_cancel >= 3, "only {after_cancel} firings in 200ms");
    thread::sleep(Duration::from_millis(60));
    assert_eq!(n.load(Ordering::SeqCst), after_cancel);
}

#[test]
fn initial_delay_is_honored() {
    let pool = TickPool::new(1).unwrap();
    let (n, task) = counting_task();
    let _h = pool.schedule_fixed_rate(Duration::from_millis(300), Duration::from_millis(10), task);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(n.load(Ordering::SeqCst), 0);
}

#[test]
fn a_task_never_overlaps_itself() {
    let pool = TickPool::new(4).unwrap();
    let busy = Arc::new(AtomicBool::new(false));
    let overlapped = Arc::new(AtomicBool::new(false));
    let (b, o) = (busy.clone(), overlapped.clone());
    let h = pool.schedule_fixed_rate(
        Duration::ZERO,
        Duration::from_millis(1),
        Arc::new(move || {
            if b.swap(true, Ordering::SeqCst) {
                o.store(true, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_millis(5));
            b.store(false, Ordering::SeqCst);
        }),
    );
    thread::sleep(Duration::from_millis(100));
    h.cancel();
    assert!(!overlapped.load(Ordering::SeqCst));
}

#[test]
fn panicking_task_keeps_its_schedule_and_the_pool() {
    let pool = TickPool::new(1).unwrap();
    let _bad = pool.schedule_fixed_rate(
        Duration::ZERO,
        Duration::from_millis(5),
        Arc::new(|| panic!("boom")),
    );
    let (n, task) = counting_task();
    let _good = pool.schedule_fixed_rate(Duration::ZERO, Duration::from_millis(5), task);
    thread::sleep(Duration::from_millis(100));
    assert!(n.load(Ordering::SeqCst) >= 2);
    assert_eq!(pool.scheduled(), 2);
}

#[test]
fn handle_outliving_the_pool_reports_cancelled() {
    let pool = TickPool::new(1).unwrap();
    let (_n, task) = counting_task();
    let h = pool.schedule_fixed_rate(Duration::from_secs(60), Duration::from_secs(1), task);
    drop(pool);
    assert!(h.is_cancelled());
    assert!(!h.cancel());
}
