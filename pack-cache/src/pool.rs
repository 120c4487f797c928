//! The bounded, fixed-width worker pool the engine drives every batch through.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::progress::ProgressReporter;

/// Fixed worker-pool width, per the concurrency model.
pub const POOL_WIDTH: usize = 20;

/// Submits every element of `urls` to `handler` exactly once, across
/// [`POOL_WIDTH`] worker threads, and returns only once all of them have
/// completed (including ones whose handler panicked).
///
/// The pool is recreated for this call and torn down when it returns; there
/// is no cross-batch thread reuse. A panic inside `handler` is caught,
/// logged, and counted as a completed unit of work rather than propagated,
/// so one bad URL never aborts its peers.
pub fn dispatch<T, H>(urls: Vec<T>, reporter: &dyn ProgressReporter, message: &str, handler: H)
where
    T: Send,
    H: Fn(&T) + Sync,
{
    let total = urls.len();
    let done = AtomicUsize::new(0);
    reporter.on_progress(message, 0, total);

    if total == 0 {
        return;
    }

    let (tx, rx) = crossbeam_channel::unbounded::<T>();
    for url in urls {
        tx.send(url).expect("receiver outlives every send in this scope");
    }
    drop(tx);

    std::thread::scope(|scope| {
        for _ in 0..POOL_WIDTH.min(total) {
            let rx = rx.clone();
            let handler = &handler;
            let done = &done;
            scope.spawn(move || {
                while let Ok(item) = rx.recv() {
                    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(&item))) {
                        tracing::error!(panic = %panic_message(&panic), "download pool handler panicked");
                    }
                    let done = done.fetch_add(1, Ordering::SeqCst) + 1;
                    reporter.on_progress(message, done, total);
                }
            });
        }
    });
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn dispatches_every_item_exactly_once() {
        let seen = Mutex::new(Vec::new());
        dispatch(
            (0..50).collect::<Vec<_>>(),
            &crate::progress::NullProgress,
            "test",
            |n| seen.lock().push(*n),
        );
        let mut seen = seen.lock().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn empty_batch_completes_without_error() {
        dispatch(Vec::<i32>::new(), &crate::progress::NullProgress, "test", |_| {
            panic!("handler must not run for an empty batch")
        });
    }

    #[test]
    fn a_panicking_handler_does_not_stop_its_peers() {
        let seen = Mutex::new(Vec::new());
        dispatch(
            (0..20).collect::<Vec<_>>(),
            &crate::progress::NullProgress,
            "test",
            |n| {
                if *n == 7 {
                    panic!("boom");
                }
                seen.lock().push(*n);
            },
        );
        let seen = seen.lock();
        assert_eq!(seen.len(), 19);
        assert!(!seen.contains(&7));
    }
}
