//! Cancellable auto-advance: a periodic task driving frame navigation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const SLEEP_SLICE_MS: u64 = 10;

/// Periodic auto-advance task.
///
/// Repeatedly invokes the injected `advance` callback until the callback
/// reports the end of the sequence or the task is stopped. Each invocation
/// runs to completion before the stop token is honored, so cancellation
/// never observes a half-applied frame transition.
pub struct Playback {
    stop: Arc<AtomicBool>,
    interval_ms: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Playback {
    /// Start advancing at `interval`. `advance` returns `false` once there
    /// is no further frame, which ends the task on its own.
    pub fn start<F>(interval: Duration, mut advance: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let interval_ms = Arc::new(AtomicU64::new(interval.as_millis() as u64));

        let worker_stop = Arc::clone(&stop);
        let worker_interval = Arc::clone(&interval_ms);
        let handle = thread::spawn(move || {
            'task: loop {
                if worker_stop.load(Ordering::SeqCst) || !advance() {
                    break;
                }
                // Sleep in short slices so stop requests and interval
                // changes take effect promptly.
                let mut slept = 0;
                loop {
                    if worker_stop.load(Ordering::SeqCst) {
                        break 'task;
                    }
                    let interval = worker_interval.load(Ordering::SeqCst);
                    if slept >= interval {
                        break;
                    }
                    let slice = (interval - slept).min(SLEEP_SLICE_MS);
                    thread::sleep(Duration::from_millis(slice));
                    slept += slice;
                }
            }
        });

        Self {
            stop,
            interval_ms,
            handle: Some(handle),
        }
    }

    /// Adjust the advance interval while the task is running.
    pub fn set_interval(&self, interval: Duration) {
        self.interval_ms
            .store(interval.as_millis() as u64, Ordering::SeqCst);
    }

    /// True once the worker has ended, either by cancellation or by the
    /// callback reporting the end of the sequence.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Cancel the task and wait for the worker to wind down.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_runs_until_callback_reports_end() {
        let count = Arc::new(AtomicUsize::new(0));
        let worker_count = Arc::clone(&count);

        let playback = Playback::start(Duration::from_millis(1), move || {
            worker_count.fetch_add(1, Ordering::SeqCst) < 4
        });

        for _ in 0..200 {
            if playback.is_finished() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(playback.is_finished());
        assert_eq!(count.load(Ordering::SeqCst), 5);
        playback.stop();
    }

    #[test]
    fn test_stop_cancels_early() {
        let count = Arc::new(AtomicUsize::new(0));
        let worker_count = Arc::clone(&count);

        let playback = Playback::start(Duration::from_millis(50), move || {
            worker_count.fetch_add(1, Ordering::SeqCst);
            true
        });

        thread::sleep(Duration::from_millis(10));
        playback.stop();

        let after_stop = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_set_interval_while_running() {
        let count = Arc::new(AtomicUsize::new(0));
        let worker_count = Arc::clone(&count);

        let playback = Playback::start(Duration::from_secs(60), move || {
            worker_count.fetch_add(1, Ordering::SeqCst);
            true
        });

        // The next tick would be a minute out; shortening the interval
        // pulls it in.
        playback.set_interval(Duration::from_millis(1));
        for _ in 0..200 {
            if count.load(Ordering::SeqCst) >= 2 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(count.load(Ordering::SeqCst) >= 2);
        playback.stop();
    }
}
