//! A single-shot countdown timer driving the MOVED-synthesis heuristic.
//!
//! The original implementation busy-spins a worker thread, polling the
//! elapsed time in a hot loop. This version parks the worker thread and
//! wakes it early on `pause`/`resume`/`stop`, matching the "replace the
//! spin discipline with a sleep wait" direction (see REDESIGN FLAGS).

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Callback = Box<dyn Fn() + Send + 'static>;

struct RegisteredCallback {
    id: u64,
    callback: Callback,
}

struct Shared {
    /// Guards `running`/`exit`/wake reason; `Condvar` wakes the worker.
    state: Mutex<TimerState>,
    wake: Condvar,
    duration_ms: AtomicI64,
    /// Generation bumped by every `start()`/`stop()`, letting a stale
    /// worker thread recognize it has been superseded.
    generation: AtomicU64,
}

struct TimerState {
    running: bool,
    exit: bool,
    /// Absolute fire time while `running`. Meaningless while paused —
    /// `remaining` holds the frozen time-to-fire instead.
    deadline: Instant,
    /// Time left on the clock as of the last `pause()`, consumed by the
    /// next `resume()` to recompute `deadline`.
    remaining: Duration,
}

/// A single-shot, pausable countdown timer.
///
/// `start()` spawns a worker thread; `stop()` cancels it without firing
/// callbacks. Multiple `start()` calls are independent sessions — each
/// gets its own worker and generation number, so a timer that is stopped
/// and restarted never delivers a callback from the superseded session.
pub struct Timer {
    shared: Arc<Shared>,
    callbacks: Arc<Mutex<Vec<RegisteredCallback>>>,
    next_id: AtomicU64,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TimerState {
                    running: false,
                    exit: false,
                    deadline: Instant::now(),
                    remaining: Duration::ZERO,
                }),
                wake: Condvar::new(),
                duration_ms: AtomicI64::new(0),
                generation: AtomicU64::new(0),
            }),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
            worker: Mutex::new(None),
        }
    }

    /// Stops the timer if running, then records the new duration.
    pub fn set(&self, duration: Duration) {
        self.stop();
        self.shared.duration_ms.store(duration.as_millis() as i64, Ordering::Relaxed);
    }

    /// Begins counting from zero. When the configured duration elapses,
    /// every registered callback runs exactly once, in registration order.
    pub fn start(&self) {
        self.stop_worker_only();

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let duration_ms = self.shared.duration_ms.load(Ordering::Relaxed).max(0) as u64;
        {
            let mut state = self.shared.state.lock().unwrap();
            state.running = true;
            state.exit = false;
            state.deadline = Instant::now() + Duration::from_millis(duration_ms);
        }

        let shared = self.shared.clone();
        let callbacks = self.callbacks.clone();

        let handle = thread::spawn(move || {
            let mut state = shared.state.lock().unwrap();
            loop {
                if state.exit || shared.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                if !state.running {
                    // Paused: wait until resumed, stopped, or re-started.
                    state = shared.wake.wait(state).unwrap();
                    continue;
                }
                let now = Instant::now();
                if now >= state.deadline {
                    break;
                }
                let wait_for = state.deadline - now;
                let (guard, _timeout) = shared.wake.wait_timeout(state, wait_for).unwrap();
                state = guard;
            }

            if state.exit || shared.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            state.running = false;
            drop(state);

            for registered in callbacks.lock().unwrap().iter() {
                (registered.callback)();
            }
        });

        *self.worker.lock().unwrap() = Some(handle);
    }

    /// Freezes elapsed-time accumulation without firing callbacks.
    pub fn pause(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if state.running {
            state.remaining = state.deadline.saturating_duration_since(Instant::now());
            state.running = false;
        }
        self.shared.wake.notify_all();
    }

    /// Unfreezes elapsed-time accumulation, picking up with whatever time
    /// was left on the clock at the last `pause()`.
    pub fn resume(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if !state.running && !state.exit {
            state.deadline = Instant::now() + state.remaining;
            state.running = true;
        }
        self.shared.wake.notify_all();
    }

    /// Cancels the timer without firing callbacks, and resets elapsed time.
    pub fn stop(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.stop_worker_only();
    }

    fn stop_worker_only(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.exit = true;
            state.running = false;
        }
        self.shared.wake.notify_all();
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Registers a completion callback, returning a never-zero, monotonically
    /// increasing id usable with `remove_on_finish`.
    pub fn add_on_finish<F>(&self, callback: F) -> u64
    where
        F: Fn() + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.lock().unwrap().push(RegisteredCallback { id, callback: Box::new(callback) });
        id
    }

    pub fn remove_on_finish(&self, id: u64) {
        self.callbacks.lock().unwrap().retain(|registered| registered.id != id);
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}
