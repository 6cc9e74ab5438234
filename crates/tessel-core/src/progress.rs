//! Counters observable while a run is in progress, and the thread that
//! periodically prints them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Sender};
use serde::{Deserialize, Serialize};
use tessel_sandbox::console::console_lock;

/// Lock-free run counters shared between the generation loop and the
/// progress reporter.
#[derive(Debug, Default)]
pub struct RunCounters {
    pub steps: AtomicU64,
    pub generated: AtomicU64,
    pub output: AtomicU64,
    pub failures: AtomicU64,
}

/// A point-in-time copy of `RunCounters`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub steps: u64,
    pub generated: u64,
    pub output: u64,
    pub failures: u64,
}

impl RunCounters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            steps: self.steps.load(Ordering::Relaxed),
            generated: self.generated.load(Ordering::Relaxed),
            output: self.output.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Prints a progress line every `interval` until stopped or dropped.
pub struct ProgressReporter {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<u64>>,
}

impl ProgressReporter {
    pub fn spawn(counters: Arc<RunCounters>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
        let ticker = channel::tick(interval);
        let started = Instant::now();

        let handle = thread::spawn(move || {
            let mut lines = 0u64;
            loop {
                crossbeam::select! {
                    recv(ticker) -> _ => {
                        let snap = counters.snapshot();
                        let _console = console_lock();
                        eprintln!(
                            "progress: {:>6.1}s  steps {}  generated {}  output {}  failures {}",
                            started.elapsed().as_secs_f64(),
                            snap.steps,
                            snap.generated,
                            snap.output,
                            snap.failures,
                        );
                        lines += 1;
                    }
                    recv(shutdown_rx) -> _ => break,
                }
            }
            lines
        });

        Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Stop the reporter and wait for it. Returns how many lines it printed.
    pub fn stop(mut self) -> u64 {
        self.shutdown_and_join()
    }

    fn shutdown_and_join(&mut self) -> u64 {
        if let Some(tx) = self.shutdown.take() {
            // A disconnected channel wakes the reporter just as well.
            let _ = tx.send(());
        }
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(0),
            None => 0,
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
