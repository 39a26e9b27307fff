//! Call pacing and the single transient retry

use std::thread;
use std::time::{Duration, Instant};

use crate::storage::StorageResult;

/// Enforces a minimum interval between store calls and retries a call once
/// when it fails with a transient error.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    retry_delay: Duration,
    last_call: Option<Instant>,
    calls: usize,
    retries: usize,
}

impl Throttle {
    pub fn new(min_interval: Duration, retry_delay: Duration) -> Self {
        Self {
            min_interval,
            retry_delay,
            last_call: None,
            calls: 0,
            retries: 0,
        }
    }

    /// Store calls issued so far, retries included
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn retries(&self) -> usize {
        self.retries
    }

    fn pace(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last_call = Some(Instant::now());
        self.calls += 1;
    }

    /// Run one store call.
    pub fn call<T>(&mut self, what: &str, mut f: impl FnMut() -> StorageResult<T>) -> StorageResult<T> {
        self.pace();
        match f() {
            Err(err) if err.is_transient() => {
                tracing::warn!(call = what, error = %err, "transient store error, retrying once");
                self.retries += 1;
                thread::sleep(self.retry_delay);
                self.pace();
                f()
            }
            other => other,
        }
    }
}
