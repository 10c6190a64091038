use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Shared flag a caller flips to stop a running tool.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct RunControl {
    pub poll_interval: Duration,
    /// `None` waits for the tool indefinitely.
    pub timeout: Option<Duration>,
    pub cancel: CancelToken,
}

impl Default for RunControl {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: None,
            cancel: CancelToken::new(),
        }
    }
}
