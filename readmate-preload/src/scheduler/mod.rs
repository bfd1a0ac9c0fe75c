//! # Preload Scheduling
//!
//! Turns reading-progress updates into speculative chapter fetches.
//!
//! ## Features
//!
//! - **Progress Trigger**: preloading starts once the reader passes the configured
//!   percentage of a chapter; updates within 5 points of the last trigger are ignored
//! - **Deduplicated Queue**: at most one task per chapter, cached chapters are skipped
//! - **Single Drain Loop**: tasks run one at a time with a 500 ms pause between them
//! - **Timeout and Retry**: 30 s per fetch, up to 3 retries after 2 s, 4 s and 8 s
//! - **Expiry Sweep**: expired chapters are removed every 10 minutes

mod manager;
pub mod progress;
pub mod task;

pub use manager::{
    retry_delay, PreloadManager, PreloadManagerStats, CLEANUP_INTERVAL, INTER_TASK_DELAY,
    MAX_RETRY_ATTEMPTS, PRELOAD_TIMEOUT, RETRY_DELAY_BASE,
};
pub use progress::{passes_step, preload_window, ReadingProgressEvent, PROGRESS_STEP};
pub use task::{PreloadStatus, PreloadTask};
