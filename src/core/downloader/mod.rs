pub mod client;
pub mod pool;
pub mod queue;

pub use client::FileFetcher;
pub use pool::{DownloadOutcome, DownloadPool, DEFAULT_CONCURRENCY};
pub use queue::{Job, JobQueue};
