// ─── Job queue ───
// FIFO work queue shared by the worker pool. Retries re-enter through the
// same queue, so an idle worker may only stop once nothing is pending AND
// nothing is mid-flight anywhere.

use std::collections::VecDeque;
use std::pin::pin;

use tokio::sync::{Mutex, Notify};

use crate::core::modpack::PackFile;

/// Retries granted to every job on top of its first attempt.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// One unit of work: a descriptor and the retries it has left. Jobs are
/// values; a retry pushes a fresh job instead of mutating state shared
/// with other workers.
#[derive(Debug, Clone)]
pub struct Job {
    pub file: PackFile,
    pub attempts_remaining: u32,
}

impl Job {
    pub fn new(file: PackFile) -> Self {
        Self {
            file,
            attempts_remaining: DEFAULT_ATTEMPTS,
        }
    }

    /// The follow-up job for a failed attempt, if any budget is left.
    pub fn retry(&self) -> Option<Job> {
        if self.attempts_remaining == 0 {
            return None;
        }
        Some(Job {
            file: self.file.clone(),
            attempts_remaining: self.attempts_remaining - 1,
        })
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Job>,
    in_flight: usize,
}

pub struct JobQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl JobQueue {
    pub fn new(jobs: impl IntoIterator<Item = Job>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: jobs.into_iter().collect(),
                in_flight: 0,
            }),
            notify: Notify::new(),
        }
    }

    /// Pop the next job, waiting for retries from peers when the queue is
    /// momentarily empty. Returns `None` only once the queue is drained and
    /// no worker holds a job.
    pub async fn next_job(&self) -> Option<Job> {
        loop {
            // Register for a wakeup before inspecting state, otherwise a
            // notification landing between the check and the await is lost.
            let mut notified = pin!(self.notify.notified());
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if let Some(job) = state.pending.pop_front() {
                    state.in_flight += 1;
                    return Some(job);
                }
                if state.in_flight == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Mark a popped job finished for good, successfully or not. Wakes every
    /// waiting worker when this was the last piece of work.
    pub async fn job_done(&self) {
        let mut state = self.state.lock().await;
        state.in_flight -= 1;
        let drained = state.in_flight == 0 && state.pending.is_empty();
        drop(state);

        if drained {
            self.notify.notify_waiters();
        }
    }

    /// Push a retry back and release the in-flight slot it came from.
    pub async fn requeue(&self, job: Job) {
        let mut state = self.state.lock().await;
        state.in_flight -= 1;
        state.pending.push_back(job);
        drop(state);

        self.notify.notify_one();
    }
}
