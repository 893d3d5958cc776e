// ─── Worker pool ───
// Bounded pool draining the job queue. Each worker runs the full pipeline
// for one job at a time (classify, resolve candidates, stream to disk) and
// feeds failures back through the queue until the retry budget runs out.

use std::path::Path;

use futures_util::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::Url;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::downloader::client::FileFetcher;
use crate::core::downloader::queue::{Job, JobQueue};
use crate::core::error::{error_chain, FetchError, FetchResult};
use crate::core::modpack::{Category, ModpackProvider, PackFile, Summary};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// What the pool hands back once the queue is drained. succeeded and failed
/// count jobs, so `succeeded + failed` equals the number of descriptors fed
/// in, even when two descriptors resolve to the same file name.
#[derive(Debug, Default)]
pub struct DownloadOutcome {
    pub summary: Summary,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct DownloadPool<'a, P> {
    provider: &'a P,
    fetcher: &'a FileFetcher,
    output: &'a Path,
    concurrency: usize,
    cancel: CancellationToken,
}

impl<'a, P: ModpackProvider> DownloadPool<'a, P> {
    pub fn new(
        provider: &'a P,
        fetcher: &'a FileFetcher,
        output: &'a Path,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            fetcher,
            output,
            concurrency: concurrency.max(1),
            cancel,
        }
    }

    /// Drain `files` with bounded concurrency. Partial failure is not fatal
    /// here: every job ends up either in the summary or in the failed count,
    /// and the caller decides what an incomplete run means.
    pub async fn download_all(&self, files: Vec<PackFile>) -> DownloadOutcome {
        let total = files.len();
        info!(
            "Starting downloads: {} files, concurrency={}",
            total, self.concurrency
        );

        let queue = JobQueue::new(files.into_iter().map(Job::new));
        let outcome = Mutex::new(DownloadOutcome::default());

        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
        let overall = progress.add(ProgressBar::new(total as u64));
        overall.set_style(overall_style());
        overall.set_prefix("files");

        // Workers are plain futures polled together on this task, so they
        // can borrow the queue and outcome without Arc plumbing.
        let workers =
            (0..self.concurrency).map(|_| self.worker(&queue, &outcome, &progress, &overall));
        join_all(workers).await;

        overall.finish_and_clear();
        outcome.into_inner()
    }

    async fn worker(
        &self,
        queue: &JobQueue,
        outcome: &Mutex<DownloadOutcome>,
        progress: &MultiProgress,
        overall: &ProgressBar,
    ) {
        while let Some(job) = queue.next_job().await {
            // After a cancel the queue is drained without doing work, so
            // every peer observes termination instead of waiting forever.
            if self.cancel.is_cancelled() {
                outcome.lock().await.failed += 1;
                overall.inc(1);
                queue.job_done().await;
                continue;
            }

            let label = job.file.display_name();
            match self.process(&job, progress).await {
                Ok((category, name)) => {
                    let mut guard = outcome.lock().await;
                    guard.succeeded += 1;
                    guard.summary.entry(category).or_default().insert(name);
                    drop(guard);

                    overall.inc(1);
                    queue.job_done().await;
                }
                Err(FetchError::Cancelled) => {
                    outcome.lock().await.failed += 1;
                    overall.inc(1);
                    queue.job_done().await;
                }
                Err(err) => match job.retry() {
                    Some(retry) => {
                        warn!(
                            "{label}: attempt failed ({}), {} tries left",
                            error_chain(&err),
                            retry.attempts_remaining + 1
                        );
                        queue.requeue(retry).await;
                    }
                    None => {
                        error!("{label}: permanently failed: {}", error_chain(&err));
                        outcome.lock().await.failed += 1;
                        overall.inc(1);
                        queue.job_done().await;
                    }
                },
            }
        }
    }

    /// One full attempt for one job.
    async fn process(
        &self,
        job: &Job,
        progress: &MultiProgress,
    ) -> FetchResult<(Category, String)> {
        let bar = progress.add(ProgressBar::new(0));
        bar.set_style(byte_style());
        bar.set_prefix(format!(
            "{}, Tries: {}",
            job.file.display_name(),
            job.attempts_remaining
        ));

        let result = self.try_candidates(&job.file, &bar).await;

        bar.finish_and_clear();
        progress.remove(&bar);
        result
    }

    /// Walk the candidate list in order until one download lands. The last
    /// candidate's error is kept as the cause when all of them fail.
    async fn try_candidates(
        &self,
        file: &PackFile,
        bar: &ProgressBar,
    ) -> FetchResult<(Category, String)> {
        let label = file.display_name();

        let category = self.provider.file_type(file).await;
        let folder = category
            .dir_name()
            .ok_or_else(|| FetchError::UnknownCategory {
                file: label.clone(),
            })?;

        let candidates = self.provider.download_uris(file).await?;
        let total = candidates.len();

        let mut last_err: Option<FetchError> = None;
        for (index, url) in candidates.iter().enumerate() {
            let Some(name) = file_name_from_url(url) else {
                warn!("{label}: candidate {}/{total} has no file name", index + 1);
                continue;
            };

            let dest = self.output.join(folder).join(&name);
            if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
                info!("{name} already exists, skipping");
                return Ok((category, name));
            }

            bar.set_message(name.clone());
            match self.fetcher.fetch(url, &dest, bar, &self.cancel).await {
                Ok(()) => {
                    info!("Downloaded {name} from {url}");
                    return Ok((category, name));
                }
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(err) => {
                    warn!(
                        "{label}: candidate {}/{total} failed: {}",
                        index + 1,
                        error_chain(&err)
                    );
                    last_err = Some(err);
                }
            }
        }

        Err(match last_err {
            Some(source) => FetchError::AllCandidatesFailed {
                file: label,
                source: Box::new(source),
            },
            None => FetchError::ResolutionFailed { file: label },
        })
    }
}

/// Decoded last path segment of a URL, the way the CDN names files.
/// Anything that decodes back into a path keeps only its final component.
fn file_name_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());

    let name = decoded.rsplit('/').next().unwrap_or_default();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn overall_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

fn byte_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} {wide_bar} {bytes}/{total_bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}
