pub mod cli;
pub mod core;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::core::config::Settings;
use crate::core::downloader::{DownloadPool, FileFetcher};
use crate::core::error::{error_chain, FetchError, FetchResult};
use crate::core::http::{build_http_client, RateLimiter};
use crate::core::modpack::{open_archive, summary_total, Modpack, Service};
use crate::core::overrides::apply_overrides;
use crate::core::report::{build_report, merge_summaries};

pub async fn run() -> ExitCode {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,packfetch=debug")),
        )
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Cancellation requested, shutting down");
            signal_cancel.cancel();
        }
    });

    match run_pack(cli, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", error_chain(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run_pack(cli: Cli, cancel: CancellationToken) -> FetchResult<()> {
    let settings = Settings::load();

    let archives = cli::match_archives(&cli.modpack)?;

    tokio::fs::create_dir_all(&cli.output)
        .await
        .map_err(|source| FetchError::Io {
            path: cli.output.clone(),
            source,
        })?;

    let bytes = cli::concat_archives(&archives).await?;
    let mut archive = open_archive(bytes)?;

    let limiter = Arc::new(RateLimiter::new(settings.api_quota, settings.api_window()));
    let service = Service::detect(&archive, &settings, limiter.clone())?;
    let modpack = service.load(&mut archive)?;
    log_modpack_info(&modpack);

    let concurrency = cli.concurrency.unwrap_or(settings.concurrency);
    let download_limiter = settings.limit_downloads.then(|| limiter.clone());
    let fetcher = FileFetcher::new(build_http_client()?, download_limiter);

    let pool = DownloadPool::new(&service, &fetcher, &cli.output, concurrency, cancel.clone());
    let outcome = pool.download_all(modpack.files.clone()).await;

    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }

    let required = modpack.files.len();
    info!(
        "Downloads finished: {} succeeded, {} failed",
        outcome.succeeded, outcome.failed
    );

    let override_summary = apply_overrides(&mut archive, &modpack.overrides_root, &cli.output)?;

    // The report covers whatever landed, even when the run comes up short.
    let summary = merge_summaries(outcome.summary, override_summary);
    let report = build_report(&modpack.info, &summary);
    let readme = cli.output.join("README.md");
    tokio::fs::write(&readme, report)
        .await
        .map_err(|source| FetchError::Io {
            path: readme.clone(),
            source,
        })?;
    info!(
        "Report written to {} ({} files listed)",
        readme.display(),
        summary_total(&summary)
    );

    if outcome.succeeded < required {
        return Err(FetchError::InsufficientDownloads {
            downloaded: outcome.succeeded,
            required,
        });
    }

    Ok(())
}

fn log_modpack_info(modpack: &Modpack) {
    let meta = &modpack.info;
    info!("Modpack: {} ({})", meta.name, meta.format);
    if let Some(version) = &meta.version {
        info!("Version: {version}");
    }
    if let Some(author) = &meta.author {
        info!("Author: {author}");
    }
    if let Some(description) = &meta.description {
        info!("Description: {description}");
    }
    for dependency in &meta.dependencies {
        info!("Dependency: {dependency}");
    }
    info!(
        "Files: {}, overrides: {}",
        modpack.files.len(),
        modpack.override_count
    );
}
