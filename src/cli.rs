// ─── CLI ───
// Argument parsing and modpack archive lookup. A pack split across several
// numbered archive files is read back as one logical byte stream by
// concatenating the matches in sorted name order.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::core::error::{FetchError, FetchResult};

#[derive(Debug, Parser)]
#[command(name = "packfetch")]
#[command(about = "Concurrent Minecraft modpack downloader for CurseForge and Modrinth packs")]
#[command(version)]
pub struct Cli {
    /// Glob matching the modpack archive, e.g. "packs/*.zip"
    pub modpack: String,

    /// Directory the pack is installed into
    pub output: PathBuf,

    /// Number of parallel downloads (overrides the config file)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Resolve the modpack glob to concrete files, sorted by name.
pub fn match_archives(pattern: &str) -> FetchResult<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|source| FetchError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut matches: Vec<PathBuf> = paths
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect();
    matches.sort();

    if matches.is_empty() {
        return Err(FetchError::NoArchiveMatches);
    }

    info!("Pattern {pattern:?} matched {} file(s)", matches.len());
    Ok(matches)
}

/// Read the archive parts back to back into one buffer.
pub async fn concat_archives(paths: &[PathBuf]) -> FetchResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for path in paths {
        let mut part = tokio::fs::read(path).await.map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        bytes.append(&mut part);
    }
    Ok(bytes)
}
