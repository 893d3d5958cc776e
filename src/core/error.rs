use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the whole downloader.
/// Every module returns `Result<T, FetchError>`.
#[derive(Debug, Error)]
pub enum FetchError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download failed for {url}: HTTP {status}")]
    TransferFailed { url: String, status: u16 },

    #[error("API request failed for {url}: HTTP {status}")]
    Api { url: String, status: u16 },

    // ── Modpack archive ─────────────────────────────────
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a recognized modpack archive (no manifest.json or modrinth.index.json)")]
    UnknownFormat,

    #[error("invalid modpack manifest: {0}")]
    InvalidManifest(String),

    // ── Resolution ──────────────────────────────────────
    #[error("no usable download url for {file}")]
    ResolutionFailed { file: String },

    #[error("all download candidates failed for {file}")]
    AllCandidatesFailed {
        file: String,
        #[source]
        source: Box<FetchError>,
    },

    #[error("no install folder for {file}: unrecognized category")]
    UnknownCategory { file: String },

    // ── CLI / configuration ─────────────────────────────
    #[error("invalid glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("modpack archive file not found")]
    NoArchiveMatches,

    #[error("missing CurseForge API key (set CURSEFORGE_API_KEY or add it to the config file)")]
    MissingApiKey,

    // ── Run outcome ─────────────────────────────────────
    #[error("failed to download all required files: {downloaded}/{required}")]
    InsufficientDownloads { downloaded: usize, required: usize },

    #[error("cancelled")]
    Cancelled,

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type FetchResult<T> = Result<T, FetchError>;

/// Render an error with its full source chain on one line.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        current = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_includes_nested_sources() {
        let inner = FetchError::TransferFailed {
            url: "https://example.com/a.jar".into(),
            status: 503,
        };
        let outer = FetchError::AllCandidatesFailed {
            file: "ProjectID:1, FileID:2".into(),
            source: Box::new(inner),
        };

        let rendered = error_chain(&outer);
        assert!(rendered.contains("all download candidates failed"));
        assert!(rendered.contains("HTTP 503"));
    }
}
