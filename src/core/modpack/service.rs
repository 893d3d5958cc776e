// ─── Provider dispatch ───
// Uniform surface over the two pack formats. The format is detected from
// which manifest the archive carries, and the resulting enum value is the
// only thing the download pipeline talks to.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tracing::warn;

use crate::core::config::Settings;
use crate::core::error::{FetchError, FetchResult};
use crate::core::http::RateLimiter;
use crate::core::modpack::curseforge::{CurseForgeClient, CurseForgeService};
use crate::core::modpack::modrinth::ModrinthService;
use crate::core::modpack::{Category, Modpack, PackArchive, PackFile};

/// What the download pipeline needs from a pack format.
#[async_trait]
pub trait ModpackProvider: Send + Sync {
    /// Install-folder category of one file. Infallible: providers degrade
    /// to a default instead of failing the job here.
    async fn file_type(&self, file: &PackFile) -> Category;

    /// Candidate download locations for one file, in try order.
    async fn download_uris(&self, file: &PackFile) -> FetchResult<Vec<Url>>;
}

/// Dispatcher without Box<dyn>.
pub enum Service {
    CurseForge(CurseForgeService),
    Modrinth(ModrinthService),
}

impl Service {
    /// Pick the provider by which manifest the archive carries. The limiter
    /// is the process-wide one, shared with content downloads when those are
    /// configured to queue behind it.
    pub fn detect(
        archive: &PackArchive,
        settings: &Settings,
        limiter: Arc<RateLimiter>,
    ) -> FetchResult<Self> {
        if archive.index_for_name("manifest.json").is_some() {
            let key = settings
                .curseforge_api_key
                .as_deref()
                .ok_or(FetchError::MissingApiKey)?;
            let client = CurseForgeClient::new(key, limiter)?;
            return Ok(Service::CurseForge(CurseForgeService::new(client)));
        }

        if archive.index_for_name("modrinth.index.json").is_some() {
            return Ok(Service::Modrinth(ModrinthService));
        }

        Err(FetchError::UnknownFormat)
    }

    pub fn load(&self, archive: &mut PackArchive) -> FetchResult<Modpack> {
        match self {
            Service::CurseForge(service) => service.load(archive),
            Service::Modrinth(service) => service.load(archive),
        }
    }
}

#[async_trait]
impl ModpackProvider for Service {
    async fn file_type(&self, file: &PackFile) -> Category {
        match (self, file) {
            (Service::CurseForge(service), PackFile::CurseForge(file)) => {
                service.file_type(file).await
            }
            (Service::Modrinth(service), PackFile::Modrinth(file)) => service.file_type(file),
            _ => {
                warn!(
                    "{}: descriptor does not match the detected pack format",
                    file.display_name()
                );
                Category::Unknown
            }
        }
    }

    async fn download_uris(&self, file: &PackFile) -> FetchResult<Vec<Url>> {
        match (self, file) {
            (Service::CurseForge(service), PackFile::CurseForge(file)) => {
                service.download_uris(file).await
            }
            (Service::Modrinth(service), PackFile::Modrinth(file)) => service.download_uris(file),
            _ => Err(FetchError::Other(format!(
                "{}: descriptor does not match the detected pack format",
                file.display_name()
            ))),
        }
    }
}
