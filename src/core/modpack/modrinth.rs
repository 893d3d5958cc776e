// ─── Modrinth ───
// Index types and download resolution for packs shipping a
// `modrinth.index.json`. No remote lookups: the index embeds the download
// locations and the install path of every file.

use std::collections::BTreeMap;

use reqwest::Url;
use serde::Deserialize;
use tracing::warn;

use crate::core::error::{FetchError, FetchResult};
use crate::core::modpack::{
    count_overrides, read_archive_json, Category, Modpack, ModpackInfo, PackArchive, PackFile,
};

/// Fixed overrides root in the mrpack layout.
const OVERRIDES_ROOT: &str = "overrides";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModrinthIndex {
    pub format_version: i64,
    pub game: String,
    pub version_id: String,
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub files: Vec<ModrinthIndexFile>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

/// One file entry of the index. `path` is relative to the install root and
/// already carries the category folder (`mods/`, `resourcepacks/`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct ModrinthIndexFile {
    pub path: String,
    #[serde(default)]
    pub downloads: Vec<String>,
}

pub struct ModrinthService;

impl ModrinthService {
    pub fn load(&self, archive: &mut PackArchive) -> FetchResult<Modpack> {
        let index: ModrinthIndex = read_archive_json(archive, "modrinth.index.json")?;

        let dependencies = index
            .dependencies
            .iter()
            .map(|(id, version)| format!("{id} {version}"))
            .collect();

        let files: Vec<PackFile> = index.files.into_iter().map(PackFile::Modrinth).collect();

        let override_count = count_overrides(archive, OVERRIDES_ROOT);

        Ok(Modpack {
            info: ModpackInfo {
                format: "Modrinth",
                name: index.name,
                author: None,
                version: Some(index.version_id),
                description: index.summary,
                dependencies,
            },
            files,
            overrides_root: OVERRIDES_ROOT.to_string(),
            override_count,
        })
    }

    /// The index path names the install folder directly.
    pub fn file_type(&self, file: &ModrinthIndexFile) -> Category {
        Category::from_path(&file.path)
    }

    /// Candidate locations come straight from the index, in declaration
    /// order. Unparseable entries are dropped with a warning.
    pub fn download_uris(&self, file: &ModrinthIndexFile) -> FetchResult<Vec<Url>> {
        let mut candidates = Vec::with_capacity(file.downloads.len());
        for raw in &file.downloads {
            match Url::parse(raw) {
                Ok(url) => candidates.push(url),
                Err(_) => warn!("{}: skipping unparseable download url {raw:?}", file.path),
            }
        }

        if candidates.is_empty() {
            return Err(FetchError::ResolutionFailed {
                file: file.path.clone(),
            });
        }
        Ok(candidates)
    }
}
