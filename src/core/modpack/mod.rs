pub mod curseforge;
pub mod modrinth;
pub mod service;

pub use service::{ModpackProvider, Service};

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;

use zip::ZipArchive;

use crate::core::error::FetchResult;

/// Modpack archive held fully in memory. Split archives are concatenated
/// into one buffer before opening, so the reader is always seekable.
pub type PackArchive = ZipArchive<Cursor<Vec<u8>>>;

pub fn open_archive(bytes: Vec<u8>) -> FetchResult<PackArchive> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Deserialize a JSON entry straight out of the archive.
pub(crate) fn read_archive_json<T>(archive: &mut PackArchive, name: &str) -> FetchResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let entry = archive.by_name(name)?;
    Ok(serde_json::from_reader(entry)?)
}

/// Installation-folder classification of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Mod,
    ResourcePack,
    ShaderPack,
    Unknown,
}

impl Category {
    /// Output subdirectory for downloaded files of this category.
    pub fn dir_name(&self) -> Option<&'static str> {
        match self {
            Category::Mod => Some("mods"),
            Category::ResourcePack => Some("resourcepacks"),
            Category::ShaderPack => Some("shaderpacks"),
            Category::Unknown => None,
        }
    }

    /// Classify an archive-relative path by its leading segment.
    pub fn from_path(relative: &str) -> Self {
        match relative.split('/').next() {
            Some("mods") => Category::Mod,
            Some("resourcepacks") => Category::ResourcePack,
            Some("shaderpacks") => Category::ShaderPack,
            _ => Category::Unknown,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Mod => write!(f, "Mod"),
            Category::ResourcePack => write!(f, "ResourcePack"),
            Category::ShaderPack => write!(f, "ShaderPack"),
            Category::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Per-category sets of installed file names. Shared across workers behind a
/// lock during the download phase, merged with the override summary at the
/// end of the run.
pub type Summary = BTreeMap<Category, BTreeSet<String>>;

pub fn summary_total(summary: &Summary) -> usize {
    summary.values().map(|files| files.len()).sum()
}

/// Modpack metadata surfaced in logs and the final report.
#[derive(Debug, Clone)]
pub struct ModpackInfo {
    pub format: &'static str,
    pub name: String,
    pub author: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
}

/// One manifest entry identifying a file to obtain. Immutable once parsed;
/// jobs carry their own clone.
#[derive(Debug, Clone)]
pub enum PackFile {
    CurseForge(curseforge::CurseForgeFileRef),
    Modrinth(modrinth::ModrinthIndexFile),
}

impl PackFile {
    /// Human-readable job label used in logs and progress bars.
    pub fn display_name(&self) -> String {
        match self {
            PackFile::CurseForge(file) => file.label(),
            PackFile::Modrinth(file) => file.path.clone(),
        }
    }
}

/// Parsed modpack: metadata, the required files, and where overrides live
/// inside the archive.
#[derive(Debug)]
pub struct Modpack {
    pub info: ModpackInfo,
    pub files: Vec<PackFile>,
    pub overrides_root: String,
    pub override_count: usize,
}

/// Count the archive entries under the overrides root.
pub(crate) fn count_overrides(archive: &mut PackArchive, root: &str) -> usize {
    let prefix = format!("{root}/");
    archive
        .file_names()
        .filter(|name| name.starts_with(&prefix))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_from_leading_segment() {
        assert_eq!(Category::from_path("mods/foo.jar"), Category::Mod);
        assert_eq!(
            Category::from_path("resourcepacks/pack.zip"),
            Category::ResourcePack
        );
        assert_eq!(
            Category::from_path("shaderpacks/shader.zip"),
            Category::ShaderPack
        );
        assert_eq!(Category::from_path("config/x.toml"), Category::Unknown);
        assert_eq!(Category::from_path("options.txt"), Category::Unknown);
    }

    #[test]
    fn unknown_category_has_no_install_folder() {
        assert_eq!(Category::Mod.dir_name(), Some("mods"));
        assert_eq!(Category::Unknown.dir_name(), None);
    }

    #[test]
    fn summary_total_counts_across_categories() {
        let mut summary = Summary::new();
        summary
            .entry(Category::Mod)
            .or_default()
            .extend(["a.jar".to_string(), "b.jar".to_string()]);
        summary
            .entry(Category::ShaderPack)
            .or_default()
            .insert("s.zip".to_string());

        assert_eq!(summary_total(&summary), 3);
    }
}
