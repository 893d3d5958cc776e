// ─── CurseForge ───
// Manifest types, API client and download-URL resolution for packs shipping
// a `manifest.json`.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{info, warn};

use crate::core::error::{FetchError, FetchResult};
use crate::core::http::{RateLimiter, APP_USER_AGENT};
use crate::core::modpack::{
    count_overrides, read_archive_json, Category, Modpack, ModpackInfo, PackArchive, PackFile,
};

const CURSEFORGE_API_BASE: &str = "https://api.curseforge.com";

/// CDN hosts serving the actual file content, in the order candidates are
/// generated: edge first, then the default media host.
const CDN_MIRRORS: [&str; 2] = [
    "https://edge.forgecdn.net",
    "https://mediafilez.forgecdn.net",
];

// classId values the classifier understands.
const CLASS_MOD: i64 = 6;
const CLASS_SHADER_PACK: i64 = 6552;
const CLASS_RESOURCE_PACKS: [i64; 3] = [12, 4559, 4546];

// ── Manifest ────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurseForgeManifest {
    pub minecraft: MinecraftSpec,
    pub manifest_type: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub files: Vec<CurseForgeFileRef>,
    #[serde(default = "default_overrides_root")]
    pub overrides: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinecraftSpec {
    pub version: String,
    #[serde(default, rename = "modLoaders")]
    pub mod_loaders: Vec<ModLoaderRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModLoaderRef {
    pub id: String,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurseForgeFileRef {
    #[serde(rename = "projectID")]
    pub project_id: u64,
    #[serde(rename = "fileID")]
    pub file_id: u64,
    #[serde(default = "default_true")]
    pub required: bool,
}

impl CurseForgeFileRef {
    pub fn label(&self) -> String {
        format!("ProjectID:{}, FileID:{}", self.project_id, self.file_id)
    }
}

fn default_true() -> bool {
    true
}

fn default_overrides_root() -> String {
    "overrides".to_string()
}

// ── API payloads ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModInfo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub class_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModFileInfo {
    pub id: u64,
    pub file_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

// ── Client ──────────────────────────────────────────────

/// Thin client over the CurseForge REST API. Every call passes through the
/// shared rate limiter before leaving the process.
pub struct CurseForgeClient {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl CurseForgeClient {
    pub fn new(api_key: &str, limiter: Arc<RateLimiter>) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(api_key)
            .map_err(|err| FetchError::Other(format!("unusable API key: {err}")))?;
        headers.insert("x-api-key", key);

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: CURSEFORGE_API_BASE.to_string(),
            limiter,
        })
    }

    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        self.base_url = base.trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T>(&self, path: &str) -> FetchResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.limiter.acquire().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Api {
                url,
                status: status.as_u16(),
            });
        }

        let envelope = response.json::<ApiResponse<T>>().await?;
        Ok(envelope.data)
    }

    pub async fn get_mod(&self, project_id: u64) -> FetchResult<ModInfo> {
        self.get_json(&format!("/v1/mods/{project_id}")).await
    }

    pub async fn get_mod_file(&self, project_id: u64, file_id: u64) -> FetchResult<ModFileInfo> {
        self.get_json(&format!("/v1/mods/{project_id}/files/{file_id}"))
            .await
    }

    pub async fn get_download_url(&self, project_id: u64, file_id: u64) -> FetchResult<String> {
        self.get_json(&format!("/v1/mods/{project_id}/files/{file_id}/download-url"))
            .await
    }
}

// ── Service ─────────────────────────────────────────────

pub struct CurseForgeService {
    client: CurseForgeClient,
}

impl CurseForgeService {
    pub fn new(client: CurseForgeClient) -> Self {
        Self { client }
    }

    pub fn load(&self, archive: &mut PackArchive) -> FetchResult<Modpack> {
        let manifest: CurseForgeManifest = read_archive_json(archive, "manifest.json")?;

        if manifest.manifest_type != "minecraftModpack" {
            return Err(FetchError::InvalidManifest(format!(
                "unexpected manifestType {:?}",
                manifest.manifest_type
            )));
        }

        let mut dependencies = vec![format!("minecraft {}", manifest.minecraft.version)];
        dependencies.extend(manifest.minecraft.mod_loaders.iter().map(|l| l.id.clone()));

        let files: Vec<PackFile> = manifest
            .files
            .iter()
            .filter(|file| file.required)
            .cloned()
            .map(PackFile::CurseForge)
            .collect();

        let override_count = count_overrides(archive, &manifest.overrides);

        Ok(Modpack {
            info: ModpackInfo {
                format: "CurseForge",
                name: manifest.name,
                author: manifest.author,
                version: manifest.version,
                description: None,
                dependencies,
            },
            files,
            overrides_root: manifest.overrides,
            override_count,
        })
    }

    /// Classify by the owning project's classId. Never fails: lookup errors
    /// and unrecognized ids fall back to Mod.
    pub async fn file_type(&self, file: &CurseForgeFileRef) -> Category {
        match self.try_file_type(file).await {
            Ok(category) => category,
            Err(err) => {
                warn!("{}: classification failed ({err}), assuming mod", file.label());
                Category::Mod
            }
        }
    }

    async fn try_file_type(&self, file: &CurseForgeFileRef) -> FetchResult<Category> {
        let info = self.client.get_mod(file.project_id).await?;
        match info.class_id {
            Some(id) => category_for_class(id).ok_or_else(|| {
                FetchError::Other(format!("unrecognized classId {id} for {}", info.name))
            }),
            None => Err(FetchError::Other(format!("no classId for {}", info.name))),
        }
    }

    /// Resolve candidate download locations: the direct download-url
    /// endpoint, then the file metadata record, then speculative CDN
    /// reconstruction from the file id and name.
    pub async fn download_uris(&self, file: &CurseForgeFileRef) -> FetchResult<Vec<Url>> {
        let label = file.label();

        match self
            .client
            .get_download_url(file.project_id, file.file_id)
            .await
        {
            Ok(raw) => match Url::parse(&raw) {
                Ok(url) => return Ok(vec![url]),
                Err(_) => warn!("{label}: unparseable download url {raw:?}, falling back"),
            },
            Err(err) => warn!("{label}: download-url lookup failed ({err}), falling back"),
        }

        let detail = self
            .client
            .get_mod_file(file.project_id, file.file_id)
            .await?;

        if let Some(raw) = detail.download_url.as_deref() {
            if let Ok(url) = Url::parse(raw) {
                return Ok(vec![url]);
            }
        }

        let shown = detail.display_name.as_deref().unwrap_or(&detail.file_name);
        info!("{label}: {shown} has no download url, generating candidates");

        let candidates = speculative_cdn_urls(detail.id, &detail.file_name);
        if candidates.is_empty() {
            return Err(FetchError::ResolutionFailed { file: label });
        }
        Ok(candidates)
    }
}

fn category_for_class(class_id: i64) -> Option<Category> {
    if CLASS_RESOURCE_PACKS.contains(&class_id) {
        return Some(Category::ResourcePack);
    }
    match class_id {
        CLASS_SHADER_PACK => Some(Category::ShaderPack),
        CLASS_MOD => Some(Category::Mod),
        _ => None,
    }
}

// ── Speculative CDN reconstruction ──────────────────────

/// Reconstruct plausible CDN locations for a file the API refuses to link.
///
/// Observed scheme: `{mirror}/files/{idPrefix}/{idSuffix}/{fileName}` where
/// `idPrefix` is the first four digits of the decimal file id and `idSuffix`
/// the remainder, served both with and without leading zeros. File names
/// appear raw, with spaces as `+`, or percent-encoded. Candidates keep the
/// mirror-major cartesian order (idSuffix, then file-name variants) so the
/// caller tries edge before mediafilez. Ids shorter than five digits yield
/// no candidates.
///
/// Examples seen in the wild:
///   https://mediafilez.forgecdn.net/files/4593/548/jei-1.18.2-forge-10.2.1.1005.jar
///   https://mediafilez.forgecdn.net/files/4811/98/Butchersdelight+beta+1.20.1+2.0.8f.jar
///   https://edge.forgecdn.net/files/4397/900/WDA-NoFlyingStructures-1.18.2-1.19.2.zip
pub fn speculative_cdn_urls(file_id: u64, file_name: &str) -> Vec<Url> {
    let id = file_id.to_string();
    if id.len() <= 4 {
        return Vec::new();
    }

    let (id_prefix, rest) = id.split_at(4);
    let id_suffixes = [rest, rest.trim_start_matches('0')];

    let base_names = [file_name.to_string(), file_name.replace(' ', "+")];
    let mut file_names: Vec<String> = base_names.to_vec();
    file_names.extend(
        base_names
            .iter()
            .map(|name| urlencoding::encode(name).into_owned()),
    );

    let mut candidates = Vec::new();
    for mirror in CDN_MIRRORS {
        for id_suffix in &id_suffixes {
            for name in &file_names {
                let raw = format!("{mirror}/files/{id_prefix}/{id_suffix}/{name}");
                if let Ok(url) = Url::parse(&raw) {
                    candidates.push(url);
                }
            }
        }
    }
    candidates
}
