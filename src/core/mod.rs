// ─── Packfetch Core ───
// Concurrent modpack download pipeline.
//
// Architecture:
//   core/
//     config      Settings from config file + environment
//     error       FetchError taxonomy shared by every module
//     http        Shared HTTP client + sliding-window rate limiter
//     modpack/    Pack formats (CurseForge, Modrinth) + provider dispatch
//     downloader/ Job queue, worker pool, streaming fetcher
//     overrides   Override extraction from the pack archive
//     report      README.md rendering

pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod modpack;
pub mod overrides;
pub mod report;
