pub mod game;
pub mod paths;
pub mod version;

// Re-export primary types.
pub use game::{GameInstall, InstalledGameLocator};
pub use paths::SteamPaths;
pub use version::{read_application_version, version_candidates};

use std::path::PathBuf;

/// Errors for Steam operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("steam installation not found")]
    NotFound,

    #[error("app {0} is not installed in any Steam library")]
    AppNotInstalled(u32),

    #[error("required game file missing: {}", .0.display())]
    MissingGameFile(PathBuf),

    #[error(
        "application version not found in {}; set game_version in config.toml",
        .0.display()
    )]
    VersionNotFound(PathBuf),

    #[error(
        "several application versions in {} ({}); set game_version in config.toml",
        .path.display(),
        .candidates.join(", ")
    )]
    AmbiguousVersion {
        path: PathBuf,
        candidates: Vec<String>,
    },

    #[error("library scan failed: {0}")]
    Library(String),

    #[error("I/O error: {0}")]
    Io(String),
}
