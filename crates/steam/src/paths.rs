use std::path::{Path, PathBuf};

use moduploader_protocol::AppId;
use tracing::debug;

use crate::SteamError;

/// Provides access to the local Steam installation and its libraries.
pub struct SteamPaths {
    dir: steamlocate::SteamDir,
}

impl SteamPaths {
    /// Creates a new `SteamPaths` with an auto-detected Steam directory.
    pub fn new() -> Result<Self, SteamError> {
        let dir = steamlocate::SteamDir::locate().map_err(|e| {
            debug!(error = %e, "steam directory not located");
            SteamError::NotFound
        })?;
        Ok(Self { dir })
    }

    /// Creates a new `SteamPaths` rooted at a custom Steam directory.
    pub fn with_base(base_dir: impl AsRef<Path>) -> Result<Self, SteamError> {
        let dir = steamlocate::SteamDir::from_dir(base_dir.as_ref()).map_err(|e| {
            debug!(path = %base_dir.as_ref().display(), error = %e, "not a steam directory");
            SteamError::NotFound
        })?;
        Ok(Self { dir })
    }

    /// Returns the install directory of `app_id`, searching every library.
    pub fn app_dir(&self, app_id: AppId) -> Result<PathBuf, SteamError> {
        let found = self
            .dir
            .find_app(app_id.0)
            .map_err(|e| SteamError::Library(e.to_string()))?;

        let Some((app, library)) = found else {
            return Err(SteamError::AppNotInstalled(app_id.0));
        };

        let path = library.resolve_app_dir(&app);
        if !path.exists() {
            return Err(SteamError::AppNotInstalled(app_id.0));
        }
        debug!(app_id = %app_id, path = %path.display(), "resolved app directory");
        Ok(path)
    }
}
