//! Installed-game lookup.

use std::path::{Path, PathBuf};

use moduploader_protocol::AppId;
use tracing::{debug, info};

use crate::SteamError;
use crate::paths::SteamPaths;
use crate::version::read_application_version;

/// Layout of a Cities: Skylines installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInstall {
    root: PathBuf,
}

impl GameInstall {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory holding the game's managed assemblies.
    pub fn managed_dir(&self) -> PathBuf {
        self.root.join("Cities_Data").join("Managed")
    }

    pub fn assembly_csharp(&self) -> PathBuf {
        self.managed_dir().join("Assembly-CSharp.dll")
    }

    pub fn unity_engine(&self) -> PathBuf {
        self.managed_dir().join("UnityEngine.dll")
    }

    /// Checks that the assemblies the version probe needs are present.
    pub fn verify(&self) -> Result<(), SteamError> {
        for required in [self.assembly_csharp(), self.unity_engine()] {
            if !required.is_file() {
                return Err(SteamError::MissingGameFile(required));
            }
        }
        Ok(())
    }

    /// Reads the game's application version (`1.17.1-f2`).
    pub fn application_version(&self) -> Result<String, SteamError> {
        self.verify()?;
        let version = read_application_version(&self.assembly_csharp())?;
        debug!(root = %self.root.display(), %version, "read game version");
        Ok(version)
    }
}

/// Finds an installed game through the local Steam libraries.
pub struct InstalledGameLocator {
    app_id: AppId,
    steam_dir: Option<PathBuf>,
}

impl InstalledGameLocator {
    /// Locator that auto-detects the Steam directory.
    pub fn new(app_id: AppId) -> Self {
        Self {
            app_id,
            steam_dir: None,
        }
    }

    /// Locator that searches the libraries of a specific Steam directory.
    pub fn with_steam_dir(app_id: AppId, steam_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_id,
            steam_dir: Some(steam_dir.into()),
        }
    }

    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    /// Resolves the game installation.
    pub fn locate(&self) -> Result<GameInstall, SteamError> {
        let paths = match &self.steam_dir {
            Some(dir) => SteamPaths::with_base(dir)?,
            None => SteamPaths::new()?,
        };
        let root = paths.app_dir(self.app_id)?;
        info!(app_id = %self.app_id, path = %root.display(), "located game installation");
        Ok(GameInstall::new(root))
    }
}
