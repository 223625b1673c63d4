//! Sources of the installed game's version.

use moduploader_steam::InstalledGameLocator;

use crate::error::WorkshopError;

/// Provides the game version the compatibility tag is derived from.
pub trait GameVersionSource {
    fn game_version(&self) -> Result<String, WorkshopError>;
}

/// A version fixed up front, typically from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedVersion(pub String);

impl GameVersionSource for FixedVersion {
    fn game_version(&self) -> Result<String, WorkshopError> {
        Ok(self.0.clone())
    }
}

impl GameVersionSource for InstalledGameLocator {
    fn game_version(&self) -> Result<String, WorkshopError> {
        Ok(self.locate()?.application_version()?)
    }
}
