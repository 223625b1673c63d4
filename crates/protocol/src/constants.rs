use std::time::Duration;

use crate::types::AppId;

/// Steam application id of Cities: Skylines.
pub const CSL_APP_ID: AppId = AppId(255_710);

/// Tag every published mod must carry.
pub const CATEGORY_TAG: &str = "Mod";

/// Suffix of the game-version compatibility tag (`"1.17.1-f2-compatible"`).
pub const COMPATIBLE_SUFFIX: &str = "-compatible";

/// Attempts made for the create and upload phases before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Interval between two pumps of the SDK callback queue.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Extensions that mark a content folder as holding a loadable mod.
pub const DEFAULT_PAYLOAD_EXTENSIONS: &[&str] = &["dll"];

/// Host accepted when parsing workshop page URLs.
pub const COMMUNITY_HOST: &str = "steamcommunity.com";
