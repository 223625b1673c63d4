//! Shared data types for Mod Uploader.
//!
//! Plain records exchanged between the Steam integration, the workshop
//! core and the console front end. Nothing in here talks to Steam.

pub mod constants;
pub mod link;
pub mod result;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{CATEGORY_TAG, COMPATIBLE_SUFFIX, CSL_APP_ID};
pub use link::{ItemReferenceError, community_page_link, parse_item_reference};
pub use result::ResultCode;
pub use types::{AppId, ItemRecord, PublishedFileId, SteamId, WorkshopFileType};
