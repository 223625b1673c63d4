//! Steam Workshop upload flow for Cities: Skylines mods.
//!
//! This crate implements the **business logic** of publishing a mod. It has
//! no UI and no direct SDK dependency: the front end provides a
//! `WorkshopService` implementation that bridges to Steamworks.
//!
//! # Pipeline
//!
//! 1. **Resolve**: fetch an existing item and check the operator may edit it
//! 2. **Validate**: reject incomplete descriptors before touching anything
//! 3. **Create**: create the workshop item when it is new, with retry
//! 4. **Guard**: lock the preview image and the mod assembly
//! 5. **Upload**: submit the update and poll it to completion, with retry

pub mod compat;
pub mod error;
pub mod guard;
pub mod orchestrator;
pub mod poll;
pub mod preview;
pub mod progress;
pub mod resolver;
pub mod service;
pub mod tags;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export primary types for convenience.
pub use compat::{FixedVersion, GameVersionSource};
pub use error::{Ineligibility, WorkshopError};
pub use guard::{LockToken, ResourceGuard};
pub use orchestrator::{UploadOrchestrator, UploadSettings, validate};
pub use poll::PollSettings;
pub use progress::{ProgressSink, normalize};
pub use resolver::{MetadataResolver, filter};
pub use service::{
    Completion, CreatedItem, Pending, ServiceCapabilities, UpdateOperation, UpdateProgress,
    UpdateRequest, UpdateStatus, UpdateSubmitted, WorkshopService, pending, ready,
};
pub use tags::{assemble_tags, compatibility_tag, is_compatibility_tag};
pub use types::{ModDescriptor, Phase, PublishOutcome, PublishResult};
