//! Data types for the upload flow.

use std::fmt;
use std::path::PathBuf;

use moduploader_protocol::{ItemRecord, PublishedFileId, community_page_link};

/// Step of a submission, used in progress reporting and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Validate,
    Resolve,
    List,
    Create,
    Guard,
    Upload,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Validate => write!(f, "validation"),
            Phase::Resolve => write!(f, "item query"),
            Phase::List => write!(f, "item listing"),
            Phase::Create => write!(f, "item creation"),
            Phase::Guard => write!(f, "file locking"),
            Phase::Upload => write!(f, "upload"),
        }
    }
}

/// A workshop item being created or updated.
///
/// The id is only ever assigned by a successful create (or taken from a
/// resolved record), so a descriptor that reports [`is_new`](Self::is_new)
/// never carries one.
#[derive(Debug, Clone, PartialEq)]
pub struct ModDescriptor {
    id: Option<PublishedFileId>,
    pub title: String,
    pub description: Option<String>,
    /// Custom tags; the category and compatibility tags are added on submit.
    pub tags: Vec<String>,
    pub content_path: PathBuf,
    pub preview_image_path: Option<PathBuf>,
    pub change_log: Option<String>,
    pub update_preview_only: bool,
    /// False when the service cannot return the full description, in which
    /// case an update never overwrites the stored one.
    pub description_editable: bool,
    pub preview_url: Option<String>,
}

impl ModDescriptor {
    /// Descriptor for an item that does not exist yet.
    pub fn new(title: impl Into<String>, description: Option<String>, tags: Vec<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description,
            tags,
            content_path: PathBuf::new(),
            preview_image_path: None,
            change_log: None,
            update_preview_only: false,
            description_editable: true,
            preview_url: None,
        }
    }

    /// Descriptor for an existing item, seeded from the service's record.
    pub fn from_record(record: &ItemRecord, description_editable: bool) -> Self {
        let description = (description_editable && !record.description.is_empty())
            .then(|| record.description.clone());
        Self {
            id: Some(record.id),
            title: record.title.clone(),
            description,
            tags: record.tags.clone(),
            content_path: PathBuf::new(),
            preview_image_path: None,
            change_log: None,
            update_preview_only: false,
            description_editable,
            preview_url: record.preview_url.clone(),
        }
    }

    pub fn id(&self) -> Option<PublishedFileId> {
        self.id
    }

    /// True until the item has been created on the workshop.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn with_content(mut self, content_path: impl Into<PathBuf>) -> Self {
        self.content_path = content_path.into();
        self
    }

    pub fn with_preview(mut self, preview: impl Into<PathBuf>) -> Self {
        self.preview_image_path = Some(preview.into());
        self
    }

    pub(crate) fn assign_id(&mut self, id: PublishedFileId) {
        self.id = Some(id);
    }
}

/// Terminal outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub id: PublishedFileId,
    /// True when the item was created by this submission.
    pub created: bool,
    pub upload_attempts: u32,
    /// True when Steam reports the workshop legal agreement is not accepted
    /// yet; the item stays hidden until it is.
    pub needs_legal_agreement: bool,
}

impl PublishOutcome {
    /// Deep link opening the item's community page in the Steam client.
    pub fn link(&self) -> String {
        community_page_link(self.id)
    }
}

/// Result of a submission as surfaced to the operator.
#[derive(Debug)]
pub enum PublishResult {
    Success(PublishedFileId),
    Failure(String),
}

impl<E: fmt::Display> From<&Result<PublishOutcome, E>> for PublishResult {
    fn from(result: &Result<PublishOutcome, E>) -> Self {
        match result {
            Ok(outcome) => PublishResult::Success(outcome.id),
            Err(e) => PublishResult::Failure(e.to_string()),
        }
    }
}
