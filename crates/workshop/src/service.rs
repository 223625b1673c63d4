//! Workshop service trait.
//!
//! `WorkshopService` is implemented by the front end on top of the Steamworks
//! SDK. The SDK is callback driven: every call returns immediately and its
//! result arrives later, from inside [`WorkshopService::run_callbacks`].
//! Implementations complete the returned [`Pending`] receiver from that
//! callback, which keeps the upload logic decoupled from the SDK and testable
//! with scripted fakes.

use std::path::PathBuf;

use moduploader_protocol::{AppId, ItemRecord, PublishedFileId, ResultCode, SteamId};
use tokio::sync::oneshot;

/// Result of an asynchronous service call, delivered once.
pub type Pending<T> = oneshot::Receiver<Result<T, ResultCode>>;

/// Sender half handed to the SDK callback.
pub type Completion<T> = oneshot::Sender<Result<T, ResultCode>>;

/// Creates a connected completion/pending pair.
pub fn pending<T>() -> (Completion<T>, Pending<T>) {
    oneshot::channel()
}

/// Returns a pending call that is already resolved.
pub fn ready<T>(result: Result<T, ResultCode>) -> Pending<T> {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(result);
    rx
}

/// Optional SDK features, probed once when the service is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceCapabilities {
    /// Queries return the full description in the language updates write,
    /// so it is safe to edit and re-submit it.
    pub description_editing: bool,
}

impl Default for ServiceCapabilities {
    fn default() -> Self {
        Self {
            description_editing: true,
        }
    }
}

/// A newly created workshop item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedItem {
    pub id: PublishedFileId,
    pub needs_legal_agreement: bool,
}

/// Acknowledgement of a submitted update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSubmitted {
    pub needs_legal_agreement: bool,
}

/// Fields to change on an existing item. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub app_id: AppId,
    pub item: PublishedFileId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub preview_path: Option<PathBuf>,
    pub content_path: Option<PathBuf>,
    pub change_log: Option<String>,
}

impl UpdateRequest {
    pub fn new(app_id: AppId, item: PublishedFileId) -> Self {
        Self {
            app_id,
            item,
            title: None,
            description: None,
            tags: None,
            preview_path: None,
            content_path: None,
            change_log: None,
        }
    }
}

/// Stage reported by the SDK while an update is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateStatus {
    #[default]
    Invalid,
    PreparingConfig,
    PreparingContent,
    UploadingContent,
    UploadingPreview,
    CommittingChanges,
}

/// Byte counters of an in-flight update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateProgress {
    pub status: UpdateStatus,
    pub bytes_done: u64,
    pub bytes_total: u64,
}

/// Handle on a submitted update.
pub struct UpdateOperation {
    pub completion: Pending<UpdateSubmitted>,
    probe: Box<dyn Fn() -> UpdateProgress>,
}

impl UpdateOperation {
    pub fn new(
        completion: Pending<UpdateSubmitted>,
        probe: impl Fn() -> UpdateProgress + 'static,
    ) -> Self {
        Self {
            completion,
            probe: Box::new(probe),
        }
    }

    /// Splits the handle so the completion can be awaited while the probe
    /// is still read.
    pub fn into_parts(self) -> (Pending<UpdateSubmitted>, Box<dyn Fn() -> UpdateProgress>) {
        (self.completion, self.probe)
    }
}

/// Abstract connection to the Steam Workshop.
pub trait WorkshopService {
    /// Account of the operator running the uploader.
    fn current_user(&self) -> SteamId;

    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::default()
    }

    /// Pumps the SDK callback queue, completing any finished call.
    fn run_callbacks(&self);

    /// Queries a single item. Resolves to `None` when the service knows no
    /// such item.
    fn query_item(&self, id: PublishedFileId) -> Pending<Option<ItemRecord>>;

    /// Queries one page (numbered from 1) of the operator's published items.
    fn query_owned_page(&self, app_id: AppId, page: u32) -> Pending<Vec<ItemRecord>>;

    /// Creates an empty item for `app_id`.
    fn create_item(&self, app_id: AppId) -> Pending<CreatedItem>;

    /// Submits an update and returns a handle to poll for completion.
    fn submit_update(&self, request: &UpdateRequest) -> UpdateOperation;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_pending_resolves_immediately() {
        let mut rx = ready(Ok(PublishedFileId(3)));
        assert_eq!(rx.try_recv().unwrap(), Ok(PublishedFileId(3)));
    }

    #[test]
    fn operation_parts_keep_the_probe() {
        let op = UpdateOperation::new(ready(Err(ResultCode::InvalidParam)), || UpdateProgress {
            status: UpdateStatus::UploadingContent,
            bytes_done: 3,
            bytes_total: 4,
        });
        let (mut completion, probe) = op.into_parts();
        assert_eq!(completion.try_recv().unwrap(), Err(ResultCode::InvalidParam));
        assert_eq!(probe().bytes_done, 3);
    }

    #[test]
    fn capabilities_default_allows_description() {
        assert!(ServiceCapabilities::default().description_editing);
    }
}
