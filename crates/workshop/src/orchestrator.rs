//! Upload orchestrator.
//!
//! Drives one submission through validation, item creation, file locking and
//! the content upload, retrying the create and upload phases on service
//! failures.

use std::path::PathBuf;
use std::sync::OnceLock;

use moduploader_protocol::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_PAYLOAD_EXTENSIONS};
use moduploader_protocol::{AppId, CSL_APP_ID, PublishedFileId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::compat::GameVersionSource;
use crate::error::WorkshopError;
use crate::guard::{LockToken, ResourceGuard};
use crate::poll::{PollSettings, wait_for};
use crate::preview::write_default_preview;
use crate::progress::{ProgressSink, normalize};
use crate::service::{CreatedItem, UpdateRequest, UpdateSubmitted, WorkshopService};
use crate::tags::{assemble_tags, compatibility_tag};
use crate::types::{ModDescriptor, Phase, PublishOutcome};

/// Tunables of the upload flow.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub app_id: AppId,
    /// Attempts per create or upload phase, the first one included.
    pub max_attempts: u32,
    pub poll: PollSettings,
    pub payload_extensions: Vec<String>,
    /// Directory the bundled preview is written to when a new item has none.
    pub preview_dir: PathBuf,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            app_id: CSL_APP_ID,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll: PollSettings::default(),
            payload_extensions: DEFAULT_PAYLOAD_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            preview_dir: std::env::temp_dir().join("moduploader"),
        }
    }
}

/// Locked files and the request being retried for one submission.
struct UploadSession {
    request: UpdateRequest,
    token: LockToken,
}

/// Publishes mods to the workshop.
pub struct UploadOrchestrator<'a> {
    service: &'a dyn WorkshopService,
    versions: &'a dyn GameVersionSource,
    guard: ResourceGuard,
    settings: UploadSettings,
    compat: OnceLock<String>,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(
        service: &'a dyn WorkshopService,
        versions: &'a dyn GameVersionSource,
        settings: UploadSettings,
    ) -> Self {
        Self {
            service,
            versions,
            guard: ResourceGuard::new(settings.payload_extensions.iter().cloned()),
            settings,
            compat: OnceLock::new(),
        }
    }

    /// The `<version>-compatible` tag, resolved on first use and cached for
    /// the lifetime of the orchestrator.
    pub fn compatibility_tag(&self) -> Result<&str, WorkshopError> {
        if let Some(tag) = self.compat.get() {
            return Ok(tag);
        }
        let version = self.versions.game_version()?;
        let version = version.trim();
        if version.is_empty() {
            return Err(WorkshopError::Validation(vec![
                "installed game reported an empty version".into(),
            ]));
        }
        let tag = compatibility_tag(version);
        info!(%tag, "compatibility tag resolved");
        Ok(self.compat.get_or_init(|| tag))
    }

    /// Sets the content and preview paths, then submits.
    pub async fn submit_with_paths(
        &self,
        descriptor: &mut ModDescriptor,
        content_path: impl Into<PathBuf>,
        preview_path: Option<PathBuf>,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PublishOutcome, WorkshopError> {
        descriptor.content_path = content_path.into();
        if preview_path.is_some() {
            descriptor.preview_image_path = preview_path;
        }
        self.submit(descriptor, sink, cancel).await
    }

    /// Creates the item when it is new, then uploads it.
    ///
    /// A created id is written back to `descriptor` even when the upload
    /// fails afterwards, so submitting again updates the same item.
    pub async fn submit(
        &self,
        descriptor: &mut ModDescriptor,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PublishOutcome, WorkshopError> {
        info!(
            title = %descriptor.title,
            item = ?descriptor.id(),
            preview_only = descriptor.update_preview_only,
            "submission started"
        );
        let result = self.run(descriptor, sink, cancel).await;
        match &result {
            Ok(outcome) => info!(
                item = %outcome.id,
                created = outcome.created,
                attempts = outcome.upload_attempts,
                link = %outcome.link(),
                "submission completed"
            ),
            Err(e) => error!(
                item = ?descriptor.id(),
                phase = ?e.phase(),
                error = %e,
                "submission failed"
            ),
        }
        result
    }

    async fn run(
        &self,
        descriptor: &mut ModDescriptor,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PublishOutcome, WorkshopError> {
        sink.phase(Phase::Validate);
        let reasons = validate(descriptor);
        if !reasons.is_empty() {
            return Err(WorkshopError::Validation(reasons));
        }

        let preview_only = descriptor.update_preview_only;
        let tags = if preview_only {
            None
        } else {
            Some(assemble_tags(self.compatibility_tag()?, &descriptor.tags))
        };

        let preview = match &descriptor.preview_image_path {
            Some(path) => Some(path.clone()),
            None if descriptor.is_new() => Some(write_default_preview(&self.settings.preview_dir)?),
            None => None,
        };

        let created = descriptor.is_new();
        let mut needs_legal_agreement = false;
        let id = match descriptor.id() {
            Some(id) => id,
            None => {
                sink.phase(Phase::Create);
                let created = self.create(cancel).await?;
                descriptor.assign_id(created.id);
                needs_legal_agreement = created.needs_legal_agreement;
                created.id
            }
        };

        sink.phase(Phase::Guard);
        let content = (!preview_only).then_some(descriptor.content_path.as_path());
        let token = self.guard.acquire(preview.as_deref(), content)?;

        let mut request = UpdateRequest::new(self.settings.app_id, id);
        request.preview_path = preview;
        if !preview_only {
            request.title = Some(descriptor.title.trim().to_string());
            if descriptor.description_editable {
                request.description = descriptor.description.clone();
            }
            request.tags = tags;
            request.content_path = Some(descriptor.content_path.clone());
        }
        if !created {
            request.change_log = descriptor
                .change_log
                .clone()
                .filter(|note| !note.trim().is_empty());
        }

        let mut session = UploadSession { request, token };
        sink.phase(Phase::Upload);
        let (submitted, attempts) = self.upload(&session, sink, cancel).await?;
        session.token.release();

        sink.report(1.0);
        Ok(PublishOutcome {
            id,
            created,
            upload_attempts: attempts,
            needs_legal_agreement: needs_legal_agreement || submitted.needs_legal_agreement,
        })
    }

    async fn create(&self, cancel: &CancellationToken) -> Result<CreatedItem, WorkshopError> {
        let max = self.settings.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(attempt, max, "creating item");
            let answer = wait_for(
                self.service,
                self.service.create_item(self.settings.app_id),
                &self.settings.poll,
                Phase::Create,
                cancel,
                || {},
            )
            .await;

            let err = match answer {
                Ok(Ok(created)) => {
                    info!(item = %created.id, attempt, "item created");
                    return Ok(created);
                }
                Ok(Err(code)) => WorkshopError::Service {
                    phase: Phase::Create,
                    code,
                    item: None,
                },
                Err(e) => e,
            };

            if !err.is_retryable() || attempt >= max {
                return Err(err);
            }
            warn!(attempt, max, error = %err, "item creation failed, retrying");
        }
    }

    async fn upload(
        &self,
        session: &UploadSession,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(UpdateSubmitted, u32), WorkshopError> {
        let item = session.request.item;
        let max = self.settings.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(item = %item, attempt, max, files = ?session.token.paths(), "uploading");
            sink.report(0.0);

            let (completion, probe) = self.service.submit_update(&session.request).into_parts();
            let mut last = 0.0;
            let answer = wait_for(
                self.service,
                completion,
                &self.settings.poll,
                Phase::Upload,
                cancel,
                || {
                    let fraction = normalize(&probe());
                    if fraction != last {
                        last = fraction;
                        sink.report(fraction);
                    }
                },
            )
            .await;

            let err = match answer {
                Ok(Ok(submitted)) => return Ok((submitted, attempt)),
                Ok(Err(code)) => upload_error(item, code),
                Err(e) => e,
            };

            if !err.is_retryable() || attempt >= max {
                return Err(err);
            }
            warn!(item = %item, attempt, max, error = %err, "upload failed, retrying");
        }
    }
}

fn upload_error(item: PublishedFileId, code: moduploader_protocol::ResultCode) -> WorkshopError {
    WorkshopError::Service {
        phase: Phase::Upload,
        code,
        item: Some(item),
    }
}

/// Collects every problem that prevents `descriptor` from being submitted.
pub fn validate(descriptor: &ModDescriptor) -> Vec<String> {
    let mut reasons = Vec::new();
    let preview_only = descriptor.update_preview_only;

    if preview_only {
        if descriptor.is_new() {
            reasons.push("a new item cannot be a preview-only update".to_string());
        }
        if descriptor.preview_image_path.is_none() {
            reasons.push("a preview-only update needs a preview image".to_string());
        }
    } else {
        if descriptor.title.trim().is_empty() {
            reasons.push("title is required".to_string());
        }
        if !descriptor.content_path.is_dir() {
            reasons.push(format!(
                "content folder {} does not exist",
                descriptor.content_path.display()
            ));
        }
    }

    if let Some(preview) = &descriptor.preview_image_path
        && !preview.is_file()
    {
        reasons.push(format!("preview image {} does not exist", preview.display()));
    }
    reasons
}
