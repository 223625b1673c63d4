//! Resolves workshop items into editable descriptors.

use moduploader_protocol::{AppId, CATEGORY_TAG, ItemRecord, PublishedFileId, WorkshopFileType};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Ineligibility, WorkshopError};
use crate::poll::{PollSettings, wait_for};
use crate::service::WorkshopService;
use crate::types::{ModDescriptor, Phase};

/// Looks up items on the workshop and checks that the operator may update
/// them.
pub struct MetadataResolver<'a> {
    service: &'a dyn WorkshopService,
    app_id: AppId,
    poll: PollSettings,
    cancel: CancellationToken,
}

impl<'a> MetadataResolver<'a> {
    pub fn new(service: &'a dyn WorkshopService, app_id: AppId) -> Self {
        Self {
            service,
            app_id,
            poll: PollSettings::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetches an existing item and turns it into a descriptor.
    ///
    /// Every reason the item cannot be updated is collected into a single
    /// [`WorkshopError::Ineligible`].
    pub async fn resolve_by_id(&self, id: PublishedFileId) -> Result<ModDescriptor, WorkshopError> {
        debug!(item = %id, "querying item");
        let answer = wait_for(
            self.service,
            self.service.query_item(id),
            &self.poll,
            Phase::Resolve,
            &self.cancel,
            || {},
        )
        .await?;

        let record = match answer {
            Ok(Some(record)) => record,
            Ok(None) => return Err(ineligible(id, None, vec![Ineligibility::NotFound])),
            Err(code) => {
                return Err(ineligible(id, None, vec![Ineligibility::QueryFailed(code)]));
            }
        };

        let reasons = self.check(&record);
        if !reasons.is_empty() {
            warn!(item = %id, title = %record.title, reasons = reasons.len(), "item is not eligible");
            return Err(ineligible(id, Some(record.title), reasons));
        }

        let editable = self.service.capabilities().description_editing;
        info!(item = %id, title = %record.title, "item resolved");
        Ok(ModDescriptor::from_record(&record, editable))
    }

    /// Builds a descriptor for an item that will be created on submit.
    pub fn resolve_new(
        &self,
        title: impl Into<String>,
        description: Option<String>,
        tags: Vec<String>,
    ) -> ModDescriptor {
        ModDescriptor::new(title, description, tags)
    }

    /// Lists every item the operator published for the target app.
    ///
    /// Pages are fetched from 1 until the service returns an empty one.
    pub async fn list_owned(&self) -> Result<Vec<ItemRecord>, WorkshopError> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let answer = wait_for(
                self.service,
                self.service.query_owned_page(self.app_id, page),
                &self.poll,
                Phase::List,
                &self.cancel,
                || {},
            )
            .await?;

            let batch = answer.map_err(|code| WorkshopError::Service {
                phase: Phase::List,
                code,
                item: None,
            })?;
            if batch.is_empty() {
                break;
            }
            debug!(page, count = batch.len(), "fetched item page");
            items.extend(batch);
            page += 1;
        }

        info!(count = items.len(), "listed published items");
        Ok(items)
    }

    /// Returns every reason `record` cannot be updated by the operator.
    pub fn check(&self, record: &ItemRecord) -> Vec<Ineligibility> {
        let mut reasons = Vec::new();
        if !record.result.is_ok() {
            reasons.push(Ineligibility::QueryFailed(record.result));
        }
        if record.creator_app != self.app_id {
            reasons.push(Ineligibility::WrongApp {
                expected: self.app_id,
                actual: record.creator_app,
            });
        }
        if record.owner != self.service.current_user() {
            reasons.push(Ineligibility::NotAuthor);
        }
        if !record.has_tag(CATEGORY_TAG) || record.file_type != WorkshopFileType::Community {
            reasons.push(Ineligibility::NotModCategory);
        }
        reasons
    }
}

fn ineligible(
    id: PublishedFileId,
    title: Option<String>,
    reasons: Vec<Ineligibility>,
) -> WorkshopError {
    WorkshopError::Ineligible { id, title, reasons }
}

/// Case-insensitive search over item titles and ids.
///
/// An empty query matches everything.
pub fn filter<'r>(items: &'r [ItemRecord], query: &str) -> Vec<&'r ItemRecord> {
    let query = query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| {
            query.is_empty()
                || item.title.to_lowercase().contains(&query)
                || item.id.to_string().contains(&query)
        })
        .collect()
}
