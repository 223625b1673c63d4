//! Workshop service backed by the Steamworks SDK.

use anyhow::Context;
use moduploader_protocol::{
    AppId, CATEGORY_TAG, ItemRecord, PublishedFileId, ResultCode, SteamId, WorkshopFileType,
};
use moduploader_workshop::{
    CreatedItem, Pending, ServiceCapabilities, UpdateOperation, UpdateProgress, UpdateRequest,
    UpdateStatus, UpdateSubmitted, WorkshopService, pending, ready,
};
use steamworks::{
    AppIDs, Client, FileType, QueryResult, SingleClient, SteamError, UGCType, UserList,
    UserListOrder,
};
use tracing::{debug, warn};

/// Language item updates write their title and description in. Queries are
/// pinned to it so an edited description replaces the text it was read from.
const ITEM_LANGUAGE: &str = "english";

/// Connection to the local Steam client.
pub struct SteamworksService {
    client: Client,
    single: SingleClient,
    capabilities: ServiceCapabilities,
}

impl SteamworksService {
    /// Initializes the SDK for `app_id`. The Steam client must be running
    /// and logged in.
    pub fn init(app_id: AppId) -> anyhow::Result<Self> {
        let (client, single) =
            Client::init_app(app_id.0).context("failed to initialize Steam; is Steam running?")?;
        let ui_language = client.utils().ui_language();
        debug!(app_id = %app_id, %ui_language, "steamworks initialized");
        Ok(Self {
            client,
            single,
            capabilities: ServiceCapabilities {
                description_editing: true,
            },
        })
    }
}

impl WorkshopService for SteamworksService {
    fn current_user(&self) -> SteamId {
        SteamId(self.client.user().steam_id().raw())
    }

    fn capabilities(&self) -> ServiceCapabilities {
        self.capabilities
    }

    fn run_callbacks(&self) {
        self.single.run_callbacks();
    }

    fn query_item(&self, id: PublishedFileId) -> Pending<Option<ItemRecord>> {
        let handle = match self.client.ugc().query_item(steamworks::PublishedFileId(id.0)) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(item = %id, error = %e, "cannot create item query");
                return ready(Err(ResultCode::Fail));
            }
        };

        let (tx, rx) = pending();
        handle
            .language(ITEM_LANGUAGE)
            .include_long_desc(true)
            .fetch(move |result| {
                let reply = result
                    .map(|results| {
                        results
                            .get(0)
                            .map(|item| to_record(&item, results.preview_url(0)))
                    })
                    .map_err(to_result_code);
                let _ = tx.send(reply);
            });
        rx
    }

    fn query_owned_page(&self, app_id: AppId, page: u32) -> Pending<Vec<ItemRecord>> {
        let account = self.client.user().steam_id().account_id();
        let app = steamworks::AppId(app_id.0);
        let handle = match self.client.ugc().query_user(
            account,
            UserList::Published,
            UGCType::Items,
            UserListOrder::TitleAsc,
            AppIDs::Both {
                creator: app,
                consumer: app,
            },
            page,
        ) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(page, error = %e, "cannot create listing query");
                return ready(Err(ResultCode::Fail));
            }
        };

        let (tx, rx) = pending();
        handle
            .require_tag(CATEGORY_TAG)
            .language(ITEM_LANGUAGE)
            .include_long_desc(true)
            .fetch(move |result| {
                let reply = result
                    .map(|results| {
                        (0..results.returned_results())
                            .filter_map(|i| {
                                results
                                    .get(i)
                                    .map(|item| to_record(&item, results.preview_url(i)))
                            })
                            .collect()
                    })
                    .map_err(to_result_code);
                let _ = tx.send(reply);
            });
        rx
    }

    fn create_item(&self, app_id: AppId) -> Pending<CreatedItem> {
        let (tx, rx) = pending();
        self.client.ugc().create_item(
            steamworks::AppId(app_id.0),
            FileType::Community,
            move |result| {
                let reply = result
                    .map(|(id, needs_legal_agreement)| CreatedItem {
                        id: PublishedFileId(id.0),
                        needs_legal_agreement,
                    })
                    .map_err(to_result_code);
                let _ = tx.send(reply);
            },
        );
        rx
    }

    fn submit_update(&self, request: &UpdateRequest) -> UpdateOperation {
        let mut handle = self.client.ugc().start_item_update(
            steamworks::AppId(request.app_id.0),
            steamworks::PublishedFileId(request.item.0),
        );
        if let Some(title) = &request.title {
            handle = handle.title(title);
        }
        if let Some(description) = &request.description {
            handle = handle.description(description);
        }
        if let Some(tags) = &request.tags {
            handle = handle.tags(tags.clone(), false);
        }
        if let Some(preview) = &request.preview_path {
            handle = handle.preview_path(preview);
        }
        if let Some(content) = &request.content_path {
            handle = handle.content_path(content);
        }

        let (tx, rx) = pending();
        let watch = handle.submit(request.change_log.as_deref(), move |result| {
            let reply = result
                .map(|(_, needs_legal_agreement)| UpdateSubmitted {
                    needs_legal_agreement,
                })
                .map_err(to_result_code);
            let _ = tx.send(reply);
        });

        UpdateOperation::new(rx, move || {
            let (status, bytes_done, bytes_total) = watch.progress();
            UpdateProgress {
                status: to_update_status(status),
                bytes_done,
                bytes_total,
            }
        })
    }
}

fn to_record(item: &QueryResult, preview_url: Option<String>) -> ItemRecord {
    ItemRecord {
        id: PublishedFileId(item.published_file_id.0),
        result: ResultCode::Ok,
        title: item.title.clone(),
        description: item.description.clone(),
        tags: item.tags.clone(),
        owner: SteamId(item.owner.raw()),
        creator_app: AppId(item.creator_app_id.map(|app| app.0).unwrap_or_default()),
        file_type: to_file_type(item.file_type),
        preview_url,
    }
}

fn to_file_type(file_type: FileType) -> WorkshopFileType {
    match file_type {
        FileType::Community => WorkshopFileType::Community,
        FileType::Microtransaction => WorkshopFileType::Microtransaction,
        FileType::Collection => WorkshopFileType::Collection,
        FileType::Art => WorkshopFileType::Art,
        FileType::Video => WorkshopFileType::Video,
        FileType::Screenshot => WorkshopFileType::Screenshot,
        _ => WorkshopFileType::Other,
    }
}

fn to_update_status(status: steamworks::UpdateStatus) -> UpdateStatus {
    match status {
        steamworks::UpdateStatus::Invalid => UpdateStatus::Invalid,
        steamworks::UpdateStatus::PreparingConfig => UpdateStatus::PreparingConfig,
        steamworks::UpdateStatus::PreparingContent => UpdateStatus::PreparingContent,
        steamworks::UpdateStatus::UploadingContent => UpdateStatus::UploadingContent,
        steamworks::UpdateStatus::UploadingPreviewFile => UpdateStatus::UploadingPreview,
        steamworks::UpdateStatus::CommittingChanges => UpdateStatus::CommittingChanges,
    }
}

fn to_result_code(error: SteamError) -> ResultCode {
    match error {
        SteamError::NoConnection => ResultCode::NoConnection,
        SteamError::InvalidParameter => ResultCode::InvalidParam,
        SteamError::FileNotFound => ResultCode::FileNotFound,
        SteamError::Busy => ResultCode::Busy,
        SteamError::InvalidState => ResultCode::InvalidState,
        SteamError::InvalidName => ResultCode::InvalidName,
        SteamError::DuplicateName => ResultCode::DuplicateName,
        SteamError::AccessDenied => ResultCode::AccessDenied,
        SteamError::Timeout => ResultCode::Timeout,
        SteamError::Banned => ResultCode::Banned,
        SteamError::ServiceUnavailable => ResultCode::ServiceUnavailable,
        SteamError::NotLoggedOn => ResultCode::NotLoggedOn,
        SteamError::InsufficientPrivilege => ResultCode::InsufficientPrivilege,
        SteamError::LimitExceeded => ResultCode::LimitExceeded,
        SteamError::IOFailure => ResultCode::IoFailure,
        other => {
            debug!(error = %other, "unmapped steam error");
            ResultCode::Fail
        }
    }
}
