//! Scripted in-memory workshop service for unit tests.
//!
//! Every call is answered from inside `run_callbacks`, never synchronously,
//! the way the Steamworks SDK behaves.

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Mutex;

use moduploader_protocol::{
    AppId, CATEGORY_TAG, CSL_APP_ID, ItemRecord, PublishedFileId, ResultCode, SteamId,
    WorkshopFileType,
};

use crate::service::{
    Completion, CreatedItem, Pending, ServiceCapabilities, UpdateOperation, UpdateProgress,
    UpdateRequest, UpdateStatus, UpdateSubmitted, WorkshopService, pending,
};

/// Account the fake reports as the current operator.
pub(crate) const OPERATOR: SteamId = SteamId(76_561_198_000_000_001);

/// Id handed out by creates that were not scripted.
pub(crate) const DEFAULT_CREATED_ID: PublishedFileId = PublishedFileId(12345);

/// Builds an item the operator may update.
pub(crate) fn eligible_record(id: u64, title: &str) -> ItemRecord {
    ItemRecord {
        id: PublishedFileId(id),
        result: ResultCode::Ok,
        title: title.into(),
        description: format!("{title} description"),
        tags: vec![CATEGORY_TAG.into(), "1.16.0-f3-compatible".into()],
        owner: OPERATOR,
        creator_app: CSL_APP_ID,
        file_type: WorkshopFileType::Community,
        preview_url: None,
    }
}

/// Recorded service call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    QueryItem(PublishedFileId),
    QueryPage(AppId, u32),
    Create(AppId),
    Update(UpdateRequest),
}

/// Scripted behavior of one submitted update.
pub(crate) struct ScriptedUpdate {
    /// Counters reported on successive pumps before the update resolves.
    pub progress: Vec<UpdateProgress>,
    /// `None` keeps the update in flight forever.
    pub result: Option<Result<UpdateSubmitted, ResultCode>>,
}

impl ScriptedUpdate {
    pub fn succeeding() -> Self {
        Self {
            progress: vec![bytes(0, 100), bytes(40, 100), bytes(100, 100)],
            result: Some(Ok(UpdateSubmitted::default())),
        }
    }

    pub fn failing(code: ResultCode) -> Self {
        Self {
            progress: vec![bytes(10, 100)],
            result: Some(Err(code)),
        }
    }

    pub fn hanging() -> Self {
        Self {
            progress: vec![bytes(1, 100)],
            result: None,
        }
    }
}

pub(crate) fn bytes(done: u64, total: u64) -> UpdateProgress {
    UpdateProgress {
        status: UpdateStatus::UploadingContent,
        bytes_done: done,
        bytes_total: total,
    }
}

struct InFlightUpdate {
    step: Rc<Cell<usize>>,
    steps: usize,
    tx: Completion<UpdateSubmitted>,
    result: Option<Result<UpdateSubmitted, ResultCode>>,
}

type Callback = Box<dyn FnOnce()>;

pub(crate) struct FakeService {
    capabilities: ServiceCapabilities,
    pumps: Cell<u32>,
    items: Mutex<HashMap<PublishedFileId, Result<Option<ItemRecord>, ResultCode>>>,
    pages: Mutex<HashMap<u32, Result<Vec<ItemRecord>, ResultCode>>>,
    creates: Mutex<VecDeque<Option<Result<CreatedItem, ResultCode>>>>,
    updates: Mutex<VecDeque<ScriptedUpdate>>,
    calls: Mutex<Vec<Call>>,
    queued: Mutex<Vec<Callback>>,
    in_flight: Mutex<Vec<InFlightUpdate>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            capabilities: ServiceCapabilities::default(),
            pumps: Cell::new(0),
            items: Mutex::new(HashMap::new()),
            pages: Mutex::new(HashMap::new()),
            creates: Mutex::new(VecDeque::new()),
            updates: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            queued: Mutex::new(Vec::new()),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn without_description_editing(mut self) -> Self {
        self.capabilities.description_editing = false;
        self
    }

    pub fn with_item(self, record: ItemRecord) -> Self {
        self.items.lock().unwrap().insert(record.id, Ok(Some(record)));
        self
    }

    pub fn with_query_error(self, id: PublishedFileId, code: ResultCode) -> Self {
        self.items.lock().unwrap().insert(id, Err(code));
        self
    }

    pub fn with_page(self, page: u32, items: Vec<ItemRecord>) -> Self {
        self.pages.lock().unwrap().insert(page, Ok(items));
        self
    }

    pub fn with_page_error(self, page: u32, code: ResultCode) -> Self {
        self.pages.lock().unwrap().insert(page, Err(code));
        self
    }

    /// Queues the answer of the next create. `None` drops the call unanswered.
    pub fn script_create(self, reply: Option<Result<CreatedItem, ResultCode>>) -> Self {
        self.creates.lock().unwrap().push_back(reply);
        self
    }

    pub fn script_update(self, update: ScriptedUpdate) -> Self {
        self.updates.lock().unwrap().push_back(update);
        self
    }

    pub fn pumps(&self) -> u32 {
        self.pumps.get()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create(_)))
            .count()
    }

    pub fn update_requests(&self) -> Vec<UpdateRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn answer_later<T: 'static>(&self, reply: Option<Result<T, ResultCode>>) -> Pending<T> {
        let (tx, rx) = pending();
        let callback: Callback = match reply {
            Some(result) => Box::new(move || {
                let _ = tx.send(result);
            }),
            None => Box::new(move || drop(tx)),
        };
        self.queued.lock().unwrap().push(callback);
        rx
    }
}

impl WorkshopService for FakeService {
    fn current_user(&self) -> SteamId {
        OPERATOR
    }

    fn capabilities(&self) -> ServiceCapabilities {
        self.capabilities
    }

    fn run_callbacks(&self) {
        self.pumps.set(self.pumps.get() + 1);

        let queued: Vec<Callback> = std::mem::take(&mut *self.queued.lock().unwrap());
        for callback in queued {
            callback();
        }

        let mut in_flight = self.in_flight.lock().unwrap();
        let mut still_running = Vec::new();
        for mut update in in_flight.drain(..) {
            if update.step.get() < update.steps {
                update.step.set(update.step.get() + 1);
                still_running.push(update);
                continue;
            }
            match update.result.take() {
                Some(result) => {
                    let _ = update.tx.send(result);
                }
                None => still_running.push(update),
            }
        }
        *in_flight = still_running;
    }

    fn query_item(&self, id: PublishedFileId) -> Pending<Option<ItemRecord>> {
        self.record(Call::QueryItem(id));
        let reply = self.items.lock().unwrap().get(&id).cloned().unwrap_or(Ok(None));
        self.answer_later(Some(reply))
    }

    fn query_owned_page(&self, app_id: AppId, page: u32) -> Pending<Vec<ItemRecord>> {
        self.record(Call::QueryPage(app_id, page));
        let reply = self
            .pages
            .lock()
            .unwrap()
            .get(&page)
            .cloned()
            .unwrap_or(Ok(Vec::new()));
        self.answer_later(Some(reply))
    }

    fn create_item(&self, app_id: AppId) -> Pending<CreatedItem> {
        self.record(Call::Create(app_id));
        let reply = self.creates.lock().unwrap().pop_front().unwrap_or(Some(Ok(CreatedItem {
            id: DEFAULT_CREATED_ID,
            needs_legal_agreement: false,
        })));
        self.answer_later(reply)
    }

    fn submit_update(&self, request: &UpdateRequest) -> UpdateOperation {
        self.record(Call::Update(request.clone()));
        let script = self
            .updates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(ScriptedUpdate::succeeding);

        let (tx, rx) = pending();
        let step = Rc::new(Cell::new(0));
        let steps = Rc::new(script.progress);
        self.in_flight.lock().unwrap().push(InFlightUpdate {
            step: Rc::clone(&step),
            steps: steps.len(),
            tx,
            result: script.result,
        });

        UpdateOperation::new(rx, move || {
            step.get()
                .checked_sub(1)
                .and_then(|i| steps.get(i).copied())
                .unwrap_or_default()
        })
    }
}
