use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use taskboard_core::{
    EngineConfig, GatewayError, RemoteGateway, Status, SyncEngine, TaskDraft, TaskId, TaskPatch,
    TaskRecord,
};
use tokio::sync::oneshot;

pub type Reply = Result<TaskRecord, GatewayError>;

/// An update call the test has not answered yet.
pub struct PendingCall {
    pub id: TaskId,
    pub patch: TaskPatch,
    reply: oneshot::Sender<Reply>,
}

impl PendingCall {
    pub fn succeed_with(self, record: TaskRecord) {
        let _ = self.reply.send(Ok(record));
    }

    /// Answers with the record the server would hold after applying the patch to `base`.
    pub fn succeed_from(self, base: &TaskRecord) {
        let mut record = base.clone();
        self.patch.apply_to(&mut record);
        self.succeed_with(record);
    }

    pub fn fail(self, error: GatewayError) {
        let _ = self.reply.send(Err(error));
    }
}

/// Gateway whose update calls stay in flight until the test answers them.
#[derive(Default)]
pub struct ControlledGateway {
    records: Mutex<Vec<TaskRecord>>,
    calls: Mutex<Vec<Option<PendingCall>>>,
    fetch_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ControlledGateway {
    pub fn with_records(records: Vec<TaskRecord>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            fetch_gate: Mutex::new(None),
        })
    }

    /// Holds the next `fetch_all` until the returned sender fires. The records are
    /// read when it is released.
    pub fn hold_next_fetch(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        *self.fetch_gate.lock().unwrap() = Some(gate);
        release
    }

    pub fn set_records(&self, records: Vec<TaskRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Takes the `n`th update call (0-based, in dispatch order).
    pub fn take_call(&self, n: usize) -> PendingCall {
        self.calls.lock().unwrap()[n]
            .take()
            .expect("call already answered")
    }
}

#[async_trait]
impl RemoteGateway for ControlledGateway {
    async fn fetch_all(&self) -> Result<Vec<TaskRecord>, GatewayError> {
        let gate = self.fetch_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<TaskRecord, GatewayError> {
        let (reply, answer) = oneshot::channel();
        self.calls.lock().unwrap().push(Some(PendingCall {
            id: id.clone(),
            patch: patch.clone(),
            reply,
        }));
        answer
            .await
            .unwrap_or_else(|_| Err(GatewayError::Network("call abandoned".to_string())))
    }

    async fn create(&self, _draft: &TaskDraft) -> Result<TaskRecord, GatewayError> {
        Err(GatewayError::Validation("not scripted".to_string()))
    }
}

pub fn record(id: &str, status: Status) -> TaskRecord {
    TaskRecord::new(id, format!("task {}", id), status)
}

pub async fn loaded_engine(
    gateway: &Arc<ControlledGateway>,
    config: EngineConfig,
) -> SyncEngine<Arc<ControlledGateway>> {
    let engine = SyncEngine::new(gateway.clone(), config);
    engine.load().await.unwrap();
    engine
}

/// Lets the other branches of a `join!` run until they are waiting again.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
