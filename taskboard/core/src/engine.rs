//! Optimistic mutation engine.
//!
//! Every mutation is applied to the local record store first so the board moves
//! immediately, then sent to the remote gateway. When the gateway answers, the
//! store is reconciled with the server's record, or restored to the snapshot taken
//! before the mutation if the call failed.
//!
//! Mutations on the same record are ordered by intent sequence, not by the order
//! in which responses arrive: only the most recent intent for a record may touch
//! the store when it resolves. Resolutions of older intents are reported as
//! [`MutationOutcome::Superseded`] and otherwise ignored.

use crate::gateway::{GatewayError, RemoteGateway};
use crate::projection::{BoardProjection, project};
use crate::store::RecordStore;
use crate::task::{DraftError, Status, TaskDraft, TaskId, TaskPatch, TaskRecord};
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that are not an expected outcome of talking to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Task {0} is not on the board")]
    UnknownRecord(TaskId),
    #[error("Invalid task: {0}")]
    InvalidDraft(#[from] DraftError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Gateway calls that take longer than this fail with a network error.
    pub request_timeout: Duration,
    /// Board columns, in display order.
    pub status_order: Vec<Status>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            status_order: Status::columns(),
        }
    }
}

/// How a mutation resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server accepted the change; the store now holds the server's record.
    Confirmed(TaskRecord),
    /// The server call failed; the store holds the record as it was before the mutation.
    Reverted {
        error: GatewayError,
        restored: TaskRecord,
    },
    /// A later mutation on the same record (or a reload or removal) took over
    /// before this one resolved. The store was left alone.
    Superseded {
        sequence: u64,
        result: Result<TaskRecord, GatewayError>,
    },
}

impl MutationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, MutationOutcome::Confirmed(_))
    }

    pub fn is_reverted(&self) -> bool {
        matches!(self, MutationOutcome::Reverted { .. })
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, MutationOutcome::Superseded { .. })
    }

    /// The failure to surface to the user, if the mutation was rolled back.
    pub fn error(&self) -> Option<&GatewayError> {
        match self {
            MutationOutcome::Reverted { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A single pending change, kept for rollback until it resolves.
#[derive(Debug)]
struct MutationIntent {
    record_id: TaskId,
    patch: TaskPatch,
    previous: TaskRecord,
    sequence: u64,
}

#[derive(Debug, Default)]
struct BoardState {
    store: RecordStore,
    /// Latest intent sequence per record with a call in flight
    pending: HashMap<TaskId, u64>,
    /// Latest intent sequence ever issued per record, pruned on reload
    issued: HashMap<TaskId, u64>,
    last_sequence: u64,
}

impl BoardState {
    fn is_latest(&self, intent: &MutationIntent) -> bool {
        self.pending.get(&intent.record_id) == Some(&intent.sequence)
    }

    fn next_sequence(&mut self, id: &TaskId) -> u64 {
        self.last_sequence += 1;
        self.issued.insert(id.clone(), self.last_sequence);
        self.pending.insert(id.clone(), self.last_sequence);
        self.last_sequence
    }

    /// Replaces the store with `fetched`, a snapshot requested when `watermark` was
    /// the last issued sequence. Records mutated after that point keep their local
    /// value and their pending intents.
    fn reload(&mut self, fetched: Vec<TaskRecord>, watermark: u64) {
        self.issued.retain(|_, sequence| *sequence > watermark);
        self.pending.retain(|_, sequence| *sequence > watermark);

        let mut records: Vec<TaskRecord> = fetched
            .into_iter()
            .map(|record| {
                if self.issued.contains_key(&record.id) {
                    self.store.get(&record.id).cloned().unwrap_or(record)
                } else {
                    record
                }
            })
            .collect();
        let kept: Vec<TaskRecord> = self
            .issued
            .keys()
            .filter(|id| !records.iter().any(|record| &record.id == *id))
            .filter_map(|id| self.store.get(id).cloned())
            .collect();
        records.extend(kept);
        self.store.replace_all(records);
    }
}

pub type SubscriptionId = u64;

type Listener = Arc<dyn Fn(&BoardProjection) + Send + Sync>;

/// Keeps the local record store in sync with a [`RemoteGateway`].
pub struct SyncEngine<G> {
    gateway: G,
    config: EngineConfig,
    state: Mutex<BoardState>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl<G: RemoteGateway> SyncEngine<G> {
    pub fn new(gateway: G, config: EngineConfig) -> Self {
        Self {
            gateway,
            config,
            state: Mutex::new(BoardState::default()),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the board with everything the backend has.
    ///
    /// Mutations issued before the fetch started are superseded by it. Records
    /// mutated while the fetch was in flight keep their local value, since the
    /// fetched copy may predate the change.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> Result<usize, EngineError> {
        let watermark = self.lock_state().last_sequence;
        let records = self.call(self.gateway.fetch_all()).await?;
        let count = self.mutate(|state| {
            state.reload(records, watermark);
            state.store.len()
        });
        tracing::info!("Loaded {} tasks", count);
        if let Err(e) = self.project().ensure_recognized() {
            tracing::warn!("{}", e);
        }
        Ok(count)
    }

    /// Applies `patch` to the record optimistically and reconciles with the backend.
    ///
    /// Expected gateway failures come back as [`MutationOutcome::Reverted`]; the
    /// only error is a mutation of a record that is not on the board.
    #[tracing::instrument(skip(self, patch), fields(record = %id))]
    pub async fn apply_mutation(
        &self,
        id: &TaskId,
        patch: TaskPatch,
    ) -> Result<MutationOutcome, EngineError> {
        let intent = self.try_mutate(|state| {
            let previous = state
                .store
                .get(id)
                .cloned()
                .ok_or_else(|| EngineError::UnknownRecord(id.clone()))?;
            let mut optimistic = previous.clone();
            patch.apply_to(&mut optimistic);
            state.store.upsert(optimistic);
            let sequence = state.next_sequence(id);
            Ok::<_, EngineError>(MutationIntent {
                record_id: id.clone(),
                patch,
                previous,
                sequence,
            })
        })?;
        if intent.patch.is_noop_for(&intent.previous) {
            tracing::debug!(sequence = intent.sequence, "Dispatching no-op patch");
        }

        let result = self
            .call(self.gateway.update(&intent.record_id, &intent.patch))
            .await
            .and_then(|record| {
                if record.id == intent.record_id {
                    Ok(record)
                } else {
                    Err(GatewayError::Validation(format!(
                        "Server answered with task {} for task {}",
                        record.id, intent.record_id
                    )))
                }
            });
        Ok(self.reconcile(intent, result))
    }

    fn reconcile(
        &self,
        intent: MutationIntent,
        result: Result<TaskRecord, GatewayError>,
    ) -> MutationOutcome {
        let sequence = intent.sequence;
        let resolution = self.try_mutate(move |state| {
            if !state.is_latest(&intent) {
                return Err(result);
            }
            state.pending.remove(&intent.record_id);
            Ok(match result {
                Ok(record) => {
                    state.store.upsert(record.clone());
                    MutationOutcome::Confirmed(record)
                }
                Err(error) => {
                    state.store.upsert(intent.previous.clone());
                    MutationOutcome::Reverted {
                        error,
                        restored: intent.previous,
                    }
                }
            })
        });

        match resolution {
            Ok(outcome) => {
                if let Some(error) = outcome.error() {
                    tracing::warn!(sequence, "Reverted optimistic update: {}", error);
                } else {
                    tracing::debug!(sequence, "Confirmed optimistic update");
                }
                outcome
            }
            Err(result) => {
                tracing::debug!(
                    sequence,
                    succeeded = result.is_ok(),
                    "Ignoring superseded update"
                );
                MutationOutcome::Superseded { sequence, result }
            }
        }
    }

    /// Creates a task on the backend and adds the server's record to the board.
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&self, draft: TaskDraft) -> Result<TaskRecord, EngineError> {
        draft.validate()?;
        let record = self.call(self.gateway.create(&draft)).await?;
        self.mutate(|state| state.store.upsert(record.clone()));
        tracing::info!("Created task {}", record.id);
        Ok(record)
    }

    /// Removes a record from the board. Any mutation in flight for it is superseded.
    pub fn remove(&self, id: &TaskId) -> Option<TaskRecord> {
        self.try_mutate(|state| {
            state.pending.remove(id);
            state.store.remove(id).ok_or(())
        })
        .ok()
    }

    pub fn records(&self) -> Vec<TaskRecord> {
        self.lock_state().store.all().to_vec()
    }

    pub fn record(&self, id: &TaskId) -> Option<TaskRecord> {
        self.lock_state().store.get(id).cloned()
    }

    pub fn is_pending(&self, id: &TaskId) -> bool {
        self.lock_state().pending.contains_key(id)
    }

    /// The current board, grouped by the configured columns.
    pub fn project(&self) -> BoardProjection {
        project(self.lock_state().store.all(), &self.config.status_order)
    }

    /// Registers a callback that receives a fresh projection after every change to the board.
    pub fn subscribe(
        &self,
        listener: impl Fn(&BoardProjection) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock_listeners().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(subscription, _)| *subscription != id);
        listeners.len() != before
    }

    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        match tokio::time::timeout(self.config.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::timed_out()),
        }
    }

    /// Runs `change` against the board state and notifies subscribers if it succeeds.
    fn try_mutate<R, E>(
        &self,
        change: impl FnOnce(&mut BoardState) -> Result<R, E>,
    ) -> Result<R, E> {
        let (value, projection) = {
            let mut state = self.lock_state();
            let value = change(&mut state)?;
            (
                value,
                project(state.store.all(), &self.config.status_order),
            )
        };
        self.notify(&projection);
        Ok(value)
    }

    fn mutate<R>(&self, change: impl FnOnce(&mut BoardState) -> R) -> R {
        match self.try_mutate(|state| Ok::<R, Infallible>(change(state))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    fn notify(&self, projection: &BoardProjection) {
        let listeners: Vec<Listener> = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(projection);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
