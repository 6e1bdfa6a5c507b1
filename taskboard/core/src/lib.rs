//! Core domain models and synchronization logic for the task board.
//!
//! Tasks live in a [`RecordStore`], are grouped into kanban columns by
//! [`project`], and are changed through the [`SyncEngine`], which applies every
//! mutation locally first and reconciles it with a [`RemoteGateway`].
pub mod dashboard;
pub mod drag;
pub mod engine;
pub mod gateway;
pub mod projection;
pub mod store;
pub mod task;

pub use dashboard::{Dashboard, DashboardError, DragOutcome};
pub use drag::{
    DragError, DragSession, DropEvent, DropLocation, DropResolution, DropTarget, StatusChange,
};
pub use engine::{EngineConfig, EngineError, MutationOutcome, SubscriptionId, SyncEngine};
pub use gateway::{GatewayError, RemoteGateway};
pub use projection::{BoardProjection, Column, UnrecognizedStatusError, project};
pub use store::RecordStore;
pub use task::{
    AssignedUser, DraftError, Priority, Status, TaskDraft, TaskId, TaskPatch, TaskRecord,
};
