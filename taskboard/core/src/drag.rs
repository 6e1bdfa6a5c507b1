//! Drag-and-drop gesture handling for the kanban board.
//!
//! A [`DragSession`] tracks one gesture at a time and turns its end into at most
//! one status change. Reordering cards inside a column is visual only: the
//! backend has no rank field, so only moves between columns become mutations.

use crate::task::{Status, TaskId, TaskPatch};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    #[error("Another drag gesture is already in progress")]
    GestureInProgress,
    #[error("No drag gesture is in progress")]
    NotDragging,
    #[error("Task {0} is not on the board")]
    UnknownRecord(TaskId),
    #[error("More than one task on the board has id {0}")]
    AmbiguousRecord(String),
}

/// Where a card was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub status: Status,
    pub index: usize,
}

impl DropTarget {
    pub fn new(status: Status, index: usize) -> Self {
        Self { status, index }
    }
}

/// The single mutation a finished gesture asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub record: TaskId,
    pub from: Status,
    pub patch: TaskPatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropResolution {
    /// Released outside any column.
    Cancelled,
    /// Released where it started.
    Unchanged,
    /// Moved within its column; nothing to persist.
    Reordered {
        record: TaskId,
        status: Status,
        from: usize,
        to: usize,
    },
    /// Moved to another column.
    Move(StatusChange),
}

impl DropResolution {
    pub fn status_change(&self) -> Option<&StatusChange> {
        match self {
            DropResolution::Move(change) => Some(change),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragSession {
    #[default]
    Idle,
    Dragging {
        record: TaskId,
        source: Status,
        source_index: usize,
    },
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DragSession::Idle)
    }

    /// Picks up a card. Only one gesture may be active at a time.
    pub fn begin(
        &mut self,
        record: TaskId,
        source: Status,
        source_index: usize,
    ) -> Result<(), DragError> {
        if !self.is_idle() {
            return Err(DragError::GestureInProgress);
        }
        *self = DragSession::Dragging {
            record,
            source,
            source_index,
        };
        Ok(())
    }

    /// Releases the card and returns to idle.
    pub fn drop_on(
        &mut self,
        destination: Option<DropTarget>,
    ) -> Result<DropResolution, DragError> {
        let DragSession::Dragging {
            record,
            source,
            source_index,
        } = std::mem::take(self)
        else {
            return Err(DragError::NotDragging);
        };

        let Some(destination) = destination else {
            return Ok(DropResolution::Cancelled);
        };

        if destination.status != source {
            return Ok(DropResolution::Move(StatusChange {
                record,
                from: source,
                patch: TaskPatch::status(destination.status),
            }));
        }
        if destination.index == source_index {
            return Ok(DropResolution::Unchanged);
        }
        Ok(DropResolution::Reordered {
            record,
            status: source,
            from: source_index,
            to: destination.index,
        })
    }

    /// Abandons the gesture. Returns false if nothing was being dragged.
    pub fn cancel(&mut self) -> bool {
        !std::mem::take(self).is_idle()
    }
}

/// A position reported by the drag-and-drop source: a column id and an index in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropLocation {
    pub droppable_id: String,
    pub index: usize,
}

/// A finished gesture as reported by the drag-and-drop source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
    pub draggable_id: String,
    pub source: DropLocation,
    pub destination: Option<DropLocation>,
}

impl DropEvent {
    /// The column the card was released on, if it is one of `status_order`.
    ///
    /// A destination that is not a known column counts as no destination.
    pub fn target(&self, status_order: &[Status]) -> Option<DropTarget> {
        let destination = self.destination.as_ref()?;
        let status = Status::parse(&destination.droppable_id);
        if !status.is_recognized() || !status_order.contains(&status) {
            return None;
        }
        Some(DropTarget::new(status, destination.index))
    }
}
