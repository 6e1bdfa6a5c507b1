//! Application state container for the kanban board.
//!
//! The dashboard owns the sync engine and the active drag session. Renderers
//! read projections from it (or subscribe through [`Dashboard::engine`]) and feed
//! gestures back in; there is no ambient event broadcasting.

use crate::drag::{DragError, DragSession, DropEvent, DropResolution, DropTarget, StatusChange};
use crate::engine::{EngineError, MutationOutcome, SyncEngine};
use crate::gateway::RemoteGateway;
use crate::projection::BoardProjection;
use crate::task::TaskId;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error(transparent)]
    Drag(#[from] DragError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What happened when a drag gesture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// The gesture did not ask for a mutation.
    Settled(DropResolution),
    /// The card changed column and the change went through the engine.
    Moved {
        change: StatusChange,
        outcome: MutationOutcome,
    },
}

pub struct Dashboard<G> {
    engine: SyncEngine<G>,
    drag: Mutex<DragSession>,
}

impl<G: RemoteGateway> Dashboard<G> {
    pub fn new(engine: SyncEngine<G>) -> Self {
        Self {
            engine,
            drag: Mutex::new(DragSession::new()),
        }
    }

    pub fn engine(&self) -> &SyncEngine<G> {
        &self.engine
    }

    pub fn board(&self) -> BoardProjection {
        self.engine.project()
    }

    pub fn drag_session(&self) -> DragSession {
        self.lock_drag().clone()
    }

    /// Picks up a card from wherever the board currently shows it.
    pub fn begin_drag(&self, id: &TaskId) -> Result<(), DragError> {
        let (source, index) = self
            .engine
            .project()
            .position_of(id)
            .ok_or_else(|| DragError::UnknownRecord(id.clone()))?;
        self.lock_drag().begin(id.clone(), source, index)
    }

    /// Releases the card. A move to another column is applied through the engine.
    pub async fn end_drag(
        &self,
        destination: Option<DropTarget>,
    ) -> Result<DragOutcome, DashboardError> {
        let resolution = self.lock_drag().drop_on(destination)?;
        match resolution {
            DropResolution::Move(change) => {
                let outcome = self
                    .engine
                    .apply_mutation(&change.record, change.patch.clone())
                    .await?;
                Ok(DragOutcome::Moved { change, outcome })
            }
            other => {
                tracing::debug!("Drag ended without a mutation: {:?}", other);
                Ok(DragOutcome::Settled(other))
            }
        }
    }

    pub fn cancel_drag(&self) -> bool {
        self.lock_drag().cancel()
    }

    /// Handles a complete gesture reported by the drag-and-drop source in one go.
    ///
    /// The draggable id is matched against the text form of each task id, so a
    /// numeric and a text id with the same digits cannot be told apart; such a
    /// gesture is rejected.
    pub async fn handle_drop_event(
        &self,
        event: DropEvent,
    ) -> Result<DragOutcome, DashboardError> {
        let draggable = event.draggable_id.clone();
        let mut matches = self
            .engine
            .records()
            .into_iter()
            .map(|record| record.id)
            .filter(|id| id.to_string() == draggable);
        let id = match (matches.next(), matches.next()) {
            (Some(id), None) => id,
            (Some(_), Some(_)) => return Err(DragError::AmbiguousRecord(draggable).into()),
            (None, _) => return Err(DragError::UnknownRecord(draggable.into()).into()),
        };
        self.begin_drag(&id)?;
        let target = event.target(&self.engine.config().status_order);
        self.end_drag(target).await
    }

    fn lock_drag(&self) -> MutexGuard<'_, DragSession> {
        self.drag.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::drag::DropLocation;
    use crate::engine::EngineConfig;
    use crate::gateway::{GatewayError, MockRemoteGateway};
    use crate::task::{Status, TaskPatch, TaskRecord};
    use mockall::predicate::eq;

    async fn dashboard(mut gateway: MockRemoteGateway) -> Dashboard<MockRemoteGateway> {
        gateway.expect_fetch_all().times(1).returning(|| {
            Ok(vec![
                TaskRecord::new("1", "first", Status::ToDo),
                TaskRecord::new("2", "second", Status::ToDo),
                TaskRecord::new(7u64, "numeric", Status::Done),
            ])
        });
        let engine = SyncEngine::new(gateway, EngineConfig::default());
        engine.load().await.unwrap();
        Dashboard::new(engine)
    }

    #[tokio::test]
    async fn begin_drag_uses_current_board_position() {
        let dashboard = dashboard(MockRemoteGateway::new()).await;

        dashboard.begin_drag(&"2".into()).unwrap();

        assert_eq!(
            dashboard.drag_session(),
            DragSession::Dragging {
                record: "2".into(),
                source: Status::ToDo,
                source_index: 1,
            }
        );
    }

    #[tokio::test]
    async fn begin_drag_of_unknown_record_fails() {
        let dashboard = dashboard(MockRemoteGateway::new()).await;

        let result = dashboard.begin_drag(&"9".into());

        assert_eq!(result, Err(DragError::UnknownRecord("9".into())));
        assert!(dashboard.drag_session().is_idle());
    }

    #[tokio::test]
    async fn cross_column_drop_is_applied_through_engine() {
        // Arrange
        let mut gateway = MockRemoteGateway::new();
        gateway
            .expect_update()
            .with(eq(TaskId::from("1")), eq(TaskPatch::status(Status::Done)))
            .times(1)
            .returning(|id, _| Ok(TaskRecord::new(id.clone(), "", Status::Done)));
        let dashboard = dashboard(gateway).await;
        dashboard.begin_drag(&"1".into()).unwrap();

        // Act
        let outcome = dashboard
            .end_drag(Some(DropTarget::new(Status::Done, 0)))
            .await
            .unwrap();

        // Assert
        match outcome {
            DragOutcome::Moved { outcome, .. } => assert!(outcome.is_confirmed()),
            other => panic!("Expected a move, got {:?}", other),
        }
        let board = dashboard.board();
        assert_eq!(board.column(&Status::Done).unwrap().len(), 2);
        assert_eq!(board.column(&Status::ToDo).unwrap().len(), 1);
        assert!(dashboard.drag_session().is_idle());
    }

    #[tokio::test]
    async fn cancelled_drop_changes_nothing() {
        let mut gateway = MockRemoteGateway::new();
        gateway.expect_update().never();
        let dashboard = dashboard(gateway).await;
        let before = dashboard.engine().records();
        dashboard.begin_drag(&"1".into()).unwrap();

        let outcome = dashboard.end_drag(None).await.unwrap();

        assert_eq!(outcome, DragOutcome::Settled(DropResolution::Cancelled));
        assert_eq!(dashboard.engine().records(), before);
    }

    #[tokio::test]
    async fn end_drag_without_gesture_fails() {
        let dashboard = dashboard(MockRemoteGateway::new()).await;

        let result = dashboard.end_drag(None).await;

        assert_eq!(result, Err(DashboardError::Drag(DragError::NotDragging)));
    }

    #[tokio::test]
    async fn drop_event_with_numeric_id_and_failed_update_reverts() {
        let mut gateway = MockRemoteGateway::new();
        gateway
            .expect_update()
            .times(1)
            .returning(|_, _| Err(GatewayError::Network("offline".to_string())));
        let dashboard = dashboard(gateway).await;

        let outcome = dashboard
            .handle_drop_event(DropEvent {
                draggable_id: "7".to_string(),
                source: DropLocation {
                    droppable_id: "done".to_string(),
                    index: 0,
                },
                destination: Some(DropLocation {
                    droppable_id: "in-progress".to_string(),
                    index: 0,
                }),
            })
            .await
            .unwrap();

        match outcome {
            DragOutcome::Moved { change, outcome } => {
                assert_eq!(change.record, TaskId::Number(7));
                assert!(outcome.is_reverted());
            }
            other => panic!("Expected a move, got {:?}", other),
        }
        assert_eq!(
            dashboard.engine().record(&TaskId::Number(7)).unwrap().status,
            Status::Done
        );
    }

    #[tokio::test]
    async fn drop_event_matching_numeric_and_text_id_is_rejected() {
        // Arrange
        let mut gateway = MockRemoteGateway::new();
        gateway.expect_fetch_all().times(1).returning(|| {
            Ok(vec![
                TaskRecord::new(1u64, "numeric", Status::ToDo),
                TaskRecord::new("1", "text", Status::ToDo),
            ])
        });
        gateway.expect_update().never();
        let engine = SyncEngine::new(gateway, EngineConfig::default());
        engine.load().await.unwrap();
        let dashboard = Dashboard::new(engine);

        // Act
        let result = dashboard
            .handle_drop_event(DropEvent {
                draggable_id: "1".to_string(),
                source: DropLocation {
                    droppable_id: "to-do".to_string(),
                    index: 0,
                },
                destination: Some(DropLocation {
                    droppable_id: "done".to_string(),
                    index: 0,
                }),
            })
            .await;

        // Assert
        let expected = DragError::AmbiguousRecord("1".to_string());
        assert_eq!(result, Err(DashboardError::Drag(expected)));
        assert!(dashboard.drag_session().is_idle());
    }

    #[tokio::test]
    async fn drop_event_on_unknown_column_is_cancelled() {
        let mut gateway = MockRemoteGateway::new();
        gateway.expect_update().never();
        let dashboard = dashboard(gateway).await;

        let outcome = dashboard
            .handle_drop_event(DropEvent {
                draggable_id: "1".to_string(),
                source: DropLocation {
                    droppable_id: "to-do".to_string(),
                    index: 0,
                },
                destination: Some(DropLocation {
                    droppable_id: "archive".to_string(),
                    index: 0,
                }),
            })
            .await
            .unwrap();

        assert_eq!(outcome, DragOutcome::Settled(DropResolution::Cancelled));
        assert!(dashboard.drag_session().is_idle());
    }
}
