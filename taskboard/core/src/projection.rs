//! Board projection: the grouped-by-status view the kanban board renders.
//!
//! The projection is derived from the record store on every change and never
//! mutated in place. Records whose status does not match a configured column are
//! collected in an `unrecognized` bucket so no record is lost between the store
//! and the screen.

use crate::task::{Status, TaskId, TaskRecord};
use thiserror::Error;

/// One or more records carry a status that is not a board column.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} task(s) have an unrecognized status: {}", .records.len(), describe(.records))]
pub struct UnrecognizedStatusError {
    pub records: Vec<(TaskId, String)>,
}

fn describe(records: &[(TaskId, String)]) -> String {
    records
        .iter()
        .map(|(id, status)| format!("{} ('{}')", id, status))
        .collect::<Vec<String>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub status: Status,
    pub records: Vec<TaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardProjection {
    columns: Vec<Column>,
    unrecognized: Vec<TaskRecord>,
}

/// Groups `records` into the columns named by `status_order`.
///
/// Column order follows `status_order` (repeated statuses are ignored) and record
/// order within a column follows `records`.
pub fn project(records: &[TaskRecord], status_order: &[Status]) -> BoardProjection {
    let mut columns: Vec<Column> = Vec::with_capacity(status_order.len());
    for status in status_order {
        if columns.iter().all(|column| &column.status != status) {
            columns.push(Column {
                status: status.clone(),
                records: Vec::new(),
            });
        }
    }

    let mut unrecognized = Vec::new();
    for record in records {
        match columns
            .iter_mut()
            .find(|column| column.status == record.status)
        {
            Some(column) => column.records.push(record.clone()),
            None => unrecognized.push(record.clone()),
        }
    }

    BoardProjection {
        columns,
        unrecognized,
    }
}

impl BoardProjection {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Records in the column for `status`, or `None` if the board has no such column.
    pub fn column(&self, status: &Status) -> Option<&[TaskRecord]> {
        self.columns
            .iter()
            .find(|column| &column.status == status)
            .map(|column| column.records.as_slice())
    }

    pub fn unrecognized(&self) -> &[TaskRecord] {
        &self.unrecognized
    }

    /// Ids of every record in every bucket, columns first.
    pub fn ids(&self) -> Vec<TaskId> {
        self.columns
            .iter()
            .flat_map(|column| column.records.iter())
            .chain(self.unrecognized.iter())
            .map(|record| record.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns
            .iter()
            .map(|column| column.records.len())
            .sum::<usize>()
            + self.unrecognized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The status and in-bucket index a record is shown at.
    pub fn position_of(&self, id: &TaskId) -> Option<(Status, usize)> {
        self.columns
            .iter()
            .find_map(|column| {
                column
                    .records
                    .iter()
                    .position(|record| &record.id == id)
                    .map(|index| (column.status.clone(), index))
            })
            .or_else(|| {
                self.unrecognized
                    .iter()
                    .enumerate()
                    .find(|(_, record)| &record.id == id)
                    .map(|(index, record)| (record.status.clone(), index))
            })
    }

    /// Fails when any record sits in the unrecognized bucket.
    pub fn ensure_recognized(&self) -> Result<(), UnrecognizedStatusError> {
        if self.unrecognized.is_empty() {
            return Ok(());
        }
        Err(UnrecognizedStatusError {
            records: self
                .unrecognized
                .iter()
                .map(|record| (record.id.clone(), record.status.to_string()))
                .collect(),
        })
    }
}
