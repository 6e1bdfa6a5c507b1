use crate::task::{TaskId, TaskRecord};
use std::collections::HashMap;

/// In-memory collection of task records keyed by id.
///
/// Records keep their insertion order. Replacing a record keeps its slot, so a
/// column does not reshuffle when one of its cards is updated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<TaskRecord>,
    index: HashMap<TaskId, usize>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = TaskRecord>) -> Self {
        let mut store = Self::new();
        store.replace_all(records);
        store
    }

    /// All records in insertion order.
    pub fn all(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn get(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.index.get(id).map(|slot| &self.records[*slot])
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    /// Replaces the record with the same id, or appends it. Returns the replaced record.
    pub fn upsert(&mut self, record: TaskRecord) -> Option<TaskRecord> {
        match self.index.get(&record.id) {
            Some(slot) => Some(std::mem::replace(&mut self.records[*slot], record)),
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<TaskRecord> {
        let slot = self.index.remove(id)?;
        let removed = self.records.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    /// Swaps the whole content for a fresh load. A repeated id replaces the earlier entry.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = TaskRecord>) {
        self.records.clear();
        self.index.clear();
        for record in records {
            self.upsert(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
