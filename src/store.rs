//!
//! The Store module contains the [RecordStore] contract the engine persists through,
//! and [MemStore], an in-process implementation of it.
//!

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::records::{RecordId, StoredRecord};

/// Durable keyed storage for encoded records, scoped by dataset name
///
/// The store is the system of record for the (dataset, record id) uniqueness
/// constraint: the engine checks [exists](Self::exists) before writing, but a store
/// implementation must also reject a duplicate on save as the fallback safety net
/// under concurrent writers.
pub trait RecordStore {

    /// Returns `true` if a record with the given id is stored under the dataset
    fn exists(&self, dataset: &str, record_id: RecordId) -> Result<bool>;

    /// Persists one record, assigning its surrogate storage id
    fn save_one(&mut self, record: StoredRecord) -> Result<StoredRecord>;

    /// Persists a batch of records in a single bulk write, assigning storage ids
    fn save_many(&mut self, records: Vec<StoredRecord>) -> Result<Vec<StoredRecord>>;

    /// Returns every record stored under the dataset
    ///
    /// An unknown dataset name yields an empty vec, not an error.  Turning "empty"
    /// into a not-found condition is the engine's job, since a dataset has no
    /// existence apart from its records.
    fn fetch_all(&self, dataset: &str) -> Result<Vec<StoredRecord>>;

    /// Drops every record in every dataset, restoring the store to an empty state
    fn reset(&mut self) -> Result<()>;
}

/// An in-process [RecordStore] holding records in plain collections
///
/// Fetch order is insertion order within each dataset.  Useful for tests and for
/// embedding the engine without a database on disk.
#[derive(Default)]
pub struct MemStore {
    datasets: HashMap<String, Vec<StoredRecord>>,
    next_storage_id: u64,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_storage_id(&mut self, record: &mut StoredRecord) {
        record.storage_id = Some(self.next_storage_id);
        self.next_storage_id += 1;
    }
}

impl RecordStore for MemStore {
    fn exists(&self, dataset: &str, record_id: RecordId) -> Result<bool> {
        Ok(self
            .datasets
            .get(dataset)
            .map(|records| records.iter().any(|r| r.record_id == record_id))
            .unwrap_or(false))
    }

    fn save_one(&mut self, mut record: StoredRecord) -> Result<StoredRecord> {
        if self.exists(&record.dataset, record.record_id)? {
            return Err(Error::Storage(format!(
                "unique constraint violated: ({}, {})",
                record.dataset, record.record_id
            )));
        }
        self.assign_storage_id(&mut record);
        self.datasets
            .entry(record.dataset.clone())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn save_many(&mut self, records: Vec<StoredRecord>) -> Result<Vec<StoredRecord>> {
        //Check the whole batch up front so a constraint hit leaves nothing written
        for record in &records {
            if self.exists(&record.dataset, record.record_id)? {
                return Err(Error::Storage(format!(
                    "unique constraint violated: ({}, {})",
                    record.dataset, record.record_id
                )));
            }
        }
        let mut saved = Vec::with_capacity(records.len());
        for mut record in records {
            self.assign_storage_id(&mut record);
            self.datasets
                .entry(record.dataset.clone())
                .or_default()
                .push(record.clone());
            saved.push(record);
        }
        Ok(saved)
    }

    fn fetch_all(&self, dataset: &str) -> Result<Vec<StoredRecord>> {
        Ok(self.datasets.get(dataset).cloned().unwrap_or_default())
    }

    fn reset(&mut self) -> Result<()> {
        self.datasets.clear();
        self.next_storage_id = 0;
        Ok(())
    }
}
