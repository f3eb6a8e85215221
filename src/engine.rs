//!
//! The Engine module contains the main [Datastore] object: validation, id extraction,
//! duplicate handling, and the group-by / sort-by query operators.
//!

use std::collections::{HashMap, HashSet};

use log::{info, warn};

use crate::compare::compare_values;
use crate::database::DBConnection;
use crate::encode_decode::{Coder, DefaultCoder};
use crate::error::{Error, Result};
use crate::records::{extract_record_id, Record, RecordId, StoredRecord};
use crate::store::RecordStore;
use crate::value::Value;

/// The direction of a sort-by query
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parses an optional query parameter into a sort order
    ///
    /// An absent parameter defaults to ascending.  Matching is case-insensitive, and
    /// anything other than "asc" / "desc" is an
    /// [InvalidQueryParameter](Error::InvalidQueryParameter) error.
    pub fn parse(param: Option<&str>) -> Result<Self> {
        match param {
            None => Ok(SortOrder::Ascending),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "asc" => Ok(SortOrder::Ascending),
                "desc" => Ok(SortOrder::Descending),
                _ => Err(Error::invalid_query_parameter(format!(
                    "Order must be 'asc' or 'desc', got: {raw}"
                ))),
            },
        }
    }
}

/// The outcome of a batch insert
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertSummary {
    /// How many records were actually written
    pub inserted: usize,
    /// The id of the first record written, in input order, or `None` if every record
    /// was skipped as empty or duplicate
    pub first_id: Option<RecordId>,
}

/// A schema-less record store organized into named datasets
///
/// Datasets have no explicit creation step.  A dataset comes into existence on its
/// first successful insert and is addressed by name thereafter; querying a name with
/// no stored records is a [DatasetNotFound](Error::DatasetNotFound) error.
///
/// All operations are synchronous and hold no state across calls except through the
/// backing [RecordStore].
pub struct Datastore<S: RecordStore, C: Coder = DefaultCoder> {
    store: S,
    coder: C,
}

impl Datastore<DBConnection, DefaultCoder> {
    /// Opens a Datastore backed by the RocksDB database at the path provided, using
    /// the default (JSON) coder
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self {
            store: DBConnection::new(path)?,
            coder: DefaultCoder::new(),
        })
    }
}

impl<S: RecordStore, C: Coder> Datastore<S, C> {

    /// Creates a Datastore over any [RecordStore] and [Coder] pairing
    pub fn new(store: S, coder: C) -> Self {
        Self { store, coder }
    }

    /// Inserts a single record into the named dataset and returns its extracted id
    ///
    /// The record must be non-empty and carry an integer-convertible `id` field.  An
    /// id already present in the dataset is a [DuplicateRecord](Error::DuplicateRecord)
    /// error; the existence check is issued before the write, never an upsert.
    pub fn insert_one(&mut self, dataset: &str, record: &Record) -> Result<RecordId> {
        validate_dataset_name(dataset)?;
        if record.is_empty() {
            return Err(Error::invalid_argument("Record body cannot be empty"));
        }

        let record_id = extract_record_id(record)?;

        if self.store.exists(dataset, record_id)? {
            return Err(Error::DuplicateRecord {
                dataset: dataset.to_string(),
                record_id,
            });
        }

        let body = self.coder.encode_record(record)?;
        self.store.save_one(StoredRecord::new(dataset, record_id, body))?;

        info!("record {record_id} inserted into dataset '{dataset}'");

        Ok(record_id)
    }

    /// Inserts a batch of records into the named dataset
    ///
    /// Records are processed in input order.  Empty records are silently skipped.  A
    /// record with a missing or non-convertible id fails the whole call before
    /// anything is written.  A record whose id already exists in the dataset, or
    /// earlier in the same batch, is skipped with a warning rather than failing the
    /// batch, since batch insert exists to re-ingest overlapping snapshots.
    ///
    /// The surviving records go to the store in a single bulk write.
    pub fn insert_batch(&mut self, dataset: &str, records: &[Record]) -> Result<InsertSummary> {
        validate_dataset_name(dataset)?;
        if records.is_empty() {
            return Err(Error::invalid_argument("Record list cannot be empty"));
        }

        let mut staged = Vec::with_capacity(records.len());
        let mut staged_ids = HashSet::new();
        let mut first_id = None;
        for record in records {
            if record.is_empty() {
                continue;
            }

            //A malformed id indicates a caller bug, and fails the batch outright
            let record_id = extract_record_id(record)?;

            if staged_ids.contains(&record_id) || self.store.exists(dataset, record_id)? {
                warn!("record {record_id} already exists in dataset '{dataset}', skipping");
                continue;
            }

            let body = self.coder.encode_record(record)?;
            staged.push(StoredRecord::new(dataset, record_id, body));
            staged_ids.insert(record_id);
            first_id.get_or_insert(record_id);
        }

        let inserted = staged.len();
        if !staged.is_empty() {
            self.store.save_many(staged)?;
            info!("{inserted} records inserted into dataset '{dataset}'");
        }

        Ok(InsertSummary { inserted, first_id })
    }

    /// Partitions the dataset's records by the string rendering of the value at the
    /// given field
    ///
    /// Records missing the field, or holding a null there, group under the literal key
    /// `"null"`.  The returned pairs preserve the order in which each key first
    /// occurred, and each group preserves fetch order.
    pub fn group_by(&self, dataset: &str, field: &str) -> Result<Vec<(String, Vec<Record>)>> {
        validate_dataset_name(dataset)?;
        validate_field_name(field, "groupBy")?;

        let records = self.fetch_records(dataset)?;

        let mut groups: Vec<(String, Vec<Record>)> = vec![];
        let mut key_positions: HashMap<String, usize> = HashMap::new();
        for record in records {
            let key = match record.get(field) {
                None | Some(Value::Null) => "null".to_string(),
                Some(value) => value.group_key(),
            };
            match key_positions.get(&key).copied() {
                Some(idx) => groups[idx].1.push(record),
                None => {
                    key_positions.insert(key.clone(), groups.len());
                    groups.push((key, vec![record]));
                },
            }
        }
        Ok(groups)
    }

    /// Returns the dataset's records sorted by the value at the given field
    ///
    /// The sort is stable, so records with equal field values keep their fetch order
    /// in both directions.  Descending runs the same stable sort under the reversed
    /// comparison rather than reversing the ascending result, which would flip ties.
    pub fn sort_by(&self, dataset: &str, field: &str, order: Option<&str>) -> Result<Vec<Record>> {
        validate_dataset_name(dataset)?;
        validate_field_name(field, "sortBy")?;
        let order = SortOrder::parse(order)?;

        let mut records = self.fetch_records(dataset)?;

        records.sort_by(|r1, r2| {
            let ordering = compare_values(r1.get(field), r2.get(field));
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
        Ok(records)
    }

    /// Drops every record in every dataset, restoring the store to an empty state
    ///
    /// (Dropping in a database sense, not a Rust sense)
    pub fn reset(&mut self) -> Result<()> {
        self.store.reset()
    }

    /// Fetches and decodes all records for a dataset, on a single store snapshot
    ///
    /// An empty fetch means the dataset does not exist: a dataset is purely a
    /// partition key over the store, with no metadata of its own.
    fn fetch_records(&self, dataset: &str) -> Result<Vec<Record>> {
        let stored = self.store.fetch_all(dataset)?;
        if stored.is_empty() {
            return Err(Error::DatasetNotFound(dataset.to_string()));
        }
        stored
            .iter()
            .map(|record| self.coder.decode_record(&record.body))
            .collect()
    }
}

fn validate_dataset_name(dataset: &str) -> Result<()> {
    if dataset.trim().is_empty() {
        return Err(Error::invalid_argument("Dataset name cannot be blank"));
    }
    //A NUL would alias the composite storage key of another dataset
    if dataset.contains('\0') {
        return Err(Error::invalid_argument("Dataset name cannot contain NUL"));
    }
    Ok(())
}

fn validate_field_name(field: &str, param: &str) -> Result<()> {
    if field.trim().is_empty() {
        return Err(Error::invalid_query_parameter(format!(
            "{param} parameter cannot be blank"
        )));
    }
    Ok(())
}
