//!
//! The Database module contains the RocksDB-backed [RecordStore] implementation, and
//! the functions for getting and setting records in the DB.
//!

use rocksdb::{DB, DBWithThreadMode, ColumnFamilyDescriptor, Direction, IteratorMode, WriteBatch};

use crate::error::{Error, Result};
use crate::records::{RecordId, StoredRecord};
use crate::store::RecordStore;

/// The ColumnFamily names used for the different types of data
pub const RECORDS_CF_NAME: &str = "records";
pub const METADATA_CF_NAME: &str = "metadata";

/// Metadata keys.  The empty key holds the crate version the DB was created with,
/// key [1] holds the next surrogate storage id.
const STORAGE_ID_KEY: [u8; 1] = [1];

/// Encapsulates a connection to a database
///
/// Records live in the "records" column family under a composite key of dataset name,
/// a 0x00 separator, and the big-endian key form of the record id, so one dataset's
/// records are contiguous and iterate in ascending id order.
pub struct DBConnection {
    db: DBWithThreadMode<rocksdb::SingleThreaded>,
    next_storage_id: u64,
}

impl DBConnection {

    /// Opens a connection to the database at the path provided, creating it if missing
    ///
    /// The DB carries the crate version it was created with; opening a DB written by a
    /// different version is a [Storage](Error::Storage) error.
    pub fn new(path: &str) -> Result<Self> {

        //Configure the "records" and "metadata" column families
        let records_cf = ColumnFamilyDescriptor::new(RECORDS_CF_NAME, rocksdb::Options::default());
        let metadata_cf = ColumnFamilyDescriptor::new(METADATA_CF_NAME, rocksdb::Options::default());

        //Configure the database itself
        let mut db_opts = rocksdb::Options::default();
        db_opts.create_missing_column_families(true);
        db_opts.create_if_missing(true);

        //Open the database
        let db = DB::open_cf_descriptors(&db_opts, path, vec![records_cf, metadata_cf])?;

        let mut conn = Self {
            db,
            next_storage_id: 0,
        };

        let version = match conn.get_version()? {
            Some(v) => v,
            None => {
                conn.put_version()?;
                env!("CARGO_PKG_VERSION").to_string()
            },
        };
        if version != env!("CARGO_PKG_VERSION") {
            return Err(Error::Storage(format!(
                "database was created with incompatible {} version {}",
                env!("CARGO_CRATE_NAME"),
                version
            )));
        }

        conn.next_storage_id = conn.load_storage_id_counter()?;

        Ok(conn)
    }

    /// Returns the version of the crate this DB was created with, if one was stamped
    pub fn get_version(&self) -> Result<Option<String>> {
        let metadata_cf_handle = self.db.cf_handle(METADATA_CF_NAME).unwrap();
        match self.db.get_pinned_cf(metadata_cf_handle, [])? {
            Some(value_bytes) => {
                let value = String::from_utf8(value_bytes.to_vec())
                    .map_err(|_| Error::Codec("malformed version metadata".to_string()))?;
                Ok(Some(value))
            },
            None => Ok(None),
        }
    }

    /// Puts the current crate version into the metadata table
    fn put_version(&mut self) -> Result<()> {
        let metadata_cf_handle = self.db.cf_handle(METADATA_CF_NAME).unwrap();
        self.db.put_cf(metadata_cf_handle, [], env!("CARGO_PKG_VERSION").as_bytes())?;
        Ok(())
    }

    fn load_storage_id_counter(&self) -> Result<u64> {
        let metadata_cf_handle = self.db.cf_handle(METADATA_CF_NAME).unwrap();
        match self.db.get_pinned_cf(metadata_cf_handle, STORAGE_ID_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| Error::Codec("malformed storage id counter".to_string()))?;
                Ok(u64::from_le_bytes(arr))
            },
            None => Ok(0),
        }
    }

    /// Composes the "records" column family key for a (dataset, record id) pair
    fn record_key(dataset: &str, record_id: RecordId) -> Vec<u8> {
        let mut key = Vec::with_capacity(dataset.len() + 9);
        key.extend_from_slice(dataset.as_bytes());
        key.push(0);
        key.extend_from_slice(&record_id.to_key_bytes());
        key
    }

    /// Row values are the storage id followed by the encoded body
    fn record_value(storage_id: u64, body: &[u8]) -> Vec<u8> {
        let mut value = Vec::with_capacity(8 + body.len());
        value.extend_from_slice(&storage_id.to_le_bytes());
        value.extend_from_slice(body);
        value
    }

    fn parse_record_row(dataset: &str, prefix_len: usize, key: &[u8], value: &[u8]) -> Result<StoredRecord> {
        if key.len() != prefix_len + 8 || value.len() < 8 {
            return Err(Error::Codec(format!("malformed record row in dataset '{dataset}'")));
        }
        let mut id_bytes = [0u8; 8];
        id_bytes.copy_from_slice(&key[prefix_len..]);
        let mut storage_id_bytes = [0u8; 8];
        storage_id_bytes.copy_from_slice(&value[..8]);
        Ok(StoredRecord {
            storage_id: Some(u64::from_le_bytes(storage_id_bytes)),
            dataset: dataset.to_string(),
            record_id: RecordId::from_key_bytes(id_bytes),
            body: value[8..].to_vec(),
        })
    }
}

impl RecordStore for DBConnection {

    fn exists(&self, dataset: &str, record_id: RecordId) -> Result<bool> {
        let records_cf_handle = self.db.cf_handle(RECORDS_CF_NAME).unwrap();
        Ok(self
            .db
            .get_pinned_cf(records_cf_handle, Self::record_key(dataset, record_id))?
            .is_some())
    }

    fn save_one(&mut self, mut record: StoredRecord) -> Result<StoredRecord> {
        record.storage_id = Some(self.next_storage_id);

        //Write the row and the bumped counter in one atomic batch
        let records_cf_handle = self.db.cf_handle(RECORDS_CF_NAME).unwrap();
        let metadata_cf_handle = self.db.cf_handle(METADATA_CF_NAME).unwrap();
        let mut batch = WriteBatch::default();
        batch.put_cf(
            records_cf_handle,
            Self::record_key(&record.dataset, record.record_id),
            Self::record_value(self.next_storage_id, &record.body),
        );
        batch.put_cf(metadata_cf_handle, STORAGE_ID_KEY, (self.next_storage_id + 1).to_le_bytes());
        self.db.write(batch)?;

        self.next_storage_id += 1;
        Ok(record)
    }

    fn save_many(&mut self, records: Vec<StoredRecord>) -> Result<Vec<StoredRecord>> {
        let records_cf_handle = self.db.cf_handle(RECORDS_CF_NAME).unwrap();
        let metadata_cf_handle = self.db.cf_handle(METADATA_CF_NAME).unwrap();

        let mut batch = WriteBatch::default();
        let mut saved = Vec::with_capacity(records.len());
        let mut storage_id = self.next_storage_id;
        for mut record in records {
            record.storage_id = Some(storage_id);
            batch.put_cf(
                records_cf_handle,
                Self::record_key(&record.dataset, record.record_id),
                Self::record_value(storage_id, &record.body),
            );
            storage_id += 1;
            saved.push(record);
        }
        batch.put_cf(metadata_cf_handle, STORAGE_ID_KEY, storage_id.to_le_bytes());
        self.db.write(batch)?;

        self.next_storage_id = storage_id;
        Ok(saved)
    }

    fn fetch_all(&self, dataset: &str) -> Result<Vec<StoredRecord>> {
        let records_cf_handle = self.db.cf_handle(RECORDS_CF_NAME).unwrap();

        let mut prefix = Vec::with_capacity(dataset.len() + 1);
        prefix.extend_from_slice(dataset.as_bytes());
        prefix.push(0);

        let mut records = vec![];
        let iter = self
            .db
            .iterator_cf(records_cf_handle, IteratorMode::From(&prefix, Direction::Forward));
        for entry in iter {
            let (key, value) = entry?;
            if !key.starts_with(&prefix) {
                break;
            }
            records.push(Self::parse_record_row(dataset, prefix.len(), &key, &value)?);
        }
        Ok(records)
    }

    /// Deletes all record entries and resets the store to a fresh state
    fn reset(&mut self) -> Result<()> {

        //Drop and recreate the "records" column family
        self.db.drop_cf(RECORDS_CF_NAME)?;
        self.db.create_cf(RECORDS_CF_NAME, &rocksdb::Options::default())?;

        //Reset the storage id counter, so newly inserted entries begin at 0 again
        let metadata_cf_handle = self.db.cf_handle(METADATA_CF_NAME).unwrap();
        self.db.put_cf(metadata_cf_handle, STORAGE_ID_KEY, 0u64.to_le_bytes())?;
        self.next_storage_id = 0;

        Ok(())
    }
}

impl Drop for DBConnection {
    fn drop(&mut self) {
        //Flush Rocks on the way down.  Nothing useful can be done with a failure here.
        let _ = self.db.flush();
    }
}
