
//! # dataset_rocks Overview
//!
//! A schema-less record store backed by [RocksDB](https://rocksdb.org), organized into
//! named datasets, with duplicate-safe insertion and group-by / sort-by queries over
//! heterogeneous JSON records.
//!
//! ## Records & Datasets
//!
//! A [Datastore] holds records partitioned into datasets.  A dataset is addressed
//! purely by name: it comes into existence on the first successful insert, and
//! querying a name with no stored records is a [DatasetNotFound](Error::DatasetNotFound)
//! error rather than an empty result.
//!
//! A [Record] is an arbitrary mapping of field names to dynamically typed [Value]s.
//! The only mandatory field is `id`, which must be convertible to a 64-bit integer
//! (a numeric literal, or a string of digits with an optional sign) and must be unique
//! within its dataset.  Records are immutable once inserted; there are no update or
//! delete operations.
//!
//! ## Usage Example
//!
//! ```
//! use dataset_rocks::{*};
//!
//! //Create and reset the Datastore
//! let mut store = Datastore::open("docs_demo.rocks").unwrap();
//! store.reset().unwrap();
//!
//! //Insert some records.  Fields vary freely between records of a dataset.
//! let rec = |json: &str| -> Record { serde_json::from_str(json).unwrap() };
//! store.insert_one("emp", &rec(r#"{"id": 1, "age": 30, "dept": "Eng"}"#)).unwrap();
//! store.insert_one("emp", &rec(r#"{"id": 2, "age": 25, "dept": "Eng"}"#)).unwrap();
//! store.insert_one("emp", &rec(r#"{"id": 3, "age": 28, "dept": "Mkt"}"#)).unwrap();
//!
//! //Group by department
//! let groups = store.group_by("emp", "dept").unwrap();
//! assert_eq!(groups[0].0, "Eng");
//! assert_eq!(groups[0].1.len(), 2);
//! assert_eq!(groups[1].0, "Mkt");
//!
//! //Sort by age, youngest first
//! let sorted = store.sort_by("emp", "age", Some("asc")).unwrap();
//! assert_eq!(sorted[0].get("id"), Some(&Value::Int(2)));
//! ```
//!
//! ## Queries
//!
//! [group_by](Datastore::group_by) partitions a dataset by the string rendering of a
//! chosen field; records missing the field (or holding a null) land under the literal
//! key `"null"`.  [sort_by](Datastore::sort_by) orders a dataset by a chosen field
//! under a total-order comparison that never fails, even when the field holds a number
//! in one record and a string in another — see [compare_values] for the exact rules.
//! Both operate on a full snapshot of the dataset; there is no indexing.
//!
//! ## Storage & Wire Format
//!
//! Persistence goes through the [RecordStore] trait.  [DBConnection] is the RocksDB
//! implementation; [MemStore] keeps everything in process, for tests or for embedding
//! without a database on disk.  Record bodies are encoded by a [Coder] — JSON by
//! default, or MessagePack via [MsgPackCoder] with the `msgpack` feature enabled.
//!
//! The store is the system of record for the (dataset, id) uniqueness constraint: the
//! engine checks for duplicates before writing, and the store rejects a duplicate on
//! save as the fallback safety net.

mod value;
pub use value::Value;
mod compare;
pub use compare::compare_values;
mod error;
pub use error::{Error, Result};
mod records;
pub use records::{extract_record_id, Record, RecordId, StoredRecord};
mod encode_decode;
pub use encode_decode::{Coder, DefaultCoder, JsonCoder};
#[cfg(feature = "msgpack")]
pub use encode_decode::MsgPackCoder;
mod store;
pub use store::{MemStore, RecordStore};
mod database;
pub use database::DBConnection;
mod engine;
pub use engine::{Datastore, InsertSummary, SortOrder};


#[cfg(test)]
mod tests {
    use crate::{*};

    fn rec(json: &str) -> Record {
        serde_json::from_str(json).unwrap()
    }

    fn engine() -> Datastore<MemStore, JsonCoder> {
        Datastore::new(MemStore::new(), JsonCoder::new())
    }

    fn ids(records: &[Record]) -> Vec<i64> {
        records
            .iter()
            .map(|r| match r.get("id") {
                Some(Value::Int(n)) => *n,
                other => panic!("unexpected id value: {:?}", other),
            })
            .collect()
    }

    #[test]
    fn employee_scenario_test() {
        let mut store = engine();
        store.insert_one("emp", &rec(r#"{"id": 1, "age": 30, "dept": "Eng"}"#)).unwrap();
        store.insert_one("emp", &rec(r#"{"id": 2, "age": 25, "dept": "Eng"}"#)).unwrap();
        store.insert_one("emp", &rec(r#"{"id": 3, "age": 28, "dept": "Mkt"}"#)).unwrap();

        //Group keys appear in first-occurrence order, groups preserve fetch order
        let groups = store.group_by("emp", "dept").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Eng");
        assert_eq!(ids(&groups[0].1), vec![1, 2]);
        assert_eq!(groups[1].0, "Mkt");
        assert_eq!(ids(&groups[1].1), vec![3]);

        //Ascending by age, with the order parameter absent, lowercase and uppercase
        for order in [None, Some("asc"), Some("ASC")] {
            let sorted = store.sort_by("emp", "age", order).unwrap();
            assert_eq!(ids(&sorted), vec![2, 3, 1]);
        }

        //Descending is the exact reverse over strictly ordered values
        let sorted = store.sort_by("emp", "age", Some("desc")).unwrap();
        assert_eq!(ids(&sorted), vec![1, 3, 2]);
    }

    #[test]
    fn insert_validation_test() {
        let mut store = engine();

        //Blank dataset names
        assert!(matches!(store.insert_one("", &rec(r#"{"id": 1}"#)), Err(Error::InvalidArgument(_))));
        assert!(matches!(store.insert_one("   ", &rec(r#"{"id": 1}"#)), Err(Error::InvalidArgument(_))));

        //Empty record, missing id, ids of the wrong shape
        assert!(matches!(store.insert_one("ds", &rec("{}")), Err(Error::InvalidArgument(_))));
        assert!(matches!(store.insert_one("ds", &rec(r#"{"name": "x"}"#)), Err(Error::InvalidArgument(_))));
        assert!(matches!(store.insert_one("ds", &rec(r#"{"id": true}"#)), Err(Error::InvalidArgument(_))));
        assert!(matches!(store.insert_one("ds", &rec(r#"{"id": "12a"}"#)), Err(Error::InvalidArgument(_))));

        //Nothing above may have created the dataset
        assert!(matches!(store.sort_by("ds", "id", None), Err(Error::DatasetNotFound(_))));

        //String and float ids convert; the extracted id is returned
        assert_eq!(store.insert_one("ds", &rec(r#"{"id": "17"}"#)).unwrap(), RecordId(17));
        assert_eq!(store.insert_one("ds", &rec(r#"{"id": 4.9}"#)).unwrap(), RecordId(4));
    }

    #[test]
    fn query_validation_test() {
        let mut store = engine();
        store.insert_one("ds", &rec(r#"{"id": 1, "a": 1}"#)).unwrap();

        //Blank field names are query-parameter errors
        assert!(matches!(store.group_by("ds", " "), Err(Error::InvalidQueryParameter(_))));
        assert!(matches!(store.sort_by("ds", "", None), Err(Error::InvalidQueryParameter(_))));

        //So is an unknown sort order
        assert!(matches!(store.sort_by("ds", "a", Some("upwards")), Err(Error::InvalidQueryParameter(_))));

        //Blank dataset names stay argument errors on the query path
        assert!(matches!(store.group_by("", "a"), Err(Error::InvalidArgument(_))));

        //Sorting by a field no record has is not an error: every key is null
        assert_eq!(ids(&store.sort_by("ds", "nope", None).unwrap()), vec![1]);
    }

    #[test]
    fn duplicate_insert_test() {
        let mut store = engine();
        store.insert_one("emp", &rec(r#"{"id": 1, "age": 30}"#)).unwrap();

        let result = store.insert_one("emp", &rec(r#"{"id": 1, "age": 99}"#));
        assert!(matches!(result, Err(Error::DuplicateRecord { .. })));

        //No second write occurred, and the first record is untouched
        let records = store.sort_by("emp", "id", None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("age"), Some(&Value::Int(30)));

        //The same id in another dataset is not a duplicate
        assert!(store.insert_one("emp2", &rec(r#"{"id": 1}"#)).is_ok());
    }

    #[test]
    fn batch_insert_test() {
        let mut store = engine();
        store.insert_one("emp", &rec(r#"{"id": 1, "age": 30}"#)).unwrap();

        //Empty records are skipped, duplicates (pre-existing or in-batch) degrade the
        //result, and first_id is the first record that survived
        let summary = store
            .insert_batch(
                "emp",
                &[
                    rec("{}"),
                    rec(r#"{"id": 1, "age": 31}"#),
                    rec(r#"{"id": 4, "age": 40}"#),
                    rec(r#"{"id": 4, "age": 41}"#),
                    rec(r#"{"id": 5, "age": 50}"#),
                ],
            )
            .unwrap();
        assert_eq!(summary, InsertSummary { inserted: 2, first_id: Some(RecordId(4)) });
        assert_eq!(ids(&store.sort_by("emp", "id", None).unwrap()), vec![1, 4, 5]);

        //A batch where everything is a duplicate reports no first id
        let summary = store.insert_batch("emp", &[rec(r#"{"id": 4}"#), rec(r#"{"id": 5}"#)]).unwrap();
        assert_eq!(summary, InsertSummary { inserted: 0, first_id: None });

        //An empty record list is an error
        assert!(matches!(store.insert_batch("emp", &[]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn batch_insert_fails_whole_call_on_bad_id_test() {
        let mut store = engine();
        store.insert_one("emp", &rec(r#"{"id": 1}"#)).unwrap();

        //A missing id mid-batch fails the call; records before it are not committed
        let result = store.insert_batch(
            "emp",
            &[rec(r#"{"id": 2}"#), rec(r#"{"name": "no id"}"#), rec(r#"{"id": 3}"#)],
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(ids(&store.sort_by("emp", "id", None).unwrap()), vec![1]);

        //Same for a non-convertible id
        let result = store.insert_batch("emp", &[rec(r#"{"id": 2}"#), rec(r#"{"id": "abc"}"#)]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(ids(&store.sort_by("emp", "id", None).unwrap()), vec![1]);
    }

    #[test]
    fn group_by_null_key_test() {
        let mut store = engine();
        store
            .insert_batch(
                "emp",
                &[
                    rec(r#"{"id": 1, "dept": "Eng"}"#),
                    rec(r#"{"id": 2}"#),
                    rec(r#"{"id": 3, "dept": null}"#),
                    rec(r#"{"id": 4, "dept": "Eng"}"#),
                    rec(r#"{"id": 5, "dept": 7}"#),
                ],
            )
            .unwrap();

        let groups = store.group_by("emp", "dept").unwrap();
        let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Eng", "null", "7"]);

        //Missing field and explicit null share the "null" group, in fetch order
        let null_group = &groups[1].1;
        assert_eq!(ids(null_group), vec![2, 3]);
        assert_eq!(ids(&groups[0].1), vec![1, 4]);
    }

    #[test]
    fn sort_stability_test() {
        let mut store = engine();
        store
            .insert_batch(
                "emp",
                &[
                    rec(r#"{"id": 1, "age": 30}"#),
                    rec(r#"{"id": 2, "age": 25}"#),
                    rec(r#"{"id": 3, "age": 30}"#),
                    rec(r#"{"id": 4, "age": 25}"#),
                ],
            )
            .unwrap();

        //Ties keep fetch order in both directions
        assert_eq!(ids(&store.sort_by("emp", "age", Some("asc")).unwrap()), vec![2, 4, 1, 3]);
        assert_eq!(ids(&store.sort_by("emp", "age", Some("desc")).unwrap()), vec![1, 3, 2, 4]);
    }

    #[test]
    fn mixed_type_sort_test() {
        let mut store = engine();
        store
            .insert_batch(
                "mixed",
                &[
                    rec(r#"{"id": 1, "v": "abc"}"#),
                    rec(r#"{"id": 2, "v": 5}"#),
                    rec(r#"{"id": 3}"#),
                    rec(r#"{"id": 4, "v": true}"#),
                ],
            )
            .unwrap();

        //Null first, then "5" < "abc" < "true" under the string fallback
        let sorted = store.sort_by("mixed", "v", None).unwrap();
        assert_eq!(ids(&sorted), vec![3, 2, 1, 4]);

        //Int and float compare numerically regardless of representation
        store
            .insert_batch(
                "nums",
                &[rec(r#"{"id": 1, "v": 2.5}"#), rec(r#"{"id": 2, "v": 2}"#), rec(r#"{"id": 3, "v": 10}"#)],
            )
            .unwrap();
        assert_eq!(ids(&store.sort_by("nums", "v", None).unwrap()), vec![2, 1, 3]);
    }

    #[test]
    fn dataset_not_found_test() {
        let store = engine();
        assert!(matches!(store.group_by("ghost", "a"), Err(Error::DatasetNotFound(_))));
        assert!(matches!(store.sort_by("ghost", "a", None), Err(Error::DatasetNotFound(_))));
    }

    #[test]
    /// Exercises the full stack against RocksDB, including a close / reopen cycle
    fn rocks_store_test() {
        let mut store = Datastore::open("test_store.rocks").unwrap();
        store.reset().unwrap();

        store.insert_one("emp", &rec(r#"{"id": 2, "age": 25, "dept": "Eng"}"#)).unwrap();
        store
            .insert_batch(
                "emp",
                &[rec(r#"{"id": 1, "age": 30, "dept": "Eng"}"#), rec(r#"{"id": 3, "age": 28, "dept": "Mkt"}"#)],
            )
            .unwrap();

        //RocksDB fetches a dataset in ascending record id order
        assert_eq!(ids(&store.sort_by("emp", "id", None).unwrap()), vec![1, 2, 3]);
        assert_eq!(ids(&store.sort_by("emp", "age", Some("desc")).unwrap()), vec![1, 3, 2]);
        let groups = store.group_by("emp", "dept").unwrap();
        assert_eq!(groups[0].0, "Eng");
        assert_eq!(ids(&groups[0].1), vec![1, 2]);

        //Close the connection and reopen: records and duplicate detection survive
        drop(store);
        let mut store = Datastore::open("test_store.rocks").unwrap();
        assert_eq!(ids(&store.sort_by("emp", "id", None).unwrap()), vec![1, 2, 3]);
        assert!(matches!(
            store.insert_one("emp", &rec(r#"{"id": 2}"#)),
            Err(Error::DuplicateRecord { .. })
        ));

        //Datasets are isolated partitions of the same DB
        store.insert_one("other", &rec(r#"{"id": 2, "x": 1}"#)).unwrap();
        assert_eq!(store.sort_by("emp", "id", None).unwrap().len(), 3);
        assert_eq!(store.sort_by("other", "id", None).unwrap().len(), 1);
    }

    #[test]
    /// Exercises the DBConnection layer directly
    fn rocks_connection_test() {
        let mut conn = DBConnection::new("test_conn.rocks").unwrap();
        conn.reset().unwrap();

        assert!(!conn.exists("ds", RecordId(1)).unwrap());
        let saved = conn.save_one(StoredRecord::new("ds", RecordId(1), b"{}".to_vec())).unwrap();
        assert_eq!(saved.storage_id, Some(0));
        assert!(conn.exists("ds", RecordId(1)).unwrap());

        //Bulk saves keep assigning storage ids from where save_one left off
        let saved = conn
            .save_many(vec![
                StoredRecord::new("ds", RecordId(-5), b"{}".to_vec()),
                StoredRecord::new("ds", RecordId(3), b"{}".to_vec()),
            ])
            .unwrap();
        assert_eq!(saved[0].storage_id, Some(1));
        assert_eq!(saved[1].storage_id, Some(2));

        //Fetch returns the dataset in ascending numeric id order, negatives included
        let fetched = conn.fetch_all("ds").unwrap();
        let fetched_ids: Vec<i64> = fetched.iter().map(|r| r.record_id.0).collect();
        assert_eq!(fetched_ids, vec![-5, 1, 3]);

        //Unknown datasets are an empty fetch, not an error
        assert!(conn.fetch_all("ghost").unwrap().is_empty());

        //The storage id counter survives a close / reopen cycle
        drop(conn);
        let mut conn = DBConnection::new("test_conn.rocks").unwrap();
        let saved = conn.save_one(StoredRecord::new("ds", RecordId(9), b"{}".to_vec())).unwrap();
        assert_eq!(saved.storage_id, Some(3));

        //Reset drops every record and restarts the counter
        conn.reset().unwrap();
        assert!(conn.fetch_all("ds").unwrap().is_empty());
        let saved = conn.save_one(StoredRecord::new("ds", RecordId(1), b"{}".to_vec())).unwrap();
        assert_eq!(saved.storage_id, Some(0));
    }
}
