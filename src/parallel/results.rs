use super::work::WorkItem;
use crate::error::PoolError;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A captured return value and the item that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord<V, R> {
    pub parameter: WorkItem<V>,
    /// Position of the item in the order its worker processed it
    pub sequence_index: usize,
    pub return_value: R,
}

/// Worker identifier in a snapshot.
///
/// Displays and serializes as `"thread <id>"` but orders by the numeric id,
/// so `thread 2` sorts before `thread 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerKey(pub usize);

impl fmt::Display for WorkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread {}", self.0)
    }
}

impl Serialize for WorkerKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Snapshot shape: worker identifier to its records, in order
pub type ResultSnapshot<V, R> = BTreeMap<WorkerKey, Vec<ResultRecord<V, R>>>;

/// Append-only per-worker capture of non-null return values.
///
/// A worker's key only appears once it has produced a cached result.
#[derive(Debug, Clone)]
pub struct ResultStore<V, R> {
    enabled: bool,
    records: BTreeMap<usize, Vec<ResultRecord<V, R>>>,
}

impl<V, R> ResultStore<V, R> {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            records: BTreeMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Store a record for `worker_id`; ignored when caching is disabled
    pub fn append(&mut self, worker_id: usize, record: ResultRecord<V, R>) {
        if self.enabled {
            self.records.entry(worker_id).or_default().push(record);
        }
    }

    /// Total number of cached records across all workers
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of a single worker, in the order that worker produced them
    pub fn worker_records(&self, worker_id: usize) -> Option<&[ResultRecord<V, R>]> {
        self.records.get(&worker_id).map(Vec::as_slice)
    }

    pub fn snapshot(&self) -> Result<ResultSnapshot<V, R>, PoolError>
    where
        V: Clone,
        R: Clone,
    {
        self.ensure_enabled()?;
        Ok(self
            .records
            .iter()
            .map(|(worker_id, records)| (WorkerKey(*worker_id), records.clone()))
            .collect())
    }

    /// Every cached return value, grouped by worker id
    pub fn return_values(&self) -> Result<Vec<R>, PoolError>
    where
        R: Clone,
    {
        self.ensure_enabled()?;
        Ok(self
            .records
            .values()
            .flatten()
            .map(|record| record.return_value.clone())
            .collect())
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn ensure_enabled(&self) -> Result<(), PoolError> {
        if self.enabled {
            Ok(())
        } else {
            Err(PoolError::Configuration(
                "result caching is disabled for this pool".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: i32, index: usize) -> ResultRecord<i32, i32> {
        ResultRecord {
            parameter: WorkItem::Positional(value),
            sequence_index: index,
            return_value: value * 2,
        }
    }

    #[test]
    fn test_append_and_snapshot() {
        let mut store = ResultStore::new(true);
        store.append(1, record(1, 0));
        store.append(1, record(3, 1));
        store.append(0, record(2, 0));

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&WorkerKey(1)], vec![record(1, 0), record(3, 1)]);
        assert_eq!(snapshot[&WorkerKey(0)], vec![record(2, 0)]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.worker_records(1).unwrap().len(), 2);
        assert!(store.worker_records(7).is_none());
    }

    #[test]
    fn test_disabled_store_rejects_reads() {
        let mut store = ResultStore::new(false);
        store.append(0, record(1, 0));

        assert!(store.is_empty());
        assert!(matches!(store.snapshot(), Err(PoolError::Configuration(_))));
        assert!(matches!(
            store.return_values(),
            Err(PoolError::Configuration(_))
        ));
    }

    #[test]
    fn test_return_values() {
        let mut store = ResultStore::new(true);
        store.append(0, record(1, 0));
        store.append(2, record(5, 0));
        assert_eq!(store.return_values().unwrap(), vec![2, 10]);
    }

    #[test]
    fn test_snapshot_keys_keep_numeric_order() {
        let mut store = ResultStore::new(true);
        for worker_id in (0..12).rev() {
            store.append(worker_id, record(worker_id as i32, 0));
        }

        let snapshot = store.snapshot().unwrap();
        let keys: Vec<String> = snapshot.keys().map(ToString::to_string).collect();
        let expected: Vec<String> = (0..12).map(|id| format!("thread {id}")).collect();
        assert_eq!(keys, expected);

        // Serialized straight from the map, not through serde_json::Value
        let json = serde_json::to_string(&snapshot).unwrap();
        let thread_2 = json.find("\"thread 2\"").unwrap();
        let thread_10 = json.find("\"thread 10\"").unwrap();
        assert!(thread_2 < thread_10);
    }

    #[test]
    fn test_record_serializes() {
        let json = serde_json::to_value(record(4, 2)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"parameter": 4, "sequence_index": 2, "return_value": 8})
        );
    }
}
