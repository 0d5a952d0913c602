//! The canonical metric collection.
//!
//! [`RecordStore`] owns the authoritative, insertion-ordered list of
//! [`MetricRecord`]s. Every mutation persists the whole collection to the
//! injected [`KeyValueStore`] and then notifies the registered
//! [`StoreObserver`]s, in that order. Display order is never stored here; the
//! view derives it on each notification.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::MetricRecord;
use crate::storage::KeyValueStore;

/// Default storage key for the serialized collection.
pub const DEFAULT_KEY: &str = "metrics";

/// Receives the current collection after every store mutation.
pub trait StoreObserver {
    /// Called after the collection changed and a persist was attempted.
    fn store_changed(&mut self, records: &[MetricRecord]);
}

/// The canonical metric collection with its persistence backend.
pub struct RecordStore<S> {
    backend: S,
    key: String,
    records: Vec<MetricRecord>,
    observers: Vec<Box<dyn StoreObserver>>,
}

impl<S: fmt::Debug> fmt::Debug for RecordStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("backend", &self.backend)
            .field("key", &self.key)
            .field("records", &self.records)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<S: KeyValueStore> RecordStore<S> {
    /// Load the collection stored under `key`.
    ///
    /// Absent, unreadable or unparsable data yields an empty collection; the
    /// problem is logged and never returned to the caller.
    pub fn load(backend: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let records = match backend.get(&key) {
            Ok(Some(text)) => match serde_json::from_str::<Vec<MetricRecord>>(&text) {
                Ok(records) => {
                    debug!(count = records.len(), key = %key, "Loaded metrics");
                    records
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Stored metrics are corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!(key = %key, "No stored metrics, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read stored metrics, starting empty");
                Vec::new()
            }
        };

        Self {
            backend,
            key,
            records,
            observers: Vec::new(),
        }
    }

    /// Register an observer that is notified after every mutation.
    pub fn subscribe(&mut self, observer: Box<dyn StoreObserver>) {
        self.observers.push(observer);
    }

    /// Append a record, persist and re-render.
    ///
    /// The record must already satisfy its invariants (see
    /// [`MetricRecord::new`]).
    ///
    /// # Errors
    ///
    /// Returns a storage error if persisting fails. The record stays in the
    /// in-memory collection either way.
    pub fn add(&mut self, record: MetricRecord) -> Result<()> {
        debug!(name = %record.name, period = %record.period, "Adding metric");
        self.records.push(record);
        self.commit()
    }

    /// Remove the record at a canonical index, persist and re-render.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] without touching the collection if
    /// the index is invalid, or a storage error if persisting fails (the
    /// removal is kept).
    pub fn remove_at(&mut self, index: usize) -> Result<MetricRecord> {
        if index >= self.records.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        let removed = self.records.remove(index);
        debug!(index, name = %removed.name, "Removed metric");
        self.commit()?;
        Ok(removed)
    }

    /// Replace the whole collection, persist and re-render.
    ///
    /// # Errors
    ///
    /// Returns a storage error if persisting fails (the replacement is kept).
    pub fn replace_all(&mut self, records: Vec<MetricRecord>) -> Result<()> {
        info!(
            previous = self.records.len(),
            count = records.len(),
            "Replacing all metrics"
        );
        self.records = records;
        self.commit()
    }

    /// Remove every record.
    ///
    /// # Errors
    ///
    /// Returns a storage error if persisting fails.
    pub fn clear(&mut self) -> Result<()> {
        self.replace_all(Vec::new())
    }

    /// Write the collection to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn persist(&mut self) -> Result<()> {
        let text = serde_json::to_string(&self.records)?;
        self.backend.set(&self.key, &text).map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to persist metrics");
            Error::persist(&self.key, e.to_string())
        })
    }

    fn commit(&mut self) -> Result<()> {
        let persisted = self.persist();
        self.notify();
        persisted
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer.store_changed(&self.records);
        }
    }

    /// Clone the records at the given canonical indices, in the given order.
    ///
    /// Report generation works on these owned snapshots so that later
    /// mutations cannot affect an in-flight report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] for the first invalid index.
    pub fn snapshot(&self, indices: &[usize]) -> Result<Vec<MetricRecord>> {
        indices
            .iter()
            .map(|&index| {
                self.get(index).cloned().ok_or(Error::IndexOutOfRange {
                    index,
                    len: self.records.len(),
                })
            })
            .collect()
    }
}

impl<S> RecordStore<S> {
    /// The canonical collection in storage order.
    #[must_use]
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    /// The record at a canonical index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MetricRecord> {
        self.records.get(index)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The persistence backend.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::period::Period;
    use crate::storage::MemoryStore;

    fn record(name: &str, value: &str, period: &str) -> MetricRecord {
        MetricRecord::new(name, value, Period::parse(period).unwrap()).unwrap()
    }

    fn stored(store: &RecordStore<MemoryStore>) -> Vec<MetricRecord> {
        let text = store.backend().get(DEFAULT_KEY).unwrap().unwrap();
        serde_json::from_str(&text).unwrap()
    }

    /// Records the collection passed to each notification.
    #[derive(Clone, Default)]
    struct Recorder {
        seen: Rc<RefCell<Vec<Vec<MetricRecord>>>>,
    }

    impl StoreObserver for Recorder {
        fn store_changed(&mut self, records: &[MetricRecord]) {
            self.seen.borrow_mut().push(records.to_vec());
        }
    }

    /// A memory backend that observers can read while the store owns it.
    #[derive(Debug, Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.0.borrow_mut().set(key, value)
        }
    }

    /// Checks on every notification that the backend already holds `records`.
    struct PersistedFirst {
        backend: SharedStore,
        checks: Rc<RefCell<Vec<bool>>>,
    }

    impl StoreObserver for PersistedFirst {
        fn store_changed(&mut self, records: &[MetricRecord]) {
            let text = self.backend.get(DEFAULT_KEY).unwrap().unwrap_or_default();
            let persisted: Vec<MetricRecord> = serde_json::from_str(&text).unwrap_or_default();
            self.checks.borrow_mut().push(persisted == records);
        }
    }

    /// A backend whose writes always fail.
    #[derive(Debug, Default)]
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::other("quota exceeded")))
        }
    }

    #[test]
    fn test_load_absent_is_empty() {
        let store = RecordStore::load(MemoryStore::new(), DEFAULT_KEY);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        crate::logging::init_test_logging();
        let backend = MemoryStore::with_value(DEFAULT_KEY, "{not json");
        let store = RecordStore::load(backend, DEFAULT_KEY);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_null_is_empty() {
        let backend = MemoryStore::with_value(DEFAULT_KEY, "null");
        let store = RecordStore::load(backend, DEFAULT_KEY);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_existing() {
        let backend = MemoryStore::with_value(
            DEFAULT_KEY,
            r#"[{"name":"KPI","value":"1","period":"2026-01"}]"#,
        );
        let store = RecordStore::load(backend, DEFAULT_KEY);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].name, "KPI");
    }

    #[test]
    fn test_add_appends_and_persists() {
        let mut store = RecordStore::load(MemoryStore::new(), DEFAULT_KEY);
        store.add(record("B", "2", "2026-01")).unwrap();
        store.add(record("A", "1", "2026-02")).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].name, "B");
        assert_eq!(store.records()[1].name, "A");
        assert_eq!(stored(&store), store.records());
    }

    #[test]
    fn test_duplicates_allowed() {
        let mut store = RecordStore::load(MemoryStore::new(), DEFAULT_KEY);
        store.add(record("A", "1", "2026-01")).unwrap();
        store.add(record("A", "1", "2026-01")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_last_inserted() {
        let mut store = RecordStore::load(MemoryStore::new(), DEFAULT_KEY);
        store.add(record("A", "1", "2026-01")).unwrap();
        store.add(record("B", "2", "2026-02")).unwrap();
        store.add(record("C", "3", "2026-03")).unwrap();

        let removed = store.remove_at(2).unwrap();
        assert_eq!(removed.name, "C");
        assert_eq!(store.len(), 2);
        assert_eq!(stored(&store).len(), 2);
        assert!(stored(&store).iter().all(|r| r.name != "C"));
    }

    #[test]
    fn test_remove_out_of_range_leaves_store() {
        let mut store = RecordStore::load(MemoryStore::new(), DEFAULT_KEY);
        store.add(record("A", "1", "2026-01")).unwrap();

        let err = store.remove_at(1).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_replace_all_and_clear() {
        let mut store = RecordStore::load(MemoryStore::new(), DEFAULT_KEY);
        store.add(record("A", "1", "2026-01")).unwrap();

        store
            .replace_all(vec![record("X", "9", "2025-05"), record("Y", "8", "2025-06")])
            .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(stored(&store)[0].name, "X");

        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(stored(&store).is_empty());
    }

    #[test]
    fn test_observer_sees_every_mutation() {
        let recorder = Recorder::default();
        let mut store = RecordStore::load(MemoryStore::new(), DEFAULT_KEY);
        store.subscribe(Box::new(recorder.clone()));

        store.add(record("A", "1", "2026-01")).unwrap();
        store.add(record("B", "2", "2026-02")).unwrap();
        store.remove_at(0).unwrap();

        let seen = recorder.seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].len(), 1);
        assert_eq!(seen[2][0].name, "B");
    }

    #[test]
    fn test_persist_happens_before_notify() {
        let backend = SharedStore::default();
        let checks = Rc::new(RefCell::new(Vec::new()));
        let mut store = RecordStore::load(backend.clone(), DEFAULT_KEY);
        store.subscribe(Box::new(PersistedFirst {
            backend,
            checks: Rc::clone(&checks),
        }));

        store.add(record("A", "1", "2026-01")).unwrap();
        store.add(record("B", "2", "2026-02")).unwrap();
        store.remove_at(0).unwrap();
        store
            .replace_all(vec![record("C", "3", "2025-12")])
            .unwrap();
        store.clear().unwrap();

        assert_eq!(*checks.borrow(), vec![true; 5]);
    }

    #[test]
    fn test_failed_remove_does_not_notify() {
        let recorder = Recorder::default();
        let mut store = RecordStore::load(MemoryStore::new(), DEFAULT_KEY);
        store.subscribe(Box::new(recorder.clone()));

        assert!(store.remove_at(0).is_err());
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn test_persist_failure_keeps_mutation_and_renders() {
        let recorder = Recorder::default();
        let mut store = RecordStore::load(BrokenStore, DEFAULT_KEY);
        store.subscribe(Box::new(recorder.clone()));

        let err = store.add(record("A", "1", "2026-01")).unwrap_err();
        assert!(err.is_storage_error());
        assert_eq!(store.len(), 1);
        assert_eq!(recorder.seen.borrow().len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = RecordStore::load(MemoryStore::new(), DEFAULT_KEY);
        store.add(record("A", "1", "2026-01")).unwrap();
        store.add(record("B", "2", "2026-02")).unwrap();

        let snapshot = store.snapshot(&[1, 0]).unwrap();
        store.clear().unwrap();

        assert_eq!(snapshot[0].name, "B");
        assert_eq!(snapshot[1].name, "A");
    }

    #[test]
    fn test_snapshot_invalid_index() {
        let store = RecordStore::load(MemoryStore::new(), DEFAULT_KEY);
        assert!(matches!(
            store.snapshot(&[0]),
            Err(Error::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_reload_after_persist() {
        let mut backend = MemoryStore::new();
        {
            let mut store = RecordStore::load(&mut backend, DEFAULT_KEY);
            store.add(record("A", "1", "2026-01")).unwrap();
        }
        let store = RecordStore::load(backend, DEFAULT_KEY);
        assert_eq!(store.len(), 1);
    }
}
