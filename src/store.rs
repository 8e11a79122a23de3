use std::{
    collections::BTreeMap,
    ops::{Bound, ControlFlow},
    path::Path,
};

use redb::{
    ReadOnlyDatabase,
    ReadableDatabase,
    ReadableTable,
    ReadableTableMetadata,
    TableDefinition,
};

use crate::error::{Error, Result};

/// Table read when none is configured.
pub const DEFAULT_TABLE: &str = "records";

/// Callback invoked for each key visited by a prefix scan.
pub type Visitor<'a> = dyn FnMut(&str) -> ControlFlow<()> + 'a;

/// Read-only view of a sorted key-value store.
///
/// Implementations must be shareable between threads: concurrent searches
/// scan the same store without coordination.
pub trait KeyStore: Send + Sync {
    /// Visit every key starting with `prefix`, in ascending order, until
    /// the keys run out or `visit` breaks.
    fn scan_prefix(&self, prefix: &str, visit: &mut Visitor<'_>) -> Result<()>;

    /// Look up the value stored under `key`.
    ///
    /// Returns [`Error::NotFound`] when the key is absent.
    fn get(&self, key: &str) -> Result<String>;
}

fn key_not_found(key: &str) -> Error {
    Error::NotFound {
        kind: "key",
        name: key.to_string(),
    }
}

/// A redb database holding `&str -> &str` records in a single table.
///
/// The database is opened read-only; it is populated by some other
/// process.
pub struct RedbStore {
    db: ReadOnlyDatabase,
    table: String,
}

impl RedbStore {
    /// Open an existing database and check that `table` can be read.
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        if !path.exists() {
            return Err(Error::DataDir(path.to_path_buf()));
        }
        let db = ReadOnlyDatabase::open(path)?;

        let store = Self {
            db,
            table: table.to_string(),
        };

        // Fail early on a missing table rather than on every scan.
        let txn = store.db.begin_read()?;
        txn.open_table(store.definition())?;

        tracing::info!(path = %path.display(), table, "opened store");
        Ok(store)
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    fn definition(&self) -> TableDefinition<'_, &'static str, &'static str> {
        TableDefinition::new(&self.table)
    }

    /// Number of records in the table.
    pub fn len(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(self.definition())?;
        Ok(table.len()?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl KeyStore for RedbStore {
    fn scan_prefix(&self, prefix: &str, visit: &mut Visitor<'_>) -> Result<()> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(self.definition())?;

        for entry in table.range(prefix..)? {
            let (key, _value) = entry?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            if visit(key).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<String> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(self.definition())?;
        table
            .get(key)?
            .map(|v| v.value().to_string())
            .ok_or_else(|| key_not_found(key))
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// An in-memory store with the same ordering and prefix semantics as
/// [`RedbStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.records.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let records = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { records }
    }
}

impl KeyStore for MemoryStore {
    fn scan_prefix(&self, prefix: &str, visit: &mut Visitor<'_>) -> Result<()> {
        let range = (Bound::Included(prefix), Bound::Unbounded);
        for key in self.records.range::<str, _>(range).map(|(k, _)| k) {
            if !key.starts_with(prefix) {
                break;
            }
            if visit(key).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<String> {
        self.records
            .get(key)
            .cloned()
            .ok_or_else(|| key_not_found(key))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use redb::Database;

    use super::*;

    /// Write `records` into `table` of a fresh database at `path`.
    pub(crate) fn seed_redb(
        path: &Path,
        table: &str,
        records: &[(&str, &str)],
    ) {
        let db = Database::create(path).unwrap();
        let definition: TableDefinition<&str, &str> =
            TableDefinition::new(table);
        let txn = db.begin_write().unwrap();
        {
            let mut t = txn.open_table(definition).unwrap();
            for (k, v) in records {
                t.insert(*k, *v).unwrap();
            }
        }
        txn.commit().unwrap();
    }

    fn fruit() -> Vec<(&'static str, &'static str)> {
        vec![
            ("APPLE", "img/apple.png"),
            ("APPLEPIE", "img/applepie.png"),
            ("APRICOT", "img/apricot.png"),
            ("BANANA", "img/banana.png"),
            ("PINEAPPLE", "img/pineapple.png"),
        ]
    }

    fn collect_scan(store: &dyn KeyStore, prefix: &str) -> Vec<String> {
        let mut keys = Vec::new();
        store
            .scan_prefix(prefix, &mut |k: &str| {
                keys.push(k.to_string());
                ControlFlow::Continue(())
            })
            .unwrap();
        keys
    }

    fn redb_fixture() -> (tempfile::TempDir, RedbStore) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.redb");
        seed_redb(&path, DEFAULT_TABLE, &fruit());
        let store = RedbStore::open(&path, DEFAULT_TABLE).unwrap();
        (tmp, store)
    }

    #[test]
    fn memory_scan_visits_prefix_in_order() {
        let store: MemoryStore = fruit().into_iter().collect();
        assert_eq!(
            collect_scan(&store, "AP"),
            vec!["APPLE", "APPLEPIE", "APRICOT"]
        );
        assert_eq!(collect_scan(&store, "APPLE"), vec!["APPLE", "APPLEPIE"]);
        assert!(collect_scan(&store, "KIWI").is_empty());
    }

    #[test]
    fn memory_scan_stops_on_break() {
        let store: MemoryStore = fruit().into_iter().collect();
        let mut seen = Vec::new();
        store
            .scan_prefix("A", &mut |k: &str| {
                seen.push(k.to_string());
                ControlFlow::Break(())
            })
            .unwrap();
        assert_eq!(seen, vec!["APPLE"]);
    }

    #[test]
    fn memory_get_missing_key_is_not_found() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert!(matches!(
            store.get("APPLE"),
            Err(Error::NotFound { kind: "key", .. })
        ));
    }

    #[test]
    fn redb_scan_matches_memory_scan() {
        let (_tmp, store) = redb_fixture();
        let memory: MemoryStore = fruit().into_iter().collect();
        for prefix in ["A", "AP", "APPLE", "B", "P", "Z", ""] {
            assert_eq!(
                collect_scan(&store, prefix),
                collect_scan(&memory, prefix),
                "prefix {prefix:?}"
            );
        }
    }

    #[test]
    fn redb_get_and_len() {
        let (_tmp, store) = redb_fixture();
        assert_eq!(store.get("BANANA").unwrap(), "img/banana.png");
        assert!(matches!(store.get("KIWI"), Err(Error::NotFound { .. })));
        assert_eq!(store.len().unwrap(), 5);
        assert!(!store.is_empty().unwrap());
        assert_eq!(store.table_name(), DEFAULT_TABLE);
    }

    #[test]
    fn redb_open_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing.redb");
        assert!(matches!(
            RedbStore::open(&path, DEFAULT_TABLE),
            Err(Error::DataDir(_))
        ));
    }

    #[test]
    fn redb_open_missing_table_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.redb");
        seed_redb(&path, DEFAULT_TABLE, &fruit());
        assert!(matches!(
            RedbStore::open(&path, "images"),
            Err(Error::RedbTable(_))
        ));
    }

    #[test]
    fn redb_custom_table() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.redb");
        seed_redb(&path, "images", &[("KIWI", "img/kiwi.png")]);
        let store = RedbStore::open(&path, "images").unwrap();
        assert_eq!(collect_scan(&store, "K"), vec!["KIWI"]);
    }
}
