//! JSON-file backed document store.
//!
//! The whole store lives in memory behind one mutex. Every mutation is applied
//! to a staged copy, written to a temporary file next to the store file and
//! renamed over it, and only then swapped in. A failed write leaves both the
//! file and the in-memory copy untouched.

use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

type Documents = BTreeMap<String, Value>;
type Tables = BTreeMap<String, Documents>;

struct Inner {
    tables: Tables,
    path: Option<PathBuf>,
}

/// Handle on the document store. Clones share the same data.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("DocumentStore")
            .field("path", &inner.path)
            .field("tables", &inner.tables.len())
            .finish()
    }
}

impl DocumentStore {
    /// Opens the store at `path`, creating parent directories as needed.
    ///
    /// A missing file yields an empty store; a malformed file is an error.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        std::fs::create_dir_all(parent_dir(&path))?;

        let tables = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Tables::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %path.display(),
            tables = tables.len(),
            "Opened document store"
        );

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                tables,
                path: Some(path),
            })),
        })
    }

    /// Creates a store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tables: Tables::new(),
                path: None,
            })),
        }
    }

    /// Returns a typed handle on the table `name`.
    pub fn table<T>(&self, name: impl Into<String>) -> Table<T> {
        Table {
            store: self.clone(),
            name: name.into(),
            _record: PhantomData,
        }
    }

    fn read<R>(&self, table: &str, f: impl FnOnce(Option<&Documents>) -> R) -> R {
        let inner = self.inner.lock();
        f(inner.tables.get(table))
    }

    fn write<R>(
        &self,
        table: &str,
        f: impl FnOnce(&mut Documents) -> StoreResult<R>,
    ) -> StoreResult<R> {
        self.write_tables(|tables| f(tables.entry(table.to_string()).or_default()))
    }

    fn write_tables<R>(&self, f: impl FnOnce(&mut Tables) -> StoreResult<R>) -> StoreResult<R> {
        let mut inner = self.inner.lock();
        let mut staged = inner.tables.clone();
        let out = f(&mut staged)?;

        if let Some(path) = &inner.path {
            persist(path, &staged)?;
        }
        inner.tables = staged;
        Ok(out)
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn persist(path: &Path, tables: &Tables) -> StoreResult<()> {
    let file = NamedTempFile::new_in(parent_dir(path))?;
    {
        let mut writer = BufWriter::new(file.as_file());
        serde_json::to_writer(&mut writer, tables)?;
        writer.flush()?;
    }
    file.as_file().sync_all()?;
    file.persist(path)?;
    debug!(path = %path.display(), "Persisted document store");
    Ok(())
}

/// Typed view of one table. Documents are keyed by their string id.
pub struct Table<T> {
    store: DocumentStore,
    name: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Table<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, doc_id: &str, value: &Value) -> StoreResult<T> {
        T::deserialize(value).map_err(|source| StoreError::Corrupt {
            table: self.name.clone(),
            doc_id: doc_id.to_string(),
            source,
        })
    }

    fn decode_all(&self, docs: Option<&Documents>) -> StoreResult<Vec<(String, T)>> {
        docs.into_iter()
            .flatten()
            .map(|(id, value)| Ok((id.clone(), self.decode(id, value)?)))
            .collect()
    }

    /// Fetches a document.
    pub fn get(&self, doc_id: impl Display) -> StoreResult<Option<T>> {
        let doc_id = doc_id.to_string();
        self.store.read(&self.name, |docs| {
            docs.and_then(|docs| docs.get(&doc_id))
                .map(|value| self.decode(&doc_id, value))
                .transpose()
        })
    }

    /// Whether a document with this id exists.
    pub fn contains(&self, doc_id: impl Display) -> bool {
        let doc_id = doc_id.to_string();
        self.store
            .read(&self.name, |docs| docs.is_some_and(|docs| docs.contains_key(&doc_id)))
    }

    /// Inserts a new document; fails if the id is taken.
    pub fn insert(&self, doc_id: impl Display, record: &T) -> StoreResult<()> {
        let doc_id = doc_id.to_string();
        let value = serde_json::to_value(record)?;
        self.store.write(&self.name, |docs| {
            if docs.contains_key(&doc_id) {
                return Err(StoreError::DuplicateDocument {
                    table: self.name.clone(),
                    doc_id,
                });
            }
            docs.insert(doc_id, value);
            Ok(())
        })
    }

    /// Inserts or replaces a document.
    pub fn upsert(&self, doc_id: impl Display, record: &T) -> StoreResult<()> {
        let value = serde_json::to_value(record)?;
        self.store.write(&self.name, |docs| {
            docs.insert(doc_id.to_string(), value);
            Ok(())
        })
    }

    /// Replaces an existing document; fails if the id is absent.
    pub fn update(&self, doc_id: impl Display, record: &T) -> StoreResult<()> {
        let doc_id = doc_id.to_string();
        let value = serde_json::to_value(record)?;
        self.store.write(&self.name, |docs| match docs.get_mut(&doc_id) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StoreError::MissingDocument {
                table: self.name.clone(),
                doc_id,
            }),
        })
    }

    /// Read-modify-write of one document under the store lock.
    ///
    /// `f` receives the current record (if any) and returns the record to
    /// store, which is also returned to the caller.
    pub fn modify<F>(&self, doc_id: impl Display, f: F) -> StoreResult<T>
    where
        F: FnOnce(Option<T>) -> T,
    {
        let doc_id = doc_id.to_string();
        self.store.write(&self.name, |docs| {
            let current = docs
                .get(&doc_id)
                .map(|value| self.decode(&doc_id, value))
                .transpose()?;
            let next = f(current);
            docs.insert(doc_id, serde_json::to_value(&next)?);
            Ok(next)
        })
    }

    /// Read-modify-write of one document under a single lock.
    ///
    /// `f` receives the current record (if any) and returns the record to
    /// keep, `None` removing the document, along with a value for the caller.
    pub fn replace_with<F, R>(&self, doc_id: impl Display, f: F) -> StoreResult<R>
    where
        F: FnOnce(Option<T>) -> (Option<T>, R),
    {
        let doc_id = doc_id.to_string();
        self.store.write(&self.name, |docs| {
            let current = docs
                .get(&doc_id)
                .map(|value| self.decode(&doc_id, value))
                .transpose()?;
            let (next, out) = f(current);
            match next {
                Some(record) => {
                    docs.insert(doc_id, serde_json::to_value(&record)?);
                }
                None => {
                    docs.remove(&doc_id);
                }
            }
            Ok(out)
        })
    }

    /// Removes a document, returning whether it existed.
    pub fn remove(&self, doc_id: impl Display) -> StoreResult<bool> {
        let doc_id = doc_id.to_string();
        if !self.contains(&doc_id) {
            return Ok(false);
        }
        self.store
            .write(&self.name, |docs| Ok(docs.remove(&doc_id).is_some()))
    }

    /// Name of the table holding documents of this table that failed to decode.
    pub fn quarantine_name(&self) -> String {
        format!("{}.corrupt", self.name)
    }

    /// Removes every document matching `pred`, returning the removed records.
    ///
    /// Documents that do not decode are moved to [`Self::quarantine_name`]
    /// so one bad record cannot stall the rest of the table.
    pub fn take_where<P>(&self, pred: P) -> StoreResult<Vec<(String, T)>>
    where
        P: Fn(&str, &T) -> bool,
    {
        self.store.write_tables(|tables| {
            let docs = tables.entry(self.name.clone()).or_default();
            let mut taken = Vec::new();
            let mut corrupt = Vec::new();
            for (id, value) in docs.iter() {
                match self.decode(id, value) {
                    Ok(record) if pred(id, &record) => taken.push((id.clone(), record)),
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Quarantining undecodable document: {}", e);
                        corrupt.push(id.clone());
                    }
                }
            }
            for (id, _) in &taken {
                docs.remove(id);
            }

            let moved: Vec<_> = corrupt
                .into_iter()
                .filter_map(|id| docs.remove(&id).map(|value| (id, value)))
                .collect();
            if !moved.is_empty() {
                tables
                    .entry(self.quarantine_name())
                    .or_default()
                    .extend(moved);
            }
            Ok(taken)
        })
    }

    /// Removes every document matching `pred`, returning the removed ids.
    pub fn remove_where<P>(&self, pred: P) -> StoreResult<Vec<String>>
    where
        P: Fn(&str, &T) -> bool,
    {
        Ok(self
            .take_where(pred)?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    /// All documents in id order.
    pub fn all(&self) -> StoreResult<Vec<(String, T)>> {
        self.store.read(&self.name, |docs| self.decode_all(docs))
    }

    /// Linear scan returning the documents matching `pred`.
    pub fn search<P>(&self, pred: P) -> StoreResult<Vec<(String, T)>>
    where
        P: Fn(&str, &T) -> bool,
    {
        Ok(self
            .all()?
            .into_iter()
            .filter(|(id, record)| pred(id, record))
            .collect())
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.store
            .read(&self.name, |docs| docs.map_or(0, BTreeMap::len))
    }

    /// Whether the table holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
        hits: u32,
    }

    fn note(text: &str, hits: u32) -> Note {
        Note {
            text: text.into(),
            hits,
        }
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let store = DocumentStore::in_memory();
        let notes = store.table::<Note>("notes");

        notes.insert(1, &note("a", 0)).unwrap();
        let err = notes.insert(1, &note("b", 0)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDocument { .. }));
        assert_eq!(notes.get(1).unwrap(), Some(note("a", 0)));
    }

    #[test]
    fn test_update_requires_existing_document() {
        let store = DocumentStore::in_memory();
        let notes = store.table::<Note>("notes");

        assert!(matches!(
            notes.update("x", &note("a", 0)).unwrap_err(),
            StoreError::MissingDocument { .. }
        ));
        notes.upsert("x", &note("a", 0)).unwrap();
        notes.update("x", &note("b", 1)).unwrap();
        assert_eq!(notes.get("x").unwrap(), Some(note("b", 1)));
    }

    #[test]
    fn test_modify_creates_and_increments() {
        let store = DocumentStore::in_memory();
        let notes = store.table::<Note>("notes");

        for _ in 0..3 {
            notes
                .modify("counter", |current| {
                    let mut n = current.unwrap_or_else(|| note("counter", 0));
                    n.hits += 1;
                    n
                })
                .unwrap();
        }
        assert_eq!(notes.get("counter").unwrap().unwrap().hits, 3);
    }

    #[test]
    fn test_replace_with_sets_and_removes() {
        let store = DocumentStore::in_memory();
        let notes = store.table::<Note>("notes");

        let previous = notes
            .replace_with("x", |current| (Some(note("a", 1)), current))
            .unwrap();
        assert_eq!(previous, None);
        assert_eq!(notes.get("x").unwrap(), Some(note("a", 1)));

        let previous = notes.replace_with("x", |current| (None, current)).unwrap();
        assert_eq!(previous, Some(note("a", 1)));
        assert!(!notes.contains("x"));
    }

    #[test]
    fn test_take_where_and_search() {
        let store = DocumentStore::in_memory();
        let notes = store.table::<Note>("notes");
        notes.upsert("a", &note("keep", 1)).unwrap();
        notes.upsert("b", &note("drop", 2)).unwrap();
        notes.upsert("c", &note("drop", 3)).unwrap();

        assert_eq!(notes.search(|_, n| n.hits > 1).unwrap().len(), 2);

        let taken = notes.take_where(|_, n| n.text == "drop").unwrap();
        assert_eq!(taken.len(), 2);
        assert_eq!(notes.len(), 1);
        assert!(notes.contains("a"));
        assert!(!notes.remove("b").unwrap());
    }

    #[test]
    fn test_corrupt_document_is_reported() {
        let store = DocumentStore::in_memory();
        store.table::<u32>("notes").upsert("bad", &7).unwrap();

        let err = store.table::<Note>("notes").get("bad").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_take_where_quarantines_undecodable_documents() {
        let store = DocumentStore::in_memory();
        let notes = store.table::<Note>("notes");
        notes.upsert("a", &note("drop", 1)).unwrap();
        notes.upsert("b", &note("keep", 2)).unwrap();
        store.table::<u32>("notes").upsert("bad", &7).unwrap();

        let taken = notes.take_where(|_, n| n.text == "drop").unwrap();
        assert_eq!(taken, vec![("a".to_string(), note("drop", 1))]);
        assert_eq!(notes.all().unwrap(), vec![("b".to_string(), note("keep", 2))]);

        let quarantine = store.table::<u32>(notes.quarantine_name());
        assert_eq!(quarantine.get("bad").unwrap(), Some(7));
    }
}
