//! Whole-document patient collection storage.
//!
//! The collection is persisted as a single JSON object mapping patient ids to their stored
//! fields:
//!
//! ```text
//! {
//!   "p001": { "name": "Nitish", "city": "Delhi", "age": 30, ... },
//!   "p002": { ... }
//! }
//! ```
//!
//! There are no partial reads or writes. [`CollectionStore`] loads the whole document and
//! saves it by writing a temporary file in the same directory and renaming it over the
//! original, so readers never observe a half-written file.

use crate::error::{PatientError, PatientResult, StorageFault};
use crate::patient::{Patient, StoredPatient};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Ordered mapping of patient id to a value, serialised as a JSON object.
///
/// Order is insertion order (for a loaded document, document order). Ids are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct IdMap<V> {
    entries: Vec<(String, V)>,
}

/// The persisted collection.
pub type Collection = IdMap<StoredPatient>;

impl<V> Default for IdMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> IdMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&V> {
        self.position(id).map(|index| &self.entries[index].1)
    }

    /// Inserts `value` under `id`, replacing an existing entry in place.
    ///
    /// New ids are appended. Returns the previous value if the id was already present.
    pub fn insert(&mut self, id: String, value: V) -> Option<V> {
        match self.position(&id) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.entries.push((id, value));
                None
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<V> {
        self.position(id).map(|index| self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Same ids in the same order, each value converted with `f`.
    pub fn map_values<U>(&self, mut f: impl FnMut(&V) -> U) -> IdMap<U> {
        IdMap {
            entries: self
                .entries
                .iter()
                .map(|(id, value)| (id.clone(), f(value)))
                .collect(),
        }
    }
}

impl Collection {
    /// Stores `patient`, replacing any entry with the same id in place.
    pub fn upsert(&mut self, patient: Patient) -> Option<StoredPatient> {
        let (id, fields) = patient.into_parts();
        self.insert(id, StoredPatient::from(&fields))
    }
}

impl<V: Serialize> Serialize for IdMap<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, value) in &self.entries {
            map.serialize_entry(id, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for IdMap<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for IdMapVisitor<V> {
            type Value = IdMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by patient id")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let capacity = access.size_hint().unwrap_or(0);
                let mut seen = HashSet::with_capacity(capacity);
                let mut entries = Vec::with_capacity(capacity);

                while let Some((id, value)) = access.next_entry::<String, V>()? {
                    if !seen.insert(id.clone()) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate patient id '{id}'"
                        )));
                    }
                    entries.push((id, value));
                }
                Ok(IdMap { entries })
            }
        }

        deserializer.deserialize_map(IdMapVisitor(PhantomData))
    }
}

/// Whole-collection persistence behind [`PatientService`](crate::PatientService).
pub trait PatientStore {
    /// Reads the entire persisted collection.
    fn load(&self) -> PatientResult<Collection>;

    /// Replaces the entire persisted collection.
    fn save(&self, collection: &Collection) -> PatientResult<()>;
}

/// JSON file holding the persisted collection.
#[derive(Clone, Debug)]
pub struct CollectionStore {
    path: PathBuf,
}

impl CollectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates an empty collection document if none exists.
    ///
    /// Returns `true` if a new document was written. An existing document is never touched.
    pub fn initialise(&self) -> PatientResult<bool> {
        match fs::metadata(&self.path) {
            Ok(_) => Ok(false),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent).map_err(|e| {
                            PatientError::storage(&self.path, StorageFault::FileWrite(e))
                        })?;
                    }
                }
                self.save(&Collection::new())?;
                tracing::info!("initialised empty patient data file: {}", self.path.display());
                Ok(true)
            }
            Err(e) => Err(PatientError::storage(&self.path, StorageFault::FileRead(e))),
        }
    }
}

impl PatientStore for CollectionStore {
    /// # Errors
    ///
    /// Returns `PatientError::StorageUnavailable` if the document is missing, unreadable or not
    /// a JSON object of patient records. Records with missing or out-of-range values still
    /// load; they are only checked when an operation rebuilds them.
    fn load(&self) -> PatientResult<Collection> {
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| PatientError::storage(&self.path, StorageFault::FileRead(e)))?;

        serde_json::from_str(&contents).map_err(|e| {
            tracing::error!("patient data is corrupt: {} - {}", self.path.display(), e);
            PatientError::storage(&self.path, StorageFault::Deserialization(e))
        })
    }

    /// # Errors
    ///
    /// Returns `PatientError::StorageUnavailable` if serialisation, the temporary write or the
    /// final rename fails. The previous document is left intact in every failure case.
    fn save(&self, collection: &Collection) -> PatientResult<()> {
        let json = serde_json::to_string_pretty(collection)
            .map_err(|e| PatientError::storage(&self.path, StorageFault::Serialization(e)))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let write_err = |e| PatientError::storage(&self.path, StorageFault::FileWrite(e));

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        tracing::debug!(
            "saved {} patient(s) to {}",
            collection.len(),
            self.path.display()
        );
        Ok(())
    }
}
