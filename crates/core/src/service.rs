//! Patient operations over the persisted collection.
//!
//! Every operation loads the whole collection from disk. Mutations then change it in memory
//! and save it back before returning; if the save fails the change is dropped with the
//! in-memory copy and the error is returned. Nothing is cached between calls, so edits made
//! to the data file outside the service are seen by the next call.
//!
//! Mutations from one service (and its clones) are serialised by a write lock so two
//! requests in the same process cannot lose each other's changes. Writers in other processes
//! are not coordinated with: the last save wins.

use crate::config::CoreConfig;
use crate::error::{PatientError, PatientResult};
use crate::patient::{Patient, PatientDraft, PatientUpdate, PatientView};
use crate::sort::{SortField, SortOrder};
use crate::store::{CollectionStore, IdMap, PatientStore};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// All patients keyed by id, in collection order.
pub type PatientIndex = IdMap<PatientView>;

/// Pure patient data operations - no API concerns
#[derive(Clone, Debug)]
pub struct PatientService<S = CollectionStore> {
    store: S,
    write_lock: Arc<Mutex<()>>,
}

impl PatientService {
    /// Creates a new instance of PatientService backed by the configured data file.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self::with_store(CollectionStore::new(cfg.patient_data_file()))
    }
}

impl<S: PatientStore> PatientService<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        // Guards `()`: a poisoned lock carries no state to recover.
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns every patient, keyed by id, in collection order.
    ///
    /// Records are returned as stored, including hand-edited ones that break a constraint.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::StorageUnavailable` if the collection cannot be loaded.
    pub fn fetch_all(&self) -> PatientResult<PatientIndex> {
        let collection = self.store.load()?;
        Ok(collection.map_values(|p| PatientView::from(p)))
    }

    /// Returns the patient stored under `id`, as stored.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if there is no such patient, or
    /// `PatientError::StorageUnavailable` if the collection cannot be loaded.
    pub fn fetch_one(&self, id: &str) -> PatientResult<PatientView> {
        let collection = self.store.load()?;
        collection
            .get(id)
            .map(PatientView::from)
            .ok_or_else(|| PatientError::NotFound(id.to_string()))
    }

    /// Returns all patients ordered by `sort_by`, without their ids.
    ///
    /// `order` defaults to ascending. A record with no value for the field sorts as 0.
    /// Patients with equal keys keep their collection order.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidArgument` if `sort_by` is not a sortable field or `order`
    /// is not `asc`/`desc`. Arguments are checked before the collection is loaded.
    pub fn sorted(&self, sort_by: &str, order: Option<&str>) -> PatientResult<Vec<PatientView>> {
        let field: SortField = sort_by.parse()?;
        let order = order
            .map(str::parse::<SortOrder>)
            .transpose()?
            .unwrap_or_default();

        let collection = self.store.load()?;
        let mut records: Vec<_> = collection.values().collect();
        records.sort_by(|a, b| order.compare(field.key_or_default(a), field.key_or_default(b)));

        Ok(records.into_iter().map(PatientView::from).collect())
    }

    /// Validates and stores a new patient.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Conflict` if the id is already taken,
    /// `PatientError::Validation` if the draft breaks a field constraint, or
    /// `PatientError::StorageUnavailable` if the collection cannot be loaded or saved.
    pub fn create(&self, draft: PatientDraft) -> PatientResult<Patient> {
        let _guard = self.lock_writes();
        let mut collection = self.store.load()?;

        if let Some(id) = draft.id.as_deref() {
            if collection.contains(id) {
                return Err(PatientError::Conflict(id.to_string()));
            }
        }

        let patient = Patient::try_from(draft)?;
        collection.upsert(patient.clone());
        self.store.save(&collection)?;

        tracing::info!("created patient {}", patient.id());
        Ok(patient)
    }

    /// Merges `update` onto the patient stored under `id`.
    ///
    /// Only fields present in `update` change. The merged record is fully re-validated and its
    /// BMI recomputed before it is saved.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if there is no such patient,
    /// `PatientError::Validation` if the merged record breaks a field constraint, or
    /// `PatientError::StorageUnavailable` if the collection cannot be loaded or saved.
    pub fn update(&self, id: &str, update: PatientUpdate) -> PatientResult<Patient> {
        let _guard = self.lock_writes();
        let mut collection = self.store.load()?;

        let existing = collection
            .get(id)
            .ok_or_else(|| PatientError::NotFound(id.to_string()))?;

        let merged = update.merge_into(id, existing)?;
        collection.upsert(merged.clone());
        self.store.save(&collection)?;

        tracing::info!("updated patient {}", id);
        Ok(merged)
    }

    /// Removes the patient stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if there is no such patient, or
    /// `PatientError::StorageUnavailable` if the collection cannot be loaded or saved.
    pub fn delete(&self, id: &str) -> PatientResult<()> {
        let _guard = self.lock_writes();
        let mut collection = self.store.load()?;

        if collection.remove(id).is_none() {
            return Err(PatientError::NotFound(id.to_string()));
        }
        self.store.save(&collection)?;

        tracing::info!("deleted patient {}", id);
        Ok(())
    }
}
