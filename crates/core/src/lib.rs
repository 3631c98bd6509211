//! # PMS Core
//!
//! Core business logic for the patient management service.
//!
//! This crate contains pure data operations over a single persisted collection:
//! - Patient record model with field validation and derived BMI ([`patient`])
//! - Whole-document load/save of the collection ([`store`])
//! - Fetch, sort, create, update and delete operations ([`service`])
//!
//! **No API concerns**: HTTP servers, routing and response formatting belong in `api-rest`.

pub mod config;
pub mod constants;
pub mod error;
pub mod patient;
pub mod service;
pub mod sort;
pub mod store;

pub use config::CoreConfig;
pub use constants::DEFAULT_PATIENT_DATA_FILE;
pub use error::{FieldIssue, PatientError, PatientResult, StorageFault};
pub use patient::{
    Gender, Patch, Patient, PatientDraft, PatientFields, PatientUpdate, PatientView, StoredPatient,
};
pub use service::{PatientIndex, PatientService};
pub use sort::{SortField, SortOrder};
pub use store::{Collection, CollectionStore, IdMap, PatientStore};
