//! Constants used throughout the PMS core crate.

/// Default path of the patient collection document when none is configured.
pub const DEFAULT_PATIENT_DATA_FILE: &str = "patient.json";

/// Fields the sorted view accepts for `sort_by`.
pub const SORTABLE_FIELDS: &[&str] = &["age"];

/// Exclusive upper bound for a patient's age in years.
pub const MAX_AGE_EXCLUSIVE: u32 = 100;
