//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handling never reads environment variables, so every
//! request in a process sees the same data file.

use crate::constants::DEFAULT_PATIENT_DATA_FILE;
use crate::{PatientError, PatientResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patient_data_file: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidArgument` if `patient_data_file` is empty or names a
    /// directory.
    pub fn new(patient_data_file: PathBuf) -> PatientResult<Self> {
        if patient_data_file.as_os_str().is_empty() {
            return Err(PatientError::InvalidArgument(
                "patient data file path cannot be empty".into(),
            ));
        }
        if patient_data_file.is_dir() {
            return Err(PatientError::InvalidArgument(format!(
                "patient data file path is a directory: {}",
                patient_data_file.display()
            )));
        }

        Ok(Self { patient_data_file })
    }

    pub fn patient_data_file(&self) -> &Path {
        &self.patient_data_file
    }
}

/// Resolve the patient data file from an optional raw value.
///
/// `None` or an empty/whitespace value falls back to [`DEFAULT_PATIENT_DATA_FILE`].
pub fn patient_data_file_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PATIENT_DATA_FILE))
}

/// Parse a boolean flag such as `PMS_INIT_STORE`.
///
/// Accepts `1`, `true`, `yes` and `on` (case-insensitive); anything else is `false`.
pub fn flag_from_env_value(value: Option<String>) -> bool {
    value
        .map(|v| v.trim().to_ascii_lowercase())
        .is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_patient_data_file_defaults_when_unset_or_blank() {
        assert_eq!(
            patient_data_file_from_env_value(None),
            PathBuf::from(DEFAULT_PATIENT_DATA_FILE)
        );
        assert_eq!(
            patient_data_file_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_PATIENT_DATA_FILE)
        );
        assert_eq!(
            patient_data_file_from_env_value(Some(" /data/patients.json ".into())),
            PathBuf::from("/data/patients.json")
        );
    }

    #[test]
    fn test_flag_from_env_value() {
        assert!(flag_from_env_value(Some("TRUE".into())));
        assert!(flag_from_env_value(Some("1".into())));
        assert!(!flag_from_env_value(Some("no".into())));
        assert!(!flag_from_env_value(None));
    }

    #[test]
    fn test_core_config_rejects_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let err = CoreConfig::new(temp_dir.path().to_path_buf())
            .expect_err("a directory is not a data file");
        assert!(matches!(err, PatientError::InvalidArgument(_)));
    }

    #[test]
    fn test_core_config_accepts_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("patient.json");
        let cfg = CoreConfig::new(path.clone()).expect("CoreConfig::new should succeed");
        assert_eq!(cfg.patient_data_file(), path.as_path());
    }
}
