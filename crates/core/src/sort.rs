//! Sort parameters for the sorted patient view.

use crate::constants::SORTABLE_FIELDS;
use crate::error::PatientError;
use crate::patient::StoredPatient;
use std::cmp::Ordering;
use std::str::FromStr;

/// Field a sorted view may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Age,
}

impl SortField {
    /// Sort key for `stored`. `None` means the record has no value for this field.
    pub fn key(&self, stored: &StoredPatient) -> Option<i64> {
        match self {
            SortField::Age => stored.age,
        }
    }

    /// Sort key with missing values treated as 0.
    pub fn key_or_default(&self, stored: &StoredPatient) -> i64 {
        self.key(stored).unwrap_or(0)
    }
}

impl FromStr for SortField {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "age" => Ok(SortField::Age),
            _ => Err(PatientError::InvalidArgument(format!(
                "invalid sort field '{s}', choose from {SORTABLE_FIELDS:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Orders two keys; equal keys compare `Equal` in both directions so a stable sort keeps
    /// their original relative order.
    pub fn compare(&self, a: i64, b: i64) -> Ordering {
        match self {
            SortOrder::Asc => a.cmp(&b),
            SortOrder::Desc => b.cmp(&a),
        }
    }
}

impl FromStr for SortOrder {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(PatientError::InvalidArgument(format!(
                "invalid order '{s}', choose 'asc' or 'desc'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_age_is_sortable() {
        assert_eq!("age".parse::<SortField>().unwrap(), SortField::Age);
        for field in ["weight", "Age", "", "bmi"] {
            let err = field.parse::<SortField>().expect_err("not in allow-list");
            assert!(matches!(err, PatientError::InvalidArgument(_)), "{field}");
        }
    }

    #[test]
    fn test_missing_age_sorts_as_zero() {
        let stored = StoredPatient {
            name: Some("No age".into()),
            ..Default::default()
        };
        assert_eq!(SortField::Age.key(&stored), None);
        assert_eq!(SortField::Age.key_or_default(&stored), 0);

        let stored = StoredPatient {
            age: Some(42),
            ..Default::default()
        };
        assert_eq!(SortField::Age.key_or_default(&stored), 42);
    }

    #[test]
    fn test_order_parsing() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("DESC".parse::<SortOrder>().is_err());
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_compare_keeps_ties_equal() {
        assert_eq!(SortOrder::Asc.compare(1, 2), Ordering::Less);
        assert_eq!(SortOrder::Desc.compare(1, 2), Ordering::Greater);
        assert_eq!(SortOrder::Desc.compare(5, 5), Ordering::Equal);
    }
}
