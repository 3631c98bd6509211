//! Patient record model.
//!
//! A [`Patient`] can only be obtained through validation: either from a [`PatientDraft`]
//! (every field optional, as received from a caller) or by merging a [`PatientUpdate`] onto a
//! [`StoredPatient`]. BMI is never stored; [`Patient::bmi`] derives it from weight and height
//! each time it is asked for.

use crate::constants::MAX_AGE_EXCLUSIVE;
use crate::error::{FieldIssue, PatientError, PatientResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = FieldIssue;

    /// Exact, lowercase match only. Callers that tolerate other casings lowercase first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(FieldIssue::new(
                "gender",
                format!("must be 'male' or 'female', got '{other}'"),
            )),
        }
    }
}

/// Validated fields of a patient, keyed externally by the patient id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientFields {
    pub name: String,
    pub city: String,
    pub age: u32,
    pub gender: Gender,
    pub weight: u32,
    pub height: u32,
    pub medical_history: Vec<String>,
}

/// One value of the persisted collection: a patient's fields without id or BMI.
///
/// Every field is optional so that a hand-edited record missing a value still loads. Only the
/// record an operation rebuilds into a [`Patient`] is checked against the field constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPatient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<Vec<String>>,
}

impl From<&PatientFields> for StoredPatient {
    fn from(fields: &PatientFields) -> Self {
        Self {
            name: Some(fields.name.clone()),
            city: Some(fields.city.clone()),
            age: Some(i64::from(fields.age)),
            gender: Some(fields.gender.as_str().to_string()),
            weight: Some(i64::from(fields.weight)),
            height: Some(i64::from(fields.height)),
            medical_history: Some(fields.medical_history.clone()),
        }
    }
}

/// A validated patient record.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    id: String,
    fields: PatientFields,
}

impl Patient {
    /// Rebuilds a patient from an id and a stored record, re-running every field check.
    pub fn from_stored(id: &str, stored: &StoredPatient) -> PatientResult<Self> {
        let mut draft = PatientDraft::from(stored);
        draft.id = Some(id.to_string());
        Patient::try_from(draft)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &PatientFields {
        &self.fields
    }

    /// Body mass index derived from the current weight and height.
    pub fn bmi(&self) -> f64 {
        bmi(self.fields.weight, self.fields.height)
    }

    pub fn stored(&self) -> StoredPatient {
        StoredPatient::from(&self.fields)
    }

    pub fn into_parts(self) -> (String, PatientFields) {
        (self.id, self.fields)
    }
}

/// BMI in kg/m², rounded to two decimal places.
///
/// `height_cm` must be non-zero; validated records guarantee this.
pub fn bmi(weight_kg: u32, height_cm: u32) -> f64 {
    let height_m = f64::from(height_cm) / 100.0;
    let raw = f64::from(weight_kg) / (height_m * height_m);
    (raw * 100.0).round() / 100.0
}

/// Candidate patient as supplied by a caller, before validation.
///
/// Numeric fields are signed so that negative values reach validation and get a field-level
/// message instead of a generic decoding error.
#[derive(Debug, Clone, Default, PartialEq, utoipa::ToSchema)]
pub struct PatientDraft {
    #[schema(example = "p001")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub age: Option<i64>,
    #[schema(example = "male")]
    pub gender: Option<String>,
    pub weight: Option<i64>,
    pub height: Option<i64>,
    pub medical_history: Option<Vec<String>>,
}

impl PatientDraft {
    /// Reads a draft from a JSON request body.
    ///
    /// Unknown keys are ignored and `null` counts as missing. A known key holding the wrong
    /// JSON type fails with a field-level issue before any constraint is checked.
    pub fn from_json(body: Value) -> PatientResult<Self> {
        let mut object = json_object(body)?;
        let mut issues = Vec::new();

        let id = take_field(&mut object, "id", "a string", &mut issues);
        let fields = PatientUpdate::take_fields(&mut object, &mut issues);
        if !issues.is_empty() {
            return Err(PatientError::Validation(issues));
        }

        Ok(Self {
            id: id.into_option(),
            name: fields.name.into_option(),
            city: fields.city.into_option(),
            age: fields.age.into_option(),
            gender: fields.gender.into_option(),
            weight: fields.weight.into_option(),
            height: fields.height.into_option(),
            medical_history: fields.medical_history.into_option(),
        })
    }
}

impl From<&StoredPatient> for PatientDraft {
    fn from(stored: &StoredPatient) -> Self {
        Self {
            id: None,
            name: stored.name.clone(),
            city: stored.city.clone(),
            age: stored.age,
            gender: stored.gender.clone(),
            weight: stored.weight,
            height: stored.height,
            medical_history: stored.medical_history.clone(),
        }
    }
}

fn json_object(body: Value) -> PatientResult<Map<String, Value>> {
    match body {
        Value::Object(object) => Ok(object),
        _ => Err(PatientError::Validation(vec![FieldIssue::new(
            "body",
            "expected a JSON object",
        )])),
    }
}

/// Removes `field` from `object`. A value of the wrong type is recorded in `issues`.
fn take_field<T: DeserializeOwned>(
    object: &mut Map<String, Value>,
    field: &str,
    expected: &str,
    issues: &mut Vec<FieldIssue>,
) -> Patch<T> {
    match object.remove(field) {
        None => Patch::Absent,
        Some(Value::Null) => Patch::Clear,
        Some(value) => match serde_json::from_value(value) {
            Ok(value) => Patch::Set(value),
            Err(_) => {
                issues.push(FieldIssue::new(field, format!("expected {expected}")));
                Patch::Absent
            }
        },
    }
}

fn required<T>(value: Option<T>, field: &str, issues: &mut Vec<FieldIssue>) -> Option<T> {
    if value.is_none() {
        issues.push(FieldIssue::new(field, "field required"));
    }
    value
}

fn positive(value: Option<i64>, field: &str, issues: &mut Vec<FieldIssue>) -> Option<u32> {
    let value = required(value, field, issues)?;
    if value <= 0 {
        issues.push(FieldIssue::new(field, "must be greater than 0"));
        return None;
    }
    match u32::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            issues.push(FieldIssue::new(field, "is too large"));
            None
        }
    }
}

impl TryFrom<PatientDraft> for Patient {
    type Error = PatientError;

    fn try_from(draft: PatientDraft) -> PatientResult<Self> {
        let mut issues = Vec::new();

        let id = required(draft.id, "id", &mut issues);
        if id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            issues.push(FieldIssue::new("id", "must not be empty"));
        }

        let name = required(draft.name, "name", &mut issues);
        let city = required(draft.city, "city", &mut issues);

        let age = required(draft.age, "age", &mut issues).and_then(|age| {
            if age <= 0 {
                issues.push(FieldIssue::new("age", "must be greater than 0"));
                None
            } else if age >= i64::from(MAX_AGE_EXCLUSIVE) {
                issues.push(FieldIssue::new(
                    "age",
                    format!("must be less than {MAX_AGE_EXCLUSIVE}"),
                ));
                None
            } else {
                u32::try_from(age).ok()
            }
        });

        let gender = required(draft.gender, "gender", &mut issues).and_then(|g| {
            g.parse::<Gender>()
                .map_err(|issue| issues.push(issue))
                .ok()
        });

        let weight = positive(draft.weight, "weight", &mut issues);
        let height = positive(draft.height, "height", &mut issues);
        let medical_history = required(draft.medical_history, "medical_history", &mut issues);

        match (id, name, city, age, gender, weight, height, medical_history) {
            (
                Some(id),
                Some(name),
                Some(city),
                Some(age),
                Some(gender),
                Some(weight),
                Some(height),
                Some(medical_history),
            ) if issues.is_empty() => Ok(Patient {
                id,
                fields: PatientFields {
                    name,
                    city,
                    age,
                    gender,
                    weight,
                    height,
                    medical_history,
                },
            }),
            _ => Err(PatientError::Validation(issues)),
        }
    }
}

/// One field of a partial update.
///
/// `Absent` (key not in the input) leaves the stored value alone, `Clear` (explicit `null`)
/// removes it, `Set` replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    fn apply(self, slot: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Clear => *slot = None,
            Patch::Set(value) => *slot = Some(value),
        }
    }

    fn into_option(self) -> Option<T> {
        match self {
            Patch::Set(value) => Some(value),
            Patch::Absent | Patch::Clear => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Patch::Absent, Patch::Set)
    }
}

/// Partial update of an existing patient.
#[derive(Debug, Clone, Default, PartialEq, utoipa::ToSchema)]
pub struct PatientUpdate {
    #[schema(value_type = Option<String>)]
    pub name: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub city: Patch<String>,
    #[schema(value_type = Option<i64>)]
    pub age: Patch<i64>,
    /// Case-insensitive; stored lowercase.
    #[schema(value_type = Option<String>)]
    pub gender: Patch<String>,
    #[schema(value_type = Option<i64>)]
    pub weight: Patch<i64>,
    #[schema(value_type = Option<i64>)]
    pub height: Patch<i64>,
    #[schema(value_type = Option<Vec<String>>)]
    pub medical_history: Patch<Vec<String>>,
}

impl PatientUpdate {
    /// Reads a partial update from a JSON request body.
    ///
    /// A missing key is `Absent`, `null` is `Clear`. Unknown keys (including `id`) are
    /// ignored. A known key holding the wrong JSON type fails with a field-level issue.
    pub fn from_json(body: Value) -> PatientResult<Self> {
        let mut object = json_object(body)?;
        let mut issues = Vec::new();

        let update = Self::take_fields(&mut object, &mut issues);
        if !issues.is_empty() {
            return Err(PatientError::Validation(issues));
        }
        Ok(update)
    }

    fn take_fields(object: &mut Map<String, Value>, issues: &mut Vec<FieldIssue>) -> Self {
        Self {
            name: take_field(object, "name", "a string", issues),
            city: take_field(object, "city", "a string", issues),
            age: take_field(object, "age", "an integer", issues),
            gender: take_field(object, "gender", "a string", issues),
            weight: take_field(object, "weight", "an integer", issues),
            height: take_field(object, "height", "an integer", issues),
            medical_history: take_field(object, "medical_history", "a list of strings", issues),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_absent()
            && self.city.is_absent()
            && self.age.is_absent()
            && self.gender.is_absent()
            && self.weight.is_absent()
            && self.height.is_absent()
            && self.medical_history.is_absent()
    }

    /// Merges the supplied fields onto the record stored under `id` and validates the result.
    ///
    /// Gender is lowercased after the merge. The stored record itself need not be valid: an
    /// update that supplies the missing or broken fields repairs it.
    pub fn merge_into(self, id: &str, existing: &StoredPatient) -> PatientResult<Patient> {
        let mut draft = PatientDraft::from(existing);

        self.name.apply(&mut draft.name);
        self.city.apply(&mut draft.city);
        self.age.apply(&mut draft.age);
        self.gender.apply(&mut draft.gender);
        self.weight.apply(&mut draft.weight);
        self.height.apply(&mut draft.height);
        self.medical_history.apply(&mut draft.medical_history);

        draft.gender = draft.gender.map(|g| g.to_lowercase());
        draft.id = Some(id.to_string());

        Patient::try_from(draft)
    }
}

/// Patient as returned to callers: the stored fields plus the derived BMI.
///
/// Fields are shown as stored. A field missing from a hand-edited record is left out, and
/// `bmi` is left out unless weight and height are both positive.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct PatientView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "male")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
}

fn positive_u32(value: Option<i64>) -> Option<u32> {
    value
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
}

impl From<&StoredPatient> for PatientView {
    fn from(stored: &StoredPatient) -> Self {
        let bmi = positive_u32(stored.weight)
            .zip(positive_u32(stored.height))
            .map(|(weight, height)| bmi(weight, height));

        Self {
            name: stored.name.clone(),
            city: stored.city.clone(),
            age: stored.age,
            gender: stored.gender.clone(),
            weight: stored.weight,
            height: stored.height,
            medical_history: stored.medical_history.clone(),
            bmi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nitish_draft() -> PatientDraft {
        PatientDraft {
            id: Some("p001".into()),
            name: Some("Nitish".into()),
            city: Some("Delhi".into()),
            age: Some(30),
            gender: Some("male".into()),
            weight: Some(70),
            height: Some(175),
            medical_history: Some(vec![]),
        }
    }

    fn nitish() -> Patient {
        Patient::try_from(nitish_draft()).expect("draft should be valid")
    }

    fn field_names(err: &PatientError) -> Vec<&str> {
        err.issues().iter().map(|i| i.field.as_str()).collect()
    }

    #[test]
    fn test_bmi_rounds_to_two_places() {
        assert_eq!(bmi(70, 175), 22.86);
        assert_eq!(bmi(80, 175), 26.12);
        assert_eq!(bmi(100, 200), 25.0);
    }

    #[test]
    fn test_valid_draft_builds_patient_with_bmi() {
        let patient = nitish();

        assert_eq!(patient.id(), "p001");
        assert_eq!(patient.fields().gender, Gender::Male);
        assert_eq!(patient.bmi(), 22.86);
        assert_eq!(PatientView::from(&patient.stored()).bmi, Some(22.86));
    }

    #[test]
    fn test_age_bounds_are_exclusive() {
        for age in [0, -3, 100, 150] {
            let mut draft = nitish_draft();
            draft.age = Some(age);
            let err = Patient::try_from(draft).expect_err("age should be rejected");
            assert_eq!(field_names(&err), vec!["age"], "age {age}");
        }

        for age in [1, 99] {
            let mut draft = nitish_draft();
            draft.age = Some(age);
            assert!(Patient::try_from(draft).is_ok(), "age {age}");
        }
    }

    #[test]
    fn test_rejects_non_positive_weight_and_height() {
        let mut draft = nitish_draft();
        draft.weight = Some(0);
        draft.height = Some(-175);

        let err = Patient::try_from(draft).expect_err("should be rejected");
        assert_eq!(field_names(&err), vec!["weight", "height"]);
    }

    #[test]
    fn test_gender_must_be_exact_lowercase() {
        let mut draft = nitish_draft();
        draft.gender = Some("Male".into());
        let err = Patient::try_from(draft).expect_err("'Male' is not in the enumerated set");
        assert_eq!(field_names(&err), vec!["gender"]);

        let mut draft = nitish_draft();
        draft.gender = Some("other".into());
        assert!(Patient::try_from(draft).is_err());
    }

    #[test]
    fn test_missing_fields_reported_individually() {
        let draft = PatientDraft {
            id: Some("p002".into()),
            name: Some("Asha".into()),
            ..Default::default()
        };

        let err = Patient::try_from(draft).expect_err("draft is incomplete");
        assert_eq!(
            field_names(&err),
            vec!["city", "age", "gender", "weight", "height", "medical_history"]
        );
        assert!(err.issues().iter().all(|i| i.message == "field required"));
    }

    #[test]
    fn test_blank_id_rejected() {
        let mut draft = nitish_draft();
        draft.id = Some("  ".into());
        let err = Patient::try_from(draft).expect_err("blank id");
        assert_eq!(field_names(&err), vec!["id"]);
    }

    #[test]
    fn test_draft_from_json_reads_every_field() {
        let body = json!({
            "id": "p001",
            "name": "Nitish",
            "city": "Delhi",
            "age": 30,
            "gender": "male",
            "weight": 70,
            "height": 175,
            "medical_history": [],
            "bmi": 99.0
        });

        let draft = PatientDraft::from_json(body).expect("body should parse");
        assert_eq!(draft, nitish_draft());
    }

    #[test]
    fn test_draft_from_json_reports_wrong_types_per_field() {
        let body = json!({
            "id": "p001",
            "name": "Nitish",
            "age": "thirty",
            "weight": 70.5,
            "medical_history": "asthma"
        });

        let err = PatientDraft::from_json(body).expect_err("wrong types");
        assert_eq!(
            err.issues(),
            &[
                FieldIssue::new("age", "expected an integer"),
                FieldIssue::new("weight", "expected an integer"),
                FieldIssue::new("medical_history", "expected a list of strings"),
            ]
        );
    }

    #[test]
    fn test_from_json_rejects_non_object_body() {
        let err = PatientDraft::from_json(json!([1, 2])).expect_err("array body");
        assert_eq!(field_names(&err), vec!["body"]);

        let err = PatientUpdate::from_json(json!("weight")).expect_err("string body");
        assert_eq!(field_names(&err), vec!["body"]);
    }

    #[test]
    fn test_update_weight_only_recomputes_bmi() {
        let existing = nitish();
        let update = PatientUpdate {
            weight: Patch::Set(80),
            ..Default::default()
        };

        let merged = update
            .merge_into(existing.id(), &existing.stored())
            .expect("merge should succeed");

        assert_eq!(merged.id(), "p001");
        assert_eq!(merged.fields().weight, 80);
        assert_eq!(merged.fields().name, "Nitish");
        assert_eq!(merged.fields().height, 175);
        assert_eq!(merged.bmi(), 26.12);
    }

    #[test]
    fn test_update_lowercases_gender() {
        let existing = nitish();
        let update = PatientUpdate {
            gender: Patch::Set("FEMALE".into()),
            ..Default::default()
        };

        let merged = update.merge_into("p001", &existing.stored()).unwrap();
        assert_eq!(merged.fields().gender, Gender::Female);
    }

    #[test]
    fn test_update_revalidates_merged_record() {
        let existing = nitish();
        let update = PatientUpdate {
            age: Patch::Set(120),
            ..Default::default()
        };

        let err = update
            .merge_into("p001", &existing.stored())
            .expect_err("age 120 is out of range");
        assert_eq!(field_names(&err), vec!["age"]);
    }

    #[test]
    fn test_update_can_repair_incomplete_stored_record() {
        let mut stored = nitish().stored();
        stored.age = None;

        let update = PatientUpdate {
            age: Patch::Set(31),
            ..Default::default()
        };
        let merged = update.merge_into("p001", &stored).expect("age supplied");
        assert_eq!(merged.fields().age, 31);
    }

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let update = PatientUpdate::from_json(json!({"city": null, "weight": 72}))
            .expect("valid body");

        assert_eq!(update.name, Patch::Absent);
        assert_eq!(update.city, Patch::Clear);
        assert_eq!(update.weight, Patch::Set(72));
        assert!(!update.is_empty());
        assert!(PatientUpdate::from_json(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_update_from_json_reports_wrong_type() {
        let err = PatientUpdate::from_json(json!({"height": "tall", "id": 5}))
            .expect_err("height is not an integer");
        assert_eq!(err.issues(), &[FieldIssue::new("height", "expected an integer")]);
    }

    #[test]
    fn test_clearing_required_field_fails_validation() {
        let existing = nitish();
        let update = PatientUpdate::from_json(json!({"city": null})).unwrap();

        let err = update
            .merge_into("p001", &existing.stored())
            .expect_err("city is required");
        assert_eq!(err.issues(), &[FieldIssue::new("city", "field required")]);
    }

    #[test]
    fn test_omitted_medical_history_is_left_untouched() {
        let mut draft = nitish_draft();
        draft.medical_history = Some(vec!["asthma".into()]);
        let existing = Patient::try_from(draft).unwrap();

        let update = PatientUpdate::from_json(json!({"city": "Mumbai"})).unwrap();
        let merged = update.merge_into("p001", &existing.stored()).unwrap();

        assert_eq!(merged.fields().city, "Mumbai");
        assert_eq!(merged.fields().medical_history, vec!["asthma".to_string()]);
    }

    #[test]
    fn test_stored_record_serialises_without_id_or_bmi() {
        let value = serde_json::to_value(nitish().stored()).unwrap();

        assert!(value.get("id").is_none());
        assert!(value.get("bmi").is_none());
        assert_eq!(value["gender"], "male");
    }

    #[test]
    fn test_view_of_incomplete_record_omits_missing_values() {
        let stored = StoredPatient {
            name: Some("Asha".into()),
            weight: Some(60),
            height: Some(0),
            ..Default::default()
        };

        let view = PatientView::from(&stored);
        assert_eq!(view.name.as_deref(), Some("Asha"));
        assert_eq!(view.bmi, None);

        let value = serde_json::to_value(&view).unwrap();
        assert!(value.get("age").is_none());
        assert!(value.get("bmi").is_none());
    }
}
