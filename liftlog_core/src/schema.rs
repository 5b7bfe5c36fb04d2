//! Decoding of stored and imported log documents.
//!
//! Two document shapes are understood:
//! - schema 2: entries carry `weightKg`
//! - schema 1 (legacy): entries carry `weightDisplay`, expressed in the
//!   document's `unit`
//!
//! Both decode into a [`WorkoutLog`] with kilogram weights and the current
//! schema version. Anything else is rejected as [`Error::Import`].

use crate::units::{to_kg, Unit};
use crate::{Error, Result, SetEntry, WorkoutLog, SCHEMA_VERSION};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawDocument {
    version: Option<u32>,
    unit: Option<Unit>,
    exercises: Option<IndexMap<String, Vec<RawEntry>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    id: String,
    date: NaiveDate,
    weight_kg: Option<f64>,
    weight_display: Option<f64>,
    reps: f64,
}

/// Decode a document from JSON text.
///
/// `fallback_unit` is used when the document carries no `unit` field.
/// The returned log may have no exercises; callers reseed it.
pub fn decode(text: &str, fallback_unit: Unit) -> Result<WorkoutLog> {
    let raw: RawDocument =
        serde_json::from_str(text).map_err(|e| Error::Import(e.to_string()))?;

    if let Some(version) = raw.version {
        if version > SCHEMA_VERSION {
            return Err(Error::Import(format!(
                "unsupported schema version {} (newest known is {})",
                version, SCHEMA_VERSION
            )));
        }
    }

    let raw_exercises = raw
        .exercises
        .ok_or_else(|| Error::Import("missing 'exercises' field".into()))?;
    let unit = raw.unit.unwrap_or(fallback_unit);

    let mut exercises = IndexMap::with_capacity(raw_exercises.len());
    for (name, raw_entries) in raw_exercises {
        let entries = raw_entries
            .into_iter()
            .map(|raw| convert_entry(&name, raw, unit))
            .collect::<Result<Vec<_>>>()?;
        exercises.insert(name, entries);
    }

    Ok(WorkoutLog {
        version: SCHEMA_VERSION,
        unit,
        exercises,
    })
}

fn convert_entry(exercise: &str, raw: RawEntry, unit: Unit) -> Result<SetEntry> {
    let weight_kg = match (raw.weight_kg, raw.weight_display) {
        (Some(kg), _) => kg,
        (None, Some(display)) => to_kg(display, unit),
        (None, None) => {
            return Err(Error::Import(format!(
                "set {} of '{}' has no weight",
                raw.id, exercise
            )))
        }
    };

    if !(raw.reps > 0.0 && raw.reps.fract() == 0.0 && raw.reps <= f64::from(u32::MAX)) {
        return Err(Error::Import(format!(
            "set {} of '{}' has invalid reps {}",
            raw.id, exercise, raw.reps
        )));
    }

    Ok(SetEntry {
        id: raw.id,
        date: raw.date,
        weight_kg,
        reps: raw.reps as u32,
    })
}

/// Compact JSON used for the persisted blob
pub fn encode(log: &WorkoutLog) -> Result<String> {
    Ok(serde_json::to_string(log)?)
}

/// Indented JSON used for backups
pub fn encode_pretty(log: &WorkoutLog) -> Result<String> {
    Ok(serde_json::to_string_pretty(log)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::lb_to_kg;

    #[test]
    fn test_decode_current_schema() {
        let json = r#"{
            "version": 2,
            "unit": "lb",
            "exercises": {
                "Squat": [{"id": "a", "date": "2024-01-01", "weightKg": 140.0, "reps": 3}]
            }
        }"#;
        let log = decode(json, Unit::Kg).unwrap();
        assert_eq!(log.unit, Unit::Lb);
        assert_eq!(log.exercises["Squat"][0].weight_kg, 140.0);
        assert_eq!(log.exercises["Squat"][0].reps, 3);
    }

    #[test]
    fn test_decode_legacy_display_weights() {
        let json = r#"{
            "version": 1,
            "unit": "lb",
            "exercises": {
                "Bench Press": [{"id": "x", "date": "2024-03-02", "weightDisplay": 225, "reps": 5}]
            }
        }"#;
        let log = decode(json, Unit::Kg).unwrap();
        assert_eq!(log.version, SCHEMA_VERSION);
        let entry = &log.exercises["Bench Press"][0];
        assert!((entry.weight_kg - lb_to_kg(225.0)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_unit_uses_fallback() {
        let json = r#"{"exercises": {"Row": [{"id": "r", "date": "2024-01-01", "weightDisplay": 100, "reps": 8}]}}"#;
        let log = decode(json, Unit::Lb).unwrap();
        assert_eq!(log.unit, Unit::Lb);
        assert!((log.exercises["Row"][0].weight_kg - lb_to_kg(100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_exercises_rejected() {
        let err = decode(r#"{"version": 1, "unit": "kg"}"#, Unit::Kg).unwrap_err();
        assert!(matches!(err, Error::Import(_)));

        let err = decode(r#"{"exercises": null}"#, Unit::Kg).unwrap_err();
        assert!(matches!(err, Error::Import(_)));
    }

    #[test]
    fn test_non_object_rejected() {
        for text in ["[]", "42", "\"exercises\"", "null", "{ invalid json }"] {
            assert!(
                matches!(decode(text, Unit::Kg), Err(Error::Import(_))),
                "accepted {}",
                text
            );
        }
    }

    #[test]
    fn test_bad_entries_rejected() {
        let fractional = r#"{"exercises": {"A": [{"id": "1", "date": "2024-01-01", "weightKg": 50, "reps": 2.5}]}}"#;
        assert!(decode(fractional, Unit::Kg).is_err());

        let zero = r#"{"exercises": {"A": [{"id": "1", "date": "2024-01-01", "weightKg": 50, "reps": 0}]}}"#;
        assert!(decode(zero, Unit::Kg).is_err());

        let no_weight = r#"{"exercises": {"A": [{"id": "1", "date": "2024-01-01", "reps": 5}]}}"#;
        assert!(decode(no_weight, Unit::Kg).is_err());

        let bad_date = r#"{"exercises": {"A": [{"id": "1", "date": "yesterday", "weightKg": 50, "reps": 5}]}}"#;
        assert!(decode(bad_date, Unit::Kg).is_err());
    }

    #[test]
    fn test_future_version_rejected() {
        let json = r#"{"version": 9, "exercises": {}}"#;
        assert!(matches!(decode(json, Unit::Kg), Err(Error::Import(_))));
    }

    #[test]
    fn test_encode_roundtrip() {
        let json = r#"{"unit": "kg", "exercises": {"A": [{"id": "1", "date": "2024-01-01", "weightKg": 62.5, "reps": 10}], "B": []}}"#;
        let log = decode(json, Unit::Kg).unwrap();
        let pretty = encode_pretty(&log).unwrap();
        assert!(pretty.contains('\n'));
        assert_eq!(decode(&pretty, Unit::Lb).unwrap(), log);
        assert_eq!(decode(&encode(&log).unwrap(), Unit::Lb).unwrap(), log);
    }
}
