//! Core domain types for liftlog.
//!
//! This module defines the persisted document:
//! - Set entries (one logged set of an exercise)
//! - The workout log (unit + ordered exercise map)

use crate::units::{from_kg, Unit};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Current schema version of the persisted document
pub const SCHEMA_VERSION: u32 = 2;

/// Exercise seeded into an empty log
pub const DEFAULT_EXERCISE: &str = "Bench Press";

/// One logged set: `weight_kg` × `reps` on `date`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetEntry {
    pub id: String,
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub reps: u32,
}

impl SetEntry {
    /// Weight expressed in `unit`
    pub fn weight_in(&self, unit: Unit) -> f64 {
        from_kg(self.weight_kg, unit)
    }
}

/// The whole persisted log
///
/// Exercise order is insertion order; "first exercise" always means the
/// first key of `exercises`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLog {
    pub version: u32,
    pub unit: Unit,
    pub exercises: IndexMap<String, Vec<SetEntry>>,
}

impl WorkoutLog {
    /// Empty log with no exercises
    pub fn empty(unit: Unit) -> Self {
        Self {
            version: SCHEMA_VERSION,
            unit,
            exercises: IndexMap::new(),
        }
    }

    /// Log holding a single empty exercise
    pub fn seeded(unit: Unit, exercise: &str) -> Self {
        let mut log = Self::empty(unit);
        log.ensure_seeded(exercise);
        log
    }

    /// Insert `exercise` if the log has no exercises at all.
    ///
    /// Returns true if the log was reseeded.
    pub fn ensure_seeded(&mut self, exercise: &str) -> bool {
        if self.exercises.is_empty() {
            self.exercises.insert(exercise.to_string(), Vec::new());
            true
        } else {
            false
        }
    }

    pub fn first_exercise(&self) -> Option<&str> {
        self.exercises.keys().next().map(String::as_str)
    }

    pub fn entry_count(&self) -> usize {
        self.exercises.values().map(Vec::len).sum()
    }
}
