//! Derived statistics over an exercise's sets.
//!
//! All functions here are pure. They compute on kilogram weights and convert
//! to the display unit only in their outputs:
//! - Epley one-rep-max estimate
//! - Baseline / best / percent change summary
//! - Per-date progress series
//! - History rows (newest first)

use crate::units::{from_kg, Unit};
use crate::{Error, Result, SetEntry};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Which per-set value the summary and series are based on
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    /// Estimated one-rep max (Epley)
    #[default]
    OneRepMax,
    /// Raw lifted weight
    Weight,
}

impl ComparisonMetric {
    /// Metric value of a single set, in kilograms
    pub fn value_kg(&self, entry: &SetEntry) -> f64 {
        match self {
            ComparisonMetric::OneRepMax => one_rep_max(entry.weight_kg, entry.reps),
            ComparisonMetric::Weight => entry.weight_kg,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComparisonMetric::OneRepMax => "1RM",
            ComparisonMetric::Weight => "weight",
        }
    }
}

impl FromStr for ComparisonMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1rm" | "one_rep_max" | "one-rep-max" | "orm" => Ok(ComparisonMetric::OneRepMax),
            "weight" => Ok(ComparisonMetric::Weight),
            other => Err(Error::Validation(format!(
                "unknown metric '{}' (expected 1rm or weight)",
                other
            ))),
        }
    }
}

/// Epley estimate: `weight * (1 + reps / 30)`
pub fn one_rep_max(weight: f64, reps: u32) -> f64 {
    weight * (1.0 + f64::from(reps) / 30.0)
}

/// Baseline / best / percent change for one exercise, in the display unit
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub baseline: f64,
    pub best: f64,
    pub percent_change: f64,
}

/// Summarize an exercise.
///
/// Baseline is the metric of the earliest set by date (ties keep sequence
/// order). Best is the maximum over every set. Returns `None` for an empty
/// sequence.
pub fn summarize(entries: &[SetEntry], metric: ComparisonMetric, unit: Unit) -> Option<Summary> {
    let earliest = entries
        .iter()
        .enumerate()
        .min_by_key(|(idx, entry)| (entry.date, *idx))
        .map(|(_, entry)| entry)?;

    let baseline = metric.value_kg(earliest);
    let best = entries
        .iter()
        .map(|entry| metric.value_kg(entry))
        .fold(f64::NEG_INFINITY, f64::max);

    Some(Summary {
        baseline: from_kg(baseline, unit),
        best: from_kg(best, unit),
        percent_change: percent_change(baseline, best),
    })
}

/// `(best - baseline) / baseline * 100`, or 0 unless baseline is positive
pub fn percent_change(baseline: f64, best: f64) -> f64 {
    if baseline > 0.0 {
        (best - baseline) / baseline * 100.0
    } else {
        0.0
    }
}

/// One progress point: the best metric value logged on `date`
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Per-date series in ascending date order, display unit
pub fn progress_series(
    entries: &[SetEntry],
    metric: ComparisonMetric,
    unit: Unit,
) -> Vec<SeriesPoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for entry in entries {
        let value = metric.value_kg(entry);
        by_date
            .entry(entry.date)
            .and_modify(|best| *best = best.max(value))
            .or_insert(value);
    }

    by_date
        .into_iter()
        .map(|(date, kg)| SeriesPoint {
            date,
            value: from_kg(kg, unit),
        })
        .collect()
}

/// A history table row in the display unit
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryRow {
    pub id: String,
    pub date: NaiveDate,
    pub weight: f64,
    pub reps: u32,
    pub one_rep_max: f64,
}

/// History rows, newest date first; sets on the same date keep sequence order
pub fn history_rows(entries: &[SetEntry], unit: Unit) -> Vec<HistoryRow> {
    let mut sorted: Vec<&SetEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    sorted
        .into_iter()
        .map(|entry| HistoryRow {
            id: entry.id.clone(),
            date: entry.date,
            weight: entry.weight_in(unit),
            reps: entry.reps,
            one_rep_max: from_kg(one_rep_max(entry.weight_kg, entry.reps), unit),
        })
        .collect()
}
