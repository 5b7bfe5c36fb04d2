//! Flat CSV export of the whole log.
//!
//! One row per set, weights in the log's display unit. The JSON backup is
//! the only format that can be imported back; CSV is for spreadsheets.

use crate::metrics::one_rep_max;
use crate::units::{from_kg, round1};
use crate::{Result, WorkoutLog};
use std::io::Write;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    exercise: &'a str,
    id: &'a str,
    date: String,
    weight: f64,
    unit: &'static str,
    reps: u32,
    one_rep_max: f64,
}

/// Write every set of `log` as CSV (with headers) to `writer`
///
/// Exercises appear in log order, sets in logged order.
pub fn write_csv<W: Write>(log: &WorkoutLog, writer: W) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    let mut count = 0;
    for (exercise, entries) in &log.exercises {
        for entry in entries {
            writer.serialize(CsvRow {
                exercise: exercise.as_str(),
                id: &entry.id,
                date: entry.date.to_string(),
                weight: round1(from_kg(entry.weight_kg, log.unit)),
                unit: log.unit.as_str(),
                reps: entry.reps,
                one_rep_max: round1(from_kg(one_rep_max(entry.weight_kg, entry.reps), log.unit)),
            })?;
            count += 1;
        }
    }

    writer.flush()?;
    tracing::debug!("Wrote {} sets as CSV", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Unit;
    use crate::SetEntry;

    fn sample_log(unit: Unit) -> WorkoutLog {
        let mut log = WorkoutLog::empty(unit);
        log.exercises.insert(
            "Bench Press".into(),
            vec![SetEntry {
                id: "a".into(),
                date: "2024-01-01".parse().unwrap(),
                weight_kg: 100.0,
                reps: 5,
            }],
        );
        log.exercises.insert("Squat".into(), Vec::new());
        log
    }

    #[test]
    fn test_csv_in_kg() {
        let mut buf = Vec::new();
        let count = write_csv(&sample_log(Unit::Kg), &mut buf).unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "exercise,id,date,weight,unit,reps,one_rep_max");
        assert_eq!(lines[1], "Bench Press,a,2024-01-01,100.0,kg,5,116.7");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_csv_in_pounds() {
        let mut buf = Vec::new();
        write_csv(&sample_log(Unit::Lb), &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Bench Press,a,2024-01-01,220.5,lb,5,257.2"));
    }

    #[test]
    fn test_csv_empty_log_has_no_rows() {
        let mut buf = Vec::new();
        let count = write_csv(&WorkoutLog::empty(Unit::Kg), &mut buf).unwrap();
        assert_eq!(count, 0);
        assert!(String::from_utf8(buf).unwrap().lines().count() <= 1);
    }
}
