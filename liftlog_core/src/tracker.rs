//! The workout log together with its persistence.
//!
//! [`Tracker`] owns the in-memory [`WorkoutLog`], the active exercise
//! selection and the collaborators it needs (blob store, id generator).
//! Every mutation is saved before it becomes visible in memory, so a failed
//! validation or a failed save leaves both memory and storage untouched.

use crate::export::write_csv;
use crate::ids::{IdGenerator, UuidIds};
use crate::metrics::{self, ComparisonMetric, HistoryRow, SeriesPoint, Summary};
use crate::persist::BlobStore;
use crate::schema;
use crate::units::{to_kg, Unit};
use crate::{Error, Result, SetEntry, WorkoutLog, DEFAULT_EXERCISE};
use chrono::{NaiveDate, Utc};

/// Key the log is saved under
pub const DATA_KEY: &str = "liftlog_data_v2";

/// Key used by schema-1 logs; read once and migrated
pub const LEGACY_DATA_KEY: &str = "gt_data_v1";

/// Yes/no gate for destructive operations
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// What [`Tracker::delete_exercise`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
    NotFound,
}

/// Values used when seeding a fresh or emptied log
#[derive(Clone, Debug)]
pub struct TrackerDefaults {
    pub unit: Unit,
    pub exercise: String,
}

impl Default for TrackerDefaults {
    fn default() -> Self {
        Self {
            unit: Unit::Kg,
            exercise: DEFAULT_EXERCISE.to_string(),
        }
    }
}

pub struct Tracker<S: BlobStore, G: IdGenerator = UuidIds> {
    log: WorkoutLog,
    active: String,
    store: S,
    ids: G,
    defaults: TrackerDefaults,
}

impl<S: BlobStore> Tracker<S, UuidIds> {
    /// Open the log with UUID ids and default seeding
    pub fn open(store: S) -> Result<Self> {
        Self::open_with(store, UuidIds, TrackerDefaults::default())
    }
}

impl<S: BlobStore, G: IdGenerator> Tracker<S, G> {
    /// Load the log from `store`.
    ///
    /// - Nothing saved: a seeded log is created and saved.
    /// - Only a legacy blob: it is decoded, converted and saved under
    ///   [`DATA_KEY`].
    /// - Corrupt or unreadable blob: a warning is logged and an empty seeded
    ///   log is used in memory; the blob is only replaced by the next
    ///   mutation.
    pub fn open_with(store: S, ids: G, defaults: TrackerDefaults) -> Result<Self> {
        let mut tracker = Self {
            log: WorkoutLog::empty(defaults.unit),
            active: String::new(),
            store,
            ids,
            defaults,
        };

        match tracker.store.get(DATA_KEY) {
            Ok(Some(blob)) => tracker.load_blob(DATA_KEY, &blob),
            Err(e) => tracker.fall_back(DATA_KEY, &e),
            Ok(None) => match tracker.store.get(LEGACY_DATA_KEY) {
                Ok(Some(blob)) => {
                    tracker.load_blob(LEGACY_DATA_KEY, &blob);
                    tracker.save()?;
                    tracing::info!(
                        "Migrated {} sets from {} to {}",
                        tracker.log.entry_count(),
                        LEGACY_DATA_KEY,
                        DATA_KEY
                    );
                }
                Err(e) => {
                    tracker.fall_back(LEGACY_DATA_KEY, &e);
                    tracker.save()?;
                }
                Ok(None) => {
                    tracing::info!("No saved log found, seeding a new one");
                    tracker.reseed();
                    tracker.save()?;
                }
            },
        }

        Ok(tracker)
    }

    fn load_blob(&mut self, key: &str, blob: &str) {
        match schema::decode(blob, self.defaults.unit) {
            Ok(log) => {
                tracing::debug!(
                    "Loaded {} exercises ({} sets) from {}",
                    log.exercises.len(),
                    log.entry_count(),
                    key
                );
                self.log = log;
            }
            Err(e) => {
                tracing::warn!("Failed to parse saved log {}: {}. Using defaults.", key, e);
                self.log = WorkoutLog::empty(self.defaults.unit);
            }
        }
        self.reseed();
    }

    fn fall_back(&mut self, key: &str, err: &Error) {
        tracing::warn!("Failed to read saved log {}: {}. Using defaults.", key, err);
        self.log = WorkoutLog::empty(self.defaults.unit);
        self.reseed();
    }

    /// Reseed an empty log and select its first exercise
    fn reseed(&mut self) {
        if self.log.ensure_seeded(&self.defaults.exercise) {
            tracing::debug!("Seeded default exercise '{}'", self.defaults.exercise);
        }
        self.active = self
            .log
            .first_exercise()
            .unwrap_or(self.defaults.exercise.as_str())
            .to_string();
    }

    fn save(&mut self) -> Result<()> {
        let blob = schema::encode(&self.log)?;
        self.store.put(DATA_KEY, &blob)
    }

    /// Save `log`, then make it the in-memory log
    fn commit(&mut self, log: WorkoutLog) -> Result<()> {
        let blob = schema::encode(&log)?;
        self.store.put(DATA_KEY, &blob)?;
        self.log = log;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn log(&self) -> &WorkoutLog {
        &self.log
    }

    pub fn unit(&self) -> Unit {
        self.log.unit
    }

    pub fn active_exercise(&self) -> &str {
        &self.active
    }

    pub fn exercise_names(&self) -> impl Iterator<Item = &str> {
        self.log.exercises.keys().map(String::as_str)
    }

    /// Sets of the active exercise, in logged order
    pub fn entries(&self) -> &[SetEntry] {
        self.log
            .exercises
            .get(&self.active)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------
    // Exercises
    // ------------------------------------------------------------------

    /// Create an exercise and select it.
    ///
    /// Blank names are ignored; an existing name is only selected. Returns
    /// true if a new exercise was created.
    pub fn add_exercise(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }

        if self.log.exercises.contains_key(name) {
            self.active = name.to_string();
            return Ok(false);
        }

        let mut log = self.log.clone();
        log.exercises.insert(name.to_string(), Vec::new());
        self.commit(log)?;
        self.active = name.to_string();
        tracing::info!("Added exercise '{}'", name);
        Ok(true)
    }

    /// Select an existing exercise; returns false if it does not exist
    pub fn select_exercise(&mut self, name: &str) -> bool {
        if self.log.exercises.contains_key(name) {
            self.active = name.to_string();
            true
        } else {
            false
        }
    }

    /// Delete an exercise and all of its sets once `confirm` agrees.
    ///
    /// The first remaining exercise becomes active; an emptied log is
    /// reseeded. Unknown names are reported without asking and without
    /// saving.
    pub fn delete_exercise(
        &mut self,
        name: &str,
        confirm: &mut impl Confirm,
    ) -> Result<DeleteOutcome> {
        if !self.log.exercises.contains_key(name) {
            tracing::debug!("Exercise '{}' not found", name);
            return Ok(DeleteOutcome::NotFound);
        }

        let prompt = format!("Delete exercise \"{}\" and all its data?", name);
        if !confirm.confirm(&prompt) {
            tracing::debug!("Deletion of '{}' declined", name);
            return Ok(DeleteOutcome::Declined);
        }

        let mut log = self.log.clone();
        let removed = log.exercises.shift_remove(name).map_or(0, |entries| entries.len());
        if log.ensure_seeded(&self.defaults.exercise) {
            tracing::debug!("Seeded default exercise '{}'", self.defaults.exercise);
        }
        self.commit(log)?;
        self.reseed();

        tracing::info!("Deleted exercise '{}' ({} sets)", name, removed);
        Ok(DeleteOutcome::Deleted)
    }

    // ------------------------------------------------------------------
    // Sets
    // ------------------------------------------------------------------

    /// Log a set on the active exercise.
    ///
    /// `weight` is in the current display unit. `date` defaults to today
    /// (UTC).
    pub fn add_set(&mut self, weight: f64, reps: u32, date: Option<NaiveDate>) -> Result<SetEntry> {
        if !weight.is_finite() || reps == 0 {
            return Err(Error::Validation("Enter valid weight and reps.".into()));
        }

        let entry = SetEntry {
            id: self.ids.next_id(),
            date: date.unwrap_or_else(|| Utc::now().date_naive()),
            weight_kg: to_kg(weight, self.log.unit),
            reps,
        };

        let mut log = self.log.clone();
        log.exercises
            .entry(self.active.clone())
            .or_default()
            .push(entry.clone());
        self.commit(log)?;

        tracing::info!(
            "Logged {} {} x {} for '{}' on {}",
            weight,
            self.log.unit,
            reps,
            self.active,
            entry.date
        );
        Ok(entry)
    }

    /// Log a set from raw text input (as typed by the user).
    ///
    /// Weight must parse as a finite number; reps as a whole number > 0.
    /// A blank date means today.
    pub fn add_set_raw(&mut self, weight: &str, reps: &str, date: Option<&str>) -> Result<SetEntry> {
        let invalid = || Error::Validation("Enter valid weight and reps.".into());

        let weight: f64 = weight.trim().parse().map_err(|_| invalid())?;
        let reps: f64 = reps.trim().parse().map_err(|_| invalid())?;
        if !weight.is_finite()
            || !reps.is_finite()
            || reps <= 0.0
            || reps.fract() != 0.0
            || reps > f64::from(u32::MAX)
        {
            return Err(invalid());
        }

        let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(text) => Some(parse_date(text)?),
            None => None,
        };

        self.add_set(weight, reps as u32, date)
    }

    /// Remove a set of the active exercise by id.
    ///
    /// Unknown ids are ignored and nothing is saved. Returns whether a set
    /// was removed.
    pub fn delete_set(&mut self, id: &str) -> Result<bool> {
        let Some(idx) = self.entries().iter().position(|entry| entry.id == id) else {
            tracing::debug!("Set {} not found in '{}'", id, self.active);
            return Ok(false);
        };

        let mut log = self.log.clone();
        if let Some(entries) = log.exercises.get_mut(&self.active) {
            entries.remove(idx);
        }
        self.commit(log)?;
        tracing::info!("Deleted set {} from '{}'", id, self.active);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Unit
    // ------------------------------------------------------------------

    /// Switch the display unit.
    ///
    /// Stored weights are kilograms, so no set is rewritten. Returns false
    /// if the unit was already active.
    pub fn set_unit(&mut self, unit: Unit) -> Result<bool> {
        if unit == self.log.unit {
            return Ok(false);
        }

        let previous = self.log.unit;
        let mut log = self.log.clone();
        log.unit = unit;
        self.commit(log)?;
        tracing::info!("Display unit changed from {} to {}", previous, unit);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Backup
    // ------------------------------------------------------------------

    /// Replace the whole log with a backup payload.
    ///
    /// The payload must be a JSON object with an `exercises` field; its
    /// `unit` is adopted. On rejection nothing changes.
    pub fn import_data(&mut self, payload: &str) -> Result<()> {
        let mut log = schema::decode(payload, self.log.unit)?;
        if log.ensure_seeded(&self.defaults.exercise) {
            tracing::debug!("Seeded default exercise '{}'", self.defaults.exercise);
        }

        self.commit(log)?;
        self.reseed();
        tracing::info!(
            "Imported {} exercises ({} sets)",
            self.log.exercises.len(),
            self.log.entry_count()
        );
        Ok(())
    }

    /// Indented JSON snapshot of the whole log
    pub fn export_data(&self) -> Result<String> {
        schema::encode_pretty(&self.log)
    }

    /// CSV of every set in the display unit
    pub fn export_csv(&self) -> Result<String> {
        let mut buf = Vec::new();
        write_csv(&self.log, &mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::Other(format!("CSV is not UTF-8: {}", e)))
    }

    // ------------------------------------------------------------------
    // Derived values for the active exercise
    // ------------------------------------------------------------------

    pub fn summary(&self, metric: ComparisonMetric) -> Option<Summary> {
        metrics::summarize(self.entries(), metric, self.log.unit)
    }

    pub fn series(&self, metric: ComparisonMetric) -> Vec<SeriesPoint> {
        metrics::progress_series(self.entries(), metric, self.log.unit)
    }

    pub fn history(&self) -> Vec<HistoryRow> {
        metrics::history_rows(self.entries(), self.log.unit)
    }
}

/// Parse an ISO 8601 calendar date (`YYYY-MM-DD`)
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("invalid date '{}', expected YYYY-MM-DD", text)))
}
