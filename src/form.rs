//! Translation of raw form input into workout records
//!
//! Validation happens entirely before construction: a rejected form never
//! produces a partial record and never touches the store.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, TrailogError};
use crate::models::{Coords, WorkoutRecord, WorkoutType};

/// Raw values as entered in the workout form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutForm {
    /// Type selector value, `running` or `cycling`
    pub workout_type: String,

    /// Distance in kilometers
    pub distance: f64,

    /// Duration in minutes
    pub duration: f64,

    /// Steps per minute, read only for running
    pub cadence: Option<f64>,

    /// Elevation gain in meters, read only for cycling
    pub elevation: Option<f64>,
}

impl WorkoutForm {
    pub fn running(distance: f64, duration: f64, cadence: f64) -> Self {
        Self {
            workout_type: WorkoutType::Running.to_string(),
            distance,
            duration,
            cadence: Some(cadence),
            elevation: None,
        }
    }

    pub fn cycling(distance: f64, duration: f64, elevation: f64) -> Self {
        Self {
            workout_type: WorkoutType::Cycling.to_string(),
            distance,
            duration,
            cadence: None,
            elevation: Some(elevation),
        }
    }

    /// Prefill the form from an existing workout for editing
    pub fn from_record(record: &WorkoutRecord) -> Self {
        Self {
            workout_type: record.workout_type().to_string(),
            distance: record.distance(),
            duration: record.duration(),
            cadence: record.cadence(),
            elevation: record.elevation(),
        }
    }
}

/// Validate a form and build the matching record.
///
/// `cadence` must be finite and positive for running. `elevation` only has to
/// be finite for cycling; zero and negative gains are accepted.
pub fn validate(form: &WorkoutForm) -> Result<WorkoutType> {
    let workout_type: WorkoutType = form.workout_type.parse()?;

    check_positive("distance", Some(form.distance))?;
    check_positive("duration", Some(form.duration))?;

    match workout_type {
        WorkoutType::Running => check_positive("cadence", form.cadence)?,
        WorkoutType::Cycling => {
            check_finite("elevation", form.elevation)?;
        }
    }

    Ok(workout_type)
}

fn check_finite(field: &str, value: Option<f64>) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(TrailogError::Validation(format!("{} must be a number", field))),
        None => Err(TrailogError::Validation(format!("{} is required", field))),
    }
}

fn check_positive(field: &str, value: Option<f64>) -> Result<()> {
    let v = check_finite(field, value)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(TrailogError::Validation(format!("{} must be positive", field)))
    }
}

/// Builds validated records with unique timestamp-derived ids
#[derive(Debug, Clone, Default)]
pub struct RecordFactory {
    last_millis: Option<i64>,
}

impl RecordFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after the newest existing record so fresh ids cannot collide
    pub fn seeded<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a WorkoutRecord>,
    {
        Self {
            last_millis: records
                .into_iter()
                .map(|record| record.date().timestamp_millis())
                .max(),
        }
    }

    /// Validate `form` and build a record at `coords`, dated now and
    /// described in the local calendar
    pub fn translate(&mut self, form: &WorkoutForm, coords: Coords) -> Result<WorkoutRecord> {
        self.translate_at(form, coords, Local::now())
    }

    /// Same as [`translate`](Self::translate) with an explicit creation time.
    /// The description's month and day are read in `now`'s timezone.
    pub fn translate_at<Tz: TimeZone>(
        &mut self,
        form: &WorkoutForm,
        coords: Coords,
        now: DateTime<Tz>,
    ) -> Result<WorkoutRecord> {
        let workout_type = validate(form).map_err(|e| {
            warn!(error = %e, workout_type = %form.workout_type, "Rejected workout form");
            e
        })?;

        let (id, date) = self.next_id(now);

        // validate() guarantees the variant field is present
        let record = match workout_type {
            WorkoutType::Running => WorkoutRecord::running(
                id,
                date,
                coords,
                form.distance,
                form.duration,
                form.cadence.unwrap_or_default(),
            ),
            WorkoutType::Cycling => WorkoutRecord::cycling(
                id,
                date,
                coords,
                form.distance,
                form.duration,
                form.elevation.unwrap_or_default(),
            ),
        };

        debug!(workout_id = record.id(), kind = %workout_type, "Built workout record");
        Ok(record)
    }

    /// Id is the last ten digits of the creation time in milliseconds.
    /// Two records created within the same millisecond are spaced 1ms apart.
    fn next_id<Tz: TimeZone>(&mut self, now: DateTime<Tz>) -> (String, DateTime<Tz>) {
        let mut millis = now.timestamp_millis();
        if let Some(last) = self.last_millis {
            if millis <= last {
                millis = last + 1;
            }
        }
        self.last_millis = Some(millis);

        let date = now
            .timezone()
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or(now);
        let digits = millis.to_string();
        let id = digits[digits.len().saturating_sub(10)..].to_string();
        (id, date)
    }
}
