use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TrailogError;

/// Month names indexed by zero-based month number
const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Identifier the map renderer assigns to a placed marker
pub type MarkerId = u64;

/// Geographic position as `[latitude, longitude]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords(pub f64, pub f64);

impl Coords {
    pub fn new(lat: f64, lng: f64) -> Self {
        Coords(lat, lng)
    }

    pub fn lat(&self) -> f64 {
        self.0
    }

    pub fn lng(&self) -> f64 {
        self.1
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.0, self.1)
    }
}

/// Workout types supported by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Running,
    Cycling,
}

impl WorkoutType {
    /// Lowercase discriminant as stored and typed into the form
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Running => "running",
            WorkoutType::Cycling => "cycling",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WorkoutType::Running => "🏃‍♂️",
            WorkoutType::Cycling => "🚴‍♀️",
        }
    }

    /// Type name with the first letter capitalized
    pub fn title(&self) -> &'static str {
        match self {
            WorkoutType::Running => "Running",
            WorkoutType::Cycling => "Cycling",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = TrailogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(WorkoutType::Running),
            "cycling" => Ok(WorkoutType::Cycling),
            other => Err(TrailogError::UnsupportedType(other.to_string())),
        }
    }
}

/// Variant-specific payload, tagged by `type` when serialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkoutKind {
    Running {
        /// Steps per minute
        cadence: f64,
        /// Minutes per kilometer
        pace: f64,
    },
    Cycling {
        /// Elevation gain in meters, may be zero or negative
        elevation: f64,
        /// Kilometers per hour
        speed: f64,
    },
}

impl WorkoutKind {
    pub fn workout_type(&self) -> WorkoutType {
        match self {
            WorkoutKind::Running { .. } => WorkoutType::Running,
            WorkoutKind::Cycling { .. } => WorkoutType::Cycling,
        }
    }
}

/// One logged running or cycling session
///
/// Derived fields (`pace`/`speed` and `description`) are computed once by the
/// constructors. Deserialized records keep whatever was stored; nothing is
/// recomputed on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    /// Unique identifier derived from the creation timestamp
    id: String,

    /// Creation timestamp
    date: DateTime<Utc>,

    /// Where the workout was logged on the map
    coords: Coords,

    /// Distance in kilometers
    distance: f64,

    /// Duration in minutes
    duration: f64,

    #[serde(flatten)]
    kind: WorkoutKind,

    /// Human-readable title, e.g. "Running on April 14"
    description: String,

    /// Marker placed for this workout by the map renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marker_id: Option<MarkerId>,
}

impl WorkoutRecord {
    /// Build a running record, computing pace and description.
    ///
    /// The description reads month and day in `date`'s own timezone; the
    /// stored date is normalized to UTC.
    pub fn running<Tz: TimeZone>(
        id: String,
        date: DateTime<Tz>,
        coords: Coords,
        distance: f64,
        duration: f64,
        cadence: f64,
    ) -> Self {
        let kind = WorkoutKind::Running {
            cadence,
            pace: calc_pace(distance, duration),
        };
        Self::build(id, date, coords, distance, duration, kind)
    }

    /// Build a cycling record, computing speed and description
    pub fn cycling<Tz: TimeZone>(
        id: String,
        date: DateTime<Tz>,
        coords: Coords,
        distance: f64,
        duration: f64,
        elevation: f64,
    ) -> Self {
        let kind = WorkoutKind::Cycling {
            elevation,
            speed: calc_speed(distance, duration),
        };
        Self::build(id, date, coords, distance, duration, kind)
    }

    fn build<Tz: TimeZone>(
        id: String,
        date: DateTime<Tz>,
        coords: Coords,
        distance: f64,
        duration: f64,
        kind: WorkoutKind,
    ) -> Self {
        let description = build_description(kind.workout_type(), &date);
        Self {
            id,
            date: date.with_timezone(&Utc),
            coords,
            distance,
            duration,
            kind,
            description,
            marker_id: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn coords(&self) -> Coords {
        self.coords
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn kind(&self) -> &WorkoutKind {
        &self.kind
    }

    pub fn workout_type(&self) -> WorkoutType {
        self.kind.workout_type()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn marker_id(&self) -> Option<MarkerId> {
        self.marker_id
    }

    /// Pace in min/km for running records
    pub fn pace(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Running { pace, .. } => Some(pace),
            WorkoutKind::Cycling { .. } => None,
        }
    }

    /// Speed in km/h for cycling records
    pub fn speed(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Cycling { speed, .. } => Some(speed),
            WorkoutKind::Running { .. } => None,
        }
    }

    pub fn cadence(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Running { cadence, .. } => Some(cadence),
            WorkoutKind::Cycling { .. } => None,
        }
    }

    pub fn elevation(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Cycling { elevation, .. } => Some(elevation),
            WorkoutKind::Running { .. } => None,
        }
    }

    /// Text shown in the marker popup
    pub fn popup_content(&self) -> String {
        format!("{} {}", self.workout_type().icon(), self.description)
    }

    /// Record the marker the map renderer placed for this workout.
    ///
    /// Markers only live for one map session, so a marker id restored from
    /// storage is overwritten when the map renders the workout again.
    pub(crate) fn attach_marker(&mut self, marker_id: MarkerId) {
        self.marker_id = Some(marker_id);
    }
}

/// Minutes per kilometer
pub fn calc_pace(distance: f64, duration: f64) -> f64 {
    duration / distance
}

/// Kilometers per hour
pub fn calc_speed(distance: f64, duration: f64) -> f64 {
    distance / (duration / 60.0)
}

/// `"{Type} on {Month} {Day}"` using the fixed English month table, with the
/// calendar day taken in `date`'s timezone
pub fn build_description<Tz: TimeZone>(workout_type: WorkoutType, date: &DateTime<Tz>) -> String {
    format!(
        "{} on {} {}",
        workout_type.title(),
        MONTHS[date.month0() as usize],
        date.day()
    )
}
