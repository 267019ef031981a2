//! Ordered in-memory workout collection mirrored to persistence
//!
//! Every mutation ends with a save. A failed save is logged and the in-memory
//! state is kept. Sorting only reorders memory; sort order is never saved.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{Result, TrailogError};
use crate::models::WorkoutRecord;
use crate::storage::Persistence;

/// Direction for sorting the workout list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(format!("Invalid sort direction: {}", s)),
        }
    }
}

/// Field the workout list can be sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Distance,
    Date,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "distance" | "km" => Ok(SortKey::Distance),
            "date" => Ok(SortKey::Date),
            _ => Err(format!("Invalid sort key: {}", s)),
        }
    }
}

/// Owns the workouts for the session, in list order
pub struct WorkoutStore<P: Persistence> {
    records: Vec<WorkoutRecord>,
    storage: P,
    /// Direction the next distance sort will use
    distance_order: SortDirection,
    /// Direction the next date sort will use
    date_order: SortDirection,
}

impl<P: Persistence> WorkoutStore<P> {
    /// Empty store; nothing is read from `storage`
    pub fn new(storage: P) -> Self {
        Self {
            records: Vec::new(),
            storage,
            distance_order: SortDirection::Ascending,
            date_order: SortDirection::Ascending,
        }
    }

    /// Store initialized from whatever `storage` holds.
    ///
    /// Unreadable data is treated as nothing stored.
    pub fn open(storage: P) -> Self {
        let records = match storage.load() {
            Ok(Some(records)) => records,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Could not read stored workouts, starting empty");
                Vec::new()
            }
        };
        info!(count = records.len(), "Loaded workouts");

        Self {
            records,
            ..Self::new(storage)
        }
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn storage(&self) -> &P {
        &self.storage
    }

    /// Append a workout to the end of the list and save
    pub fn add(&mut self, record: WorkoutRecord) {
        if self.find_by_id(record.id()).is_some() {
            error!(workout_id = record.id(), "Duplicate workout id added to store");
        }
        info!(workout_id = record.id(), kind = %record.workout_type(), "Workout added");
        self.records.push(record);
        self.persist();
    }

    /// Remove a workout and save, handing it back so its marker can be released
    pub fn remove_by_id(&mut self, id: &str) -> Result<WorkoutRecord> {
        let index = self.position(id)?;
        let removed = self.records.remove(index);
        info!(workout_id = id, "Workout removed");
        self.persist();
        Ok(removed)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&WorkoutRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub(crate) fn records_mut(&mut self) -> &mut [WorkoutRecord] {
        &mut self.records
    }

    /// Sort by distance, alternating direction on every call starting with
    /// ascending. Returns the direction applied, or `None` for an empty store
    /// (which leaves the toggle untouched).
    pub fn sort_by_distance(&mut self) -> Option<SortDirection> {
        if self.records.is_empty() {
            return None;
        }
        let direction = self.distance_order;
        self.sort(SortKey::Distance, direction);
        self.distance_order = direction.toggled();
        Some(direction)
    }

    /// Sort by creation date, alternating direction like
    /// [`sort_by_distance`](Self::sort_by_distance)
    pub fn sort_by_date(&mut self) -> Option<SortDirection> {
        if self.records.is_empty() {
            return None;
        }
        let direction = self.date_order;
        self.sort(SortKey::Date, direction);
        self.date_order = direction.toggled();
        Some(direction)
    }

    /// Stable in-place sort; ties keep their previous relative order
    pub fn sort(&mut self, key: SortKey, direction: SortDirection) {
        let compare = |a: &WorkoutRecord, b: &WorkoutRecord| -> Ordering {
            match key {
                SortKey::Distance => a.distance().total_cmp(&b.distance()),
                SortKey::Date => a.date().cmp(&b.date()),
            }
        };

        match direction {
            SortDirection::Ascending => self.records.sort_by(compare),
            SortDirection::Descending => self.records.sort_by(|a, b| compare(b, a)),
        }
    }

    /// Empty the store and save, returning the removed workouts in list order
    pub fn reset_all(&mut self) -> Vec<WorkoutRecord> {
        let removed = std::mem::take(&mut self.records);
        info!(count = removed.len(), "All workouts removed");
        self.persist();
        removed
    }

    /// Swap a workout for one built from it by `factory`.
    ///
    /// The replacement is built before anything changes, so a rejected
    /// replacement leaves the store as it was. Otherwise the old workout is
    /// removed, the new one appended, and the store saved once. Returns the
    /// removed workout and the appended one.
    pub fn replace<F>(&mut self, old_id: &str, factory: F) -> Result<(WorkoutRecord, &WorkoutRecord)>
    where
        F: FnOnce(&WorkoutRecord) -> Result<WorkoutRecord>,
    {
        let index = self.position(old_id)?;
        let replacement = factory(&self.records[index])?;

        let removed = self.records.remove(index);
        info!(
            old_id = removed.id(),
            new_id = replacement.id(),
            "Workout replaced"
        );
        self.records.push(replacement);
        self.persist();

        let appended = self.records.len() - 1;
        Ok((removed, &self.records[appended]))
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| {
                error!(workout_id = id, "Workout id not in store");
                TrailogError::NotFound { id: id.to_string() }
            })
    }

    fn persist(&mut self) {
        if let Err(e) = self.storage.save(&self.records) {
            warn!(error = %e, "Failed to save workouts, keeping in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coords;
    use crate::storage::MemoryStorage;
    use chrono::{Duration, TimeZone, Utc};

    fn workout(id: &str, minutes_after: i64, distance: f64) -> WorkoutRecord {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap() + Duration::minutes(minutes_after);
        WorkoutRecord::running(
            id.to_string(),
            date,
            Coords::new(48.85, 2.35),
            distance,
            30.0,
            170.0,
        )
    }

    fn ids<P: Persistence>(store: &WorkoutStore<P>) -> Vec<&str> {
        store.records().iter().map(|r| r.id()).collect()
    }

    fn stored_ids(store: &WorkoutStore<MemoryStorage>) -> Vec<String> {
        store
            .storage()
            .load()
            .unwrap()
            .unwrap_or_default()
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    #[test]
    fn test_add_and_find() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        store.add(workout("a", 0, 5.0));

        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_id("a").unwrap().distance(), 5.0);
        assert_eq!(stored_ids(&store), vec!["a"]);
    }

    #[test]
    fn test_remove_by_id() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        store.add(workout("a", 0, 5.0));
        store.add(workout("b", 1, 7.0));

        let removed = store.remove_by_id("a").unwrap();
        assert_eq!(removed.id(), "a");
        assert_eq!(store.len(), 1);
        assert!(store.find_by_id("a").is_none());
        assert_eq!(stored_ids(&store), vec!["b"]);
    }

    #[test]
    fn test_remove_missing_id() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        store.add(workout("a", 0, 5.0));

        let result = store.remove_by_id("missing");
        assert!(matches!(result, Err(TrailogError::NotFound { .. })));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sort_by_distance_toggles() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        store.add(workout("a", 0, 5.0));
        store.add(workout("b", 1, 12.0));
        store.add(workout("c", 2, 3.0));

        assert_eq!(store.sort_by_distance(), Some(SortDirection::Ascending));
        assert_eq!(ids(&store), vec!["c", "a", "b"]);

        assert_eq!(store.sort_by_distance(), Some(SortDirection::Descending));
        assert_eq!(ids(&store), vec!["b", "a", "c"]);

        assert_eq!(store.sort_by_distance(), Some(SortDirection::Ascending));
    }

    #[test]
    fn test_sort_toggles_are_independent() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        store.add(workout("a", 5, 5.0));
        store.add(workout("b", 0, 12.0));

        store.sort_by_distance();
        assert_eq!(store.sort_by_date(), Some(SortDirection::Ascending));
        assert_eq!(ids(&store), vec!["b", "a"]);
        assert_eq!(store.sort_by_date(), Some(SortDirection::Descending));
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        store.add(workout("a", 0, 5.0));
        store.add(workout("b", 1, 5.0));
        store.add(workout("c", 2, 1.0));

        store.sort(SortKey::Distance, SortDirection::Ascending);
        assert_eq!(ids(&store), vec!["c", "a", "b"]);

        store.sort(SortKey::Distance, SortDirection::Descending);
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_empty_store_keeps_toggle() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        assert_eq!(store.sort_by_distance(), None);

        store.add(workout("a", 0, 5.0));
        assert_eq!(store.sort_by_distance(), Some(SortDirection::Ascending));
    }

    #[test]
    fn test_sort_is_not_persisted() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        store.add(workout("a", 0, 9.0));
        store.add(workout("b", 1, 2.0));

        store.sort_by_distance();
        assert_eq!(ids(&store), vec!["b", "a"]);
        assert_eq!(stored_ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_reset_all() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        store.add(workout("a", 0, 5.0));
        store.add(workout("b", 1, 7.0));

        let removed = store.reset_all();
        let removed_ids: Vec<&str> = removed.iter().map(|r| r.id()).collect();

        assert_eq!(removed_ids, vec!["a", "b"]);
        assert!(store.is_empty());
        assert!(stored_ids(&store).is_empty());
    }

    #[test]
    fn test_replace_appends_new_record() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        store.add(workout("a", 0, 5.0));
        store.add(workout("b", 1, 7.0));

        let (removed, appended) = store
            .replace("a", |old| {
                Ok(WorkoutRecord::cycling(
                    "c".to_string(),
                    old.date() + Duration::hours(1),
                    old.coords(),
                    20.0,
                    60.0,
                    150.0,
                ))
            })
            .unwrap();

        assert_eq!(removed.id(), "a");
        assert_eq!(appended.id(), "c");
        assert_eq!(ids(&store), vec!["b", "c"]);
        assert_eq!(store.find_by_id("c").unwrap().coords(), removed.coords());
        assert_eq!(stored_ids(&store), vec!["b", "c"]);
    }

    #[test]
    fn test_failed_replace_leaves_store_unchanged() {
        let mut store = WorkoutStore::new(MemoryStorage::new());
        store.add(workout("a", 0, 5.0));

        let result = store.replace("a", |_| Err(TrailogError::Validation("bad".to_string())));
        assert!(matches!(result, Err(TrailogError::Validation(_))));
        assert_eq!(ids(&store), vec!["a"]);

        let result = store.replace("zzz", |old| Ok(old.clone()));
        assert!(matches!(result, Err(TrailogError::NotFound { .. })));
    }

    #[test]
    fn test_save_failure_keeps_memory() {
        let mut store = WorkoutStore::new(MemoryStorage::failing());
        store.add(workout("a", 0, 5.0));
        store.add(workout("b", 1, 7.0));
        store.remove_by_id("a").unwrap();

        assert_eq!(ids(&store), vec!["b"]);
    }

    #[test]
    fn test_open_recovers_from_corrupted_data() {
        let store = WorkoutStore::open(MemoryStorage::with_data("[{\"broken\": true}]"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_loads_stored_records() {
        let mut first = WorkoutStore::new(MemoryStorage::new());
        first.add(workout("a", 0, 5.0));
        first.add(workout("b", 1, 7.0));

        let raw = first.storage().raw().unwrap().to_string();
        let reopened = WorkoutStore::open(MemoryStorage::with_data(raw));

        assert_eq!(reopened.records(), first.records());
    }
}
