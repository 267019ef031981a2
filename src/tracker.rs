//! Application root tying the store, translator and view together
//!
//! Each user action runs to completion: validate, mutate and save the store,
//! then bring the list and map up to date.

use tracing::{info, warn};

use crate::config::MapSettings;
use crate::error::{Result, TrailogError};
use crate::form::{RecordFactory, WorkoutForm};
use crate::models::{Coords, WorkoutRecord};
use crate::storage::Persistence;
use crate::store::{SortDirection, SortKey, WorkoutStore};
use crate::view::{GeolocationProvider, ListRenderer, MapRenderer, ViewSync};

pub struct Tracker<P: Persistence, M: MapRenderer, L: ListRenderer> {
    store: WorkoutStore<P>,
    view: ViewSync<M, L>,
    factory: RecordFactory,
}

impl<P: Persistence, M: MapRenderer, L: ListRenderer> Tracker<P, M, L> {
    /// Restore stored workouts and list them. The map stays disabled until
    /// [`start`](Self::start) or [`load_map`](Self::load_map) succeeds.
    pub fn new(storage: P, list: L, settings: MapSettings) -> Self {
        let store = WorkoutStore::open(storage);
        let factory = RecordFactory::seeded(store.records());
        let mut view = ViewSync::new(list, settings);
        view.on_loaded(store.records());

        Self {
            store,
            view,
            factory,
        }
    }

    pub fn store(&self) -> &WorkoutStore<P> {
        &self.store
    }

    pub fn view(&self) -> &ViewSync<M, L> {
        &self.view
    }

    pub fn workouts(&self) -> &[WorkoutRecord] {
        self.store.records()
    }

    /// Ask for the user's position once and show the map there.
    ///
    /// On failure the tracker keeps working without a map and the error is
    /// returned for the caller to surface.
    pub fn start<G: GeolocationProvider>(&mut self, geolocation: &mut G, map: M) -> Result<Coords> {
        match geolocation.current_position() {
            Ok(position) => {
                self.load_map(map, position);
                Ok(position)
            }
            Err(e) => {
                warn!(error = %e, "Running without a map");
                Err(e)
            }
        }
    }

    /// Show the map centered on `position` with a marker per workout
    pub fn load_map(&mut self, map: M, position: Coords) {
        self.view.attach_map(map, position, self.store.records_mut());
        info!(lat = position.lat(), lng = position.lng(), "Map loaded");
    }

    /// Log a new workout at `coords`
    pub fn log_workout(&mut self, form: &WorkoutForm, coords: Coords) -> Result<WorkoutRecord> {
        let mut record = self.factory.translate(form, coords)?;
        self.view.on_added(&mut record);
        self.store.add(record.clone());
        Ok(record)
    }

    /// Replace a workout with one built from `form` at the same position.
    ///
    /// The old list item and marker go first, then the new workout is
    /// rendered and appended. Returns the new workout.
    pub fn edit_workout(&mut self, id: &str, form: &WorkoutForm) -> Result<WorkoutRecord> {
        let factory = &mut self.factory;
        let view = &mut self.view;

        let (_, created) = self.store.replace(id, |old| {
            let mut record = factory.translate(form, old.coords())?;
            view.on_removed(old);
            view.on_added(&mut record);
            Ok(record)
        })?;

        Ok(created.clone())
    }

    pub fn delete_workout(&mut self, id: &str) -> Result<WorkoutRecord> {
        let removed = self.store.remove_by_id(id)?;
        self.view.on_removed(&removed);
        Ok(removed)
    }

    /// Pan the map to a workout
    pub fn move_to(&mut self, id: &str) -> Result<()> {
        let record = self
            .store
            .find_by_id(id)
            .ok_or_else(|| TrailogError::NotFound { id: id.to_string() })?;
        self.view.pan_to(record);
        Ok(())
    }

    /// Fit the map around every workout
    pub fn overview(&mut self) {
        self.view.overview(self.store.records());
    }

    pub fn sort_by_distance(&mut self) -> Option<SortDirection> {
        let direction = self.store.sort_by_distance()?;
        self.view.on_sorted(self.store.records());
        Some(direction)
    }

    pub fn sort_by_date(&mut self) -> Option<SortDirection> {
        let direction = self.store.sort_by_date()?;
        self.view.on_sorted(self.store.records());
        Some(direction)
    }

    /// Sort in an explicit direction without touching the toggles
    pub fn sort(&mut self, key: SortKey, direction: SortDirection) {
        self.store.sort(key, direction);
        self.view.on_sorted(self.store.records());
    }

    /// Remove every workout; nothing is saved when there is nothing to remove
    pub fn reset(&mut self) -> Vec<WorkoutRecord> {
        if self.store.is_empty() {
            return Vec::new();
        }
        let removed = self.store.reset_all();
        self.view.on_reset(&removed);
        removed
    }
}
