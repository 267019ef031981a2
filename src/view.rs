//! Keeps the rendered list and map markers in step with the store
//!
//! The map, list and geolocation are external collaborators reached only
//! through the traits below. Without a map every marker, pan and fit call is
//! skipped while list rendering carries on.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MapSettings;
use crate::error::{Result, TrailogError};
use crate::models::{Coords, MarkerId, WorkoutRecord};

/// Popup bound to a workout marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Popup {
    pub content: String,
    /// Styling hook, `running-popup` or `cycling-popup`
    pub class_name: String,
    pub max_width: u32,
    pub max_height: u32,
    /// Popups stay open when another opens or the map is clicked
    pub auto_close: bool,
}

impl Popup {
    pub fn for_record(record: &WorkoutRecord) -> Self {
        Self {
            content: record.popup_content(),
            class_name: format!("{}-popup", record.workout_type()),
            max_width: 250,
            max_height: 100,
            auto_close: false,
        }
    }
}

/// Rectangle given by its `[maxLat, minLng]` and `[minLat, maxLng]` corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north_west: Coords,
    pub south_east: Coords,
}

impl BoundingBox {
    /// Smallest box containing every point, `None` when there are none
    pub fn around<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coords>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mut min_lat, mut max_lat) = (first.lat(), first.lat());
        let (mut min_lng, mut max_lng) = (first.lng(), first.lng());

        for p in points {
            min_lat = min_lat.min(p.lat());
            max_lat = max_lat.max(p.lat());
            min_lng = min_lng.min(p.lng());
            max_lng = max_lng.max(p.lng());
        }

        Some(Self {
            north_west: Coords::new(max_lat, min_lng),
            south_east: Coords::new(min_lat, max_lng),
        })
    }
}

/// Interactive map the workouts are pinned on
pub trait MapRenderer {
    /// Place a marker with an open popup and return its id
    fn render_marker(&mut self, coords: Coords, popup: &Popup) -> MarkerId;

    fn remove_marker(&mut self, marker: MarkerId);

    /// Center the map on `coords`
    fn pan_to(&mut self, coords: Coords, zoom_level: u8);

    fn fit_bounds(&mut self, bounds: BoundingBox, padding: (u32, u32));
}

/// Workout list shown next to the form
pub trait ListRenderer {
    fn render_list_item(&mut self, record: &WorkoutRecord);

    fn remove_list_item(&mut self, id: &str);

    fn clear_list_items(&mut self);
}

/// One-shot source of the user's position
pub trait GeolocationProvider {
    fn current_position(&mut self) -> Result<Coords>;
}

/// Position known up front, e.g. a configured home location
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPosition(pub Option<Coords>);

impl GeolocationProvider for FixedPosition {
    fn current_position(&mut self) -> Result<Coords> {
        self.0.ok_or_else(|| {
            TrailogError::GeolocationUnavailable("no position configured".to_string())
        })
    }
}

/// Translates store changes into list and map updates
pub struct ViewSync<M: MapRenderer, L: ListRenderer> {
    map: Option<M>,
    list: L,
    /// Markers currently on the map, in placement order
    markers: Vec<MarkerId>,
    settings: MapSettings,
}

impl<M: MapRenderer, L: ListRenderer> ViewSync<M, L> {
    pub fn new(list: L, settings: MapSettings) -> Self {
        Self {
            map: None,
            list,
            markers: Vec::new(),
            settings,
        }
    }

    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }

    pub fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    pub fn list(&self) -> &L {
        &self.list
    }

    pub fn live_markers(&self) -> &[MarkerId] {
        &self.markers
    }

    /// Install the map centered on `position` and pin every existing workout
    pub fn attach_map(&mut self, mut map: M, position: Coords, records: &mut [WorkoutRecord]) {
        map.pan_to(position, self.settings.zoom_level);
        self.map = Some(map);
        for record in records.iter_mut() {
            self.place_marker(record);
        }
        debug!(markers = self.markers.len(), "Map attached");
    }

    /// Render list items for workouts restored from storage
    pub fn on_loaded(&mut self, records: &[WorkoutRecord]) {
        for record in records {
            self.list.render_list_item(record);
        }
    }

    /// Render a new workout and store its marker id on it
    pub fn on_added(&mut self, record: &mut WorkoutRecord) {
        self.list.render_list_item(record);
        self.place_marker(record);
    }

    /// Drop the list item and marker of a removed workout
    pub fn on_removed(&mut self, record: &WorkoutRecord) {
        self.list.remove_list_item(record.id());
        if let Some(marker) = record.marker_id() {
            self.release_marker(marker);
        }
    }

    /// Clear the whole list and every marker on the map
    pub fn on_reset(&mut self, removed: &[WorkoutRecord]) {
        self.list.clear_list_items();
        let markers = std::mem::take(&mut self.markers);
        if let Some(map) = self.map.as_mut() {
            for marker in markers {
                map.remove_marker(marker);
            }
        }
        debug!(count = removed.len(), "View reset");
    }

    /// Re-render the list in the new order; markers stay where they are
    pub fn on_sorted(&mut self, records: &[WorkoutRecord]) {
        self.list.clear_list_items();
        for record in records {
            self.list.render_list_item(record);
        }
    }

    /// Center the map on a workout at the configured zoom level
    pub fn pan_to(&mut self, record: &WorkoutRecord) {
        if let Some(map) = self.map.as_mut() {
            map.pan_to(record.coords(), self.settings.zoom_level);
        }
    }

    /// Fit the map to all workouts; nothing happens for an empty list
    pub fn overview(&mut self, records: &[WorkoutRecord]) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        if let Some(bounds) = BoundingBox::around(records.iter().map(|r| r.coords())) {
            let [x, y] = self.settings.overview_padding;
            map.fit_bounds(bounds, (x, y));
        }
    }

    fn place_marker(&mut self, record: &mut WorkoutRecord) {
        if let Some(map) = self.map.as_mut() {
            let marker = map.render_marker(record.coords(), &Popup::for_record(record));
            record.attach_marker(marker);
            self.markers.push(marker);
        }
    }

    fn release_marker(&mut self, marker: MarkerId) {
        let Some(index) = self.markers.iter().position(|m| *m == marker) else {
            warn!(marker, "Marker not on the map");
            return;
        };
        self.markers.remove(index);
        if let Some(map) = self.map.as_mut() {
            map.remove_marker(marker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[derive(Default)]
    struct FakeMap {
        next: MarkerId,
        placed: Vec<MarkerId>,
        removed: Vec<MarkerId>,
        fitted: Vec<(BoundingBox, (u32, u32))>,
        panned: Vec<(Coords, u8)>,
    }

    impl MapRenderer for FakeMap {
        fn render_marker(&mut self, _coords: Coords, _popup: &Popup) -> MarkerId {
            self.next += 1;
            self.placed.push(self.next);
            self.next
        }

        fn remove_marker(&mut self, marker: MarkerId) {
            self.removed.push(marker);
        }

        fn pan_to(&mut self, coords: Coords, zoom_level: u8) {
            self.panned.push((coords, zoom_level));
        }

        fn fit_bounds(&mut self, bounds: BoundingBox, padding: (u32, u32)) {
            self.fitted.push((bounds, padding));
        }
    }

    #[derive(Default)]
    struct FakeList {
        items: Vec<String>,
    }

    impl ListRenderer for FakeList {
        fn render_list_item(&mut self, record: &WorkoutRecord) {
            self.items.push(record.id().to_string());
        }

        fn remove_list_item(&mut self, id: &str) {
            self.items.retain(|item| item != id);
        }

        fn clear_list_items(&mut self) {
            self.items.clear();
        }
    }

    fn record(id: &str, lat: f64, lng: f64) -> WorkoutRecord {
        WorkoutRecord::running(id.to_string(), Utc::now(), Coords::new(lat, lng), 5.0, 25.0, 170.0)
    }

    #[test]
    fn test_bounding_box() {
        let bounds = BoundingBox::around(vec![
            Coords::new(51.5, -0.12),
            Coords::new(48.85, 2.35),
            Coords::new(52.52, 13.4),
        ])
        .unwrap();

        assert_eq!(bounds.north_west, Coords::new(52.52, -0.12));
        assert_eq!(bounds.south_east, Coords::new(48.85, 13.4));
        assert!(BoundingBox::around(Vec::new()).is_none());
    }

    #[test]
    fn test_added_record_gets_marker() {
        let mut view = ViewSync::new(FakeList::default(), MapSettings::default());
        view.attach_map(FakeMap::default(), Coords::new(51.5, -0.12), &mut []);

        let mut workout = record("a", 51.5, -0.12);
        view.on_added(&mut workout);

        assert_eq!(workout.marker_id(), Some(1));
        assert_eq!(view.live_markers(), &[1]);
        assert_eq!(view.list().items, vec!["a"]);
    }

    #[test]
    fn test_without_map_only_list_is_rendered() {
        let mut view: ViewSync<FakeMap, FakeList> =
            ViewSync::new(FakeList::default(), MapSettings::default());

        let mut workout = record("a", 51.5, -0.12);
        view.on_added(&mut workout);
        view.overview(std::slice::from_ref(&workout));
        view.pan_to(&workout);

        assert_eq!(workout.marker_id(), None);
        assert_eq!(view.list().items, vec!["a"]);
        assert!(!view.has_map());
    }

    #[test]
    fn test_removed_record_releases_its_marker() {
        let mut view = ViewSync::new(FakeList::default(), MapSettings::default());
        view.attach_map(FakeMap::default(), Coords::new(0.0, 0.0), &mut []);

        let mut a = record("a", 1.0, 1.0);
        let mut b = record("b", 2.0, 2.0);
        view.on_added(&mut a);
        view.on_added(&mut b);
        view.on_removed(&a);

        assert_eq!(view.map().unwrap().removed, vec![1]);
        assert_eq!(view.live_markers(), &[2]);
        assert_eq!(view.list().items, vec!["b"]);
    }

    #[test]
    fn test_sort_rerenders_list_only() {
        let mut view = ViewSync::new(FakeList::default(), MapSettings::default());
        view.attach_map(FakeMap::default(), Coords::new(0.0, 0.0), &mut []);

        let mut a = record("a", 1.0, 1.0);
        let mut b = record("b", 2.0, 2.0);
        view.on_added(&mut a);
        view.on_added(&mut b);
        view.on_sorted(&[b.clone(), a.clone()]);

        assert_eq!(view.list().items, vec!["b", "a"]);
        assert_eq!(view.map().unwrap().placed, vec![1, 2]);
        assert!(view.map().unwrap().removed.is_empty());
    }

    #[test]
    fn test_overview_uses_configured_padding() {
        let mut view = ViewSync::new(FakeList::default(), MapSettings::default());
        view.attach_map(FakeMap::default(), Coords::new(0.0, 0.0), &mut []);

        view.overview(&[record("a", 1.0, 3.0), record("b", 2.0, -4.0)]);

        let (bounds, padding) = view.map().unwrap().fitted[0];
        assert_eq!(bounds.north_west, Coords::new(2.0, -4.0));
        assert_eq!(bounds.south_east, Coords::new(1.0, 3.0));
        assert_eq!(padding, (100, 100));
    }

    #[test]
    fn test_fixed_position_without_home() {
        let mut geo = FixedPosition(None);
        assert!(matches!(
            geo.current_position(),
            Err(TrailogError::GeolocationUnavailable(_))
        ));
    }
}
