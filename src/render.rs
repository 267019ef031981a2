//! Terminal renderers for the workout list and map

use colored::*;
use std::io::Write;
use tracing::warn;

use crate::models::{Coords, MarkerId, WorkoutKind, WorkoutRecord, WorkoutType};
use crate::view::{BoundingBox, ListRenderer, MapRenderer, Popup};

/// Plain-text workout card
///
/// ```text
/// 🏃‍♂️ Running on April 14  [3079400000]
///    5.2 km   24 min   4.6 min/km   178 spm
/// ```
pub fn format_list_item(record: &WorkoutRecord) -> String {
    let metrics = match record.kind() {
        WorkoutKind::Running { cadence, pace } => {
            format!("{:.1} min/km   {} spm", pace, cadence)
        }
        WorkoutKind::Cycling { elevation, speed } => {
            format!("{:.1} km/h   {} m", speed, elevation)
        }
    };

    format!(
        "{} {}  [{}]\n   {} km   {} min   {}",
        record.workout_type().icon(),
        record.description(),
        record.id(),
        record.distance(),
        record.duration(),
        metrics
    )
}

/// Writes workout cards to a terminal or any other writer
pub struct TerminalList<W: Write> {
    out: W,
    /// Ids of the cards written since the last clear
    shown: Vec<String>,
}

impl<W: Write> TerminalList<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: Vec::new(),
        }
    }

    pub fn shown(&self) -> &[String] {
        &self.shown
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: String) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            warn!(error = %e, "Failed to write workout list");
        }
    }
}

impl<W: Write> ListRenderer for TerminalList<W> {
    fn render_list_item(&mut self, record: &WorkoutRecord) {
        let card = format_list_item(record);
        let card = match record.workout_type() {
            WorkoutType::Running => card.green(),
            WorkoutType::Cycling => card.yellow(),
        };
        self.emit(card.to_string());
        self.shown.push(record.id().to_string());
    }

    fn remove_list_item(&mut self, id: &str) {
        self.shown.retain(|shown| shown != id);
        self.emit(format!("✗ removed {}", id).dimmed().to_string());
    }

    fn clear_list_items(&mut self) {
        self.shown.clear();
    }
}

/// Map stand-in that reports marker and camera changes as text
pub struct ConsoleMap<W: Write> {
    out: W,
    next_marker: MarkerId,
}

impl<W: Write> ConsoleMap<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            next_marker: 1,
        }
    }

    fn emit(&mut self, line: String) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            warn!(error = %e, "Failed to write map output");
        }
    }
}

impl<W: Write> MapRenderer for ConsoleMap<W> {
    fn render_marker(&mut self, coords: Coords, popup: &Popup) -> MarkerId {
        let marker = self.next_marker;
        self.next_marker += 1;
        self.emit(format!("📍 #{} ({}) {}", marker, coords, popup.content));
        marker
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.emit(format!("📍 #{} removed", marker).dimmed().to_string());
    }

    fn pan_to(&mut self, coords: Coords, zoom_level: u8) {
        self.emit(format!("🗺  centered on {} (zoom {})", coords, zoom_level));
    }

    fn fit_bounds(&mut self, bounds: BoundingBox, padding: (u32, u32)) {
        self.emit(format!(
            "🗺  overview {} → {} (padding {}x{})",
            bounds.north_west, bounds.south_east, padding.0, padding.1
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn running() -> WorkoutRecord {
        WorkoutRecord::running(
            "3079400000".to_string(),
            Utc.with_ymd_and_hms(2024, 4, 14, 9, 0, 0).unwrap(),
            Coords::new(51.5, -0.12),
            5.2,
            24.0,
            178.0,
        )
    }

    #[test]
    fn test_running_card() {
        let card = format_list_item(&running());
        assert!(card.contains("Running on April 14"));
        assert!(card.contains("5.2 km"));
        assert!(card.contains("24 min"));
        assert!(card.contains("4.6 min/km"));
        assert!(card.contains("178 spm"));
    }

    #[test]
    fn test_cycling_card() {
        let record = WorkoutRecord::cycling(
            "3079400001".to_string(),
            Utc.with_ymd_and_hms(2024, 4, 14, 9, 0, 0).unwrap(),
            Coords::new(51.5, -0.12),
            27.0,
            95.0,
            523.0,
        );
        let card = format_list_item(&record);
        assert!(card.contains("17.1 km/h"));
        assert!(card.contains("523 m"));
    }

    #[test]
    fn test_terminal_list_tracks_shown_items() {
        colored::control::set_override(false);
        let mut list = TerminalList::new(Vec::new());

        list.render_list_item(&running());
        assert_eq!(list.shown(), &["3079400000".to_string()]);

        list.remove_list_item("3079400000");
        assert!(list.shown().is_empty());

        let output = String::from_utf8(list.into_inner()).unwrap();
        assert!(output.contains("Running on April 14"));
    }

    #[test]
    fn test_terminal_list_writes_cards_in_list_order() {
        let ride = WorkoutRecord::cycling(
            "3079400001".to_string(),
            Utc.with_ymd_and_hms(2024, 4, 15, 9, 0, 0).unwrap(),
            Coords::new(51.5, -0.12),
            27.0,
            95.0,
            523.0,
        );
        let mut list = TerminalList::new(Vec::new());

        list.render_list_item(&ride);
        list.render_list_item(&running());

        let output = String::from_utf8(list.into_inner()).unwrap();
        let ride_at = output.find("[3079400001]").unwrap();
        let run_at = output.find("[3079400000]").unwrap();
        assert!(ride_at < run_at);
        assert!(output.contains("17.1 km/h"));
        assert!(output.contains("4.6 min/km"));
    }

    #[test]
    fn test_console_map_assigns_increasing_ids() {
        let mut map = ConsoleMap::new(Vec::new());
        let popup = Popup::for_record(&running());

        let first = map.render_marker(Coords::new(1.0, 1.0), &popup);
        let second = map.render_marker(Coords::new(2.0, 2.0), &popup);
        assert_eq!((first, second), (1, 2));
    }
}
