// Library interface for Trailog
// The CLI and integration tests both build on these modules

pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod models;
pub mod render;
pub mod storage;
pub mod store;
pub mod tracker;
pub mod view;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::{AppConfig, MapSettings};
pub use error::{ErrorSeverity, PersistenceError, Result, TrailogError};
pub use form::{RecordFactory, WorkoutForm};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use storage::{JsonFileStorage, MemoryStorage, Persistence};
pub use store::{SortDirection, SortKey, WorkoutStore};
pub use tracker::Tracker;
pub use view::{BoundingBox, FixedPosition, GeolocationProvider, ListRenderer, MapRenderer, Popup, ViewSync};
