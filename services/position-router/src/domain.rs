// Domain layer modules
pub mod filtering_mode;
pub mod position_event;
pub mod position_update;

// Re-exports
pub use filtering_mode::{
    ACCURACY_FILTERING_TRACKER, DISTANCE_FILTERING_TRACKER, FilteringMode, TIME_FILTERING_TRACKER,
    TrackerNames,
};
pub use position_event::{Location, PositionEvent, PositionEventError};
pub use position_update::{
    PositionAccuracy, PositionProperties, PositionRouter, PositionUpdate, RouteError, RoutedUpdate,
};
