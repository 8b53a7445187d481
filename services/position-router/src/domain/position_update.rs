/// Device position update record and routing
///
/// The record mirrors the `DevicePositionUpdate` shape of the tracking API.
/// Routing picks the tracker and the effective accuracy from the filtering
/// mode; nothing else about the event is interpreted.
use serde::Serialize;
use thiserror::Error;

use super::filtering_mode::{FilteringMode, TrackerNames};
use super::position_event::PositionEvent;

/// Routing error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// Accuracy mode needs a numeric `accuracy` on the event
    #[error("accuracy must be a number when filtering is {filtering:?}")]
    MissingAccuracy { filtering: String },
}

/// Horizontal accuracy in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionAccuracy {
    pub horizontal: f64,
}

/// Extra properties attached to the update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionProperties {
    pub filtering: String,
}

/// One update record submitted to a tracker
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionUpdate {
    pub device_id: String,
    pub sample_time: String,
    pub accuracy: PositionAccuracy,
    /// `[longitude, latitude]`
    pub position: [f64; 2],
    pub position_properties: PositionProperties,
}

/// A routing decision: where the update goes and what it contains
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedUpdate {
    pub tracker_name: String,
    #[serde(skip)]
    pub mode: FilteringMode,
    pub update: PositionUpdate,
}

/// Selects a tracker and reshapes position events
#[derive(Debug, Clone, Default)]
pub struct PositionRouter {
    tracker_names: TrackerNames,
}

impl PositionRouter {
    pub fn new(tracker_names: TrackerNames) -> Self {
        Self { tracker_names }
    }

    /// Route an event
    ///
    /// - `Distance` and `Time` force the accuracy to 0.
    /// - Any other value forwards `event.accuracy` unchanged.
    pub fn route(&self, event: &PositionEvent) -> Result<RoutedUpdate, RouteError> {
        let mode = FilteringMode::classify(&event.filtering);

        let horizontal = if mode.forwards_accuracy() {
            event.accuracy.ok_or_else(|| RouteError::MissingAccuracy {
                filtering: event.filtering.clone(),
            })?
        } else {
            0.0
        };

        let update = PositionUpdate {
            device_id: event.device_id.clone(),
            sample_time: event.timestamp.clone(),
            accuracy: PositionAccuracy { horizontal },
            position: [event.location.longitude, event.location.latitude],
            position_properties: PositionProperties {
                filtering: event.filtering.clone(),
            },
        };

        Ok(RoutedUpdate {
            tracker_name: self.tracker_names.for_mode(mode).to_string(),
            mode,
            update,
        })
    }
}
