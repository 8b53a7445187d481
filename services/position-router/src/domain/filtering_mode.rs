/// Filtering mode classification for incoming position samples
///
/// The upstream device reports how the sample was throttled. Only two
/// literals are recognized; everything else is treated as accuracy-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilteringMode {
    /// Sample emitted after the device moved a fixed distance
    Distance,

    /// Sample emitted on a fixed time interval
    Time,

    /// Sample filtered by the accuracy reported by the device.
    /// Also the fallback for any unrecognized value.
    Accuracy,
}

/// Default tracker receiving distance-filtered updates
pub const DISTANCE_FILTERING_TRACKER: &str = "DistanceFilteringTracker";

/// Default tracker receiving time-filtered updates
pub const TIME_FILTERING_TRACKER: &str = "TimeFilteringTracker";

/// Default tracker receiving accuracy-filtered updates
pub const ACCURACY_FILTERING_TRACKER: &str = "AccuracyFilteringTracker";

impl FilteringMode {
    /// Classify a raw `filtering` value
    ///
    /// Matching is exact and case-sensitive: `"distance"` is not `Distance`.
    pub fn classify(raw: &str) -> Self {
        match raw {
            "Distance" => FilteringMode::Distance,
            "Time" => FilteringMode::Time,
            _ => FilteringMode::Accuracy,
        }
    }

    /// Whether `raw` is one of the literals this mode is normally reported as
    pub fn is_recognized(raw: &str) -> bool {
        matches!(raw, "Distance" | "Time" | "Accuracy")
    }

    /// Tracker name used when no override is configured
    pub fn default_tracker_name(&self) -> &'static str {
        match self {
            FilteringMode::Distance => DISTANCE_FILTERING_TRACKER,
            FilteringMode::Time => TIME_FILTERING_TRACKER,
            FilteringMode::Accuracy => ACCURACY_FILTERING_TRACKER,
        }
    }

    /// Whether the caller-supplied accuracy is forwarded in this mode
    pub fn forwards_accuracy(&self) -> bool {
        matches!(self, FilteringMode::Accuracy)
    }
}

/// Mapping from filtering mode to destination tracker name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerNames {
    distance: String,
    time: String,
    accuracy: String,
}

impl TrackerNames {
    pub fn new(
        distance: impl Into<String>,
        time: impl Into<String>,
        accuracy: impl Into<String>,
    ) -> Self {
        Self {
            distance: distance.into(),
            time: time.into(),
            accuracy: accuracy.into(),
        }
    }

    /// Tracker name for the given mode
    pub fn for_mode(&self, mode: FilteringMode) -> &str {
        match mode {
            FilteringMode::Distance => &self.distance,
            FilteringMode::Time => &self.time,
            FilteringMode::Accuracy => &self.accuracy,
        }
    }
}

impl Default for TrackerNames {
    fn default() -> Self {
        Self::new(
            DISTANCE_FILTERING_TRACKER,
            TIME_FILTERING_TRACKER,
            ACCURACY_FILTERING_TRACKER,
        )
    }
}
