// Infrastructure layer modules
pub mod config;
pub mod logging;
pub mod tracker_client;

// Re-exports
pub use config::{TrackerConfig, TrackerConfigError};
pub use logging::{init_local_logging, init_logging};
pub use tracker_client::{
    AwsLocationTrackerClient, BatchUpdateOutcome, FailedUpdate, TrackerClient, TrackerClientError,
};
