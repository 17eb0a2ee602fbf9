pub mod apply;
pub mod config;
pub mod publisher;

pub use apply::{ApplyError, ApplySummary, apply_changes};
pub use config::{ConfigError, EngineConfig, ThrottlePolicy};
pub use publisher::{EventPublisher, LogPublisher, PublishError, RecordingPublisher};
