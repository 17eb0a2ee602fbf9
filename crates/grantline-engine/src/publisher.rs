use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use grantline_core::AuthorizationsChangedEvent;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("event bus unavailable: {0}")]
    BusUnavailable(String),
}

/// Downstream notification seam. Runs strictly after storage commit; the
/// executor logs failures and never lets them surface, so implementations are
/// free to be lossy.
pub trait EventPublisher: Send + Sync {
    fn publish(
        &self,
        event: AuthorizationsChangedEvent,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

/// Emits each event as a structured tracing event (target `events`). Stands in
/// for an external bus in single-process deployments and gives operators a log
/// trail either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

impl EventPublisher for LogPublisher {
    async fn publish(&self, event: AuthorizationsChangedEvent) -> Result<(), PublishError> {
        tracing::info!(
            target: "events",
            event = AuthorizationsChangedEvent::NAME,
            project_id = event.project_id.value(),
            "project authorizations changed"
        );
        Ok(())
    }
}

/// Captures published events for assertions; can be told to fail to exercise
/// the executor's swallow-and-log path.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<AuthorizationsChangedEvent>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<AuthorizationsChangedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: AuthorizationsChangedEvent) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::BusUnavailable("injected failure".to_string()));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
