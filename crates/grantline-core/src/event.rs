use serde::{Deserialize, Serialize};

use crate::ids::ProjectId;

/// Fired once per project whose authorization set changed during an apply.
/// Consumers re-derive the new state themselves; the event carries only the
/// project identifier. Delivery is at-least-once, so consumers must be
/// idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationsChangedEvent {
    pub project_id: ProjectId,
}

impl AuthorizationsChangedEvent {
    pub const NAME: &'static str = "project_authorizations.changed";

    pub fn new(project_id: ProjectId) -> Self {
        Self { project_id }
    }
}
