pub mod access;
pub mod authorization;
pub mod changes;
pub mod event;
pub mod ids;

pub use access::{AccessLevel, ValidationError};
pub use authorization::{AuthorizationAttrs, AuthorizationRow};
pub use changes::{ChangeSet, ProjectScopedRemoval, UserScopedRemoval};
pub use event::AuthorizationsChangedEvent;
pub use ids::{ProjectId, UserId};
