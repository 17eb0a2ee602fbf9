use std::fmt;

use crate::ids::{ProjectId, UserId};

/// Ordered permission tiers. The numeric values are the wire/storage encoding
/// and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i16)]
pub enum AccessLevel {
    NoAccess = 0,
    Minimal = 5,
    Guest = 10,
    Planner = 15,
    Reporter = 20,
    Developer = 30,
    Maintainer = 40,
    Owner = 50,
    Admin = 60,
}

impl AccessLevel {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    /// Absence of a row encodes "no access"; a NoAccess row is never stored.
    pub fn is_storable(self) -> bool {
        self != AccessLevel::NoAccess
    }

    pub fn is_at_least(self, other: AccessLevel) -> bool {
        self >= other
    }
}

impl TryFrom<i16> for AccessLevel {
    type Error = ValidationError;

    fn try_from(value: i16) -> Result<Self, ValidationError> {
        match value {
            0 => Ok(AccessLevel::NoAccess),
            5 => Ok(AccessLevel::Minimal),
            10 => Ok(AccessLevel::Guest),
            15 => Ok(AccessLevel::Planner),
            20 => Ok(AccessLevel::Reporter),
            30 => Ok(AccessLevel::Developer),
            40 => Ok(AccessLevel::Maintainer),
            50 => Ok(AccessLevel::Owner),
            60 => Ok(AccessLevel::Admin),
            other => Err(ValidationError::UnknownAccessLevel(other)),
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessLevel::NoAccess => "no access",
            AccessLevel::Minimal => "minimal",
            AccessLevel::Guest => "guest",
            AccessLevel::Planner => "planner",
            AccessLevel::Reporter => "reporter",
            AccessLevel::Developer => "developer",
            AccessLevel::Maintainer => "maintainer",
            AccessLevel::Owner => "owner",
            AccessLevel::Admin => "admin",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown access level value: {0}")]
    UnknownAccessLevel(i16),

    #[error("access level '{level}' for user {user_id} in project {project_id} cannot be stored")]
    UnstorableAccessLevel {
        user_id: UserId,
        project_id: ProjectId,
        level: AccessLevel,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_order_from_no_access_to_admin() {
        assert!(AccessLevel::NoAccess < AccessLevel::Guest);
        assert!(AccessLevel::Guest < AccessLevel::Reporter);
        assert!(AccessLevel::Reporter < AccessLevel::Developer);
        assert!(AccessLevel::Developer < AccessLevel::Maintainer);
        assert!(AccessLevel::Maintainer < AccessLevel::Owner);
        assert!(AccessLevel::Owner < AccessLevel::Admin);
    }

    #[test]
    fn wire_values_match_storage_encoding() {
        assert_eq!(AccessLevel::NoAccess.as_i16(), 0);
        assert_eq!(AccessLevel::Guest.as_i16(), 10);
        assert_eq!(AccessLevel::Developer.as_i16(), 30);
        assert_eq!(AccessLevel::Admin.as_i16(), 60);
    }

    #[test]
    fn try_from_round_trips_every_level() {
        for level in [
            AccessLevel::NoAccess,
            AccessLevel::Minimal,
            AccessLevel::Guest,
            AccessLevel::Planner,
            AccessLevel::Reporter,
            AccessLevel::Developer,
            AccessLevel::Maintainer,
            AccessLevel::Owner,
            AccessLevel::Admin,
        ] {
            assert_eq!(AccessLevel::try_from(level.as_i16()), Ok(level));
        }
    }

    #[test]
    fn try_from_rejects_unknown_value() {
        let result = AccessLevel::try_from(11);

        assert_eq!(result, Err(ValidationError::UnknownAccessLevel(11)));
    }

    #[test]
    fn no_access_is_not_storable() {
        assert!(!AccessLevel::NoAccess.is_storable());
        assert!(AccessLevel::Minimal.is_storable());
        assert!(AccessLevel::Admin.is_storable());
    }

    #[test]
    fn is_at_least_compares_tiers() {
        assert!(AccessLevel::Maintainer.is_at_least(AccessLevel::Developer));
        assert!(AccessLevel::Developer.is_at_least(AccessLevel::Developer));
        assert!(!AccessLevel::Guest.is_at_least(AccessLevel::Reporter));
    }
}
