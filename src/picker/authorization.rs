// SPDX-License-Identifier: GPL-3.0-only

//! Photo library authorization
//!
//! The host's permission layer reports a tri-state status. The picker only
//! reads library contents or captures while it is `Authorized`.

use crate::errors::AuthorizationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    Authorized,
    Denied,
    #[default]
    Undetermined,
}

impl AuthorizationStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthorizationStatus::Authorized)
    }

    /// `Ok(())` when authorized, otherwise the matching error
    pub fn require(&self) -> Result<(), AuthorizationError> {
        match self {
            AuthorizationStatus::Authorized => Ok(()),
            AuthorizationStatus::Denied => Err(AuthorizationError::Denied),
            AuthorizationStatus::Undetermined => Err(AuthorizationError::Undetermined),
        }
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorizationStatus::Authorized => write!(f, "authorized"),
            AuthorizationStatus::Denied => write!(f, "denied"),
            AuthorizationStatus::Undetermined => write!(f, "undetermined"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_maps_to_errors() {
        assert_eq!(AuthorizationStatus::Authorized.require(), Ok(()));
        assert_eq!(
            AuthorizationStatus::Denied.require(),
            Err(AuthorizationError::Denied)
        );
        assert_eq!(
            AuthorizationStatus::default().require(),
            Err(AuthorizationError::Undetermined)
        );
    }
}
