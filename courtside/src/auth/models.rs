//! Authentication data models.

use serde::{Deserialize, Serialize};

use crate::pool::models::{EventContext, UserId};

/// JWT claims issued by the platform's identity service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Verified caller of a matchmaking operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Principal {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Only the event host or a platform admin may run matchmaking
    pub fn can_manage(&self, event: &EventContext) -> bool {
        self.is_admin || event.host_id == self.user_id
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            is_admin: claims.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::models::EventStatus;

    #[test]
    fn test_host_and_admin_can_manage() {
        let event = EventContext {
            id: 1,
            host_id: 10,
            max_courts: 2,
            status: EventStatus::Open,
        };
        assert!(Principal::user(10).can_manage(&event));
        assert!(Principal::admin(99).can_manage(&event));
        assert!(!Principal::user(11).can_manage(&event));
    }
}
