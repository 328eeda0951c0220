use serde::{Deserialize, Serialize};

use v4vision_core::{CompanyId, UserId};

use crate::Role;

/// The authenticated caller of a request.
///
/// Passed explicitly to every authorization predicate and scoping call; it is
/// rebuilt from the user store on each request, so role or company changes
/// take effect on the next call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub company_id: Option<CompanyId>,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, company_id: Option<CompanyId>, role: Role) -> Self {
        Self {
            user_id,
            company_id,
            role,
        }
    }

    pub fn is_platform_admin(&self) -> bool {
        self.role.can_manage_any_tenant()
    }

    pub fn can_mutate(&self) -> bool {
        self.role.can_mutate()
    }
}

impl From<&crate::User> for Identity {
    fn from(user: &crate::User) -> Self {
        Self::new(user.id, user.company_id, user.role)
    }
}
