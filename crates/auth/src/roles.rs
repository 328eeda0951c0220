use core::str::FromStr;

use serde::{Deserialize, Serialize};

use v4vision_core::DomainError;

/// Role of a user on the platform.
///
/// The role alone decides the two derived capabilities used by every
/// authorization check: managing any tenant and mutating data.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PlatformAdmin,
    CompanyAdmin,
    #[default]
    Viewer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::PlatformAdmin, Role::CompanyAdmin, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PlatformAdmin => "platform_admin",
            Role::CompanyAdmin => "company_admin",
            Role::Viewer => "viewer",
        }
    }

    /// Bypasses tenant scoping entirely.
    pub fn can_manage_any_tenant(&self) -> bool {
        match self {
            Role::PlatformAdmin => true,
            Role::CompanyAdmin | Role::Viewer => false,
        }
    }

    /// May create, update and delete data.
    pub fn can_mutate(&self) -> bool {
        match self {
            Role::PlatformAdmin | Role::CompanyAdmin => true,
            Role::Viewer => false,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::field("role", format!("unknown role '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_follow_role() {
        assert!(Role::PlatformAdmin.can_manage_any_tenant());
        assert!(!Role::CompanyAdmin.can_manage_any_tenant());
        assert!(!Role::Viewer.can_manage_any_tenant());

        assert!(Role::PlatformAdmin.can_mutate());
        assert!(Role::CompanyAdmin.can_mutate());
        assert!(!Role::Viewer.can_mutate());
    }

    #[test]
    fn wire_names_roundtrip() {
        for role in Role::ALL {
            let json = serde_json::to_value(role).unwrap();
            assert_eq!(json, serde_json::json!(role.as_str()));
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }
}
