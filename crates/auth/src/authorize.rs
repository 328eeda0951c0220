//! Authorization predicates.
//!
//! Each predicate is a pure function of the caller (if any), the kind of
//! access requested and, for object-level checks, the target's declared
//! tenancy. Callers run the collection-level check before touching storage
//! and the object-level check once the target has been loaded.
//!
//! - No IO
//! - No panics

use thiserror::Error;

use v4vision_core::{Tenancy, TenantScoped};

use crate::{Identity, Role};

/// Whether an action only reads or also mutates state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    /// Safe actions: list, retrieve, read-only reports.
    Read,
    /// Create, update, delete and mutating custom actions.
    Write,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("tenant mismatch")]
    TenantMismatch,
}

/// A request-level authorization rule, with an optional object-level part.
pub trait AccessPolicy: Send + Sync {
    fn has_permission(&self, caller: Option<&Identity>, access: Access) -> Result<(), AuthzError>;

    fn has_object_permission(
        &self,
        caller: Option<&Identity>,
        access: Access,
        object: &dyn TenantScoped,
    ) -> Result<(), AuthzError> {
        let _ = (access, object);
        authenticated(caller).map(|_| ())
    }
}

/// Allow only authenticated callers.
pub fn authenticated(caller: Option<&Identity>) -> Result<&Identity, AuthzError> {
    caller.ok_or(AuthzError::Unauthenticated)
}

/// Authenticated identity with the platform-admin role.
#[derive(Debug, Copy, Clone, Default)]
pub struct PlatformAdminOnly;

impl AccessPolicy for PlatformAdminOnly {
    fn has_permission(&self, caller: Option<&Identity>, _access: Access) -> Result<(), AuthzError> {
        let identity = authenticated(caller)?;
        match identity.role {
            Role::PlatformAdmin => Ok(()),
            Role::CompanyAdmin | Role::Viewer => Err(AuthzError::Forbidden("platform admin only")),
        }
    }
}

/// Authenticated identity with platform-admin or company-admin role.
#[derive(Debug, Copy, Clone, Default)]
pub struct CompanyAdminOrAbove;

impl AccessPolicy for CompanyAdminOrAbove {
    fn has_permission(&self, caller: Option<&Identity>, _access: Access) -> Result<(), AuthzError> {
        let identity = authenticated(caller)?;
        match identity.role {
            Role::PlatformAdmin | Role::CompanyAdmin => Ok(()),
            Role::Viewer => Err(AuthzError::Forbidden("company admin role required")),
        }
    }
}

/// Reads for any authenticated identity; writes need [`CompanyAdminOrAbove`].
#[derive(Debug, Copy, Clone, Default)]
pub struct ReadOpenWriteRestricted;

impl AccessPolicy for ReadOpenWriteRestricted {
    fn has_permission(&self, caller: Option<&Identity>, access: Access) -> Result<(), AuthzError> {
        match access {
            Access::Read => authenticated(caller).map(|_| ()),
            Access::Write => CompanyAdminOrAbove.has_permission(caller, access),
        }
    }
}

/// Object-level tenant membership.
///
/// Platform admins always pass. Otherwise a tenant-owned object must belong
/// to the caller's company, a company object must be the caller's company,
/// and anything else is denied.
#[derive(Debug, Copy, Clone, Default)]
pub struct SameTenant;

impl AccessPolicy for SameTenant {
    fn has_permission(&self, caller: Option<&Identity>, _access: Access) -> Result<(), AuthzError> {
        authenticated(caller).map(|_| ())
    }

    fn has_object_permission(
        &self,
        caller: Option<&Identity>,
        _access: Access,
        object: &dyn TenantScoped,
    ) -> Result<(), AuthzError> {
        same_tenant(authenticated(caller)?, object.tenancy())
    }
}

/// Tenant membership check on an already authenticated identity.
pub fn same_tenant(identity: &Identity, tenancy: Tenancy) -> Result<(), AuthzError> {
    match identity.role {
        Role::PlatformAdmin => Ok(()),
        Role::CompanyAdmin | Role::Viewer => match tenancy {
            Tenancy::OwnedBy(company) | Tenancy::Tenant(company) => {
                if identity.company_id == Some(company) {
                    Ok(())
                } else {
                    Err(AuthzError::TenantMismatch)
                }
            }
            Tenancy::Unscoped => Err(AuthzError::Forbidden("object has no tenant")),
        },
    }
}

/// Mutate capability combined with tenant membership.
///
/// Reads need same-tenant membership; writes additionally need
/// [`CompanyAdminOrAbove`]. Platform admins bypass the tenant part.
#[derive(Debug, Copy, Clone, Default)]
pub struct MutateWithTenant;

impl AccessPolicy for MutateWithTenant {
    fn has_permission(&self, caller: Option<&Identity>, access: Access) -> Result<(), AuthzError> {
        ReadOpenWriteRestricted.has_permission(caller, access)
    }

    fn has_object_permission(
        &self,
        caller: Option<&Identity>,
        access: Access,
        object: &dyn TenantScoped,
    ) -> Result<(), AuthzError> {
        let identity = authenticated(caller)?;
        same_tenant(identity, object.tenancy())?;
        match access {
            Access::Read => Ok(()),
            Access::Write => CompanyAdminOrAbove.has_permission(caller, access),
        }
    }
}
