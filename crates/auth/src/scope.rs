//! Tenant-scoping resolver.
//!
//! Narrows reads to the rows an identity may see and decides which company a
//! newly created row is stamped with.

use thiserror::Error;

use v4vision_core::{CompanyId, TenantScope, UserId};

use crate::{Identity, Role, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("user is not linked to a company")]
    NoCompany,
}

/// Rows visible to `identity` for list/retrieve.
///
/// Platform admins see everything, or only `requested` when given. Everyone
/// else sees their own company; an identity without a company sees nothing.
/// `requested` is ignored for non-platform-admins.
pub fn visible_scope(identity: &Identity, requested: Option<CompanyId>) -> TenantScope {
    match identity.role {
        Role::PlatformAdmin => requested.map_or(TenantScope::All, TenantScope::Company),
        Role::CompanyAdmin | Role::Viewer => identity
            .company_id
            .map_or(TenantScope::Nothing, TenantScope::Company),
    }
}

/// Which company a new row belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CreationTarget {
    /// The creator's own company.
    Own(CompanyId),
    /// A company named by a platform admin; the caller must confirm it exists.
    Requested(CompanyId),
}

impl CreationTarget {
    pub fn company_id(&self) -> CompanyId {
        match self {
            CreationTarget::Own(c) | CreationTarget::Requested(c) => *c,
        }
    }
}

/// Resolve the company stamp for a create.
///
/// Only platform admins may name a company; for everyone else `requested`
/// is never consulted.
pub fn creation_target(
    identity: &Identity,
    requested: Option<CompanyId>,
) -> Result<CreationTarget, ScopeError> {
    let own = || identity.company_id.map(CreationTarget::Own).ok_or(ScopeError::NoCompany);
    match identity.role {
        Role::PlatformAdmin => match requested {
            Some(company) => Ok(CreationTarget::Requested(company)),
            None => own(),
        },
        Role::CompanyAdmin | Role::Viewer => own(),
    }
}

/// Users visible to an identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UserScope {
    All,
    Company(CompanyId),
    OnlySelf(UserId),
}

impl UserScope {
    pub fn includes(&self, user: &User) -> bool {
        match self {
            UserScope::All => true,
            UserScope::Company(c) => user.company_id == Some(*c),
            UserScope::OnlySelf(id) => user.id == *id,
        }
    }
}

/// Platform admins see all users, company admins their company's users,
/// anyone else only themselves.
pub fn user_scope(identity: &Identity) -> UserScope {
    match (identity.role, identity.company_id) {
        (Role::PlatformAdmin, _) => UserScope::All,
        (Role::CompanyAdmin, Some(company)) => UserScope::Company(company),
        (Role::CompanyAdmin, None) | (Role::Viewer, _) => UserScope::OnlySelf(identity.user_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role, company: Option<CompanyId>) -> Identity {
        Identity::new(UserId::new(), company, role)
    }

    #[test]
    fn tenant_users_see_only_their_company() {
        let a = CompanyId::new();
        for role in [Role::CompanyAdmin, Role::Viewer] {
            let who = identity(role, Some(a));
            assert_eq!(visible_scope(&who, None), TenantScope::Company(a));
            // A requested company is ignored for non-platform-admins.
            assert_eq!(visible_scope(&who, Some(CompanyId::new())), TenantScope::Company(a));
        }
    }

    #[test]
    fn companyless_identity_sees_nothing() {
        let who = identity(Role::Viewer, None);
        assert_eq!(visible_scope(&who, None), TenantScope::Nothing);
    }

    #[test]
    fn platform_admin_sees_all_or_requested() {
        let who = identity(Role::PlatformAdmin, None);
        let b = CompanyId::new();
        assert_eq!(visible_scope(&who, None), TenantScope::All);
        assert_eq!(visible_scope(&who, Some(b)), TenantScope::Company(b));
    }

    #[test]
    fn creation_ignores_foreign_company_for_tenant_users() {
        let a = CompanyId::new();
        let who = identity(Role::CompanyAdmin, Some(a));
        assert_eq!(
            creation_target(&who, Some(CompanyId::new())),
            Ok(CreationTarget::Own(a))
        );
    }

    #[test]
    fn platform_admin_may_name_a_company() {
        let b = CompanyId::new();
        let who = identity(Role::PlatformAdmin, None);
        assert_eq!(creation_target(&who, Some(b)), Ok(CreationTarget::Requested(b)));
        assert_eq!(creation_target(&who, None), Err(ScopeError::NoCompany));
    }

    #[test]
    fn user_scope_by_role() {
        let a = CompanyId::new();
        assert_eq!(user_scope(&identity(Role::PlatformAdmin, None)), UserScope::All);
        assert_eq!(user_scope(&identity(Role::CompanyAdmin, Some(a))), UserScope::Company(a));
        let viewer = identity(Role::Viewer, Some(a));
        assert_eq!(user_scope(&viewer), UserScope::OnlySelf(viewer.user_id));
    }
}
