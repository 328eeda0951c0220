//! Tenancy primitives: who owns an object and which rows a caller may see.

use crate::id::{CompanyId, RecordId};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// How an object relates to the tenant boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tenancy {
    /// The object belongs to a company (dashboard records, company users).
    OwnedBy(CompanyId),
    /// The object *is* a company.
    Tenant(CompanyId),
    /// The object carries no tenant reference at all.
    Unscoped,
}

/// Declared tenancy capability, checked by object-level authorization.
pub trait TenantScoped {
    fn tenancy(&self) -> Tenancy;
}

/// The subset of tenant-owned rows a caller may read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// Every tenant.
    All,
    /// Exactly one tenant.
    Company(CompanyId),
    /// Nothing at all.
    Nothing,
}

impl TenantScope {
    pub fn includes(&self, company_id: CompanyId) -> bool {
        match self {
            TenantScope::All => true,
            TenantScope::Company(c) => *c == company_id,
            TenantScope::Nothing => false,
        }
    }
}

/// A tenant-owned dashboard record.
///
/// Every record belongs to exactly one company and may carry a natural key
/// that must be unique within that company.
pub trait TenantRecord: Entity<Id = RecordId> + TenantScoped + Clone + Send + Sync + 'static {
    /// Stable storage discriminator (e.g. `"dashboard.revenue"`).
    const KIND: &'static str;

    fn company_id(&self) -> CompanyId;

    /// Key unique per company, `None` when the record has no such rule.
    fn natural_key(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_membership() {
        let a = CompanyId::new();
        let b = CompanyId::new();
        assert!(TenantScope::All.includes(a));
        assert!(TenantScope::Company(a).includes(a));
        assert!(!TenantScope::Company(a).includes(b));
        assert!(!TenantScope::Nothing.includes(a));
    }
}
