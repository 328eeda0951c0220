//! `v4vision-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error model, money, and the tenancy vocabulary shared by
//! authorization, storage and the dashboard records.

pub mod company;
pub mod email;
pub mod error;
pub mod id;
pub mod money;
pub mod tenancy;
pub mod value_object;

pub use company::{Company, CompanyPatch, NewCompany};
pub use email::normalize_email;
pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, RecordId, UserId};
pub use money::Money;
pub use tenancy::{Entity, Tenancy, TenantRecord, TenantScope, TenantScoped};
pub use value_object::ValueObject;
