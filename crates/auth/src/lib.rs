//! `v4vision-auth`: authentication and authorization boundary.
//!
//! Decoupled from HTTP and storage: roles, identities, the permission
//! predicates, tenant scoping, JWT issuance/validation and password hashing.

pub mod authorize;
pub mod claims;
pub mod identity;
pub mod jwt;
pub mod password;
pub mod roles;
pub mod scope;
pub mod user;

pub use authorize::{
    Access, AccessPolicy, AuthzError, CompanyAdminOrAbove, MutateWithTenant, PlatformAdminOnly,
    ReadOpenWriteRestricted, SameTenant, authenticated, same_tenant,
};
pub use claims::{JwtClaims, TokenKind, TokenValidationError, validate_claims};
pub use identity::Identity;
pub use jwt::{TokenCodec, TokenError, TokenPair};
pub use password::{MIN_PASSWORD_LEN, PasswordError, PasswordHasher, validate_new_password};
pub use roles::Role;
pub use scope::{CreationTarget, ScopeError, UserScope, creation_target, user_scope, visible_scope};
pub use user::{NewUser, ProfilePatch, User, UserPatch};
