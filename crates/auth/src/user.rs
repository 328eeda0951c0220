//! User: an identity that can sign in, with a role and an optional company.
//!
//! # Invariants
//! - Email is unique platform-wide (compared lowercased) and is the login handle.
//! - Only platform admins may exist without a company.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use v4vision_core::{
    CompanyId, DomainError, DomainResult, Entity, Tenancy, TenantScoped, UserId, normalize_email,
};

use crate::Role;
use crate::password::validate_new_password;

const NAME_MAX: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company_id: Option<CompanyId>,
    pub role: Role,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub password_hash: String,
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: Option<CompanyId>,
    #[serde(default)]
    pub role: Role,
}

impl NewUser {
    /// Checks that don't need storage: email shape, names, password rules and
    /// the role/company pairing.
    pub fn validate(&self) -> DomainResult<()> {
        normalize_email("email", &self.email)?;
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        validate_new_password("password", &self.password)?;
        if self.password != self.password_confirm {
            return Err(DomainError::field("password_confirm", "passwords do not match"));
        }
        ensure_company_for_role(self.role, self.company)
    }
}

/// Administrative update (PUT/PATCH on `/users/{id}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub company: Option<Option<CompanyId>>,
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "present")]
    pub avatar: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Self-service profile update. Role, company and activation are not
/// reachable from here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub avatar: Option<Option<String>>,
}

impl From<ProfilePatch> for UserPatch {
    fn from(value: ProfilePatch) -> Self {
        Self {
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            avatar: value.avatar,
            ..Default::default()
        }
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl User {
    pub fn create(input: NewUser, password_hash: String, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id: UserId::new(),
            email: normalize_email("email", &input.email)?,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            company_id: input.company,
            role: input.role,
            avatar: None,
            is_active: true,
            is_staff: input.role == Role::PlatformAdmin,
            date_joined: now,
            password_hash,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn can_edit(&self) -> bool {
        self.role.can_mutate()
    }

    /// Apply a patch atomically: either every field changes or none does.
    pub fn apply(&mut self, patch: UserPatch) -> DomainResult<()> {
        let email = patch
            .email
            .as_deref()
            .map(|e| normalize_email("email", e))
            .transpose()?;
        if let Some(first) = &patch.first_name {
            validate_name("first_name", first)?;
        }
        if let Some(last) = &patch.last_name {
            validate_name("last_name", last)?;
        }
        let role = patch.role.unwrap_or(self.role);
        let company = patch.company.unwrap_or(self.company_id);
        ensure_company_for_role(role, company)?;

        if let Some(email) = email {
            self.email = email;
        }
        if let Some(first) = patch.first_name {
            self.first_name = first.trim().to_string();
        }
        if let Some(last) = patch.last_name {
            self.last_name = last.trim().to_string();
        }
        if let Some(avatar) = patch.avatar {
            self.avatar = avatar.filter(|a| !a.trim().is_empty());
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        self.role = role;
        self.is_staff = role == Role::PlatformAdmin;
        self.company_id = company;
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for User {
    fn tenancy(&self) -> Tenancy {
        match self.company_id {
            Some(company) => Tenancy::OwnedBy(company),
            None => Tenancy::Unscoped,
        }
    }
}

fn ensure_company_for_role(role: Role, company: Option<CompanyId>) -> DomainResult<()> {
    match (role, company) {
        (Role::PlatformAdmin, _) | (Role::CompanyAdmin | Role::Viewer, Some(_)) => Ok(()),
        (Role::CompanyAdmin | Role::Viewer, None) => Err(DomainError::field(
            "company",
            "required unless the role is platform_admin",
        )),
    }
}

fn validate_name(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().chars().count() > NAME_MAX {
        return Err(DomainError::field(field, format!("at most {NAME_MAX} characters")));
    }
    Ok(())
}
