//! Company: the tenant entity and root of all per-tenant data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::CompanyId;
use crate::tenancy::{Entity, Tenancy, TenantScoped};

pub const DEFAULT_PRIMARY_COLOR: &str = "#F97316";

const NAME_MAX: usize = 200;
const SLUG_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
    pub primary_color: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a company.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// An empty string clears the logo.
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub is_active: Option<bool>,
}

impl From<NewCompany> for CompanyPatch {
    fn from(value: NewCompany) -> Self {
        Self {
            name: Some(value.name),
            slug: Some(value.slug),
            logo: Some(value.logo.unwrap_or_default()),
            primary_color: Some(
                value
                    .primary_color
                    .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
            ),
            is_active: Some(value.is_active.unwrap_or(true)),
        }
    }
}

impl Company {
    pub fn register(input: NewCompany, now: DateTime<Utc>) -> DomainResult<Self> {
        let company = Self {
            id: CompanyId::new(),
            name: validate_name(&input.name)?,
            slug: validate_slug(&input.slug)?,
            logo: input.logo.filter(|l| !l.trim().is_empty()),
            primary_color: validate_color(
                input.primary_color.as_deref().unwrap_or(DEFAULT_PRIMARY_COLOR),
            )?,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        Ok(company)
    }

    pub fn apply(&mut self, patch: CompanyPatch, now: DateTime<Utc>) -> DomainResult<()> {
        // Validate everything before touching `self`.
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let slug = patch.slug.as_deref().map(validate_slug).transpose()?;
        let color = patch.primary_color.as_deref().map(validate_color).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(slug) = slug {
            self.slug = slug;
        }
        if let Some(color) = color {
            self.primary_color = color;
        }
        if let Some(logo) = patch.logo {
            self.logo = Some(logo).filter(|l| !l.trim().is_empty());
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for Company {
    fn tenancy(&self) -> Tenancy {
        Tenancy::Tenant(self.id)
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::field("name", "must not be empty"));
    }
    if name.chars().count() > NAME_MAX {
        return Err(DomainError::field("name", format!("at most {NAME_MAX} characters")));
    }
    Ok(name.to_string())
}

/// Slugs are lowercase ascii letters, digits, `-` and `_`.
pub fn validate_slug(slug: &str) -> DomainResult<String> {
    let slug = slug.trim();
    if slug.is_empty() || slug.len() > SLUG_MAX {
        return Err(DomainError::field(
            "slug",
            format!("must be 1 to {SLUG_MAX} characters"),
        ));
    }
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !valid {
        return Err(DomainError::field(
            "slug",
            "only lowercase letters, digits, '-' and '_' are allowed",
        ));
    }
    Ok(slug.to_string())
}

fn validate_color(color: &str) -> DomainResult<String> {
    let color = color.trim();
    let hex = color.strip_prefix('#').unwrap_or_default();
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DomainError::field("primary_color", "expected #RRGGBB"));
    }
    Ok(color.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(slug: &str) -> NewCompany {
        NewCompany {
            name: "Acme".to_string(),
            slug: slug.to_string(),
            logo: None,
            primary_color: None,
            is_active: None,
        }
    }

    #[test]
    fn register_applies_defaults() {
        let c = Company::register(input("acme"), Utc::now()).unwrap();
        assert_eq!(c.primary_color, DEFAULT_PRIMARY_COLOR);
        assert!(c.is_active);
        assert_eq!(c.tenancy(), Tenancy::Tenant(c.id));
    }

    #[test]
    fn register_rejects_bad_slug() {
        let err = Company::register(input("Acme Corp"), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Field { ref field, .. } if field == "slug"));
    }

    #[test]
    fn failed_patch_leaves_company_untouched() {
        let mut c = Company::register(input("acme"), Utc::now()).unwrap();
        let before = c.clone();
        let patch = CompanyPatch {
            name: Some("Renamed".to_string()),
            primary_color: Some("orange".to_string()),
            ..Default::default()
        };
        assert!(c.apply(patch, Utc::now()).is_err());
        assert_eq!(c, before);
    }
}
