//! Salesperson (`vendedor`): someone whose monthly sales are tracked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use v4vision_core::{CompanyId, DomainResult, RecordId, TenantRecord, normalize_email};

use crate::record::{DashboardRecord, optional_text, required_text, tenant_owned};

const NAME_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salesperson {
    pub id: RecordId,
    #[serde(rename = "company")]
    pub company_id: CompanyId,
    #[serde(rename = "nome")]
    pub name: String,
    /// Empty when unknown; unique per company otherwise.
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SalespersonInput {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalespersonPatch {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

impl From<SalespersonInput> for SalespersonPatch {
    fn from(value: SalespersonInput) -> Self {
        Self {
            name: Some(value.name),
            email: Some(value.email),
            is_active: Some(value.is_active),
        }
    }
}

fn clean_email(raw: &str) -> DomainResult<String> {
    let trimmed = optional_text("email", raw, Some(254))?;
    if trimmed.is_empty() {
        Ok(trimmed)
    } else {
        normalize_email("email", &trimmed)
    }
}

impl DashboardRecord for Salesperson {
    type Input = SalespersonInput;
    type Patch = SalespersonPatch;

    fn create(company_id: CompanyId, input: Self::Input, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: RecordId::new(),
            company_id,
            name: required_text("nome", &input.name, Some(NAME_MAX))?,
            email: clean_email(&input.email)?,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> DomainResult<()> {
        let name = patch
            .name
            .as_deref()
            .map(|n| required_text("nome", n, Some(NAME_MAX)))
            .transpose()?;
        let email = patch.email.as_deref().map(clean_email).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
        Ok(())
    }
}

tenant_owned!(Salesperson);

impl TenantRecord for Salesperson {
    const KIND: &'static str = "dashboard.salesperson";

    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    fn natural_key(&self) -> Option<String> {
        (!self.email.is_empty()).then(|| format!("email:{}", self.email))
    }
}
