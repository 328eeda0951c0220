//! The contract shared by every tenant-owned dashboard record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use v4vision_core::{CompanyId, DomainError, DomainResult, TenantRecord};

/// A dashboard record with create/replace/patch semantics.
///
/// `Input` is the full payload accepted by create and replace; `Patch` is the
/// partial payload where every field is optional. A replace is the full input
/// converted into a patch and applied.
pub trait DashboardRecord: TenantRecord + Serialize + DeserializeOwned + core::fmt::Debug {
    type Input: DeserializeOwned + Send + 'static;
    type Patch: DeserializeOwned + Default + From<Self::Input> + Send + 'static;

    fn create(company_id: CompanyId, input: Self::Input, now: DateTime<Utc>) -> DomainResult<Self>;

    /// Validate the whole patch, then apply it. On error `self` is unchanged.
    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> DomainResult<()>;
}

/// Implements `Entity` and `TenantScoped` for a record with `id` and
/// `company_id` fields.
macro_rules! tenant_owned {
    ($ty:ty) => {
        impl v4vision_core::Entity for $ty {
            type Id = v4vision_core::RecordId;

            fn id(&self) -> &Self::Id {
                &self.id
            }
        }

        impl v4vision_core::TenantScoped for $ty {
            fn tenancy(&self) -> v4vision_core::Tenancy {
                v4vision_core::Tenancy::OwnedBy(self.company_id)
            }
        }
    };
}

pub(crate) use tenant_owned;

/// Trimmed, non-empty text of at most `max` characters.
pub(crate) fn required_text(field: &str, value: &str, max: Option<usize>) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::field(field, "this field may not be blank"));
    }
    optional_text(field, value, max)
}

/// Trimmed text (blank allowed) of at most `max` characters.
pub(crate) fn optional_text(field: &str, value: &str, max: Option<usize>) -> DomainResult<String> {
    let value = value.trim();
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(DomainError::field(field, format!("at most {max} characters")));
        }
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank() {
        assert!(required_text("nome", "   ", Some(10)).is_err());
        assert_eq!(required_text("nome", " Ana ", Some(10)).unwrap(), "Ana");
    }

    #[test]
    fn text_length_is_counted_in_chars() {
        assert!(optional_text("icone", "ção", Some(3)).is_ok());
        assert!(optional_text("icone", "ação", Some(3)).is_err());
        assert!(optional_text("descricao", &"x".repeat(10_000), None).is_ok());
    }
}
