//! Monthly revenue (`receita mensal`): revenue, ad spend and leads per month.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use v4vision_core::{CompanyId, DomainResult, Money, RecordId, TenantRecord};

use crate::period::Month;
use crate::record::{DashboardRecord, tenant_owned};

/// One row per company, year and month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub id: RecordId,
    #[serde(rename = "company")]
    pub company_id: CompanyId,
    #[serde(rename = "ano")]
    pub year: u32,
    #[serde(rename = "mes")]
    pub month: Month,
    #[serde(rename = "receita")]
    pub revenue: Money,
    #[serde(rename = "investimento")]
    pub investment: Money,
    pub leads: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyRevenue {
    /// Return on ad spend; zero when nothing was invested.
    pub fn roas(&self) -> f64 {
        self.revenue.return_on(self.investment)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyRevenueInput {
    #[serde(rename = "ano")]
    pub year: u32,
    #[serde(rename = "mes")]
    pub month: Month,
    #[serde(rename = "receita")]
    pub revenue: Decimal,
    #[serde(rename = "investimento", default)]
    pub investment: Decimal,
    #[serde(default)]
    pub leads: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthlyRevenuePatch {
    #[serde(rename = "ano")]
    pub year: Option<u32>,
    #[serde(rename = "mes")]
    pub month: Option<Month>,
    #[serde(rename = "receita")]
    pub revenue: Option<Decimal>,
    #[serde(rename = "investimento")]
    pub investment: Option<Decimal>,
    pub leads: Option<u32>,
}

impl From<MonthlyRevenueInput> for MonthlyRevenuePatch {
    fn from(value: MonthlyRevenueInput) -> Self {
        Self {
            year: Some(value.year),
            month: Some(value.month),
            revenue: Some(value.revenue),
            investment: Some(value.investment),
            leads: Some(value.leads),
        }
    }
}

impl DashboardRecord for MonthlyRevenue {
    type Input = MonthlyRevenueInput;
    type Patch = MonthlyRevenuePatch;

    fn create(company_id: CompanyId, input: Self::Input, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: RecordId::new(),
            company_id,
            year: input.year,
            month: input.month,
            revenue: Money::for_field("receita", input.revenue)?,
            investment: Money::for_field("investimento", input.investment)?,
            leads: input.leads,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> DomainResult<()> {
        let revenue = patch.revenue.map(|v| Money::for_field("receita", v)).transpose()?;
        let investment = patch.investment.map(|v| Money::for_field("investimento", v)).transpose()?;

        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(month) = patch.month {
            self.month = month;
        }
        if let Some(revenue) = revenue {
            self.revenue = revenue;
        }
        if let Some(investment) = investment {
            self.investment = investment;
        }
        if let Some(leads) = patch.leads {
            self.leads = leads;
        }
        self.updated_at = now;
        Ok(())
    }
}

tenant_owned!(MonthlyRevenue);

impl TenantRecord for MonthlyRevenue {
    const KIND: &'static str = "dashboard.monthly_revenue";

    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    fn natural_key(&self) -> Option<String> {
        Some(format!("{}-{:02}", self.year, self.month.number()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use v4vision_core::DomainError;

    fn revenue(json: serde_json::Value) -> MonthlyRevenue {
        let input: MonthlyRevenueInput = serde_json::from_value(json).unwrap();
        MonthlyRevenue::create(CompanyId::new(), input, Utc::now()).unwrap()
    }

    #[test]
    fn roas_is_revenue_over_investment() {
        let r = revenue(json!({"ano": 2025, "mes": 1, "receita": "100.00", "investimento": "50.00"}));
        assert_eq!(r.roas(), 2.0);
    }

    #[test]
    fn roas_is_zero_without_investment() {
        let r = revenue(json!({"ano": 2025, "mes": 1, "receita": "100.00"}));
        assert_eq!(r.investment, Money::zero());
        assert_eq!(r.leads, 0);
        assert_eq!(r.roas(), 0.0);
    }

    #[test]
    fn negative_amounts_name_their_field() {
        let input: MonthlyRevenueInput =
            serde_json::from_value(json!({"ano": 2025, "mes": 1, "receita": "1.00", "investimento": "-1.00"})).unwrap();
        let err = MonthlyRevenue::create(CompanyId::new(), input, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Field { ref field, .. } if field == "investimento"));
    }

    #[test]
    fn rejected_patch_leaves_the_row_untouched() {
        let mut r = revenue(json!({"ano": 2025, "mes": 3, "receita": "5"}));
        let patch: MonthlyRevenuePatch = serde_json::from_value(json!({"mes": 4, "receita": "1.001"})).unwrap();
        assert!(r.apply(patch, Utc::now()).is_err());
        assert_eq!(r.month.number(), 3);
        assert_eq!(r.revenue.to_string(), "5.00");
    }

    #[test]
    fn bad_months_are_rejected() {
        let bad_month = serde_json::from_value::<MonthlyRevenueInput>(
            json!({"ano": 2025, "mes": 13, "receita": "1.00"}),
        );
        assert!(bad_month.is_err());
    }

    #[test]
    fn natural_key_is_year_and_month() {
        let r = revenue(json!({"ano": 2025, "mes": 3, "receita": "1"}));
        assert_eq!(r.natural_key().as_deref(), Some("2025-03"));
    }

    #[test]
    fn patch_moves_the_natural_key() {
        let mut r = revenue(json!({"ano": 2025, "mes": 3, "receita": "1"}));
        let patch: MonthlyRevenuePatch = serde_json::from_value(json!({"mes": 4})).unwrap();
        r.apply(patch, Utc::now()).unwrap();
        assert_eq!(r.natural_key().as_deref(), Some("2025-04"));
        assert_eq!(r.revenue.to_string(), "1.00");
    }
}
