//! Weekly metrics (`gestão semanal`): spend, leads and sales for one week.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use v4vision_core::{CompanyId, DomainResult, Money, RecordId, TenantRecord};

use crate::period::{Month, Week};
use crate::record::{DashboardRecord, tenant_owned};

/// One row per company, year, month and week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyMetrics {
    pub id: RecordId,
    #[serde(rename = "company")]
    pub company_id: CompanyId,
    #[serde(rename = "ano")]
    pub year: u32,
    #[serde(rename = "mes")]
    pub month: Month,
    #[serde(rename = "semana")]
    pub week: Week,
    #[serde(rename = "investimento")]
    pub investment: Money,
    pub leads: u32,
    #[serde(rename = "vendas")]
    pub sales: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeeklyMetrics {
    /// Sales over investment; zero when nothing was invested.
    pub fn roas(&self) -> f64 {
        self.sales.return_on(self.investment)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeeklyMetricsInput {
    #[serde(rename = "ano")]
    pub year: u32,
    #[serde(rename = "mes")]
    pub month: Month,
    #[serde(rename = "semana")]
    pub week: Week,
    #[serde(rename = "investimento")]
    pub investment: Decimal,
    pub leads: u32,
    #[serde(rename = "vendas")]
    pub sales: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeeklyMetricsPatch {
    #[serde(rename = "ano")]
    pub year: Option<u32>,
    #[serde(rename = "mes")]
    pub month: Option<Month>,
    #[serde(rename = "semana")]
    pub week: Option<Week>,
    #[serde(rename = "investimento")]
    pub investment: Option<Decimal>,
    pub leads: Option<u32>,
    #[serde(rename = "vendas")]
    pub sales: Option<Decimal>,
}

impl From<WeeklyMetricsInput> for WeeklyMetricsPatch {
    fn from(value: WeeklyMetricsInput) -> Self {
        Self {
            year: Some(value.year),
            month: Some(value.month),
            week: Some(value.week),
            investment: Some(value.investment),
            leads: Some(value.leads),
            sales: Some(value.sales),
        }
    }
}

impl DashboardRecord for WeeklyMetrics {
    type Input = WeeklyMetricsInput;
    type Patch = WeeklyMetricsPatch;

    fn create(company_id: CompanyId, input: Self::Input, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: RecordId::new(),
            company_id,
            year: input.year,
            month: input.month,
            week: input.week,
            investment: Money::for_field("investimento", input.investment)?,
            leads: input.leads,
            sales: Money::for_field("vendas", input.sales)?,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> DomainResult<()> {
        let investment = patch.investment.map(|v| Money::for_field("investimento", v)).transpose()?;
        let sales = patch.sales.map(|v| Money::for_field("vendas", v)).transpose()?;

        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(month) = patch.month {
            self.month = month;
        }
        if let Some(week) = patch.week {
            self.week = week;
        }
        if let Some(investment) = investment {
            self.investment = investment;
        }
        if let Some(leads) = patch.leads {
            self.leads = leads;
        }
        if let Some(sales) = sales {
            self.sales = sales;
        }
        self.updated_at = now;
        Ok(())
    }
}

tenant_owned!(WeeklyMetrics);

impl TenantRecord for WeeklyMetrics {
    const KIND: &'static str = "dashboard.weekly_metrics";

    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    fn natural_key(&self) -> Option<String> {
        Some(format!(
            "{}-{:02}-w{}",
            self.year,
            self.month.number(),
            self.week.number()
        ))
    }
}
