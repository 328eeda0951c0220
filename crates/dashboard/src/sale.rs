//! Salesperson sale (`venda por vendedor`): a salesperson's total for a month.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use v4vision_core::{CompanyId, DomainResult, Money, RecordId, TenantRecord};

use crate::period::Month;
use crate::record::{DashboardRecord, tenant_owned};

/// One row per company, salesperson, year and month.
///
/// `salesperson_id` must name a salesperson of the same company; that check
/// needs storage and happens before the record is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalespersonSale {
    pub id: RecordId,
    #[serde(rename = "company")]
    pub company_id: CompanyId,
    #[serde(rename = "vendedor")]
    pub salesperson_id: RecordId,
    #[serde(rename = "ano")]
    pub year: u32,
    #[serde(rename = "mes")]
    pub month: Month,
    #[serde(rename = "valor")]
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SalespersonSaleInput {
    #[serde(rename = "vendedor")]
    pub salesperson_id: RecordId,
    #[serde(rename = "ano")]
    pub year: u32,
    #[serde(rename = "mes")]
    pub month: Month,
    #[serde(rename = "valor")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalespersonSalePatch {
    #[serde(rename = "vendedor")]
    pub salesperson_id: Option<RecordId>,
    #[serde(rename = "ano")]
    pub year: Option<u32>,
    #[serde(rename = "mes")]
    pub month: Option<Month>,
    #[serde(rename = "valor")]
    pub amount: Option<Decimal>,
}

impl From<SalespersonSaleInput> for SalespersonSalePatch {
    fn from(value: SalespersonSaleInput) -> Self {
        Self {
            salesperson_id: Some(value.salesperson_id),
            year: Some(value.year),
            month: Some(value.month),
            amount: Some(value.amount),
        }
    }
}

impl DashboardRecord for SalespersonSale {
    type Input = SalespersonSaleInput;
    type Patch = SalespersonSalePatch;

    fn create(company_id: CompanyId, input: Self::Input, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: RecordId::new(),
            company_id,
            salesperson_id: input.salesperson_id,
            year: input.year,
            month: input.month,
            amount: Money::for_field("valor", input.amount)?,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> DomainResult<()> {
        let amount = patch.amount.map(|v| Money::for_field("valor", v)).transpose()?;

        if let Some(salesperson) = patch.salesperson_id {
            self.salesperson_id = salesperson;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(month) = patch.month {
            self.month = month;
        }
        if let Some(amount) = amount {
            self.amount = amount;
        }
        self.updated_at = now;
        Ok(())
    }
}

tenant_owned!(SalespersonSale);

impl TenantRecord for SalespersonSale {
    const KIND: &'static str = "dashboard.salesperson_sale";

    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    fn natural_key(&self) -> Option<String> {
        Some(format!("{}:{}-{:02}", self.salesperson_id, self.year, self.month.number()))
    }
}
