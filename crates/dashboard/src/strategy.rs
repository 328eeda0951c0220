//! Strategy (`estratégia`): the yearly budget plan for one scenario, with its
//! planned investment per month.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use v4vision_core::{CompanyId, DomainError, DomainResult, Money, RecordId, TenantRecord, ValueObject};

use crate::period::Month;
use crate::record::{DashboardRecord, tenant_owned};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    #[default]
    Conservador,
    Ousado,
}

impl Scenario {
    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Conservador => "conservador",
            Scenario::Ousado => "ousado",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Conservador => "Conservador",
            Scenario::Ousado => "Ousado",
        }
    }
}

/// ROAS below which spend should be frozen. Non-negative, two decimal
/// places, below 1000.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct MinimumRoas(Decimal);

impl ValueObject for MinimumRoas {}

impl MinimumRoas {
    pub fn new(value: Decimal) -> DomainResult<Self> {
        let invalid = |msg: &str| DomainError::field("roas_minimo", msg);
        if value.is_sign_negative() && !value.is_zero() {
            return Err(invalid("must not be negative"));
        }
        let normalized = value.normalize();
        if normalized.scale() > 2 {
            return Err(invalid("at most 2 decimal places"));
        }
        if normalized >= Decimal::from(1000) {
            return Err(invalid("must be below 1000"));
        }
        let mut value = normalized.abs();
        value.rescale(2);
        Ok(Self(value))
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl Default for MinimumRoas {
    fn default() -> Self {
        Self(Decimal::new(400, 2))
    }
}

impl TryFrom<Decimal> for MinimumRoas {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MinimumRoas> for Decimal {
    fn from(value: MinimumRoas) -> Self {
        value.0
    }
}

/// Investment planned for one month of the strategy's year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedInvestment {
    pub id: RecordId,
    #[serde(rename = "mes")]
    pub month: Month,
    #[serde(rename = "valor")]
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlannedInvestmentInput {
    #[serde(rename = "mes")]
    pub month: Month,
    #[serde(rename = "valor")]
    pub amount: Decimal,
}

/// One row per company, year and scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: RecordId,
    #[serde(rename = "company")]
    pub company_id: CompanyId,
    #[serde(rename = "ano")]
    pub year: u32,
    #[serde(rename = "cenario")]
    pub scenario: Scenario,
    #[serde(rename = "orcamento_total")]
    pub total_budget: Money,
    #[serde(rename = "receita_projetada")]
    pub projected_revenue: Money,
    #[serde(rename = "roas_minimo")]
    pub minimum_roas: MinimumRoas,
    /// Ordered by month, at most one entry per month.
    #[serde(rename = "investimentos_mensais")]
    pub investments: Vec<PlannedInvestment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Strategy {
    /// Replace every planned investment with `items`.
    ///
    /// The whole list is validated first; on error the current plan is kept.
    pub fn replace_investments(
        &mut self,
        items: Vec<PlannedInvestmentInput>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.investments = plan(items)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn planned_total(&self) -> Decimal {
        v4vision_core::money::total(self.investments.iter().map(|i| &i.amount))
    }
}

fn plan(items: Vec<PlannedInvestmentInput>) -> DomainResult<Vec<PlannedInvestment>> {
    let mut seen = BTreeSet::new();
    for item in &items {
        if !seen.insert(item.month) {
            return Err(DomainError::field(
                "investimentos",
                format!("month {} is listed more than once", item.month),
            ));
        }
    }
    let mut planned = items
        .into_iter()
        .map(|i| {
            Ok(PlannedInvestment {
                id: RecordId::new(),
                month: i.month,
                amount: Money::for_field("investimentos", i.amount)?,
            })
        })
        .collect::<DomainResult<Vec<_>>>()?;
    planned.sort_by_key(|p| p.month);
    Ok(planned)
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyInput {
    #[serde(rename = "ano")]
    pub year: u32,
    #[serde(rename = "cenario", default)]
    pub scenario: Scenario,
    #[serde(rename = "orcamento_total")]
    pub total_budget: Decimal,
    #[serde(rename = "receita_projetada")]
    pub projected_revenue: Decimal,
    #[serde(rename = "roas_minimo", default = "default_minimum_roas")]
    pub minimum_roas: Decimal,
    /// Only read on create.
    #[serde(rename = "investimentos", default)]
    pub investments: Vec<PlannedInvestmentInput>,
}

/// Partial update. The monthly plan is only changed through
/// [`Strategy::replace_investments`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyPatch {
    #[serde(rename = "ano")]
    pub year: Option<u32>,
    #[serde(rename = "cenario")]
    pub scenario: Option<Scenario>,
    #[serde(rename = "orcamento_total")]
    pub total_budget: Option<Decimal>,
    #[serde(rename = "receita_projetada")]
    pub projected_revenue: Option<Decimal>,
    #[serde(rename = "roas_minimo")]
    pub minimum_roas: Option<Decimal>,
}

fn default_minimum_roas() -> Decimal {
    MinimumRoas::default().value()
}

impl From<StrategyInput> for StrategyPatch {
    fn from(value: StrategyInput) -> Self {
        Self {
            year: Some(value.year),
            scenario: Some(value.scenario),
            total_budget: Some(value.total_budget),
            projected_revenue: Some(value.projected_revenue),
            minimum_roas: Some(value.minimum_roas),
        }
    }
}

impl DashboardRecord for Strategy {
    type Input = StrategyInput;
    type Patch = StrategyPatch;

    fn create(company_id: CompanyId, input: Self::Input, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: RecordId::new(),
            company_id,
            year: input.year,
            scenario: input.scenario,
            total_budget: Money::for_field("orcamento_total", input.total_budget)?,
            projected_revenue: Money::for_field("receita_projetada", input.projected_revenue)?,
            minimum_roas: MinimumRoas::new(input.minimum_roas)?,
            investments: plan(input.investments)?,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> DomainResult<()> {
        let budget = patch.total_budget.map(|v| Money::for_field("orcamento_total", v)).transpose()?;
        let projected = patch
            .projected_revenue
            .map(|v| Money::for_field("receita_projetada", v))
            .transpose()?;
        let roas = patch.minimum_roas.map(MinimumRoas::new).transpose()?;

        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(scenario) = patch.scenario {
            self.scenario = scenario;
        }
        if let Some(budget) = budget {
            self.total_budget = budget;
        }
        if let Some(projected) = projected {
            self.projected_revenue = projected;
        }
        if let Some(roas) = roas {
            self.minimum_roas = roas;
        }
        self.updated_at = now;
        Ok(())
    }
}

tenant_owned!(Strategy);

impl TenantRecord for Strategy {
    const KIND: &'static str = "dashboard.strategy";

    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    fn natural_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.year, self.scenario.as_str()))
    }
}
