//! Request/response DTOs and their mapping from domain types.
//!
//! Field names follow the public JSON contract (Portuguese for dashboard
//! resources); derived values such as `roas` or `mes_nome` are computed here.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use v4vision_auth::{Identity, Role, User, UserPatch};
use v4vision_core::{Company, CompanyId, DomainError, Money, RecordId, UserId};
use v4vision_dashboard::{
    AnnualSummary, Month, MonthlyRevenue, PlannedInvestment, PlannedInvestmentInput, Protocol, ProtocolKind,
    Salesperson, SalespersonSale, SalespersonTotal, Scenario, Strategy, Week, WeeklyMetrics,
};

use crate::app::errors::{ApiError, ApiResult};

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Year from a query string, or the current UTC year.
pub fn year_or_current(ano: Option<u32>) -> u32 {
    ano.unwrap_or_else(|| Utc::now().year().max(0) as u32)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Companies and users
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CompanyView {
    pub id: CompanyId,
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
    pub primary_color: String,
    pub is_active: bool,
    pub users_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyView {
    pub fn new(company: Company, users_count: u64) -> Self {
        Self {
            id: company.id,
            name: company.name,
            slug: company.slug,
            logo: company.logo,
            primary_color: company.primary_color,
            is_active: company.is_active,
            users_count,
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}

/// Company branding embedded in a user.
#[derive(Debug, Serialize)]
pub struct CompanyBrief {
    pub id: CompanyId,
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
    pub primary_color: String,
}

impl From<&Company> for CompanyBrief {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
            slug: company.slug.clone(),
            logo: company.logo.clone(),
            primary_color: company.primary_color.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub company: Option<CompanyId>,
    pub company_data: Option<CompanyBrief>,
    pub role: Role,
    pub avatar: Option<String>,
    pub can_edit: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl UserView {
    pub fn new(user: &User, company: Option<&Company>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            company: user.company_id,
            company_data: company.map(CompanyBrief::from),
            role: user.role,
            avatar: user.avatar.clone(),
            can_edit: user.can_edit(),
            is_active: user.is_active,
            date_joined: user.date_joined,
        }
    }
}

/// Full administrative replace of a user (`PUT /users/{id}`).
#[derive(Debug, Deserialize)]
pub struct UserReplace {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: Option<CompanyId>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl From<UserReplace> for UserPatch {
    fn from(value: UserReplace) -> Self {
        Self {
            email: Some(value.email),
            first_name: Some(value.first_name),
            last_name: Some(value.last_name),
            company: Some(value.company),
            role: Some(value.role),
            avatar: Some(value.avatar),
            is_active: Some(value.is_active),
        }
    }
}

// ---------------------------------------------------------------------------
// Query filters
// ---------------------------------------------------------------------------

/// `?company=` narrows platform-admin reads; everyone else is pinned to
/// their own company and the parameter is never parsed for them.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    #[serde(default)]
    pub company: Option<String>,
}

impl ScopeQuery {
    /// The company a platform admin asked for, if any.
    pub fn requested(&self, identity: &Identity) -> ApiResult<Option<CompanyId>> {
        if !identity.role.can_manage_any_tenant() {
            return Ok(None);
        }
        match self.company.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e: DomainError| ApiError::field("company", e.to_string())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SalespersonFilter {
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodFilter {
    pub ano: Option<u32>,
    pub mes: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleFilter {
    pub vendedor: Option<RecordId>,
    pub ano: Option<u32>,
    pub mes: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StrategyFilter {
    pub ano: Option<u32>,
    pub cenario: Option<Scenario>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeeklyFilter {
    pub ano: Option<u32>,
    pub mes: Option<u8>,
    pub semana: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProtocolFilter {
    pub tipo: Option<ProtocolKind>,
}

#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    pub ano: Option<u32>,
}

/// A missing list clears the plan.
#[derive(Debug, Default, Deserialize)]
pub struct SetInvestmentsRequest {
    #[serde(default)]
    pub investimentos: Vec<PlannedInvestmentInput>,
}

// ---------------------------------------------------------------------------
// Dashboard views
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SalespersonView {
    pub id: RecordId,
    pub company: CompanyId,
    pub nome: String,
    pub email: String,
    pub is_active: bool,
    pub total_vendas: f64,
    pub created_at: DateTime<Utc>,
}

impl SalespersonView {
    pub fn new(salesperson: Salesperson, total_sales: Decimal) -> Self {
        Self {
            id: salesperson.id,
            company: salesperson.company_id,
            nome: salesperson.name,
            email: salesperson.email,
            is_active: salesperson.is_active,
            total_vendas: to_f64(total_sales),
            created_at: salesperson.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RevenueView {
    pub id: RecordId,
    pub company: CompanyId,
    pub ano: u32,
    pub mes: Month,
    pub mes_nome: &'static str,
    pub receita: Money,
    pub investimento: Money,
    pub leads: u32,
    pub roas: f64,
    pub created_at: DateTime<Utc>,
}

impl From<MonthlyRevenue> for RevenueView {
    fn from(row: MonthlyRevenue) -> Self {
        Self {
            roas: round2(row.roas()),
            id: row.id,
            company: row.company_id,
            ano: row.year,
            mes: row.month,
            mes_nome: row.month.name(),
            receita: row.revenue,
            investimento: row.investment,
            leads: row.leads,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleView {
    pub id: RecordId,
    pub company: CompanyId,
    pub vendedor: RecordId,
    pub vendedor_nome: String,
    pub ano: u32,
    pub mes: Month,
    pub mes_nome: &'static str,
    pub valor: Money,
    pub created_at: DateTime<Utc>,
}

impl SaleView {
    pub fn new(sale: SalespersonSale, salesperson_name: String) -> Self {
        Self {
            id: sale.id,
            company: sale.company_id,
            vendedor: sale.salesperson_id,
            vendedor_nome: salesperson_name,
            ano: sale.year,
            mes: sale.month,
            mes_nome: sale.month.name(),
            valor: sale.amount,
            created_at: sale.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvestmentView {
    pub id: RecordId,
    pub mes: Month,
    pub mes_nome: &'static str,
    pub valor: Money,
}

impl From<PlannedInvestment> for InvestmentView {
    fn from(item: PlannedInvestment) -> Self {
        Self {
            id: item.id,
            mes: item.month,
            mes_nome: item.month.name(),
            valor: item.amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StrategyView {
    pub id: RecordId,
    pub company: CompanyId,
    pub ano: u32,
    pub cenario: Scenario,
    pub cenario_nome: &'static str,
    pub orcamento_total: Money,
    pub receita_projetada: Money,
    pub roas_minimo: Decimal,
    pub investimentos_mensais: Vec<InvestmentView>,
    pub created_at: DateTime<Utc>,
}

impl From<Strategy> for StrategyView {
    fn from(strategy: Strategy) -> Self {
        Self {
            id: strategy.id,
            company: strategy.company_id,
            ano: strategy.year,
            cenario: strategy.scenario,
            cenario_nome: strategy.scenario.name(),
            orcamento_total: strategy.total_budget,
            receita_projetada: strategy.projected_revenue,
            roas_minimo: strategy.minimum_roas.value(),
            investimentos_mensais: strategy.investments.into_iter().map(InvestmentView::from).collect(),
            created_at: strategy.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WeeklyView {
    pub id: RecordId,
    pub company: CompanyId,
    pub ano: u32,
    pub mes: Month,
    pub mes_nome: &'static str,
    pub semana: Week,
    pub semana_nome: String,
    pub investimento: Money,
    pub leads: u32,
    pub vendas: Money,
    pub roas: f64,
    pub created_at: DateTime<Utc>,
}

impl From<WeeklyMetrics> for WeeklyView {
    fn from(row: WeeklyMetrics) -> Self {
        Self {
            roas: round2(row.roas()),
            id: row.id,
            company: row.company_id,
            ano: row.year,
            mes: row.month,
            mes_nome: row.month.name(),
            semana: row.week,
            semana_nome: row.week.name(),
            investimento: row.investment,
            leads: row.leads,
            vendas: row.sales,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProtocolView {
    pub id: RecordId,
    pub company: CompanyId,
    pub tipo: ProtocolKind,
    pub tipo_nome: &'static str,
    pub titulo: String,
    pub descricao: String,
    pub icone: String,
    pub cor: String,
    pub ordem: u16,
    pub created_at: DateTime<Utc>,
}

impl From<Protocol> for ProtocolView {
    fn from(protocol: Protocol) -> Self {
        Self {
            id: protocol.id,
            company: protocol.company_id,
            tipo: protocol.kind,
            tipo_nome: protocol.kind.name(),
            titulo: protocol.title,
            descricao: protocol.description,
            icone: protocol.icon,
            cor: protocol.color,
            ordem: protocol.position,
            created_at: protocol.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PeakView {
    pub mes: Month,
    pub mes_nome: &'static str,
    pub receita: f64,
}

#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub ano: u32,
    pub receita_total: f64,
    pub investimento_total: f64,
    pub roas_global: f64,
    pub leads_total: u64,
    pub mes_pico: Option<PeakView>,
    pub receitas_mensais: Vec<RevenueView>,
}

impl From<AnnualSummary> for SummaryView {
    fn from(summary: AnnualSummary) -> Self {
        Self {
            ano: summary.year,
            receita_total: to_f64(summary.revenue_total),
            investimento_total: to_f64(summary.investment_total),
            roas_global: summary.roas,
            leads_total: summary.leads_total,
            mes_pico: summary.peak.map(|p| PeakView {
                mes: p.month,
                mes_nome: p.month.name(),
                receita: to_f64(p.revenue),
            }),
            receitas_mensais: summary.months.into_iter().map(RevenueView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComparisonRow {
    pub vendedor_id: RecordId,
    pub vendedor: String,
    pub total: f64,
}

impl From<SalespersonTotal> for ComparisonRow {
    fn from(row: SalespersonTotal) -> Self {
        Self {
            vendedor_id: row.salesperson_id,
            vendedor: row.name,
            total: to_f64(row.total),
        }
    }
}
