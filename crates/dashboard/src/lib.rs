//! `v4vision-dashboard`: tenant-owned dashboard records and reports.
//!
//! Pure domain logic (no IO, no HTTP, no storage): each record validates its
//! own input, declares its tenant and its per-company natural key, and the
//! report functions aggregate already-scoped rows.

pub mod period;
pub mod protocol;
pub mod record;
pub mod report;
pub mod revenue;
pub mod sale;
pub mod salesperson;
pub mod strategy;
pub mod weekly;

pub use period::{Month, Week};
pub use protocol::{Protocol, ProtocolInput, ProtocolKind, ProtocolPatch};
pub use record::DashboardRecord;
pub use report::{
    AnnualSummary, PeakMonth, SalespersonTotal, annual_summary, salesperson_comparison, salesperson_total,
};
pub use revenue::{MonthlyRevenue, MonthlyRevenueInput, MonthlyRevenuePatch};
pub use sale::{SalespersonSale, SalespersonSaleInput, SalespersonSalePatch};
pub use salesperson::{Salesperson, SalespersonInput, SalespersonPatch};
pub use strategy::{
    MinimumRoas, PlannedInvestment, PlannedInvestmentInput, Scenario, Strategy, StrategyInput, StrategyPatch,
};
pub use weekly::{WeeklyMetrics, WeeklyMetricsInput, WeeklyMetricsPatch};
