//! On-demand reporting aggregations over already-scoped records.
//!
//! - No IO
//! - Recomputed on every call; the caller passes the rows visible to it

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use v4vision_core::RecordId;
use v4vision_core::money::{ratio, total};

use crate::period::Month;
use crate::revenue::MonthlyRevenue;
use crate::sale::SalespersonSale;
use crate::salesperson::Salesperson;

/// Month with the highest revenue in a year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakMonth {
    pub month: Month,
    pub revenue: Decimal,
}

/// Year-level totals (`retrospectiva`).
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualSummary {
    pub year: u32,
    pub revenue_total: Decimal,
    pub investment_total: Decimal,
    /// Total revenue over total investment, rounded to 2 places; 0 without investment.
    pub roas: f64,
    pub leads_total: u64,
    pub peak: Option<PeakMonth>,
    /// The year's rows, ordered by month.
    pub months: Vec<MonthlyRevenue>,
}

/// Summarise `records` for `year`. Rows of other years are ignored.
///
/// Ties for the peak month go to the lowest month number.
pub fn annual_summary(year: u32, records: impl IntoIterator<Item = MonthlyRevenue>) -> AnnualSummary {
    let mut months: Vec<MonthlyRevenue> = records.into_iter().filter(|r| r.year == year).collect();
    months.sort_by(|a, b| a.month.cmp(&b.month).then(a.company_id.cmp(&b.company_id)));

    let revenue_total = total(months.iter().map(|r| &r.revenue));
    let investment_total = total(months.iter().map(|r| &r.investment));
    let leads_total = months.iter().map(|r| u64::from(r.leads)).sum();
    let roas = ratio(revenue_total, investment_total)
        .round_dp(2)
        .to_f64()
        .unwrap_or(0.0);

    let mut peak: Option<&MonthlyRevenue> = None;
    for r in &months {
        // Strictly greater keeps the earliest month on ties.
        if peak.is_none_or(|p| r.revenue > p.revenue) {
            peak = Some(r);
        }
    }
    let peak = peak.map(|r| PeakMonth {
        month: r.month,
        revenue: r.revenue.amount(),
    });

    AnnualSummary {
        year,
        revenue_total,
        investment_total,
        roas,
        leads_total,
        peak,
        months,
    }
}

/// One salesperson's total for a year (`comparativo_vendedores`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalespersonTotal {
    pub salesperson_id: RecordId,
    pub name: String,
    pub total: Decimal,
}

/// Group `sales` of `year` by salesperson and sum them, highest total first.
///
/// Equal totals are ordered by name, then id. Sales whose salesperson is not
/// among `salespeople` are reported under an empty name.
pub fn salesperson_comparison<'a>(
    year: u32,
    sales: impl IntoIterator<Item = &'a SalespersonSale>,
    salespeople: impl IntoIterator<Item = &'a Salesperson>,
) -> Vec<SalespersonTotal> {
    let names: HashMap<RecordId, &str> = salespeople
        .into_iter()
        .map(|s| (s.id, s.name.as_str()))
        .collect();

    let mut sums: HashMap<RecordId, Decimal> = HashMap::new();
    for sale in sales.into_iter().filter(|s| s.year == year) {
        *sums.entry(sale.salesperson_id).or_insert(Decimal::ZERO) += sale.amount.amount();
    }

    let mut rows: Vec<SalespersonTotal> = sums
        .into_iter()
        .map(|(id, mut sum)| {
            sum.rescale(v4vision_core::money::MONEY_SCALE);
            SalespersonTotal {
                salesperson_id: id,
                name: names.get(&id).map(|n| n.to_string()).unwrap_or_default(),
                total: sum,
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.salesperson_id.cmp(&b.salesperson_id))
    });
    rows
}

/// Sum of every sale recorded for `salesperson`, across all years.
pub fn salesperson_total<'a>(
    salesperson: RecordId,
    sales: impl IntoIterator<Item = &'a SalespersonSale>,
) -> Decimal {
    total(
        sales
            .into_iter()
            .filter(|s| s.salesperson_id == salesperson)
            .map(|s| &s.amount),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use v4vision_core::{CompanyId, Money};

    fn money(cents: i64) -> Money {
        Money::new(Decimal::new(cents, 2)).unwrap()
    }

    fn revenue(company: CompanyId, year: u32, month: u8, revenue_cents: i64, investment_cents: i64) -> MonthlyRevenue {
        let now = Utc::now();
        MonthlyRevenue {
            id: RecordId::new(),
            company_id: company,
            year,
            month: Month::new(month).unwrap(),
            revenue: money(revenue_cents),
            investment: money(investment_cents),
            leads: 10,
            created_at: now,
            updated_at: now,
        }
    }

    fn salesperson(company: CompanyId, name: &str) -> Salesperson {
        let now = Utc::now();
        Salesperson {
            id: RecordId::new(),
            company_id: company,
            name: name.to_string(),
            email: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn sale(seller: &Salesperson, year: u32, month: u8, cents: i64) -> SalespersonSale {
        let now = Utc::now();
        SalespersonSale {
            id: RecordId::new(),
            company_id: seller.company_id,
            salesperson_id: seller.id,
            year,
            month: Month::new(month).unwrap(),
            amount: money(cents),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn annual_summary_example() {
        let a = CompanyId::new();
        let rows = vec![
            revenue(a, 2025, 2, 15_000, 5_000),
            revenue(a, 2025, 3, 20_000, 5_000),
            revenue(a, 2025, 1, 10_000, 5_000),
            revenue(a, 2024, 6, 99_900, 100),
        ];
        let summary = annual_summary(2025, rows);
        assert_eq!(summary.revenue_total.to_string(), "450.00");
        assert_eq!(summary.investment_total.to_string(), "150.00");
        assert_eq!(summary.roas, 3.0);
        assert_eq!(summary.leads_total, 30);
        assert_eq!(summary.peak.as_ref().map(|p| p.month.number()), Some(3));
        let order: Vec<u8> = summary.months.iter().map(|r| r.month.number()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn empty_year_has_no_peak_and_zero_roas() {
        let summary = annual_summary(2030, Vec::new());
        assert_eq!(summary.peak, None);
        assert_eq!(summary.roas, 0.0);
        assert!(summary.revenue_total.is_zero());
    }

    #[test]
    fn peak_ties_go_to_the_earliest_month() {
        let a = CompanyId::new();
        let rows = vec![revenue(a, 2025, 9, 500, 0), revenue(a, 2025, 4, 500, 0), revenue(a, 2025, 7, 100, 0)];
        let summary = annual_summary(2025, rows);
        assert_eq!(summary.peak.map(|p| p.month.number()), Some(4));
        assert_eq!(summary.roas, 0.0);
    }

    #[test]
    fn global_roas_is_rounded() {
        let a = CompanyId::new();
        let summary = annual_summary(2025, vec![revenue(a, 2025, 1, 10_000, 3_000)]);
        assert_eq!(summary.roas, 3.33);
    }

    #[test]
    fn comparison_groups_by_salesperson_and_sorts_descending() {
        let a = CompanyId::new();
        let ana = salesperson(a, "Ana");
        let bia = salesperson(a, "Bia");
        let caio = salesperson(a, "Caio");
        let sales = vec![
            sale(&ana, 2025, 1, 10_000),
            sale(&ana, 2025, 2, 5_000),
            sale(&bia, 2025, 1, 20_000),
            sale(&caio, 2025, 1, 15_000),
            sale(&caio, 2024, 1, 90_000),
        ];
        let rows = salesperson_comparison(2025, &sales, [&ana, &bia, &caio]);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Bia", "Ana", "Caio"]);
        assert_eq!(rows[1].total.to_string(), "150.00");
        assert_eq!(rows[0].salesperson_id, bia.id);
    }

    #[test]
    fn namesakes_are_kept_apart() {
        let a = CompanyId::new();
        let first = salesperson(a, "Ana");
        let second = salesperson(a, "Ana");
        let sales = vec![sale(&first, 2025, 1, 100), sale(&second, 2025, 1, 100)];
        let rows = salesperson_comparison(2025, &sales, [&first, &second]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn lifetime_total_for_one_salesperson() {
        let a = CompanyId::new();
        let ana = salesperson(a, "Ana");
        let bia = salesperson(a, "Bia");
        let sales = vec![sale(&ana, 2024, 1, 100), sale(&ana, 2025, 1, 250), sale(&bia, 2025, 1, 999)];
        assert_eq!(salesperson_total(ana.id, &sales).to_string(), "3.50");
    }

    proptest! {
        #[test]
        fn summary_totals_match_row_sums(
            cells in proptest::collection::btree_map(1u8..=12, (0i64..1_000_000, 0i64..1_000_000), 0..12)
        ) {
            let a = CompanyId::new();
            let rows: Vec<MonthlyRevenue> = cells
                .iter()
                .map(|(m, (r, i))| revenue(a, 2025, *m, *r, *i))
                .collect();
            let expected_revenue: i64 = cells.values().map(|(r, _)| r).sum();
            let expected_investment: i64 = cells.values().map(|(_, i)| i).sum();

            let summary = annual_summary(2025, rows);
            prop_assert_eq!(summary.revenue_total, Decimal::new(expected_revenue, 2));
            prop_assert_eq!(summary.investment_total, Decimal::new(expected_investment, 2));
            if expected_investment == 0 {
                prop_assert_eq!(summary.roas, 0.0);
            }
            if let Some(peak) = summary.peak {
                let max = cells.values().map(|(r, _)| *r).max().unwrap_or(0);
                prop_assert_eq!(peak.revenue, Decimal::new(max, 2));
                let first_max = cells.iter().find(|(_, (r, _))| *r == max).map(|(m, _)| *m);
                prop_assert_eq!(Some(peak.month.number()), first_max);
            }
        }
    }
}
