// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Expense amortization: spreads stored expenses over a reporting window and
//! computes each expense's share of the window's total.
//!
//! Nothing here fails. A malformed row contributes zero (and is logged) so
//! one bad expense never hides the rest of a report.

use crate::models::{
    AdjustedExpense, AmountType, CategoryTotal, DailyExpenses, Expense, ExpenseCategory,
    Frequency, ReportWindow,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const MONTHS_PER_YEAR: i64 = 12;
const DAYS_PER_YEAR: i64 = 365;

/// Smallest divisor used for percentage shares, so an all-zero period
/// yields 0% rows instead of a division by zero.
pub fn min_total() -> Decimal {
    Decimal::new(1, 2)
}

/// Amount attributable to `window` for a single expense.
///
/// Monthly amounts go through an annual run rate (`* 12 / 365` per day),
/// yearly amounts are divided by 365 per day, per-order amounts scale with
/// `orders_in_period`, and one-time or unrecognized frequencies pass the
/// amount through untouched.
///
/// Percentage-type amounts are a share of `reference_revenue`, which already
/// covers the window and its orders, so the frequency rule does not apply.
pub fn normalize(
    expense: &Expense,
    window: &ReportWindow,
    orders_in_period: u64,
    reference_revenue: Option<Decimal>,
) -> Decimal {
    let base = coerced_amount(expense);
    if expense.amount_type == AmountType::Percentage {
        return revenue_share(expense, base, reference_revenue);
    }
    let days = Decimal::from(window.days_in_period());

    let adjusted = match &expense.frequency {
        Frequency::Monthly => base
            .checked_mul(Decimal::from(MONTHS_PER_YEAR))
            .and_then(|annual| annual.checked_div(Decimal::from(DAYS_PER_YEAR)))
            .and_then(|daily| daily.checked_mul(days)),
        Frequency::Yearly => base
            .checked_div(Decimal::from(DAYS_PER_YEAR))
            .and_then(|daily| daily.checked_mul(days)),
        Frequency::PerOrder => base.checked_mul(Decimal::from(orders_in_period)),
        Frequency::OneTime => Some(base),
        Frequency::Other(raw) => {
            debug!(
                expense_id = expense.id,
                frequency = %raw,
                "unrecognized frequency, using stored amount"
            );
            Some(base)
        }
    };

    adjusted.unwrap_or_else(|| {
        warn!(
            expense_id = expense.id,
            window = %window,
            "proration overflowed, using stored amount"
        );
        base
    })
}

/// Normalizes every expense and attaches its share of the window total.
/// Output order matches input order.
pub fn aggregate(
    expenses: &[Expense],
    window: &ReportWindow,
    orders_in_period: u64,
    reference_revenue: Option<Decimal>,
) -> Vec<AdjustedExpense> {
    let amounts: Vec<Decimal> = expenses
        .iter()
        .map(|e| normalize(e, window, orders_in_period, reference_revenue))
        .collect();
    let total = floored_total(amounts.iter().copied());

    expenses
        .iter()
        .zip(amounts)
        .map(|(expense, adjusted_amount)| AdjustedExpense {
            expense: expense.clone(),
            adjusted_amount,
            percentage_amount: share(adjusted_amount, total),
            amount_coerced: expense.parsed_amount().is_err(),
        })
        .collect()
}

/// Expenses that belong in a window-scoped total: every recurring expense,
/// plus one-time expenses dated inside the window.
pub fn in_window(expenses: &[Expense], window: &ReportWindow) -> Vec<Expense> {
    expenses
        .iter()
        .filter(|e| match e.frequency {
            Frequency::OneTime => e.transaction_date.is_some_and(|d| window.contains(d)),
            _ => true,
        })
        .cloned()
        .collect()
}

/// Adjusted amounts summed per category, largest first.
pub fn by_category(adjusted: &[AdjustedExpense]) -> Vec<CategoryTotal> {
    let mut buckets: BTreeMap<ExpenseCategory, (Decimal, usize)> = BTreeMap::new();
    for row in adjusted {
        let entry = buckets
            .entry(row.expense.category)
            .or_insert((Decimal::ZERO, 0));
        entry.0 = entry.0.saturating_add(row.adjusted_amount);
        entry.1 += 1;
    }
    let total = floored_total(buckets.values().map(|(amt, _)| *amt));

    let mut out: Vec<CategoryTotal> = buckets
        .into_iter()
        .map(|(category, (adjusted_amount, expense_count))| CategoryTotal {
            category,
            adjusted_amount,
            percentage_amount: share(adjusted_amount, total),
            expense_count,
        })
        .collect();
    out.sort_by(|a, b| {
        b.adjusted_amount
            .cmp(&a.adjusted_amount)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    out
}

/// Per-day, per-category matrix over `window`.
///
/// One-time expenses land in full on their transaction date; everything else
/// is spread as a uniform daily share of its adjusted amount.
pub fn daily_breakdown(adjusted: &[AdjustedExpense], window: &ReportWindow) -> Vec<DailyExpenses> {
    let mut days: Vec<DailyExpenses> = window
        .days()
        .map(|date| DailyExpenses {
            date,
            by_category: BTreeMap::new(),
            total: Decimal::ZERO,
        })
        .collect();
    let day_count = Decimal::from(window.days_in_period());

    for row in adjusted {
        let category = row.expense.category;
        match row.expense.frequency {
            Frequency::OneTime => {
                let Some(date) = row.expense.transaction_date.filter(|d| window.contains(*d))
                else {
                    debug!(
                        expense_id = row.expense.id,
                        "one-time expense has no date in window, skipped in daily breakdown"
                    );
                    continue;
                };
                let idx = (date - window.start()).num_days() as usize;
                add_to_day(&mut days[idx], category, row.adjusted_amount);
            }
            _ => {
                let daily = row
                    .adjusted_amount
                    .checked_div(day_count)
                    .unwrap_or(Decimal::ZERO);
                for day in days.iter_mut() {
                    add_to_day(day, category, daily);
                }
            }
        }
    }
    days
}

fn add_to_day(day: &mut DailyExpenses, category: ExpenseCategory, amount: Decimal) {
    let slot = day.by_category.entry(category).or_insert(Decimal::ZERO);
    *slot = slot.saturating_add(amount);
    day.total = day.total.saturating_add(amount);
}

fn coerced_amount(expense: &Expense) -> Decimal {
    match expense.parsed_amount() {
        Ok(v) => v,
        Err(err) => {
            warn!(
                expense_id = expense.id,
                name = %expense.name,
                raw = %expense.amount,
                "{err}; counting expense as zero"
            );
            Decimal::ZERO
        }
    }
}

fn revenue_share(expense: &Expense, pct: Decimal, reference_revenue: Option<Decimal>) -> Decimal {
    let Some(revenue) = reference_revenue else {
        debug!(
            expense_id = expense.id,
            "percentage expense without reference revenue, counting as zero"
        );
        return Decimal::ZERO;
    };
    revenue
        .checked_mul(pct)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .map(|v| v.max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO)
}

fn floored_total(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
        .max(min_total())
}

fn share(amount: Decimal, total: Decimal) -> Decimal {
    amount
        .checked_div(total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}
