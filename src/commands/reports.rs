// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::amortize::{aggregate, by_category, daily_breakdown, in_window};
use crate::commands::{expenses::query_expenses, orders::order_stats, range::resolve_window};
use crate::models::{AdjustedExpense, ExpenseCategory, ReportWindow};
use crate::utils::{
    current_team, fmt_money, fmt_percent, maybe_print_json, parse_decimal, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => expenses(conn, sub)?,
        Some(("by-category", sub)) => categories(conn, sub)?,
        Some(("daily", sub)) => daily(conn, sub)?,
        Some(("pnl", sub)) => pnl(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Everything a window-scoped report needs, already amortized.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub window: ReportWindow,
    pub days_in_period: i64,
    pub orders: u64,
    pub revenue: Decimal,
    pub total_expenses: Decimal,
    pub expenses: Vec<AdjustedExpense>,
}

/// Resolves the window and order figures for the current team and amortizes
/// its expenses. `--orders` and `--revenue` override the stored orders.
pub fn build_report(conn: &Connection, sub: &clap::ArgMatches) -> Result<Report> {
    let team_id = current_team(conn)?;
    let window = resolve_window(conn, team_id, sub)?;
    let stats = order_stats(conn, team_id, &window)?;
    let orders = sub.get_one::<u64>("orders").copied().unwrap_or(stats.orders);
    let revenue = match sub.get_one::<String>("revenue") {
        Some(r) => parse_decimal(r)?,
        None => stats.revenue,
    };
    debug!(team_id, window = %window, orders, revenue = %revenue, "building report");

    let scoped = in_window(&query_expenses(conn, team_id, None)?, &window);
    let expenses = aggregate(&scoped, &window, orders, Some(revenue));
    let coerced = expenses.iter().filter(|e| e.amount_coerced).count();
    if coerced > 0 {
        warn!(coerced, "some expenses have unusable amounts; run `profitclip doctor`");
    }
    let total_expenses = expenses
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.adjusted_amount));

    Ok(Report {
        window,
        days_in_period: window.days_in_period(),
        orders,
        revenue,
        total_expenses,
        expenses,
    })
}

fn print_header(report: &Report) {
    println!(
        "Window {} ({} days), {} orders, revenue {}",
        report.window,
        report.days_in_period,
        report.orders,
        fmt_money(&report.revenue)
    );
}

fn expenses(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let report = build_report(conn, sub)?;
    let rounded: Vec<AdjustedExpense> = report
        .expenses
        .iter()
        .map(|e| AdjustedExpense {
            adjusted_amount: e.adjusted_amount.round_dp(2),
            percentage_amount: e.percentage_amount.round_dp(2),
            ..e.clone()
        })
        .collect();
    if maybe_print_json(json_flag, jsonl_flag, &rounded)? {
        return Ok(());
    }

    let mut rows: Vec<Vec<String>> = report
        .expenses
        .iter()
        .map(|e| {
            let mut amount = e.expense.amount.clone();
            if e.amount_coerced {
                amount.push_str(" (!)");
            }
            vec![
                e.expense.id.to_string(),
                e.expense.name.clone(),
                e.expense.category.to_string(),
                e.expense.frequency.to_string(),
                amount,
                fmt_money(&e.adjusted_amount),
                fmt_percent(&e.percentage_amount),
            ]
        })
        .collect();
    let share_total = report
        .expenses
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc + e.percentage_amount);
    rows.push(vec![
        String::new(),
        "Total".into(),
        String::new(),
        String::new(),
        String::new(),
        fmt_money(&report.total_expenses),
        fmt_percent(&share_total),
    ]);
    print_header(&report);
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Category", "Frequency", "Amount", "Adjusted", "Share"],
            rows
        )
    );
    Ok(())
}

fn categories(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let report = build_report(conn, sub)?;
    let mut buckets = by_category(&report.expenses);
    for b in buckets.iter_mut() {
        b.adjusted_amount = b.adjusted_amount.round_dp(2);
        b.percentage_amount = b.percentage_amount.round_dp(2);
    }
    if maybe_print_json(json_flag, jsonl_flag, &buckets)? {
        return Ok(());
    }
    let rows = buckets
        .iter()
        .map(|b| {
            vec![
                b.category.to_string(),
                b.expense_count.to_string(),
                fmt_money(&b.adjusted_amount),
                fmt_percent(&b.percentage_amount),
            ]
        })
        .collect();
    print_header(&report);
    println!(
        "{}",
        pretty_table(&["Category", "Expenses", "Adjusted", "Share"], rows)
    );
    Ok(())
}

fn daily(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let report = build_report(conn, sub)?;
    let mut days = daily_breakdown(&report.expenses, &report.window);
    for d in days.iter_mut() {
        for v in d.by_category.values_mut() {
            *v = v.round_dp(2);
        }
        d.total = d.total.round_dp(2);
    }
    if maybe_print_json(json_flag, jsonl_flag, &days)? {
        return Ok(());
    }

    let cats: BTreeSet<ExpenseCategory> = days
        .iter()
        .flat_map(|d| d.by_category.keys().copied())
        .collect();
    let mut headers: Vec<&str> = vec!["Date"];
    headers.extend(cats.iter().map(|c| c.as_str()));
    headers.push("Total");
    let rows = days
        .iter()
        .map(|d| {
            let mut row = vec![d.date.to_string()];
            row.extend(cats.iter().map(|c| {
                fmt_money(d.by_category.get(c).unwrap_or(&Decimal::ZERO))
            }));
            row.push(fmt_money(&d.total));
            row
        })
        .collect();
    print_header(&report);
    println!("{}", pretty_table(&headers, rows));
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct PnlSummary {
    pub window: ReportWindow,
    pub orders: u64,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    /// Profit as a percentage of revenue; absent when there is no revenue.
    pub margin: Option<Decimal>,
}

pub fn pnl_summary(report: &Report) -> PnlSummary {
    let profit = report.revenue.saturating_sub(report.total_expenses);
    let margin = if report.revenue.is_zero() {
        None
    } else {
        profit
            .checked_div(report.revenue)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map(|m| m.round_dp(2))
    };
    PnlSummary {
        window: report.window,
        orders: report.orders,
        revenue: report.revenue.round_dp(2),
        expenses: report.total_expenses.round_dp(2),
        profit: profit.round_dp(2),
        margin,
    }
}

fn pnl(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let report = build_report(conn, sub)?;
    let summary = pnl_summary(&report);
    if maybe_print_json(json_flag, jsonl_flag, &summary)? {
        return Ok(());
    }
    let rows = vec![
        vec!["Window".into(), summary.window.to_string()],
        vec!["Orders".into(), summary.orders.to_string()],
        vec!["Revenue".into(), fmt_money(&summary.revenue)],
        vec!["Expenses".into(), fmt_money(&summary.expenses)],
        vec!["Profit".into(), fmt_money(&summary.profit)],
        vec![
            "Margin".into(),
            summary
                .margin
                .map(|m| fmt_percent(&m))
                .unwrap_or_else(|| "n/a".into()),
        ],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], rows));
    Ok(())
}
