// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::reports::build_report;
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => export_expenses(conn, sub),
        _ => Ok(()),
    }
}

fn export_expenses(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();
    if fmt != "csv" && fmt != "json" {
        return Err(anyhow!("Unknown format: {} (use csv|json)", fmt));
    }

    let report = build_report(conn, sub)?;
    let window_start = report.window.start().to_string();
    let window_end = report.window.end().to_string();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id",
                "name",
                "category",
                "amount",
                "amount_type",
                "frequency",
                "transaction_date",
                "window_start",
                "window_end",
                "adjusted_amount",
                "percentage_amount",
            ])?;
            for e in &report.expenses {
                wtr.write_record([
                    e.expense.id.to_string(),
                    e.expense.name.clone(),
                    e.expense.category.to_string(),
                    e.expense.amount.clone(),
                    e.expense.amount_type.to_string(),
                    e.expense.frequency.to_string(),
                    e.expense
                        .transaction_date
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                    window_start.clone(),
                    window_end.clone(),
                    format!("{:.2}", e.adjusted_amount),
                    format!("{:.2}", e.percentage_amount),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            let items: Vec<_> = report
                .expenses
                .iter()
                .map(|e| {
                    json!({
                        "id": e.expense.id,
                        "name": e.expense.name,
                        "category": e.expense.category,
                        "amount": e.expense.amount,
                        "amount_type": e.expense.amount_type,
                        "frequency": e.expense.frequency,
                        "transaction_date": e.expense.transaction_date,
                        "window_start": window_start,
                        "window_end": window_end,
                        "adjusted_amount": format!("{:.2}", e.adjusted_amount),
                        "percentage_amount": format!("{:.2}", e.percentage_amount),
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported {} expenses to {}", report.expenses.len(), out);
    Ok(())
}
