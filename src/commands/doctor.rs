// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{AmountType, ExpenseCategory, Frequency};
use crate::utils::{pretty_table, text_value};
use anyhow::Result;
use rusqlite::Connection;
use rusqlite::types::Value;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = diagnose(conn)?;
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Rows the reports would silently zero out, skip, or misattribute.
pub fn diagnose(conn: &Connection) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT e.id, e.name, e.category, e.amount, e.amount_type, e.frequency, e.transaction_date
         FROM expenses e ORDER BY e.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let category: String = r.get(2)?;
        let amount = text_value(r.get::<_, Value>(3)?);
        let amount_type: String = r.get(4)?;
        let frequency: String = r.get(5)?;
        let date: Option<String> = r.get(6)?;
        let label = format!("#{} {}", id, name);

        match amount.trim().parse::<Decimal>() {
            Ok(d) if d.is_sign_negative() && !d.is_zero() => issues.push(Issue {
                kind: "negative_amount",
                detail: format!("{}: {}", label, amount),
            }),
            Ok(_) => {}
            Err(_) => issues.push(Issue {
                kind: "invalid_amount",
                detail: format!("{}: '{}'", label, amount),
            }),
        }
        if category.parse::<ExpenseCategory>().is_err() {
            issues.push(Issue {
                kind: "unknown_category",
                detail: format!("{}: '{}' (counted as Other)", label, category),
            });
        }
        if amount_type.parse::<AmountType>().is_err() {
            issues.push(Issue {
                kind: "unknown_amount_type",
                detail: format!("{}: '{}' (counted as dollar)", label, amount_type),
            });
        }
        let freq = Frequency::from(frequency);
        if !freq.is_recognized() {
            issues.push(Issue {
                kind: "unknown_frequency",
                detail: format!("{}: '{}' (amount used as-is)", label, freq),
            });
        }
        let parsed_date = date
            .as_deref()
            .map(|d| chrono::NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d"));
        match parsed_date {
            Some(Err(_)) => issues.push(Issue {
                kind: "invalid_date",
                detail: format!("{}: '{}'", label, date.unwrap_or_default()),
            }),
            None if freq == Frequency::OneTime => issues.push(Issue {
                kind: "one_time_without_date",
                detail: format!("{} never appears in a window", label),
            }),
            _ => {}
        }
    }

    let mut orders = conn.prepare("SELECT id, date, total FROM orders ORDER BY id")?;
    let mut cur = orders.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let date = text_value(r.get::<_, Value>(1)?);
        let total = text_value(r.get::<_, Value>(2)?);
        if chrono::NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").is_err() {
            issues.push(Issue {
                kind: "invalid_order_date",
                detail: format!("order #{}: '{}' (left out of order stats)", id, date),
            });
        }
        if total.trim().parse::<Decimal>().is_err() {
            issues.push(Issue {
                kind: "invalid_order_total",
                detail: format!("order #{}: '{}' (left out of order stats)", id, total),
            });
        }
    }

    let mut stmt2 = conn.prepare(
        "SELECT t.name FROM teams t LEFT JOIN date_ranges r ON r.team_id=t.id
         WHERE r.team_id IS NULL ORDER BY t.name",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let team: String = r.get(0)?;
        issues.push(Issue {
            kind: "no_saved_range",
            detail: format!("team '{}' reports default to month to date", team),
        });
    }

    Ok(issues)
}
