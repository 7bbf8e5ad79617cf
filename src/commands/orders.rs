// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Order, ReportWindow};
use crate::utils::{
    current_team, fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table,
    text_value,
};
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rusqlite::types::Value;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("import", sub)) => import_orders(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let team_id = current_team(conn)?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let total = parse_decimal(sub.get_one::<String>("total").unwrap())?;
    let reference = sub
        .get_one::<String>("reference")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());
    conn.execute(
        "INSERT INTO orders(team_id, date, total, reference) VALUES (?1, ?2, ?3, ?4)",
        params![team_id, date.to_string(), total.to_string(), reference],
    )
    .with_context(|| format!("Insert order {}", reference.unwrap_or("(no reference)")))?;
    println!("Recorded order of {} on {}", fmt_money(&total), date);
    Ok(())
}

fn import_orders(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let team_id = current_team(conn)?;
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let tx = conn.transaction()?;
    let mut imported = 0usize;
    let mut skipped = 0usize;
    for (line, result) in rdr.records().enumerate() {
        let rec = result?;
        let date_raw = rec.get(0).context("date missing")?.trim();
        let total_raw = rec.get(1).context("total missing")?.trim();
        let reference = rec
            .get(2)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty());

        let date = parse_date(date_raw)
            .with_context(|| format!("Invalid order date '{}' on row {}", date_raw, line + 1))?;
        let total = parse_decimal(total_raw)
            .with_context(|| format!("Invalid order total '{}' on row {}", total_raw, line + 1))?;

        let n = tx.execute(
            "INSERT INTO orders(team_id, date, total, reference) VALUES (?1,?2,?3,?4)
             ON CONFLICT(team_id, reference) DO NOTHING",
            params![team_id, date.to_string(), total.to_string(), reference],
        )?;
        if n == 0 {
            skipped += 1;
        } else {
            imported += 1;
        }
    }
    tx.commit()?;
    info!(imported, skipped, path, "order import finished");
    println!(
        "Imported {} orders from {} ({} duplicates skipped)",
        imported, path, skipped
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let team_id = current_team(conn)?;
    let window = match (
        sub.get_one::<String>("from"),
        sub.get_one::<String>("to"),
    ) {
        (Some(f), Some(t)) => Some(ReportWindow::new(parse_date(f)?, parse_date(t)?)?),
        _ => None,
    };
    let mut data = query_orders(conn, team_id, window.as_ref())?;
    if let Some(limit) = sub.get_one::<usize>("limit") {
        data.truncate(*limit);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|o| {
                vec![
                    o.date.to_string(),
                    o.reference.clone().unwrap_or_default(),
                    fmt_money(&o.total),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Date", "Reference", "Total"], rows));
    }
    Ok(())
}

/// Orders of a team, newest first. Rows with an unreadable date or total are
/// skipped with a warning.
pub fn query_orders(
    conn: &Connection,
    team_id: i64,
    window: Option<&ReportWindow>,
) -> Result<Vec<Order>> {
    let mut sql = String::from("SELECT id, team_id, date, total, reference FROM orders WHERE team_id=?1");
    let mut bind: Vec<Value> = vec![Value::Integer(team_id)];
    if let Some(w) = window {
        sql.push_str(" AND date BETWEEN ?2 AND ?3");
        bind.push(Value::Text(w.start().to_string()));
        bind.push(Value::Text(w.end().to_string()));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(bind))?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let date_s: String = r.get(2)?;
        let total_s = text_value(r.get::<_, Value>(3)?);
        let Ok(date) = chrono::NaiveDate::parse_from_str(date_s.trim(), "%Y-%m-%d") else {
            warn!(order_id = id, raw = %date_s, "skipping order with invalid date");
            continue;
        };
        let Ok(total) = total_s.trim().parse::<Decimal>() else {
            warn!(order_id = id, raw = %total_s, "skipping order with invalid total");
            continue;
        };
        out.push(Order {
            id,
            team_id: r.get(1)?,
            date,
            total,
            reference: r.get(4)?,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub orders: u64,
    pub revenue: Decimal,
}

/// Order count and revenue inside the window; supplies `orders_in_period`
/// and the reference revenue for percentage expenses.
pub fn order_stats(conn: &Connection, team_id: i64, window: &ReportWindow) -> Result<OrderStats> {
    let orders = query_orders(conn, team_id, Some(window))?;
    let revenue = orders
        .iter()
        .fold(Decimal::ZERO, |acc, o| acc.saturating_add(o.total));
    Ok(OrderStats {
        orders: orders.len() as u64,
        revenue,
    })
}
