// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ProfitError;
use crate::models::{AmountType, Expense, ExpenseCategory, Frequency};
use crate::utils::{
    current_team, current_user, maybe_print_json, parse_amount, parse_date, pretty_table,
    text_value,
};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::warn;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn opt_trimmed<'a>(sub: &'a clap::ArgMatches, key: &str) -> Option<&'a str> {
    sub.get_one::<String>(key)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn check_one_time_date(
    name: &str,
    frequency: &Frequency,
    date: Option<NaiveDate>,
) -> Result<(), ProfitError> {
    if *frequency == Frequency::OneTime && date.is_none() {
        return Err(ProfitError::MissingTransactionDate(name.to_string()));
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let team_id = current_team(conn)?;
    let name = opt_trimmed(sub, "name").ok_or_else(|| anyhow!("Expense name must not be empty"))?;
    let category: ExpenseCategory = sub.get_one::<String>("category").unwrap().parse()?;
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let amount_type: AmountType = match opt_trimmed(sub, "amount_type") {
        Some(s) => s.parse()?,
        None => AmountType::Dollar,
    };
    let frequency: Frequency = sub.get_one::<String>("frequency").unwrap().parse()?;
    let date = opt_trimmed(sub, "date").map(parse_date).transpose()?;
    check_one_time_date(name, &frequency, date)?;
    let created_by = opt_trimmed(sub, "by")
        .map(|s| s.to_string())
        .unwrap_or_else(current_user);

    conn.execute(
        "INSERT INTO expenses(team_id, name, category, amount, amount_type, frequency, transaction_date, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            team_id,
            name,
            category.as_str(),
            amount.to_string(),
            amount_type.as_str(),
            frequency.as_str(),
            date.map(|d| d.to_string()),
            created_by
        ],
    )?;
    println!(
        "Recorded expense #{} '{}' ({}, {} {})",
        conn.last_insert_rowid(),
        name,
        category,
        amount,
        frequency
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let team_id = current_team(conn)?;
    let category = opt_trimmed(sub, "category")
        .map(|s| s.parse::<ExpenseCategory>())
        .transpose()?;
    let data = query_expenses(conn, team_id, category)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.name.clone(),
                    e.category.to_string(),
                    e.amount.clone(),
                    e.amount_type.to_string(),
                    e.frequency.to_string(),
                    e.transaction_date.map(|d| d.to_string()).unwrap_or_default(),
                    e.created_by.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Category", "Amount", "Type", "Frequency", "Date", "By"],
                rows,
            )
        );
    }
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let team_id = current_team(conn)?;
    let id = parse_id(sub)?;
    let mut e = get_expense(conn, team_id, id)?
        .ok_or_else(|| anyhow!("Expense {} not found in current team", id))?;

    if let Some(name) = opt_trimmed(sub, "name") {
        e.name = name.to_string();
    }
    if let Some(cat) = opt_trimmed(sub, "category") {
        e.category = cat.parse()?;
    }
    if let Some(amount) = opt_trimmed(sub, "amount") {
        e.amount = parse_amount(amount)?.to_string();
    }
    if let Some(t) = opt_trimmed(sub, "amount_type") {
        e.amount_type = t.parse()?;
    }
    if let Some(f) = opt_trimmed(sub, "frequency") {
        let frequency: Frequency = f.parse()?;
        // only one-time rows carry a date
        if frequency != Frequency::OneTime && e.frequency == Frequency::OneTime {
            e.transaction_date = None;
        }
        e.frequency = frequency;
    }
    if sub.get_flag("clear_date") {
        e.transaction_date = None;
    }
    if let Some(d) = opt_trimmed(sub, "date") {
        e.transaction_date = Some(parse_date(d)?);
    }
    check_one_time_date(&e.name, &e.frequency, e.transaction_date)?;

    conn.execute(
        "UPDATE expenses SET name=?1, category=?2, amount=?3, amount_type=?4, frequency=?5,
         transaction_date=?6, updated_at=datetime('now')
         WHERE id=?7 AND team_id=?8",
        params![
            e.name,
            e.category.as_str(),
            e.amount,
            e.amount_type.as_str(),
            e.frequency.as_str(),
            e.transaction_date.map(|d| d.to_string()),
            id,
            team_id
        ],
    )?;
    println!("Updated expense #{} '{}'", id, e.name);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let team_id = current_team(conn)?;
    let id = parse_id(sub)?;
    let n = conn.execute(
        "DELETE FROM expenses WHERE id=?1 AND team_id=?2",
        params![id, team_id],
    )?;
    if n == 0 {
        return Err(anyhow!("Expense {} not found in current team", id));
    }
    println!("Removed expense #{}", id);
    Ok(())
}

fn parse_id(sub: &clap::ArgMatches) -> Result<i64> {
    let raw = sub.get_one::<String>("id").unwrap().trim();
    raw.parse::<i64>()
        .with_context(|| format!("Invalid expense id '{}'", raw))
}

const EXPENSE_COLUMNS: &str = "id, team_id, name, category, amount, amount_type, frequency, \
     transaction_date, created_by, created_at, updated_at";

fn expense_from_row(r: &Row<'_>) -> rusqlite::Result<Expense> {
    let id: i64 = r.get(0)?;
    let category: String = r.get(3)?;
    let amount_type: String = r.get(5)?;
    let frequency: String = r.get(6)?;
    let date: Option<String> = r.get(7)?;

    let amount_type = amount_type.parse().unwrap_or_else(|_| {
        warn!(expense_id = id, raw = %amount_type, "unknown amount type, treating as dollar");
        AmountType::Dollar
    });
    let transaction_date = date
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                warn!(expense_id = id, raw = %s, "unparseable transaction date ignored");
                None
            }
        });

    Ok(Expense {
        id,
        team_id: r.get(1)?,
        name: r.get(2)?,
        category: ExpenseCategory::from_stored(&category),
        amount: text_value(r.get::<_, Value>(4)?),
        amount_type,
        frequency: Frequency::from(frequency),
        transaction_date,
        created_by: r.get(8)?,
        created_at: r.get(9)?,
        updated_at: r.get(10)?,
    })
}

pub fn get_expense(conn: &Connection, team_id: i64, id: i64) -> Result<Option<Expense>> {
    let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id=?1 AND team_id=?2");
    let e = conn
        .query_row(&sql, params![id, team_id], expense_from_row)
        .optional()?;
    Ok(e)
}

/// All expenses of a team in insertion order, optionally for one category.
pub fn query_expenses(
    conn: &Connection,
    team_id: i64,
    category: Option<ExpenseCategory>,
) -> Result<Vec<Expense>> {
    let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE team_id=?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![team_id], expense_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        let e = row?;
        if category.is_none_or(|c| c == e.category) {
            data.push(e);
        }
    }
    Ok(data)
}
