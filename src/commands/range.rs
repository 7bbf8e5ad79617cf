// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::ReportWindow;
use crate::utils::{current_team, parse_date};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let team_id = current_team(conn)?;
    match m.subcommand() {
        Some(("set", sub)) => {
            let start = parse_date(sub.get_one::<String>("from").unwrap())?;
            let end = parse_date(sub.get_one::<String>("to").unwrap())?;
            let window = ReportWindow::new(start, end)?;
            save_range(conn, team_id, &window)?;
            println!(
                "Reporting window set to {} ({} days)",
                window,
                window.days_in_period()
            );
        }
        Some(("show", _)) => match load_range(conn, team_id)? {
            Some(w) => println!("{} ({} days)", w, w.days_in_period()),
            None => println!(
                "No saved window; reports use {}",
                month_to_date(Utc::now().date_naive())
            ),
        },
        Some(("clear", _)) => {
            conn.execute("DELETE FROM date_ranges WHERE team_id=?1", params![team_id])?;
            println!("Cleared saved reporting window");
        }
        _ => {}
    }
    Ok(())
}

pub fn save_range(conn: &Connection, team_id: i64, window: &ReportWindow) -> Result<()> {
    conn.execute(
        "INSERT INTO date_ranges(team_id, start_date, end_date) VALUES (?1, ?2, ?3)
         ON CONFLICT(team_id) DO UPDATE SET start_date=excluded.start_date, end_date=excluded.end_date",
        params![team_id, window.start().to_string(), window.end().to_string()],
    )?;
    Ok(())
}

pub fn load_range(conn: &Connection, team_id: i64) -> Result<Option<ReportWindow>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT start_date, end_date FROM date_ranges WHERE team_id=?1",
            params![team_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((s, e)) = row else {
        return Ok(None);
    };
    let window = ReportWindow::new(parse_date(&s)?, parse_date(&e)?)
        .with_context(|| format!("Saved range for team {} is invalid", team_id))?;
    Ok(Some(window))
}

/// First of the month through `today`.
pub fn month_to_date(today: NaiveDate) -> ReportWindow {
    let start = today.with_day(1).unwrap_or(today);
    ReportWindow::new(start, today).unwrap_or_else(|_| ReportWindow::single_day(today))
}

/// Explicit `--from/--to` win, then the team's saved range, then month to date.
pub fn resolve_window(
    conn: &Connection,
    team_id: i64,
    sub: &clap::ArgMatches,
) -> Result<ReportWindow> {
    if let (Some(f), Some(t)) = (sub.get_one::<String>("from"), sub.get_one::<String>("to")) {
        return Ok(ReportWindow::new(parse_date(f)?, parse_date(t)?)?);
    }
    if let Some(w) = load_range(conn, team_id)? {
        debug!(team_id, window = %w, "using saved range");
        return Ok(w);
    }
    Ok(month_to_date(Utc::now().date_naive()))
}
