// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Team;
use crate::utils::{id_for_team, maybe_print_json, pretty_table, set_current_team};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            if name.is_empty() {
                return Err(anyhow!("Team name must not be empty"));
            }
            conn.execute("INSERT INTO teams(name) VALUES (?1)", params![name])?;
            let id = conn.last_insert_rowid();
            let has_current: Option<String> = conn
                .query_row(
                    "SELECT value FROM settings WHERE key='current_team'",
                    [],
                    |r| r.get(0),
                )
                .optional()?;
            if has_current.is_none() {
                set_current_team(conn, id)?;
                info!(team_id = id, "selected first team as current");
            }
            println!("Added team '{}'", name);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let teams = list_teams(conn)?;
            if !maybe_print_json(json_flag, jsonl_flag, &teams)? {
                let current = crate::utils::current_team(conn).ok();
                let rows = teams
                    .iter()
                    .map(|t| {
                        let marker = if Some(t.id) == current { "*" } else { "" };
                        vec![marker.to_string(), t.name.clone(), t.created_at.clone()]
                    })
                    .collect();
                println!("{}", pretty_table(&["", "Team", "Created"], rows));
            }
        }
        Some(("use", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_team(conn, name)?;
            set_current_team(conn, id)?;
            println!("Current team is now '{}'", name.trim());
        }
        _ => {}
    }
    Ok(())
}

pub fn list_teams(conn: &Connection) -> Result<Vec<Team>> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM teams ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(Team {
            id: r.get(0)?,
            name: r.get(1)?,
            created_at: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
