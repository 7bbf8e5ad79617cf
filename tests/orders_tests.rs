// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use profitclip::models::ReportWindow;
use profitclip::{cli, commands::orders, db};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute("INSERT INTO teams(name) VALUES('Acme')", []).unwrap();
    conn.execute(
        "INSERT INTO settings(key,value) VALUES('current_team','1')",
        [],
    )
    .unwrap();
    conn
}

fn run(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["profitclip", "order"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("order", m)) = matches.subcommand() {
        orders::handle(conn, m)
    } else {
        panic!("order command not parsed");
    }
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

fn order_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM orders", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn import_trims_path_and_skips_duplicate_references() {
    let mut conn = setup();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "date,total,reference\n2025-03-01,100.00,#1001\n2025-03-02,50.50,#1002\n2025-03-01,100.00,#1001\n2025-03-05,20.00,"
    )
    .unwrap();
    file.flush().unwrap();

    let padded = format!("  {}  ", file.path().to_str().unwrap());
    run(&mut conn, &["import", "--path", &padded]).unwrap();
    assert_eq!(order_count(&conn), 3);

    // re-importing the same file only adds the unreferenced row again
    run(&mut conn, &["import", "--path", &padded]).unwrap();
    assert_eq!(order_count(&conn), 4);
}

#[test]
fn import_is_all_or_nothing_on_bad_rows() {
    let mut conn = setup();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "date,total,reference\n2025-03-01,100.00,#1\n2025-03-02,lots,#2"
    )
    .unwrap();
    file.flush().unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let err = run(&mut conn, &["import", "--path", &path]).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid order total 'lots'"));
    assert_eq!(order_count(&conn), 0);
}

#[test]
fn add_rejects_duplicate_reference() {
    let mut conn = setup();
    run(
        &mut conn,
        &["add", "--date", "2025-03-01", "--total", "19.99", "--reference", "#7"],
    )
    .unwrap();
    assert!(
        run(
            &mut conn,
            &["add", "--date", "2025-03-02", "--total", "5", "--reference", "#7"],
        )
        .is_err()
    );
    assert_eq!(order_count(&conn), 1);
}

#[test]
fn stats_count_orders_and_revenue_inside_window() {
    let conn = setup();
    for (date, total) in [
        ("2025-02-28", "999"),
        ("2025-03-01", "10.25"),
        ("2025-03-15", "20"),
        ("2025-03-31", "5.75"),
        ("2025-04-01", "999"),
    ] {
        conn.execute(
            "INSERT INTO orders(team_id, date, total) VALUES (1, ?1, ?2)",
            [date, total],
        )
        .unwrap();
    }
    conn.execute("INSERT INTO teams(name) VALUES('Rival')", []).unwrap();
    conn.execute(
        "INSERT INTO orders(team_id, date, total) VALUES (2, '2025-03-10', '500')",
        [],
    )
    .unwrap();

    let window = ReportWindow::new(march(1), march(31)).unwrap();
    let stats = orders::order_stats(&conn, 1, &window).unwrap();
    assert_eq!(stats.orders, 3);
    assert_eq!(stats.revenue, Decimal::from_str_exact("36.00").unwrap());

    let one_day = orders::order_stats(&conn, 1, &ReportWindow::single_day(march(15))).unwrap();
    assert_eq!(one_day.orders, 1);
}

#[test]
fn query_orders_skips_unreadable_rows() {
    let conn = setup();
    conn.execute(
        "INSERT INTO orders(team_id, date, total) VALUES (1, '2025-03-02', 'refund?')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO orders(team_id, date, total) VALUES (1, '2025-03-03', '12')",
        [],
    )
    .unwrap();
    let rows = orders::query_orders(&conn, 1, None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, march(3));
}
