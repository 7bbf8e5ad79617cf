// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use profitclip::models::{AmountType, ExpenseCategory, Frequency};
use profitclip::{cli, commands::expenses, db};
use rusqlite::{Connection, params};

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

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["profitclip", "expense"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("expense", m)) = matches.subcommand() {
        expenses::handle(conn, m)
    } else {
        panic!("expense command not parsed");
    }
}

#[test]
fn add_trims_and_normalizes_fields() {
    let conn = setup();
    run(
        &conn,
        &[
            "add",
            "--name",
            " Klaviyo ",
            "--category",
            "software",
            "--amount",
            " 49.99 ",
            "--frequency",
            "Monthly",
            "--by",
            "alice",
        ],
    )
    .unwrap();

    let (name, category, amount, amount_type, frequency, by): (
        String,
        String,
        String,
        String,
        String,
        String,
    ) = conn
        .query_row(
            "SELECT name, category, amount, amount_type, frequency, created_by FROM expenses",
            [],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                ))
            },
        )
        .unwrap();
    assert_eq!(name, "Klaviyo");
    assert_eq!(category, "Software");
    assert_eq!(amount, "49.99");
    assert_eq!(amount_type, "dollar");
    assert_eq!(frequency, "monthly");
    assert_eq!(by, "alice");
}

#[test]
fn add_percentage_expense() {
    let conn = setup();
    run(
        &conn,
        &[
            "add",
            "--name",
            "Sales tax",
            "--category",
            "Taxes",
            "--amount",
            "7.5",
            "--amount-type",
            "percentage",
            "--frequency",
            "per_order",
        ],
    )
    .unwrap();
    let rows = expenses::query_expenses(&conn, 1, None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount_type, AmountType::Percentage);
    assert_eq!(rows[0].frequency, Frequency::PerOrder);
}

#[test]
fn add_one_time_requires_date() {
    let conn = setup();
    let err = run(
        &conn,
        &[
            "add",
            "--name",
            "Trade show",
            "--category",
            "Marketing",
            "--amount",
            "1500",
            "--frequency",
            "one_time",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("needs a transaction date"));

    run(
        &conn,
        &[
            "add",
            "--name",
            "Trade show",
            "--category",
            "Marketing",
            "--amount",
            "1500",
            "--frequency",
            "one_time",
            "--date",
            "2025-04-12",
        ],
    )
    .unwrap();
    let rows = expenses::query_expenses(&conn, 1, None).unwrap();
    assert_eq!(
        rows[0].transaction_date,
        chrono::NaiveDate::from_ymd_opt(2025, 4, 12)
    );
}

#[test]
fn add_rejects_negative_amounts_and_unknown_values() {
    let conn = setup();
    let base = ["add", "--name", "X", "--frequency", "monthly"];

    let mut args = base.to_vec();
    args.extend(["--category", "Rent", "--amount=-10"]);
    let err = run(&conn, &args).unwrap_err();
    assert!(err.to_string().contains("must not be negative"));

    let mut args = base.to_vec();
    args.extend(["--category", "Snacks", "--amount", "10"]);
    let err = run(&conn, &args).unwrap_err();
    assert!(err.to_string().contains("Unknown expense category"));

    let err = run(
        &conn,
        &[
            "add",
            "--name",
            "X",
            "--category",
            "Rent",
            "--amount",
            "10",
            "--frequency",
            "fortnightly",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("Unknown frequency"));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM expenses", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn add_without_current_team_fails() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let err = run(
        &conn,
        &[
            "add",
            "--name",
            "X",
            "--category",
            "Rent",
            "--amount",
            "10",
            "--frequency",
            "monthly",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("No current team"));
}

#[test]
fn edit_updates_only_given_fields() {
    let conn = setup();
    conn.execute(
        "INSERT INTO expenses(team_id, name, category, amount, frequency, created_by, updated_at)
         VALUES (1, 'Warehouse', 'Rent', '2000', 'monthly', 'bob', '2000-01-01 00:00:00')",
        [],
    )
    .unwrap();
    run(
        &conn,
        &["edit", "--id", " 1 ", "--amount", "24000", "--frequency", "yearly"],
    )
    .unwrap();

    let e = expenses::get_expense(&conn, 1, 1).unwrap().unwrap();
    assert_eq!(e.name, "Warehouse");
    assert_eq!(e.category, ExpenseCategory::Rent);
    assert_eq!(e.amount, "24000");
    assert_eq!(e.frequency, Frequency::Yearly);
    assert_eq!(e.created_by, "bob");
    assert_ne!(e.updated_at, "2000-01-01 00:00:00");
}

#[test]
fn edit_to_one_time_needs_a_date() {
    let conn = setup();
    conn.execute(
        "INSERT INTO expenses(team_id, name, category, amount, frequency, created_by)
         VALUES (1, 'Audit', 'Bookkeeper', '900', 'yearly', 'bob')",
        [],
    )
    .unwrap();
    let err = run(&conn, &["edit", "--id", "1", "--frequency", "one_time"]).unwrap_err();
    assert!(err.to_string().contains("needs a transaction date"));

    run(
        &conn,
        &["edit", "--id", "1", "--frequency", "one_time", "--date", "2025-06-30"],
    )
    .unwrap();
    let e = expenses::get_expense(&conn, 1, 1).unwrap().unwrap();
    assert_eq!(e.frequency, Frequency::OneTime);
}

#[test]
fn edit_drops_date_when_leaving_one_time_or_on_clear() {
    let conn = setup();
    conn.execute(
        "INSERT INTO expenses(team_id, name, category, amount, frequency, transaction_date, created_by)
         VALUES (1, 'Booth', 'Marketing', '300', 'one_time', '2025-02-10', 'bob')",
        [],
    )
    .unwrap();
    run(&conn, &["edit", "--id", "1", "--frequency", "monthly"]).unwrap();
    let e = expenses::get_expense(&conn, 1, 1).unwrap().unwrap();
    assert_eq!(e.frequency, Frequency::Monthly);
    assert!(e.transaction_date.is_none());

    run(&conn, &["edit", "--id", "1", "--date", "2025-02-11"]).unwrap();
    assert!(
        expenses::get_expense(&conn, 1, 1)
            .unwrap()
            .unwrap()
            .transaction_date
            .is_some()
    );
    run(&conn, &["edit", "--id", "1", "--clear-date"]).unwrap();
    let e = expenses::get_expense(&conn, 1, 1).unwrap().unwrap();
    assert!(e.transaction_date.is_none());

    // a one-time row cannot lose its date
    run(
        &conn,
        &["edit", "--id", "1", "--frequency", "one_time", "--date", "2025-03-01"],
    )
    .unwrap();
    let err = run(&conn, &["edit", "--id", "1", "--clear-date"]).unwrap_err();
    assert!(err.to_string().contains("needs a transaction date"));
}

#[test]
fn rm_is_scoped_to_current_team() {
    let conn = setup();
    conn.execute("INSERT INTO teams(name) VALUES('Other Co')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO expenses(team_id, name, category, amount, frequency, created_by)
         VALUES (2, 'Not ours', 'Rent', '10', 'monthly', 'eve')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO expenses(team_id, name, category, amount, frequency, created_by)
         VALUES (1, 'Ours', 'Rent', '10', 'monthly', 'eve')",
        [],
    )
    .unwrap();

    assert!(run(&conn, &["rm", "--id", "1"]).is_err());
    run(&conn, &["rm", "--id", "2"]).unwrap();

    let remaining: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT id FROM expenses ORDER BY id").unwrap();
        stmt.query_map([], |r| r.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    };
    assert_eq!(remaining, vec![1]);
}

#[test]
fn query_keeps_malformed_rows_readable() {
    let conn = setup();
    conn.execute(
        "INSERT INTO expenses(team_id, name, category, amount, amount_type, frequency, transaction_date, created_by)
         VALUES (1, 'Legacy', 'Snacks', 'n/a', 'bitcoin', 'weekly', 'soon', 'import')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO expenses(team_id, name, category, amount, frequency, created_by)
         VALUES (1, 'Numeric', 'Shipping', ?1, 'monthly', 'import')",
        params![12.5_f64],
    )
    .unwrap();

    let rows = expenses::query_expenses(&conn, 1, None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category, ExpenseCategory::Other);
    assert_eq!(rows[0].amount_type, AmountType::Dollar);
    assert_eq!(rows[0].frequency, Frequency::Other("weekly".into()));
    assert!(rows[0].transaction_date.is_none());
    assert!(rows[0].parsed_amount().is_err());
    assert_eq!(rows[1].amount, "12.5");

    let shipping =
        expenses::query_expenses(&conn, 1, Some(ExpenseCategory::Shipping)).unwrap();
    assert_eq!(shipping.len(), 1);
    assert_eq!(shipping[0].name, "Numeric");
}
