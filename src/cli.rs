// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn window_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("from")
            .long("from")
            .requires("to")
            .help("Window start YYYY-MM-DD (defaults to the team's saved range)"),
    )
    .arg(
        Arg::new("to")
            .long("to")
            .requires("from")
            .help("Window end YYYY-MM-DD, inclusive"),
    )
}

fn report_cmd(name: &'static str, about: &'static str) -> Command {
    let cmd = Command::new(name)
        .about(about)
        .arg(
            Arg::new("orders")
                .long("orders")
                .value_parser(value_parser!(u64))
                .help("Override the order count for the window"),
        )
        .arg(
            Arg::new("revenue")
                .long("revenue")
                .help("Override the reference revenue for the window"),
        );
    json_args(window_args(cmd))
}

fn expense_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(Arg::new("name").long("name").required(required))
        .arg(
            Arg::new("category")
                .long("category")
                .required(required)
                .help("3PL, Bookkeeper, Donations, Marketing, Software, Payment Processing, Rent, Salaries, Shipping, Taxes, Other"),
        )
        .arg(Arg::new("amount").long("amount").required(required))
        .arg(
            Arg::new("amount_type")
                .long("amount-type")
                .help("dollar (default) or percentage of revenue"),
        )
        .arg(
            Arg::new("frequency")
                .long("frequency")
                .required(required)
                .help("monthly, yearly, per_order, one_time"),
        )
        .arg(
            Arg::new("date")
                .long("date")
                .help("Transaction date YYYY-MM-DD (required for one_time)"),
        )
}

pub fn build_cli() -> Command {
    Command::new("profitclip")
        .version(crate_version!())
        .about("Team expense amortization, order tracking, and PnL reporting")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging (RUST_LOG takes precedence)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("team")
                .about("Manage teams")
                .subcommand(Command::new("add").arg(Arg::new("name").long("name").required(true)))
                .subcommand(json_args(Command::new("list")))
                .subcommand(
                    Command::new("use")
                        .about("Select the current team")
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("expense")
                .about("Record and manage business expenses")
                .subcommand(expense_fields(
                    Command::new("add").arg(
                        Arg::new("by")
                            .long("by")
                            .help("Creator label (defaults to $USER)"),
                    ),
                    true,
                ))
                .subcommand(json_args(
                    Command::new("list").arg(Arg::new("category").long("category")),
                ))
                .subcommand(expense_fields(
                    Command::new("edit")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(
                            Arg::new("clear_date")
                                .long("clear-date")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("date")
                                .help("Remove the transaction date"),
                        ),
                    false,
                ))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true))),
        )
        .subcommand(
            Command::new("order")
                .about("Orders feeding per-order expenses and revenue")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("total").long("total").required(true))
                        .arg(Arg::new("reference").long("reference")),
                )
                .subcommand(
                    Command::new("import")
                        .about("Import orders from CSV (date,total,reference)")
                        .arg(Arg::new("path").long("path").required(true)),
                )
                .subcommand(json_args(window_args(
                    Command::new("list").arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize)),
                    ),
                ))),
        )
        .subcommand(
            Command::new("range")
                .about("The team's saved reporting window")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true)),
                )
                .subcommand(Command::new("show"))
                .subcommand(Command::new("clear")),
        )
        .subcommand(
            Command::new("report")
                .about("Amortized expense and PnL reports")
                .subcommand(report_cmd(
                    "expenses",
                    "Adjusted amount and share per expense",
                ))
                .subcommand(report_cmd("by-category", "Adjusted amounts per category"))
                .subcommand(report_cmd("daily", "Per-day expense matrix"))
                .subcommand(report_cmd("pnl", "Revenue, expenses, and profit")),
        )
        .subcommand(
            Command::new("export")
                .about("Export adjusted expenses")
                .subcommand(window_args(
                    Command::new("expenses")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .required(true)
                                .help("csv or json"),
                        )
                        .arg(Arg::new("out").long("out").required(true))
                        .arg(
                            Arg::new("orders")
                                .long("orders")
                                .value_parser(value_parser!(u64)),
                        )
                        .arg(Arg::new("revenue").long("revenue")),
                )),
        )
        .subcommand(Command::new("doctor").about("Find rows the reports would count as zero"))
}
