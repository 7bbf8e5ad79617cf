// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Validation failures raised when expenses, orders, or windows are written
/// or selected. The amortization math itself never returns these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfitError {
    #[error("Invalid window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Unknown expense category '{0}'")]
    UnknownCategory(String),

    #[error("Unknown frequency '{0}' (use monthly|yearly|per_order|one_time)")]
    UnknownFrequency(String),

    #[error("Unknown amount type '{0}' (use dollar|percentage)")]
    UnknownAmountType(String),

    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("Amount must not be negative, got {0}")]
    NegativeAmount(Decimal),

    #[error("One-time expense '{0}' needs a transaction date")]
    MissingTransactionDate(String),

    #[error("No current team; run `profitclip team use --name <team>`")]
    NoCurrentTeam,
}
