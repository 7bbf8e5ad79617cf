// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ProfitError;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    #[serde(rename = "3PL")]
    ThirdPartyLogistics,
    Bookkeeper,
    Donations,
    Marketing,
    Software,
    #[serde(rename = "Payment Processing")]
    PaymentProcessing,
    Rent,
    Salaries,
    Shipping,
    Taxes,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThirdPartyLogistics => "3PL",
            Self::Bookkeeper => "Bookkeeper",
            Self::Donations => "Donations",
            Self::Marketing => "Marketing",
            Self::Software => "Software",
            Self::PaymentProcessing => "Payment Processing",
            Self::Rent => "Rent",
            Self::Salaries => "Salaries",
            Self::Shipping => "Shipping",
            Self::Taxes => "Taxes",
            Self::Other => "Other",
        }
    }

    /// Lenient read of a stored category; unrecognized text buckets as `Other`.
    pub fn from_stored(s: &str) -> Self {
        s.parse().unwrap_or(Self::Other)
    }
}

impl FromStr for ExpenseCategory {
    type Err = ProfitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "3pl" | "thirdpartylogistics" => Ok(Self::ThirdPartyLogistics),
            "bookkeeper" | "bookkeeping" => Ok(Self::Bookkeeper),
            "donations" | "donation" => Ok(Self::Donations),
            "marketing" => Ok(Self::Marketing),
            "software" => Ok(Self::Software),
            "paymentprocessing" => Ok(Self::PaymentProcessing),
            "rent" => Ok(Self::Rent),
            "salaries" | "salary" => Ok(Self::Salaries),
            "shipping" => Ok(Self::Shipping),
            "taxes" | "tax" => Ok(Self::Taxes),
            "other" => Ok(Self::Other),
            _ => Err(ProfitError::UnknownCategory(s.trim().to_string())),
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountType {
    Dollar,
    Percentage,
}

impl AmountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dollar => "dollar",
            Self::Percentage => "percentage",
        }
    }
}

impl FromStr for AmountType {
    type Err = ProfitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dollar" | "$" => Ok(Self::Dollar),
            "percentage" | "percent" | "%" => Ok(Self::Percentage),
            _ => Err(ProfitError::UnknownAmountType(s.trim().to_string())),
        }
    }
}

impl fmt::Display for AmountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an expense recurs. Stored text that matches none of the known
/// frequencies is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Monthly,
    Yearly,
    PerOrder,
    OneTime,
    Other(String),
}

impl Frequency {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::PerOrder => "per_order",
            Self::OneTime => "one_time",
            Self::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl FromStr for Frequency {
    type Err = ProfitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Frequency::from(s.to_string()) {
            Frequency::Other(raw) => Err(ProfitError::UnknownFrequency(raw)),
            known => Ok(known),
        }
    }
}

impl From<String> for Frequency {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "monthly" => Self::Monthly,
            "yearly" | "annual" | "annually" => Self::Yearly,
            "per_order" | "perorder" => Self::PerOrder,
            "one_time" | "onetime" => Self::OneTime,
            _ => Self::Other(s.trim().to_string()),
        }
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.as_str().to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub team_id: i64,
    pub name: String,
    pub category: ExpenseCategory,
    /// Amount exactly as stored. Kept as text so malformed values survive the
    /// read and can be reported instead of failing the whole query.
    pub amount: String,
    pub amount_type: AmountType,
    pub frequency: Frequency,
    pub transaction_date: Option<NaiveDate>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Expense {
    pub fn parsed_amount(&self) -> Result<Decimal, ProfitError> {
        let raw = self.amount.trim();
        let value = raw
            .parse::<Decimal>()
            .map_err(|_| ProfitError::InvalidAmount(raw.to_string()))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ProfitError::NegativeAmount(value));
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustedExpense {
    #[serde(flatten)]
    pub expense: Expense,
    pub adjusted_amount: Decimal,
    pub percentage_amount: Decimal,
    /// Stored amount was unusable and contributed zero.
    pub amount_coerced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub adjusted_amount: Decimal,
    pub percentage_amount: Decimal,
    pub expense_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyExpenses {
    pub date: NaiveDate,
    pub by_category: BTreeMap<ExpenseCategory, Decimal>,
    pub total: Decimal,
}

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReportWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ProfitError> {
        if start > end {
            return Err(ProfitError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days_in_period(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.days_in_period()).map(move |i| start + Duration::days(i))
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub team_id: i64,
    pub date: NaiveDate,
    pub total: Decimal,
    pub reference: Option<String>,
}
