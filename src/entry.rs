// 📒 Entry Model - income, expense and budget lines
//
// The three kinds share one shape (category + amount + date) and differ in a
// handful of extra fields. `EntryKind` is the per-kind schema descriptor the
// store, the query engine and the facade are generic over.

use crate::dates::{format_date, parse_date};
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
    Budget,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Income, Kind::Expense, Kind::Budget];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
            Kind::Budget => "budget",
        }
    }

    /// Backing table, one per kind.
    pub fn table(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expenses",
            Kind::Budget => "budgets",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "incomes" => Ok(Kind::Income),
            "expense" | "expenses" => Ok(Kind::Expense),
            "budget" | "budgets" => Ok(Kind::Budget),
            other => Err(LedgerError::validation(format!(
                "unknown entry kind `{}` (expected income, expense or budget)",
                other
            ))),
        }
    }
}

// ============================================================================
// PAYMENT MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMode {
    Offline,
    Online,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 2] = [PaymentMode::Offline, PaymentMode::Online];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Offline => "Offline",
            PaymentMode::Online => "Online",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "offline" => Ok(PaymentMode::Offline),
            "online" => Ok(PaymentMode::Online),
            other => Err(LedgerError::validation(format!(
                "invalid payment mode `{}` (expected Offline or Online)",
                other
            ))),
        }
    }
}

// ============================================================================
// RAW FIELDS (input shape from forms, CSV rows, JSON bodies)
// ============================================================================

/// Canonical field name: lowercase, spaces and dashes as underscores.
/// "Payment Mode" and "payment-mode" both become `payment_mode`.
pub fn normalize_field(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Untyped field map handed to `EntryKind::from_fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fields(BTreeMap<String, String>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.0.insert(normalize_field(name), value.into());
        self
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&normalize_field(name)).map(String::as_str)
    }

    /// Present and non-blank, trimmed.
    pub fn required(&self, name: &str) -> Result<String> {
        match self.get(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(LedgerError::validation(format!("{} is required", name))),
        }
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.insert(name.as_ref(), value);
        }
        fields
    }
}

// JSON bodies carry numbers for amount/quantity; keep their textual form.
impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;
        let mut fields = Fields::new();
        for (name, value) in raw {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => continue,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "field `{}` must be a scalar, got {}",
                        name, other
                    )))
                }
            };
            fields.insert(&name, text);
        }
        Ok(fields)
    }
}

pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| LedgerError::validation(format!("amount `{}` is not a number", raw.trim())))?;
    ensure_positive_amount(amount)?;
    Ok(amount)
}

pub fn parse_quantity(raw: Option<&str>) -> Result<u32> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(1),
        Some(raw) => raw,
    };
    let quantity: u32 = raw.parse().map_err(|_| {
        LedgerError::validation(format!("quantity `{}` must be a positive whole number", raw))
    })?;
    ensure_positive_quantity(quantity)?;
    Ok(quantity)
}

/// Largest amount a single entry may count for (after quantity): 10^13.
/// Sums of accepted entries stay far below `Decimal::MAX`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_316_134_912, 2_328, 0, false, 0);

fn ensure_positive_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "amount must be greater than zero, got {}",
            amount
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::validation(format!(
            "amount {} exceeds the maximum of {}",
            amount, MAX_AMOUNT
        )));
    }
    Ok(())
}

fn ensure_positive_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(LedgerError::validation("quantity must be greater than zero"));
    }
    Ok(())
}

fn ensure_present(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::validation(format!("{} is required", name)));
    }
    // Stored text reads back trimmed, so padding would not survive a round trip.
    if value.trim() != value {
        return Err(LedgerError::validation(format!(
            "{} `{}` has leading or trailing whitespace",
            name, value
        )));
    }
    Ok(())
}

/// Amount as shown to users and matched by search: two decimals.
pub fn display_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

// ============================================================================
// SCHEMA DESCRIPTOR
// ============================================================================

/// Per-kind schema: field list, validation and the derived-amount rule.
///
/// Column names in `COLUMNS` double as table columns, CSV headers (after
/// `id`) and the keys accepted by `from_fields`.
pub trait EntryKind:
    Sized + Clone + fmt::Debug + PartialEq + Serialize + Send + Sync + 'static
{
    const KIND: Kind;
    const COLUMNS: &'static [&'static str];
    const SEARCHABLE: &'static [&'static str];

    /// Parse and validate raw input for this kind.
    fn from_fields(fields: &Fields) -> Result<Self>;

    /// Invariants every stored entry satisfies.
    fn validate(&self) -> Result<()>;

    /// Canonical text of one column (exact amount, ISO date).
    fn value(&self, column: &str) -> Option<String>;

    /// Grouping key for category rollups (income groups by type).
    fn category(&self) -> &str;

    fn date(&self) -> NaiveDate;

    /// Amount counted by every aggregate.
    fn effective_amount(&self) -> Decimal;

    /// Text compared by substring search.
    fn search_text(&self, column: &str) -> Option<String> {
        if column == "amount" {
            return self.value("amount").and_then(|raw| {
                Decimal::from_str(&raw).ok().map(display_amount)
            });
        }
        self.value(column)
    }

    /// All columns in order, for tables and exports.
    fn row(&self) -> Vec<String> {
        Self::COLUMNS
            .iter()
            .map(|column| self.value(column).unwrap_or_default())
            .collect()
    }
}

/// A stored entry: the entry value plus the id the store assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<E> {
    pub id: i64,
    #[serde(flatten)]
    pub entry: E,
}

impl<E: EntryKind> Record<E> {
    pub fn new(id: i64, entry: E) -> Self {
        Record { id, entry }
    }
}

// ============================================================================
// INCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub source: String,
    #[serde(rename = "type")]
    pub income_type: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl EntryKind for Income {
    const KIND: Kind = Kind::Income;
    const COLUMNS: &'static [&'static str] = &["source", "type", "amount", "date"];
    const SEARCHABLE: &'static [&'static str] = &["source", "type", "amount", "date"];

    fn from_fields(fields: &Fields) -> Result<Self> {
        let income = Income {
            source: fields.required("source")?,
            income_type: fields.required("type")?,
            amount: parse_amount(&fields.required("amount")?)?,
            date: parse_date(&fields.required("date")?)?,
        };
        income.validate()?;
        Ok(income)
    }

    fn validate(&self) -> Result<()> {
        ensure_present("source", &self.source)?;
        ensure_present("type", &self.income_type)?;
        ensure_positive_amount(self.amount)
    }

    fn value(&self, column: &str) -> Option<String> {
        match column {
            "source" => Some(self.source.clone()),
            "type" => Some(self.income_type.clone()),
            "amount" => Some(self.amount.to_string()),
            "date" => Some(format_date(self.date)),
            _ => None,
        }
    }

    fn category(&self) -> &str {
        &self.income_type
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn effective_amount(&self) -> Decimal {
        self.amount
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub category: String,
    pub item: String,
    pub amount: Decimal,
    pub quantity: u32,
    pub date: NaiveDate,
    pub payment_mode: PaymentMode,
}

impl EntryKind for Expense {
    const KIND: Kind = Kind::Expense;
    const COLUMNS: &'static [&'static str] =
        &["category", "item", "amount", "quantity", "date", "payment_mode"];
    const SEARCHABLE: &'static [&'static str] =
        &["item", "category", "payment_mode", "date", "amount"];

    fn from_fields(fields: &Fields) -> Result<Self> {
        let expense = Expense {
            category: fields.required("category")?,
            item: fields.required("item")?,
            amount: parse_amount(&fields.required("amount")?)?,
            quantity: parse_quantity(fields.get("quantity"))?,
            date: parse_date(&fields.required("date")?)?,
            payment_mode: fields.required("payment_mode")?.parse()?,
        };
        expense.validate()?;
        Ok(expense)
    }

    fn validate(&self) -> Result<()> {
        ensure_present("category", &self.category)?;
        ensure_present("item", &self.item)?;
        ensure_positive_amount(self.amount)?;
        ensure_positive_quantity(self.quantity)?;
        match self.amount.checked_mul(Decimal::from(self.quantity)) {
            Some(line_total) if line_total <= MAX_AMOUNT => Ok(()),
            _ => Err(LedgerError::validation(format!(
                "amount {} × quantity {} exceeds the maximum of {}",
                self.amount, self.quantity, MAX_AMOUNT
            ))),
        }
    }

    fn value(&self, column: &str) -> Option<String> {
        match column {
            "category" => Some(self.category.clone()),
            "item" => Some(self.item.clone()),
            "amount" => Some(self.amount.to_string()),
            "quantity" => Some(self.quantity.to_string()),
            "date" => Some(format_date(self.date)),
            "payment_mode" => Some(self.payment_mode.to_string()),
            _ => None,
        }
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn effective_amount(&self) -> Decimal {
        self.amount.saturating_mul(Decimal::from(self.quantity))
    }
}

// ============================================================================
// BUDGET
// ============================================================================

/// Planned allocation for a category in the month of `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl EntryKind for Budget {
    const KIND: Kind = Kind::Budget;
    const COLUMNS: &'static [&'static str] = &["category", "amount", "date"];
    const SEARCHABLE: &'static [&'static str] = &["category", "amount", "date"];

    fn from_fields(fields: &Fields) -> Result<Self> {
        let budget = Budget {
            category: fields.required("category")?,
            amount: parse_amount(&fields.required("amount")?)?,
            date: parse_date(&fields.required("date")?)?,
        };
        budget.validate()?;
        Ok(budget)
    }

    fn validate(&self) -> Result<()> {
        ensure_present("category", &self.category)?;
        ensure_positive_amount(self.amount)
    }

    fn value(&self, column: &str) -> Option<String> {
        match column {
            "category" => Some(self.category.clone()),
            "amount" => Some(self.amount.to_string()),
            "date" => Some(format_date(self.date)),
            _ => None,
        }
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn effective_amount(&self) -> Decimal {
        self.amount
    }
}
