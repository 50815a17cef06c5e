// 🧾 Ledger Facade
// Single entry point for the presentation layer. One generic facade,
// instantiated per kind; it holds nothing but a handle to the store.

use crate::aggregate::{self, BudgetLine, CategoryTotals, MonthlyTotals};
use crate::dates::MonthKey;
use crate::db::Store;
use crate::entry::{Budget, EntryKind, Expense, Fields, Income, Kind, Record};
use crate::error::{LedgerError, Result};
use crate::query;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// REPORT SCOPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportScope {
    AllTime,
    CurrentMonth,
    Month(MonthKey),
}

impl ReportScope {
    /// The month this scope narrows to, if any, relative to `today`.
    pub fn month(&self, today: NaiveDate) -> Option<MonthKey> {
        match self {
            ReportScope::AllTime => None,
            ReportScope::CurrentMonth => Some(MonthKey::of(today)),
            ReportScope::Month(month) => Some(*month),
        }
    }
}

impl FromStr for ReportScope {
    type Err = LedgerError;

    /// `all`, `current`, or a month token.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" | "all-time" => Ok(ReportScope::AllTime),
            "current" | "current-month" | "this-month" => Ok(ReportScope::CurrentMonth),
            token => MonthKey::parse(token).map(ReportScope::Month),
        }
    }
}

impl fmt::Display for ReportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportScope::AllTime => f.write_str("all-time"),
            ReportScope::CurrentMonth => f.write_str("current-month"),
            ReportScope::Month(month) => write!(f, "{}", month),
        }
    }
}

/// Aggregates for one kind over one scope, ready for charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kind: Kind,
    /// Resolved month, `None` for all-time.
    pub month: Option<MonthKey>,
    pub entry_count: usize,
    pub by_category: CategoryTotals,
    pub by_month: MonthlyTotals,
    pub total: Decimal,
}

impl Report {
    pub fn build<K: EntryKind>(records: &[Record<K>], month: Option<MonthKey>) -> Self {
        Report {
            kind: K::KIND,
            month,
            entry_count: records.len(),
            by_category: aggregate::sum_by_category(records),
            by_month: aggregate::sum_by_month(records),
            total: aggregate::total(records),
        }
    }
}

/// A read result for display. Storage failures become an empty list plus a
/// warning so the view can still render.
#[derive(Debug, Clone, Serialize)]
pub struct Listing<K> {
    pub entries: Vec<Record<K>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<K: EntryKind> Listing<K> {
    pub fn from_result(result: Result<Vec<Record<K>>>) -> Result<Self> {
        match result {
            Ok(entries) => Ok(Listing {
                entries,
                warning: None,
            }),
            Err(err) if err.is_storage() => {
                warn!(kind = %K::KIND, error = %err, "read failed, showing empty list");
                Ok(Listing {
                    entries: Vec::new(),
                    warning: Some(err.to_string()),
                })
            }
            Err(err) => Err(err),
        }
    }
}

// ============================================================================
// FACADE
// ============================================================================

pub struct Ledger<K> {
    store: Arc<Store>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for Ledger<K> {
    fn clone(&self) -> Self {
        Ledger {
            store: Arc::clone(&self.store),
            _kind: PhantomData,
        }
    }
}

pub type IncomeLedger = Ledger<Income>;
pub type ExpenseLedger = Ledger<Expense>;
pub type BudgetLedger = Ledger<Budget>;

impl<K: EntryKind> Ledger<K> {
    pub fn new(store: Arc<Store>) -> Self {
        Ledger {
            store,
            _kind: PhantomData,
        }
    }

    pub fn kind(&self) -> Kind {
        K::KIND
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Validate raw input for this kind and store it. Views built before the
    /// call are stale once this returns.
    pub fn add_entry(&self, fields: &Fields) -> Result<i64> {
        let entry = K::from_fields(fields)?;
        self.add(entry)
    }

    pub fn add(&self, entry: K) -> Result<i64> {
        self.store.add(&entry)
    }

    pub fn remove_entry(&self, id: i64) -> Result<()> {
        self.store.delete::<K>(id)
    }

    pub fn get(&self, id: i64) -> Result<Record<K>> {
        self.store.get::<K>(id)
    }

    pub fn all(&self) -> Result<Vec<Record<K>>> {
        self.store.all::<K>()
    }

    /// `all()` for display: storage failures degrade to an empty listing.
    pub fn listing(&self) -> Result<Listing<K>> {
        Listing::from_result(self.all())
    }

    pub fn count(&self) -> Result<i64> {
        self.store.count::<K>()
    }

    pub fn search(&self, field: &str, value: &str) -> Result<Vec<Record<K>>> {
        // Reject bad input before touching storage.
        query::searchable_field::<K>(field)?;
        if value.trim().is_empty() {
            return Err(LedgerError::validation("search value cannot be empty"));
        }
        query::filter(&self.all()?, field, value)
    }

    pub fn by_month(&self, token: &str) -> Result<Vec<Record<K>>> {
        let month = MonthKey::parse(token)?;
        Ok(query::in_month(&self.all()?, month))
    }

    /// Entries in scope, with the month it resolved to.
    pub fn entries_in(&self, scope: ReportScope, today: NaiveDate) -> Result<(Option<MonthKey>, Vec<Record<K>>)> {
        let month = scope.month(today);
        let records = self.all()?;
        let records = match month {
            Some(month) => query::in_month(&records, month),
            None => records,
        };
        Ok((month, records))
    }

    pub fn report(&self, scope: ReportScope) -> Result<Report> {
        self.report_on(scope, Local::now().date_naive())
    }

    /// `report` with an explicit reference date for the current month.
    pub fn report_on(&self, scope: ReportScope, today: NaiveDate) -> Result<Report> {
        let (month, records) = self.entries_in(scope, today)?;
        let report = Report::build(&records, month);
        info!(
            kind = %K::KIND,
            scope = %scope,
            entries = report.entry_count,
            total = %report.total,
            "report built"
        );
        Ok(report)
    }
}

/// The three per-kind facades over one shared store.
#[derive(Clone)]
pub struct Ledgers {
    pub income: IncomeLedger,
    pub expenses: ExpenseLedger,
    pub budgets: BudgetLedger,
}

impl Ledgers {
    pub fn new(store: Arc<Store>) -> Self {
        Ledgers {
            income: Ledger::new(Arc::clone(&store)),
            expenses: Ledger::new(Arc::clone(&store)),
            budgets: Ledger::new(store),
        }
    }

    /// Planned budgets against actual expenses for the scope.
    pub fn budget_status(&self, scope: ReportScope) -> Result<Vec<BudgetLine>> {
        self.budget_status_on(scope, Local::now().date_naive())
    }

    pub fn budget_status_on(&self, scope: ReportScope, today: NaiveDate) -> Result<Vec<BudgetLine>> {
        let (_, budgets) = self.budgets.entries_in(scope, today)?;
        let (_, expenses) = self.expenses.entries_in(scope, today)?;
        Ok(aggregate::budget_status(
            &aggregate::sum_by_category(&budgets),
            &aggregate::sum_by_category(&expenses),
        ))
    }
}
