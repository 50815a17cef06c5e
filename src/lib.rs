// Ledger Keeper - Core Library
// Entry store, query and aggregation engines behind per-kind ledger facades.
// Exposed for the CLI, the API server and tests.

pub mod error;
pub mod dates;
pub mod entry;
pub mod catalog;
pub mod db;
pub mod query;
pub mod aggregate;
pub mod ledger;
pub mod transfer;
pub mod config;
pub mod logging;

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use error::{LedgerError, Result};
pub use dates::{format_date, parse_date, MonthKey};
pub use entry::{Budget, EntryKind, Expense, Fields, Income, Kind, PaymentMode, Record};
pub use db::Store;
pub use aggregate::{
    add_up, budget_status, ranked, sum_by_category, sum_by_month, total,
    BudgetLine, CategoryTotals, MonthlyTotals,
};
pub use ledger::{
    BudgetLedger, ExpenseLedger, IncomeLedger, Ledger, Ledgers, Listing, Report, ReportScope,
};
pub use transfer::{export_csv, import_csv, ImportSummary, RejectedRow};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
