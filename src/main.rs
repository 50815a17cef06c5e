use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_keeper::catalog::{is_suggested, suggested_categories};
use ledger_keeper::entry::display_amount;
use ledger_keeper::{
    add_up, config::Config, logging, ranked, EntryKind, Fields, Kind, Ledger, Ledgers, ReportScope,
    Record, Report, Store,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "ledger-keeper")]
#[command(version, about = "Track income, expenses and budgets in a local SQLite ledger")]
struct Cli {
    /// Config file (JSON). Falls back to `LEDGER_KEEPER_CONFIG`, then the data dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the configured path.
    #[arg(long, global = true, env = "LEDGER_KEEPER_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add an entry: `add expense -f category=Groceries -f item=Milk ...`
    Add {
        kind: Kind,
        #[arg(short, long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Remove an entry by id
    Rm { kind: Kind, id: i64 },
    /// List entries, optionally for one month (YYYY-MM or MM-YYYY)
    List {
        kind: Kind,
        #[arg(long)]
        month: Option<String>,
    },
    /// Case-insensitive substring search on one field
    Search { kind: Kind, field: String, value: String },
    /// Category and monthly totals
    Report {
        kind: Kind,
        #[arg(long, default_value = "all")]
        scope: ReportScope,
    },
    /// Planned budgets against actual expenses
    BudgetStatus {
        #[arg(long, default_value = "current")]
        scope: ReportScope,
    },
    /// Write all entries of a kind to CSV
    Export { kind: Kind, file: PathBuf },
    /// Add entries from a CSV file; invalid rows are skipped and reported
    Import { kind: Kind, file: PathBuf },
    /// Suggested categories (expense/budget) or income types
    Categories { kind: Kind },
    /// Interactive viewer
    #[cfg(feature = "tui")]
    Tui { kind: Kind },
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", raw))
}

// Bind `$ledger` to the facade for `$kind` and evaluate `$body` with it.
macro_rules! with_ledger {
    ($ledgers:expr, $kind:expr, |$ledger:ident| $body:expr) => {
        match $kind {
            Kind::Income => {
                let $ledger = &$ledgers.income;
                $body
            }
            Kind::Expense => {
                let $ledger = &$ledgers.expenses;
                $body
            }
            Kind::Budget => {
                let $ledger = &$ledgers.budgets;
                $body
            }
        }
    };
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    logging::init_tracing(&config.log_filter);

    config.ensure_database_dir()?;
    let store = Store::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    let ledgers = Ledgers::new(Arc::new(store));

    match cli.command {
        Command::Add { kind, fields } => {
            let fields: Fields = fields.into_iter().collect();
            let id = with_ledger!(ledgers, kind, |ledger| ledger.add_entry(&fields))?;
            println!("✓ Added {} #{}", kind, id);

            let key = if kind == Kind::Income { "type" } else { "category" };
            if let Some(category) = fields.get(key).filter(|c| !is_suggested(kind, c)) {
                println!("  note: `{}` is a custom category (see `categories {}`)", category, kind);
            }
        }
        Command::Rm { kind, id } => {
            with_ledger!(ledgers, kind, |ledger| ledger.remove_entry(id))?;
            println!("✓ Removed {} #{}", kind, id);
        }
        Command::List { kind, month } => {
            with_ledger!(ledgers, kind, |ledger| list(ledger, month.as_deref()))?
        }
        Command::Search { kind, field, value } => with_ledger!(ledgers, kind, |ledger| {
            print_records(&ledger.search(&field, &value)?)?;
        }),
        Command::Report { kind, scope } => {
            let report = with_ledger!(ledgers, kind, |ledger| ledger.report(scope))?;
            print_report(&report, scope);
        }
        Command::BudgetStatus { scope } => budget_status(&ledgers, scope)?,
        Command::Export { kind, file } => {
            let out = File::create(&file)
                .with_context(|| format!("Failed to create {}", file.display()))?;
            let rows = with_ledger!(ledgers, kind, |ledger| {
                ledger_keeper::export_csv(ledger, BufWriter::new(out))
            })?;
            println!("✓ Exported {} {} entries to {}", rows, kind, file.display());
        }
        Command::Import { kind, file } => {
            let input = File::open(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let summary = with_ledger!(ledgers, kind, |ledger| {
                ledger_keeper::import_csv(ledger, BufReader::new(input))
            })?;
            println!("✓ Imported {} {} entries", summary.imported_count(), kind);
            for rejected in &summary.rejected {
                println!("  ✗ line {}: {}", rejected.line, rejected.reason);
            }
        }
        Command::Categories { kind } => {
            for name in suggested_categories(kind) {
                println!("{}", name);
            }
        }
        #[cfg(feature = "tui")]
        Command::Tui { kind } => with_ledger!(ledgers, kind, |ledger| {
            let mut app = ledger_keeper::ui::App::new(ledger.clone());
            ledger_keeper::ui::run_ui(&mut app)?;
        }),
    }

    Ok(())
}

fn list<K: EntryKind>(ledger: &Ledger<K>, month: Option<&str>) -> Result<()> {
    if let Some(token) = month {
        print_records(&ledger.by_month(token)?)?;
        return Ok(());
    }

    let listing = ledger.listing()?;
    if let Some(warning) = &listing.warning {
        eprintln!("⚠️  {}", warning);
    }
    print_records(&listing.entries)
}

fn print_records<K: EntryKind>(records: &[Record<K>]) -> Result<()> {
    let mut table = io::stdout().lock();
    write_records(&mut table, records).context("Failed to write entries")
}

fn write_records<K: EntryKind, W: io::Write>(out: &mut W, records: &[Record<K>]) -> io::Result<()> {
    let mut header = format!("{:>5}", "id");
    for column in K::COLUMNS {
        header.push_str(&format!("  {:<16}", column));
    }
    writeln!(out, "{}", header.trim_end())?;

    for record in records {
        let mut line = format!("{:>5}", record.id);
        for (column, value) in K::COLUMNS.iter().zip(record.entry.row()) {
            let shown = if *column == "amount" {
                record.entry.search_text(column).unwrap_or(value)
            } else {
                value
            };
            line.push_str(&format!("  {:<16}", shown));
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    writeln!(out, "({} entries)", records.len())
}

fn print_report(report: &Report, scope: ReportScope) {
    let label = match report.month {
        Some(month) => month.to_string(),
        None => scope.to_string(),
    };
    println!("📊 {} report ({})", report.kind, label);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for (category, amount) in ranked(&report.by_category) {
        println!("  {:<28} {:>14}", category, display_amount(amount));
    }
    if report.by_month.len() > 1 {
        println!();
        for (month, totals) in &report.by_month {
            let sum = add_up(totals.values().copied());
            println!("  {:<28} {:>14}", month, display_amount(sum));
        }
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "  {:<28} {:>14}   ({} entries)",
        "Total",
        display_amount(report.total),
        report.entry_count
    );
}

fn budget_status(ledgers: &Ledgers, scope: ReportScope) -> Result<()> {
    let lines = ledgers.budget_status(scope)?;
    if lines.is_empty() {
        println!("No budgets or expenses for {}", scope);
        return Ok(());
    }

    println!(
        "  {:<24} {:>12} {:>12} {:>12}",
        "category", "planned", "spent", "remaining"
    );
    for line in &lines {
        let marker = if line.is_over() { "⚠️ " } else { "" };
        println!(
            "  {:<24} {:>12} {:>12} {:>12} {}",
            line.category,
            display_amount(line.planned),
            display_amount(line.spent),
            display_amount(line.remaining),
            marker
        );
    }
    Ok(())
}
