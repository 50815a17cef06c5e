// 📂 CSV export / import
// Flat file per kind: `id` followed by the kind's columns. Import assigns
// fresh ids and runs every row through the same validation as `add`.

use crate::entry::{EntryKind, Fields};
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use serde::Serialize;
use std::io::{Read, Write};
use tracing::{info, warn};

/// Header row for a kind's export file.
pub fn header<K: EntryKind>() -> Vec<&'static str> {
    std::iter::once("id").chain(K::COLUMNS.iter().copied()).collect()
}

/// Write every entry of the ledger, in store order. Returns the row count.
pub fn export_csv<K: EntryKind, W: Write>(ledger: &Ledger<K>, writer: W) -> Result<usize> {
    let records = ledger.all()?;

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header::<K>())?;
    for record in &records {
        let mut row = vec![record.id.to_string()];
        row.extend(record.entry.row());
        wtr.write_record(&row)?;
    }
    wtr.flush()
        .map_err(|err| LedgerError::Storage(format!("failed to write export: {}", err)))?;

    info!(kind = %K::KIND, rows = records.len(), "exported entries");
    Ok(records.len())
}

/// A row that failed validation and was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    /// 1-based line in the file (the header is line 1).
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub imported: Vec<i64>,
    pub rejected: Vec<RejectedRow>,
}

impl ImportSummary {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Read rows by header name and add each valid one.
///
/// Invalid rows are reported and skipped; a storage failure stops the import
/// (rows already added stay added).
pub fn import_csv<K: EntryKind, R: Read>(ledger: &Ledger<K>, reader: R) -> Result<ImportSummary> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let missing: Vec<&str> = K::COLUMNS
        .iter()
        .copied()
        .filter(|column| *column != "quantity")
        .filter(|column| {
            !headers
                .iter()
                .any(|h| crate::entry::normalize_field(h) == *column)
        })
        .collect();
    if !missing.is_empty() {
        return Err(LedgerError::validation(format!(
            "CSV header is missing column(s): {}",
            missing.join(", ")
        )));
    }

    let mut summary = ImportSummary::default();
    for (index, result) in rdr.records().enumerate() {
        let line = result
            .as_ref()
            .ok()
            .and_then(|r| r.position())
            .map(|p| p.line())
            .unwrap_or(index as u64 + 2);

        let outcome = result
            .map_err(LedgerError::from)
            .and_then(|row| {
                let fields: Fields = headers
                    .iter()
                    .zip(row.iter())
                    .filter(|(name, _)| !name.eq_ignore_ascii_case("id"))
                    .collect();
                ledger.add_entry(&fields)
            });

        match outcome {
            Ok(id) => summary.imported.push(id),
            Err(err) if err.is_storage() => return Err(err),
            Err(err) => {
                warn!(kind = %K::KIND, line, error = %err, "rejected import row");
                summary.rejected.push(RejectedRow {
                    line,
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        kind = %K::KIND,
        imported = summary.imported.len(),
        rejected = summary.rejected.len(),
        "import finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::entry::{Budget, Expense, Income};
    use std::sync::Arc;

    fn ledger<K: EntryKind>() -> Ledger<K> {
        Ledger::new(Arc::new(Store::open_in_memory().unwrap()))
    }

    #[test]
    fn test_headers_per_kind() {
        assert_eq!(header::<Income>(), vec!["id", "source", "type", "amount", "date"]);
        assert_eq!(
            header::<Expense>(),
            vec!["id", "category", "item", "amount", "quantity", "date", "payment_mode"]
        );
        assert_eq!(header::<Budget>(), vec!["id", "category", "amount", "date"]);
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let budgets = ledger::<Budget>();
        budgets
            .add_entry(&Fields::new().with("category", "Savings").with("amount", "250.5").with("date", "01-03-2024"))
            .unwrap();

        let mut out = Vec::new();
        assert_eq!(export_csv(&budgets, &mut out).unwrap(), 1);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "id,category,amount,date\n1,Savings,250.5,2024-03-01\n");
    }

    #[test]
    fn test_import_skips_invalid_rows() {
        let expenses = ledger::<Expense>();
        let csv = "\
ID,Category,Item,Amount,Quantity,Date,Payment Mode
7,Groceries,Milk,50,2,2024-06-01,Offline
8,Groceries,Eggs,-3,1,2024-06-01,Offline
9,Dining Out,Pizza,12.50,,01-06-2024,online
10,Dining Out,,12.50,1,2024-06-01,Online
";
        let summary = import_csv(&expenses, csv.as_bytes()).unwrap();

        assert_eq!(summary.imported_count(), 2);
        assert_eq!(
            summary.rejected.iter().map(|r| r.line).collect::<Vec<_>>(),
            vec![3, 5]
        );
        assert!(summary.rejected[0].reason.contains("amount"));
        assert!(!summary.is_clean());

        // Ids from the file are not reused
        let stored = expenses.all().unwrap();
        assert_eq!(stored.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(stored[1].entry.quantity, 1);
    }

    #[test]
    fn test_import_rejects_missing_columns() {
        let income = ledger::<Income>();
        let err = import_csv(&income, "id,source,amount,date\n1,ACME,10,2024-01-01\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(err.to_string().contains("type"));
        assert_eq!(income.count().unwrap(), 0);
    }

    #[test]
    fn test_export_then_import_into_fresh_store() {
        let source = ledger::<Income>();
        source
            .add_entry(
                &Fields::new()
                    .with("source", "Client, Inc.")
                    .with("type", "Freelancing")
                    .with("amount", "480.25")
                    .with("date", "2024-04-12"),
            )
            .unwrap();

        let mut out = Vec::new();
        export_csv(&source, &mut out).unwrap();

        let target = ledger::<Income>();
        let summary = import_csv(&target, out.as_slice()).unwrap();
        assert!(summary.is_clean());

        let original = source.all().unwrap();
        let copied = target.all().unwrap();
        assert_eq!(copied[0].entry, original[0].entry);
    }
}
