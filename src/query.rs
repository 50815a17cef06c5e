// 🔍 Query/Filter Engine
// Full scans with a per-entry predicate. Personal ledgers hold hundreds to a
// few thousand rows, so there is no index to maintain.

use crate::dates::MonthKey;
use crate::entry::{normalize_field, EntryKind, Record};
use crate::error::{LedgerError, Result};

/// Resolve a user-supplied field name against the kind's searchable fields.
pub fn searchable_field<K: EntryKind>(field: &str) -> Result<&'static str> {
    let wanted = normalize_field(field);
    K::SEARCHABLE
        .iter()
        .copied()
        .find(|candidate| *candidate == wanted)
        .ok_or_else(|| LedgerError::InvalidField {
            kind: K::KIND.as_str(),
            field: field.trim().to_string(),
            expected: K::SEARCHABLE.join(", "),
        })
}

/// Entries whose `field` contains `needle`, ignoring case.
///
/// An empty (or whitespace-only) needle is rejected rather than treated as
/// "match everything".
pub fn filter<K: EntryKind>(
    records: &[Record<K>],
    field: &str,
    needle: &str,
) -> Result<Vec<Record<K>>> {
    let column = searchable_field::<K>(field)?;

    let needle = needle.trim();
    if needle.is_empty() {
        return Err(LedgerError::validation("search value cannot be empty"));
    }
    let needle = needle.to_lowercase();

    Ok(records
        .iter()
        .filter(|record| {
            record
                .entry
                .search_text(column)
                .map(|text| text.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .cloned()
        .collect())
}

/// Entries dated within `month`.
pub fn in_month<K: EntryKind>(records: &[Record<K>], month: MonthKey) -> Vec<Record<K>> {
    records
        .iter()
        .filter(|record| month.contains(record.entry.date()))
        .cloned()
        .collect()
}

/// Parse `token` as a month and keep the entries dated within it.
pub fn by_month<K: EntryKind>(records: &[Record<K>], token: &str) -> Result<Vec<Record<K>>> {
    let month = MonthKey::parse(token)?;
    Ok(in_month(records, month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Budget, Expense, Income, PaymentMode};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn expense(id: i64, category: &str, item: &str, amount: i64, date: &str, mode: PaymentMode) -> Record<Expense> {
        Record::new(
            id,
            Expense {
                category: category.to_string(),
                item: item.to_string(),
                amount: Decimal::from(amount),
                quantity: 1,
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                payment_mode: mode,
            },
        )
    }

    fn sample() -> Vec<Record<Expense>> {
        vec![
            expense(1, "Groceries", "Whole Milk", 50, "2024-06-01", PaymentMode::Offline),
            expense(2, "Dining Out", "Pizza", 120, "2024-06-15", PaymentMode::Online),
            expense(3, "Groceries", "Bread", 35, "2024-05-31", PaymentMode::Online),
        ]
    }

    fn ids<K: EntryKind>(records: &[Record<K>]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let found = filter(&sample(), "item", "MILK").unwrap();
        assert_eq!(ids(&found), vec![1]);

        let found = filter(&sample(), "category", "grocer").unwrap();
        assert_eq!(ids(&found), vec![1, 3]);
    }

    #[test]
    fn test_filter_accepts_display_labels() {
        let found = filter(&sample(), "Payment Mode", "online").unwrap();
        assert_eq!(ids(&found), vec![2, 3]);
    }

    #[test]
    fn test_filter_by_date_and_amount_text() {
        assert_eq!(ids(&filter(&sample(), "date", "2024-06").unwrap()), vec![1, 2]);
        assert_eq!(ids(&filter(&sample(), "amount", "120.00").unwrap()), vec![2]);
        assert_eq!(ids(&filter(&sample(), "amount", ".00").unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn test_filter_rejects_empty_value() {
        for needle in ["", "   "] {
            let err = filter(&sample(), "item", needle).unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }
        // Regardless of stored data
        let err = filter::<Expense>(&[], "item", "").unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_filter_rejects_unsearchable_field() {
        let err = filter(&sample(), "quantity", "1").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidField { .. }));

        let err = filter::<Income>(&[], "item", "x").unwrap_err();
        match err {
            LedgerError::InvalidField { kind, expected, .. } => {
                assert_eq!(kind, "income");
                assert_eq!(expected, "source, type, amount, date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_by_month() {
        assert_eq!(ids(&by_month(&sample(), "2024-06").unwrap()), vec![1, 2]);
        assert_eq!(ids(&by_month(&sample(), "05-2024").unwrap()), vec![3]);
        assert!(by_month(&sample(), "2023-01").unwrap().is_empty());
    }

    #[test]
    fn test_by_month_rejects_bad_tokens() {
        for token in ["13-2024", "2024-13", "2024-1", "June"] {
            let err = by_month::<Budget>(&[], token).unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)), "accepted {token}");
        }
    }
}
