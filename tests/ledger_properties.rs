// Facade-level behaviour: round trips, deletion, rollup consistency and the
// month/search input checks, all against an in-memory store.

use chrono::NaiveDate;
use ledger_keeper::query;
use ledger_keeper::{
    sum_by_category, total, Budget, Expense, Fields, Income, Ledger, LedgerError, Ledgers,
    PaymentMode, ReportScope, Store,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

fn ledgers() -> Ledgers {
    Ledgers::new(Arc::new(Store::open_in_memory().unwrap()))
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn expense(category: &str, item: &str, amount: &str, quantity: &str, day: &str) -> Fields {
    Fields::new()
        .with("category", category)
        .with("item", item)
        .with("amount", amount)
        .with("quantity", quantity)
        .with("date", day)
        .with("payment_mode", "Offline")
}

fn salary(amount: &str, day: &str) -> Fields {
    Fields::new()
        .with("source", "ACME Corp")
        .with("type", "Salary")
        .with("amount", amount)
        .with("date", day)
}

#[test]
fn add_then_get_returns_the_same_entry() {
    let ledgers = ledgers();

    let entries = vec![
        Expense {
            category: "Groceries".into(),
            item: "Milk".into(),
            amount: dec("50"),
            quantity: 2,
            date: date("2024-06-01"),
            payment_mode: PaymentMode::Offline,
        },
        Expense {
            category: "Dining Out".into(),
            item: "Café crème".into(),
            amount: dec("0.10"),
            quantity: 3,
            date: date("2023-12-31"),
            payment_mode: PaymentMode::Online,
        },
    ];

    for entry in entries {
        let id = ledgers.expenses.add(entry.clone()).unwrap();
        let record = ledgers.expenses.get(id).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.entry, entry);
    }
}

#[test]
fn padded_text_is_rejected_rather_than_silently_trimmed() {
    let ledgers = ledgers();
    let padded = Expense {
        category: "Groceries".into(),
        item: " Milk ".into(),
        amount: dec("50"),
        quantity: 2,
        date: date("2024-06-01"),
        payment_mode: PaymentMode::Offline,
    };

    assert!(matches!(ledgers.expenses.add(padded), Err(LedgerError::Validation(_))));
    assert_eq!(ledgers.expenses.count().unwrap(), 0);

    // Raw input is trimmed on parse, so the stored entry round-trips
    let id = ledgers
        .expenses
        .add_entry(&expense(" Groceries ", " Milk ", "50", "2", "2024-06-01"))
        .unwrap();
    let record = ledgers.expenses.get(id).unwrap();
    assert_eq!(record.entry.item, "Milk");
    let again = ledgers.expenses.add(record.entry.clone()).unwrap();
    assert_eq!(ledgers.expenses.get(again).unwrap().entry, record.entry);
}

#[test]
fn oversized_amounts_are_rejected_and_reports_stay_safe() {
    let ledgers = ledgers();
    let err = ledgers
        .expenses
        .add_entry(&expense("Misc", "Yacht", "50000000000000000000000000000", "2", "2024-06-01"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(ledgers.expenses.count().unwrap(), 0);

    for _ in 0..3 {
        ledgers
            .expenses
            .add_entry(&expense("Misc", "Yacht", "5000000000000", "2", "2024-06-01"))
            .unwrap();
    }
    let report = ledgers
        .expenses
        .report_on(ReportScope::AllTime, date("2024-06-20"))
        .unwrap();
    assert_eq!(report.total, dec("30000000000000"));
}

#[test]
fn delete_twice_fails_the_second_time() {
    let ledgers = ledgers();
    let id = ledgers.income.add_entry(&salary("1000", "2024-05-10")).unwrap();

    ledgers.income.remove_entry(id).unwrap();
    assert!(ledgers.income.get(id).unwrap_err().is_not_found());
    assert!(matches!(
        ledgers.income.remove_entry(id),
        Err(LedgerError::NotFound { id: 1, .. })
    ));
}

#[test]
fn deleting_unknown_id_leaves_store_unchanged() {
    let ledgers = ledgers();
    ledgers.budgets
        .add_entry(&Fields::new().with("category", "Savings").with("amount", "300").with("date", "2024-06-01"))
        .unwrap();
    let before = ledgers.budgets.all().unwrap();

    let err = ledgers.budgets.remove_entry(999).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "budget entry 999 not found");
    assert_eq!(ledgers.budgets.all().unwrap(), before);
}

#[test]
fn ids_are_not_reused_after_delete() {
    let ledgers = ledgers();
    let first = ledgers.income.add_entry(&salary("10", "2024-01-01")).unwrap();
    ledgers.income.remove_entry(first).unwrap();
    let second = ledgers.income.add_entry(&salary("10", "2024-01-01")).unwrap();
    assert!(second > first);
}

#[test]
fn milk_expense_rolls_up_to_quantity_times_amount() {
    let ledgers = ledgers();
    ledgers
        .expenses
        .add_entry(&expense("Groceries", "Milk", "50", "2", "2024-06-01"))
        .unwrap();

    let totals = sum_by_category(&ledgers.expenses.all().unwrap());
    assert_eq!(totals.len(), 1);
    assert_eq!(totals["Groceries"], dec("100"));
}

#[test]
fn category_sums_add_up_to_total() {
    let ledgers = ledgers();
    let rows = [
        ("Groceries", "Bread", "2.35", "3", "2024-06-01"),
        ("Groceries", "Eggs", "4.10", "1", "2024-06-02"),
        ("Transport", "Bus pass", "45", "1", "2024-05-28"),
        ("Utilities", "Electricity", "81.99", "1", "15-04-2024"),
        ("Dining Out", "Pizza", "12.50", "2", "2024-06-14"),
    ];
    for (category, item, amount, quantity, day) in rows {
        ledgers
            .expenses
            .add_entry(&expense(category, item, amount, quantity, day))
            .unwrap();
    }

    let records = ledgers.expenses.all().unwrap();
    let by_category: Decimal = sum_by_category(&records).values().copied().sum();
    assert_eq!(by_category, total(&records));
    assert_eq!(total(&records), dec("163.14"));
}

#[test]
fn current_month_and_all_time_reports() {
    let ledgers = ledgers();
    ledgers.income.add_entry(&salary("1000", "2024-05-15")).unwrap();
    ledgers.income.add_entry(&salary("1200", "2024-06-15")).unwrap();

    let today = date("2024-06-20");
    let current = ledgers.income.report_on(ReportScope::CurrentMonth, today).unwrap();
    assert_eq!(current.total, dec("1200"));

    let all = ledgers.income.report_on(ReportScope::AllTime, today).unwrap();
    assert_eq!(all.total, dec("2200"));
    assert_eq!(all.by_category["Salary"], dec("2200"));
}

#[test]
fn report_is_recomputed_after_every_mutation() {
    let ledgers = ledgers();
    let today = date("2024-06-20");
    let id = ledgers
        .expenses
        .add_entry(&expense("Groceries", "Milk", "50", "2", "2024-06-01"))
        .unwrap();
    ledgers
        .expenses
        .add_entry(&expense("Groceries", "Bread", "3", "1", "2024-06-02"))
        .unwrap();

    let before = ledgers.expenses.report_on(ReportScope::AllTime, today).unwrap();
    assert_eq!(before.total, dec("103"));

    ledgers.expenses.remove_entry(id).unwrap();
    let after = ledgers.expenses.report_on(ReportScope::AllTime, today).unwrap();
    assert_eq!(after.total, dec("3"));
    assert_eq!(after.entry_count, 1);
}

#[test]
fn empty_search_value_is_rejected() {
    let ledgers = ledgers();
    ledgers
        .expenses
        .add_entry(&expense("Groceries", "Milk", "50", "2", "2024-06-01"))
        .unwrap();
    let records = ledgers.expenses.all().unwrap();

    assert!(matches!(query::filter(&records, "item", ""), Err(LedgerError::Validation(_))));
    assert!(matches!(query::filter::<Income>(&[], "source", ""), Err(LedgerError::Validation(_))));
    assert!(matches!(ledgers.expenses.search("item", ""), Err(LedgerError::Validation(_))));
}

#[test]
fn search_is_case_insensitive_substring() {
    let ledgers = ledgers();
    ledgers
        .expenses
        .add_entry(&expense("Groceries", "Oat Milk", "3.5", "1", "2024-06-01"))
        .unwrap();
    ledgers
        .expenses
        .add_entry(&expense("Groceries", "Bread", "2", "1", "2024-06-01"))
        .unwrap();

    let hits = ledgers.expenses.search("Item", "MILK").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry.item, "Oat Milk");

    // Amounts match on their two-decimal display form
    assert_eq!(ledgers.expenses.search("amount", "3.50").unwrap().len(), 1);

    assert!(matches!(
        ledgers.expenses.search("source", "x"),
        Err(LedgerError::InvalidField { .. })
    ));
}

#[test]
fn invalid_month_tokens_are_rejected() {
    let ledgers = ledgers();
    for token in ["13-2024", "2024-13", "2024-6", "June", ""] {
        assert!(
            matches!(ledgers.income.by_month(token), Err(LedgerError::Validation(_))),
            "token {:?} should be rejected",
            token
        );
    }
}

#[test]
fn month_tokens_accept_both_orders() {
    let ledgers = ledgers();
    ledgers.income.add_entry(&salary("1000", "2024-05-31")).unwrap();
    ledgers.income.add_entry(&salary("1200", "01-06-2024")).unwrap();

    let iso = ledgers.income.by_month("2024-06").unwrap();
    let day_first = ledgers.income.by_month("06-2024").unwrap();
    assert_eq!(iso, day_first);
    assert_eq!(iso.len(), 1);
    assert_eq!(iso[0].entry.amount, dec("1200"));
}

#[test]
fn budgets_are_compared_not_merged() {
    let ledgers = ledgers();
    let today = date("2024-06-20");
    ledgers
        .budgets
        .add_entry(&Fields::new().with("category", "Groceries").with("amount", "80").with("date", "2024-06-01"))
        .unwrap();
    ledgers
        .expenses
        .add_entry(&expense("Groceries", "Milk", "50", "2", "2024-06-01"))
        .unwrap();
    ledgers
        .expenses
        .add_entry(&expense("Transport", "Taxi", "20", "1", "2024-06-03"))
        .unwrap();

    // Budget totals stay budget-only
    let budget_report = ledgers.budgets.report_on(ReportScope::AllTime, today).unwrap();
    assert_eq!(budget_report.total, dec("80"));

    let lines = ledgers.budget_status_on(ReportScope::CurrentMonth, today).unwrap();
    assert_eq!(lines.len(), 2);
    let groceries = lines.iter().find(|l| l.category == "Groceries").unwrap();
    assert_eq!(groceries.remaining, dec("-20"));
    assert!(groceries.is_over());
    let transport = lines.iter().find(|l| l.category == "Transport").unwrap();
    assert_eq!(transport.planned, Decimal::ZERO);
}

#[test]
fn separate_ledgers_share_one_store() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let writer: Ledger<Budget> = Ledger::new(Arc::clone(&store));
    let reader: Ledger<Budget> = Ledger::new(store);

    writer
        .add_entry(&Fields::new().with("category", "Rent").with("amount", "900").with("date", "2024-06-01"))
        .unwrap();
    assert_eq!(reader.count().unwrap(), 1);
}
