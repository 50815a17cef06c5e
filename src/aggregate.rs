// 📊 Aggregation Engine
// Rollups over entry slices. All arithmetic is Decimal so totals shown as
// currency never drift. Empty input yields an empty map or zero.

use crate::dates::MonthKey;
use crate::entry::{EntryKind, Record};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub type CategoryTotals = BTreeMap<String, Decimal>;
pub type MonthlyTotals = BTreeMap<MonthKey, CategoryTotals>;

/// Sum that saturates at `Decimal::MAX` instead of panicking.
pub fn add_up<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |sum, amount| sum.saturating_add(amount))
}

fn accumulate(slot: &mut Decimal, amount: Decimal) {
    *slot = slot.saturating_add(amount);
}

/// Total per category. Categories without entries are absent, never zero.
pub fn sum_by_category<K: EntryKind>(records: &[Record<K>]) -> CategoryTotals {
    let mut totals = CategoryTotals::new();
    for record in records {
        accumulate(
            totals
                .entry(record.entry.category().to_string())
                .or_insert(Decimal::ZERO),
            record.entry.effective_amount(),
        );
    }
    totals
}

/// Two-level rollup: month of the entry date, then category.
pub fn sum_by_month<K: EntryKind>(records: &[Record<K>]) -> MonthlyTotals {
    let mut totals = MonthlyTotals::new();
    for record in records {
        accumulate(
            totals
                .entry(MonthKey::of(record.entry.date()))
                .or_default()
                .entry(record.entry.category().to_string())
                .or_insert(Decimal::ZERO),
            record.entry.effective_amount(),
        );
    }
    totals
}

pub fn total<K: EntryKind>(records: &[Record<K>]) -> Decimal {
    add_up(records.iter().map(|record| record.entry.effective_amount()))
}

/// Category totals ordered largest first (ties by name), as pie charts show them.
pub fn ranked(totals: &CategoryTotals) -> Vec<(String, Decimal)> {
    let mut ranked: Vec<(String, Decimal)> = totals
        .iter()
        .map(|(category, amount)| (category.clone(), *amount))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

// ============================================================================
// BUDGET VS SPENDING
// ============================================================================

/// Planned allocation next to actual spending for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    pub category: String,
    pub planned: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
}

impl BudgetLine {
    pub fn is_over(&self) -> bool {
        self.remaining < Decimal::ZERO
    }
}

/// Compare budget totals with expense totals category by category.
///
/// Categories appearing on only one side are included with zero on the other.
pub fn budget_status(planned: &CategoryTotals, spent: &CategoryTotals) -> Vec<BudgetLine> {
    let categories: BTreeSet<&String> = planned.keys().chain(spent.keys()).collect();

    categories
        .into_iter()
        .map(|category| {
            let planned = planned.get(category).copied().unwrap_or(Decimal::ZERO);
            let spent = spent.get(category).copied().unwrap_or(Decimal::ZERO);
            BudgetLine {
                category: category.clone(),
                planned,
                spent,
                remaining: planned.saturating_sub(spent),
            }
        })
        .collect()
}
