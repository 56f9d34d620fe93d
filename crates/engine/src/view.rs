//! The module contains the derived-view projection.
//!
//! [`derive_view`] is a pure function from the store contents plus filter
//! parameters to display rows and KPI totals. It never mutates anything and
//! can be recomputed from the current store state at any time.
use chrono::NaiveDate;

use crate::{
    bill::{Bill, BillKind},
    money::MoneyCents,
};

/// Sort order of the display sequence, by due date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Filter and sort parameters for one derived view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewParams {
    /// Keep bills due on or after this date.
    pub start: Option<NaiveDate>,
    /// Keep bills due on or before this date.
    pub end: Option<NaiveDate>,
    /// When false, reconciled bills are hidden from the display rows.
    /// KPI totals ignore this flag.
    pub show_reconciled: bool,
    pub sort: SortDirection,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            show_reconciled: true,
            sort: SortDirection::default(),
        }
    }
}

/// Aggregated totals per bill type over the date-range-filtered set.
///
/// Reconciled bills inside the range always count; bills without a type
/// count toward none of the four totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KpiTotals {
    pub income: MoneyCents,
    pub asset: MoneyCents,
    pub liability: MoneyCents,
    pub expense: MoneyCents,
}

impl KpiTotals {
    /// Net worth delta: `asset + income - liability - expense`.
    #[must_use]
    pub fn net(&self) -> MoneyCents {
        self.asset + self.income - self.liability - self.expense
    }

    fn add(&mut self, kind: BillKind, amount: MoneyCents) {
        match kind {
            BillKind::Income => self.income += amount,
            BillKind::Asset => self.asset += amount,
            BillKind::Liability => self.liability += amount,
            BillKind::Expense => self.expense += amount,
        }
    }
}

/// One derived view: ordered display rows plus KPI totals.
///
/// Rows borrow from the store; the view is recomputed, never mutated.
#[derive(Clone, Debug)]
pub struct LedgerView<'a> {
    pub rows: Vec<&'a Bill>,
    pub totals: KpiTotals,
}

fn in_range(bill: &Bill, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.is_none_or(|s| bill.due_date >= s) && end.is_none_or(|e| bill.due_date <= e)
}

/// Projects the collection into display rows and KPI totals.
///
/// The date-range filter and the reconciled-visibility filter compose
/// independently: totals are computed over the date-range-filtered set only,
/// while rows additionally drop reconciled bills when `show_reconciled` is
/// off. Sorting is stable, so bills with equal due dates keep their
/// insertion order in either direction.
pub fn derive_view<'a>(bills: &'a [Bill], params: &ViewParams) -> LedgerView<'a> {
    let mut totals = KpiTotals::default();
    let mut rows: Vec<&Bill> = Vec::new();

    for bill in bills {
        if !in_range(bill, params.start, params.end) {
            continue;
        }
        if let Some(kind) = bill.kind {
            totals.add(kind, bill.amount);
        }
        if bill.reconciled && !params.show_reconciled {
            continue;
        }
        rows.push(bill);
    }

    match params.sort {
        SortDirection::Ascending => rows.sort_by(|a, b| a.due_date.cmp(&b.due_date)),
        SortDirection::Descending => rows.sort_by(|a, b| b.due_date.cmp(&a.due_date)),
    }

    LedgerView { rows, totals }
}
