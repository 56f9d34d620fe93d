//! The module decides whether a delete targets one bill or its whole series.
//!
//! The resolver is consulted once per delete request, at confirmation time;
//! the user may flip the choice freely before confirming, never after.
use uuid::Uuid;

use crate::{
    ResultLedger,
    bill::{Bill, BillId},
    error::LedgerError,
};

/// The user's single-vs-series answer for a delete confirmation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScopeChoice {
    #[default]
    Single,
    Series,
}

/// Effective delete target after resolving the choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteScope {
    Single(BillId),
    Series(Uuid),
}

/// A delete request offers the single-vs-series choice iff the bill belongs
/// to a recurring series.
#[must_use]
pub fn offers_series_choice(bill: &Bill) -> bool {
    bill.recurrence_id.is_some()
}

/// Resolves the confirmed choice into the effective delete target.
///
/// Selecting the series scope for a bill without a series id is rejected.
pub fn resolve(bill: &Bill, choice: ScopeChoice) -> ResultLedger<DeleteScope> {
    match choice {
        ScopeChoice::Single => Ok(DeleteScope::Single(bill.id)),
        ScopeChoice::Series => match bill.recurrence_id {
            Some(series) => Ok(DeleteScope::Series(series)),
            None => Err(LedgerError::InvalidScope(format!(
                "bill {} is not part of a recurring series",
                bill.id
            ))),
        },
    }
}
