//! The module contains the authoritative in-memory bill collection.
//!
//! The store is pure storage: no filtering, no sorting, no persistence. It
//! keeps insertion order because the derived view uses that order as the
//! tie-breaker for equal due dates. Every mutation bumps a revision counter
//! observable through a `watch` channel, which is the interface presentation
//! code subscribes to.
use tokio::sync::watch;
use uuid::Uuid;

use crate::bill::{Bill, BillId};

/// Insertion-ordered collection of bills, keyed by id.
#[derive(Debug)]
pub struct LedgerStore {
    bills: Vec<Bill>,
    revision: watch::Sender<u64>,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            bills: Vec::new(),
            revision,
        }
    }

    fn bump(&mut self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Replaces the entire collection atomically (used after a full refresh).
    pub fn load(&mut self, bills: Vec<Bill>) {
        self.bills = bills;
        self.bump();
    }

    /// Inserts a bill, or replaces the existing one with the same id in place.
    pub fn upsert(&mut self, bill: Bill) {
        match self.bills.iter_mut().find(|b| b.id == bill.id) {
            Some(slot) => *slot = bill,
            None => self.bills.push(bill),
        }
        self.bump();
    }

    /// Removes a bill by id, returning its position and the snapshot.
    ///
    /// Removing a non-existent id is a no-op, not a failure.
    pub fn remove(&mut self, id: BillId) -> Option<(usize, Bill)> {
        let index = self.bills.iter().position(|b| b.id == id)?;
        let bill = self.bills.remove(index);
        self.bump();
        Some((index, bill))
    }

    /// Removes every member of a recurring series.
    ///
    /// Returns the snapshots with their original positions, in ascending
    /// position order.
    pub fn remove_series(&mut self, series: Uuid) -> Vec<(usize, Bill)> {
        let mut removed = Vec::new();
        // Walk backwards so earlier indices stay valid while removing.
        for index in (0..self.bills.len()).rev() {
            if self.bills[index].recurrence_id == Some(series) {
                removed.push((index, self.bills.remove(index)));
            }
        }
        if removed.is_empty() {
            return removed;
        }
        removed.reverse();
        self.bump();
        removed
    }

    /// Re-inserts a snapshot at its original position (clamped to the current
    /// length). Used by the undo path to restore the pre-delete state.
    pub fn restore(&mut self, index: usize, bill: Bill) {
        let index = index.min(self.bills.len());
        self.bills.insert(index, bill);
        self.bump();
    }

    pub fn get(&self, id: BillId) -> Option<&Bill> {
        self.bills.iter().find(|b| b.id == id)
    }

    pub fn contains(&self, id: BillId) -> bool {
        self.get(id).is_some()
    }

    /// Read-only view of the collection in insertion order.
    pub fn bills(&self) -> &[Bill] {
        &self.bills
    }

    pub fn len(&self) -> usize {
        self.bills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bills.is_empty()
    }

    /// Current revision; bumped once per mutating call.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Channel presentation code watches for store changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
