//! The module contains the bill line item and its closed vocabularies.
//!
//! A [`Bill`] is the authoritative record of one financial line item. The
//! `type`/`category`/`recurrence` vocabularies are closed enums: unrecognized
//! strings are rejected at the boundary instead of silently defaulting.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, MoneyCents, ResultLedger};

/// Backend-assigned bill identifier, immutable after creation.
pub type BillId = i64;

/// Accounting nature of a line item (serialized as `type`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillKind {
    Asset,
    Expense,
    Income,
    Liability,
}

impl BillKind {
    /// Canonical string used on the wire and in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Liability => "liability",
        }
    }
}

impl TryFrom<&str> for BillKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "liability" => Ok(Self::Liability),
            other => Err(LedgerError::Validation(format!(
                "unrecognized bill type: {other}"
            ))),
        }
    }
}

/// Spending category of a line item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Healthcare,
    Investment,
    Loan,
    Misc,
    Recreation,
    Subscription,
    Utility,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthcare => "healthcare",
            Self::Investment => "investment",
            Self::Loan => "loan",
            Self::Misc => "misc",
            Self::Recreation => "recreation",
            Self::Subscription => "subscription",
            Self::Utility => "utility",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "healthcare" => Ok(Self::Healthcare),
            "investment" => Ok(Self::Investment),
            "loan" => Ok(Self::Loan),
            "misc" => Ok(Self::Misc),
            "recreation" => Ok(Self::Recreation),
            "subscription" => Ok(Self::Subscription),
            "utility" => Ok(Self::Utility),
            other => Err(LedgerError::Validation(format!(
                "unrecognized category: {other}"
            ))),
        }
    }
}

/// How often a bill repeats. `None` marks a one-time item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Bimonthly,
    Annually,
}

impl Recurrence {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Bimonthly => "bimonthly",
            Self::Annually => "annually",
        }
    }

    /// Returns `true` for every cadence except `None`.
    #[must_use]
    pub const fn is_recurring(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl TryFrom<&str> for Recurrence {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "bimonthly" => Ok(Self::Bimonthly),
            "annually" => Ok(Self::Annually),
            other => Err(LedgerError::Validation(format!(
                "unrecognized recurrence: {other}"
            ))),
        }
    }
}

/// One financial line item of the ledger.
///
/// The ledger store is the single owner of all `Bill` instances; derived
/// views only ever hold read-only references into it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub name: String,
    pub description: Option<String>,
    pub amount: MoneyCents,
    pub kind: Option<BillKind>,
    pub category: Option<Category>,
    pub due_date: NaiveDate,
    pub reconciled: bool,
    pub recurrence: Recurrence,
    /// Grouping key shared by all occurrences of one recurring series.
    /// Present iff `recurrence` is not `None`.
    pub recurrence_id: Option<Uuid>,
}

impl Bill {
    /// Checks the model invariants at the data-model boundary.
    ///
    /// Records coming back from the persistence collaborator pass through
    /// here before they reach the store.
    pub fn validate(&self) -> ResultLedger<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::Validation(format!(
                "bill {}: name must not be empty",
                self.id
            )));
        }
        if self.amount.is_negative() {
            return Err(LedgerError::Validation(format!(
                "bill {}: amount must be non-negative",
                self.id
            )));
        }
        match (self.recurrence.is_recurring(), self.recurrence_id) {
            (true, None) => Err(LedgerError::Validation(format!(
                "bill {}: recurring bill is missing its series id",
                self.id
            ))),
            (false, Some(_)) => Err(LedgerError::Validation(format!(
                "bill {}: one-time bill carries a series id",
                self.id
            ))),
            _ => Ok(()),
        }
    }
}

/// Raw form input for a new bill, before validation.
///
/// This is the typed replacement for an ad-hoc form-state object: the
/// coordinator turns it into a [`BillInput`] at the create boundary, before
/// any network call.
#[derive(Clone, Debug, Default)]
pub struct BillDraft {
    pub name: String,
    pub description: String,
    /// Decimal amount as typed by the user, e.g. `"12.50"`.
    pub amount: String,
    pub kind: Option<BillKind>,
    pub category: Option<Category>,
    pub due_date: Option<NaiveDate>,
    pub recurrence: Recurrence,
}

impl BillDraft {
    /// Validates and normalizes the draft into a create candidate.
    ///
    /// Rules:
    /// - `name` must be non-empty after trimming
    /// - `amount` must parse as a non-negative decimal
    /// - empty/whitespace-only `description` normalizes to absent
    /// - `reconciled` is always false on creation
    pub fn into_input(self) -> ResultLedger<BillInput> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("name must not be empty".to_string()));
        }

        let amount: MoneyCents = self.amount.parse()?;
        if amount.is_negative() {
            return Err(LedgerError::Validation(
                "amount must be non-negative".to_string(),
            ));
        }

        let description = self.description.trim();
        let description = (!description.is_empty()).then(|| description.to_string());

        Ok(BillInput {
            name: name.to_string(),
            description,
            amount,
            kind: self.kind,
            category: self.category,
            due_date: self.due_date,
            reconciled: false,
            recurrence: self.recurrence,
        })
    }
}

/// Validated create candidate submitted to the persistence collaborator.
///
/// Omits `id` (assigned by the backend) and `recurrence_id` (minted by the
/// backend when it expands a recurring series).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BillInput {
    pub name: String,
    pub description: Option<String>,
    pub amount: MoneyCents,
    pub kind: Option<BillKind>,
    pub category: Option<Category>,
    pub due_date: Option<NaiveDate>,
    pub reconciled: bool,
    pub recurrence: Recurrence,
}

/// Partial update sent to the persistence collaborator.
///
/// Only the reconciled flag is mutable in place today; absent fields are
/// left untouched by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillPatch {
    pub reconciled: Option<bool>,
}
