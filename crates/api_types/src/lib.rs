use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod bill {
    use super::*;

    /// Accounting nature of a line item.
    ///
    /// Serialized as the `type` field on the wire.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BillType {
        Asset,
        Expense,
        Income,
        Liability,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BillCategory {
        Healthcare,
        Investment,
        Loan,
        Misc,
        Recreation,
        Subscription,
        Utility,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BillRecurrence {
        None,
        Daily,
        Weekly,
        Biweekly,
        Monthly,
        Bimonthly,
        Annually,
    }

    /// Authoritative bill record as served by the backend.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BillView {
        pub id: i64,
        pub name: String,
        pub description: Option<String>,
        /// Amount in integer cents.
        pub amount_cents: i64,
        #[serde(rename = "type")]
        pub bill_type: Option<BillType>,
        pub category: Option<BillCategory>,
        /// ISO 8601 calendar date (`YYYY-MM-DD`).
        pub due_date: NaiveDate,
        pub reconciled: bool,
        /// Absent means a one-time item.
        pub recurrence: Option<BillRecurrence>,
        /// Grouping key shared by all occurrences of one recurring series.
        pub recurrence_id: Option<Uuid>,
    }

    /// Create payload; the backend assigns the id.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BillNew {
        pub name: String,
        pub description: Option<String>,
        /// Amount in integer cents.
        pub amount_cents: i64,
        #[serde(rename = "type")]
        pub bill_type: Option<BillType>,
        pub category: Option<BillCategory>,
        pub due_date: Option<NaiveDate>,
        /// Always false on create.
        pub reconciled: bool,
        pub recurrence: Option<BillRecurrence>,
    }

    /// Partial update; only the fields present change on the backend.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BillUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub reconciled: Option<bool>,
    }
}
