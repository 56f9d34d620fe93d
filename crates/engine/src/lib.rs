//! Ledger state engine for the billfold dashboard.
//!
//! The engine owns the in-memory bill collection, derives filtered/sorted/
//! aggregated views from it, and governs mutation semantics, including the
//! two-phase delete flows. Persistence is a collaborator behind
//! [`BillRepository`]; the engine never performs I/O of its own.
pub use bill::{Bill, BillDraft, BillId, BillInput, BillKind, BillPatch, Category, Recurrence};
pub use clock::{Clock, SystemClock};
pub use coordinator::{Coordinator, DEFAULT_UNDO_WINDOW_SECS, DeletePrompt};
pub use error::{LedgerError, PersistenceError};
pub use money::MoneyCents;
pub use repository::BillRepository;
pub use scope::{DeleteScope, ScopeChoice, offers_series_choice, resolve};
pub use store::LedgerStore;
pub use view::{KpiTotals, LedgerView, SortDirection, ViewParams, derive_view};

mod bill;
mod clock;
mod coordinator;
mod error;
mod money;
mod repository;
mod scope;
mod store;
mod view;

type ResultLedger<T> = Result<T, LedgerError>;
