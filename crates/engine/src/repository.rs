//! The persistence collaborator contract consumed by the coordinator.
use crate::{
    bill::{Bill, BillId, BillInput, BillPatch},
    error::PersistenceError,
};

/// Backend the mutation coordinator persists through.
///
/// The engine never talks to the network itself; it only sees this trait.
/// `list` is the full-reload source. `create` returns the authoritative bill
/// with its backend-assigned id. `update` applies a partial patch and may
/// return the updated record or nothing. `delete` with `delete_series`
/// delegates removal of every sibling in the target's recurring series to
/// the backend.
#[allow(async_fn_in_trait)]
pub trait BillRepository {
    async fn list(&self) -> Result<Vec<Bill>, PersistenceError>;

    async fn create(&self, input: &BillInput) -> Result<Bill, PersistenceError>;

    async fn update(&self, id: BillId, patch: &BillPatch)
    -> Result<Option<Bill>, PersistenceError>;

    async fn delete(&self, id: BillId, delete_series: bool) -> Result<(), PersistenceError>;
}
