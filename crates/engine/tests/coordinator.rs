use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use uuid::Uuid;

use engine::{
    Bill, BillDraft, BillId, BillInput, BillKind, BillPatch, BillRepository, Clock, Coordinator,
    LedgerError, MoneyCents, PersistenceError, Recurrence, ScopeChoice, SortDirection, ViewParams,
};

#[derive(Clone)]
struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    fn start() -> Self {
        Self {
            now: Arc::new(Mutex::new(
                Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            )),
        }
    }

    fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
struct FakeInner {
    bills: RefCell<Vec<Bill>>,
    next_id: Cell<BillId>,
    fail_create: Cell<bool>,
    fail_update: Cell<bool>,
    fail_delete: Cell<bool>,
    create_calls: Cell<usize>,
    update_calls: RefCell<Vec<(BillId, BillPatch)>>,
    delete_calls: RefCell<Vec<(BillId, bool)>>,
}

/// In-memory stand-in for the REST backend.
#[derive(Clone, Default)]
struct FakeRepository {
    inner: Rc<FakeInner>,
}

impl FakeRepository {
    fn new() -> Self {
        let repo = Self::default();
        repo.inner.next_id.set(1);
        repo
    }

    fn seed(&self, bill: Bill) {
        self.inner.next_id.set(self.inner.next_id.get().max(bill.id + 1));
        self.inner.bills.borrow_mut().push(bill);
    }

    fn delete_calls(&self) -> Vec<(BillId, bool)> {
        self.inner.delete_calls.borrow().clone()
    }
}

impl BillRepository for FakeRepository {
    async fn list(&self) -> Result<Vec<Bill>, PersistenceError> {
        Ok(self.inner.bills.borrow().clone())
    }

    async fn create(&self, input: &BillInput) -> Result<Bill, PersistenceError> {
        self.inner.create_calls.set(self.inner.create_calls.get() + 1);
        if self.inner.fail_create.get() {
            return Err(PersistenceError("backend refused the create".to_string()));
        }
        let due_date = input
            .due_date
            .ok_or_else(|| PersistenceError("due_date is required".to_string()))?;

        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let bill = Bill {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            amount: input.amount,
            kind: input.kind,
            category: input.category,
            due_date,
            reconciled: input.reconciled,
            recurrence: input.recurrence,
            recurrence_id: input.recurrence.is_recurring().then(Uuid::new_v4),
        };
        self.inner.bills.borrow_mut().push(bill.clone());
        Ok(bill)
    }

    async fn update(
        &self,
        id: BillId,
        patch: &BillPatch,
    ) -> Result<Option<Bill>, PersistenceError> {
        self.inner.update_calls.borrow_mut().push((id, *patch));
        if self.inner.fail_update.get() {
            return Err(PersistenceError("backend refused the update".to_string()));
        }
        let mut bills = self.inner.bills.borrow_mut();
        let bill = bills
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| PersistenceError(format!("no bill {id}")))?;
        if let Some(reconciled) = patch.reconciled {
            bill.reconciled = reconciled;
        }
        Ok(None)
    }

    async fn delete(&self, id: BillId, delete_series: bool) -> Result<(), PersistenceError> {
        self.inner.delete_calls.borrow_mut().push((id, delete_series));
        if self.inner.fail_delete.get() {
            return Err(PersistenceError("backend refused the delete".to_string()));
        }
        let mut bills = self.inner.bills.borrow_mut();
        let series = bills
            .iter()
            .find(|b| b.id == id)
            .and_then(|b| b.recurrence_id);
        bills.retain(|b| {
            if delete_series && let Some(series) = series {
                b.recurrence_id != Some(series)
            } else {
                b.id != id
            }
        });
        Ok(())
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn one_time(id: BillId, name: &str, due: NaiveDate, kind: Option<BillKind>, cents: i64) -> Bill {
    Bill {
        id,
        name: name.to_string(),
        description: None,
        amount: MoneyCents::new(cents),
        kind,
        category: None,
        due_date: due,
        reconciled: false,
        recurrence: Recurrence::None,
        recurrence_id: None,
    }
}

fn recurring(id: BillId, name: &str, due: NaiveDate, series: Uuid) -> Bill {
    Bill {
        recurrence: Recurrence::Monthly,
        recurrence_id: Some(series),
        ..one_time(id, name, due, Some(BillKind::Liability), 50_00)
    }
}

fn coordinator(repo: &FakeRepository, clock: &ManualClock) -> Coordinator<FakeRepository> {
    Coordinator::with_clock(repo.clone(), Box::new(clock.clone()))
}

#[tokio::test]
async fn create_validates_before_any_network_call() {
    let repo = FakeRepository::new();
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);

    let bad_amount = BillDraft {
        name: "Rent".to_string(),
        amount: "abc".to_string(),
        due_date: Some(date(2025, 7, 1)),
        ..Default::default()
    };
    assert!(matches!(
        coordinator.create(bad_amount).await,
        Err(LedgerError::Validation(_))
    ));

    let no_name = BillDraft {
        name: "   ".to_string(),
        amount: "10".to_string(),
        due_date: Some(date(2025, 7, 1)),
        ..Default::default()
    };
    assert!(matches!(
        coordinator.create(no_name).await,
        Err(LedgerError::Validation(_))
    ));

    assert_eq!(repo.inner.create_calls.get(), 0);
    assert!(coordinator.store().is_empty());
}

#[tokio::test]
async fn create_upserts_the_authoritative_record() {
    let repo = FakeRepository::new();
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);

    let id = coordinator
        .create(BillDraft {
            name: " Rent ".to_string(),
            description: "  ".to_string(),
            amount: "1200.50".to_string(),
            kind: Some(BillKind::Liability),
            due_date: Some(date(2025, 7, 1)),
            ..Default::default()
        })
        .await
        .unwrap();

    let bill = coordinator.store().get(id).unwrap();
    assert_eq!(bill.id, 1);
    assert_eq!(bill.name, "Rent");
    assert_eq!(bill.description, None);
    assert_eq!(bill.amount.cents(), 120_050);
    assert!(!bill.reconciled);
}

#[tokio::test]
async fn create_failure_leaves_the_store_unchanged() {
    let repo = FakeRepository::new();
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    repo.inner.fail_create.set(true);

    let result = coordinator
        .create(BillDraft {
            name: "Rent".to_string(),
            amount: "1200".to_string(),
            due_date: Some(date(2025, 7, 1)),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(LedgerError::Persistence(_))));
    assert!(coordinator.store().is_empty());
    assert_eq!(repo.inner.create_calls.get(), 1);
}

#[tokio::test]
async fn toggle_is_optimistic_and_keeps_the_flip_on_failure() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    repo.inner.fail_update.set(true);
    let result = coordinator.toggle_reconciled(1).await;

    assert!(matches!(result, Err(LedgerError::Persistence(_))));
    // Documented gap: the optimistic flip stays until the next reload.
    assert!(coordinator.store().get(1).unwrap().reconciled);

    coordinator.refresh().await.unwrap();
    assert!(!coordinator.store().get(1).unwrap().reconciled);
}

#[tokio::test]
async fn toggle_persists_a_reconciled_only_patch() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    assert!(coordinator.toggle_reconciled(1).await.unwrap());
    assert!(coordinator.store().get(1).unwrap().reconciled);
    assert_eq!(
        repo.inner.update_calls.borrow().as_slice(),
        &[(
            1,
            BillPatch {
                reconciled: Some(true)
            }
        )]
    );

    assert!(!coordinator.toggle_reconciled(1).await.unwrap());
    assert!(!coordinator.store().get(1).unwrap().reconciled);
}

#[tokio::test]
async fn toggle_unknown_id_is_key_not_found() {
    let repo = FakeRepository::new();
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);

    assert!(matches!(
        coordinator.toggle_reconciled(42).await,
        Err(LedgerError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn delete_request_offers_the_series_choice_iff_recurring() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    repo.seed(recurring(2, "Gym", date(2025, 6, 12), Uuid::new_v4()));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    assert!(!coordinator.delete_request(1).unwrap().offers_series_choice);
    assert!(coordinator.delete_request(2).unwrap().offers_series_choice);
}

#[tokio::test]
async fn confirm_delete_single_removes_only_the_target() {
    let series = Uuid::new_v4();
    let repo = FakeRepository::new();
    repo.seed(recurring(1, "Gym", date(2025, 6, 12), series));
    repo.seed(recurring(2, "Gym", date(2025, 7, 12), series));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    coordinator.confirm_delete(1, ScopeChoice::Single).await.unwrap();

    assert!(!coordinator.store().contains(1));
    assert!(coordinator.store().contains(2));
    assert_eq!(repo.delete_calls(), vec![(1, false)]);
}

#[tokio::test]
async fn confirm_delete_series_removes_every_member() {
    let series = Uuid::new_v4();
    let repo = FakeRepository::new();
    repo.seed(recurring(1, "Gym", date(2025, 6, 12), series));
    repo.seed(one_time(2, "Power", date(2025, 6, 20), None, 80_00));
    repo.seed(recurring(3, "Gym", date(2025, 7, 12), series));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    coordinator.confirm_delete(1, ScopeChoice::Series).await.unwrap();

    assert!(!coordinator.store().contains(1));
    assert!(!coordinator.store().contains(3));
    assert!(coordinator.store().contains(2));
    assert_eq!(repo.delete_calls(), vec![(1, true)]);
}

#[tokio::test]
async fn series_scope_on_a_one_time_bill_is_rejected() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    assert!(matches!(
        coordinator.confirm_delete(1, ScopeChoice::Series).await,
        Err(LedgerError::InvalidScope(_))
    ));
    assert!(coordinator.store().contains(1));
    assert!(repo.delete_calls().is_empty());
}

#[tokio::test]
async fn undo_before_the_deadline_restores_the_prior_state() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    repo.seed(one_time(2, "Water", date(2025, 6, 10), None, 40_00));
    repo.seed(one_time(3, "Net", date(2025, 6, 15), None, 60_00));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();
    let before: Vec<Bill> = coordinator.store().bills().to_vec();

    let deadline = coordinator.delete_with_undo(2).unwrap();
    assert!(!coordinator.store().contains(2));
    assert_eq!(coordinator.next_deadline(), Some(deadline));
    assert_eq!(coordinator.pending_deletion(2).unwrap().name, "Water");

    clock.advance(TimeDelta::seconds(2));
    assert!(coordinator.undo_delete(2));

    // Same items, same field values, same order.
    assert_eq!(coordinator.store().bills(), before.as_slice());
    assert_eq!(coordinator.next_deadline(), None);

    // The scheduled delete never fires once undone.
    clock.advance(TimeDelta::seconds(30));
    assert_eq!(coordinator.commit_expired().await, 0);
    assert!(repo.delete_calls().is_empty());
}

#[tokio::test]
async fn undo_is_idempotent() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    coordinator.delete_with_undo(1).unwrap();
    clock.advance(TimeDelta::seconds(1));
    assert!(coordinator.undo_delete(1));
    assert!(!coordinator.undo_delete(1));
}

#[tokio::test]
async fn expiry_commits_the_scheduled_delete() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    coordinator.delete_with_undo(1).unwrap();
    clock.advance(TimeDelta::seconds(6));

    // Undo after expiry is a no-op; the commit still happens.
    assert!(!coordinator.undo_delete(1));
    assert_eq!(coordinator.commit_expired().await, 1);
    assert_eq!(repo.delete_calls(), vec![(1, false)]);
    assert!(!coordinator.store().contains(1));
    assert!(!coordinator.has_pending_deletions());
}

#[tokio::test]
async fn failed_scheduled_delete_leaves_the_store_missing_until_refresh() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    coordinator.delete_with_undo(1).unwrap();
    clock.advance(TimeDelta::seconds(6));
    repo.inner.fail_delete.set(true);

    assert_eq!(coordinator.commit_expired().await, 1);
    assert_eq!(repo.delete_calls(), vec![(1, false)]);
    // Documented gap: no compensating restore on a failed commit.
    assert!(!coordinator.store().contains(1));

    coordinator.refresh().await.unwrap();
    assert!(coordinator.store().contains(1));
}

#[tokio::test]
async fn pending_bill_rejects_concurrent_mutations() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    coordinator.delete_with_undo(1).unwrap();

    assert!(matches!(
        coordinator.toggle_reconciled(1).await,
        Err(LedgerError::Busy(1))
    ));
    assert!(matches!(
        coordinator.confirm_delete(1, ScopeChoice::Single).await,
        Err(LedgerError::Busy(1))
    ));
    assert!(matches!(
        coordinator.delete_with_undo(1),
        Err(LedgerError::Busy(1))
    ));
}

#[tokio::test]
async fn optimistic_flow_rejects_recurring_bills() {
    let repo = FakeRepository::new();
    repo.seed(recurring(1, "Gym", date(2025, 6, 12), Uuid::new_v4()));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    assert!(matches!(
        coordinator.delete_with_undo(1),
        Err(LedgerError::InvalidScope(_))
    ));
    assert!(coordinator.store().contains(1));
}

#[tokio::test]
async fn refresh_supersedes_pending_deletions() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    coordinator.delete_with_undo(1).unwrap();
    coordinator.refresh().await.unwrap();

    assert!(coordinator.store().contains(1));
    assert!(!coordinator.has_pending_deletions());
    // The lock was released by the reload.
    assert!(coordinator.toggle_reconciled(1).await.unwrap());

    clock.advance(TimeDelta::seconds(30));
    assert_eq!(coordinator.commit_expired().await, 0);
    assert!(repo.delete_calls().is_empty());
}

#[tokio::test]
async fn refresh_rejects_duplicate_ids() {
    let repo = FakeRepository::new();
    repo.seed(one_time(1, "Power", date(2025, 6, 10), None, 80_00));
    repo.inner
        .bills
        .borrow_mut()
        .push(one_time(1, "Shadow", date(2025, 6, 11), None, 10_00));
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);

    assert!(matches!(
        coordinator.refresh().await,
        Err(LedgerError::Validation(_))
    ));
    assert!(coordinator.store().is_empty());
}

#[tokio::test]
async fn derived_view_matches_the_dashboard_example() {
    let repo = FakeRepository::new();
    repo.seed(one_time(
        1,
        "A",
        date(2025, 1, 1),
        Some(BillKind::Liability),
        100_00,
    ));
    let mut b = one_time(2, "B", date(2025, 1, 15), Some(BillKind::Income), 500_00);
    b.reconciled = true;
    repo.seed(b);
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    coordinator.refresh().await.unwrap();

    let view = coordinator.view(&ViewParams {
        start: Some(date(2025, 1, 1)),
        end: Some(date(2025, 1, 31)),
        show_reconciled: false,
        sort: SortDirection::Ascending,
    });

    assert_eq!(view.rows.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1]);
    assert_eq!(view.totals.liability.cents(), 100_00);
    assert_eq!(view.totals.income.cents(), 500_00);
    assert_eq!(view.totals.net().cents(), 400_00);
}

#[tokio::test]
async fn store_subscribers_observe_every_mutation() {
    let repo = FakeRepository::new();
    let clock = ManualClock::start();
    let mut coordinator = coordinator(&repo, &clock);
    let mut watcher = coordinator.store().subscribe();

    coordinator
        .create(BillDraft {
            name: "Rent".to_string(),
            amount: "1200".to_string(),
            due_date: Some(date(2025, 7, 1)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(watcher.has_changed().unwrap());
    watcher.mark_unchanged();

    coordinator.delete_with_undo(1).unwrap();
    assert!(watcher.has_changed().unwrap());
}
