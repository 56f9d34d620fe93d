//! Mappings between the wire types and the engine's domain model.
//!
//! Both vocabularies are closed, so every mapping is a total match; a new
//! variant on either side fails to compile until it is mapped here.
use api_types::bill::{BillCategory, BillNew, BillRecurrence, BillType, BillUpdate, BillView};
use engine::{Bill, BillInput, BillKind, BillPatch, Category, MoneyCents, Recurrence};

pub(crate) fn kind_from_wire(value: BillType) -> BillKind {
    match value {
        BillType::Asset => BillKind::Asset,
        BillType::Expense => BillKind::Expense,
        BillType::Income => BillKind::Income,
        BillType::Liability => BillKind::Liability,
    }
}

pub(crate) fn kind_to_wire(value: BillKind) -> BillType {
    match value {
        BillKind::Asset => BillType::Asset,
        BillKind::Expense => BillType::Expense,
        BillKind::Income => BillType::Income,
        BillKind::Liability => BillType::Liability,
    }
}

pub(crate) fn category_from_wire(value: BillCategory) -> Category {
    match value {
        BillCategory::Healthcare => Category::Healthcare,
        BillCategory::Investment => Category::Investment,
        BillCategory::Loan => Category::Loan,
        BillCategory::Misc => Category::Misc,
        BillCategory::Recreation => Category::Recreation,
        BillCategory::Subscription => Category::Subscription,
        BillCategory::Utility => Category::Utility,
    }
}

pub(crate) fn category_to_wire(value: Category) -> BillCategory {
    match value {
        Category::Healthcare => BillCategory::Healthcare,
        Category::Investment => BillCategory::Investment,
        Category::Loan => BillCategory::Loan,
        Category::Misc => BillCategory::Misc,
        Category::Recreation => BillCategory::Recreation,
        Category::Subscription => BillCategory::Subscription,
        Category::Utility => BillCategory::Utility,
    }
}

/// An absent wire recurrence means a one-time item.
pub(crate) fn recurrence_from_wire(value: Option<BillRecurrence>) -> Recurrence {
    match value {
        None | Some(BillRecurrence::None) => Recurrence::None,
        Some(BillRecurrence::Daily) => Recurrence::Daily,
        Some(BillRecurrence::Weekly) => Recurrence::Weekly,
        Some(BillRecurrence::Biweekly) => Recurrence::Biweekly,
        Some(BillRecurrence::Monthly) => Recurrence::Monthly,
        Some(BillRecurrence::Bimonthly) => Recurrence::Bimonthly,
        Some(BillRecurrence::Annually) => Recurrence::Annually,
    }
}

pub(crate) fn recurrence_to_wire(value: Recurrence) -> Option<BillRecurrence> {
    match value {
        Recurrence::None => None,
        Recurrence::Daily => Some(BillRecurrence::Daily),
        Recurrence::Weekly => Some(BillRecurrence::Weekly),
        Recurrence::Biweekly => Some(BillRecurrence::Biweekly),
        Recurrence::Monthly => Some(BillRecurrence::Monthly),
        Recurrence::Bimonthly => Some(BillRecurrence::Bimonthly),
        Recurrence::Annually => Some(BillRecurrence::Annually),
    }
}

pub(crate) fn bill_from_view(view: BillView) -> Bill {
    Bill {
        id: view.id,
        name: view.name,
        description: view.description,
        amount: MoneyCents::new(view.amount_cents),
        kind: view.bill_type.map(kind_from_wire),
        category: view.category.map(category_from_wire),
        due_date: view.due_date,
        reconciled: view.reconciled,
        recurrence: recurrence_from_wire(view.recurrence),
        recurrence_id: view.recurrence_id,
    }
}

pub(crate) fn new_from_input(input: &BillInput) -> BillNew {
    BillNew {
        name: input.name.clone(),
        description: input.description.clone(),
        amount_cents: input.amount.cents(),
        bill_type: input.kind.map(kind_to_wire),
        category: input.category.map(category_to_wire),
        due_date: input.due_date,
        reconciled: input.reconciled,
        recurrence: recurrence_to_wire(input.recurrence),
    }
}

pub(crate) fn update_from_patch(patch: &BillPatch) -> BillUpdate {
    BillUpdate {
        reconciled: patch.reconciled,
    }
}
