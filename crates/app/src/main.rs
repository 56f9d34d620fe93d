use chrono::{NaiveDate, TimeDelta, Utc};
use clap::{Args, Parser, Subcommand};
use client::BillsClient;
use engine::{
    BillDraft, BillKind, Category, Coordinator, LedgerView, Recurrence, ScopeChoice,
    SortDirection, ViewParams,
};
use tokio::io::AsyncBufReadExt;

use error::Result;

mod error;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "billfold")]
#[command(about = "Personal ledger dashboard (bills, income, assets, liabilities)")]
struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override backend base URL (e.g. http://127.0.0.1:8000/api/).
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the ledger with KPI totals.
    List(ListArgs),
    /// Record a new line item.
    Add(AddArgs),
    /// Flip the reconciled flag on a line item.
    Toggle(ToggleArgs),
    /// Delete a line item; recurring bills ask for the scope, one-time bills
    /// get an undo window.
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Keep bills due on or after this date (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Keep bills due on or before this date (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Hide reconciled bills (KPI totals still include them).
    #[arg(long)]
    hide_reconciled: bool,
    /// Sort by due date descending.
    #[arg(long)]
    desc: bool,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    name: String,
    /// Decimal amount, e.g. 12.50.
    #[arg(long)]
    amount: String,
    #[arg(long)]
    description: Option<String>,
    /// asset | expense | income | liability
    #[arg(long = "type")]
    kind: Option<String>,
    /// healthcare | investment | loan | misc | recreation | subscription | utility
    #[arg(long)]
    category: Option<String>,
    /// Due date (YYYY-MM-DD).
    #[arg(long)]
    due: Option<NaiveDate>,
    /// none | daily | weekly | biweekly | monthly | bimonthly | annually
    #[arg(long)]
    recurrence: Option<String>,
}

#[derive(Args, Debug)]
struct ToggleArgs {
    #[arg(long)]
    id: i64,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    #[arg(long)]
    id: i64,
    /// Delete the whole recurring series without prompting.
    #[arg(long)]
    series: bool,
    /// Skip the undo window and delete immediately.
    #[arg(long)]
    now: bool,
    /// Answer prompts with their default (single scope).
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = settings::load(cli.config.as_deref(), cli.base_url.clone())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "billfold={level},engine={level},client={level}",
            level = settings.log_level
        ))
        .init();

    let client = BillsClient::new(&settings.base_url)?;
    let mut coordinator =
        Coordinator::new(client).undo_window(TimeDelta::seconds(settings.undo_window_secs));
    let count = coordinator.refresh().await?;
    tracing::debug!("loaded {count} bills from {}", settings.base_url);

    match cli.command {
        Command::List(args) => {
            let view = coordinator.view(&ViewParams {
                start: args.from,
                end: args.to,
                show_reconciled: !args.hide_reconciled,
                sort: if args.desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                },
            });
            print_view(&view);
        }
        Command::Add(args) => add(&mut coordinator, args).await?,
        Command::Toggle(args) => {
            let reconciled = coordinator.toggle_reconciled(args.id).await?;
            println!(
                "Bill #{} is now {}.",
                args.id,
                if reconciled { "reconciled" } else { "open" }
            );
        }
        Command::Delete(args) => delete(&mut coordinator, args).await?,
    }

    Ok(())
}

fn print_view(view: &LedgerView<'_>) {
    for bill in &view.rows {
        let kind = bill.kind.map_or("-", |k| k.as_str());
        let category = bill.category.map_or("-", |c| c.as_str());
        let mark = if bill.reconciled { "x" } else { " " };
        println!(
            "[{mark}] #{:<4} {}  {:<24} {:>12}  {kind}/{category}",
            bill.id,
            bill.due_date,
            bill.name,
            bill.amount.to_string(),
        );
    }

    let totals = &view.totals;
    println!();
    println!("Income:      {}", totals.income);
    println!("Assets:      {}", totals.asset);
    println!("Liabilities: {}", totals.liability);
    println!("Expenses:    {}", totals.expense);
    println!("Net:         {}", totals.net());
}

async fn add(coordinator: &mut Coordinator<BillsClient>, args: AddArgs) -> Result<()> {
    let kind = args.kind.as_deref().map(BillKind::try_from).transpose()?;
    let category = args.category.as_deref().map(Category::try_from).transpose()?;
    let recurrence = args
        .recurrence
        .as_deref()
        .map(Recurrence::try_from)
        .transpose()?
        .unwrap_or_default();

    let id = coordinator
        .create(BillDraft {
            name: args.name,
            description: args.description.unwrap_or_default(),
            amount: args.amount,
            kind,
            category,
            due_date: args.due,
            recurrence,
        })
        .await?;
    println!("Created bill #{id}.");
    Ok(())
}

async fn delete(coordinator: &mut Coordinator<BillsClient>, args: DeleteArgs) -> Result<()> {
    let prompt = coordinator.delete_request(args.id)?;

    // Recurring bills go through the blocking confirmation so the scope
    // choice has a stable decision point; no undo window afterwards.
    if prompt.offers_series_choice {
        let choice = if args.series {
            ScopeChoice::Series
        } else if !args.yes && ask("Delete the whole recurring series? [y/N] ")? {
            ScopeChoice::Series
        } else {
            ScopeChoice::Single
        };
        coordinator.confirm_delete(args.id, choice).await?;
        println!("Deleted.");
        return Ok(());
    }

    if args.now {
        coordinator
            .confirm_delete(args.id, ScopeChoice::Single)
            .await?;
        println!("Deleted.");
        return Ok(());
    }

    let deadline = coordinator.delete_with_undo(args.id)?;
    if let Some(bill) = coordinator.pending_deletion(args.id) {
        println!(
            "{} ({}) was deleted. Press Enter to undo...",
            bill.name, bill.amount
        );
    }

    let window = (deadline - Utc::now()).to_std().unwrap_or_default();
    let mut line = String::new();
    let mut input = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        _ = tokio::time::sleep(window) => {}
        _ = input.read_line(&mut line) => {
            if coordinator.undo_delete(args.id) {
                println!("Restored.");
                return Ok(());
            }
        }
    }

    coordinator.commit_expired().await;
    println!("Deleted.");
    Ok(())
}

fn ask(prompt: &str) -> Result<bool> {
    use std::io::Write;

    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}
