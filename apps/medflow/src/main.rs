//! # MedFlow Command Line
//!
//! Entry point for the `medflow` binary.
//!
//! One-shot subcommands exit as soon as they are done, so a mutation made
//! while connected is synced before exit instead of waiting for the
//! debounce timer. `medflow shell` keeps one controller alive and lets the
//! timer run as it would in a long-lived till.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use medflow_app::state::ConfigState;
use medflow_app::{database_path, init_tracing, AppController};
use medflow_core::{
    Confirmation, DocumentStoreConfig, Item, Money, PaymentMethod, ProviderKind, ProviderParams,
    Transaction,
};
use medflow_store::{LocalStore, StoreConfig};
use medflow_sync::MedflowConfig;

type Input = Lines<BufReader<Stdin>>;

#[derive(Parser)]
#[command(name = "medflow")]
#[command(about = "MedFlow pharmacy point of sale")]
struct Cli {
    /// Config file (defaults to medflow.toml in the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog
    Items {
        /// Filter by name, generic name or category
        #[arg(long)]
        search: Option<String>,
    },
    /// Add an item at the head of the catalog
    AddItem(NewItemArgs),
    /// Change fields of an existing item
    UpdateItem(UpdateItemArgs),
    DeleteItem {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Complete a sale, e.g. `sell --item 1:2 --item P-17:1`
    Sell {
        #[arg(long = "item", value_parser = parse_line, required = true)]
        items: Vec<(String, i64)>,
        #[arg(long, default_value = "cash")]
        payment: PaymentMethod,
        #[arg(long)]
        customer: Option<String>,
    },
    /// Recent transactions, newest first
    Sales {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Dashboard,
    /// Start a session and pull the remote collections
    Connect {
        email: String,
        /// none, record_server or document_store
        #[arg(long, default_value = "none")]
        provider: ProviderKind,
        /// Record server base URL or document store root
        #[arg(long)]
        url: Option<String>,
        /// Document store access token
        #[arg(long)]
        token: Option<String>,
    },
    Disconnect,
    /// Push the catalog and ledger now
    Sync,
    /// Sync indicator and session
    Status,
    /// Write a backup file
    Export {
        /// Target directory (defaults to the current one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Replace catalog and ledger from a backup file
    Import {
        file: PathBuf,
        #[arg(long)]
        yes: bool,
    },
    /// Ask the assistant a question about the inventory
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Clinical notes for one medicine
    Insights {
        #[arg(required = true)]
        medicine: Vec<String>,
    },
    StoreName { name: String },
    /// Show the effective configuration
    Config,
    /// Interactive session; the debounce timer keeps running between commands
    Shell,
}

#[derive(Args)]
struct NewItemArgs {
    /// Generated when omitted
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    name: String,
    #[arg(long)]
    generic: String,
    #[arg(long)]
    category: String,
    #[arg(long, value_parser = parse_money)]
    price: Money,
    #[arg(long)]
    stock: i64,
    /// YYYY-MM-DD
    #[arg(long)]
    expiry: NaiveDate,
    #[arg(long)]
    batch: String,
    #[arg(long)]
    manufacturer: String,
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Args)]
struct UpdateItemArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    generic: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long, value_parser = parse_money)]
    price: Option<Money>,
    #[arg(long)]
    stock: Option<i64>,
    #[arg(long)]
    expiry: Option<NaiveDate>,
    #[arg(long)]
    batch: Option<String>,
    #[arg(long)]
    manufacturer: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

impl Command {
    fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::AddItem(_)
                | Command::UpdateItem(_)
                | Command::DeleteItem { .. }
                | Command::Sell { .. }
                | Command::Import { .. }
                | Command::StoreName { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = MedflowConfig::load(cli.config.clone()).context("loading configuration")?;
    let db_path = database_path().context("locating the local store")?;
    info!(path = %db_path.display(), "Database path determined");

    let store = LocalStore::open(StoreConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {}", db_path.display()))?;
    let ctl = AppController::open(config, store).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let result = match cli.command {
        Command::Shell => shell(&ctl, cli.json, &mut input).await,
        Command::Config => print_config(&ctl, &db_path, cli.json),
        command => {
            let mutation = command.is_mutation();
            let result = execute(&ctl, command, cli.json, &mut input).await;
            if result.is_ok() && mutation && is_connected(&ctl).await {
                let outcome = ctl.sync_now().await?;
                info!(status = %outcome.status, "Synced before exit");
            }
            result
        }
    };

    ctl.shutdown().await;
    result
}

async fn is_connected(ctl: &AppController) -> bool {
    ctl.session().await.is_some_and(|s| s.is_connected())
}

// =============================================================================
// Interactive Shell
// =============================================================================

async fn shell(ctl: &AppController, json: bool, input: &mut Input) -> Result<()> {
    eprintln!("{} (type `help` for commands, `exit` to leave)", ctl.store_name().await);

    loop {
        eprint!("medflow> ");
        let Some(line) = input.next_line().await? else {
            break;
        };
        let words = split_words(&line);
        match words.first().map(String::as_str) {
            None => continue,
            Some("exit" | "quit") => break,
            _ => {}
        }

        let cli = match Cli::try_parse_from(std::iter::once("medflow".to_string()).chain(words)) {
            Ok(cli) => cli,
            Err(e) => {
                e.print().ok();
                continue;
            }
        };

        let outcome = match cli.command {
            Command::Shell => Err(anyhow!("already in the shell")),
            Command::Config => Err(anyhow!("run `medflow config` outside the shell")),
            command => execute(ctl, command, json || cli.json, input).await,
        };
        if let Err(e) = outcome {
            eprintln!("{:#}", e);
        }
    }

    Ok(())
}

/// Splits a shell line on whitespace, keeping double-quoted runs together.
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

async fn confirm(input: &mut Input, prompt: &str) -> Result<Confirmation> {
    eprint!("{} [y/N] ", prompt);
    let answer = input.next_line().await?.unwrap_or_default();
    let yes = matches!(answer.trim().to_lowercase().as_str(), "y" | "yes");
    Ok(Confirmation::from(yes))
}

// =============================================================================
// Commands
// =============================================================================

async fn execute(ctl: &AppController, command: Command, json: bool, input: &mut Input) -> Result<()> {
    match command {
        Command::Items { search } => {
            let items = match search {
                Some(q) => ctl.search_items(&q).await?,
                None => ctl.items().await,
            };
            if json {
                return print_json(&items);
            }
            for item in &items {
                print_item(item);
            }
        }

        Command::AddItem(args) => {
            let item = ctl.add_item(args.into_item()).await?;
            if json {
                return print_json(&item);
            }
            println!("Added {} ({})", item.name, item.id);
        }

        Command::UpdateItem(args) => {
            let current = ctl
                .items()
                .await
                .into_iter()
                .find(|i| i.id == args.id)
                .ok_or_else(|| anyhow!("Item not found: {}", args.id))?;
            let item = ctl.update_item(args.apply(current)).await?;
            if json {
                return print_json(&item);
            }
            println!("Updated {} ({})", item.name, item.id);
        }

        Command::DeleteItem { id, yes } => {
            let confirmation = if yes {
                Confirmation::Confirmed
            } else {
                confirm(input, &format!("Delete item {}?", id)).await?
            };
            if ctl.delete_item(&id, confirmation).await? {
                println!("Deleted {}", id);
            } else {
                println!("Nothing deleted");
            }
        }

        Command::Sell {
            items,
            payment,
            customer,
        } => {
            let cart = ctl.build_cart(&items).await?;
            let txn = ctl.complete_sale(&cart, payment, customer.as_deref()).await?;
            if json {
                return print_json(&txn);
            }
            print_receipt(&txn, &ctl.store_name().await);
        }

        Command::Sales { limit } => {
            let transactions: Vec<Transaction> =
                ctl.transactions().await.into_iter().take(limit).collect();
            if json {
                return print_json(&transactions);
            }
            for txn in &transactions {
                println!(
                    "{}  {}  {:>10}  {:<5} {}",
                    txn.id,
                    txn.timestamp.format("%Y-%m-%d %H:%M"),
                    txn.total().to_string(),
                    txn.payment_method,
                    txn.customer_name
                );
            }
        }

        Command::Dashboard => {
            let stats = ctl.dashboard(Utc::now().date_naive()).await;
            if json {
                return print_json(&stats);
            }
            println!("Total sales:    {}", Money::from_cents(stats.total_sales_cents));
            println!("Transactions:   {}", stats.transaction_count);
            println!("Low stock:      {}", stats.low_stock_count);
            println!("Expiring soon:  {}", stats.expiring_soon_count);
            for item in &stats.critical_items {
                println!("  critical: {} ({} left)", item.name, item.stock);
            }
        }

        Command::Connect {
            email,
            provider,
            url,
            token,
        } => {
            let params = provider_params(provider, url, token);
            let session = ctl.connect(&email, provider, params).await?;
            if json {
                return print_json(&session);
            }
            println!(
                "Connected as {} <{}> via {}",
                session.name, session.email, session.provider
            );
        }

        Command::Disconnect => {
            ctl.disconnect().await?;
            println!("Disconnected; local data kept");
        }

        Command::Sync => {
            let outcome = ctl.sync_now().await?;
            println!(
                "Sync {} ({} collections pushed in {} ms)",
                outcome.status,
                outcome.pushed,
                outcome.latency.as_millis()
            );
        }

        Command::Status => {
            let status = ctl.sync_state().await;
            if json {
                return print_json(&status);
            }
            println!("Store:        {}", ctl.store_name().await);
            println!("Provider:     {}", status.provider);
            println!("Status:       {}", status.status);
            println!(
                "Last synced:  {}",
                status.last_synced_at.as_deref().unwrap_or("never")
            );
            if let Some(ms) = status.latency_ms {
                println!("Latency:      {} ms", ms);
            }
        }

        Command::Export { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            let path = ctl.export_backup_to(&dir).await?;
            println!("Backup written to {}", path.display());
        }

        Command::Import { file, yes } => {
            let confirmation = if yes {
                Confirmation::Confirmed
            } else {
                confirm(input, "Importing replaces the catalog and ledger. Continue?").await?
            };
            if ctl.import_backup_file(&file, confirmation).await? {
                println!("Imported {}", file.display());
            } else {
                println!("Import cancelled");
            }
        }

        Command::Ask { question } => {
            println!("{}", ctl.ask_assistant(&question.join(" ")).await);
        }

        Command::Insights { medicine } => {
            println!("{}", ctl.medicine_insights(&medicine.join(" ")).await);
        }

        Command::StoreName { name } => {
            ctl.set_store_name(&name).await?;
            println!("Store name set to {}", name.trim());
        }

        Command::Config | Command::Shell => {}
    }

    Ok(())
}

fn provider_params(provider: ProviderKind, url: Option<String>, token: Option<String>) -> ProviderParams {
    match provider {
        ProviderKind::None => ProviderParams::default(),
        ProviderKind::RecordServer => ProviderParams {
            record_server_url: url,
            document_store: None,
        },
        ProviderKind::DocumentStore => ProviderParams {
            record_server_url: None,
            document_store: url.map(|url| DocumentStoreConfig {
                url,
                access_token: token.unwrap_or_default(),
            }),
        },
    }
}

impl NewItemArgs {
    fn into_item(self) -> Item {
        Item {
            id: self.id.unwrap_or_default(),
            name: self.name,
            generic_name: self.generic,
            category: self.category,
            price_cents: self.price.cents(),
            stock: self.stock,
            expiry_date: self.expiry,
            batch_number: self.batch,
            manufacturer: self.manufacturer,
            description: self.description,
        }
    }
}

impl UpdateItemArgs {
    fn apply(self, mut item: Item) -> Item {
        if let Some(v) = self.name {
            item.name = v;
        }
        if let Some(v) = self.generic {
            item.generic_name = v;
        }
        if let Some(v) = self.category {
            item.category = v;
        }
        if let Some(v) = self.price {
            item.price_cents = v.cents();
        }
        if let Some(v) = self.stock {
            item.stock = v;
        }
        if let Some(v) = self.expiry {
            item.expiry_date = v;
        }
        if let Some(v) = self.batch {
            item.batch_number = v;
        }
        if let Some(v) = self.manufacturer {
            item.manufacturer = v;
        }
        if let Some(v) = self.description {
            item.description = v;
        }
        item
    }
}

// =============================================================================
// Output
// =============================================================================

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_item(item: &Item) {
    let flag = if item.is_low_stock() { " low" } else { "" };
    println!(
        "{:<18} {:<28} {:>5}{:<4} {:>9}  exp {}",
        item.id,
        item.name,
        item.stock,
        flag,
        item.price().to_string(),
        item.expiry_date
    );
}

fn print_receipt(txn: &Transaction, store_name: &str) {
    println!("{}", store_name);
    println!("Receipt {}  {}", txn.id, txn.timestamp.format("%Y-%m-%d %H:%M"));
    println!("Customer: {}", txn.customer_name);
    for line in &txn.items {
        println!(
            "  {:<28} {:>3} x {:>9} = {:>10}",
            line.item.name,
            line.quantity,
            line.item.price().to_string(),
            line.line_total().to_string()
        );
    }
    println!("  Subtotal {:>10}", Money::from_cents(txn.subtotal_cents).to_string());
    println!("  Tax      {:>10}", Money::from_cents(txn.tax_cents).to_string());
    println!("  Total    {:>10}  ({})", txn.total().to_string(), txn.payment_method);
}

fn print_config(ctl: &AppController, db_path: &std::path::Path, json: bool) -> Result<()> {
    let state = ConfigState::new(ctl.config(), db_path);
    if json {
        return print_json(&state);
    }
    println!("Store name:        {}", state.store_name);
    println!("Currency symbol:   {}", state.currency_symbol);
    println!("Database:          {}", state.database_path.display());
    println!("Debounce:          {} s", state.debounce_secs);
    println!("Page size:         {}", state.page_size);
    println!("Record push mode:  {}", state.record_push_mode);
    match state.request_timeout_secs {
        Some(secs) => println!("Request timeout:   {} s", secs),
        None => println!("Request timeout:   none"),
    }
    println!("Assistant model:   {}", state.assistant_model);
    println!(
        "Assistant key:     {}",
        if state.assistant_configured { "set" } else { "not set" }
    );
    Ok(())
}

// =============================================================================
// Argument Parsers
// =============================================================================

fn parse_money(s: &str) -> Result<Money, String> {
    Money::parse(s).map_err(|e| e.to_string())
}

/// `ID:QTY`, quantity defaulting to 1.
fn parse_line(s: &str) -> Result<(String, i64), String> {
    let (id, qty) = match s.rsplit_once(':') {
        Some((id, qty)) => (id, qty),
        None => (s, "1"),
    };
    if id.trim().is_empty() {
        return Err(format!("missing item id in '{}'", s));
    }
    let qty = qty
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    Ok((id.trim().to_string(), qty))
}
