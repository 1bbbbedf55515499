// Command-line explorer for the Movement network

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use movex::{
    abi::ModuleDescriptor,
    config::{Config, ConfigArgs},
    explorer::{AccountTab, Explorer, Page},
    indexer::IndexerClient,
    json_pretty::{pretty, pretty_safe},
    move_args::{suggest_placeholder_for, type_argument_placeholder, CallPath},
    node_rpc::NodeClient,
    router::{classify_search_input, Route},
    runner::{ModuleRunner, RunOutcome, RunState},
    types::TransactionRecord,
    util_text::{
        format_gas_cost, format_local_datetime, format_relative_time, parse_entry_function_id,
        truncate_address, truncate_address_default,
    },
    wallet::DisconnectedWallet,
};

/// Largest resource / result dump printed before truncation.
const MAX_DUMP_BYTES: usize = 64 * 1024;

/// movex - Movement blockchain explorer
///
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug)]
#[command(name = "movex")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Movement blockchain explorer", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Print the resolved configuration to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Latest user transactions
    Latest {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Transaction detail by version
    Tx {
        version: u64,
        /// Also load the emitted events
        #[arg(long)]
        events: bool,
    },
    /// Account detail
    Account {
        address: String,
        #[arg(long, value_enum, default_value_t = AccountTab::Transactions)]
        tab: AccountTab,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Block detail by height
    Block { height: u64 },
    /// Classify free text (address, version or block height) and open it
    Search { text: String },
    /// Callable functions published at an address
    Modules { address: String },
    /// Run a view function: movex view 0x1::coin::balance -t <TYPE> <ARG>...
    View(CallArgs),
    /// Submit an entry function through the connected wallet
    Run(CallArgs),
}

#[derive(clap::Args, Debug)]
struct CallArgs {
    /// Function id, address::module::function
    function: String,
    /// Generic type argument, once per slot
    #[arg(short = 't', long = "type-arg")]
    type_args: Vec<String>,
    /// Value arguments in declaration order (signers are implicit)
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = Config::from_args(cli.config.clone()).context("Failed to load configuration")?;
    if cli.verbose {
        cfg.print_summary();
    }

    let node = Arc::new(NodeClient::new(cfg.node_url.clone(), cfg.rpc_timeout_ms));
    let indexer = Arc::new(IndexerClient::new(
        cfg.indexer_url.clone(),
        cfg.rpc_timeout_ms,
    ));
    let explorer = Explorer::new(indexer, node, cfg.page_size);

    match cli.command {
        Command::Latest { page } => {
            explorer.enter_view(&Route::Latest).await;
            let txs = explorer.latest_transactions(page).await?;
            emit(cli.json, &txs, || print_tx_page("Latest transactions", &txs))
        }
        Command::Tx { version, events } => show_route(
            &explorer,
            Route::Transaction { version },
            events,
            cli.json,
        )
        .await,
        Command::Account { address, tab, page } => {
            show_account(&explorer, &address, tab, page, cli.json).await
        }
        Command::Block { height } => {
            show_route(&explorer, Route::Block { height }, false, cli.json).await
        }
        Command::Search { text } => {
            let kind = classify_search_input(&text, cfg.version_threshold);
            log::info!("search {text:?} -> {kind:?}");
            match Route::from_search(&text, cfg.version_threshold) {
                Some(route) => show_route(&explorer, route, false, cli.json).await,
                None => bail!(
                    "`{}` is not an address (0x + 64 hex), version or block height",
                    text.trim()
                ),
            }
        }
        Command::Modules { address } => {
            let modules = explorer.account_modules(&address).await?;
            emit(cli.json, &modules, || print_modules(&address, &modules))
        }
        Command::View(call) => run_call(&explorer, &cfg, call, true, cli.json).await,
        Command::Run(call) => run_call(&explorer, &cfg, call, false, cli.json).await,
    }
}

fn emit<T: Serialize>(json: bool, value: &T, table: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", pretty(&serde_json::to_value(value)?));
    } else {
        table();
    }
    Ok(())
}

async fn show_route(explorer: &Explorer, route: Route, events: bool, json: bool) -> Result<()> {
    explorer.enter_view(&route).await;
    match route {
        Route::Latest => {
            let txs = explorer.latest_transactions(0).await?;
            emit(json, &txs, || print_tx_page("Latest transactions", &txs))
        }
        Route::Transaction { version } => {
            let Some(detail) = explorer.transaction(version, events).await? else {
                bail!("Version {version} does not exist or is not a user transaction.");
            };
            emit(json, &detail, || {
                let tx = &detail.transaction;
                println!("Transaction {}", tx.version);
                println!("  Sender:    {}", tx.sender);
                println!(
                    "  Function:  {}",
                    tx.entry_function_id_str.as_deref().unwrap_or("-")
                );
                println!(
                    "  Time:      {} ({})",
                    format_local_datetime(&tx.timestamp),
                    format_relative_time(&tx.timestamp)
                );
                println!("  Block:     {}", tx.block_height);
                println!("  Epoch:     {}", tx.epoch);
                println!("  Sequence:  {}", tx.sequence_number);
                println!("  Max gas:   {}", tx.max_gas_amount);
                println!(
                    "  Price:     {} MOVE/unit",
                    format_gas_cost(1, tx.gas_unit_price)
                );
                println!(
                    "  Max cost:  {} MOVE",
                    format_gas_cost(tx.max_gas_amount, tx.gas_unit_price)
                );
                if let Some(events) = &detail.events {
                    println!("\nEvents ({})", events.len());
                    for ev in events {
                        println!("  #{} {}", ev.event_index, ev.event_type);
                        for line in pretty_safe(&ev.decoded_data(), MAX_DUMP_BYTES).lines() {
                            println!("      {line}");
                        }
                    }
                }
            })
        }
        Route::Account { address } => {
            show_account(explorer, &address, AccountTab::Transactions, 0, json).await
        }
        Route::Block { height } => {
            let Some(detail) = explorer.block(height).await? else {
                bail!("Block {height} not found.");
            };
            emit(json, &detail, || {
                let b = &detail.block;
                println!("Block {}", b.block_height);
                println!("  Version:   {}", b.version);
                println!("  Epoch:     {}  Round: {}", b.epoch, b.round);
                println!("  Proposer:  {}", b.proposer);
                println!(
                    "  Time:      {} ({})",
                    format_local_datetime(&b.timestamp),
                    format_relative_time(&b.timestamp)
                );
                println!();
                if detail.transactions.is_empty() {
                    println!("No user transactions in this block.");
                } else {
                    print_tx_rows(
                        &format!("Transactions in block ({})", detail.transactions.len()),
                        &detail.transactions,
                    );
                }
            })
        }
    }
}

async fn show_account(
    explorer: &Explorer,
    address: &str,
    tab: AccountTab,
    page: u32,
    json: bool,
) -> Result<()> {
    explorer
        .enter_view(&Route::Account {
            address: address.to_string(),
        })
        .await;
    let overview = explorer.account_overview(address).await?;
    if !json {
        let tabs: Vec<String> = overview
            .tabs()
            .iter()
            .map(|t| match t {
                AccountTab::Modules => format!("{t:?} ({})", overview.modules.len()),
                _ => format!("{t:?}"),
            })
            .collect();
        println!("Account {address}");
        println!("  Tabs: {}\n", tabs.join(" | "));
    }

    match tab {
        AccountTab::Transactions => {
            let txs = explorer.account_transactions(address, page).await?;
            emit(json, &txs, || print_tx_page("Transactions", &txs))
        }
        AccountTab::Tokens => {
            let tokens = explorer.account_tokens(address).await?;
            emit(json, &tokens, || {
                if tokens.is_empty() {
                    println!("No tokens found.");
                }
                for t in &tokens {
                    println!(
                        "  {:<24} {:>28}  {}",
                        t.display_name(),
                        t.formatted_amount(),
                        truncate_address(&t.asset.asset_type, 16, 8)
                    );
                }
            })
        }
        AccountTab::Nfts => {
            let nfts = explorer.account_nfts(address).await?;
            emit(json, &nfts, || {
                if nfts.is_empty() {
                    println!("No NFTs found.");
                }
                for n in &nfts {
                    println!("  {:<40} amount {}", n.display_name(), n.ownership.amount);
                }
            })
        }
        AccountTab::Modules => emit(json, &overview.modules, || {
            print_modules(address, &overview.modules)
        }),
        AccountTab::Resources => {
            let resources = explorer.account_resources(address).await?;
            let value = serde_json::Value::Array(resources);
            println!("{}", pretty_safe(&value, MAX_DUMP_BYTES));
            Ok(())
        }
    }
}

fn print_tx_page(title: &str, page: &Page<TransactionRecord>) {
    print_tx_rows(title, &page.items);
    let mut nav = vec![format!("page {}", page.page)];
    if page.has_prev() {
        nav.push(format!("--page {} for previous", page.page - 1));
    }
    if page.has_next {
        nav.push(format!("--page {} for next", page.page + 1));
    }
    println!("\n{}", nav.join(", "));
}

fn print_tx_rows(title: &str, txs: &[TransactionRecord]) {
    println!("{title}");
    if txs.is_empty() {
        println!("  No transactions found.");
        return;
    }
    println!(
        "  {:<12} {:<15} {:<28} {:<10} {:>14}",
        "VERSION", "SENDER", "FUNCTION", "AGE", "MAX GAS"
    );
    for tx in txs {
        let function = parse_entry_function_id(tx.entry_function_id_str.as_deref())
            .map(|f| f.function)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<12} {:<15} {:<28} {:<10} {:>14}",
            tx.version,
            truncate_address_default(&tx.sender),
            function,
            format_relative_time(&tx.timestamp),
            format_gas_cost(tx.max_gas_amount, tx.gas_unit_price)
        );
    }
}

fn print_modules(address: &str, modules: &[ModuleDescriptor]) {
    if modules.is_empty() {
        println!("No modules published at {address}.");
        return;
    }
    for module in modules {
        println!(
            "{}::{} ({} functions)",
            module.address,
            module.name,
            module.exposed_functions.len()
        );
        for f in module.callable_functions() {
            let kind = if f.is_view { "view" } else { "entry" };
            println!("  [{kind}] {}", f.signature());
            for i in 0..f.generic_type_params.len() {
                println!("      -t  {}", type_argument_placeholder(i));
            }
            for param in f.value_params() {
                println!("      {param}: {}", suggest_placeholder_for(param));
            }
        }
    }
}

async fn run_call(
    explorer: &Explorer,
    cfg: &Config,
    call: CallArgs,
    expect_view: bool,
    json: bool,
) -> Result<()> {
    let id = parse_entry_function_id(Some(&call.function))
        .ok_or_else(|| anyhow!("expected address::module::function, got {}", call.function))?;
    let (address, module) = id
        .module
        .split_once("::")
        .ok_or_else(|| anyhow!("expected address::module::function, got {}", call.function))?;

    let runner = ModuleRunner::new(explorer.node(), Arc::new(DisconnectedWallet))
        .with_strict_args(cfg.strict_args);
    let prepared = runner
        .prepare(address, module, &id.function, call.type_args, call.args)
        .await?;

    let requested = if expect_view {
        CallPath::View
    } else {
        CallPath::Entry
    };
    prepared.ensure_path(requested)?;

    match runner.run(&prepared).await {
        RunState::Succeeded(RunOutcome::View(values)) => {
            let value = serde_json::Value::Array(values);
            if json {
                println!("{}", pretty(&value));
            } else {
                println!("{}", pretty_safe(&value, MAX_DUMP_BYTES));
            }
            Ok(())
        }
        RunState::Succeeded(RunOutcome::Submitted { hash, .. }) => {
            println!("Transaction submitted: {hash}");
            Ok(())
        }
        RunState::Failed(message) => Err(anyhow!(message)),
        RunState::Idle | RunState::Running => Err(anyhow!("run did not finish")),
    }
}
