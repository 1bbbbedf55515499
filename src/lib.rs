//! movex - Movement blockchain explorer core
//!
//! Read side: transactions, blocks, accounts (tokens, NFTs, modules,
//! resources) from the GraphQL indexer and the fullnode REST API.
//! Write side: running module functions from their on-chain ABI, view
//! functions through the node and entry functions through a wallet session.
//!
//! ## Usage
//!
//! ```bash
//! movex latest
//! movex search 0x1
//! movex view 0x1::coin::balance -t 0x1::aptos_coin::AptosCoin 0x1
//! ```

// Formatting and classification (no I/O)
pub mod json_pretty;
pub mod router;
pub mod util_text;

// ABI model and argument handling
pub mod abi;
pub mod move_args;

// Remote data sources
pub mod indexer;
pub mod node_rpc;
pub mod types;

pub mod cache;
pub mod explorer;

// Invocation
pub mod runner;
pub mod wallet;

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{Config, ConfigArgs};
pub use error::{ExplorerError, Result};
pub use explorer::Explorer;
pub use router::{classify_search_input, Route, SearchKind};
pub use runner::{ModuleRunner, RunOutcome, RunState};
