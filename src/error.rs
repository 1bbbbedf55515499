//! Error taxonomy shared by the indexer, node and invocation layers.
//!
//! Loaders turn "not found" into `Ok(None)` / empty lists, so `NotFound` only
//! escapes where a caller asked for something that must exist (e.g. a
//! function name inside a module ABI).

#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("indexer: {0}")]
    Indexer(String),

    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Please connect your wallet to execute entry functions")]
    WalletNotConnected,

    #[error("function {0} is neither a view nor an entry function")]
    NotCallable(String),

    #[error("{function} runs as a {actual} function, not {requested}")]
    PathMismatch {
        function: String,
        requested: &'static str,
        actual: &'static str,
    },

    #[error("wallet: {0}")]
    Wallet(String),

    #[error("invalid type `{input}` at offset {offset}: {reason}")]
    TypeParse {
        input: String,
        offset: usize,
        reason: String,
    },

    #[error("invalid argument for {type_name}: {reason}")]
    InvalidArgument { type_name: String, reason: String },

    #[error("invalid amount `{0}`")]
    InvalidAmount(String),
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
