//! Module function dispatcher.
//!
//! A run takes exactly one path: view functions go to the node, entry
//! functions go to the wallet. Progress is published on a `watch` channel so
//! a renderer can follow `Idle -> Running -> Succeeded | Failed` without
//! polling.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use crate::error::{ExplorerError, Result};
use crate::move_args::{CallPath, PreparedCall};
use crate::node_rpc::NodeApi;
use crate::wallet::WalletSession;

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Values returned by a view function.
    View(Vec<Value>),
    /// Entry function accepted by the wallet.
    Submitted { success: bool, hash: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Succeeded(RunOutcome),
    Failed(String),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Succeeded(_) | RunState::Failed(_))
    }
}

pub struct ModuleRunner {
    node: Arc<dyn NodeApi>,
    wallet: Arc<dyn WalletSession>,
    strict_args: bool,
    state: watch::Sender<RunState>,
}

impl ModuleRunner {
    pub fn new(node: Arc<dyn NodeApi>, wallet: Arc<dyn WalletSession>) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            node,
            wallet,
            strict_args: false,
            state,
        }
    }

    /// Reject arguments that do not match their declared types instead of
    /// passing them through.
    pub fn with_strict_args(mut self, strict: bool) -> Self {
        self.strict_args = strict;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RunState {
        self.state.borrow().clone()
    }

    /// Look up `module::function` at `address` and align the raw input with
    /// its ABI.
    pub async fn prepare(
        &self,
        address: &str,
        module: &str,
        function: &str,
        type_arguments: Vec<String>,
        arguments: Vec<String>,
    ) -> Result<PreparedCall> {
        let modules = self.node.account_modules(address).await?;
        let descriptor = modules
            .iter()
            .find(|m| m.name == module)
            .ok_or_else(|| ExplorerError::NotFound(format!("module {address}::{module}")))?;
        let exposed = descriptor.find_function(function).ok_or_else(|| {
            ExplorerError::NotFound(format!("function {address}::{module}::{function}"))
        })?;
        Ok(PreparedCall::new(
            address,
            module,
            exposed,
            type_arguments,
            arguments,
        ))
    }

    /// Run a prepared call and return the terminal state it ended in.
    ///
    /// The previous outcome is cleared before anything is sent.
    pub async fn run(&self, call: &PreparedCall) -> RunState {
        self.state.send_replace(RunState::Running);

        let terminal = match self.dispatch(call).await {
            Ok(outcome) => RunState::Succeeded(outcome),
            Err(e) => {
                log::warn!("{} failed: {e}", call.function_id);
                RunState::Failed(e.to_string())
            }
        };
        self.state.send_replace(terminal.clone());
        terminal
    }

    async fn dispatch(&self, call: &PreparedCall) -> Result<RunOutcome> {
        match call.path() {
            Some(CallPath::View) => {
                if self.strict_args {
                    call.check_arguments()?;
                }
                let values = self.node.view(&call.view_request()).await?;
                Ok(RunOutcome::View(values))
            }
            Some(CallPath::Entry) => {
                if !self.wallet.is_connected() {
                    return Err(ExplorerError::WalletNotConnected);
                }
                if self.strict_args {
                    call.check_arguments()?;
                }
                let payload = call.entry_payload();
                log::info!("submitting {}", payload.function);
                let response = self.wallet.sign_and_submit(&payload).await?;
                Ok(RunOutcome::Submitted {
                    success: true,
                    hash: response.hash,
                })
            }
            None => Err(ExplorerError::NotCallable(call.function_id.clone())),
        }
    }
}
