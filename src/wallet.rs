//! Wallet seam for entry function submission.
//!
//! The explorer never holds keys. A [`WalletSession`] is whatever signs and
//! submits on the user's behalf; the CLI ships [`DisconnectedWallet`], which
//! lets the dispatcher exercise its "not connected" path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ExplorerError, Result};

/// Transaction payload handed to the wallet for signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub function_arguments: Vec<Value>,
}

/// Wallet answer after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub hash: String,
}

#[async_trait]
pub trait WalletSession: Send + Sync {
    /// Names of wallets available to connect to.
    fn installed_wallets(&self) -> Vec<String>;

    async fn connect(&self, wallet_name: &str) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Connected account address, if any.
    fn account(&self) -> Option<String>;

    async fn sign_and_submit(&self, payload: &EntryPayload) -> Result<SubmitResponse>;
}

/// Session with no wallet behind it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisconnectedWallet;

#[async_trait]
impl WalletSession for DisconnectedWallet {
    fn installed_wallets(&self) -> Vec<String> {
        Vec::new()
    }

    async fn connect(&self, wallet_name: &str) -> Result<()> {
        Err(ExplorerError::Wallet(format!(
            "wallet `{wallet_name}` is not installed"
        )))
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn account(&self) -> Option<String> {
        None
    }

    async fn sign_and_submit(&self, _payload: &EntryPayload) -> Result<SubmitResponse> {
        Err(ExplorerError::WalletNotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disconnected_wallet() {
        let wallet = DisconnectedWallet;
        assert!(!wallet.is_connected());
        assert!(wallet.account().is_none());
        assert!(wallet.installed_wallets().is_empty());
        assert!(matches!(
            wallet.connect("Nightly").await,
            Err(ExplorerError::Wallet(_))
        ));
        assert!(wallet.disconnect().await.is_ok());
    }

    #[test]
    fn test_payload_wire_names() {
        let payload = EntryPayload {
            function: "0x1::coin::transfer".to_string(),
            type_arguments: vec!["0x1::aptos_coin::AptosCoin".to_string()],
            function_arguments: vec![Value::String("0x2".to_string())],
        };
        let wire = serde_json::to_string(&payload).unwrap();
        assert!(wire.contains("\"typeArguments\""));
        assert!(wire.contains("\"functionArguments\""));
    }
}
