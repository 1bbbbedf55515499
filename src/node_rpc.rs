//! Fullnode REST client: module ABIs, resources and read-only view calls.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::abi::ModuleDescriptor;
use crate::error::{ExplorerError, Result};

pub const DEFAULT_NODE_URL: &str = "https://mainnet.movementnetwork.xyz/v1";

static HTTP: OnceLock<reqwest::Client> = OnceLock::new();

pub(crate) fn http_client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default http client: {e}");
                reqwest::Client::new()
            })
    })
}

/// Body of `POST /view`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRequest {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<String>,
}

#[derive(Deserialize)]
struct ModuleEntry {
    #[serde(default)]
    abi: Option<ModuleDescriptor>,
}

/// Node operations the explorer and the module runner depend on.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Published modules of an account. Unknown accounts have none.
    async fn account_modules(&self, address: &str) -> Result<Vec<ModuleDescriptor>>;

    /// Raw resources of an account. Unknown accounts have none.
    async fn account_resources(&self, address: &str) -> Result<Vec<Value>>;

    /// Execute a view function and return its values.
    async fn view(&self, request: &ViewRequest) -> Result<Vec<Value>>;
}

#[derive(Debug, Clone)]
pub struct NodeClient {
    base_url: String,
    timeout_ms: u64,
}

impl NodeClient {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON document. A 404 comes back as `Ok(None)`.
    async fn get_json(&self, path: &str) -> Result<Option<Value>> {
        let res = http_client()
            .get(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = res.status().as_u16();
        log::debug!("GET {path} -> {status}");
        let body = res.text().await?;
        decode_reply(status, body, true)
    }
}

/// Map a node reply onto the client contract.
///
/// 2xx decodes the body. 404 is `Ok(None)` when `missing_is_empty`, any
/// other status is an error carrying the body text unchanged.
fn decode_reply(status: u16, body: String, missing_is_empty: bool) -> Result<Option<Value>> {
    if (200..300).contains(&status) {
        return Ok(Some(serde_json::from_str(&body)?));
    }
    if status == 404 && missing_is_empty {
        return Ok(None);
    }
    Err(ExplorerError::Http { status, body })
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn account_modules(&self, address: &str) -> Result<Vec<ModuleDescriptor>> {
        let Some(raw) = self.get_json(&format!("/accounts/{address}/modules")).await? else {
            return Ok(Vec::new());
        };
        let entries: Vec<ModuleEntry> = serde_json::from_value(raw)?;
        let modules: Vec<ModuleDescriptor> = entries.into_iter().filter_map(|e| e.abi).collect();
        log::debug!("{} modules at {address}", modules.len());
        Ok(modules)
    }

    async fn account_resources(&self, address: &str) -> Result<Vec<Value>> {
        match self.get_json(&format!("/accounts/{address}/resources")).await? {
            Some(raw) => Ok(serde_json::from_value(raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn view(&self, request: &ViewRequest) -> Result<Vec<Value>> {
        log::info!("view {}", request.function);
        let res = http_client()
            .post(format!("{}/view", self.base_url))
            .json(request)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = res.status().as_u16();
        let body = res.text().await?;
        match decode_reply(status, body, false)? {
            Some(values) => Ok(serde_json::from_value(values)?),
            None => Ok(Vec::new()),
        }
    }
}
