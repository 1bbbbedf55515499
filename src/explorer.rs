//! View loaders: everything a screen needs, fetched in one call.
//!
//! Independent lookups run concurrently (per-version transactions, per-asset
//! metadata, per-NFT token data, block header next to its transactions).
//! Results go through the [`QueryCache`], keyed by operation and parameters,
//! and are kept only while the same view stays open.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::abi::ModuleDescriptor;
use crate::cache::{cache_key, QueryCache};
use crate::error::Result;
use crate::indexer::{IndexerApi, ACCOUNT_NFT_LIMIT};
use crate::node_rpc::NodeApi;
use crate::router::Route;
use crate::types::{
    AccountAsset, BlockRecord, NftTokenData, TokenMetadata, TokenOwnership, TransactionEvent,
    TransactionRecord,
};
use crate::util_text::{format_fixed_point, truncate_address, MOVE_DECIMALS};

/// One page of a list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<T>,
    /// The underlying query filled the page, so there may be more.
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.page > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AccountTab {
    Transactions,
    Tokens,
    Nfts,
    Modules,
    Resources,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountOverview {
    pub address: String,
    pub modules: Vec<ModuleDescriptor>,
}

impl AccountOverview {
    /// Tabs shown for this account; `Modules` only when something is published.
    pub fn tabs(&self) -> Vec<AccountTab> {
        let mut tabs = vec![AccountTab::Transactions, AccountTab::Tokens, AccountTab::Nfts];
        if !self.modules.is_empty() {
            tabs.push(AccountTab::Modules);
        }
        tabs.push(AccountTab::Resources);
        tabs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBalance {
    pub asset: AccountAsset,
    pub metadata: Option<TokenMetadata>,
}

impl TokenBalance {
    /// Metadata name, else the last `::` segment of the asset type.
    pub fn display_name(&self) -> String {
        match &self.metadata {
            Some(m) if !m.name.is_empty() => m.name.clone(),
            _ => self
                .asset
                .asset_type
                .rsplit("::")
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("Unknown")
                .to_string(),
        }
    }

    pub fn symbol(&self) -> &str {
        self.metadata.as_ref().map(|m| m.symbol.as_str()).unwrap_or("")
    }

    pub fn decimals(&self) -> u32 {
        self.metadata
            .as_ref()
            .map(|m| m.decimals)
            .unwrap_or(MOVE_DECIMALS)
    }

    /// `1,234.5 SYM`, or the raw amount if the indexer sent something odd.
    pub fn formatted_amount(&self) -> String {
        let amount = format_fixed_point(&self.asset.amount, self.decimals())
            .unwrap_or_else(|_| self.asset.amount.clone());
        match self.symbol() {
            "" => amount,
            symbol => format!("{amount} {symbol}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NftHolding {
    pub ownership: TokenOwnership,
    pub data: Option<NftTokenData>,
}

impl NftHolding {
    pub fn display_name(&self) -> String {
        match &self.data {
            Some(d) if !d.token_name.is_empty() => d.token_name.clone(),
            _ => truncate_address(&self.ownership.token_data_id, 8, 6),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDetail {
    pub transaction: TransactionRecord,
    /// `None` when events were not requested.
    pub events: Option<Vec<TransactionEvent>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockDetail {
    pub block: BlockRecord,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Clone)]
pub struct Explorer {
    indexer: Arc<dyn IndexerApi>,
    node: Arc<dyn NodeApi>,
    cache: QueryCache,
    current_view: Arc<Mutex<Option<Route>>>,
    page_size: u32,
}

impl Explorer {
    pub fn new(indexer: Arc<dyn IndexerApi>, node: Arc<dyn NodeApi>, page_size: u32) -> Self {
        Self {
            indexer,
            node,
            cache: QueryCache::new(),
            current_view: Arc::new(Mutex::new(None)),
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn node(&self) -> Arc<dyn NodeApi> {
        Arc::clone(&self.node)
    }

    /// Record that `route` is now on screen. Switching to a different view
    /// drops every cached result, so coming back refetches; staying on the
    /// same view (paging, tab changes) keeps them. Returns whether the cache
    /// was cleared.
    pub async fn enter_view(&self, route: &Route) -> bool {
        let previous = {
            let mut current = self.current_view.lock().await;
            if current.as_ref() == Some(route) {
                return false;
            }
            current.replace(route.clone())
        };
        if previous.is_none() {
            return false;
        }
        log::debug!("view changed to {route:?}, clearing cache");
        self.cache.clear().await;
        true
    }

    /// Drop every cached result, e.g. for an explicit refresh.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    fn page<T>(&self, page: u32, fetched: usize, items: Vec<T>) -> Page<T> {
        Page {
            page,
            page_size: self.page_size,
            items,
            has_next: fetched >= self.page_size as usize,
        }
    }

    pub async fn latest_transactions(&self, page: u32) -> Result<Page<TransactionRecord>> {
        let (limit, offset) = (self.page_size, page.saturating_mul(self.page_size));
        log::info!("loading latest transactions, page {page}");
        let indexer = Arc::clone(&self.indexer);
        let txs: Vec<TransactionRecord> = self
            .cache
            .get_or_fetch(cache_key("latest", &[&limit, &offset]), || async move {
                indexer.latest_transactions(limit, offset).await
            })
            .await?;
        let fetched = txs.len();
        Ok(self.page(page, fetched, txs))
    }

    async fn transaction_by_version(&self, version: u64) -> Result<Option<TransactionRecord>> {
        let indexer = Arc::clone(&self.indexer);
        self.cache
            .get_or_fetch(cache_key("tx", &[&version]), || async move {
                indexer.transaction_by_version(version).await
            })
            .await
    }

    async fn transaction_events(&self, version: u64) -> Result<Vec<TransactionEvent>> {
        let indexer = Arc::clone(&self.indexer);
        self.cache
            .get_or_fetch(cache_key("events", &[&version]), || async move {
                indexer.transaction_events(version).await
            })
            .await
    }

    /// Transaction by version, optionally with its events.
    /// `Ok(None)` when the version is unknown or not a user transaction.
    pub async fn transaction(
        &self,
        version: u64,
        with_events: bool,
    ) -> Result<Option<TransactionDetail>> {
        log::info!("loading transaction {version}");
        if !with_events {
            return Ok(self
                .transaction_by_version(version)
                .await?
                .map(|transaction| TransactionDetail {
                    transaction,
                    events: None,
                }));
        }

        let (tx, events) = futures::join!(
            self.transaction_by_version(version),
            self.transaction_events(version)
        );
        let Some(transaction) = tx? else {
            return Ok(None);
        };
        Ok(Some(TransactionDetail {
            transaction,
            events: Some(events?),
        }))
    }

    /// Account transactions: one page of versions, then every version
    /// fetched concurrently. Versions the indexer cannot resolve are skipped.
    pub async fn account_transactions(
        &self,
        address: &str,
        page: u32,
    ) -> Result<Page<TransactionRecord>> {
        let (limit, offset) = (self.page_size, page.saturating_mul(self.page_size));
        log::info!("loading transactions of {address}, page {page}");
        let indexer = Arc::clone(&self.indexer);
        let owned = address.to_string();
        let refs = self
            .cache
            .get_or_fetch(
                cache_key("account_txs", &[&address, &limit, &offset]),
                || async move { indexer.account_transactions(&owned, limit, offset).await },
            )
            .await?;

        let lookups = refs
            .iter()
            .map(|r| self.transaction_by_version(r.transaction_version));
        let mut txs = Vec::with_capacity(refs.len());
        for tx in join_all(lookups).await {
            if let Some(tx) = tx? {
                txs.push(tx);
            }
        }
        if txs.len() < refs.len() {
            log::debug!("{} versions missing from user_transactions", refs.len() - txs.len());
        }
        Ok(self.page(page, refs.len(), txs))
    }

    /// Positive fungible balances with their metadata. A failed metadata
    /// lookup only loses the nice name for that asset.
    pub async fn account_tokens(&self, address: &str) -> Result<Vec<TokenBalance>> {
        let indexer = Arc::clone(&self.indexer);
        let owned = address.to_string();
        let assets = self
            .cache
            .get_or_fetch(cache_key("tokens", &[&address]), || async move {
                indexer.account_token_balances(&owned).await
            })
            .await?;

        let lookups = assets.iter().map(|a| self.token_metadata(&a.asset_type));
        let metadata = join_all(lookups).await;
        Ok(assets
            .into_iter()
            .zip(metadata)
            .map(|(asset, meta)| TokenBalance {
                metadata: meta.unwrap_or_else(|e| {
                    log::warn!("metadata for {}: {e}", asset.asset_type);
                    None
                }),
                asset,
            })
            .collect())
    }

    async fn token_metadata(&self, asset_type: &str) -> Result<Option<TokenMetadata>> {
        let indexer = Arc::clone(&self.indexer);
        let owned = asset_type.to_string();
        self.cache
            .get_or_fetch(cache_key("token_metadata", &[&asset_type]), || async move {
                indexer.token_metadata(&owned).await
            })
            .await
    }

    pub async fn account_nfts(&self, address: &str) -> Result<Vec<NftHolding>> {
        let indexer = Arc::clone(&self.indexer);
        let owned = address.to_string();
        let nfts = self
            .cache
            .get_or_fetch(cache_key("nfts", &[&address]), || async move {
                indexer.account_nfts(&owned, ACCOUNT_NFT_LIMIT).await
            })
            .await?;

        let lookups = nfts.iter().map(|n| self.nft_data(&n.token_data_id));
        let data = join_all(lookups).await;
        Ok(nfts
            .into_iter()
            .zip(data)
            .map(|(ownership, data)| NftHolding {
                data: data.unwrap_or_else(|e| {
                    log::warn!("token data for {}: {e}", ownership.token_data_id);
                    None
                }),
                ownership,
            })
            .collect())
    }

    async fn nft_data(&self, token_data_id: &str) -> Result<Option<NftTokenData>> {
        let indexer = Arc::clone(&self.indexer);
        let owned = token_data_id.to_string();
        self.cache
            .get_or_fetch(cache_key("nft_data", &[&token_data_id]), || async move {
                indexer.nft_token_data(&owned).await
            })
            .await
    }

    pub async fn account_modules(&self, address: &str) -> Result<Vec<ModuleDescriptor>> {
        let node = Arc::clone(&self.node);
        let owned = address.to_string();
        self.cache
            .get_or_fetch(cache_key("modules", &[&address]), || async move {
                node.account_modules(&owned).await
            })
            .await
    }

    pub async fn account_resources(&self, address: &str) -> Result<Vec<Value>> {
        let node = Arc::clone(&self.node);
        let owned = address.to_string();
        self.cache
            .get_or_fetch(cache_key("resources", &[&address]), || async move {
                node.account_resources(&owned).await
            })
            .await
    }

    /// Header data for the account screen.
    pub async fn account_overview(&self, address: &str) -> Result<AccountOverview> {
        log::info!("loading account {address}");
        Ok(AccountOverview {
            address: address.to_string(),
            modules: self.account_modules(address).await?,
        })
    }

    /// Block header and its user transactions, fetched together.
    /// `Ok(None)` when no block has this height.
    pub async fn block(&self, height: u64) -> Result<Option<BlockDetail>> {
        log::info!("loading block {height}");
        let header_indexer = Arc::clone(&self.indexer);
        let txs_indexer = Arc::clone(&self.indexer);
        let (block, transactions) = futures::join!(
            self.cache
                .get_or_fetch(cache_key("block", &[&height]), || async move {
                    header_indexer.block_by_height(height).await
                }),
            self.cache
                .get_or_fetch(cache_key("block_txs", &[&height]), || async move {
                    txs_indexer.block_transactions(height).await
                })
        );
        let Some(block) = block? else {
            return Ok(None);
        };
        Ok(Some(BlockDetail {
            block,
            transactions: transactions?,
        }))
    }
}
