use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use movex::abi::ModuleDescriptor;
use movex::explorer::AccountTab;
use movex::indexer::IndexerApi;
use movex::node_rpc::{NodeApi, ViewRequest};
use movex::types::{
    AccountAsset, AccountTransaction, BlockRecord, NftTokenData, TokenMetadata, TokenOwnership,
    TransactionEvent, TransactionRecord,
};
use movex::{Explorer, ExplorerError, Result, Route};

fn tx(version: u64, block_height: u64) -> TransactionRecord {
    serde_json::from_value(json!({
        "version": version,
        "sender": "0xabc",
        "gas_unit_price": 100,
        "max_gas_amount": "2000",
        "timestamp": "2024-05-10T11:59:30",
        "block_height": block_height,
        "entry_function_id_str": "0x1::coin::transfer",
        "epoch": 7,
        "sequence_number": 1
    }))
    .unwrap()
}

/// In-memory indexer: transactions 1..=30, version 13 missing.
struct FakeIndexer {
    txs: HashMap<u64, TransactionRecord>,
    version_lookups: AtomicUsize,
    latest_calls: AtomicUsize,
}

impl FakeIndexer {
    fn new() -> Self {
        let txs = (1..=30)
            .filter(|v| *v != 13)
            .map(|v| (v, tx(v, v / 10)))
            .collect();
        Self {
            txs,
            version_lookups: AtomicUsize::new(0),
            latest_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IndexerApi for FakeIndexer {
    async fn latest_transactions(&self, limit: u32, offset: u32) -> Result<Vec<TransactionRecord>> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        let mut all: Vec<_> = self.txs.values().cloned().collect();
        all.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn transaction_by_version(&self, version: u64) -> Result<Option<TransactionRecord>> {
        self.version_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.txs.get(&version).cloned())
    }

    async fn account_transactions(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AccountTransaction>> {
        Ok((1..=30u64)
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|v| AccountTransaction {
                transaction_version: v,
                account_address: address.to_string(),
            })
            .collect())
    }

    async fn account_token_balances(&self, address: &str) -> Result<Vec<AccountAsset>> {
        Ok(vec![
            AccountAsset {
                owner_address: address.to_string(),
                asset_type: "0x1::aptos_coin::AptosCoin".to_string(),
                amount: "150000000".to_string(),
                last_transaction_version: 3,
            },
            AccountAsset {
                owner_address: address.to_string(),
                asset_type: "0xbroken".to_string(),
                amount: "42".to_string(),
                last_transaction_version: 4,
            },
        ])
    }

    async fn account_nfts(&self, address: &str, limit: u32) -> Result<Vec<TokenOwnership>> {
        assert_eq!(limit, 50);
        Ok(vec![TokenOwnership {
            token_data_id: "0xnft".to_string(),
            amount: "1".to_string(),
            last_transaction_version: 9,
            owner_address: address.to_string(),
        }])
    }

    async fn block_by_height(&self, height: u64) -> Result<Option<BlockRecord>> {
        if height > 3 {
            return Ok(None);
        }
        Ok(Some(BlockRecord {
            version: height * 10,
            block_height: height,
            epoch: 7,
            round: 1,
            proposer: "0xval".to_string(),
            timestamp: "2024-05-10T11:59:30".to_string(),
        }))
    }

    async fn block_transactions(&self, height: u64) -> Result<Vec<TransactionRecord>> {
        let mut txs: Vec<_> = self
            .txs
            .values()
            .filter(|t| t.block_height == height)
            .cloned()
            .collect();
        txs.sort_by_key(|t| t.version);
        Ok(txs)
    }

    async fn transaction_events(&self, version: u64) -> Result<Vec<TransactionEvent>> {
        Ok(vec![serde_json::from_value(json!({
            "transaction_version": version,
            "event_index": 0,
            "account_address": "0xabc",
            "type": "0x1::coin::WithdrawEvent",
            "data": "{\"amount\":\"5\"}",
            "sequence_number": 0,
            "creation_number": 2
        }))
        .unwrap()])
    }

    async fn token_metadata(&self, asset_type: &str) -> Result<Option<TokenMetadata>> {
        if asset_type == "0xbroken" {
            return Err(ExplorerError::Indexer("timeout".to_string()));
        }
        Ok(Some(TokenMetadata {
            asset_type: asset_type.to_string(),
            name: "Move Coin".to_string(),
            symbol: "MOVE".to_string(),
            decimals: 8,
            icon_uri: None,
        }))
    }

    async fn nft_token_data(&self, token_data_id: &str) -> Result<Option<NftTokenData>> {
        Ok(Some(NftTokenData {
            token_data_id: token_data_id.to_string(),
            token_name: "Gorilla #1".to_string(),
            token_uri: "https://example.invalid/1.png".to_string(),
            description: String::new(),
            collection_id: "0xcol".to_string(),
        }))
    }
}

struct EmptyNode;

#[async_trait]
impl NodeApi for EmptyNode {
    async fn account_modules(&self, _address: &str) -> Result<Vec<ModuleDescriptor>> {
        Ok(vec![])
    }

    async fn account_resources(&self, _address: &str) -> Result<Vec<Value>> {
        Ok(vec![json!({"type": "0x1::account::Account", "data": {}})])
    }

    async fn view(&self, _request: &ViewRequest) -> Result<Vec<Value>> {
        Ok(vec![])
    }
}

fn explorer(indexer: Arc<FakeIndexer>, page_size: u32) -> Explorer {
    Explorer::new(indexer, Arc::new(EmptyNode), page_size)
}

#[tokio::test]
async fn latest_pages() {
    let ex = explorer(Arc::new(FakeIndexer::new()), 25);
    let first = ex.latest_transactions(0).await.unwrap();
    assert_eq!(first.items.len(), 25);
    assert!(first.has_next);
    assert!(!first.has_prev());
    assert_eq!(first.items[0].version, 30);

    let second = ex.latest_transactions(1).await.unwrap();
    assert_eq!(second.items.len(), 4);
    assert!(!second.has_next);
}

#[tokio::test]
async fn account_transactions_skip_missing_versions() {
    let indexer = Arc::new(FakeIndexer::new());
    let ex = explorer(indexer.clone(), 20);
    let page = ex.account_transactions("0xabc", 0).await.unwrap();
    // versions 30..=11 requested, 13 is unknown
    assert_eq!(page.items.len(), 19);
    assert!(page.has_next);
    assert!(page.items.iter().all(|t| t.version != 13));
    assert_eq!(indexer.version_lookups.load(Ordering::SeqCst), 20);

    // second load is served from the cache
    ex.account_transactions("0xabc", 0).await.unwrap();
    assert_eq!(indexer.version_lookups.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn tokens_survive_metadata_failure() {
    let ex = explorer(Arc::new(FakeIndexer::new()), 25);
    let tokens = ex.account_tokens("0xabc").await.unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].display_name(), "Move Coin");
    assert_eq!(tokens[0].formatted_amount(), "1.5 MOVE");
    assert!(tokens[1].metadata.is_none());
    assert_eq!(tokens[1].display_name(), "0xbroken");
    assert_eq!(tokens[1].formatted_amount(), "0");
}

#[tokio::test]
async fn nfts_and_account_tabs() {
    let ex = explorer(Arc::new(FakeIndexer::new()), 25);
    let nfts = ex.account_nfts("0xabc").await.unwrap();
    assert_eq!(nfts[0].display_name(), "Gorilla #1");

    let overview = ex.account_overview("0xabc").await.unwrap();
    assert_eq!(
        overview.tabs(),
        vec![
            AccountTab::Transactions,
            AccountTab::Tokens,
            AccountTab::Nfts,
            AccountTab::Resources
        ]
    );
    assert_eq!(ex.account_resources("0xabc").await.unwrap().len(), 1);
}

#[tokio::test]
async fn transaction_detail_with_events() {
    let ex = explorer(Arc::new(FakeIndexer::new()), 25);
    let detail = ex.transaction(5, true).await.unwrap().unwrap();
    assert_eq!(detail.transaction.version, 5);
    let events = detail.events.unwrap();
    assert_eq!(events[0].decoded_data(), json!({"amount": "5"}));

    let plain = ex.transaction(5, false).await.unwrap().unwrap();
    assert!(plain.events.is_none());

    assert!(ex.transaction(13, true).await.unwrap().is_none());
}

#[tokio::test]
async fn block_detail() {
    let ex = explorer(Arc::new(FakeIndexer::new()), 25);
    let detail = ex.block(1).await.unwrap().unwrap();
    assert_eq!(detail.block.block_height, 1);
    let versions: Vec<u64> = detail.transactions.iter().map(|t| t.version).collect();
    assert_eq!(versions, (10..=19).filter(|v| *v != 13).collect::<Vec<_>>());

    assert!(ex.block(99).await.unwrap().is_none());
}

#[tokio::test]
async fn leaving_a_view_drops_its_cached_results() {
    let indexer = Arc::new(FakeIndexer::new());
    let ex = explorer(indexer.clone(), 25);

    assert!(!ex.enter_view(&Route::Latest).await);
    ex.latest_transactions(0).await.unwrap();
    ex.latest_transactions(0).await.unwrap();
    assert_eq!(indexer.latest_calls.load(Ordering::SeqCst), 1);

    // same view again keeps the cache
    assert!(!ex.enter_view(&Route::Latest).await);
    ex.latest_transactions(0).await.unwrap();
    assert_eq!(indexer.latest_calls.load(Ordering::SeqCst), 1);

    assert!(ex.enter_view(&Route::Transaction { version: 5 }).await);
    assert!(ex.enter_view(&Route::Latest).await);
    ex.latest_transactions(0).await.unwrap();
    assert_eq!(indexer.latest_calls.load(Ordering::SeqCst), 2);

    ex.clear_cache().await;
    ex.latest_transactions(0).await.unwrap();
    assert_eq!(indexer.latest_calls.load(Ordering::SeqCst), 3);
}
