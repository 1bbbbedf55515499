//! GraphQL indexer client.
//!
//! Every query selects a single root field and decodes it into the records
//! in [`crate::types`]. Lookups by key return `Ok(None)` when the indexer
//! has no row.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{ExplorerError, Result};
use crate::node_rpc::http_client;
use crate::types::{
    AccountAsset, AccountTransaction, BlockRecord, NftTokenData, TokenMetadata, TokenOwnership,
    TransactionEvent, TransactionRecord,
};

pub const DEFAULT_INDEXER_URL: &str = "https://indexer.mainnet.movementnetwork.xyz/v1/graphql";

/// NFTs listed per account; the indexer query has no offset.
pub const ACCOUNT_NFT_LIMIT: u32 = 50;

const USER_TX_FIELDS: &str = "
        version
        sender
        gas_unit_price
        max_gas_amount
        timestamp
        block_height
        entry_function_id_str
        epoch
        sequence_number";

/// Indexer queries used by the explorer views.
#[async_trait]
pub trait IndexerApi: Send + Sync {
    async fn latest_transactions(&self, limit: u32, offset: u32) -> Result<Vec<TransactionRecord>>;

    async fn transaction_by_version(&self, version: u64) -> Result<Option<TransactionRecord>>;

    /// Versions touching `address`, newest first.
    async fn account_transactions(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AccountTransaction>>;

    /// Fungible asset balances with a positive amount.
    async fn account_token_balances(&self, address: &str) -> Result<Vec<AccountAsset>>;

    async fn account_nfts(&self, address: &str, limit: u32) -> Result<Vec<TokenOwnership>>;

    async fn block_by_height(&self, height: u64) -> Result<Option<BlockRecord>>;

    /// User transactions of a block, ascending version.
    async fn block_transactions(&self, height: u64) -> Result<Vec<TransactionRecord>>;

    /// Events of a transaction, ascending event index.
    async fn transaction_events(&self, version: u64) -> Result<Vec<TransactionEvent>>;

    async fn token_metadata(&self, asset_type: &str) -> Result<Option<TokenMetadata>>;

    async fn nft_token_data(&self, token_data_id: &str) -> Result<Option<NftTokenData>>;
}

#[derive(Debug, Clone)]
pub struct IndexerClient {
    url: String,
    timeout_ms: u64,
}

impl IndexerClient {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            url: url.into(),
            timeout_ms,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `{query, variables}` and return the `data` object.
    pub async fn execute_query(&self, query: &str, variables: Value) -> Result<Value> {
        let body = json!({ "query": query, "variables": variables });
        let res = http_client()
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ExplorerError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let response: Value = res.json().await?;
        extract_data(response)
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        field: &str,
    ) -> Result<Vec<T>> {
        let data = self.execute_query(query, variables).await?;
        let rows = decode_field(data, field)?;
        log::debug!("{field}: {} rows", rows.len());
        Ok(rows)
    }

    async fn first<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        field: &str,
    ) -> Result<Option<T>> {
        Ok(self.rows(query, variables, field).await?.into_iter().next())
    }
}

fn extract_data(mut response: Value) -> Result<Value> {
    if let Some(errors) = response.get("errors") {
        let message = errors
            .as_array()
            .map(|errs| {
                errs.iter()
                    .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_else(|| errors.to_string());
        return Err(ExplorerError::Indexer(message));
    }
    match response.get_mut("data") {
        Some(data) => Ok(data.take()),
        None => Err(ExplorerError::Indexer("response has no data".to_string())),
    }
}

fn decode_field<T: DeserializeOwned>(mut data: Value, field: &str) -> Result<Vec<T>> {
    match data.get_mut(field) {
        Some(rows) if !rows.is_null() => Ok(serde_json::from_value(rows.take())?),
        _ => Ok(Vec::new()),
    }
}

#[async_trait]
impl IndexerApi for IndexerClient {
    async fn latest_transactions(&self, limit: u32, offset: u32) -> Result<Vec<TransactionRecord>> {
        let query = format!(
            "query LatestTransactions($limit: Int!, $offset: Int!) {{
      user_transactions(limit: $limit, offset: $offset, order_by: {{version: desc}}) {{{USER_TX_FIELDS}
      }}
    }}"
        );
        self.rows(
            &query,
            json!({ "limit": limit, "offset": offset }),
            "user_transactions",
        )
        .await
    }

    async fn transaction_by_version(&self, version: u64) -> Result<Option<TransactionRecord>> {
        let query = format!(
            "query TransactionByVersion($version: bigint!) {{
      user_transactions(where: {{version: {{_eq: $version}}}}) {{{USER_TX_FIELDS}
      }}
    }}"
        );
        self.first(&query, json!({ "version": version }), "user_transactions")
            .await
    }

    async fn account_transactions(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AccountTransaction>> {
        let query = "query AccountTransactions($address: String!, $limit: Int!, $offset: Int!) {
      account_transactions(
        where: {account_address: {_eq: $address}}
        limit: $limit
        offset: $offset
        order_by: {transaction_version: desc}
      ) {
        transaction_version
        account_address
      }
    }";
        self.rows(
            query,
            json!({ "address": address, "limit": limit, "offset": offset }),
            "account_transactions",
        )
        .await
    }

    async fn account_token_balances(&self, address: &str) -> Result<Vec<AccountAsset>> {
        let query = "query AccountTokens($address: String!) {
      current_fungible_asset_balances(
        where: {owner_address: {_eq: $address}, amount: {_gt: \"0\"}}
      ) {
        owner_address
        asset_type
        amount
        last_transaction_version
      }
    }";
        self.rows(
            query,
            json!({ "address": address }),
            "current_fungible_asset_balances",
        )
        .await
    }

    async fn account_nfts(&self, address: &str, limit: u32) -> Result<Vec<TokenOwnership>> {
        let query = "query AccountNFTs($address: String!, $limit: Int!) {
      current_token_ownerships_v2(
        where: {owner_address: {_eq: $address}, amount: {_gt: \"0\"}}
        limit: $limit
      ) {
        token_data_id
        amount
        last_transaction_version
        owner_address
      }
    }";
        self.rows(
            query,
            json!({ "address": address, "limit": limit }),
            "current_token_ownerships_v2",
        )
        .await
    }

    async fn block_by_height(&self, height: u64) -> Result<Option<BlockRecord>> {
        let query = "query BlockByHeight($height: bigint!) {
      block_metadata_transactions(where: {block_height: {_eq: $height}}) {
        version
        block_height
        epoch
        round
        proposer
        timestamp
      }
    }";
        self.first(
            query,
            json!({ "height": height }),
            "block_metadata_transactions",
        )
        .await
    }

    async fn block_transactions(&self, height: u64) -> Result<Vec<TransactionRecord>> {
        let query = format!(
            "query BlockTransactions($height: bigint!) {{
      user_transactions(where: {{block_height: {{_eq: $height}}}}, order_by: {{version: asc}}) {{{USER_TX_FIELDS}
      }}
    }}"
        );
        self.rows(&query, json!({ "height": height }), "user_transactions")
            .await
    }

    async fn transaction_events(&self, version: u64) -> Result<Vec<TransactionEvent>> {
        let query = "query TransactionEvents($version: bigint!) {
      events(where: {transaction_version: {_eq: $version}}, order_by: {event_index: asc}) {
        transaction_version
        event_index
        account_address
        type
        data
        sequence_number
        creation_number
      }
    }";
        self.rows(query, json!({ "version": version }), "events")
            .await
    }

    async fn token_metadata(&self, asset_type: &str) -> Result<Option<TokenMetadata>> {
        let query = "query TokenMetadata($assetType: String!) {
      fungible_asset_metadata(where: {asset_type: {_eq: $assetType}}) {
        asset_type
        name
        symbol
        decimals
        icon_uri
      }
    }";
        self.first(
            query,
            json!({ "assetType": asset_type }),
            "fungible_asset_metadata",
        )
        .await
    }

    async fn nft_token_data(&self, token_data_id: &str) -> Result<Option<NftTokenData>> {
        let query = "query NFTTokenData($tokenDataId: String!) {
      current_token_datas_v2(where: {token_data_id: {_eq: $tokenDataId}}) {
        token_data_id
        token_name
        token_uri
        description
        collection_id
      }
    }";
        self.first(
            query,
            json!({ "tokenDataId": token_data_id }),
            "current_token_datas_v2",
        )
        .await
    }
}
