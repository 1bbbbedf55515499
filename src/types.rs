use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Hasura returns `bigint` columns as JSON numbers and `numeric` columns as
/// strings, and which one you get depends on the deployment. Accept both.
fn u64_from_any<'de, D>(d: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("not an unsigned integer: {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| serde::de::Error::custom(format!("{s}: {e}"))),
        other => Err(serde::de::Error::custom(format!(
            "expected integer, got {other}"
        ))),
    }
}

/// Base-unit amounts are kept as digit strings so nothing above 2^64 is lost.
/// Numeric amounts keep their digits too, since serde_json is built with
/// `arbitrary_precision`.
fn amount_from_any<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        other => Err(serde::de::Error::custom(format!(
            "expected amount, got {other}"
        ))),
    }
}

/// A user transaction as indexed (`user_transactions`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(deserialize_with = "u64_from_any")]
    pub version: u64,
    pub sender: String,
    #[serde(deserialize_with = "u64_from_any")]
    pub gas_unit_price: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub max_gas_amount: u64,
    /// UTC, usually without a zone suffix.
    pub timestamp: String,
    #[serde(deserialize_with = "u64_from_any")]
    pub block_height: u64,
    #[serde(default)]
    pub entry_function_id_str: Option<String>,
    #[serde(deserialize_with = "u64_from_any")]
    pub epoch: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub sequence_number: u64,
}

/// Block metadata transaction (`block_metadata_transactions`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    #[serde(deserialize_with = "u64_from_any")]
    pub version: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub block_height: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub epoch: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub round: u64,
    pub proposer: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTransaction {
    #[serde(deserialize_with = "u64_from_any")]
    pub transaction_version: u64,
    pub account_address: String,
}

/// Fungible asset balance (`current_fungible_asset_balances`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountAsset {
    pub owner_address: String,
    pub asset_type: String,
    #[serde(deserialize_with = "amount_from_any")]
    pub amount: String,
    #[serde(deserialize_with = "u64_from_any")]
    pub last_transaction_version: u64,
}

/// NFT ownership row (`current_token_ownerships_v2`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenOwnership {
    pub token_data_id: String,
    #[serde(deserialize_with = "amount_from_any")]
    pub amount: String,
    #[serde(deserialize_with = "u64_from_any")]
    pub last_transaction_version: u64,
    pub owner_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    #[serde(deserialize_with = "u64_from_any")]
    pub transaction_version: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub event_index: u64,
    pub account_address: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Either a JSON object or a JSON document serialized into a string.
    pub data: Value,
    #[serde(deserialize_with = "u64_from_any")]
    pub sequence_number: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub creation_number: u64,
}

impl TransactionEvent {
    /// Event payload with string-encoded JSON decoded.
    pub fn decoded_data(&self) -> Value {
        crate::json_pretty::auto_parse_nested_json(self.data.clone(), 5, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub asset_type: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    #[serde(default)]
    pub icon_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftTokenData {
    pub token_data_id: String,
    pub token_name: String,
    pub token_uri: String,
    pub description: String,
    pub collection_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_accepts_numbers_and_strings() {
        let tx: TransactionRecord = serde_json::from_value(json!({
            "version": "2000001",
            "sender": "0x1",
            "gas_unit_price": 100,
            "max_gas_amount": "2000",
            "timestamp": "2024-05-01T12:00:00",
            "block_height": 12345,
            "entry_function_id_str": null,
            "epoch": 7,
            "sequence_number": "3"
        }))
        .unwrap();
        assert_eq!(tx.version, 2_000_001);
        assert_eq!(tx.max_gas_amount, 2000);
        assert_eq!(tx.entry_function_id_str, None);
    }

    #[test]
    fn asset_amount_keeps_full_precision() {
        let asset: AccountAsset = serde_json::from_value(json!({
            "owner_address": "0xa",
            "asset_type": "0x1::aptos_coin::AptosCoin",
            "amount": "340282366920938463463374607431768211456",
            "last_transaction_version": 9
        }))
        .unwrap();
        assert_eq!(asset.amount, "340282366920938463463374607431768211456");
    }

    #[test]
    fn numeric_amount_above_u128_keeps_its_digits() {
        let raw = r#"{
            "owner_address": "0xa",
            "asset_type": "0x1::aptos_coin::AptosCoin",
            "amount": 340282366920938463463374607431768211456,
            "last_transaction_version": 9
        }"#;
        let asset: AccountAsset = serde_json::from_str(raw).unwrap();
        assert_eq!(asset.amount, "340282366920938463463374607431768211456");
        assert_eq!(asset.last_transaction_version, 9);
    }

    #[test]
    fn rejects_negative_versions() {
        let res: Result<AccountTransaction, _> = serde_json::from_value(json!({
            "transaction_version": -1,
            "account_address": "0xa"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn event_decodes_string_payload() {
        let ev: TransactionEvent = serde_json::from_value(json!({
            "transaction_version": 5,
            "event_index": 0,
            "account_address": "0x1",
            "type": "0x1::coin::DepositEvent",
            "data": "{\"amount\":\"100\"}",
            "sequence_number": 1,
            "creation_number": 2
        }))
        .unwrap();
        assert_eq!(ev.decoded_data(), json!({"amount": "100"}));
    }
}
