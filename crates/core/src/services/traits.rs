use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::ServiceError,
    types::{launch::AuctionLaunch, plan::NormalizedTransaction, plan::SubmissionPlan},
};

/// Parameters the auction service needs to build a bid plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    #[serde(rename = "walletAddress")]
    pub bidder: Address,
    pub auction_address: Address,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_fdv_usd: Decimal,
}

/// What the custody relay reports for one submitted transaction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReceipt {
    #[serde(default)]
    pub success: bool,
    pub transaction_hash: Option<B256>,
}

impl RelayReceipt {
    /// The confirmed hash, present only when the relay reported success.
    pub fn confirmed_hash(&self) -> Option<B256> {
        self.transaction_hash.filter(|_| self.success)
    }
}

/// Custody service that signs and broadcasts transactions for the agent wallet.
///
/// Implementations must not retry on their own: a resubmitted transaction is
/// a second on-chain transaction.
#[async_trait]
pub trait CustodyRelay: Send + Sync {
    async fn submit_transaction(
        &self,
        transaction: &NormalizedTransaction,
        description: &str,
        wait_for_confirmation: bool,
    ) -> Result<RelayReceipt, ServiceError>;
}

#[async_trait]
pub trait AuctionService: Send + Sync {
    async fn get_launch(&self, auction: Address) -> Result<AuctionLaunch, ServiceError>;

    /// `Ok(None)` when the service answered without a plan.
    async fn build_bid_transactions(
        &self,
        request: &BidRequest,
    ) -> Result<Option<SubmissionPlan>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn bid_request_matches_service_body() {
        let request = BidRequest {
            bidder: address!("0x1111111111111111111111111111111111111111"),
            auction_address: address!("0x942967af43ab0001dbb43eab2456a2a0daea45b6"),
            amount: Decimal::from_str("12.5").unwrap(),
            max_fdv_usd: Decimal::from(30_000),
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["amount"], json!(12.5));
        assert_eq!(body["maxFdvUsd"], json!(30000.0));
        assert!(body.get("walletAddress").is_some());
        assert!(body.get("auctionAddress").is_some());
    }

    #[test]
    fn relay_receipt_requires_success_and_hash() {
        let ok: RelayReceipt = serde_json::from_value(json!({
            "success": true,
            "transactionHash": format!("0x{}", "ab".repeat(32)),
        }))
        .unwrap();
        assert!(ok.confirmed_hash().is_some());

        let no_flag: RelayReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "ab".repeat(32)),
        }))
        .unwrap();
        assert_eq!(no_flag.confirmed_hash(), None);

        let no_hash: RelayReceipt = serde_json::from_value(json!({ "success": true })).unwrap();
        assert_eq!(no_hash.confirmed_hash(), None);
    }
}
