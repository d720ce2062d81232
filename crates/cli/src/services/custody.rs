use alloy::primitives::Address;
use async_trait::async_trait;
use flowbid_core::{
    error::ServiceError,
    services::{CustodyRelay, RelayReceipt},
    types::plan::NormalizedTransaction,
};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::http::JsonApi;

pub const BANKR_API_BASE_URL: &str = "https://api.bankr.bot";
const API_KEY_HEADER: &str = "X-API-Key";
const EVM_CHAIN: &str = "evm";

/// Bankr agent API: wallet lookup and transaction relay.
#[derive(Debug, Clone)]
pub struct BankrClient {
    api: JsonApi,
}

#[derive(Debug, Deserialize)]
struct AgentProfile {
    #[serde(default)]
    wallets: Vec<AgentWallet>,
}

#[derive(Debug, Deserialize)]
struct AgentWallet {
    chain: String,
    address: Option<Address>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    transaction: &'a NormalizedTransaction,
    description: &'a str,
    wait_for_confirmation: bool,
}

impl BankrClient {
    pub fn new(api_key: &str) -> Result<Self, ServiceError> {
        Self::with_base_url(api_key, BANKR_API_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, ServiceError> {
        let mut key = HeaderValue::from_str(api_key).map_err(|err| ServiceError::Decode {
            url: base_url.to_string(),
            reason: format!("api key is not a valid header value: {err}"),
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);
        Ok(Self {
            api: JsonApi::new("Bankr", base_url, headers)?,
        })
    }

    /// The agent's EVM wallet, as returned by `/agent/me`.
    pub async fn agent_wallet(&self) -> Result<Address, ServiceError> {
        let profile: Option<AgentProfile> = self.api.get("/agent/me").await?;
        evm_wallet(profile).ok_or_else(|| ServiceError::MissingWallet {
            chain: EVM_CHAIN.to_string(),
        })
    }
}

fn evm_wallet(profile: Option<AgentProfile>) -> Option<Address> {
    profile?
        .wallets
        .into_iter()
        .find(|wallet| wallet.chain == EVM_CHAIN)
        .and_then(|wallet| wallet.address)
}

#[async_trait]
impl CustodyRelay for BankrClient {
    async fn submit_transaction(
        &self,
        transaction: &NormalizedTransaction,
        description: &str,
        wait_for_confirmation: bool,
    ) -> Result<RelayReceipt, ServiceError> {
        let body = SubmitBody {
            transaction,
            description,
            wait_for_confirmation,
        };
        let receipt: Option<RelayReceipt> = self.api.post("/agent/submit", &body).await?;
        Ok(receipt.unwrap_or_default())
    }
}
