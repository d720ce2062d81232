use alloy::{
    consensus::TxReceipt,
    primitives::{Address, B256, U256},
    providers::Provider,
    rpc::types::{Filter, Log},
    sol_types::SolEvent,
};
use async_trait::async_trait;
use flowbid_abi::{IERC20Minimal, IFlowAuctionManager::BidSubmitted};
use tracing::debug;

use crate::{error::ChainError, types::primitives::BlockNumber};

use super::traits::{BidLogFilter, ChainReader, Receipt};

/// [`ChainReader`] over a single alloy provider.
#[derive(Clone)]
pub struct RpcChain<P>
where
    P: Provider + Clone,
{
    provider: P,
    label: String,
}

impl<P> RpcChain<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }
}

#[async_trait]
impl<P> ChainReader for RpcChain<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    async fn block_number(&self) -> Result<BlockNumber, ChainError> {
        let number = self.provider.get_block_number().await?;
        Ok(BlockNumber::new(number))
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        Ok(self.provider.get_balance(owner).await?)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        let erc20 = IERC20Minimal::new(token, self.provider.clone());
        Ok(erc20.balanceOf(owner).call().await?)
    }

    async fn bid_logs(&self, filter: &BidLogFilter) -> Result<Vec<Log>, ChainError> {
        let query = Filter::new()
            .address(filter.manager)
            .event_signature(BidSubmitted::SIGNATURE_HASH)
            .topic1(filter.auction.into_word())
            .from_block(filter.from_block.as_u64())
            .to_block(filter.to_block.as_u64());

        let logs = self.provider.get_logs(&query).await?;
        debug!(
            endpoint = %self.label,
            from = %filter.from_block,
            to = %filter.to_block,
            logs = logs.len(),
            "fetched bid logs"
        );
        Ok(logs)
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError> {
        let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? else {
            return Ok(None);
        };

        let receipt_body = receipt
            .inner
            .as_receipt()
            .ok_or(ChainError::MalformedReceipt(tx_hash))?;

        Ok(Some(Receipt {
            transaction_hash: receipt.transaction_hash,
            status: receipt_body.status(),
            logs: receipt_body.logs().to_vec(),
        }))
    }
}
