use std::{future::Future, sync::Arc};

use alloy::{
    primitives::{Address, B256, U256},
    rpc::types::Log,
};
use async_trait::async_trait;
use tracing::warn;

use crate::{error::ChainError, types::primitives::BlockNumber};

use super::traits::{BidLogFilter, ChainReader, Receipt};

/// Tries each endpoint in order, moving on only when the current one fails
/// with a recoverable error. Endpoints are not ranked.
pub struct FallbackChain {
    endpoints: Vec<Arc<dyn ChainReader>>,
}

impl FallbackChain {
    pub fn new(endpoints: Vec<Arc<dyn ChainReader>>) -> Self {
        Self { endpoints }
    }

    async fn first_ok<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, ChainError>
    where
        F: Fn(Arc<dyn ChainReader>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ChainError>> + Send,
        T: Send,
    {
        let mut last_error = ChainError::NoEndpoints;

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            match call(Arc::clone(endpoint)).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_recoverable() && index + 1 < self.endpoints.len() => {
                    warn!(operation, endpoint = index, error = %err, "rpc endpoint failed, trying next");
                    last_error = err;
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl ChainReader for FallbackChain {
    async fn block_number(&self) -> Result<BlockNumber, ChainError> {
        self.first_ok("block_number", |chain| async move { chain.block_number().await })
            .await
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.first_ok("native_balance", |chain| async move {
            chain.native_balance(owner).await
        })
        .await
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        self.first_ok("token_balance", |chain| async move {
            chain.token_balance(token, owner).await
        })
        .await
    }

    async fn bid_logs(&self, filter: &BidLogFilter) -> Result<Vec<Log>, ChainError> {
        let filter = *filter;
        self.first_ok("bid_logs", |chain| async move { chain.bid_logs(&filter).await })
            .await
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError> {
        self.first_ok("transaction_receipt", |chain| async move {
            chain.transaction_receipt(tx_hash).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChain, permanent_failure, rate_limited};

    #[tokio::test]
    async fn falls_through_on_recoverable_errors() {
        let primary = Arc::new(FakeChain::new(100));
        primary.fail_head_with(rate_limited());
        let secondary = Arc::new(FakeChain::new(200));

        let chain = FallbackChain::new(vec![
            primary as Arc<dyn ChainReader>,
            secondary as Arc<dyn ChainReader>,
        ]);
        assert_eq!(chain.block_number().await.unwrap(), BlockNumber::new(200));
    }

    #[tokio::test]
    async fn permanent_errors_do_not_fall_through() {
        let primary = Arc::new(FakeChain::new(100));
        primary.fail_head_with(permanent_failure());
        let secondary = Arc::new(FakeChain::new(200));

        let fallback: Arc<dyn ChainReader> = secondary.clone();
        let chain = FallbackChain::new(vec![primary as Arc<dyn ChainReader>, fallback]);
        assert!(chain.block_number().await.is_err());
        assert_eq!(secondary.head_reads(), 0);
    }

    #[tokio::test]
    async fn last_recoverable_error_is_returned() {
        let only = Arc::new(FakeChain::new(100));
        only.fail_head_with(rate_limited());

        let chain = FallbackChain::new(vec![only as Arc<dyn ChainReader>]);
        let err = chain.block_number().await.unwrap_err();
        assert!(err.is_recoverable());

        let empty = FallbackChain::new(Vec::new());
        assert!(matches!(empty.block_number().await, Err(ChainError::NoEndpoints)));
    }
}
