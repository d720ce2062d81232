use std::sync::Arc;

use alloy::primitives::{Address, B256};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use flowbid_abi::IFlowAuctionManager::BidSubmitted;

use crate::{
    chain::{ChainReader, Receipt},
    constants::{NATIVE_DECIMALS, USDC_DECIMALS},
    error::{Error, SubmitError},
    math,
    services::{AuctionService, BidRequest, CustodyRelay},
    types::{launch::AuctionLaunch, primitives::BidId},
    validation::{self, Balances},
};

use super::result::{BidOutcome, SubmissionResult};

/// Places the agent's bid through the custody relay.
///
/// Callers must not run two submissions at once; the relay is not idempotent.
pub struct BidSubmitter {
    chain: Arc<dyn ChainReader>,
    relay: Arc<dyn CustodyRelay>,
    auction_service: Arc<dyn AuctionService>,
    launch: AuctionLaunch,
    bidder: Address,
    min_native_balance: Decimal,
}

impl BidSubmitter {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        relay: Arc<dyn CustodyRelay>,
        auction_service: Arc<dyn AuctionService>,
        launch: AuctionLaunch,
        bidder: Address,
        min_native_balance: Decimal,
    ) -> Self {
        Self {
            chain,
            relay,
            auction_service,
            launch,
            bidder,
            min_native_balance,
        }
    }

    pub fn launch(&self) -> &AuctionLaunch {
        &self.launch
    }

    pub fn bidder(&self) -> Address {
        self.bidder
    }

    /// Native and settlement balances of the bidder, read concurrently.
    pub async fn balances(&self) -> Result<Balances, Error> {
        let (native_raw, currency_raw) = futures::try_join!(
            self.chain.native_balance(self.bidder),
            self.chain.token_balance(self.launch.currency, self.bidder),
        )?;

        Ok(Balances {
            native: math::amount_to_decimal(native_raw, NATIVE_DECIMALS)?,
            currency: math::amount_to_decimal(currency_raw, USDC_DECIMALS)?,
        })
    }

    pub async fn submit_bid(
        &self,
        amount: Decimal,
        max_fdv_usd: Decimal,
    ) -> Result<SubmissionResult, Error> {
        validation::validate_bid_input(amount, max_fdv_usd)?;

        let block = self.chain.block_number().await?;
        let phase = validation::validate_phase(block, &self.launch)?;

        let balances = self.balances().await?;
        validation::validate_balances(amount, self.min_native_balance, &balances)?;

        let request = BidRequest {
            bidder: self.bidder,
            auction_address: self.launch.auction,
            amount,
            max_fdv_usd,
        };
        let plan = self.auction_service.build_bid_transactions(&request).await?;
        let steps = validation::validate_plan(plan)?;
        let total = steps.len();

        info!(%block, %phase, %amount, %max_fdv_usd, steps = total, "submitting bid");

        let mut tx_hashes = Vec::with_capacity(total);
        for (index, step) in steps.iter().enumerate() {
            let position = index + 1;
            let receipt = self
                .relay
                .submit_transaction(&step.transaction, &step.description, true)
                .await
                .map_err(|source| SubmitError::Relay {
                    step: position,
                    total,
                    source,
                })?;
            let tx_hash = receipt.confirmed_hash().ok_or(SubmitError::Protocol {
                step: position,
                total,
            })?;

            info!(step = position, total, %tx_hash, description = %step.description, "transaction confirmed");
            tx_hashes.push(tx_hash);
        }

        // `validate_plan` never yields an empty plan.
        let final_tx_hash = *tx_hashes.last().ok_or(SubmitError::Protocol {
            step: total,
            total,
        })?;
        let bid = self.find_bid(final_tx_hash).await?;

        match bid {
            BidOutcome::Detected(bid_id) => info!(%bid_id, tx = %final_tx_hash, "bid placed"),
            BidOutcome::Undetermined => {
                warn!(tx = %final_tx_hash, "bid confirmed but no matching BidSubmitted log")
            }
        }

        Ok(SubmissionResult {
            block,
            phase,
            tx_hashes,
            final_tx_hash,
            bid,
        })
    }

    async fn find_bid(&self, tx_hash: B256) -> Result<BidOutcome, SubmitError> {
        let receipt = self
            .chain
            .transaction_receipt(tx_hash)
            .await
            .map_err(|source| SubmitError::Receipt { tx_hash, source })?
            .ok_or(SubmitError::MissingReceipt { tx_hash })?;

        if !receipt.status {
            return Err(SubmitError::Reverted { tx_hash });
        }

        Ok(self
            .matching_bid(&receipt)
            .map_or(BidOutcome::Undetermined, BidOutcome::Detected))
    }

    fn matching_bid(&self, receipt: &Receipt) -> Option<BidId> {
        receipt.logs.iter().find_map(|log| {
            let decoded = match log.log_decode::<BidSubmitted>() {
                Ok(decoded) => decoded,
                Err(err) => {
                    debug!(error = %err, "skipping non-bid receipt log");
                    return None;
                }
            };
            let bid = decoded.inner.data;
            (bid.auction == self.launch.auction && bid.user == self.bidder)
                .then(|| BidId::new(bid.bidId))
        })
    }
}
