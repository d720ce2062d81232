use std::{collections::HashSet, sync::Arc, time::Duration};

use alloy::{
    primitives::{Address, U256},
    rpc::types::Log,
};
use chrono::Utc;
use flowbid_abi::IFlowAuctionManager::BidSubmitted;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    chain::{BidLogFilter, ChainReader},
    constants::{AUCTION_MANAGER_ADDRESS, PRE_BID_BLOCKS, USDC_DECIMALS},
    error::{ChainError, DecodeError, PollError},
    math,
    types::{
        event::BidEvent,
        launch::AuctionLaunch,
        phase::Phase,
        primitives::{BidId, BlockNumber, CurrencyAmount, LogId, PriceQ96, TokenAmount},
    },
};

use super::{
    retry::RetryPolicy,
    signal::{CycleFailure, Diagnostic, MonitorSignal},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub manager: Address,
    pub auction: Address,
    pub start_block: BlockNumber,
    pub end_block: BlockNumber,
    pub pre_bid_blocks: u64,
    pub total_supply: TokenAmount,
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
}

impl MonitorConfig {
    pub fn for_launch(launch: &AuctionLaunch) -> Self {
        Self {
            manager: AUCTION_MANAGER_ADDRESS,
            auction: launch.auction,
            start_block: launch.start_block,
            end_block: launch.end_block,
            pre_bid_blocks: PRE_BID_BLOCKS,
            total_supply: launch.total_supply,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Progress owned by one poller instance. Never persisted.
#[derive(Debug, Default)]
pub struct MonitorState {
    pub last_processed: Option<BlockNumber>,
    seen: HashSet<LogId>,
}

impl MonitorState {
    /// `false` when the log was already emitted.
    fn mark_seen(&mut self, id: LogId) -> bool {
        self.seen.insert(id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    UpToDate {
        head: BlockNumber,
    },
    Synced {
        from_block: BlockNumber,
        to_block: BlockNumber,
        logs: usize,
        new_bids: usize,
    },
}

/// One poll cycle's worth of work: head read, ranged log query with retry,
/// dedup and decode.
pub struct PollCycle {
    chain: Arc<dyn ChainReader>,
    config: MonitorConfig,
    state: MonitorState,
    signals: broadcast::Sender<MonitorSignal>,
}

impl PollCycle {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        config: MonitorConfig,
        signals: broadcast::Sender<MonitorSignal>,
    ) -> Self {
        Self {
            chain,
            config,
            state: MonitorState::default(),
            signals,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Anchors the processed block one below the current head so only bids
    /// from now on are reported. Returns the first block that will be scanned.
    pub async fn initialize(&mut self) -> Result<BlockNumber, PollError> {
        if let Some(last) = self.state.last_processed {
            return Ok(last.next());
        }
        let head = self.chain.block_number().await.map_err(PollError::Head)?;
        let last = head.prev();
        self.state.last_processed = Some(last);
        Ok(last.next())
    }

    pub async fn run(&mut self) -> Result<CycleOutcome, PollError> {
        let result = self.run_inner().await;
        if let Err(err) = &result {
            warn!(error = %err, "poll cycle failed");
            self.emit(MonitorSignal::CycleFailed(CycleFailure {
                message: err.to_string(),
                recoverable: err.is_recoverable(),
            }));
        }
        result
    }

    async fn run_inner(&mut self) -> Result<CycleOutcome, PollError> {
        let head = self.chain.block_number().await.map_err(PollError::Head)?;
        let last = *self.state.last_processed.get_or_insert(head.prev());

        if head <= last {
            return Ok(CycleOutcome::UpToDate { head });
        }

        let from_block = last.next();
        let to_block = head;
        let logs = self.fetch_logs(from_block, to_block).await?;

        let mut new_bids = 0;
        for log in &logs {
            if let Some(event) = self.process_log(log) {
                new_bids += 1;
                debug!(block = %event.block, tx = %event.tx_hash, bid_id = %event.bid_id, "bid observed");
                self.emit(MonitorSignal::Bid(event));
            }
        }

        self.state.last_processed = Some(to_block);
        self.emit(MonitorSignal::Synced {
            from_block,
            to_block,
            logs: logs.len(),
        });

        Ok(CycleOutcome::Synced {
            from_block,
            to_block,
            logs: logs.len(),
            new_bids,
        })
    }

    async fn fetch_logs(
        &self,
        from_block: BlockNumber,
        to_block: BlockNumber,
    ) -> Result<Vec<Log>, PollError> {
        let filter = BidLogFilter {
            manager: self.config.manager,
            auction: self.config.auction,
            from_block,
            to_block,
        };
        let policy = self.config.retry;
        let mut attempt = 0u32;

        loop {
            let err: ChainError = match self.chain.bid_logs(&filter).await {
                Ok(logs) => return Ok(logs),
                Err(err) => err,
            };

            if !err.is_recoverable() {
                return Err(PollError::Query {
                    from: from_block,
                    to: to_block,
                    source: err,
                });
            }

            attempt += 1;
            if attempt > policy.max_retries {
                return Err(PollError::RetriesExhausted {
                    from: from_block,
                    to: to_block,
                    retries: policy.max_retries,
                    source: err,
                });
            }

            let delay = policy.delay_for(attempt);
            let diagnostic = Diagnostic::RetryScheduled {
                attempt,
                max_retries: policy.max_retries,
                delay,
                from_block,
                to_block,
                reason: err.to_string(),
            };
            info!(attempt, delay_ms = delay.as_millis() as u64, "retrying bid log query");
            self.emit(MonitorSignal::Warning(diagnostic));
            tokio::time::sleep(delay).await;
        }
    }

    fn process_log(&mut self, log: &Log) -> Option<BidEvent> {
        let Some(id) = LogId::of(log) else {
            self.emit(MonitorSignal::Warning(Diagnostic::UndecodableLog {
                log: None,
                reason: "log has no transaction hash".into(),
            }));
            return None;
        };

        if !self.state.mark_seen(id) {
            return None;
        }

        match self.decode(log, id) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(log = %id, error = %err, "skipping undecodable bid log");
                self.emit(MonitorSignal::Warning(Diagnostic::UndecodableLog {
                    log: Some(id),
                    reason: err.to_string(),
                }));
                None
            }
        }
    }

    fn decode(&self, log: &Log, id: LogId) -> Result<BidEvent, DecodeError> {
        let decoded = log
            .log_decode::<BidSubmitted>()
            .map_err(DecodeError::Abi)?;
        let bid = decoded.inner.data;
        let block = log
            .block_number
            .map(BlockNumber::new)
            .ok_or(DecodeError::MissingBlock)?;

        let amount = CurrencyAmount::from(bid.amount);
        let amount_usd = math::amount_to_decimal(U256::from(bid.amount), USDC_DECIMALS)
            .inspect_err(|err| warn!(log = %id, error = %err, "bid amount has no USD projection"))
            .ok();
        let max_fdv_usd =
            math::price_q96_to_fdv_usd(bid.maxPrice, self.config.total_supply.as_u256())
                .inspect_err(|err| warn!(log = %id, error = %err, "bid price has no FDV projection"))
                .ok();

        Ok(BidEvent {
            observed_at: Utc::now(),
            block,
            tx_hash: id.tx_hash,
            log_index: id.log_index,
            bidder: bid.user,
            bid_id: BidId::new(bid.bidId),
            amount,
            amount_usd,
            max_price: PriceQ96::new(bid.maxPrice),
            max_fdv_usd,
            phase: Phase::at(
                block,
                self.config.start_block,
                self.config.end_block,
                self.config.pre_bid_blocks,
            ),
        })
    }

    fn emit(&self, signal: MonitorSignal) {
        // No subscribers is fine; the monitor keeps running headless.
        let _ = self.signals.send(signal);
    }
}
