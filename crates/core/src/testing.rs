//! In-memory collaborators for unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use alloy::{
    primitives::{Address, B256, LogData, U256, address},
    rpc::types::Log,
    sol_types::SolEvent,
    transports::TransportErrorKind,
};
use async_trait::async_trait;
use flowbid_abi::IFlowAuctionManager::BidSubmitted;

use crate::{
    chain::{BidLogFilter, ChainReader, Receipt},
    constants::{AUCTION_MANAGER_ADDRESS, DEFAULT_AUCTION_ADDRESS, USDC_BASE_ADDRESS},
    error::{ChainError, ServiceError},
    services::{AuctionService, BidRequest, CustodyRelay, RelayReceipt},
    types::{
        launch::AuctionLaunch,
        plan::{NormalizedTransaction, SubmissionPlan},
        primitives::{BlockNumber, PriceQ96, TokenAmount},
    },
};

pub const BIDDER: Address = address!("0x1111111111111111111111111111111111111111");
pub const RIVAL: Address = address!("0x2222222222222222222222222222222222222222");

pub fn sample_launch() -> AuctionLaunch {
    AuctionLaunch {
        auction: DEFAULT_AUCTION_ADDRESS,
        currency: USDC_BASE_ADDRESS,
        token_symbol: Some("FLOW".into()),
        start_block: BlockNumber::new(42_673_326),
        end_block: BlockNumber::new(42_673_596),
        claim_block: BlockNumber::new(42_673_600),
        total_supply: TokenAmount::new(U256::from(10u64).pow(U256::from(27u64))),
        floor_price: Some(PriceQ96::new(U256::from(1_980_704_062_800u64))),
    }
}

pub fn rate_limited() -> ChainError {
    ChainError::Transport(TransportErrorKind::custom_str(
        "HTTP error 429 with body: Too Many Requests",
    ))
}

pub fn permanent_failure() -> ChainError {
    ChainError::Transport(TransportErrorKind::custom_str(
        "query exceeds max block range 1000",
    ))
}

pub fn tx_hash(n: u8) -> B256 {
    B256::with_last_byte(n)
}

/// A `BidSubmitted` log as the manager contract would emit it.
#[allow(clippy::too_many_arguments)]
pub fn bid_log(
    auction: Address,
    user: Address,
    bid_id: u64,
    max_price: U256,
    amount: u128,
    block: u64,
    tx: B256,
    log_index: u64,
) -> Log {
    let event = BidSubmitted {
        auction,
        user,
        bidId: U256::from(bid_id),
        maxPrice: max_price,
        amount,
    };
    raw_log(AUCTION_MANAGER_ADDRESS, event.encode_log_data(), block, tx, log_index)
}

pub fn raw_log(address: Address, data: LogData, block: u64, tx: B256, log_index: u64) -> Log {
    Log {
        inner: alloy::primitives::Log { address, data },
        block_number: Some(block),
        transaction_hash: Some(tx),
        log_index: Some(log_index),
        ..Default::default()
    }
}

#[derive(Default)]
struct ChainState {
    head: u64,
    head_reads: usize,
    head_failures: VecDeque<ChainError>,
    logs: Vec<Log>,
    log_failures: VecDeque<ChainError>,
    log_queries: Vec<BidLogFilter>,
    native_balance: U256,
    token_balances: HashMap<Address, U256>,
    balance_reads: usize,
    receipts: HashMap<B256, Receipt>,
    receipt_failure: Option<ChainError>,
}

/// Scripted chain. Failures are consumed one per call, in order.
#[derive(Default)]
pub struct FakeChain {
    state: Mutex<ChainState>,
}

impl FakeChain {
    pub fn new(head: u64) -> Self {
        let chain = Self::default();
        chain.set_head(head);
        chain
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_head(&self, head: u64) {
        self.with_state(|s| s.head = head);
    }

    pub fn fail_head_with(&self, err: ChainError) {
        self.with_state(|s| s.head_failures.push_back(err));
    }

    pub fn head_reads(&self) -> usize {
        self.with_state(|s| s.head_reads)
    }

    pub fn push_log(&self, log: Log) {
        self.with_state(|s| s.logs.push(log));
    }

    pub fn fail_logs_with(&self, err: ChainError) {
        self.with_state(|s| s.log_failures.push_back(err));
    }

    pub fn log_queries(&self) -> Vec<BidLogFilter> {
        self.with_state(|s| s.log_queries.clone())
    }

    pub fn set_native_balance(&self, balance: U256) {
        self.with_state(|s| s.native_balance = balance);
    }

    pub fn set_token_balance(&self, token: Address, balance: U256) {
        self.with_state(|s| {
            s.token_balances.insert(token, balance);
        });
    }

    pub fn balance_reads(&self) -> usize {
        self.with_state(|s| s.balance_reads)
    }

    pub fn insert_receipt(&self, receipt: Receipt) {
        self.with_state(|s| {
            s.receipts.insert(receipt.transaction_hash, receipt);
        });
    }

    pub fn fail_receipt_with(&self, err: ChainError) {
        self.with_state(|s| s.receipt_failure = Some(err));
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn block_number(&self) -> Result<BlockNumber, ChainError> {
        self.with_state(|s| {
            s.head_reads += 1;
            match s.head_failures.pop_front() {
                Some(err) => Err(err),
                None => Ok(BlockNumber::new(s.head)),
            }
        })
    }

    async fn native_balance(&self, _owner: Address) -> Result<U256, ChainError> {
        self.with_state(|s| {
            s.balance_reads += 1;
            Ok(s.native_balance)
        })
    }

    async fn token_balance(&self, token: Address, _owner: Address) -> Result<U256, ChainError> {
        self.with_state(|s| {
            s.balance_reads += 1;
            Ok(s.token_balances.get(&token).copied().unwrap_or_default())
        })
    }

    async fn bid_logs(&self, filter: &BidLogFilter) -> Result<Vec<Log>, ChainError> {
        self.with_state(|s| {
            s.log_queries.push(*filter);
            if let Some(err) = s.log_failures.pop_front() {
                return Err(err);
            }
            let auction_topic = filter.auction.into_word();
            Ok(s.logs
                .iter()
                .filter(|log| log.address() == filter.manager)
                .filter(|log| log.topics().get(1) == Some(&auction_topic))
                .filter(|log| {
                    log.block_number.is_some_and(|block| {
                        block >= filter.from_block.as_u64() && block <= filter.to_block.as_u64()
                    })
                })
                .cloned()
                .collect())
        })
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError> {
        self.with_state(|s| match s.receipt_failure.take() {
            Some(err) => Err(err),
            None => Ok(s.receipts.get(&tx_hash).cloned()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelayCall {
    pub transaction: NormalizedTransaction,
    pub description: String,
    pub wait_for_confirmation: bool,
}

/// Relay that confirms every transaction with hash `0x..{n}` for the n-th
/// call unless a response was scripted.
#[derive(Default)]
pub struct FakeRelay {
    calls: Mutex<Vec<RelayCall>>,
    responses: Mutex<VecDeque<Result<RelayReceipt, ServiceError>>>,
}

impl FakeRelay {
    pub fn respond_with(&self, response: Result<RelayReceipt, ServiceError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<RelayCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CustodyRelay for FakeRelay {
    async fn submit_transaction(
        &self,
        transaction: &NormalizedTransaction,
        description: &str,
        wait_for_confirmation: bool,
    ) -> Result<RelayReceipt, ServiceError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(RelayCall {
            transaction: transaction.clone(),
            description: description.to_string(),
            wait_for_confirmation,
        });
        let n = calls.len() as u8;
        drop(calls);

        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(RelayReceipt {
                success: true,
                transaction_hash: Some(tx_hash(n)),
            })
        })
    }
}

pub struct FakeAuctionService {
    launch: AuctionLaunch,
    plan: Mutex<Option<SubmissionPlan>>,
    requests: Mutex<Vec<BidRequest>>,
}

impl FakeAuctionService {
    pub fn new(launch: AuctionLaunch, plan: Option<SubmissionPlan>) -> Self {
        Self {
            launch,
            plan: Mutex::new(plan),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<BidRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuctionService for FakeAuctionService {
    async fn get_launch(&self, _auction: Address) -> Result<AuctionLaunch, ServiceError> {
        Ok(self.launch.clone())
    }

    async fn build_bid_transactions(
        &self,
        request: &BidRequest,
    ) -> Result<Option<SubmissionPlan>, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.plan.lock().unwrap().clone())
    }
}
