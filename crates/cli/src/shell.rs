use std::{
    io::Write,
    sync::Arc,
    time::{Duration, Instant},
};

use alloy::primitives::Address;
use chrono::{DateTime, SecondsFormat, Utc};
use flowbid_core::{
    BidOutcome, BidSubmitter, ChainReader, MonitorSignal, SubmissionResult,
    constants::BASE_BLOCK_SECONDS,
    math::format_duration,
    types::{event::BidEvent, launch::AuctionLaunch, primitives::BlockNumber},
    validation::Balances,
};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{Mutex, broadcast},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

/// Identical monitor errors are printed at most once per window.
pub const ERROR_THROTTLE_WINDOW: Duration = Duration::from_secs(15);

pub const BID_FEED_HEADER: &str = "time block tx bidder bidId amountUSDC maxFDV phase";

const UNPROJECTED: &str = "n/a";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Bid { amount: Decimal, max_fdv_usd: Decimal },
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("usage: bid <USDC> <maxFDV_USD>")]
    BidUsage,
    #[error("{field} must be a positive number, got {value:?}")]
    NotPositive { field: &'static str, value: String },
    #[error("unknown command `{0}`, type `help` for the list")]
    Unknown(String),
}

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match command {
            "help" => Command::Help,
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            "bid" => {
                let [amount, max_fdv_usd] = args.as_slice() else {
                    return Err(CommandError::BidUsage);
                };
                Command::Bid {
                    amount: positive("USDC amount", amount)?,
                    max_fdv_usd: positive("max FDV", max_fdv_usd)?,
                }
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn positive(field: &'static str, value: &str) -> Result<Decimal, CommandError> {
    value
        .parse::<Decimal>()
        .ok()
        .filter(|parsed| *parsed > Decimal::ZERO)
        .ok_or_else(|| CommandError::NotPositive {
            field,
            value: value.to_string(),
        })
}

pub fn help_text() -> &'static str {
    "\nCommands:\n  help                         show this help\n  status                       auction phase and wallet balances\n  bid <USDC> <maxFDV_USD>      submit a bid\n  quit                         exit\n"
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn now() -> String {
    timestamp(Utc::now())
}

/// One line of the bid feed, in [`BID_FEED_HEADER`] order. Projections that
/// do not fit a decimal print as `n/a`.
pub fn format_bid(event: &BidEvent) -> String {
    let amount = event
        .amount_usd
        .map_or_else(|| UNPROJECTED.to_string(), |usd| format!("{:.6}", usd.round_dp(6)));
    let max_fdv = event.max_fdv_usd.map_or_else(
        || UNPROJECTED.to_string(),
        |usd| {
            format!(
                "{:.2}",
                usd.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            )
        },
    );
    format!(
        "{} {} {} {} {} {amount} {max_fdv} {}",
        timestamp(event.observed_at),
        event.block,
        event.tx_hash,
        event.bidder,
        event.bid_id,
        event.phase,
    )
}

/// Collapses noisy RPC failures into one stable line so they can be throttled.
pub fn summarize_monitor_error(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if mentions_status(&lower, "503") || lower.contains("no backend is currently healthy") {
        return "RPC returned 503 (temporary degradation), monitor keeps retrying".into();
    }
    if mentions_status(&lower, "429") {
        return "RPC rate limit (429), monitor keeps retrying".into();
    }

    match message.lines().next().map(str::trim) {
        Some(line) if !line.is_empty() => line.to_string(),
        _ => "unknown monitor error".into(),
    }
}

fn mentions_status(lower: &str, code: &str) -> bool {
    lower.contains(&format!("http error {code}"))
        || lower.match_indices("status:").any(|(at, marker)| {
            lower[at + marker.len()..].trim_start().starts_with(code)
        })
}

#[derive(Debug)]
pub struct ErrorThrottle {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl ErrorThrottle {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// `false` when `text` repeats the previous report inside the window.
    pub fn admit(&mut self, text: &str, now: Instant) -> bool {
        if let Some((last, at)) = &self.last {
            if last == text && now.saturating_duration_since(*at) < self.window {
                return false;
            }
        }
        self.last = Some((text.to_string(), now));
        true
    }
}

/// Prints monitor signals until the poller stops or the channel closes.
pub fn spawn_feed(mut signals: broadcast::Receiver<MonitorSignal>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut throttle = ErrorThrottle::new(ERROR_THROTTLE_WINDOW);
        loop {
            match signals.recv().await {
                Ok(MonitorSignal::Bid(event)) => println!("{}", format_bid(&event)),
                Ok(MonitorSignal::Warning(diagnostic)) => warn!(target: "monitor", "{diagnostic}"),
                Ok(MonitorSignal::CycleFailed(failure)) => {
                    let text = summarize_monitor_error(&failure.message);
                    if throttle.admit(&text, Instant::now()) {
                        error!(target: "monitor", recoverable = failure.recoverable, "{text}");
                    }
                }
                Ok(MonitorSignal::Synced {
                    from_block,
                    to_block,
                    logs,
                }) => debug!(target: "monitor", %from_block, %to_block, logs, "synced"),
                Ok(MonitorSignal::Started { from_block }) => {
                    info!(target: "monitor", %from_block, "watching for bids");
                    println!("{BID_FEED_HEADER}");
                }
                Ok(MonitorSignal::Stopped) => break,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(target: "monitor", skipped, "bid feed fell behind, signals dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

pub fn render_status(
    at: DateTime<Utc>,
    block: BlockNumber,
    launch: &AuctionLaunch,
    wallet: Address,
    balances: &Balances,
) -> String {
    let timing = if block < launch.start_block {
        let eta = block.blocks_until(launch.start_block) * BASE_BLOCK_SECONDS;
        format!("starts in: ~{}", format_duration(eta))
    } else if block <= launch.end_block {
        let eta = block.blocks_until(launch.end_block) * BASE_BLOCK_SECONDS;
        format!("ends in: ~{}", format_duration(eta))
    } else {
        "auction ended".to_string()
    };

    format!(
        "\nstatus @ {}\n  block: {block}\n  phase: {}\n  {timing}\n  wallet: {wallet}\n  ETH(base): {}\n  USDC(base): {}\n",
        timestamp(at),
        launch.phase_at(block),
        balances.native.normalize(),
        balances.currency.normalize(),
    )
}

pub fn render_submission(result: &SubmissionResult) -> String {
    match result.bid {
        BidOutcome::Detected(bid_id) => format!(
            "{} bid placed in {} tx, bidId detected ({bid_id}) tx={}",
            now(),
            result.tx_hashes.len(),
            result.final_tx_hash
        ),
        BidOutcome::Undetermined => format!(
            "{} bid sent but bidId not found in receipt, tx={}",
            now(),
            result.final_tx_hash
        ),
    }
}

struct ShellContext {
    chain: Arc<dyn ChainReader>,
    submitter: BidSubmitter,
}

impl ShellContext {
    async fn execute(&self, command: Command) -> eyre::Result<()> {
        match command {
            Command::Status => {
                let (block, balances) =
                    tokio::join!(self.chain.block_number(), self.submitter.balances());
                let status = render_status(
                    Utc::now(),
                    block?,
                    self.submitter.launch(),
                    self.submitter.bidder(),
                    &balances?,
                );
                println!("{status}");
            }
            Command::Bid {
                amount,
                max_fdv_usd,
            } => {
                println!("{} submitting bid: {amount} USDC, max FDV ${max_fdv_usd}", now());
                let result = self.submitter.submit_bid(amount, max_fdv_usd).await?;
                for (index, hash) in result.tx_hashes.iter().enumerate() {
                    println!("{} tx {}/{} ok {hash}", now(), index + 1, result.tx_hashes.len());
                }
                println!("{}", render_submission(&result));
            }
            Command::Help => print!("{}", help_text()),
            Command::Quit => {}
        }
        Ok(())
    }
}

/// Line-oriented command loop over stdin. One command runs at a time; lines
/// that arrive while a command is in flight are rejected.
pub struct Shell {
    context: Arc<ShellContext>,
    busy: Arc<Mutex<()>>,
}

impl Shell {
    pub fn new(chain: Arc<dyn ChainReader>, submitter: BidSubmitter) -> Self {
        Self {
            context: Arc::new(ShellContext { chain, submitter }),
            busy: Arc::new(Mutex::new(())),
        }
    }

    /// Returns on `quit`, `exit` or end of input.
    pub async fn run(&self) -> eyre::Result<()> {
        print!("{}", help_text());
        prompt();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match Command::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(Command::Help)) => print!("{}", help_text()),
                Ok(Some(command)) => {
                    // The command task prints the next prompt when it finishes.
                    if self.dispatch(command).is_some() {
                        continue;
                    }
                }
                Err(err) => eprintln!("{} [command:error] {err}", now()),
            }
            prompt();
        }

        self.wait_idle().await;
        Ok(())
    }

    /// Resolves once no command is in flight. A submission is never abandoned
    /// halfway, so shutdown paths wait here before exiting.
    pub async fn wait_idle(&self) {
        drop(self.busy.lock().await);
    }

    /// Spawns `command` unless another one is running. `None` means it was
    /// rejected.
    fn dispatch(&self, command: Command) -> Option<JoinHandle<()>> {
        let Ok(guard) = self.busy.clone().try_lock_owned() else {
            println!("previous command is still running, wait for it to finish");
            return None;
        };

        let context = self.context.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            if let Err(err) = context.execute(command).await {
                eprintln!("{} [command:error] {err}", now());
            }
            prompt();
        }))
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
