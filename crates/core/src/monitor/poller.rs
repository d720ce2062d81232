use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, broadcast, oneshot},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{chain::ChainReader, error::PollError, types::primitives::BlockNumber};

use super::{
    cycle::{CycleOutcome, MonitorConfig, PollCycle},
    signal::MonitorSignal,
};

const SIGNAL_CAPACITY: usize = 256;

struct RunningPoller {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Polls the chain for `BidSubmitted` logs of one auction on a fixed interval.
///
/// Ticks that find the previous cycle still in flight are skipped. Dropping
/// the poller ends the tick loop as well.
pub struct EventPoller {
    cycle: Arc<Mutex<PollCycle>>,
    signals: broadcast::Sender<MonitorSignal>,
    poll_interval: Duration,
    running: Option<RunningPoller>,
}

impl EventPoller {
    pub fn new(chain: Arc<dyn ChainReader>, config: MonitorConfig) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        let poll_interval = config.poll_interval;
        let cycle = PollCycle::new(chain, config, signals.clone());
        Self {
            cycle: Arc::new(Mutex::new(cycle)),
            signals,
            poll_interval,
            running: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorSignal> {
        self.signals.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Anchors on the current head and starts ticking. No-op when running.
    pub async fn start(&mut self) -> Result<(), PollError> {
        if self.running.is_some() {
            return Ok(());
        }

        let from_block = self.cycle.lock().await.initialize().await?;
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(tick_loop(self.cycle.clone(), self.poll_interval, stopped));
        self.running = Some(RunningPoller { stop, task });

        info!(%from_block, interval_ms = self.poll_interval.as_millis() as u64, "bid monitor started");
        let _ = self.signals.send(MonitorSignal::Started { from_block });
        Ok(())
    }

    /// Stops ticking and waits for an in-flight cycle to finish. Idempotent.
    pub async fn stop(&mut self) {
        let Some(RunningPoller { stop, task }) = self.running.take() else {
            return;
        };

        let _ = stop.send(());
        if let Err(err) = task.await {
            warn!(error = %err, "bid monitor task ended abnormally");
        }
        // Waits out a cycle spawned by the last tick.
        drop(self.cycle.lock().await);

        info!("bid monitor stopped");
        let _ = self.signals.send(MonitorSignal::Stopped);
    }

    /// Runs one cycle now, waiting for any in-flight cycle first.
    pub async fn poll_once(&self) -> Result<CycleOutcome, PollError> {
        self.cycle.lock().await.run().await
    }

    pub async fn last_processed_block(&self) -> Option<BlockNumber> {
        self.cycle.lock().await.state().last_processed
    }
}

async fn tick_loop(
    cycle: Arc<Mutex<PollCycle>>,
    poll_interval: Duration,
    mut stopped: oneshot::Receiver<()>,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the first cycle runs one interval after start.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = &mut stopped => break,
            _ = ticker.tick() => {
                let Ok(mut guard) = cycle.clone().try_lock_owned() else {
                    debug!("previous poll cycle still in flight, skipping tick");
                    continue;
                };
                tokio::spawn(async move {
                    // Failures are reported as signals by the cycle itself.
                    let _ = guard.run().await;
                });
            }
        }
    }
}
