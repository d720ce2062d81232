pub mod cycle;
pub mod poller;
pub mod retry;
pub mod signal;

pub use cycle::{CycleOutcome, DEFAULT_POLL_INTERVAL, MonitorConfig, MonitorState, PollCycle};
pub use poller::EventPoller;
pub use retry::{RetryPolicy, is_recoverable_message};
pub use signal::{CycleFailure, Diagnostic, MonitorSignal};
