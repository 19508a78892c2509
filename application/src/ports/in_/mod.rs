mod poll_worker;
mod supervisor;

pub use poll_worker::{
    CycleOutcome, DEFAULT_POLL_INTERVAL, DynFetcher, DynNotifier, DynTimer, ErrorPolicy, PollError, PollSettings,
    PollWorker,
};
pub use supervisor::Supervisor;
