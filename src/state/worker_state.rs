/// Worker state definitions shared between workers and the coordinator
///
/// Each worker owns exactly one `WorkerStatus` and is the only writer; the
/// coordinator reads every status when deciding whether the crawl is done.
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// What a worker is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting on the frontier, or between pages
    Idle,

    /// Fetching, extracting or storing a page
    Working,
}

impl WorkerState {
    fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Working => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Working,
            _ => Self::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Working => "working",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Atomic cell holding a `WorkerState`, readable from any thread
#[derive(Debug)]
pub struct WorkerStatus(AtomicU8);

impl WorkerStatus {
    pub fn new() -> Self {
        Self(AtomicU8::new(WorkerState::Idle.to_u8()))
    }

    pub fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: WorkerState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }

    pub fn is_idle(&self) -> bool {
        self.get() == WorkerState::Idle
    }
}

impl Default for WorkerStatus {
    fn default() -> Self {
        Self::new()
    }
}
