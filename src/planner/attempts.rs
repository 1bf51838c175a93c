/// Where the planner stands in its bounded retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// First attempt pending
    Ready(u32),
    /// A previous attempt was invalid; attempt `n` pending
    Retry(u32),
    Succeeded,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Valid,
    Invalid,
}

/// Attempt-count state machine, independent of any client
#[derive(Debug, Clone)]
pub struct AttemptBudget {
    max_attempts: u32,
    state: AttemptState,
}

impl AttemptBudget {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// At least one attempt is always allowed
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            state: AttemptState::Ready(1),
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Number of the pending attempt, or `None` once finished
    pub fn next_attempt(&self) -> Option<u32> {
        match self.state {
            AttemptState::Ready(n) | AttemptState::Retry(n) => Some(n),
            AttemptState::Succeeded | AttemptState::Exhausted => None,
        }
    }

    pub fn record(&mut self, outcome: AttemptOutcome) -> AttemptState {
        self.state = match (self.state, outcome) {
            (AttemptState::Ready(_) | AttemptState::Retry(_), AttemptOutcome::Valid) => {
                AttemptState::Succeeded
            }
            (AttemptState::Ready(n) | AttemptState::Retry(n), AttemptOutcome::Invalid) => {
                if n < self.max_attempts {
                    AttemptState::Retry(n + 1)
                } else {
                    AttemptState::Exhausted
                }
            }
            (done, _) => done,
        };
        self.state
    }
}

impl Default for AttemptBudget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}
