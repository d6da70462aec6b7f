//! Connection lifecycle state machine.
//!
//! `ConnectionLifecycle` holds no I/O; the channel's driver task reports
//! transport outcomes to it and acts on what it returns. Every driver is
//! tagged with the generation that started it, and transitions carrying a
//! stale generation are refused.

use std::fmt;

/// State of the real-time channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// Never connected, or disconnected on request
    Idle,
    /// A connection attempt is in flight
    Connecting,
    /// Connected; frames are being delivered
    Open,
    /// Connection lost; a retry is pending
    Closed,
    /// Retries used up; waits for an explicit connect
    Exhausted,
}

impl ChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelState::Idle => "idle",
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
            ChannelState::Closed => "closed",
            ChannelState::Exhausted => "exhausted",
        }
    }

    /// True while a driver owns the channel.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ChannelState::Connecting | ChannelState::Open | ChannelState::Closed
        )
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens after a connection ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Retry number `attempt` should start after the reconnect delay
    Retry { attempt: u32 },
    /// No retries left
    Exhausted { attempts: u32 },
}

/// Retry bookkeeping for one channel.
#[derive(Debug, Clone)]
pub struct ConnectionLifecycle {
    state: ChannelState,
    attempts: u32,
    max_attempts: u32,
    generation: u64,
}

impl ConnectionLifecycle {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: ChannelState::Idle,
            attempts: 0,
            max_attempts,
            generation: 0,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Retries used since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Start a fresh lifecycle from `Idle` or `Exhausted`.
    ///
    /// Returns the new generation, or `None` if a lifecycle is already
    /// running.
    pub fn begin(&mut self) -> Option<u64> {
        if self.state.is_active() {
            return None;
        }
        self.generation += 1;
        self.state = ChannelState::Connecting;
        self.attempts = 0;
        Some(self.generation)
    }

    /// The transport opened. Resets the retry counter.
    pub fn opened(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.state != ChannelState::Connecting {
            return false;
        }
        self.state = ChannelState::Open;
        self.attempts = 0;
        true
    }

    /// The transport closed, errored, or failed to open.
    pub fn closed(&mut self, generation: u64) -> Option<CloseOutcome> {
        if !self.is_current(generation)
            || !matches!(self.state, ChannelState::Connecting | ChannelState::Open)
        {
            return None;
        }
        if self.attempts < self.max_attempts {
            self.attempts += 1;
            self.state = ChannelState::Closed;
            Some(CloseOutcome::Retry {
                attempt: self.attempts,
            })
        } else {
            self.state = ChannelState::Exhausted;
            Some(CloseOutcome::Exhausted {
                attempts: self.attempts,
            })
        }
    }

    /// The reconnect delay elapsed.
    pub fn retry(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.state != ChannelState::Closed {
            return false;
        }
        self.state = ChannelState::Connecting;
        true
    }

    /// Back to `Idle`, invalidating the running driver.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = ChannelState::Idle;
        self.attempts = 0;
    }
}
