//! Idle-timeout watchdog.
//!
//! While the decoder is connected and no monitored channel presents a valid
//! beat, the watchdog counts idle beats. When the count reaches the
//! configured threshold it raises a pulse for exactly one cycle; the pulse
//! disconnects the address decoder and flushes every skid buffer. The cycle
//! after the pulse the counter and pulse are cleared unconditionally.

use std::num::NonZeroU32;

/// Watchdog behavior selected once when the decoder is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum WatchdogPolicy {
    /// Timeout beats of zero: the counter never leaves zero and no pulse is produced.
    Disabled,
    /// Pulse after `beats` consecutive idle beats while connected.
    Enabled {
        /// Idle beats tolerated before the pulse.
        beats: NonZeroU32,
    },
}

impl WatchdogPolicy {
    /// Maps a raw timeout-beats setting to a policy (`0` disables).
    #[must_use]
    pub const fn from_beats(beats: u32) -> Self {
        match NonZeroU32::new(beats) {
            Some(beats) => Self::Enabled { beats },
            None => Self::Disabled,
        }
    }

    /// Raw timeout-beats setting.
    #[must_use]
    pub const fn beats(self) -> u32 {
        match self {
            Self::Disabled => 0,
            Self::Enabled { beats } => beats.get(),
        }
    }
}

/// Valid signals the watchdog treats as transaction progress.
///
/// Ready signals are not monitored: a beat that is valid but never accepted
/// counts as activity, and a beat waiting inside a buffer does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelActivity {
    /// Upstream write-address valid.
    pub address_valid: bool,
    /// Upstream write-data valid.
    pub data_valid: bool,
    /// Downstream write-response valid.
    pub response_valid: bool,
}

impl ChannelActivity {
    /// Returns `true` when none of the monitored valids is asserted.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        !self.address_valid && !self.data_valid && !self.response_valid
    }
}

/// Observable phase of the watchdog state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchdogPhase {
    /// Counter at zero.
    Idle,
    /// Connected and idle; counter advancing.
    Counting,
    /// Pulse asserted this cycle.
    Fired,
}

/// Registered watchdog state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct WatchdogState {
    /// Consecutive idle beats observed while connected.
    pub counter: u32,
    /// One-cycle timeout pulse.
    pub fired: bool,
}

/// Idle-timeout watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeoutWatchdog {
    policy: WatchdogPolicy,
    state: WatchdogState,
}

impl TimeoutWatchdog {
    /// Creates a watchdog in its reset state.
    #[must_use]
    pub const fn new(policy: WatchdogPolicy) -> Self {
        Self {
            policy,
            state: WatchdogState {
                counter: 0,
                fired: false,
            },
        }
    }

    /// Policy fixed at construction.
    #[must_use]
    pub const fn policy(&self) -> WatchdogPolicy {
        self.policy
    }

    /// Registered state.
    #[must_use]
    pub const fn state(&self) -> WatchdogState {
        self.state
    }

    /// Timeout pulse visible this cycle.
    #[must_use]
    pub const fn fired(&self) -> bool {
        self.state.fired
    }

    /// Idle beats counted so far.
    #[must_use]
    pub const fn counter(&self) -> u32 {
        self.state.counter
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> WatchdogPhase {
        if self.state.fired {
            WatchdogPhase::Fired
        } else if self.state.counter > 0 {
            WatchdogPhase::Counting
        } else {
            WatchdogPhase::Idle
        }
    }

    /// Computes the state after the next clock edge.
    #[must_use]
    pub const fn evaluate(&self, activity: ChannelActivity, connected: bool) -> WatchdogState {
        const CLEAR: WatchdogState = WatchdogState {
            counter: 0,
            fired: false,
        };

        let WatchdogPolicy::Enabled { beats } = self.policy else {
            return CLEAR;
        };

        if self.state.fired || !connected || !activity.is_idle() {
            return CLEAR;
        }

        let counter = self.state.counter.saturating_add(1);
        WatchdogState {
            counter,
            fired: counter >= beats.get(),
        }
    }

    /// Applies a state computed by [`Self::evaluate`].
    pub fn commit(&mut self, next: WatchdogState) {
        self.state = next;
    }

    /// Clears counter and pulse.
    pub fn reset(&mut self) {
        self.state = WatchdogState::default();
    }

    /// Replaces the registered state, used when restoring snapshots.
    pub fn restore(&mut self, state: WatchdogState) {
        self.state = match self.policy {
            WatchdogPolicy::Disabled => WatchdogState::default(),
            WatchdogPolicy::Enabled { .. } => state,
        };
    }
}
