//! Address decoder: owns the `connected` flag.

use crate::AddressRegion;

/// Registered connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ConnectionState {
    /// No transaction admitted; upstream address ready is withheld.
    #[default]
    Disconnected,
    /// A matching address was observed and the transaction is admitted.
    Connected {
        /// The admitted address beat has been taken by the address path.
        address_taken: bool,
    },
}

impl ConnectionState {
    /// Returns `true` for [`ConnectionState::Connected`].
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// Same-cycle signals the address decoder samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DecodeInputs {
    /// Upstream write-address valid.
    pub awvalid: bool,
    /// Upstream write address.
    pub awaddr: u64,
    /// Upstream address handshake completed this cycle.
    pub address_accepted: bool,
    /// Upstream response handshake completed this cycle.
    pub response_done: bool,
    /// Watchdog pulse.
    pub timeout: bool,
}

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseCause {
    /// Write response was handed back upstream.
    ResponseComplete,
    /// Watchdog pulse forced the disconnect.
    Timeout,
}

/// Result of evaluating one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeOutcome {
    /// A valid, in-region address raised the connection.
    pub matched: bool,
    /// A valid address was presented while disconnected but fell outside the region.
    pub rejected: bool,
    /// The connection ends at this edge.
    pub released: Option<ReleaseCause>,
    /// State after the clock edge.
    pub next: ConnectionState,
}

/// Stateful comparator deciding when a transaction is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressDecoder {
    region: AddressRegion,
    state: ConnectionState,
}

impl AddressDecoder {
    /// Creates a disconnected decoder for `region`.
    #[must_use]
    pub const fn new(region: AddressRegion) -> Self {
        Self {
            region,
            state: ConnectionState::Disconnected,
        }
    }

    /// Region compared against.
    #[must_use]
    pub const fn region(&self) -> AddressRegion {
        self.region
    }

    /// Registered state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Gate status visible this cycle.
    #[must_use]
    pub const fn connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Returns `true` while the admitted address has not yet been taken.
    #[must_use]
    pub const fn accepts_address(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Connected {
                address_taken: false
            }
        )
    }

    /// Returns `true` when the address path may take `addr` this cycle: the
    /// admitted address has not been taken yet and `addr` is still in region.
    ///
    /// This gate is narrower than [`Self::connected`] on purpose: a connection
    /// forwards exactly one address, and a requester that swaps the address
    /// to one outside the region after the match never reaches the responder.
    #[must_use]
    pub const fn admits(&self, addr: u64) -> bool {
        self.accepts_address() && self.region.contains(addr)
    }

    /// Computes the state after the next clock edge.
    #[must_use]
    pub const fn evaluate(&self, inputs: DecodeInputs) -> DecodeOutcome {
        match self.state {
            ConnectionState::Disconnected => {
                let in_region = self.region.contains(inputs.awaddr);
                let matched = inputs.awvalid && in_region && !inputs.timeout;
                DecodeOutcome {
                    matched,
                    rejected: inputs.awvalid && !in_region,
                    released: None,
                    next: if matched {
                        ConnectionState::Connected {
                            address_taken: false,
                        }
                    } else {
                        ConnectionState::Disconnected
                    },
                }
            }
            ConnectionState::Connected { address_taken } => {
                let released = if inputs.timeout {
                    Some(ReleaseCause::Timeout)
                } else if inputs.response_done {
                    Some(ReleaseCause::ResponseComplete)
                } else {
                    None
                };
                DecodeOutcome {
                    matched: false,
                    rejected: false,
                    released,
                    next: if released.is_some() {
                        ConnectionState::Disconnected
                    } else {
                        ConnectionState::Connected {
                            address_taken: address_taken || inputs.address_accepted,
                        }
                    },
                }
            }
        }
    }

    /// Applies the next state computed by [`Self::evaluate`].
    pub fn commit(&mut self, outcome: &DecodeOutcome) {
        self.state = outcome.next;
    }

    /// Drops the connection.
    pub fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Replaces the registered state, used when restoring snapshots.
    pub fn restore(&mut self, state: ConnectionState) {
        self.state = state;
    }
}
