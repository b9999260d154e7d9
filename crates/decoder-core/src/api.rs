//! Host-facing configuration, per-cycle port bundles and trace hooks.
//!
//! Port bundles follow the bus naming: "upstream" is the `s_axi_*` port
//! facing the requester and "downstream" is the `m_axi_*` port facing the
//! responder.

use crate::error::{MAX_ADDRESS_WIDTH, SUPPORTED_BUS_WIDTHS};
use crate::{
    address_width_mask, AddressBeat, ConfigError, DataBeat, ReleaseCause, WatchdogPolicy,
    WriteResponse,
};

/// Default address width in bits.
pub const DEFAULT_ADDRESS_WIDTH: u32 = 32;

/// Default bus width in bytes.
pub const DEFAULT_BUS_WIDTH: u32 = 4;

/// Default idle beats tolerated before the watchdog fires.
pub const DEFAULT_TIMEOUT_BEATS: u32 = 32;

/// How write data and write responses cross the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DataPathMode {
    /// Data and response each pass through their own skid buffer.
    #[default]
    Buffered,
    /// Combinational pass-through gated by `connected`.
    Unbuffered,
}

/// Immutable configuration for one decoder instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecoderConfig {
    /// Address width in bits (1..=64).
    pub address_width: u32,
    /// Data bus width in bytes (1, 2, 4 or 8).
    pub bus_width: u32,
    /// Data/response path selection.
    pub data_path: DataPathMode,
    /// Idle beats before the watchdog fires; `0` disables it.
    pub timeout_beats: u32,
    /// Base address of the responder's window.
    pub base_address: u64,
    /// Bits of the address that must match `base_address`.
    pub region_mask: u64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            address_width: DEFAULT_ADDRESS_WIDTH,
            bus_width: DEFAULT_BUS_WIDTH,
            data_path: DataPathMode::Buffered,
            timeout_beats: DEFAULT_TIMEOUT_BEATS,
            base_address: 0,
            region_mask: 0,
        }
    }
}

impl DecoderConfig {
    /// Checks widths and that base and mask fit the address width.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address_width == 0 || self.address_width > MAX_ADDRESS_WIDTH {
            return Err(ConfigError::InvalidAddressWidth {
                width: self.address_width,
            });
        }
        if !SUPPORTED_BUS_WIDTHS.contains(&self.bus_width) {
            return Err(ConfigError::UnsupportedBusWidth {
                bytes: self.bus_width,
            });
        }

        let width_mask = address_width_mask(self.address_width);
        if self.base_address & !width_mask != 0 {
            return Err(ConfigError::BaseAddressOutOfRange {
                base: self.base_address,
                width: self.address_width,
            });
        }
        if self.region_mask & !width_mask != 0 {
            return Err(ConfigError::RegionMaskOutOfRange {
                mask: self.region_mask,
                width: self.address_width,
            });
        }
        Ok(())
    }

    /// Watchdog policy derived from `timeout_beats`.
    #[must_use]
    pub const fn watchdog_policy(&self) -> WatchdogPolicy {
        WatchdogPolicy::from_beats(self.timeout_beats)
    }

    /// Strobe bits that are meaningful for this bus width.
    #[must_use]
    pub const fn strobe_mask(&self) -> u8 {
        if self.bus_width >= 8 {
            u8::MAX
        } else {
            (1_u8 << self.bus_width) - 1
        }
    }

    /// Data bits that are meaningful for this bus width.
    #[must_use]
    pub const fn data_mask(&self) -> u64 {
        address_width_mask(self.bus_width * 8)
    }
}

/// Signals driven by the requester into the `s_axi_*` port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UpstreamRequest {
    /// `s_axi_awvalid`.
    pub awvalid: bool,
    /// `s_axi_awaddr` / `s_axi_awprot`.
    pub aw: AddressBeat,
    /// `s_axi_wvalid`.
    pub wvalid: bool,
    /// `s_axi_wdata` / `s_axi_wstrb`.
    pub w: DataBeat,
    /// `s_axi_bready`.
    pub bready: bool,
}

/// Signals driven by the responder into the `m_axi_*` port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DownstreamResponse {
    /// `m_axi_awready`.
    pub awready: bool,
    /// `m_axi_wready`.
    pub wready: bool,
    /// `m_axi_bvalid`.
    pub bvalid: bool,
    /// `m_axi_bresp`.
    pub bresp: WriteResponse,
}

/// Signals the decoder drives back to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UpstreamResponse {
    /// `s_axi_awready`.
    pub awready: bool,
    /// `s_axi_wready`.
    pub wready: bool,
    /// `s_axi_bvalid`.
    pub bvalid: bool,
    /// `s_axi_bresp`.
    pub bresp: WriteResponse,
}

/// Signals the decoder drives to the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DownstreamRequest {
    /// `m_axi_awvalid`.
    pub awvalid: bool,
    /// `m_axi_awaddr` (slave-relative) / `m_axi_awprot`.
    pub aw: AddressBeat,
    /// `m_axi_wvalid`.
    pub wvalid: bool,
    /// `m_axi_wdata` / `m_axi_wstrb`.
    pub w: DataBeat,
    /// `m_axi_bready`.
    pub bready: bool,
}

/// Everything sampled by the decoder in one clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CycleInputs {
    /// Global reset, asserted high (the inverse of the bus's active-low `arstn`).
    pub reset: bool,
    /// Requester side.
    pub upstream: UpstreamRequest,
    /// Responder side.
    pub downstream: DownstreamResponse,
}

/// Everything the decoder drives during one clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CycleOutputs {
    /// Gate status.
    pub connected: bool,
    /// Watchdog pulse.
    pub timeout: bool,
    /// Requester side.
    pub upstream: UpstreamResponse,
    /// Responder side.
    pub downstream: DownstreamRequest,
}

/// Deterministic trace events emitted in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Reset was applied.
    Reset {
        /// Cycle index at which reset was observed.
        cycle: u64,
    },
    /// An in-region address raised the connection.
    AddressMatched {
        /// Cycle index of the match.
        cycle: u64,
        /// Global address that matched.
        addr: u64,
    },
    /// A valid address was held off because it is outside the region.
    AddressRejected {
        /// Cycle index of the rejection.
        cycle: u64,
        /// Global address that was rejected.
        addr: u64,
    },
    /// The downstream address handshake completed.
    AddressForwarded {
        /// Cycle index of the handshake.
        cycle: u64,
        /// Slave-relative address and protection tag.
        beat: AddressBeat,
    },
    /// The downstream data handshake completed.
    DataForwarded {
        /// Cycle index of the handshake.
        cycle: u64,
        /// Forwarded data beat.
        beat: DataBeat,
    },
    /// The upstream response handshake completed.
    ResponseReturned {
        /// Cycle index of the handshake.
        cycle: u64,
        /// Response code handed to the requester.
        resp: WriteResponse,
    },
    /// The watchdog pulse is asserted.
    TimeoutFired {
        /// Cycle index in which the pulse is visible.
        cycle: u64,
    },
    /// The connection is released at the end of this cycle.
    Disconnected {
        /// Cycle index of the release.
        cycle: u64,
        /// Why the connection ended.
        cause: ReleaseCause,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in evaluation order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn on_event(&mut self, _event: TraceEvent) {}
}

/// Sink that records every event in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceLog {
    events: Vec<TraceEvent>,
}

impl TraceLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Removes and returns every recorded event.
    pub fn drain(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.events)
    }
}

impl TraceSink for TraceLog {
    fn on_event(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}
