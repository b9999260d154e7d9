//! Cycle-accurate model of an address-gated bus write-channel decoder.

/// Payload types for the address, data and response channels.
pub mod channel;
pub use channel::{AddressBeat, DataBeat, WriteResponse, PROT_MASK};

/// Construction and snapshot error taxonomy.
pub mod error;
pub use error::{ConfigError, SnapshotError, MAX_ADDRESS_WIDTH, SUPPORTED_BUS_WIDTHS};

/// Address region predicate and slave-relative translation.
pub mod region;
pub use region::{address_width_mask, AddressRegion};

/// One-deep skid buffer.
pub mod skid;
pub use skid::{SkidBuffer, SkidControl, SkidEval};

/// Address decoder owning the `connected` flag.
pub mod addr_decoder;
pub use addr_decoder::{
    AddressDecoder, ConnectionState, DecodeInputs, DecodeOutcome, ReleaseCause,
};

/// Idle-timeout watchdog.
pub mod watchdog;
pub use watchdog::{
    ChannelActivity, TimeoutWatchdog, WatchdogPhase, WatchdogPolicy, WatchdogState,
};

/// Activity counters.
pub mod diag;
pub use diag::DecoderStats;

/// Public host-facing configuration, port and trace contracts.
pub mod api;
pub use api::{
    CycleInputs, CycleOutputs, DataPathMode, DecoderConfig, DownstreamRequest,
    DownstreamResponse, NullTrace, TraceEvent, TraceLog, TraceSink, UpstreamRequest,
    UpstreamResponse, DEFAULT_ADDRESS_WIDTH, DEFAULT_BUS_WIDTH, DEFAULT_TIMEOUT_BEATS,
};

/// Registered-state snapshots.
pub mod snapshot;
pub use snapshot::{DataPathSnapshot, DecoderSnapshot, SnapshotVersion};

/// Write-channel decoder tying the address, data and response paths together.
pub mod write_decoder;
pub use write_decoder::{DataPath, PendingUpdate, WriteChannelDecoder};

#[cfg(test)]
use proptest as _;
