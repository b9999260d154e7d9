use decoder_core::ConfigError;
use thiserror::Error;

/// Failures raised by the bus models and the testbench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// Decoder configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Write payload was empty.
    #[error("write at {addr:#x} carries no bytes")]
    EmptyWrite {
        /// Requested address.
        addr: u64,
    },
    /// Write payload is wider than one bus beat.
    #[error("write of {len} bytes does not fit a {bus_width}-byte bus beat")]
    OversizedWrite {
        /// Payload length in bytes.
        len: usize,
        /// Bus width in bytes.
        bus_width: u32,
    },
    /// Write payload crosses a bus-beat boundary.
    #[error("write of {len} bytes at {addr:#x} crosses a {bus_width}-byte beat boundary")]
    UnalignedWrite {
        /// Requested address.
        addr: u64,
        /// Payload length in bytes.
        len: usize,
        /// Bus width in bytes.
        bus_width: u32,
    },
    /// Back-door RAM access falls outside the responder window.
    #[error("access of {len} bytes at offset {offset:#x} is outside the {size}-byte window")]
    OutOfWindow {
        /// Local offset of the access.
        offset: u64,
        /// Access length in bytes.
        len: usize,
        /// Window size in bytes.
        size: usize,
    },
    /// Responder window is too large to back with host memory.
    #[error("window of {bytes} bytes exceeds the {limit}-byte RAM model limit")]
    WindowTooLarge {
        /// Requested window size.
        bytes: u64,
        /// Largest supported window.
        limit: u64,
    },
    /// Write was withdrawn before its response arrived.
    #[error("write at {addr:#x} was abandoned before its response")]
    Abandoned {
        /// Address of the abandoned write.
        addr: u64,
    },
    /// Condition did not hold within the cycle budget.
    #[error("condition not reached within {cycles} cycles")]
    CycleLimit {
        /// Cycles spent waiting.
        cycles: u64,
    },
}
