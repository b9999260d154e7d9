//! Bus requester/responder models and testbench for the write-channel decoder.

#[cfg(test)]
use env_logger as _;
#[cfg(test)]
use proptest as _;

/// Harness error taxonomy.
pub mod error;
pub use error::HarnessError;

/// Cycling pause patterns.
pub mod pause;
pub use pause::PauseGenerator;

/// Write-only requester model.
pub mod master;
pub use master::{Completion, WriteMaster, WriteRequest};

/// RAM responder model.
pub mod ram;
pub use ram::{RamResponder, MAX_WINDOW_BYTES};

/// Requester → decoder → responder testbench.
pub mod bench;
pub use bench::{bench_config, Testbench, BENCH_BASE_ADDRESS, BENCH_REGION_MASK, RESET_CYCLES};
