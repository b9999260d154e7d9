//! Configuration and snapshot errors.

use thiserror::Error;

/// Widest address the model carries.
pub const MAX_ADDRESS_WIDTH: u32 = 64;

/// Bus widths, in bytes, supported by the data path.
pub const SUPPORTED_BUS_WIDTHS: [u32; 4] = [1, 2, 4, 8];

/// Rejections raised while validating a [`DecoderConfig`](crate::DecoderConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ConfigError {
    /// Address width was zero or exceeded [`MAX_ADDRESS_WIDTH`].
    #[error("address width {width} is outside 1..=64")]
    InvalidAddressWidth {
        /// Rejected width in bits.
        width: u32,
    },
    /// Bus width is not one of [`SUPPORTED_BUS_WIDTHS`].
    #[error("bus width of {bytes} bytes is not supported (expected 1, 2, 4 or 8)")]
    UnsupportedBusWidth {
        /// Rejected width in bytes.
        bytes: u32,
    },
    /// Base address has bits set above the address width.
    #[error("base address {base:#x} does not fit in {width} address bits")]
    BaseAddressOutOfRange {
        /// Rejected base address.
        base: u64,
        /// Configured address width.
        width: u32,
    },
    /// Region mask has bits set above the address width.
    #[error("region mask {mask:#x} does not fit in {width} address bits")]
    RegionMaskOutOfRange {
        /// Rejected region mask.
        mask: u64,
        /// Configured address width.
        width: u32,
    },
}

/// Rejections raised while restoring a [`DecoderSnapshot`](crate::DecoderSnapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SnapshotError {
    /// Snapshot wire version is not known to this build.
    #[error("unsupported snapshot version {version}")]
    UnsupportedVersion {
        /// Raw version found in the snapshot.
        version: u16,
    },
    /// Snapshot was captured from a decoder with the other data-path mode.
    #[error("snapshot data path does not match the decoder's configured data path")]
    DataPathMismatch,
}
