//! Capture and restore of the decoder's registered state.

use crate::{
    AddressBeat, ConnectionState, DataBeat, DecoderStats, SnapshotError, WatchdogState,
    WriteResponse,
};

/// Stable snapshot wire-version identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u16)]
pub enum SnapshotVersion {
    /// Initial schema revision.
    V1 = 1,
}

impl SnapshotVersion {
    /// Converts a wire value to a known snapshot version.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::UnsupportedVersion`] for unknown values.
    pub const fn from_u16(version: u16) -> Result<Self, SnapshotError> {
        match version {
            1 => Ok(Self::V1),
            _ => Err(SnapshotError::UnsupportedVersion { version }),
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Held items of the data and response paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DataPathSnapshot {
    /// Contents of the data and response skid buffers.
    Buffered {
        /// Held write-data beat.
        data: Option<DataBeat>,
        /// Held write response.
        response: Option<WriteResponse>,
    },
    /// Pass-through path; nothing is held.
    Unbuffered,
}

/// Full registered state of a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecoderSnapshot {
    /// Schema version.
    pub version: SnapshotVersion,
    /// Cycles since the last reset.
    pub cycle: u64,
    /// Address decoder state.
    pub connection: ConnectionState,
    /// Watchdog counter and pulse.
    pub watchdog: WatchdogState,
    /// Held write-address beat.
    pub address: Option<AddressBeat>,
    /// Data/response path contents.
    pub data_path: DataPathSnapshot,
    /// Activity counters.
    pub stats: DecoderStats,
}
