//! Payload types carried by the write address, write data and write response channels.

/// Mask applied to the protection tag (`AWPROT` is three bits wide).
pub const PROT_MASK: u8 = 0b111;

/// One write-address beat: the `{protection-mode, address}` pair held by the address path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AddressBeat {
    /// Byte address as presented on the bus.
    pub addr: u64,
    /// Three-bit protection tag.
    pub prot: u8,
}

impl AddressBeat {
    /// Creates an address beat, truncating `prot` to its three defined bits.
    #[must_use]
    pub const fn new(addr: u64, prot: u8) -> Self {
        Self {
            addr,
            prot: prot & PROT_MASK,
        }
    }
}

/// One write-data beat: the `{strobe, data}` pair held by the data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DataBeat {
    /// Little-endian bus word; only the low `bus_width` bytes are meaningful.
    pub data: u64,
    /// Byte-lane strobe, one bit per byte of `data`.
    pub strb: u8,
}

impl DataBeat {
    /// Creates a data beat.
    #[must_use]
    pub const fn new(data: u64, strb: u8) -> Self {
        Self { data, strb }
    }
}

/// Two-bit write response code carried on the response channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum WriteResponse {
    /// Normal access success.
    #[default]
    Okay = 0b00,
    /// Exclusive access success.
    ExOkay = 0b01,
    /// Responder reached but reported an error.
    SlvErr = 0b10,
    /// No responder at the transaction address.
    DecErr = 0b11,
}

impl WriteResponse {
    /// Returns the two-bit wire encoding.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Converts a wire encoding back into a response code.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(Self::Okay),
            0b01 => Some(Self::ExOkay),
            0b10 => Some(Self::SlvErr),
            0b11 => Some(Self::DecErr),
            _ => None,
        }
    }

    /// Returns `true` for `OKAY` and `EXOKAY`.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Okay | Self::ExOkay)
    }
}
