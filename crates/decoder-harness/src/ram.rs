//! Byte-addressed RAM responder model.
//!
//! Address and data are latched independently; the write is applied at the
//! clock edge on which both are held and no response is outstanding, and the
//! response is offered from the next cycle. Readies depend only on the
//! responder's own state and pause generators.

use decoder_core::{
    AddressBeat, AddressRegion, DataBeat, DownstreamRequest, DownstreamResponse, WriteResponse,
};

use crate::{HarnessError, PauseGenerator};

/// Largest window the RAM model will allocate.
pub const MAX_WINDOW_BYTES: u64 = 1 << 20;

/// Write-only responder backed by host memory.
#[derive(Debug, Clone)]
pub struct RamResponder {
    memory: Vec<u8>,
    bus_width: u32,
    address: Option<AddressBeat>,
    data: Option<DataBeat>,
    response: Option<WriteResponse>,
    awready: bool,
    wready: bool,
    bvalid: bool,
    aw_pause: PauseGenerator,
    w_pause: PauseGenerator,
    b_pause: PauseGenerator,
    muted: bool,
    writes: u64,
}

impl RamResponder {
    /// Creates a zero-filled RAM of `size` bytes on a `bus_width`-byte bus.
    #[must_use]
    pub fn new(size: usize, bus_width: u32) -> Self {
        Self {
            memory: vec![0; size],
            bus_width: bus_width.max(1),
            address: None,
            data: None,
            response: None,
            awready: false,
            wready: false,
            bvalid: false,
            aw_pause: PauseGenerator::never(),
            w_pause: PauseGenerator::never(),
            b_pause: PauseGenerator::never(),
            muted: false,
            writes: 0,
        }
    }

    /// Creates a RAM covering the local window of `region`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::WindowTooLarge`] when the window exceeds
    /// [`MAX_WINDOW_BYTES`].
    pub fn for_region(region: AddressRegion, bus_width: u32) -> Result<Self, HarnessError> {
        let bytes = region.window_bytes();
        let too_large = HarnessError::WindowTooLarge {
            bytes,
            limit: MAX_WINDOW_BYTES,
        };
        if bytes > MAX_WINDOW_BYTES {
            return Err(too_large);
        }
        let size = usize::try_from(bytes).map_err(|_| too_large)?;
        Ok(Self::new(size, bus_width))
    }

    /// Window size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.memory.len()
    }

    /// Writes applied so far, including rejected ones.
    #[must_use]
    pub const fn writes(&self) -> u64 {
        self.writes
    }

    /// Throttles the address ready.
    pub fn set_address_pause(&mut self, pause: PauseGenerator) {
        self.aw_pause = pause;
    }

    /// Throttles the data ready.
    pub fn set_data_pause(&mut self, pause: PauseGenerator) {
        self.w_pause = pause;
    }

    /// Throttles raising the response valid.
    pub fn set_response_pause(&mut self, pause: PauseGenerator) {
        self.b_pause = pause;
    }

    /// Holds the response valid low until [`Self::unmute_responses`].
    pub fn mute_responses(&mut self) {
        self.muted = true;
        self.bvalid = false;
    }

    /// Resumes answering and drops any response withheld while muted.
    pub fn unmute_responses(&mut self) {
        self.muted = false;
        self.response = None;
    }

    /// Returns `true` while responses are withheld.
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted
    }

    /// Drops latched address, data and response, as a responder reset would.
    pub fn abort_pending(&mut self) {
        self.address = None;
        self.data = None;
        self.response = None;
        self.bvalid = false;
    }

    /// Back-door read of `len` bytes at local `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::OutOfWindow`] when the range leaves the window.
    pub fn read(&self, offset: u64, len: usize) -> Result<&[u8], HarnessError> {
        let range = self.range(offset, len)?;
        Ok(&self.memory[range])
    }

    /// Back-door write of `bytes` at local `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::OutOfWindow`] when the range leaves the window.
    pub fn load(&mut self, offset: u64, bytes: &[u8]) -> Result<(), HarnessError> {
        let range = self.range(offset, bytes.len())?;
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }

    fn range(&self, offset: u64, len: usize) -> Result<std::ops::Range<usize>, HarnessError> {
        usize::try_from(offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(len)?))
            .filter(|range| range.end <= self.memory.len())
            .ok_or(HarnessError::OutOfWindow {
                offset,
                len,
                size: self.memory.len(),
            })
    }

    /// Signals driven this cycle. Consumes one pause decision per channel.
    pub fn drive(&mut self) -> DownstreamResponse {
        let aw_pause = self.aw_pause.next_pause();
        let w_pause = self.w_pause.next_pause();
        let b_pause = self.b_pause.next_pause();

        self.awready = self.address.is_none() && !aw_pause;
        self.wready = self.data.is_none() && !w_pause;
        if !self.muted && !self.bvalid && self.response.is_some() && !b_pause {
            self.bvalid = true;
        }

        DownstreamResponse {
            awready: self.awready,
            wready: self.wready,
            bvalid: self.bvalid,
            bresp: if self.bvalid {
                self.response.unwrap_or_default()
            } else {
                WriteResponse::default()
            },
        }
    }

    /// Samples the decoder's downstream port and applies the clock edge.
    pub fn observe(&mut self, request: &DownstreamRequest) {
        if request.awvalid && self.awready {
            self.address = Some(request.aw);
        }
        if request.wvalid && self.wready {
            self.data = Some(request.w);
        }
        if self.bvalid && request.bready {
            self.response = None;
            self.bvalid = false;
        }

        if self.response.is_none() {
            if let (Some(address), Some(data)) = (self.address, self.data) {
                self.response = Some(self.apply(address, data));
                self.address = None;
                self.data = None;
            }
        }
    }

    fn apply(&mut self, address: AddressBeat, data: DataBeat) -> WriteResponse {
        self.writes = self.writes.saturating_add(1);
        let width = u64::from(self.bus_width);
        let base = address.addr - address.addr % width;
        let lanes = usize::try_from(self.bus_width).unwrap_or(usize::MAX);

        let Ok(range) = self.range(base, lanes) else {
            log::warn!(
                "RAM write at {:#x} is outside the {}-byte window",
                address.addr,
                self.memory.len()
            );
            return WriteResponse::SlvErr;
        };

        let bytes = data.data.to_le_bytes();
        for (lane, (slot, byte)) in self.memory[range].iter_mut().zip(bytes).enumerate() {
            if data.strb & (1 << lane) != 0 {
                *slot = byte;
            }
        }
        WriteResponse::Okay
    }
}
