//! Write-only bus requester model.
//!
//! The requester drives its valids from registered state only, never from
//! the same-cycle readies, and keeps a valid asserted once raised until the
//! handshake completes. One write is in flight at a time; further writes
//! queue behind it.

use std::collections::VecDeque;

use decoder_core::{
    AddressBeat, ConfigError, DataBeat, UpstreamRequest, UpstreamResponse, WriteResponse,
    SUPPORTED_BUS_WIDTHS,
};

use crate::{HarnessError, PauseGenerator};

/// Lane-mapped single-beat write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteRequest {
    /// Byte address as issued by the requester.
    pub addr: u64,
    /// Lane-aligned data and strobes.
    pub beat: DataBeat,
}

impl WriteRequest {
    /// Maps `bytes` onto the lanes of a `bus_width`-byte beat at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the bus width is unsupported or the
    /// payload is empty, wider than a beat or crosses a beat boundary.
    pub fn new(addr: u64, bytes: &[u8], bus_width: u32) -> Result<Self, HarnessError> {
        if !SUPPORTED_BUS_WIDTHS.contains(&bus_width) {
            return Err(ConfigError::UnsupportedBusWidth { bytes: bus_width }.into());
        }
        if bytes.is_empty() {
            return Err(HarnessError::EmptyWrite { addr });
        }
        let width = usize::try_from(bus_width).unwrap_or(usize::MAX);
        if bytes.len() > width {
            return Err(HarnessError::OversizedWrite {
                len: bytes.len(),
                bus_width,
            });
        }
        let lane = usize::try_from(addr % u64::from(bus_width)).unwrap_or(usize::MAX);
        if lane.saturating_add(bytes.len()) > width {
            return Err(HarnessError::UnalignedWrite {
                addr,
                len: bytes.len(),
                bus_width,
            });
        }

        let mut data = 0_u64;
        let mut strb = 0_u8;
        for (offset, byte) in bytes.iter().enumerate() {
            let position = lane + offset;
            data |= u64::from(*byte) << (position * 8);
            strb |= 1 << position;
        }
        Ok(Self {
            addr,
            beat: DataBeat::new(data, strb),
        })
    }
}

/// Record of a finished or abandoned write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Completion {
    /// Address the write was issued to.
    pub addr: u64,
    /// Response received, or `None` when the write was abandoned.
    pub resp: Option<WriteResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    request: WriteRequest,
    address_sent: bool,
    data_sent: bool,
    awvalid: bool,
    wvalid: bool,
}

impl InFlight {
    const fn new(request: WriteRequest) -> Self {
        Self {
            request,
            address_sent: false,
            data_sent: false,
            awvalid: false,
            wvalid: false,
        }
    }
}

/// Requester issuing queued single-beat writes.
#[derive(Debug, Clone)]
pub struct WriteMaster {
    bus_width: u32,
    prot: u8,
    queue: VecDeque<WriteRequest>,
    current: Option<InFlight>,
    aw_pause: PauseGenerator,
    w_pause: PauseGenerator,
    completions: Vec<Completion>,
}

impl WriteMaster {
    /// Creates an idle requester for a `bus_width`-byte bus.
    #[must_use]
    pub const fn new(bus_width: u32) -> Self {
        Self {
            bus_width,
            prot: 0,
            queue: VecDeque::new(),
            current: None,
            aw_pause: PauseGenerator::never(),
            w_pause: PauseGenerator::never(),
            completions: Vec::new(),
        }
    }

    /// Sets the protection tag driven with every address.
    pub fn set_prot(&mut self, prot: u8) {
        self.prot = prot;
    }

    /// Throttles raising the address valid.
    pub fn set_address_pause(&mut self, pause: PauseGenerator) {
        self.aw_pause = pause;
    }

    /// Throttles raising the data valid.
    pub fn set_data_pause(&mut self, pause: PauseGenerator) {
        self.w_pause = pause;
    }

    /// Queues a write of `bytes` at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the payload cannot be mapped to one beat.
    pub fn init_write(&mut self, addr: u64, bytes: &[u8]) -> Result<(), HarnessError> {
        let request = WriteRequest::new(addr, bytes, self.bus_width)?;
        self.queue.push_back(request);
        Ok(())
    }

    /// Returns `true` when nothing is queued or in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    /// Write currently on the bus.
    #[must_use]
    pub fn in_flight(&self) -> Option<WriteRequest> {
        self.current.map(|flight| flight.request)
    }

    /// Writes finished or abandoned so far, in order.
    #[must_use]
    pub fn completions(&self) -> &[Completion] {
        &self.completions
    }

    /// Abandons the in-flight write, withdrawing any valid still asserted.
    ///
    /// Returns the abandoned address, if a write was in flight.
    pub fn clear_address(&mut self) -> Option<u64> {
        let flight = self.current.take()?;
        let addr = flight.request.addr;
        log::warn!(
            "abandoning write at {addr:#x} (address sent: {}, data sent: {})",
            flight.address_sent,
            flight.data_sent
        );
        self.completions.push(Completion { addr, resp: None });
        Some(addr)
    }

    /// Signals driven this cycle. Consumes one pause decision per channel.
    pub fn drive(&mut self) -> UpstreamRequest {
        let aw_pause = self.aw_pause.next_pause();
        let w_pause = self.w_pause.next_pause();

        if self.current.is_none() {
            self.current = self.queue.pop_front().map(InFlight::new);
        }
        let Some(flight) = self.current.as_mut() else {
            return UpstreamRequest::default();
        };

        if !flight.address_sent && !flight.awvalid && !aw_pause {
            flight.awvalid = true;
        }
        if !flight.data_sent && !flight.wvalid && !w_pause {
            flight.wvalid = true;
        }

        UpstreamRequest {
            awvalid: flight.awvalid,
            aw: AddressBeat::new(flight.request.addr, self.prot),
            wvalid: flight.wvalid,
            w: flight.request.beat,
            bready: true,
        }
    }

    /// Samples the decoder's response to the signals from [`Self::drive`].
    pub fn observe(&mut self, request: &UpstreamRequest, response: &UpstreamResponse) {
        let Some(flight) = self.current.as_mut() else {
            return;
        };

        if request.awvalid && response.awready {
            flight.address_sent = true;
            flight.awvalid = false;
        }
        if request.wvalid && response.wready {
            flight.data_sent = true;
            flight.wvalid = false;
        }
        if request.bready && response.bvalid {
            let addr = flight.request.addr;
            let resp = response.bresp;
            if !resp.is_success() {
                log::warn!("write at {addr:#x} completed with {resp:?}");
            }
            self.completions.push(Completion {
                addr,
                resp: Some(resp),
            });
            self.current = None;
        }
    }
}
