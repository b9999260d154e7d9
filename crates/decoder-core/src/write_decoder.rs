//! Write-channel decoder: the address-gated path between one requester and one responder.
//!
//! Each clock is evaluated in a fixed order:
//! 1. Sample the registered `connected` flag and watchdog pulse.
//! 2. Evaluate the address skid buffer (enable = admitted, not yet taken and
//!    still in region; flush = pulse).
//! 3. Evaluate the data/response path for the configured [`DataPath`].
//! 4. Feed the upstream handshakes to the address decoder.
//! 5. Feed the monitored valids to the watchdog.
//!
//! Nothing is mutated until [`WriteChannelDecoder::commit`], so a caller can
//! inspect the outputs of a cycle before the clock edge is applied.

use crate::{
    AddressBeat, AddressDecoder, AddressRegion, ChannelActivity, ConfigError, CycleInputs,
    CycleOutputs, DataBeat, DataPathMode, DataPathSnapshot, DecodeInputs, DecodeOutcome,
    DecoderConfig, DecoderSnapshot, DecoderStats, DownstreamRequest, NullTrace, ReleaseCause,
    SkidBuffer, SkidControl, SkidEval, SnapshotError, SnapshotVersion, TimeoutWatchdog,
    TraceEvent, TraceSink, UpstreamResponse, WatchdogPhase, WatchdogState, WriteResponse,
};

/// Data/response path variant chosen once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataPath {
    /// Data and response each held in their own skid buffer.
    Buffered {
        /// Write-data buffer.
        data: SkidBuffer<DataBeat>,
        /// Write-response buffer.
        response: SkidBuffer<WriteResponse>,
    },
    /// Combinational pass-through gated by `connected`.
    Unbuffered,
}

impl DataPath {
    /// Creates an empty path for `mode`.
    #[must_use]
    pub const fn new(mode: DataPathMode) -> Self {
        match mode {
            DataPathMode::Buffered => Self::Buffered {
                data: SkidBuffer::new(),
                response: SkidBuffer::new(),
            },
            DataPathMode::Unbuffered => Self::Unbuffered,
        }
    }

    /// Mode this path was built for.
    #[must_use]
    pub const fn mode(&self) -> DataPathMode {
        match self {
            Self::Buffered { .. } => DataPathMode::Buffered,
            Self::Unbuffered => DataPathMode::Unbuffered,
        }
    }

    fn clear(&mut self) {
        if let Self::Buffered { data, response } = self {
            data.clear();
            response.clear();
        }
    }
}

/// Port values of the data/response path for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DataPathEval {
    upstream_wready: bool,
    upstream_bvalid: bool,
    upstream_bresp: WriteResponse,
    downstream_wvalid: bool,
    downstream_w: DataBeat,
    downstream_bready: bool,
    data_forwarded: Option<DataBeat>,
    response_returned: Option<WriteResponse>,
    buffers: Option<(SkidEval<DataBeat>, SkidEval<WriteResponse>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CycleUpdate {
    timeout: bool,
    rejected_addr: Option<u64>,
    matched_addr: Option<u64>,
    decode: DecodeOutcome,
    watchdog: WatchdogState,
    address: SkidEval<AddressBeat>,
    address_forwarded: Option<AddressBeat>,
    data_path: DataPathEval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateKind {
    Reset,
    Advance(CycleUpdate),
}

/// State change computed by [`WriteChannelDecoder::evaluate`], applied by
/// [`WriteChannelDecoder::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingUpdate {
    kind: UpdateKind,
}

impl PendingUpdate {
    /// Returns `true` when this update applies reset.
    #[must_use]
    pub const fn is_reset(&self) -> bool {
        matches!(self.kind, UpdateKind::Reset)
    }
}

/// Address-gated write-channel decoder with idle-timeout recovery.
#[derive(Debug, Clone)]
pub struct WriteChannelDecoder {
    config: DecoderConfig,
    region: AddressRegion,
    decoder: AddressDecoder,
    watchdog: TimeoutWatchdog,
    address: SkidBuffer<AddressBeat>,
    data_path: DataPath,
    stats: DecoderStats,
    cycle: u64,
}

impl WriteChannelDecoder {
    /// Builds a decoder in its reset state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails [`DecoderConfig::validate`].
    pub fn new(config: DecoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let region = AddressRegion::new(
            config.base_address,
            config.region_mask,
            config.address_width,
        );
        Ok(Self {
            config,
            region,
            decoder: AddressDecoder::new(region),
            watchdog: TimeoutWatchdog::new(config.watchdog_policy()),
            address: SkidBuffer::new(),
            data_path: DataPath::new(config.data_path),
            stats: DecoderStats::new(),
            cycle: 0,
        })
    }

    /// Configuration fixed at construction.
    #[must_use]
    pub const fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Responder window.
    #[must_use]
    pub const fn region(&self) -> AddressRegion {
        self.region
    }

    /// Gate status for the current cycle.
    #[must_use]
    pub const fn connected(&self) -> bool {
        self.decoder.connected()
    }

    /// Watchdog pulse for the current cycle.
    #[must_use]
    pub const fn timeout_pulse(&self) -> bool {
        self.watchdog.fired()
    }

    /// Idle beats counted by the watchdog.
    #[must_use]
    pub const fn idle_beats(&self) -> u32 {
        self.watchdog.counter()
    }

    /// Watchdog phase for the current cycle.
    #[must_use]
    pub const fn watchdog_phase(&self) -> WatchdogPhase {
        self.watchdog.phase()
    }

    /// Cycles advanced since the last reset.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Activity counters.
    #[must_use]
    pub const fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    /// Data/response path variant.
    #[must_use]
    pub const fn data_path(&self) -> &DataPath {
        &self.data_path
    }

    /// Address beat waiting in the address buffer, as received from upstream.
    #[must_use]
    pub const fn held_address(&self) -> Option<AddressBeat> {
        self.address.held()
    }

    /// Returns every register to its power-on value.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.watchdog.reset();
        self.address.clear();
        self.data_path.clear();
        self.stats.reset();
        self.cycle = 0;
    }

    /// Advances one clock and returns the values driven during it.
    pub fn tick(&mut self, inputs: &CycleInputs) -> CycleOutputs {
        self.tick_with_trace(inputs, &mut NullTrace)
    }

    /// Advances one clock, reporting events to `sink`.
    pub fn tick_with_trace(
        &mut self,
        inputs: &CycleInputs,
        sink: &mut dyn TraceSink,
    ) -> CycleOutputs {
        let (outputs, update) = self.evaluate(inputs);
        self.commit_with_trace(update, sink);
        outputs
    }

    /// Computes this cycle's outputs and the pending clock-edge update.
    #[must_use]
    pub fn evaluate(&self, inputs: &CycleInputs) -> (CycleOutputs, PendingUpdate) {
        if inputs.reset {
            return (
                CycleOutputs::default(),
                PendingUpdate {
                    kind: UpdateKind::Reset,
                },
            );
        }

        let upstream = &inputs.upstream;
        let downstream = &inputs.downstream;
        let connected = self.decoder.connected();
        let timeout = self.watchdog.fired();
        let gate = SkidControl {
            enable: connected,
            flush: timeout,
        };

        let address = self.address.evaluate(
            upstream.awvalid,
            AddressBeat::new(self.region.truncate(upstream.aw.addr), upstream.aw.prot),
            downstream.awready,
            SkidControl {
                enable: self.decoder.admits(upstream.aw.addr),
                flush: timeout,
            },
        );
        let local_address = AddressBeat::new(
            self.region.localize(address.down_data.addr),
            address.down_data.prot,
        );

        let data_path = self.evaluate_data_path(inputs, gate);

        let decode = self.decoder.evaluate(DecodeInputs {
            awvalid: upstream.awvalid,
            awaddr: upstream.aw.addr,
            address_accepted: address.accepted,
            response_done: data_path.response_returned.is_some(),
            timeout,
        });

        let watchdog = self.watchdog.evaluate(
            ChannelActivity {
                address_valid: upstream.awvalid,
                data_valid: upstream.wvalid,
                response_valid: downstream.bvalid,
            },
            connected,
        );

        let outputs = CycleOutputs {
            connected,
            timeout,
            upstream: UpstreamResponse {
                awready: address.up_ready,
                wready: data_path.upstream_wready,
                bvalid: data_path.upstream_bvalid,
                bresp: data_path.upstream_bresp,
            },
            downstream: DownstreamRequest {
                awvalid: address.down_valid,
                aw: local_address,
                wvalid: data_path.downstream_wvalid,
                w: data_path.downstream_w,
                bready: data_path.downstream_bready,
            },
        };

        let update = CycleUpdate {
            timeout,
            rejected_addr: decode.rejected.then_some(upstream.aw.addr),
            matched_addr: decode.matched.then_some(upstream.aw.addr),
            decode,
            watchdog,
            address,
            address_forwarded: address.delivered.then_some(local_address),
            data_path,
        };

        (
            outputs,
            PendingUpdate {
                kind: UpdateKind::Advance(update),
            },
        )
    }

    fn evaluate_data_path(&self, inputs: &CycleInputs, gate: SkidControl) -> DataPathEval {
        let upstream = &inputs.upstream;
        let downstream = &inputs.downstream;
        let beat = DataBeat::new(
            upstream.w.data & self.config.data_mask(),
            upstream.w.strb & self.config.strobe_mask(),
        );

        match &self.data_path {
            DataPath::Buffered { data, response } => {
                let data = data.evaluate(upstream.wvalid, beat, downstream.wready, gate);
                let response =
                    response.evaluate(downstream.bvalid, downstream.bresp, upstream.bready, gate);
                DataPathEval {
                    upstream_wready: data.up_ready,
                    upstream_bvalid: response.down_valid,
                    upstream_bresp: response.down_data,
                    downstream_wvalid: data.down_valid,
                    downstream_w: data.down_data,
                    downstream_bready: response.up_ready,
                    data_forwarded: data.delivered.then_some(data.down_data),
                    response_returned: response.delivered.then_some(response.down_data),
                    buffers: Some((data, response)),
                }
            }
            DataPath::Unbuffered => {
                let connected = gate.enable;
                let wvalid = upstream.wvalid && connected;
                let bvalid = downstream.bvalid && connected;
                DataPathEval {
                    upstream_wready: downstream.wready && connected,
                    upstream_bvalid: bvalid,
                    upstream_bresp: downstream.bresp,
                    downstream_wvalid: wvalid,
                    downstream_w: beat,
                    downstream_bready: upstream.bready && connected,
                    data_forwarded: (wvalid && downstream.wready).then_some(beat),
                    response_returned: (bvalid && upstream.bready).then_some(downstream.bresp),
                    buffers: None,
                }
            }
        }
    }

    /// Applies an update computed by [`Self::evaluate`].
    pub fn commit(&mut self, update: PendingUpdate) {
        self.commit_with_trace(update, &mut NullTrace);
    }

    /// Applies an update, reporting events to `sink`.
    pub fn commit_with_trace(&mut self, update: PendingUpdate, sink: &mut dyn TraceSink) {
        let cycle = self.cycle;
        let step = match update.kind {
            UpdateKind::Reset => {
                sink.on_event(TraceEvent::Reset { cycle });
                log::debug!("write decoder reset at cycle {cycle}");
                self.reset();
                return;
            }
            UpdateKind::Advance(step) => step,
        };

        if step.timeout {
            self.stats.record_timeout(cycle);
            sink.on_event(TraceEvent::TimeoutFired { cycle });
            log::debug!(
                "write decoder timeout fired at cycle {cycle} after {} idle beats",
                self.watchdog.policy().beats()
            );
        }
        if let Some(addr) = step.rejected_addr {
            self.stats.record_rejected();
            sink.on_event(TraceEvent::AddressRejected { cycle, addr });
        }
        if let Some(addr) = step.matched_addr {
            self.stats.record_admitted();
            sink.on_event(TraceEvent::AddressMatched { cycle, addr });
            log::debug!("write decoder admitted address {addr:#x} at cycle {cycle}");
        }
        if let Some(beat) = step.address_forwarded {
            self.stats.record_address_forwarded();
            sink.on_event(TraceEvent::AddressForwarded { cycle, beat });
            log::trace!("address {:#x} forwarded at cycle {cycle}", beat.addr);
        }
        if let Some(beat) = step.data_path.data_forwarded {
            self.stats.record_data_forwarded();
            sink.on_event(TraceEvent::DataForwarded { cycle, beat });
            log::trace!("data {:#x} forwarded at cycle {cycle}", beat.data);
        }
        if let Some(resp) = step.data_path.response_returned {
            self.stats.record_response_returned();
            sink.on_event(TraceEvent::ResponseReturned { cycle, resp });
            log::trace!("response {resp:?} returned at cycle {cycle}");
        }
        if let Some(cause) = step.decode.released {
            sink.on_event(TraceEvent::Disconnected { cycle, cause });
            if cause == ReleaseCause::Timeout {
                log::debug!("write decoder dropped stalled transaction at cycle {cycle}");
            }
        }

        self.decoder.commit(&step.decode);
        self.watchdog.commit(step.watchdog);
        self.address.commit(&step.address);
        if let (DataPath::Buffered { data, response }, Some((data_eval, response_eval))) =
            (&mut self.data_path, step.data_path.buffers)
        {
            data.commit(&data_eval);
            response.commit(&response_eval);
        }
        self.cycle = self.cycle.saturating_add(1);
    }

    /// Captures the registered state.
    #[must_use]
    pub const fn snapshot(&self) -> DecoderSnapshot {
        DecoderSnapshot {
            version: SnapshotVersion::V1,
            cycle: self.cycle,
            connection: self.decoder.state(),
            watchdog: self.watchdog.state(),
            address: self.address.held(),
            data_path: match &self.data_path {
                DataPath::Buffered { data, response } => DataPathSnapshot::Buffered {
                    data: data.held(),
                    response: response.held(),
                },
                DataPath::Unbuffered => DataPathSnapshot::Unbuffered,
            },
            stats: self.stats,
        }
    }

    /// Restores registered state captured by [`Self::snapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DataPathMismatch`] when the snapshot was taken
    /// from a decoder with the other data-path mode; the decoder is left untouched.
    pub fn restore(&mut self, snapshot: &DecoderSnapshot) -> Result<(), SnapshotError> {
        match (&mut self.data_path, snapshot.data_path) {
            (
                DataPath::Buffered { data, response },
                DataPathSnapshot::Buffered {
                    data: held_data,
                    response: held_response,
                },
            ) => {
                data.restore(held_data);
                response.restore(held_response);
            }
            (DataPath::Unbuffered, DataPathSnapshot::Unbuffered) => {}
            _ => return Err(SnapshotError::DataPathMismatch),
        }

        self.cycle = snapshot.cycle;
        self.decoder.restore(snapshot.connection);
        self.watchdog.restore(snapshot.watchdog);
        self.address.restore(snapshot.address);
        self.stats = snapshot.stats;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{DataPath, WriteChannelDecoder};
    use crate::{
        AddressBeat, CycleInputs, DataBeat, DataPathMode, DecoderConfig, DownstreamResponse,
        SnapshotError, TraceEvent, TraceLog, UpstreamRequest, WatchdogPhase,
    };

    fn config(mode: DataPathMode, timeout_beats: u32) -> DecoderConfig {
        DecoderConfig {
            address_width: 16,
            bus_width: 4,
            data_path: mode,
            timeout_beats,
            base_address: 0x1000,
            region_mask: 0xFF00,
        }
    }

    fn address_only(addr: u64) -> CycleInputs {
        CycleInputs {
            upstream: UpstreamRequest {
                awvalid: true,
                aw: AddressBeat::new(addr, 0),
                ..UpstreamRequest::default()
            },
            ..CycleInputs::default()
        }
    }

    #[rstest]
    #[case(DataPathMode::Buffered)]
    #[case(DataPathMode::Unbuffered)]
    fn data_path_variant_follows_config(#[case] mode: DataPathMode) {
        let dec = WriteChannelDecoder::new(config(mode, 4)).expect("valid config");
        assert_eq!(dec.data_path().mode(), mode);
        assert_eq!(
            matches!(dec.data_path(), DataPath::Buffered { .. }),
            mode == DataPathMode::Buffered
        );
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let bad = DecoderConfig {
            bus_width: 5,
            ..DecoderConfig::default()
        };
        assert!(WriteChannelDecoder::new(bad).is_err());
    }

    #[test]
    fn awready_is_withheld_until_connected() {
        let mut dec =
            WriteChannelDecoder::new(config(DataPathMode::Buffered, 4)).expect("valid config");
        let first = dec.tick(&address_only(0x1050));
        assert!(!first.connected);
        assert!(!first.upstream.awready);

        let second = dec.tick(&address_only(0x1050));
        assert!(second.connected);
        assert!(second.upstream.awready);
    }

    #[test]
    fn forwarded_address_is_slave_relative() {
        let mut dec =
            WriteChannelDecoder::new(config(DataPathMode::Buffered, 0)).expect("valid config");
        dec.tick(&address_only(0x1050));
        dec.tick(&address_only(0x1050));
        assert_eq!(dec.held_address(), Some(AddressBeat::new(0x1050, 0)));

        let out = dec.tick(&CycleInputs {
            downstream: DownstreamResponse {
                awready: true,
                ..DownstreamResponse::default()
            },
            ..CycleInputs::default()
        });
        assert!(out.downstream.awvalid);
        assert_eq!(out.downstream.aw.addr, 0x0050);
        assert_eq!(dec.stats().addresses_forwarded, 1);
    }

    #[test]
    fn second_address_is_not_taken_within_one_connection() {
        let mut dec =
            WriteChannelDecoder::new(config(DataPathMode::Buffered, 0)).expect("valid config");
        dec.tick(&address_only(0x1050));
        let taken = dec.tick(&address_only(0x1050));
        assert!(taken.upstream.awready);

        let mut inputs = address_only(0x1060);
        inputs.downstream.awready = true;
        let next = dec.tick(&inputs);
        assert!(!next.upstream.awready);
        assert!(next.downstream.awvalid);
        assert!(dec.held_address().is_none());
    }

    #[test]
    fn data_lanes_are_masked_to_bus_width() {
        let mut dec =
            WriteChannelDecoder::new(config(DataPathMode::Unbuffered, 0)).expect("valid config");
        dec.tick(&address_only(0x1000));
        let out = dec.tick(&CycleInputs {
            upstream: UpstreamRequest {
                wvalid: true,
                w: DataBeat::new(0xAAAA_BBBB_CCCC_DDDD, 0xFF),
                ..UpstreamRequest::default()
            },
            ..CycleInputs::default()
        });
        assert_eq!(out.downstream.w, DataBeat::new(0xCCCC_DDDD, 0x0F));
    }

    #[test]
    fn reset_input_overrides_everything() {
        let mut dec =
            WriteChannelDecoder::new(config(DataPathMode::Buffered, 4)).expect("valid config");
        dec.tick(&address_only(0x1050));
        assert!(dec.connected());

        let mut inputs = address_only(0x1050);
        inputs.reset = true;
        let mut log = TraceLog::new();
        let out = dec.tick_with_trace(&inputs, &mut log);
        assert!(!out.upstream.awready);
        assert!(!out.connected);
        assert!(!dec.connected());
        assert_eq!(dec.cycle(), 0);
        assert_eq!(log.events(), &[TraceEvent::Reset { cycle: 1 }]);
    }

    #[test]
    fn evaluate_does_not_mutate_until_commit() {
        let mut dec =
            WriteChannelDecoder::new(config(DataPathMode::Buffered, 4)).expect("valid config");
        let (_, update) = dec.evaluate(&address_only(0x1050));
        assert!(!update.is_reset());
        assert!(!dec.connected());
        dec.commit(update);
        assert!(dec.connected());
    }

    #[test]
    fn snapshot_restore_reproduces_state() {
        let mut dec =
            WriteChannelDecoder::new(config(DataPathMode::Buffered, 4)).expect("valid config");
        dec.tick(&address_only(0x1050));
        dec.tick(&address_only(0x1050));
        dec.tick(&CycleInputs::default());
        let snapshot = dec.snapshot();

        let mut other =
            WriteChannelDecoder::new(config(DataPathMode::Buffered, 4)).expect("valid config");
        other.restore(&snapshot).expect("same data path");
        assert_eq!(other.snapshot(), snapshot);
        assert_eq!(other.watchdog_phase(), WatchdogPhase::Counting);
        assert_eq!(other.held_address(), dec.held_address());
    }

    #[test]
    fn snapshot_from_other_data_path_is_rejected() {
        let buffered =
            WriteChannelDecoder::new(config(DataPathMode::Buffered, 4)).expect("valid config");
        let mut unbuffered =
            WriteChannelDecoder::new(config(DataPathMode::Unbuffered, 4)).expect("valid config");
        assert_eq!(
            unbuffered.restore(&buffered.snapshot()),
            Err(SnapshotError::DataPathMismatch)
        );
    }
}
