//! Testbench wiring requester → decoder → responder on one clock.

use decoder_core::{
    AddressRegion, CycleInputs, CycleOutputs, DataPathMode, DecoderConfig, TraceEvent, TraceLog,
    WriteChannelDecoder, WriteResponse,
};

use crate::{HarnessError, RamResponder, WriteMaster};

/// Reset length used by the directed suites.
pub const RESET_CYCLES: u64 = 100;

/// Base address used by [`bench_config`].
pub const BENCH_BASE_ADDRESS: u64 = 0x4000_0000;

/// Region mask used by [`bench_config`], leaving a 256-byte window.
pub const BENCH_REGION_MASK: u64 = 0xFFFF_FF00;

/// 32-bit address, 4-byte bus configuration the directed suites run on.
#[must_use]
pub const fn bench_config(data_path: DataPathMode, timeout_beats: u32) -> DecoderConfig {
    DecoderConfig {
        address_width: 32,
        bus_width: 4,
        data_path,
        timeout_beats,
        base_address: BENCH_BASE_ADDRESS,
        region_mask: BENCH_REGION_MASK,
    }
}

/// Requester, decoder and responder advanced in lockstep.
#[derive(Debug, Clone)]
pub struct Testbench {
    decoder: WriteChannelDecoder,
    master: WriteMaster,
    ram: RamResponder,
    trace: TraceLog,
    last_inputs: CycleInputs,
    last_outputs: CycleOutputs,
    cycles: u64,
}

impl Testbench {
    /// Builds a bench with a RAM covering the decoder's window.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the configuration is invalid or the
    /// window is too large for the RAM model.
    pub fn new(config: DecoderConfig) -> Result<Self, HarnessError> {
        config.validate()?;
        let ram = RamResponder::for_region(
            AddressRegion::new(
                config.base_address,
                config.region_mask,
                config.address_width,
            ),
            config.bus_width,
        )?;
        Self::with_ram(config, ram)
    }

    /// Builds a bench around an existing responder.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] when the configuration is invalid.
    pub fn with_ram(config: DecoderConfig, ram: RamResponder) -> Result<Self, HarnessError> {
        Ok(Self {
            decoder: WriteChannelDecoder::new(config)?,
            master: WriteMaster::new(config.bus_width),
            ram,
            trace: TraceLog::new(),
            last_inputs: CycleInputs::default(),
            last_outputs: CycleOutputs::default(),
            cycles: 0,
        })
    }

    /// Device under test.
    #[must_use]
    pub const fn decoder(&self) -> &WriteChannelDecoder {
        &self.decoder
    }

    /// Requester model.
    #[must_use]
    pub const fn master(&self) -> &WriteMaster {
        &self.master
    }

    /// Mutable requester model.
    pub fn master_mut(&mut self) -> &mut WriteMaster {
        &mut self.master
    }

    /// Responder model.
    #[must_use]
    pub const fn ram(&self) -> &RamResponder {
        &self.ram
    }

    /// Mutable responder model.
    pub fn ram_mut(&mut self) -> &mut RamResponder {
        &mut self.ram
    }

    /// Trace events recorded so far.
    #[must_use]
    pub fn trace(&self) -> &[TraceEvent] {
        self.trace.events()
    }

    /// Removes and returns the recorded trace events.
    pub fn take_trace(&mut self) -> Vec<TraceEvent> {
        self.trace.drain()
    }

    /// Inputs the decoder sampled on the last clock.
    #[must_use]
    pub const fn last_inputs(&self) -> &CycleInputs {
        &self.last_inputs
    }

    /// Outputs the decoder drove on the last clock.
    #[must_use]
    pub const fn last_outputs(&self) -> &CycleOutputs {
        &self.last_outputs
    }

    /// Clocks advanced since construction, reset cycles included.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Holds reset for `cycles` clocks while the models keep driving.
    pub fn reset(&mut self, cycles: u64) -> Vec<CycleOutputs> {
        (0..cycles).map(|_| self.clock(true)).collect()
    }

    /// Advances one clock.
    pub fn step(&mut self) -> CycleOutputs {
        self.clock(false)
    }

    /// Advances `cycles` clocks.
    pub fn run(&mut self, cycles: u64) -> Vec<CycleOutputs> {
        (0..cycles).map(|_| self.step()).collect()
    }

    fn clock(&mut self, reset: bool) -> CycleOutputs {
        let inputs = CycleInputs {
            reset,
            upstream: self.master.drive(),
            downstream: self.ram.drive(),
        };
        let outputs = self.decoder.tick_with_trace(&inputs, &mut self.trace);
        self.master.observe(&inputs.upstream, &outputs.upstream);
        self.ram.observe(&outputs.downstream);

        self.last_inputs = inputs;
        self.last_outputs = outputs;
        self.cycles = self.cycles.saturating_add(1);
        outputs
    }

    /// Steps until `done` holds, checking before every clock.
    ///
    /// Returns the number of clocks taken.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::CycleLimit`] when `done` still fails after
    /// `limit` clocks.
    pub fn run_until(
        &mut self,
        mut done: impl FnMut(&Self) -> bool,
        limit: u64,
    ) -> Result<u64, HarnessError> {
        for taken in 0..limit {
            if done(self) {
                return Ok(taken);
            }
            self.step();
        }
        if done(self) {
            Ok(limit)
        } else {
            Err(HarnessError::CycleLimit { cycles: limit })
        }
    }

    /// Issues a write and waits for its response.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the payload is rejected, no response
    /// arrives within `limit` clocks or the write is abandoned.
    pub fn write(
        &mut self,
        addr: u64,
        bytes: &[u8],
        limit: u64,
    ) -> Result<WriteResponse, HarnessError> {
        let index = self.master.completions().len();
        self.master.init_write(addr, bytes)?;
        self.run_until(|bench| bench.master.completions().len() > index, limit)?;

        let completion = self
            .master
            .completions()
            .get(index)
            .copied()
            .ok_or(HarnessError::CycleLimit { cycles: limit })?;
        completion
            .resp
            .ok_or(HarnessError::Abandoned {
                addr: completion.addr,
            })
    }
}

#[cfg(test)]
mod tests {
    use decoder_core::{DataPathMode, DecoderConfig, TraceEvent, WriteResponse};
    use rstest::rstest;

    use super::{bench_config as config, Testbench};
    use crate::HarnessError;

    #[rstest]
    #[case(DataPathMode::Buffered)]
    #[case(DataPathMode::Unbuffered)]
    fn write_lands_in_ram_at_slave_relative_offset(#[case] mode: DataPathMode) {
        let mut bench = Testbench::new(config(mode, 16)).expect("valid config");
        bench.reset(4);

        let resp = bench
            .write(0x4000_0010, &[1, 2, 3, 4], 32)
            .expect("write completes");
        assert_eq!(resp, WriteResponse::Okay);
        assert_eq!(bench.ram().read(0x10, 4).expect("in window"), &[1, 2, 3, 4]);
        assert!(!bench.decoder().connected());
        assert!(bench
            .trace()
            .iter()
            .any(|event| matches!(event, TraceEvent::ResponseReturned { .. })));
    }

    #[test]
    fn reset_withholds_awready() {
        let mut bench = Testbench::new(config(DataPathMode::Buffered, 16)).expect("valid config");
        bench
            .master_mut()
            .init_write(0x4000_0000, &[9])
            .expect("aligned");
        for out in bench.reset(20) {
            assert!(!out.upstream.awready);
            assert!(!out.connected);
        }
        assert!(bench.last_inputs().upstream.awvalid);
        assert_eq!(bench.cycles(), 20);
    }

    #[test]
    fn run_until_reports_cycle_limit() {
        let mut bench = Testbench::new(config(DataPathMode::Buffered, 0)).expect("valid config");
        assert_eq!(
            bench.run_until(|bench| bench.decoder().connected(), 8),
            Err(HarnessError::CycleLimit { cycles: 8 })
        );
        assert_eq!(bench.run_until(|_| true, 8), Ok(0));
    }

    #[test]
    fn oversized_window_is_rejected() {
        let whole = DecoderConfig {
            region_mask: 0,
            ..config(DataPathMode::Buffered, 4)
        };
        assert!(matches!(
            Testbench::new(whole),
            Err(HarnessError::WindowTooLarge { .. })
        ));
    }
}
