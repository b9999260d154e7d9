//! Saturating activity counters kept by the decoder.

/// Counters describing what the decoder has admitted, forwarded and recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecoderStats {
    /// Connections raised by an in-region address.
    pub admitted: u32,
    /// Cycles in which a valid out-of-region address was held off.
    pub rejected_cycles: u32,
    /// Address beats handed to the downstream responder.
    pub addresses_forwarded: u32,
    /// Data beats handed to the downstream responder.
    pub data_forwarded: u32,
    /// Write responses handed back upstream.
    pub responses_returned: u32,
    /// Watchdog pulses.
    pub timeouts: u32,
    /// Cycle index of the most recent watchdog pulse.
    pub last_timeout_cycle: Option<u64>,
}

impl DecoderStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn record_admitted(&mut self) {
        self.admitted = self.admitted.saturating_add(1);
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn record_rejected(&mut self) {
        self.rejected_cycles = self.rejected_cycles.saturating_add(1);
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn record_address_forwarded(&mut self) {
        self.addresses_forwarded = self.addresses_forwarded.saturating_add(1);
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn record_data_forwarded(&mut self) {
        self.data_forwarded = self.data_forwarded.saturating_add(1);
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn record_response_returned(&mut self) {
        self.responses_returned = self.responses_returned.saturating_add(1);
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn record_timeout(&mut self, cycle: u64) {
        self.timeouts = self.timeouts.saturating_add(1);
        self.last_timeout_cycle = Some(cycle);
    }

    /// Resets all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::DecoderStats;

    #[test]
    fn counters_saturate() {
        let mut stats = DecoderStats {
            timeouts: u32::MAX,
            ..DecoderStats::new()
        };
        stats.record_timeout(17);
        assert_eq!(stats.timeouts, u32::MAX);
        assert_eq!(stats.last_timeout_cycle, Some(17));
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut stats = DecoderStats::new();
        stats.record_admitted();
        stats.record_rejected();
        stats.record_address_forwarded();
        stats.record_data_forwarded();
        stats.record_response_returned();
        stats.record_timeout(3);
        assert_ne!(stats, DecoderStats::default());

        stats.reset();
        assert_eq!(stats, DecoderStats::default());
    }
}
