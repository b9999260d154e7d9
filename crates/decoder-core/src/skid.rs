//! One-deep skid buffer decoupling a producer handshake from a consumer handshake.
//!
//! Every cycle is split in two: [`SkidBuffer::evaluate`] computes what the
//! ports show from the held item and the same-cycle inputs, and
//! [`SkidBuffer::commit`] applies the resulting next state at the clock edge.

/// Control inputs shared by every skid buffer in the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SkidControl {
    /// Allows new items to be accepted from upstream.
    pub enable: bool,
    /// Discards the held item and masks downstream valid this cycle.
    pub flush: bool,
}

/// Port values and next state produced by one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkidEval<T> {
    /// Ready returned to the producer.
    pub up_ready: bool,
    /// Valid presented to the consumer.
    pub down_valid: bool,
    /// Item presented to the consumer (default value while not valid).
    pub down_data: T,
    /// Pulses when the producer handshake completes this cycle.
    pub accepted: bool,
    /// Pulses when the consumer handshake completes this cycle.
    pub delivered: bool,
    /// Item held after the clock edge.
    pub next: Option<T>,
}

/// One-deep elastic store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SkidBuffer<T> {
    held: Option<T>,
}

impl<T: Copy + Default> SkidBuffer<T> {
    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { held: None }
    }

    /// Item currently held, if any.
    #[must_use]
    pub const fn held(&self) -> Option<T> {
        self.held
    }

    /// Returns `true` when nothing is held.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.held.is_none()
    }

    /// Evaluates one cycle without mutating the buffer.
    #[must_use]
    pub fn evaluate(
        &self,
        up_valid: bool,
        up_data: T,
        down_ready: bool,
        control: SkidControl,
    ) -> SkidEval<T> {
        let down_valid = self.held.is_some() && !control.flush;
        let delivered = down_valid && down_ready;
        let up_ready = control.enable && !control.flush && (self.held.is_none() || down_ready);
        let accepted = up_valid && up_ready;

        let next = if control.flush {
            None
        } else if accepted {
            Some(up_data)
        } else if delivered {
            None
        } else {
            self.held
        };

        SkidEval {
            up_ready,
            down_valid,
            down_data: if down_valid {
                self.held.unwrap_or_default()
            } else {
                T::default()
            },
            accepted,
            delivered,
            next,
        }
    }

    /// Applies the next state computed by [`Self::evaluate`].
    pub fn commit(&mut self, eval: &SkidEval<T>) {
        self.held = eval.next;
    }

    /// Drops any held item.
    pub fn clear(&mut self) {
        self.held = None;
    }

    /// Replaces the held item, used when restoring snapshots.
    pub fn restore(&mut self, held: Option<T>) {
        self.held = held;
    }
}
