//! Cycling pause patterns that throttle a channel.

/// Repeats a finite pause pattern forever, one entry per clock.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PauseGenerator {
    pattern: Vec<bool>,
    position: usize,
}

impl PauseGenerator {
    /// Cycles through `pattern`; `true` entries pause the channel.
    #[must_use]
    pub fn new(pattern: impl Into<Vec<bool>>) -> Self {
        Self {
            pattern: pattern.into(),
            position: 0,
        }
    }

    /// Generator that never pauses.
    #[must_use]
    pub const fn never() -> Self {
        Self {
            pattern: Vec::new(),
            position: 0,
        }
    }

    /// Pauses on one cycle out of every `period`; `0` and `1` behave like
    /// [`Self::never`] and [`Self::always`] respectively.
    #[must_use]
    pub fn every(period: usize) -> Self {
        match period {
            0 => Self::never(),
            _ => {
                let mut pattern = vec![false; period];
                pattern[period - 1] = true;
                Self::new(pattern)
            }
        }
    }

    /// Generator that always pauses.
    #[must_use]
    pub fn always() -> Self {
        Self::new([true])
    }

    /// Pattern being replayed.
    #[must_use]
    pub fn pattern(&self) -> &[bool] {
        &self.pattern
    }

    /// Returns `true` when the generator can never pause.
    #[must_use]
    pub fn is_never(&self) -> bool {
        !self.pattern.contains(&true)
    }

    /// Returns the pause decision for the next clock and advances.
    pub fn next_pause(&mut self) -> bool {
        let Some(&pause) = self.pattern.get(self.position) else {
            return false;
        };
        self.position = (self.position + 1) % self.pattern.len();
        pause
    }

    /// Rewinds to the start of the pattern.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::PauseGenerator;

    #[test]
    fn pattern_repeats() {
        let mut pause = PauseGenerator::new([true, false, false]);
        let seen: Vec<bool> = (0..7).map(|_| pause.next_pause()).collect();
        assert_eq!(seen, [true, false, false, true, false, false, true]);
    }

    #[test]
    fn never_and_always() {
        let mut never = PauseGenerator::never();
        let mut always = PauseGenerator::always();
        assert!(never.is_never());
        assert!(!always.is_never());
        for _ in 0..5 {
            assert!(!never.next_pause());
            assert!(always.next_pause());
        }
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 6)]
    #[case(3, 2)]
    fn every_period_pauses_once_per_period(#[case] period: usize, #[case] pauses: usize) {
        let mut pause = PauseGenerator::every(period);
        let count = (0..6).filter(|_| pause.next_pause()).count();
        assert_eq!(count, pauses);
    }

    #[test]
    fn rewind_restarts_pattern() {
        let mut pause = PauseGenerator::new([true, false]);
        pause.next_pause();
        pause.rewind();
        assert!(pause.next_pause());
    }
}
