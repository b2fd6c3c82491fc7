#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PenaltyState {
    Unfrozen,
    Frozen { remaining_seconds: u64 },
}

/// Focus-loss penalty machine. Each violation freezes the session for
/// `base * 2^violations_so_far` seconds; violations reported while frozen are
/// ignored so freezes never stack.
#[derive(Debug)]
pub(crate) struct PenaltyMachine {
    violation_count: u32,
    state: PenaltyState,
}

impl PenaltyMachine {
    pub(crate) fn new() -> Self {
        Self { violation_count: 0, state: PenaltyState::Unfrozen }
    }

    pub(crate) fn violation_count(&self) -> u32 {
        self.violation_count
    }

    pub(crate) fn state(&self) -> PenaltyState {
        self.state
    }

    pub(crate) fn is_frozen(&self) -> bool {
        matches!(self.state, PenaltyState::Frozen { .. })
    }

    /// Registers a violation and returns the freeze duration, or `None` when
    /// already frozen. The duration doubles with every prior violation.
    pub(crate) fn record_violation(&mut self, base_seconds: u64) -> Option<u64> {
        if self.is_frozen() {
            return None;
        }

        let duration = base_seconds.saturating_mul(2u64.saturating_pow(self.violation_count));
        self.violation_count += 1;
        self.state = PenaltyState::Frozen { remaining_seconds: duration };
        Some(duration)
    }

    /// Advances the freeze by one second. Returns true on the tick the freeze
    /// lifts.
    pub(crate) fn tick(&mut self) -> bool {
        match &mut self.state {
            PenaltyState::Unfrozen => false,
            PenaltyState::Frozen { remaining_seconds } => {
                *remaining_seconds = remaining_seconds.saturating_sub(1);
                if *remaining_seconds == 0 {
                    self.state = PenaltyState::Unfrozen;
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_freeze(machine: &mut PenaltyMachine) {
        while machine.is_frozen() {
            machine.tick();
        }
    }

    #[test]
    fn freeze_duration_doubles_per_violation() {
        let mut machine = PenaltyMachine::new();

        assert_eq!(machine.record_violation(15), Some(15));
        drain_freeze(&mut machine);
        assert_eq!(machine.record_violation(15), Some(30));
        drain_freeze(&mut machine);
        assert_eq!(machine.record_violation(15), Some(60));
        drain_freeze(&mut machine);
        assert_eq!(machine.record_violation(15), Some(120));
        assert_eq!(machine.violation_count(), 4);
    }

    #[test]
    fn violations_while_frozen_do_not_stack() {
        let mut machine = PenaltyMachine::new();
        machine.record_violation(15);

        assert_eq!(machine.record_violation(15), None);
        assert_eq!(machine.record_violation(15), None);
        assert_eq!(machine.violation_count(), 1);
        assert_eq!(machine.state(), PenaltyState::Frozen { remaining_seconds: 15 });
    }

    #[test]
    fn tick_reports_the_moment_the_freeze_lifts() {
        let mut machine = PenaltyMachine::new();
        machine.record_violation(3);

        assert!(!machine.tick());
        assert!(!machine.tick());
        assert!(machine.tick());
        assert!(!machine.is_frozen());
        assert!(!machine.tick());
    }

    #[test]
    fn counting_resumes_after_unfreeze() {
        let mut machine = PenaltyMachine::new();
        machine.record_violation(10);
        drain_freeze(&mut machine);

        assert_eq!(machine.record_violation(10), Some(20));
        assert_eq!(machine.violation_count(), 2);
    }
}
