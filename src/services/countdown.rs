pub(crate) const FIVE_MINUTE_WARNING_SECONDS: u64 = 300;
pub(crate) const ONE_MINUTE_WARNING_SECONDS: u64 = 60;

/// Ticks a warning banner stays visible before auto-dismissing.
pub(crate) const ALERT_VISIBLE_TICKS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeWarning {
    FiveMinutes,
    OneMinute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerEvent {
    Warned(TimeWarning),
    Expired,
}

#[derive(Debug, Clone, Copy)]
struct ActiveAlert {
    warning: TimeWarning,
    ticks_left: u64,
}

/// Countdown over the remaining exam time. Driven by one `tick` per second;
/// each threshold fires at most once and expiry fires exactly once.
#[derive(Debug)]
pub(crate) struct Countdown {
    remaining_seconds: u64,
    warned_five_minutes: bool,
    warned_one_minute: bool,
    expired: bool,
    alert: Option<ActiveAlert>,
}

impl Countdown {
    pub(crate) fn new(duration_seconds: u64) -> Self {
        Self {
            remaining_seconds: duration_seconds,
            warned_five_minutes: false,
            warned_one_minute: false,
            expired: false,
            alert: None,
        }
    }

    pub(crate) fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.expired
    }

    /// The warning currently on screen, if its banner has not yet dismissed.
    pub(crate) fn visible_warning(&self) -> Option<TimeWarning> {
        self.alert.map(|alert| alert.warning)
    }

    pub(crate) fn tick(&mut self) -> Option<TimerEvent> {
        if self.expired {
            return None;
        }

        if let Some(alert) = &mut self.alert {
            alert.ticks_left = alert.ticks_left.saturating_sub(1);
            if alert.ticks_left == 0 {
                self.alert = None;
            }
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);

        if self.remaining_seconds == 0 {
            self.expired = true;
            self.alert = None;
            return Some(TimerEvent::Expired);
        }

        if self.remaining_seconds == FIVE_MINUTE_WARNING_SECONDS && !self.warned_five_minutes {
            self.warned_five_minutes = true;
            return Some(self.raise(TimeWarning::FiveMinutes));
        }
        if self.remaining_seconds == ONE_MINUTE_WARNING_SECONDS && !self.warned_one_minute {
            self.warned_one_minute = true;
            return Some(self.raise(TimeWarning::OneMinute));
        }

        None
    }

    fn raise(&mut self, warning: TimeWarning) -> TimerEvent {
        self.alert = Some(ActiveAlert { warning, ticks_left: ALERT_VISIBLE_TICKS });
        TimerEvent::Warned(warning)
    }
}
