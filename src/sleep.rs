use embassy_time::Duration;

/// Longest single power-down period the hardware timer is used for.
pub const POWER_DOWN_PERIOD: Duration = Duration::from_secs(8);

/// Puts the MCU into its low power state for a fixed period.
pub trait PowerDown {
    fn power_down(&mut self, period: Duration);
}

/// How the time between two uplinks is spent: whole power-down periods,
/// then a remainder left to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepPlan {
    pub chunks: u32,
    pub rest: Duration,
}

impl SleepPlan {
    pub fn for_interval(interval: Duration) -> Self {
        let period = POWER_DOWN_PERIOD.as_ticks();
        let ticks = interval.as_ticks();
        SleepPlan {
            chunks: (ticks / period).min(u32::MAX as u64) as u32,
            rest: Duration::from_ticks(ticks % period),
        }
    }

    pub fn execute<P: PowerDown>(&self, power: &mut P) {
        for _ in 0..self.chunks {
            power.power_down(POWER_DOWN_PERIOD);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32, Duration);

    impl PowerDown for Counter {
        fn power_down(&mut self, period: Duration) {
            self.0 += 1;
            self.1 += period;
        }
    }

    #[test]
    fn twenty_seconds_is_two_periods_and_four_left() {
        let plan = SleepPlan::for_interval(Duration::from_secs(20));
        assert_eq!(plan.chunks, 2);
        assert_eq!(plan.rest, Duration::from_secs(4));
    }

    #[test]
    fn fifteen_minutes() {
        let plan = SleepPlan::for_interval(Duration::from_secs(60 * 15));
        assert_eq!(plan.chunks, 112);
        assert_eq!(plan.rest, Duration::from_secs(4));
    }

    #[test]
    fn short_interval_only_has_rest() {
        let plan = SleepPlan::for_interval(Duration::from_secs(5));
        assert_eq!(plan.chunks, 0);
        assert_eq!(plan.rest, Duration::from_secs(5));
    }

    #[test]
    fn execute_powers_down_each_chunk() {
        let mut counter = Counter(0, Duration::from_ticks(0));
        SleepPlan::for_interval(Duration::from_secs(24)).execute(&mut counter);
        assert_eq!(counter.0, 3);
        assert_eq!(counter.1, Duration::from_secs(24));
    }
}
