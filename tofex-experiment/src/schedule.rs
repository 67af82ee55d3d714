//! Fixed-rate sample scheduling.
//!
//! Due times follow `start + n * period`, so the schedule never drifts with
//! tick jitter. A tick that arrives late takes a single sample and moves the
//! due time forward by exactly one period: missed periods are not back-filled,
//! and after a stall the schedule catches up by one period per tick until it
//! is ahead of the clock again.

/// Absorbs float error when a tick lands exactly on a due time.
const DUE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleSchedule {
    start: f64,
    period: f64,
    taken: u64,
}

impl SampleSchedule {
    /// `hz` must be finite and positive; callers validate it through the config.
    pub fn new(start: f64, hz: f64) -> Self {
        Self {
            start,
            period: 1.0 / hz,
            taken: 0,
        }
    }

    pub fn next_due(&self) -> f64 {
        self.start + self.taken as f64 * self.period
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Samples taken so far.
    pub fn taken(&self) -> u64 {
        self.taken
    }

    pub fn is_due(&self, t: f64) -> bool {
        t + DUE_EPSILON >= self.next_due()
    }

    /// True when a sample is due at `t`; advances the schedule by one period if so.
    pub fn poll(&mut self, t: f64) -> bool {
        if self.is_due(t) {
            self.taken += 1;
            true
        } else {
            false
        }
    }

    /// How many periods the schedule is behind `t` (0 when on time).
    pub fn lag(&self, t: f64) -> u64 {
        let behind = (t - self.next_due()) / self.period;
        if behind >= 1.0 { behind.floor() as u64 } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_poll_at_start_is_due() {
        let mut schedule = SampleSchedule::new(3.0, 20.0);
        assert!(schedule.poll(3.0));
        assert!(!schedule.poll(3.01));
        assert!(schedule.poll(3.05));
    }

    #[test]
    fn fine_ticks_take_one_sample_per_period() {
        let mut schedule = SampleSchedule::new(0.0, 20.0);
        let taken = (0..=1000).filter(|i| schedule.poll(*i as f64 * 0.001)).count();
        assert_eq!(taken, 21);
    }

    #[test]
    fn stall_catches_up_one_period_per_tick() {
        let mut schedule = SampleSchedule::new(0.0, 8.0);
        assert!(schedule.poll(0.0));
        // One tick after a one second stall samples once.
        assert!(schedule.poll(1.0));
        assert_eq!(schedule.next_due(), 0.25);
        assert_eq!(schedule.lag(1.0), 6);
        // Every following tick is still due until the schedule passes the clock.
        let mut extra = 0;
        let mut t = 1.0;
        while schedule.poll(t) {
            extra += 1;
            t += 0.001;
        }
        assert_eq!(extra, 7);
        assert_eq!(schedule.lag(t), 0);
    }

    #[test]
    fn count_matches_rate_over_duration_for_any_tick_size() {
        for hz in [1.0, 7.5, 20.0, 60.0] {
            for dt in [0.001, 0.0166, 0.03, 0.1] {
                // One sample per tick at most: ticks must be finer than the period.
                if dt > 1.0 / hz {
                    continue;
                }
                let mut schedule = SampleSchedule::new(0.0, hz);
                let duration = 2.0;
                let mut t = 0.0;
                let mut taken = 0i64;
                while t <= duration {
                    if schedule.poll(t) {
                        taken += 1;
                    }
                    t += dt;
                }
                let expected = (duration * hz).floor() as i64 + 1;
                assert!(
                    (taken - expected).abs() <= 1,
                    "hz {hz} dt {dt}: {taken} vs {expected}"
                );
            }
        }
    }
}
