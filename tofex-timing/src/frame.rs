use std::collections::VecDeque;
use std::time::Duration;

/// Summary of recorded frame durations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

/// Keeps the most recent frame durations of a paced loop and sleeps precisely
/// between frames.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    frame_times: VecDeque<Duration>,
    max_samples: usize,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(d);
    }

    pub fn frame_count(&self) -> usize {
        self.frame_times.len()
    }

    pub fn stats(&self) -> FrameStats {
        if self.frame_times.is_empty() {
            return FrameStats::default();
        }
        let times: Vec<f64> = self
            .frame_times
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        let n = times.len() as f64;
        let avg = times.iter().sum::<f64>() / n;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        FrameStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }

    pub fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC, EINTR};

        let mut req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };
        let mut rem = timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        loop {
            // SAFETY: `req` and `rem` are valid for the duration of the call.
            let rc = unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &req, &mut rem) };
            match rc {
                0 => return,
                // Interrupted by a signal: sleep only what is left.
                EINTR => req = rem,
                _ => {
                    tracing::debug!(rc, "clock_nanosleep failed, falling back");
                    std::thread::sleep(duration);
                    return;
                }
            }
        }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_lasts_at_least_the_request() {
        let timer = FrameTimer::new();
        let started = std::time::Instant::now();
        timer.sleep(Duration::from_millis(5));
        let slept = started.elapsed();
        assert!(slept >= Duration::from_millis(5), "{slept:?}");
        assert!(slept < Duration::from_secs(1), "{slept:?}");
    }

    #[test]
    fn zero_sleep_returns_immediately() {
        let started = std::time::Instant::now();
        FrameTimer::new().sleep(Duration::ZERO);
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn empty_timer_reports_zeroes() {
        assert_eq!(FrameTimer::new().stats(), FrameStats::default());
    }

    #[test]
    fn stats_over_recorded_frames() {
        let mut timer = FrameTimer::new();
        timer.record_frame(Duration::from_millis(10));
        timer.record_frame(Duration::from_millis(30));
        let stats = timer.stats();
        assert_eq!(stats.average_frame_time_ns, 20_000_000.0);
        assert_eq!(stats.jitter_ns, 10_000_000.0);
        assert_eq!(stats.min_frame_time_ns, 10_000_000.0);
        assert_eq!(stats.max_frame_time_ns, 30_000_000.0);
        assert!((stats.effective_fps - 50.0).abs() < 1e-9);
    }

    #[test]
    fn ring_keeps_only_recent_frames() {
        let mut timer = FrameTimer::with_capacity(2);
        for ms in [100, 1, 3] {
            timer.record_frame(Duration::from_millis(ms));
        }
        assert_eq!(timer.frame_count(), 2);
        assert_eq!(timer.stats().max_frame_time_ns, 3_000_000.0);
    }

    #[test]
    fn short_sleep_returns() {
        let timer = FrameTimer::new();
        let start = std::time::Instant::now();
        timer.sleep(Duration::from_millis(1));
        assert!(start.elapsed() >= Duration::from_millis(1));
    }
}
