use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of simulation time, in seconds. Must be non-decreasing.
pub trait Clock {
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Wall time since construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Externally driven time. Clones share the same underlying value, so a frame
/// loop can advance the copy it holds while a recorder reads its own.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Moves time to `t`. Earlier values are ignored.
    pub fn set(&self, t: f64) {
        let current = self.now.get();
        if t < current || t.is_nan() {
            tracing::warn!(current, requested = t, "ignoring backwards clock step");
            return;
        }
        self.now.set(t);
    }

    pub fn advance(&self, dt: f64) {
        if dt > 0.0 {
            self.now.set(self.now.get() + dt);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
