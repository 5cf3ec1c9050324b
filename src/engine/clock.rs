//! Monotonic time source for the scheduler

#[cfg(test)]
use std::cell::Cell;
#[cfg(test)]
use std::rc::Rc;

pub trait Clock {
    /// Seconds since an arbitrary fixed origin. Never decreases.
    fn now(&self) -> f64;
}

/// macroquad's frame clock
pub struct MacroquadClock;

impl Clock for MacroquadClock {
    fn now(&self) -> f64 {
        macroquad::time::get_time()
    }
}

/// Clock advanced by hand. Clones share the same time.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
