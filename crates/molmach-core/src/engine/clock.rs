/// Measures elapsed simulated time.
///
/// The engine never reads the wall clock: time only advances when [`SimTimer::advance`] is
/// called with a tick's `dt`, which keeps every run reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimTimer {
    elapsed: f64,
}

impl SimTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: f64) {
        self.elapsed += dt;
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn has_elapsed(&self, seconds: f64) -> bool {
        self.elapsed >= seconds
    }
}
