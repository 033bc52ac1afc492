use std::time::Duration;

/// Exponential moving average of the cycle rate
#[derive(Debug, Clone)]
pub struct FpsEstimator {
    alpha: f64,
    estimate: Option<f64>,
}

impl FpsEstimator {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            estimate: None,
        }
    }

    /// Feed the duration of one cycle; returns the updated estimate
    pub fn record(&mut self, elapsed: Duration) -> f64 {
        let seconds = elapsed.as_secs_f64();
        if seconds <= 0.0 {
            return self.fps();
        }

        let instant = 1.0 / seconds;
        let next = match self.estimate {
            Some(previous) => self.alpha * instant + (1.0 - self.alpha) * previous,
            None => instant,
        };
        self.estimate = Some(next);
        next
    }

    pub fn fps(&self) -> f64 {
        self.estimate.unwrap_or(0.0)
    }
}

impl Default for FpsEstimator {
    fn default() -> Self {
        Self::new(0.1)
    }
}
