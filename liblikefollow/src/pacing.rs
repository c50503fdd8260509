//! Randomized courtesy delays between follow actions

use async_trait::async_trait;
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::ConfigError;

/// Longest accepted delay bound, one day
pub const MAX_SLEEP_SECONDS: f64 = 86_400.0;

/// Inclusive range of seconds to wait after each follow attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepWindow {
    min: f64,
    max: f64,
}

impl SleepWindow {
    /// Build a window, rejecting out-of-range or inverted bounds
    pub fn new(min: f64, max: f64) -> std::result::Result<Self, ConfigError> {
        validate_seconds("SLEEP_MIN", min)?;
        validate_seconds("SLEEP_MAX", max)?;

        if min > max {
            return Err(ConfigError::InvalidValue {
                key: "SLEEP_MIN".to_string(),
                value: min.to_string(),
                reason: format!("must not exceed SLEEP_MAX ({})", max),
            });
        }

        Ok(Self { min, max })
    }

    /// A window that never waits
    pub fn none() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Draw a uniformly distributed delay from the window
    pub fn sample(&self) -> Duration {
        self.sample_with(&mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return Duration::from_secs_f64(self.min);
        }
        Duration::from_secs_f64(rng.gen_range(self.min..=self.max))
    }
}

impl Default for SleepWindow {
    fn default() -> Self {
        Self { min: 2.0, max: 4.0 }
    }
}

fn validate_seconds(key: &str, value: f64) -> std::result::Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a non-negative number of seconds".to_string(),
        });
    }
    if value > MAX_SLEEP_SECONDS {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: format!("must not exceed {} seconds", MAX_SLEEP_SECONDS),
        });
    }
    Ok(())
}

/// Something that can wait between follow actions
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tracing::debug!("Sleeping {:.2}s before next action", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }
}

/// Records requested pauses without sleeping (for tests)
#[derive(Debug, Default, Clone)]
pub struct RecordingPacer {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All pauses requested so far, in order
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }

    pub fn pause_count(&self) -> usize {
        self.pauses.lock().unwrap().len()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, delay: Duration) {
        self.pauses.lock().unwrap().push(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_window_matches_documented_defaults() {
        let window = SleepWindow::default();
        assert_eq!(window.min(), 2.0);
        assert_eq!(window.max(), 4.0);
    }

    #[test]
    fn test_sample_stays_within_bounds() {
        let window = SleepWindow::new(0.5, 1.5).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let delay = window.sample_with(&mut rng).as_secs_f64();
            assert!(
                (0.5..=1.5).contains(&delay),
                "Delay {} outside [0.5, 1.5]",
                delay
            );
        }
    }

    #[test]
    fn test_degenerate_window_is_constant() {
        let window = SleepWindow::new(3.0, 3.0).unwrap();
        assert_eq!(window.sample(), Duration::from_secs(3));
        assert_eq!(SleepWindow::none().sample(), Duration::ZERO);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let result = SleepWindow::new(5.0, 1.0);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("SLEEP_MAX"));
    }

    #[test]
    fn test_negative_and_nan_rejected() {
        assert!(SleepWindow::new(-1.0, 2.0).is_err());
        assert!(SleepWindow::new(0.0, f64::NAN).is_err());
        assert!(SleepWindow::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_oversized_bounds_rejected() {
        assert!(SleepWindow::new(1e20, 1e20).is_err());
        let err = SleepWindow::new(0.0, MAX_SLEEP_SECONDS + 1.0).unwrap_err();
        assert!(err.to_string().contains("SLEEP_MAX"));

        let window = SleepWindow::new(MAX_SLEEP_SECONDS, MAX_SLEEP_SECONDS).unwrap();
        assert_eq!(window.sample(), Duration::from_secs(86_400));
    }

    #[tokio::test]
    async fn test_recording_pacer_records_without_sleeping() {
        let pacer = RecordingPacer::new();
        let start = std::time::Instant::now();
        pacer.pause(Duration::from_secs(60)).await;
        pacer.pause(Duration::from_secs(1)).await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(
            pacer.pauses(),
            vec![Duration::from_secs(60), Duration::from_secs(1)]
        );
    }

    #[tokio::test]
    async fn test_tokio_pacer_zero_delay_returns_immediately() {
        let start = std::time::Instant::now();
        TokioPacer.pause(Duration::ZERO).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
