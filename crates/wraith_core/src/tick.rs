//! Cooperative suspension points
//!
//! Sequences only ever suspend through these helpers. Each one races the
//! scope's token, so a cancelled sequence wakes at its next suspension point
//! with [`LifecycleError::Cancelled`] and can unwind with `?`.

use crate::error::{LifecycleError, Result};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Sleep for `duration` unless the scope is cancelled first
pub async fn delay(token: &CancellationToken, duration: Duration) -> Result<()> {
    if token.is_cancelled() {
        return Err(LifecycleError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(LifecycleError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Yield until the next frame boundary
pub async fn next_frame(token: &CancellationToken, frame_interval: Duration) -> Result<()> {
    delay(token, frame_interval).await
}

/// Poll `ready` once per frame until it returns true
pub async fn wait_until<F>(
    token: &CancellationToken,
    frame_interval: Duration,
    mut ready: F,
) -> Result<()>
where
    F: FnMut() -> bool,
{
    while !ready() {
        next_frame(token, frame_interval).await?;
    }
    Ok(())
}

/// Convert a config value in seconds to a duration, clamping negatives to zero
pub fn secs(seconds: f32) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f32(seconds)
    } else {
        Duration::ZERO
    }
}

/// Tracks normalized progress through a timed interpolation
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    started: Instant,
    duration: Duration,
}

impl FrameClock {
    /// Start a clock now
    pub fn start(duration: Duration) -> Self {
        Self {
            started: Instant::now(),
            duration,
        }
    }

    /// Elapsed / duration, clamped to [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = self.started.elapsed().as_secs_f32() / self.duration.as_secs_f32();
        t.clamp(0.0, 1.0)
    }

    /// Whether the full duration has elapsed
    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_delay_elapses() {
        let token = CancellationToken::new();
        let start = Instant::now();
        delay(&token, Duration::from_secs(2)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_observes_cancellation() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let result = delay(&token, Duration::from_secs(10)).await;
        assert_eq!(result, Err(LifecycleError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_polls_per_frame() {
        let token = CancellationToken::new();
        let mut polls = 0;
        wait_until(&token, Duration::from_millis(10), || {
            polls += 1;
            polls == 4
        })
        .await
        .unwrap();
        assert_eq!(polls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_clock_clamps() {
        let clock = FrameClock::start(Duration::from_secs(1));
        assert_eq!(clock.progress(), 0.0);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!((clock.progress() - 0.5).abs() < 1e-3);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(clock.progress(), 1.0);
        assert!(clock.is_finished());

        assert_eq!(FrameClock::start(Duration::ZERO).progress(), 1.0);
    }

    #[test]
    fn test_secs_clamps_negative() {
        assert_eq!(secs(-1.0), Duration::ZERO);
        assert_eq!(secs(f32::NAN), Duration::ZERO);
        assert_eq!(secs(1.5), Duration::from_millis(1500));
    }
}
