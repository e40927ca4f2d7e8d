//! Asynchronous model loading with timeout and graceful degradation
//!
//! The whole load attempt (accelerated backend first, CPU second) races a
//! fixed timeout; whichever settles first wins. Timeout and double-backend
//! failure are ordinary values, not errors: the caller transitions to manual
//! fallback and the session continues without automatic tracking.

use std::future::Future;
use std::time::Duration;

use crate::config::LandmarkerConfig;
use crate::error::TrackingError;
use crate::tracking::landmarker::{Landmarker, MeshLandmarker, ModelBackend};

/// Tagged result of a model load attempt.
pub enum LoadOutcome {
    /// The engine is ready; auto tracking may begin
    Ready(Box<dyn Landmarker>),
    /// The timeout won the race; the attempt is abandoned
    TimedOut,
    /// Both backends failed before the timeout
    Failed(String),
}

impl std::fmt::Debug for LoadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => write!(f, "Ready"),
            Self::TimedOut => write!(f, "TimedOut"),
            Self::Failed(e) => write!(f, "Failed({e})"),
        }
    }
}

impl LoadOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Presence guard: one load per session, never two in flight.
///
/// `begin()` returns false when a load is already pending or resolved; the
/// caller must then reuse the existing attempt instead of starting another.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModelSlot {
    started: bool,
    resolved: bool,
}

impl ModelSlot {
    pub fn begin(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    pub fn resolve(&mut self) {
        self.resolved = true;
    }

    pub fn is_pending(&self) -> bool {
        self.started && !self.resolved
    }
}

/// Race a load future against a timeout and tag the result.
pub async fn race_load<F>(load: F, limit: Duration) -> LoadOutcome
where
    F: Future<Output = Result<Box<dyn Landmarker>, TrackingError>>,
{
    match tokio::time::timeout(limit, load).await {
        Ok(Ok(landmarker)) => LoadOutcome::Ready(landmarker),
        Ok(Err(e)) => LoadOutcome::Failed(e.to_string()),
        Err(_) => LoadOutcome::TimedOut,
    }
}

/// Load the face-mesh engine described by the configuration.
pub async fn load_with_timeout(config: &LandmarkerConfig) -> LoadOutcome {
    let limit = Duration::from_secs(config.load_timeout_secs);
    race_load(try_backends(config.clone()), limit).await
}

/// Try the accelerated backend, then CPU with identical model parameters.
/// Session compilation is blocking work, so it runs off the async threads.
async fn try_backends(config: LandmarkerConfig) -> Result<Box<dyn Landmarker>, TrackingError> {
    tokio::task::spawn_blocking(move || {
        if config.prefer_accelerated {
            match MeshLandmarker::new(&config, ModelBackend::Accelerated) {
                Ok(landmarker) => return Ok(Box::new(landmarker) as Box<dyn Landmarker>),
                Err(e) => {
                    tracing::warn!("Accelerated backend failed, falling back to CPU: {}", e);
                }
            }
        }
        MeshLandmarker::new(&config, ModelBackend::Cpu)
            .map(|landmarker| Box::new(landmarker) as Box<dyn Landmarker>)
    })
    .await
    .map_err(|e| TrackingError::ModelLoadFailure(format!("load task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::VideoFrame;
    use crate::tracking::landmarker::FaceMesh;

    struct NullLandmarker;

    impl Landmarker for NullLandmarker {
        fn detect_for_video(
            &mut self,
            _frame: &VideoFrame,
            _timestamp_ms: i64,
        ) -> Result<Option<FaceMesh>, TrackingError> {
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_wins_over_a_hung_load() {
        let outcome = race_load(
            std::future::pending::<Result<Box<dyn Landmarker>, TrackingError>>(),
            Duration::from_secs(15),
        )
        .await;

        assert!(matches!(outcome, LoadOutcome::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_wins_when_it_settles_first() {
        let load = async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(Box::new(NullLandmarker) as Box<dyn Landmarker>)
        };

        let outcome = race_load(load, Duration::from_secs(15)).await;
        assert!(outcome.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_tagged_not_thrown() {
        let load = async {
            Err::<Box<dyn Landmarker>, _>(TrackingError::ModelLoadFailure(
                "both backends exhausted".to_string(),
            ))
        };

        let outcome = race_load(load, Duration::from_secs(15)).await;
        match outcome {
            LoadOutcome::Failed(message) => assert!(message.contains("both backends")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_model_slot_guards_duplicate_loads() {
        let mut slot = ModelSlot::default();
        assert!(slot.begin());
        assert!(slot.is_pending());

        // Second load while one is in flight: refused
        assert!(!slot.begin());

        slot.resolve();
        assert!(!slot.is_pending());

        // After resolution the existing instance is reused, never reloaded
        assert!(!slot.begin());
    }
}
