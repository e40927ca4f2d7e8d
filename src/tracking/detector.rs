//! Per-frame detection loop
//!
//! The loop itself is a cooperative task owned by the tracking pipeline; the
//! per-frame work lives in [`TrackingEngine::step`], a synchronous transition
//! function so the whole decision tree is testable without a camera, a model
//! or a scheduler. Because `step` borrows the engine mutably and runs to
//! completion, no two inference calls can ever overlap.

use crate::camera::VideoFrame;
use crate::config::OverlayTuning;
use crate::tracking::anchors;
use crate::tracking::landmarker::Landmarker;
use crate::tracking::overlay::{OverlaySmoother, OverlayTransform};
use crate::tracking::state::TrackingSnapshot;

/// Log one inference error out of this many occurrences.
const INFERENCE_LOG_EVERY: u64 = 100;

/// What one processed frame changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub face_detected: bool,
    /// New smoothed transform, present only when a face was found
    pub overlay: Option<OverlayTransform>,
}

/// Per-frame tracking state: the smoother, the duplicate-frame guard and the
/// throttled error counter. Exclusively owned by the loop task.
pub struct TrackingEngine {
    smoother: OverlaySmoother,
    last_timestamp_ms: i64,
    inference_errors: u64,
}

impl TrackingEngine {
    pub fn new(tuning: &OverlayTuning) -> Self {
        Self {
            smoother: OverlaySmoother::new(tuning),
            last_timestamp_ms: -1,
            inference_errors: 0,
        }
    }

    /// Process one frame.
    ///
    /// Returns `None` when the frame produced no state change: tracking is
    /// suspended (custom image, manual fallback), the frame timestamp was
    /// already processed, or inference failed (a miss leaves `face_detected`
    /// untouched).
    pub fn step(
        &mut self,
        landmarker: &mut dyn Landmarker,
        frame: &VideoFrame,
        current: &TrackingSnapshot,
    ) -> Option<StepReport> {
        // A custom image replaces the preview; manual fallback permanently
        // disables automatic tracking. Either way this frame is skipped.
        if current.custom_image_active() || current.manual_fallback() {
            return None;
        }

        // The display callback can outpace the camera; identical timestamps
        // mean the same frame and inference would be duplicate work.
        if frame.timestamp_ms == self.last_timestamp_ms {
            return None;
        }
        self.last_timestamp_ms = frame.timestamp_ms;

        match landmarker.detect_for_video(frame, frame.timestamp_ms) {
            Ok(Some(mesh)) => match anchors::extract(&mesh) {
                Some(found) => Some(StepReport {
                    face_detected: true,
                    overlay: Some(self.smoother.update(&found)),
                }),
                None => Some(StepReport {
                    face_detected: false,
                    overlay: None,
                }),
            },
            Ok(None) => Some(StepReport {
                face_detected: false,
                overlay: None,
            }),
            Err(e) => {
                self.inference_errors += 1;
                if should_log_inference_error(self.inference_errors) {
                    tracing::warn!(
                        "Inference error (occurrence {}): {}",
                        self.inference_errors,
                        e
                    );
                }
                None
            }
        }
    }

    /// The latest smoothed transform regardless of the last step's outcome
    pub fn overlay(&self) -> OverlayTransform {
        self.smoother.current()
    }

    /// Total inference errors seen so far
    pub fn inference_error_count(&self) -> u64 {
        self.inference_errors
    }
}

/// Rate limit for inference-error logging: a single bad frame is
/// inconsequential to a continuously retried loop, and logging each one
/// would flood the output.
fn should_log_inference_error(count: u64) -> bool {
    count % INFERENCE_LOG_EVERY == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackingError;
    use crate::tracking::landmarker::{FaceMesh, MeshPoint, MESH_POINT_COUNT};

    /// Scripted landmarker: plays back a fixed sequence of results and
    /// records call counts plus a reentrancy probe.
    struct ScriptedLandmarker {
        script: Vec<Result<Option<FaceMesh>, TrackingError>>,
        calls: usize,
        in_flight: bool,
    }

    impl ScriptedLandmarker {
        fn new(script: Vec<Result<Option<FaceMesh>, TrackingError>>) -> Self {
            Self {
                script,
                calls: 0,
                in_flight: false,
            }
        }
    }

    impl Landmarker for ScriptedLandmarker {
        fn detect_for_video(
            &mut self,
            _frame: &VideoFrame,
            _timestamp_ms: i64,
        ) -> Result<Option<FaceMesh>, TrackingError> {
            assert!(!self.in_flight, "inference calls must never overlap");
            self.in_flight = true;
            let result = if self.script.is_empty() {
                Ok(None)
            } else {
                self.script.remove(0)
            };
            self.calls += 1;
            self.in_flight = false;
            result
        }
    }

    fn mesh_at(left: (f32, f32), right: (f32, f32), top: (f32, f32)) -> FaceMesh {
        let mut points = vec![MeshPoint::default(); MESH_POINT_COUNT];
        points[234] = MeshPoint {
            x: left.0,
            y: left.1,
            z: 0.0,
        };
        points[454] = MeshPoint {
            x: right.0,
            y: right.1,
            z: 0.0,
        };
        points[10] = MeshPoint {
            x: top.0,
            y: top.1,
            z: 0.0,
        };
        FaceMesh::new(points)
    }

    fn frame(timestamp_ms: i64) -> VideoFrame {
        VideoFrame {
            data: vec![0; 12],
            width: 2,
            height: 2,
            timestamp_ms,
        }
    }

    fn engine() -> TrackingEngine {
        TrackingEngine::new(&OverlayTuning::default())
    }

    fn auto_tracking_snapshot() -> TrackingSnapshot {
        let mut snap = TrackingSnapshot::default();
        assert!(snap.model_ready());
        snap
    }

    #[test]
    fn test_face_found_updates_overlay() {
        let mesh = mesh_at((0.3, 0.5), (0.7, 0.5), (0.5, 0.2));
        let mut landmarker = ScriptedLandmarker::new(vec![Ok(Some(mesh))]);
        let mut engine = engine();

        let report = engine
            .step(&mut landmarker, &frame(1), &auto_tracking_snapshot())
            .unwrap();

        assert!(report.face_detected);
        let overlay = report.overlay.unwrap();
        assert!((overlay.scale - 1.12).abs() < 1e-5);
        assert!((overlay.y - 44.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_faces_clears_detection() {
        let mut landmarker = ScriptedLandmarker::new(vec![Ok(None)]);
        let mut engine = engine();

        let report = engine
            .step(&mut landmarker, &frame(1), &auto_tracking_snapshot())
            .unwrap();

        assert!(!report.face_detected);
        assert!(report.overlay.is_none());
    }

    #[test]
    fn test_duplicate_timestamp_skips_inference() {
        let mut landmarker = ScriptedLandmarker::new(vec![Ok(None), Ok(None)]);
        let mut engine = engine();
        let snap = auto_tracking_snapshot();

        assert!(engine.step(&mut landmarker, &frame(5), &snap).is_some());
        // Display refresh outpaced the camera: same timestamp again
        assert!(engine.step(&mut landmarker, &frame(5), &snap).is_none());
        assert_eq!(landmarker.calls, 1);

        assert!(engine.step(&mut landmarker, &frame(6), &snap).is_some());
        assert_eq!(landmarker.calls, 2);
    }

    #[test]
    fn test_custom_image_suspends_the_loop() {
        let mut landmarker = ScriptedLandmarker::new(vec![]);
        let mut engine = engine();
        let mut snap = auto_tracking_snapshot();
        snap.set_custom_image_active(true);

        assert!(engine.step(&mut landmarker, &frame(1), &snap).is_none());
        assert_eq!(landmarker.calls, 0);

        // Clearing the custom image resumes inference
        snap.set_custom_image_active(false);
        assert!(engine.step(&mut landmarker, &frame(2), &snap).is_some());
        assert_eq!(landmarker.calls, 1);
    }

    #[test]
    fn test_manual_fallback_suspends_the_loop() {
        let mut landmarker = ScriptedLandmarker::new(vec![]);
        let mut engine = engine();
        let mut snap = auto_tracking_snapshot();
        snap.enter_manual_fallback();

        assert!(engine.step(&mut landmarker, &frame(1), &snap).is_none());
        assert_eq!(landmarker.calls, 0);
    }

    #[test]
    fn test_inference_error_is_a_silent_miss() {
        let mut landmarker = ScriptedLandmarker::new(vec![
            Err(TrackingError::Inference("bad frame".to_string())),
            Ok(None),
        ]);
        let mut engine = engine();
        let snap = auto_tracking_snapshot();

        // The error frame changes nothing and the loop keeps going
        assert!(engine.step(&mut landmarker, &frame(1), &snap).is_none());
        assert_eq!(engine.inference_error_count(), 1);
        assert!(engine.step(&mut landmarker, &frame(2), &snap).is_some());
    }

    #[test]
    fn test_error_log_throttle() {
        assert!(should_log_inference_error(1));
        assert!(!should_log_inference_error(2));
        assert!(!should_log_inference_error(100));
        assert!(should_log_inference_error(101));
    }

    #[test]
    fn test_no_overlapping_inference_calls() {
        // The reentrancy probe in ScriptedLandmarker panics if a second
        // detect call starts before the first returns; a full pass over many
        // frames proves the loop is strictly sequential.
        let script = (0..50)
            .map(|_| Ok(Some(mesh_at((0.3, 0.5), (0.7, 0.5), (0.5, 0.2)))))
            .collect();
        let mut landmarker = ScriptedLandmarker::new(script);
        let mut engine = engine();
        let snap = auto_tracking_snapshot();

        for t in 0..50 {
            engine.step(&mut landmarker, &frame(t), &snap);
        }
        assert_eq!(landmarker.calls, 50);
    }

    #[test]
    fn test_smoothed_overlay_converges_over_frames() {
        let script = (0..80)
            .map(|_| Ok(Some(mesh_at((0.3, 0.5), (0.7, 0.5), (0.5, 0.2)))))
            .collect();
        let mut landmarker = ScriptedLandmarker::new(script);
        let mut engine = engine();
        let snap = auto_tracking_snapshot();

        let mut last = None;
        for t in 0..80 {
            if let Some(report) = engine.step(&mut landmarker, &frame(t), &snap) {
                last = report.overlay;
            }
        }

        let overlay = last.unwrap();
        assert!((overlay.scale - 1.6).abs() < 1e-3);
        assert!((overlay.x - 50.0).abs() < 1e-3);
        assert!((overlay.y - 20.0).abs() < 1e-3);
    }
}
