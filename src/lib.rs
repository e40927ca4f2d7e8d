//! Mirrorcut - Headless AR Hairstyle Preview Engine
//!
//! A modular Rust service that:
//! - Acquires a front-facing camera stream with graceful constraint fallback
//! - Tracks the user's face in real time with an ONNX face-mesh model
//! - Derives a smoothed screen-space transform for a hairstyle overlay
//! - Degrades to a manual capture mode when the model is unavailable
//! - Hands captured frames plus the chosen style to an analysis service
//!
//! The host UI talks to the engine over the HTTP/SSE boundary in [`web`].

pub mod analysis;
pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod styles;
pub mod tracking;
pub mod web;

pub use config::Config;
pub use error::{MirrorcutError, Result};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use camera::VideoFrame;
use styles::StyleSelection;
use tracking::state::TrackingSnapshot;

/// Events the engine emits for the host application.
///
/// The host decides what to do with them (the reference UI plays short
/// feedback sounds); the engine itself owns no playback or presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackEvent {
    FaceFound,
    FaceLost,
    ModelSlow,
    ModelReady,
    ManualFallback,
    CameraFailed,
    StyleChanged,
    CustomImageSet,
    CustomImageCleared,
    CaptureTaken,
}

/// Application state shared across all components.
///
/// The tracking fields of the snapshot (overlay transform, face detection)
/// have a single writer: the detection loop task. Host commands only touch
/// the session flags (manual fallback, custom image, selection).
#[derive(Debug)]
pub struct AppState {
    /// Current configuration
    pub config: RwLock<Config>,
    /// Current tracking snapshot
    tracking: RwLock<TrackingSnapshot>,
    /// Active style selection (gender, length, carousel index)
    pub selection: RwLock<StyleSelection>,
    /// Custom uploaded image replacing the live preview, if any (JPEG bytes)
    custom_image: RwLock<Option<Vec<u8>>>,
    /// Most recent camera frame, kept for the capture endpoint
    last_frame: RwLock<Option<VideoFrame>>,
    /// Channel for tracking snapshot updates
    snapshot_tx: broadcast::Sender<TrackingSnapshot>,
    /// Channel for host feedback events
    feedback_tx: broadcast::Sender<FeedbackEvent>,
    /// Shutdown signal
    shutdown_tx: broadcast::Sender<()>,
    /// Cleared on shutdown. Late async results (a model-load future resolving
    /// after teardown) must check this before mutating state.
    live: AtomicBool,
}

impl AppState {
    /// Create a new application state with the given configuration
    pub fn new(config: Config) -> Arc<Self> {
        let (snapshot_tx, _) = broadcast::channel(64);
        let (feedback_tx, _) = broadcast::channel(64);
        let (shutdown_tx, _) = broadcast::channel(1);

        Arc::new(Self {
            config: RwLock::new(config),
            tracking: RwLock::new(TrackingSnapshot::default()),
            selection: RwLock::new(StyleSelection::default()),
            custom_image: RwLock::new(None),
            last_frame: RwLock::new(None),
            snapshot_tx,
            feedback_tx,
            shutdown_tx,
            live: AtomicBool::new(true),
        })
    }

    /// Get the current tracking snapshot
    pub async fn snapshot(&self) -> TrackingSnapshot {
        self.tracking.read().await.clone()
    }

    /// Subscribe to tracking snapshot updates
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<TrackingSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to feedback events
    pub fn subscribe_feedback(&self) -> broadcast::Receiver<FeedbackEvent> {
        self.feedback_tx.subscribe()
    }

    /// Subscribe to shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown and mark the session dead for late async results
    pub fn shutdown(&self) {
        self.live.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    /// Whether the session is still alive (not torn down)
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Emit a feedback event to the host
    pub fn emit(&self, event: FeedbackEvent) {
        let _ = self.feedback_tx.send(event);
    }

    /// Mutate the snapshot and broadcast it if it changed
    async fn mutate_snapshot<F>(&self, f: F) -> TrackingSnapshot
    where
        F: FnOnce(&mut TrackingSnapshot),
    {
        let mut guard = self.tracking.write().await;
        let before = guard.clone();
        f(&mut guard);
        let after = guard.clone();
        drop(guard);
        if after != before {
            let _ = self.snapshot_tx.send(after.clone());
        }
        after
    }

    /// Apply a detection-loop step result (single writer: the loop task)
    pub async fn apply_step(&self, report: tracking::detector::StepReport) {
        let was_detected = self.tracking.read().await.face_detected();
        let snap = self
            .mutate_snapshot(|snap| {
                snap.set_face_detected(report.face_detected);
                if let Some(overlay) = report.overlay {
                    snap.set_overlay(overlay);
                }
            })
            .await;

        if snap.face_detected() != was_detected {
            self.emit(if snap.face_detected() {
                FeedbackEvent::FaceFound
            } else {
                FeedbackEvent::FaceLost
            });
        }
    }

    /// Flag the model load as slow so the host can offer a manual escape
    /// hatch. No-op once loading has resolved.
    pub async fn mark_model_slow(&self) {
        if !self.is_live() {
            return;
        }
        let was_slow = self.tracking.read().await.model_load_slow();
        let snap = self.mutate_snapshot(|snap| snap.mark_load_slow()).await;
        if snap.model_load_slow() && !was_slow {
            self.emit(FeedbackEvent::ModelSlow);
        }
    }

    /// Record a successful model load.
    ///
    /// Returns false when the result must be discarded: the session was torn
    /// down mid-load, or manual fallback was already entered (one-way).
    pub async fn mark_model_ready(&self) -> bool {
        if !self.is_live() {
            return false;
        }
        let mut guard = self.tracking.write().await;
        if !guard.model_ready() {
            return false;
        }
        let snap = guard.clone();
        drop(guard);
        let _ = self.snapshot_tx.send(snap);
        self.emit(FeedbackEvent::ModelReady);
        true
    }

    /// Enter manual fallback (model timeout/failure, or host command).
    /// One-way for the session; automatic overlay stays disabled.
    pub async fn enter_manual_fallback(&self, reason: &str) {
        if !self.is_live() {
            return;
        }
        let already = self.tracking.read().await.manual_fallback();
        if already {
            return;
        }
        tracing::info!("Entering manual fallback mode: {}", reason);
        self.mutate_snapshot(|snap| snap.enter_manual_fallback())
            .await;
        self.emit(FeedbackEvent::ManualFallback);
    }

    /// Surface a fatal camera error to the host
    pub async fn set_camera_error(&self, message: &str) {
        if !self.is_live() {
            return;
        }
        self.mutate_snapshot(|snap| snap.set_camera_error(Some(message.to_string())))
            .await;
        self.emit(FeedbackEvent::CameraFailed);
    }

    /// Clear the camera error (host-initiated retry)
    pub async fn clear_camera_error(&self) {
        self.mutate_snapshot(|snap| snap.set_camera_error(None))
            .await;
    }

    /// Replace the live preview with an uploaded image; suspends the
    /// detection loop's visual effect without touching camera or model.
    pub async fn set_custom_image(&self, jpeg: Vec<u8>) {
        *self.custom_image.write().await = Some(jpeg);
        self.mutate_snapshot(|snap| snap.set_custom_image_active(true))
            .await;
        self.emit(FeedbackEvent::CustomImageSet);
    }

    /// Clear the uploaded image and resume live tracking
    pub async fn clear_custom_image(&self) {
        *self.custom_image.write().await = None;
        self.mutate_snapshot(|snap| snap.set_custom_image_active(false))
            .await;
        self.emit(FeedbackEvent::CustomImageCleared);
    }

    /// Get the uploaded custom image, if any
    pub async fn custom_image(&self) -> Option<Vec<u8>> {
        self.custom_image.read().await.clone()
    }

    /// Store the latest camera frame for the capture endpoint
    pub async fn store_frame(&self, frame: VideoFrame) {
        *self.last_frame.write().await = Some(frame);
    }

    /// Get the latest camera frame
    pub async fn latest_frame(&self) -> Option<VideoFrame> {
        self.last_frame.read().await.clone()
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_fallback_is_one_way() {
        let state = AppState::new(Config::default());

        state.enter_manual_fallback("test").await;
        assert!(state.snapshot().await.manual_fallback());

        // A late successful load must be discarded
        assert!(!state.mark_model_ready().await);
        let snap = state.snapshot().await;
        assert!(snap.manual_fallback());
        assert!(!snap.model_loading());
    }

    #[tokio::test]
    async fn test_late_results_after_shutdown_mutate_nothing() {
        let state = AppState::new(Config::default());
        state.shutdown();

        assert!(!state.mark_model_ready().await);
        state.enter_manual_fallback("late").await;
        state.mark_model_slow().await;

        let snap = state.snapshot().await;
        assert!(snap.model_loading());
        assert!(!snap.manual_fallback());
        assert!(!snap.model_load_slow());
    }

    #[tokio::test]
    async fn test_custom_image_toggles_snapshot() {
        let state = AppState::new(Config::default());

        state.set_custom_image(vec![0xff, 0xd8]).await;
        assert!(state.snapshot().await.custom_image_active());
        assert!(state.snapshot().await.can_proceed());

        state.clear_custom_image().await;
        assert!(!state.snapshot().await.custom_image_active());
        assert!(state.custom_image().await.is_none());
    }

    #[tokio::test]
    async fn test_face_events_emitted_on_change() {
        use crate::tracking::detector::StepReport;

        let state = AppState::new(Config::default());
        let mut feedback = state.subscribe_feedback();

        state
            .apply_step(StepReport {
                face_detected: true,
                overlay: None,
            })
            .await;
        assert_eq!(feedback.recv().await.unwrap(), FeedbackEvent::FaceFound);

        // Same value again: no duplicate event
        state
            .apply_step(StepReport {
                face_detected: true,
                overlay: None,
            })
            .await;
        state
            .apply_step(StepReport {
                face_detected: false,
                overlay: None,
            })
            .await;
        assert_eq!(feedback.recv().await.unwrap(), FeedbackEvent::FaceLost);
    }
}
