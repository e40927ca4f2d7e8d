//! Observable tracking state machine
//!
//! The composite state the host UI consumes every frame. Transitions:
//! both camera acquisition and model loading start concurrently; model
//! success enters auto tracking, model timeout/failure (or a host command)
//! enters manual fallback, which is terminal for the session. Camera failure
//! is an independent terminal error surfaced separately.

use serde::{Deserialize, Serialize};

use crate::tracking::overlay::OverlayTransform;

/// Snapshot of the tracking state machine, broadcast to the host each time
/// it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    /// Model load still in flight
    model_loading: bool,
    /// Load exceeded the slow-notice delay; host may offer a manual escape
    model_load_slow: bool,
    /// Manual capture mode, entered on model failure or host command.
    /// One-way: once true, automatic overlay stays disabled for the session.
    manual_fallback: bool,
    /// A face was found in the most recent processed frame
    face_detected: bool,
    /// An uploaded image replaces the live preview; tracking is suspended
    custom_image_active: bool,
    /// Fatal camera failure, if any
    camera_error: Option<String>,
    /// Smoothed overlay transform
    overlay: OverlayTransform,
}

impl Default for TrackingSnapshot {
    fn default() -> Self {
        Self {
            model_loading: true,
            model_load_slow: false,
            manual_fallback: false,
            face_detected: false,
            custom_image_active: false,
            camera_error: None,
            overlay: OverlayTransform::default(),
        }
    }
}

impl TrackingSnapshot {
    pub fn model_loading(&self) -> bool {
        self.model_loading
    }

    pub fn model_load_slow(&self) -> bool {
        self.model_load_slow
    }

    pub fn manual_fallback(&self) -> bool {
        self.manual_fallback
    }

    pub fn face_detected(&self) -> bool {
        self.face_detected
    }

    pub fn custom_image_active(&self) -> bool {
        self.custom_image_active
    }

    pub fn camera_error(&self) -> Option<&str> {
        self.camera_error.as_deref()
    }

    pub fn overlay(&self) -> OverlayTransform {
        self.overlay
    }

    /// The single gate for the capture action.
    pub fn can_proceed(&self) -> bool {
        self.face_detected || self.manual_fallback || self.custom_image_active
    }

    /// Whether the renderer should draw the automatic overlay.
    pub fn overlay_visible(&self) -> bool {
        !self.manual_fallback && !self.custom_image_active && self.camera_error.is_none()
    }

    /// Record a successful model load. Refused (returns false) once manual
    /// fallback has been entered; the loaded engine must then be discarded.
    pub fn model_ready(&mut self) -> bool {
        if self.manual_fallback {
            return false;
        }
        self.model_loading = false;
        self.model_load_slow = false;
        true
    }

    /// Flag a slow load; meaningless once loading resolved.
    pub fn mark_load_slow(&mut self) {
        if self.model_loading {
            self.model_load_slow = true;
        }
    }

    /// Enter manual fallback. Terminal for the session.
    pub fn enter_manual_fallback(&mut self) {
        self.manual_fallback = true;
        self.model_loading = false;
        self.model_load_slow = false;
        self.face_detected = false;
    }

    pub fn set_face_detected(&mut self, detected: bool) {
        self.face_detected = detected;
    }

    pub fn set_overlay(&mut self, overlay: OverlayTransform) {
        self.overlay = overlay;
    }

    pub fn set_custom_image_active(&mut self, active: bool) {
        self.custom_image_active = active;
    }

    pub fn set_camera_error(&mut self, error: Option<String>) {
        self.camera_error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let snap = TrackingSnapshot::default();
        assert!(snap.model_loading());
        assert!(!snap.manual_fallback());
        assert!(!snap.face_detected());
        assert!(!snap.can_proceed());
        assert!(snap.overlay_visible());
        assert_eq!(snap.overlay(), OverlayTransform::default());
    }

    #[test]
    fn test_can_proceed_truth_table() {
        // (face_detected, manual_fallback, custom_image) -> can_proceed
        for face in [false, true] {
            for manual in [false, true] {
                for custom in [false, true] {
                    let mut snap = TrackingSnapshot::default();
                    snap.set_face_detected(face);
                    if manual {
                        snap.enter_manual_fallback();
                    }
                    snap.set_custom_image_active(custom);

                    // enter_manual_fallback clears face_detected
                    let expected = (face && !manual) || manual || custom;
                    assert_eq!(
                        snap.can_proceed(),
                        expected,
                        "face={face} manual={manual} custom={custom}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_manual_fallback_is_terminal() {
        let mut snap = TrackingSnapshot::default();
        snap.enter_manual_fallback();

        assert!(snap.manual_fallback());
        assert!(!snap.model_loading());
        assert!(snap.can_proceed());
        assert!(!snap.overlay_visible());

        // A later successful load is refused
        assert!(!snap.model_ready());
        assert!(snap.manual_fallback());
    }

    #[test]
    fn test_model_ready_clears_loading_flags() {
        let mut snap = TrackingSnapshot::default();
        snap.mark_load_slow();
        assert!(snap.model_load_slow());

        assert!(snap.model_ready());
        assert!(!snap.model_loading());
        assert!(!snap.model_load_slow());
    }

    #[test]
    fn test_slow_flag_ignored_after_resolution() {
        let mut snap = TrackingSnapshot::default();
        assert!(snap.model_ready());

        snap.mark_load_slow();
        assert!(!snap.model_load_slow());
    }

    #[test]
    fn test_custom_image_suspends_overlay_not_tracking_state() {
        let mut snap = TrackingSnapshot::default();
        assert!(snap.model_ready());
        snap.set_face_detected(true);

        snap.set_custom_image_active(true);
        assert!(!snap.overlay_visible());
        assert!(snap.can_proceed());

        snap.set_custom_image_active(false);
        assert!(snap.overlay_visible());
    }

    #[test]
    fn test_camera_error_hides_overlay() {
        let mut snap = TrackingSnapshot::default();
        snap.set_camera_error(Some("device unavailable".to_string()));
        assert!(!snap.overlay_visible());
        assert_eq!(snap.camera_error(), Some("device unavailable"));
    }
}
