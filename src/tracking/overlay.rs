//! Overlay transform smoothing
//!
//! Converts per-frame anchors into the {scale, x, y} the renderer applies to
//! the hairstyle silhouette. A single-pole low-pass filter per channel trades
//! a little latency for jitter suppression; convergence is asymptotic, there
//! is no deadband or snap-to-target.

use serde::{Deserialize, Serialize};

use crate::config::OverlayTuning;
use crate::tracking::anchors::FaceAnchors;

/// Screen-space transform for the overlay graphic.
///
/// `x` and `y` are percentages of the preview (0-100), `scale` multiplies the
/// graphic's intrinsic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayTransform {
    pub scale: f32,
    pub x: f32,
    pub y: f32,
}

impl Default for OverlayTransform {
    /// Centered, neutral transform held until the first detection
    fn default() -> Self {
        Self {
            scale: 1.0,
            x: 50.0,
            y: 50.0,
        }
    }
}

/// Exponentially-smoothed overlay transform, exclusively owned by the
/// detection loop and updated at most once per processed frame.
#[derive(Debug, Clone)]
pub struct OverlaySmoother {
    current: OverlayTransform,
    scale_factor: f32,
    smooth_factor: f32,
}

impl OverlaySmoother {
    pub fn new(tuning: &OverlayTuning) -> Self {
        Self {
            current: OverlayTransform::default(),
            scale_factor: tuning.scale_factor,
            smooth_factor: tuning.smooth_factor,
        }
    }

    /// Fold one frame's anchors into the running transform.
    pub fn update(&mut self, anchors: &FaceAnchors) -> OverlayTransform {
        let target_scale = anchors.face_width() * self.scale_factor;
        // The preview is a mirrored front-camera feed, so overlay x runs
        // opposite to mesh x. Assumes a front camera; an unmirrored or rear
        // feed would need this inverted.
        let target_x = (1.0 - anchors.center_x()) * 100.0;
        let target_y = anchors.top_of_head.y * 100.0;

        self.current.scale += (target_scale - self.current.scale) * self.smooth_factor;
        self.current.x += (target_x - self.current.x) * self.smooth_factor;
        self.current.y += (target_y - self.current.y) * self.smooth_factor;
        self.current
    }

    /// The latest smoothed transform
    pub fn current(&self) -> OverlayTransform {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::anchors::AnchorPoint;

    fn anchors(left: (f32, f32), right: (f32, f32), top: (f32, f32)) -> FaceAnchors {
        FaceAnchors {
            left_ear: AnchorPoint {
                x: left.0,
                y: left.1,
            },
            right_ear: AnchorPoint {
                x: right.0,
                y: right.1,
            },
            top_of_head: AnchorPoint { x: top.0, y: top.1 },
        }
    }

    fn smoother() -> OverlaySmoother {
        OverlaySmoother::new(&OverlayTuning::default())
    }

    #[test]
    fn test_default_transform_is_neutral() {
        let s = smoother();
        assert_eq!(
            s.current(),
            OverlayTransform {
                scale: 1.0,
                x: 50.0,
                y: 50.0
            }
        );
    }

    #[test]
    fn test_single_tick_from_default() {
        // Ears at (0.3,0.5)/(0.7,0.5), top of head at (0.5,0.2):
        // width 0.4, target scale 1.6, target x 50, target y 20.
        let mut s = smoother();
        let t = s.update(&anchors((0.3, 0.5), (0.7, 0.5), (0.5, 0.2)));

        assert!((t.scale - 1.12).abs() < 1e-5);
        assert!((t.x - 50.0).abs() < 1e-5);
        assert!((t.y - 44.0).abs() < 1e-5);
    }

    #[test]
    fn test_mirror_compensation() {
        // A face on the mesh's left half lands on the preview's right half.
        let mut s = smoother();
        let t = s.update(&anchors((0.1, 0.5), (0.3, 0.5), (0.2, 0.2)));

        // target_x = (1 - 0.2) * 100 = 80, one tick from 50: 56
        assert!((t.x - 56.0).abs() < 1e-5);
    }

    #[test]
    fn test_monotone_convergence() {
        let mut s = smoother();
        let a = anchors((0.3, 0.5), (0.7, 0.5), (0.5, 0.2));
        let target_y = 20.0;

        let mut prev_err = (s.current().y - target_y).abs();
        for _ in 0..50 {
            let t = s.update(&a);
            let err = (t.y - target_y).abs();
            assert!(err < prev_err, "error must shrink every tick");
            prev_err = err;
        }
    }

    #[test]
    fn test_exact_decay_law() {
        // |value - target| == |initial - target| * 0.8^N for the 0.2 filter
        let mut s = smoother();
        let a = anchors((0.3, 0.5), (0.7, 0.5), (0.5, 0.2));
        let target_y = 20.0;
        let initial_err = 50.0 - target_y;

        let n = 10;
        let mut last = s.current();
        for _ in 0..n {
            last = s.update(&a);
        }

        let expected = initial_err * 0.8f32.powi(n);
        assert!(((last.y - target_y) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_all_channels_smooth_independently() {
        let mut s = smoother();
        let a = anchors((0.4, 0.6), (0.8, 0.6), (0.6, 0.3));
        let t1 = s.update(&a);

        // scale: 1 + (1.6 - 1) * 0.2, x: 50 + (40 - 50) * 0.2, y: 50 + (30 - 50) * 0.2
        assert!((t1.scale - 1.12).abs() < 1e-5);
        assert!((t1.x - 48.0).abs() < 1e-5);
        assert!((t1.y - 46.0).abs() < 1e-5);
    }
}
