//! Camera acquisition module
//!
//! Owns the live camera stream: preferred-constraint acquisition with a
//! relaxed retry, a dedicated capture thread, and idempotent release.

pub mod capture;

pub use capture::{CameraCapture, StreamConstraints, VideoFrame};
