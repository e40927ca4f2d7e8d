//! Camera device capture using OpenCV
//!
//! The capture runs on a dedicated thread since device reads are blocking.
//! Frames are communicated through a small bounded crossbeam channel so the
//! capture loop is backpressured when the detection loop falls behind.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use std::thread;
use std::time::Instant;

use crate::config::CameraConfig;
use crate::error::CameraError;

/// A single video frame handed to the detection loop.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// BGR pixel data, row-major
    pub data: Vec<u8>,
    pub width: i32,
    pub height: i32,
    /// Milliseconds since the stream started
    pub timestamp_ms: i64,
}

/// Constraints for one acquisition attempt.
///
/// The first attempt asks for the portrait resolution the preview is laid
/// out for; the relaxed retry takes whatever the device offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
}

impl StreamConstraints {
    /// Preferred portrait constraints from the configuration
    pub fn preferred(config: &CameraConfig) -> Self {
        Self {
            width: Some(config.preferred_width),
            height: Some(config.preferred_height),
            fps: Some(config.fps),
        }
    }

    /// Unconstrained video-only request
    pub fn relaxed() -> Self {
        Self {
            width: None,
            height: None,
            fps: None,
        }
    }
}

/// Exclusively-owned handle to a live camera stream.
///
/// At most one stream is live per handle; `release()` stops the capture
/// thread and closes the device, and is safe to call more than once.
pub struct CameraCapture {
    frame_rx: Receiver<VideoFrame>,
    stop_tx: Sender<()>,
    thread_handle: Option<thread::JoinHandle<()>>,
    width: i32,
    height: i32,
}

impl CameraCapture {
    /// Acquire the camera described by the configuration.
    ///
    /// Tries the preferred portrait constraints first and retries once with
    /// an unconstrained request before giving up. Camera failure is fatal to
    /// tracking; the caller surfaces it as a blocking error state.
    pub fn acquire(config: &CameraConfig) -> Result<Self, CameraError> {
        let preferred = StreamConstraints::preferred(config);
        let device = match open_device(config.device, &preferred) {
            Ok(device) => device,
            Err(e) => {
                tracing::warn!(
                    "Preferred camera constraints failed ({}), retrying unconstrained",
                    e
                );
                open_device(config.device, &StreamConstraints::relaxed())?
            }
        };

        let width = device
            .get(videoio::CAP_PROP_FRAME_WIDTH)
            .map_err(|e| CameraError::Open(e.to_string()))? as i32;
        let height = device
            .get(videoio::CAP_PROP_FRAME_HEIGHT)
            .map_err(|e| CameraError::Open(e.to_string()))? as i32;

        tracing::info!(
            "Camera {} acquired at {}x{}",
            config.device,
            width,
            height
        );

        let (frame_tx, frame_rx) = bounded::<VideoFrame>(2);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let thread_handle = thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || run_capture_thread(device, frame_tx, stop_rx))
            .map_err(|e| CameraError::ThreadSpawn(e.to_string()))?;

        Ok(Self {
            frame_rx,
            stop_tx,
            thread_handle: Some(thread_handle),
            width,
            height,
        })
    }

    /// Get the next frame if one is ready (non-blocking with a short yield).
    ///
    /// Returns `Ok(None)` when no frame is pending yet.
    pub async fn next_frame(&self) -> Result<Option<VideoFrame>, CameraError> {
        match self.frame_rx.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(crossbeam_channel::TryRecvError::Empty) => {
                tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
                Ok(None)
            }
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                Err(CameraError::Read("capture thread stopped".to_string()))
            }
        }
    }

    /// Actual stream dimensions granted by the device
    pub fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Stop the capture thread and close the device. Idempotent.
    pub fn release(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
            tracing::info!("Camera released");
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.release();
    }
}

/// Open the device and apply constraints where present.
fn open_device(index: u32, constraints: &StreamConstraints) -> Result<VideoCapture, CameraError> {
    let mut device = VideoCapture::new(index as i32, videoio::CAP_ANY)
        .map_err(|e| classify_open_failure(&e.to_string()))?;

    let opened = device
        .is_opened()
        .map_err(|e| CameraError::Open(e.to_string()))?;
    if !opened {
        return Err(CameraError::DeviceUnavailable);
    }

    // Constraint failures are not fatal; the device keeps its native mode.
    if let Some(width) = constraints.width {
        let _ = device.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64);
    }
    if let Some(height) = constraints.height {
        let _ = device.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64);
    }
    if let Some(fps) = constraints.fps {
        let _ = device.set(videoio::CAP_PROP_FPS, fps as f64);
    }

    Ok(device)
}

/// Map an open failure onto the camera error taxonomy.
fn classify_open_failure(message: &str) -> CameraError {
    if message.contains("ermission denied") || message.contains("EACCES") {
        CameraError::PermissionDenied
    } else {
        CameraError::Open(message.to_string())
    }
}

/// Capture loop executed on the dedicated thread.
fn run_capture_thread(mut device: VideoCapture, tx: Sender<VideoFrame>, stop_rx: Receiver<()>) {
    let started = Instant::now();
    let mut frame = Mat::default();

    loop {
        if stop_rx.try_recv().is_ok() {
            break;
        }

        let grabbed = match device.read(&mut frame) {
            Ok(grabbed) => grabbed,
            Err(e) => {
                tracing::error!("Camera read error: {}", e);
                break;
            }
        };
        if !grabbed {
            continue;
        }

        let size = match frame.size() {
            Ok(size) if size.width > 0 && size.height > 0 => size,
            _ => continue,
        };

        let data = match frame.data_bytes() {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                tracing::error!("Camera frame access error: {}", e);
                continue;
            }
        };

        let video_frame = VideoFrame {
            data,
            width: size.width,
            height: size.height,
            timestamp_ms: started.elapsed().as_millis() as i64,
        };

        // Drop the frame when the consumer is behind; the loop dedups by
        // timestamp anyway, stale frames are worthless.
        match tx.try_send(video_frame) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }
    }

    let _ = device.release();
    tracing::debug!("Camera capture thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_constraints() {
        let config = CameraConfig::default();
        let constraints = StreamConstraints::preferred(&config);
        assert_eq!(constraints.width, Some(720));
        assert_eq!(constraints.height, Some(1280));
        assert_eq!(constraints.fps, Some(30));
    }

    #[test]
    fn test_relaxed_constraints_are_unconstrained() {
        let constraints = StreamConstraints::relaxed();
        assert_eq!(constraints.width, None);
        assert_eq!(constraints.height, None);
        assert_eq!(constraints.fps, None);
    }

    #[test]
    fn test_classify_open_failure() {
        assert!(matches!(
            classify_open_failure("VIDEOIO ERROR: Permission denied"),
            CameraError::PermissionDenied
        ));
        assert!(matches!(
            classify_open_failure("open failed: EACCES"),
            CameraError::PermissionDenied
        ));
        assert!(matches!(
            classify_open_failure("device busy"),
            CameraError::Open(_)
        ));
    }
}
