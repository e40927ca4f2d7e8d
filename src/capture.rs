//! Still-frame capture for the analysis handoff
//!
//! The preview the user aligned against is a mirrored front-camera feed, so
//! the captured frame is flipped horizontally before encoding: the analysis
//! service receives the image the way other people see the user.

use opencv::core::{self, Mat, Vector};
use opencv::imgcodecs;
use opencv::prelude::*;

use crate::camera::VideoFrame;
use crate::error::CaptureError;

/// A mirror-corrected, JPEG-encoded still frame.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub jpeg: Vec<u8>,
    pub width: i32,
    pub height: i32,
}

/// Mirror-correct and encode one camera frame.
pub fn capture_still(frame: &VideoFrame, jpeg_quality: u8) -> Result<CapturedFrame, CaptureError> {
    let encode = |e: opencv::Error| CaptureError::Encode(e.to_string());

    let flat = Mat::from_slice(&frame.data).map_err(encode)?;
    let bgr = flat.reshape(3, frame.height).map_err(encode)?;

    // Flip around the vertical axis to undo the preview mirror
    let mut corrected = Mat::default();
    core::flip(&bgr, &mut corrected, 1).map_err(encode)?;

    let mut buffer = Vector::<u8>::new();
    let params = Vector::from_slice(&[imgcodecs::IMWRITE_JPEG_QUALITY, jpeg_quality as i32]);
    imgcodecs::imencode(".jpg", &corrected, &mut buffer, &params).map_err(encode)?;

    Ok(CapturedFrame {
        jpeg: buffer.to_vec(),
        width: frame.width,
        height: frame.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_produces_jpeg() {
        // 4x4 BGR gradient frame
        let mut data = Vec::with_capacity(4 * 4 * 3);
        for i in 0..(4 * 4) {
            data.extend_from_slice(&[i as u8 * 10, 0, 255 - i as u8 * 10]);
        }
        let frame = VideoFrame {
            data,
            width: 4,
            height: 4,
            timestamp_ms: 0,
        };

        let captured = capture_still(&frame, 80).unwrap();
        assert_eq!(captured.width, 4);
        assert_eq!(captured.height, 4);
        // JPEG SOI marker
        assert_eq!(&captured.jpeg[..2], &[0xff, 0xd8]);
    }
}
