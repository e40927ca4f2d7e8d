//! Face-mesh inference engine
//!
//! Wraps an ONNX face-mesh session behind the [`Landmarker`] seam so the
//! detection loop and its tests never depend on a real model. The expected
//! model is a 468-point face-mesh export taking a 192x192 RGB image under the
//! tensor name `input` and producing `landmarks` ([1, 1404], coordinates in
//! input-pixel units) plus a face-presence logit `score` ([1, 1]).

use ndarray::{Array4, ArrayViewD};
use opencv::core::{Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use crate::camera::VideoFrame;
use crate::config::LandmarkerConfig;
use crate::error::TrackingError;

/// Number of points in the supported face-mesh topology
pub const MESH_POINT_COUNT: usize = 468;

/// Model input edge length in pixels
const MODEL_INPUT_SIZE: i32 = 192;

const INPUT_NAME: &str = "input";
const OUTPUT_LANDMARKS: &str = "landmarks";
const OUTPUT_SCORE: &str = "score";

/// One normalized 3D mesh point (0-1 range for x/y)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeshPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Per-frame inference output for a single detected face.
///
/// Ephemeral: consumed by the anchor extractor in the frame that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMesh {
    points: Vec<MeshPoint>,
}

impl FaceMesh {
    pub fn new(points: Vec<MeshPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, idx: usize) -> Option<MeshPoint> {
        self.points.get(idx).copied()
    }
}

/// Inference backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    /// Hardware-accelerated execution provider (CUDA)
    Accelerated,
    /// Plain CPU execution
    Cpu,
}

impl ModelBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accelerated => "accelerated",
            Self::Cpu => "cpu",
        }
    }
}

/// Per-frame inference seam.
///
/// Implementations may keep internal tracking state, hence `&mut self`.
pub trait Landmarker: Send {
    /// Run video-mode inference for one frame at the given timestamp.
    ///
    /// `Ok(None)` means no face passed the confidence gates; errors are
    /// per-frame and non-fatal to the loop.
    fn detect_for_video(
        &mut self,
        frame: &VideoFrame,
        timestamp_ms: i64,
    ) -> Result<Option<FaceMesh>, TrackingError>;
}

/// ONNX-backed face-mesh landmarker.
pub struct MeshLandmarker {
    session: Session,
    backend: ModelBackend,
    min_presence: f32,
}

impl MeshLandmarker {
    /// Build a session for the given backend with identical model parameters.
    pub fn new(config: &LandmarkerConfig, backend: ModelBackend) -> Result<Self, TrackingError> {
        let mut builder = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .map_err(|e| TrackingError::ModelLoadFailure(e.to_string()))?;

        if backend == ModelBackend::Accelerated {
            builder = builder
                .with_execution_providers([CUDAExecutionProvider::default()
                    .build()
                    .error_on_failure()])
                .map_err(|e| TrackingError::ModelLoadFailure(e.to_string()))?;
        }

        let session = builder
            .commit_from_file(&config.model_path)
            .map_err(|e| TrackingError::ModelLoadFailure(e.to_string()))?;

        tracing::info!(
            "Face mesh session ready ({} backend, model: {})",
            backend.as_str(),
            config.model_path
        );

        Ok(Self {
            session,
            backend,
            min_presence: config.min_presence_confidence,
        })
    }

    pub fn backend(&self) -> ModelBackend {
        self.backend
    }

    /// Resize to the model input, convert BGR to RGB and scale to [0, 1].
    fn preprocess(&self, frame: &VideoFrame) -> Result<Array4<f32>, TrackingError> {
        let infer = |e: opencv::Error| TrackingError::Inference(e.to_string());

        let flat = Mat::from_slice(&frame.data).map_err(infer)?;
        let bgr = flat.reshape(3, frame.height).map_err(infer)?;

        let mut resized = Mat::default();
        imgproc::resize(
            &bgr,
            &mut resized,
            Size::new(MODEL_INPUT_SIZE, MODEL_INPUT_SIZE),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )
        .map_err(infer)?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0).map_err(infer)?;

        let bytes = rgb.data_bytes().map_err(infer)?;
        let size = MODEL_INPUT_SIZE as usize;
        let mut input = Array4::<f32>::zeros((1, size, size, 3));
        for (i, px) in bytes.iter().enumerate() {
            let channel = i % 3;
            let pixel = i / 3;
            input[[0, pixel / size, pixel % size, channel]] = *px as f32 / 255.0;
        }

        Ok(input)
    }
}

impl Landmarker for MeshLandmarker {
    fn detect_for_video(
        &mut self,
        frame: &VideoFrame,
        _timestamp_ms: i64,
    ) -> Result<Option<FaceMesh>, TrackingError> {
        let input = self.preprocess(frame)?;
        let tensor =
            Tensor::from_array(input).map_err(|e| TrackingError::Inference(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![INPUT_NAME => tensor])
            .map_err(|e| TrackingError::Inference(e.to_string()))?;

        let score: ArrayViewD<f32> = outputs[OUTPUT_SCORE]
            .try_extract_array()
            .map_err(|e| TrackingError::Inference(e.to_string()))?;
        let presence = sigmoid(score[[0, 0]]);
        if presence < self.min_presence {
            return Ok(None);
        }

        let raw: ArrayViewD<f32> = outputs[OUTPUT_LANDMARKS]
            .try_extract_array()
            .map_err(|e| TrackingError::Inference(e.to_string()))?;
        if raw.len() < MESH_POINT_COUNT * 3 {
            return Err(TrackingError::Inference(format!(
                "unexpected landmark tensor length: {}",
                raw.len()
            )));
        }

        let scale = MODEL_INPUT_SIZE as f32;
        let points = (0..MESH_POINT_COUNT)
            .map(|i| MeshPoint {
                x: raw[[0, 3 * i]] / scale,
                y: raw[[0, 3 * i + 1]] / scale,
                z: raw[[0, 3 * i + 2]] / scale,
            })
            .collect();

        Ok(Some(FaceMesh::new(points)))
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(ModelBackend::Accelerated.as_str(), "accelerated");
        assert_eq!(ModelBackend::Cpu.as_str(), "cpu");
    }

    #[test]
    fn test_sigmoid_bounds() {
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_mesh_point_access() {
        let mesh = FaceMesh::new(vec![
            MeshPoint {
                x: 0.1,
                y: 0.2,
                z: 0.0,
            },
            MeshPoint {
                x: 0.3,
                y: 0.4,
                z: 0.0,
            },
        ]);
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.point(1).unwrap().x, 0.3);
        assert!(mesh.point(2).is_none());
    }
}
