//! Error types for Mirrorcut

use thiserror::Error;

/// Main error type for Mirrorcut
#[derive(Error, Debug)]
pub enum MirrorcutError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Web server error: {0}")]
    Web(#[from] WebError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Camera-related errors
///
/// Camera failures are fatal to the tracking experience: the host UI shows a
/// blocking error view with a retry action. Model failures never route here.
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("No usable camera device found")]
    DeviceUnavailable,

    #[error("Failed to open camera device: {0}")]
    Open(String),

    #[error("Failed to read frame: {0}")]
    Read(String),

    #[error("Failed to spawn capture thread: {0}")]
    ThreadSpawn(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Tracking-related errors (model loading + per-frame inference)
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Face model load timed out")]
    ModelLoadTimeout,

    #[error("Face model load failed: {0}")]
    ModelLoadFailure(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("A model load is already in progress")]
    LoadInProgress,
}

/// Still-frame capture errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No frame available to capture")]
    NoFrame,

    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

/// Web server errors
#[derive(Error, Debug)]
pub enum WebError {
    #[error("Failed to bind to address: {0}")]
    Bind(String),

    #[error("Server startup failed: {0}")]
    Startup(String),
}

/// Errors from the external analysis/image-generation collaborator
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analysis request failed: {0}")]
    Request(String),

    #[error("Analysis response was malformed: {0}")]
    Malformed(String),
}

/// Result type alias for Mirrorcut operations
pub type Result<T> = std::result::Result<T, MirrorcutError>;
