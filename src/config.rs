//! Configuration parsing and management for Mirrorcut

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, MirrorcutError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub landmarker: LandmarkerConfig,
    pub overlay: OverlayTuning,
    pub http: HttpConfig,
    pub analysis: AnalysisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            landmarker: LandmarkerConfig::default(),
            overlay: OverlayTuning::default(),
            http: HttpConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MirrorcutError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, MirrorcutError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, MirrorcutError> {
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), MirrorcutError> {
        if self.camera.preferred_width == 0 || self.camera.preferred_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "camera.preferred_width/height".to_string(),
                message: "Preferred resolution must be greater than 0".to_string(),
            }
            .into());
        }

        if !(1..=100).contains(&self.camera.capture_jpeg_quality) {
            return Err(ConfigError::InvalidValue {
                field: "camera.capture_jpeg_quality".to_string(),
                message: "JPEG quality must be between 1 and 100".to_string(),
            }
            .into());
        }

        if self.landmarker.load_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "landmarker.load_timeout_secs".to_string(),
                message: "Load timeout must be greater than 0".to_string(),
            }
            .into());
        }

        for (field, value) in [
            (
                "landmarker.min_detection_confidence",
                self.landmarker.min_detection_confidence,
            ),
            (
                "landmarker.min_presence_confidence",
                self.landmarker.min_presence_confidence,
            ),
            (
                "landmarker.min_tracking_confidence",
                self.landmarker.min_tracking_confidence,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Confidence must be between 0.0 and 1.0".to_string(),
                }
                .into());
            }
        }

        if !(0.0..=1.0).contains(&self.overlay.smooth_factor) || self.overlay.smooth_factor == 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "overlay.smooth_factor".to_string(),
                message: "Smooth factor must be in (0.0, 1.0]".to_string(),
            }
            .into());
        }

        if self.overlay.scale_factor <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "overlay.scale_factor".to_string(),
                message: "Scale factor must be greater than 0".to_string(),
            }
            .into());
        }

        if !Path::new(&self.landmarker.model_path).exists() {
            tracing::warn!(
                "Face mesh model not found at: {} (tracking will fall back to manual mode)",
                self.landmarker.model_path
            );
        }

        if self.http.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.port".to_string(),
                message: "Port must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Camera acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera device index (front-facing camera on handheld rigs)
    pub device: u32,
    /// Preferred capture width (portrait orientation)
    pub preferred_width: u32,
    /// Preferred capture height (portrait orientation)
    pub preferred_height: u32,
    /// Requested capture FPS
    pub fps: u32,
    /// JPEG quality for captured still frames (1-100)
    pub capture_jpeg_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            preferred_width: 720,
            preferred_height: 1280,
            fps: 30,
            capture_jpeg_quality: 80,
        }
    }
}

/// Face-landmark model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkerConfig {
    /// Path to the face mesh ONNX model
    pub model_path: String,
    /// Whole-load timeout in seconds (both backends together)
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
    /// Delay before flagging the load as slow to the host UI, in milliseconds
    #[serde(default = "default_slow_notice")]
    pub slow_notice_ms: u64,
    /// Try the hardware-accelerated execution provider before the CPU one
    #[serde(default = "default_true")]
    pub prefer_accelerated: bool,
    /// Minimum face detection confidence
    #[serde(default = "default_confidence")]
    pub min_detection_confidence: f32,
    /// Minimum face presence confidence
    #[serde(default = "default_confidence")]
    pub min_presence_confidence: f32,
    /// Minimum tracking confidence
    #[serde(default = "default_confidence")]
    pub min_tracking_confidence: f32,
    /// Maximum number of faces to track (only the first is used downstream)
    #[serde(default = "default_max_faces")]
    pub max_faces: u32,
}

fn default_load_timeout() -> u64 { 15 }
fn default_slow_notice() -> u64 { 2000 }
fn default_true() -> bool { true }
fn default_confidence() -> f32 { 0.5 }
fn default_max_faces() -> u32 { 1 }

impl Default for LandmarkerConfig {
    fn default() -> Self {
        Self {
            model_path: "models/face_mesh.onnx".to_string(),
            load_timeout_secs: default_load_timeout(),
            slow_notice_ms: default_slow_notice(),
            prefer_accelerated: default_true(),
            min_detection_confidence: default_confidence(),
            min_presence_confidence: default_confidence(),
            min_tracking_confidence: default_confidence(),
            max_faces: default_max_faces(),
        }
    }
}

/// Overlay transform tuning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayTuning {
    /// Multiplier from normalized ear-to-ear width to overlay scale.
    /// Calibrated so the silhouette's bounding box matches a real head.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
    /// Single-pole low-pass factor applied per channel each processed frame
    #[serde(default = "default_smooth_factor")]
    pub smooth_factor: f32,
}

fn default_scale_factor() -> f32 { 4.0 }
fn default_smooth_factor() -> f32 { 0.2 }

impl Default for OverlayTuning {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            smooth_factor: default_smooth_factor(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Enable HTTP server
    pub enabled: bool,
    /// HTTP server host
    pub host: String,
    /// HTTP server port
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_enabled: true,
        }
    }
}

/// Analysis collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Response language requested from the analysis service ("ko" or "en")
    pub language: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            language: "ko".to_string(),
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("mirrorcut");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/mirrorcut");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/mirrorcut");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("mirrorcut");
        }
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.camera.preferred_width, 720);
        assert_eq!(config.camera.preferred_height, 1280);
        assert_eq!(config.landmarker.load_timeout_secs, 15);
        assert_eq!(config.overlay.smooth_factor, 0.2);
        assert!(config.http.enabled);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [camera]
            device = 1
            fps = 24

            [landmarker]
            load_timeout_secs = 30

            [overlay]
            scale_factor = 5.5
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.camera.device, 1);
        assert_eq!(config.camera.fps, 24);
        assert_eq!(config.landmarker.load_timeout_secs, 30);
        assert_eq!(config.overlay.scale_factor, 5.5);
        // Untouched sections keep defaults
        assert_eq!(config.overlay.smooth_factor, 0.2);
    }

    #[test]
    fn test_invalid_smooth_factor() {
        let mut config = Config::default();
        config.overlay.smooth_factor = 0.0;
        assert!(config.validate().is_err());

        config.overlay.smooth_factor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_confidence() {
        let mut config = Config::default();
        config.landmarker.min_presence_confidence = 1.2;
        assert!(config.validate().is_err());
    }
}
