//! REST API endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analysis::AnalysisOptions;
use crate::capture::capture_still;
use crate::styles::{self, Gender, LengthCategory, StyleTemplate};
use crate::web::sse;
use crate::{AppState, FeedbackEvent};

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn error(message: &str) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        })
    }

    pub fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            error: None,
        })
    }
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub model_loading: bool,
    pub model_load_slow: bool,
    pub manual_fallback: bool,
    pub face_detected: bool,
    pub custom_image_active: bool,
    pub camera_error: Option<String>,
    pub can_proceed: bool,
    pub overlay_visible: bool,
    pub version: String,
}

/// Get current status
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot().await;

    ApiResponse::success(StatusResponse {
        model_loading: snapshot.model_loading(),
        model_load_slow: snapshot.model_load_slow(),
        manual_fallback: snapshot.manual_fallback(),
        face_detected: snapshot.face_detected(),
        custom_image_active: snapshot.custom_image_active(),
        camera_error: snapshot.camera_error().map(|s| s.to_string()),
        can_proceed: snapshot.can_proceed(),
        overlay_visible: snapshot.overlay_visible(),
        version: crate::VERSION.to_string(),
    })
}

/// Get current configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.config.read().await;
    Json(config.clone())
}

/// Update configuration
#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub camera_device: Option<u32>,
    #[serde(default)]
    pub capture_jpeg_quality: Option<u8>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub overlay_scale_factor: Option<f32>,
    #[serde(default)]
    pub overlay_smooth_factor: Option<f32>,
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> impl IntoResponse {
    let mut config = state.config.write().await;

    let mut updated = config.clone();
    if let Some(device) = update.camera_device {
        updated.camera.device = device;
    }
    if let Some(quality) = update.capture_jpeg_quality {
        updated.camera.capture_jpeg_quality = quality;
    }
    if let Some(language) = update.language {
        updated.analysis.language = language;
    }
    if let Some(scale_factor) = update.overlay_scale_factor {
        updated.overlay.scale_factor = scale_factor;
    }
    if let Some(smooth_factor) = update.overlay_smooth_factor {
        updated.overlay.smooth_factor = smooth_factor;
    }

    if let Err(e) = updated.validate() {
        return ApiResponse::error(&e.to_string());
    }

    *config = updated;
    ApiResponse::ok()
}

/// The active style in wire form
#[derive(Debug, Serialize)]
pub struct StylePayload {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: LengthCategory,
    pub overlay_path: &'static str,
}

impl StylePayload {
    fn from_template(template: &StyleTemplate, language: &str) -> Self {
        Self {
            id: template.id,
            name: template.display_name(language),
            description: template.display_description(language),
            category: template.category,
            overlay_path: template.overlay_path,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StyleQuery {
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub length: Option<LengthCategory>,
}

/// List catalog templates, optionally filtered
pub async fn list_styles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StyleQuery>,
) -> impl IntoResponse {
    let selection = state.selection.read().await.clone();
    let language = state.config.read().await.analysis.language.clone();

    let gender = query.gender.unwrap_or(selection.gender);
    let templates: Vec<StylePayload> = styles::templates_for(gender)
        .iter()
        .filter(|t| query.length.map_or(true, |l| t.category == l))
        .map(|t| StylePayload::from_template(t, &language))
        .collect();

    ApiResponse::success(templates)
}

/// List the hair color palette
pub async fn list_colors() -> impl IntoResponse {
    ApiResponse::success(styles::HAIR_COLORS)
}

/// Selection response
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub gender: Gender,
    pub length: LengthCategory,
    pub index: usize,
    pub target_color: Option<String>,
    pub count: usize,
    pub current: Option<StylePayload>,
}

async fn selection_response(state: &AppState) -> SelectionResponse {
    let selection = state.selection.read().await.clone();
    let language = state.config.read().await.analysis.language.clone();

    SelectionResponse {
        gender: selection.gender,
        length: selection.length,
        index: selection.index(),
        target_color: selection.target_color().map(|s| s.to_string()),
        count: selection.active_templates().len(),
        current: selection
            .current()
            .map(|t| StylePayload::from_template(t, &language)),
    }
}

/// Get the current selection
pub async fn get_selection(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ApiResponse::success(selection_response(&state).await)
}

/// Update the selection filter or target color
#[derive(Debug, Deserialize)]
pub struct SelectionUpdate {
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub length: Option<LengthCategory>,
    #[serde(default)]
    pub target_color: Option<String>,
}

pub async fn update_selection(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SelectionUpdate>,
) -> impl IntoResponse {
    {
        let mut selection = state.selection.write().await;
        if let Some(gender) = update.gender {
            selection.set_gender(gender);
        }
        if let Some(length) = update.length {
            selection.set_length(length);
        }
        if let Some(color) = update.target_color {
            selection.set_target_color(Some(color));
        }
    }
    state.emit(FeedbackEvent::StyleChanged);

    ApiResponse::success(selection_response(&state).await)
}

/// Advance the template carousel
pub async fn next_style(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.selection.write().await.next();
    state.emit(FeedbackEvent::StyleChanged);
    ApiResponse::success(selection_response(&state).await)
}

/// Step the template carousel back
pub async fn prev_style(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.selection.write().await.prev();
    state.emit(FeedbackEvent::StyleChanged);
    ApiResponse::success(selection_response(&state).await)
}

/// Upload a custom reference image (suspends live tracking)
#[derive(Debug, Deserialize)]
pub struct CustomImageUpload {
    pub image_base64: String,
}

pub async fn set_custom_image(
    State(state): State<Arc<AppState>>,
    Json(upload): Json<CustomImageUpload>,
) -> Response {
    let bytes = match base64::engine::general_purpose::STANDARD.decode(&upload.image_base64) {
        Ok(bytes) => bytes,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                ApiResponse::error(&format!("Invalid image data: {e}")),
            )
                .into_response();
        }
    };

    state.set_custom_image(bytes).await;
    ApiResponse::ok().into_response()
}

/// Clear the custom image and resume live tracking
pub async fn clear_custom_image(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.clear_custom_image().await;
    ApiResponse::ok()
}

/// Force manual capture mode (one-way for the session)
pub async fn enter_manual_mode(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.enter_manual_fallback("host command").await;
    ApiResponse::ok()
}

/// Capture handoff: the mirror-corrected frame plus the active style payload.
#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    /// Mirror-corrected JPEG, base64-encoded; absent when no frame exists
    pub image_base64: Option<String>,
    /// Active template; absent when a custom image stands in for it
    pub style: Option<StylePayload>,
    pub custom_image: bool,
    pub options: AnalysisOptions,
}

/// Capture the current frame for the analysis collaborator
pub async fn capture(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.snapshot().await;
    if !snapshot.can_proceed() {
        return (
            StatusCode::CONFLICT,
            ApiResponse::error("No face detected yet"),
        )
            .into_response();
    }

    let config = state.config.read().await;
    let quality = config.camera.capture_jpeg_quality;
    let language = config.analysis.language.clone();
    drop(config);

    let image_base64 = match state.latest_frame().await {
        Some(frame) => match capture_still(&frame, quality) {
            Ok(captured) => {
                Some(base64::engine::general_purpose::STANDARD.encode(&captured.jpeg))
            }
            Err(e) => {
                tracing::warn!("Frame capture failed, continuing without photo: {}", e);
                None
            }
        },
        None => None,
    };

    let selection = state.selection.read().await.clone();
    let custom_image = snapshot.custom_image_active();
    let style = if custom_image {
        None
    } else {
        selection
            .current()
            .map(|t| StylePayload::from_template(t, &language))
    };

    let options = AnalysisOptions {
        gender: selection.gender,
        current_length: selection.length,
        target_color: selection.target_color().map(|s| s.to_string()),
        language,
    };

    state.emit(FeedbackEvent::CaptureTaken);

    ApiResponse::success(CaptureResponse {
        image_base64,
        style,
        custom_image,
        options,
    })
    .into_response()
}

/// SSE stream of tracking snapshots
pub async fn snapshot_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    sse::create_snapshot_stream(state)
}

/// SSE stream of feedback events
pub async fn feedback_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    sse::create_feedback_stream(state)
}
