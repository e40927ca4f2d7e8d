//! Server-Sent Events for real-time state updates

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::tracking::state::TrackingSnapshot;
use crate::AppState;

/// Create an SSE stream of tracking snapshots
pub fn create_snapshot_stream(
    app_state: Arc<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.subscribe_snapshots();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(snapshot) => Some(Ok(snapshot_to_event(&snapshot))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Convert a tracking snapshot to an SSE event
fn snapshot_to_event(snapshot: &TrackingSnapshot) -> Event {
    let overlay = snapshot.overlay();
    let data = serde_json::json!({
        "model_loading": snapshot.model_loading(),
        "model_load_slow": snapshot.model_load_slow(),
        "manual_fallback": snapshot.manual_fallback(),
        "face_detected": snapshot.face_detected(),
        "custom_image_active": snapshot.custom_image_active(),
        "camera_error": snapshot.camera_error(),
        "can_proceed": snapshot.can_proceed(),
        "overlay_visible": snapshot.overlay_visible(),
        "overlay": {
            "scale": overlay.scale,
            "x": overlay.x,
            "y": overlay.y,
        },
    });

    Event::default().event("tracking").data(data.to_string())
}

/// Create an SSE stream of host feedback events
pub fn create_feedback_stream(
    app_state: Arc<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.subscribe_feedback();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).ok()?;
            Some(Ok(Event::default().event("feedback").data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
