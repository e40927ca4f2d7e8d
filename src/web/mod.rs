//! HTTP/SSE boundary to the host UI
//!
//! The host reads the tracking snapshot stream, drives template selection,
//! toggles custom-image and manual modes, and requests captures. Nothing in
//! here renders anything; presentation is entirely the host's job.

pub mod api;
pub mod routes;
pub mod sse;

pub use routes::create_router;
