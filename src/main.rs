//! Mirrorcut - Headless AR Hairstyle Preview Engine
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mirrorcut::{
    camera::{CameraCapture, VideoFrame},
    config::Config,
    error::CameraError,
    tracking::{
        detector::TrackingEngine,
        landmarker::Landmarker,
        loader::{self, LoadOutcome, ModelSlot},
    },
    web, AppState,
};

/// Mirrorcut - Headless AR Hairstyle Preview Engine
#[derive(Parser, Debug)]
#[command(name = "mirrorcut", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera device index (overrides config)
    #[arg(short, long)]
    device: Option<u32>,

    /// List available camera devices and exit
    #[arg(long)]
    list_cameras: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable HTTP server
    #[arg(long)]
    no_http: bool,

    /// HTTP server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", mirrorcut::NAME, mirrorcut::VERSION);

    if args.list_cameras {
        list_cameras();
        return Ok(());
    }

    // Load configuration
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(device) = args.device {
        config.camera.device = device;
    }
    if args.no_http {
        config.http.enabled = false;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }

    config.validate()?;

    info!("Camera device: {}", config.camera.device);
    info!("Face model: {}", config.landmarker.model_path);
    info!("HTTP server: {}", config.http.enabled);

    // Create shared application state
    let state = AppState::new(config.clone());

    // Start the tracking pipeline
    let tracking_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = run_tracking(tracking_state).await {
            error!("Tracking pipeline error: {}", e);
        }
    });

    // Start HTTP server if enabled
    if config.http.enabled {
        let http_state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = run_http_server(http_state).await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    // Wait for Ctrl+C / SIGTERM
    shutdown_signal().await;
    info!("Shutdown signal received");
    state.shutdown();

    // Give tasks a moment to clean up
    tokio::time::sleep(Duration::from_millis(500)).await;

    info!("Mirrorcut stopped");
    Ok(())
}

/// The tracking pipeline: camera acquisition and model loading start
/// together (independent failure domains), then the per-frame loop runs
/// until shutdown.
async fn run_tracking(state: Arc<AppState>) -> anyhow::Result<()> {
    let config = state.config.read().await;
    let camera_config = config.camera.clone();
    let landmarker_config = config.landmarker.clone();
    let tuning = config.overlay.clone();
    drop(config);

    let mut shutdown_rx = state.subscribe_shutdown();

    // Kick off the model load first so it overlaps camera acquisition.
    // The slot guards against a second load ever starting this session.
    let mut slot = ModelSlot::default();
    slot.begin();
    let load_config = landmarker_config.clone();
    let mut load_task =
        tokio::spawn(async move { loader::load_with_timeout(&load_config).await });

    // Slow-load watchdog: flags the host UI without canceling the load.
    let slow_state = Arc::clone(&state);
    let slow_delay = Duration::from_millis(landmarker_config.slow_notice_ms);
    tokio::spawn(async move {
        tokio::time::sleep(slow_delay).await;
        slow_state.mark_model_slow().await;
    });

    let acquire_config = camera_config.clone();
    let mut camera =
        match tokio::task::spawn_blocking(move || CameraCapture::acquire(&acquire_config)).await? {
            Ok(camera) => Some(camera),
            Err(e) => {
                // Fatal to tracking, but the model load keeps running so the
                // session state still resolves for the host.
                error!("Camera acquisition failed: {}", e);
                state.set_camera_error(&e.to_string()).await;
                None
            }
        };

    let mut engine = TrackingEngine::new(&tuning);
    let mut landmarker: Option<Box<dyn Landmarker>> = None;
    let mut load_pending = true;

    loop {
        tokio::select! {
            outcome = &mut load_task, if load_pending => {
                load_pending = false;
                slot.resolve();
                match outcome {
                    Ok(LoadOutcome::Ready(instance)) => {
                        if state.mark_model_ready().await {
                            info!("Face model ready, auto tracking enabled");
                            landmarker = Some(instance);
                        } else {
                            // Manual fallback was entered (or the session was
                            // torn down) while loading; discard the instance.
                            info!("Discarding late model load result");
                        }
                    }
                    Ok(LoadOutcome::TimedOut) => {
                        state.enter_manual_fallback("model load timed out").await;
                    }
                    Ok(LoadOutcome::Failed(e)) => {
                        state.enter_manual_fallback(&e).await;
                    }
                    Err(e) => {
                        state.enter_manual_fallback(&format!("load task failed: {e}")).await;
                    }
                }
            }
            frame = next_frame(&mut camera) => {
                match frame {
                    Ok(Some(frame)) => {
                        state.store_frame(frame.clone()).await;
                        if let Some(landmarker) = landmarker.as_deref_mut() {
                            let current = state.snapshot().await;
                            if let Some(report) = engine.step(landmarker, &frame, &current) {
                                state.apply_step(report).await;
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!("Camera stream failed: {}", e);
                        state.set_camera_error(&e.to_string()).await;
                        if let Some(mut cam) = camera.take() {
                            cam.release();
                        }
                    }
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }

    // Teardown: stop rescheduling (the loop above), abort a still-pending
    // load, release the camera and drop the model session. A load future
    // resolving after this point is fenced by the liveness flag.
    if load_pending {
        load_task.abort();
    }
    if let Some(mut cam) = camera.take() {
        cam.release();
    }
    drop(landmarker);
    info!("Tracking pipeline stopped");
    Ok(())
}

/// Await the next frame, or never when the camera is gone.
async fn next_frame(
    camera: &mut Option<CameraCapture>,
) -> Result<Option<VideoFrame>, CameraError> {
    match camera {
        Some(camera) => camera.next_frame().await,
        None => std::future::pending().await,
    }
}

async fn run_http_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let config = state.config.read().await;
    let http_config = config.http.clone();
    drop(config);

    let app = web::create_router(Arc::clone(&state), &http_config);

    let addr = format!("{}:{}", http_config.host, http_config.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let mut shutdown_rx = state.subscribe_shutdown();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

fn list_cameras() {
    use opencv::prelude::*;
    use opencv::videoio::{self, VideoCapture};

    println!("Probing camera devices:\n");

    for index in 0..8 {
        if let Ok(device) = VideoCapture::new(index, videoio::CAP_ANY) {
            if device.is_opened().unwrap_or(false) {
                let width = device.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0);
                let height = device.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0);
                println!("  {} ({}x{})", index, width as i32, height as i32);
            }
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
