mod http;
mod output;
mod source;

use anyhow::Result;
use api::{CalibrationEvent, LandmarkSource};
use common::{GazeTracker, TrackerConfig};
use common::profile::ProfileStore;
use http::{ControlRequest, TrackerStatus};
use log::{debug, error, info, warn};
use output::Dispatcher;
use source::UdpLandmarkSource;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

fn load_config(path: &Path) -> Result<TrackerConfig> {
    if path.exists() {
        info!("Loading config from {:?}", path);
        let file = fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    } else {
        info!("Config not found. Creating default at {:?}", path);
        let config = TrackerConfig::default();
        let file = fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &config)?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    info!("Starting gazed...");

    let config_path = Path::new("config.json");
    let config = load_config(config_path).unwrap_or_else(|e| {
        error!("Failed to load config: {}. Using defaults.", e);
        TrackerConfig::default()
    });
    debug!("Loaded config: {:?}", config);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received Ctrl-C, shutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let mut tracker = GazeTracker::new(
        config.clone(),
        config.screen.width,
        config.screen.height,
    );

    let profile_store = ProfileStore::new(PathBuf::from("."));
    match profile_store.load() {
        Ok(Some(profile)) => {
            tracker.apply_profile(&profile);
            info!(
                "Applied saved profile (baseline: {:?}, calibrated: {})",
                profile.ear_baseline,
                tracker.is_calibrated()
            );
        }
        Ok(None) => info!("No saved profile; starting fresh."),
        Err(e) => warn!("Could not load profile: {}", e),
    }

    let mut landmark_source = UdpLandmarkSource::new(config.io.listen_port);
    landmark_source.initialize()?;

    let mut dispatcher = Dispatcher::new(&config.io);
    if let Err(e) = dispatcher.initialize() {
        error!("Failed to initialize output: {}", e);
        return Err(e);
    }
    info!("Output initialized with {:?} mode.", config.io.output_mode);

    let status = Arc::new(RwLock::new(TrackerStatus::default()));
    let control_request = Arc::new(RwLock::new(None::<ControlRequest>));

    let status_for_http = status.clone();
    let request_for_http = control_request.clone();
    let http_port = config.io.http_port;
    thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
        rt.block_on(async {
            let router = http::get_router(status_for_http, request_for_http);
            let addr = format!("0.0.0.0:{}", http_port);
            match tokio::net::TcpListener::bind(&addr).await {
                Ok(listener) => {
                    info!("Control server listening on {}", addr);
                    if let Err(e) = axum::serve(listener, router).await {
                        error!("Control server failed: {}", e);
                    }
                }
                Err(e) => error!("Failed to bind control server on {}: {}", addr, e),
            }
        });
    });

    info!("Entering frame loop...");

    let mut frame_count: u64 = 0;
    let mut log_interval: u64 = 1000;
    let mut last_log = std::time::Instant::now();

    while running.load(Ordering::SeqCst) {
        if let Ok(mut req) = control_request.write() {
            match req.take() {
                Some(ControlRequest::StartCalibration) => {
                    info!("Starting calibration from HTTP request");
                    tracker.start_calibration();
                }
                Some(ControlRequest::AbortCalibration) => {
                    info!("Aborting calibration from HTTP request");
                    tracker.abort_calibration();
                }
                Some(ControlRequest::Resize { width, height }) => {
                    tracker.set_screen_size(width, height);
                }
                None => {}
            }
        }

        let sample = match landmark_source.poll() {
            Ok(sample) => sample,
            Err(e) => {
                error!("Landmark source failed: {}", e);
                break;
            }
        };

        let Some(sample) = sample else {
            thread::sleep(Duration::from_millis(2));
            continue;
        };

        let out = tracker.process(&sample);

        if let Err(e) = dispatcher.send(&out) {
            error!("Failed to send output: {}", e);
        }

        if out.calibration == Some(CalibrationEvent::Finished { success: true }) {
            info!("Calibration finished; saving profile.");
            if let Err(e) = profile_store.save(&tracker.profile()) {
                error!("Failed to save profile: {}", e);
            }
        }

        if let Ok(mut st) = status.write() {
            st.calibrated = out.calibrated;
            st.calibrating = tracker.is_calibrating();
            st.active_point = tracker.active_calibration_point();
            st.ear_baseline = tracker.ear_baseline();
            st.frames_processed = frame_count;
        }

        frame_count += 1;
        if frame_count.is_multiple_of(log_interval) {
            let elapsed = last_log.elapsed().as_secs_f32();
            let fps = log_interval as f32 / elapsed;
            info!(
                "Tracking active: processed {} frames (approx {:.1} FPS)",
                frame_count, fps
            );
            last_log = std::time::Instant::now();

            if frame_count >= 100_000 {
                log_interval = 100_000;
            } else if frame_count >= 10_000 {
                log_interval = 10_000;
            }
        }
    }

    info!("Shutting down...");
    landmark_source.unload();
    Ok(())
}
