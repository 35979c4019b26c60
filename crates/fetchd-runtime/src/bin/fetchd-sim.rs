//! Headless rehearsal binary: the full tracking loop against the sim HAL
//! drivers, fed by a real UDP socket.
//!
//! Point a detector (or `netcat`) at the bind address and watch the loop
//! run without a robot:
//!
//! ```text
//! FETCHD_BIND=127.0.0.1:9090 fetchd-sim
//! echo "160,120,bottle,$(date +%s)" | nc -u -w0 127.0.0.1 9090
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fetchd_feed::DetectionFeed;
use fetchd_hal::sim::{SimActuator, SimSpeech, SimVision};
use fetchd_motion::{MotionExecutor, SafetyGate};
use fetchd_perception::{DepthSampler, SpatialMapper};
use fetchd_runtime::{
    Announcer, JsonlMapSink, OrchestratorConfig, TrackingOrchestrator, telemetry,
};
use fetchd_types::FetchError;
use tracing::info;

const DEFAULT_BIND: &str = "127.0.0.1:9090";
const DEFAULT_CALIBRATION: &str = "camera_transformation.json";
const DEFAULT_MAP_LOG: &str = "robot_map.jsonl";

#[tokio::main]
async fn main() -> Result<(), FetchError> {
    telemetry::init_tracing();

    let bind = std::env::var("FETCHD_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let calibration_path =
        std::env::var("FETCHD_CALIBRATION").unwrap_or_else(|_| DEFAULT_CALIBRATION.to_string());
    let map_path = std::env::var("FETCHD_MAP_LOG").unwrap_or_else(|_| DEFAULT_MAP_LOG.to_string());

    let feed = DetectionFeed::bind(bind.as_str()).await?;

    let actuator = Arc::new(SimActuator::new());
    let vision = Arc::new(SimVision::new());
    let speech = Arc::new(SimSpeech::new());

    let calibration = fetchd_calib::load(&calibration_path);
    let mapper = SpatialMapper::new(vision, calibration, DepthSampler::default());

    let gate = Arc::new(SafetyGate::new(actuator.clone()));
    let mut executor = MotionExecutor::new(actuator, gate.clone());
    executor.prepare();

    let mut orchestrator = TrackingOrchestrator::new(
        Box::new(feed),
        mapper,
        executor,
        gate,
        Announcer::new(speech),
        Box::new(JsonlMapSink::new(&map_path)),
        OrchestratorConfig::default(),
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    orchestrator.run(shutdown).await;
    Ok(())
}
