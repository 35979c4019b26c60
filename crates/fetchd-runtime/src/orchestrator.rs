//! [`TrackingOrchestrator`] – the detection-to-motion loop.
//!
//! Each tick walks one detection through the full pipeline:
//!
//! 1. **Receive** – next fresh detection from the feed (absent ⇒ skip).
//! 2. **Resolve** – depth + body-frame position via the spatial mapper
//!    (absent ⇒ skip).
//! 3. **Announce** – speak once per category change.
//! 4. **Proximity stop** – halt and skip when already at the object.
//! 5. **Record** – append to the tracked-object history, push a map update.
//! 6. **Approach** – offset the target so the right arm lines up, validate
//!    and navigate; on arrival settle, announce, tilt the head back down and
//!    run the grasp.
//!
//! Every failure path logs and continues; one bad cycle must never take the
//! loop down.  The only exit is the shutdown flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fetchd_feed::DetectionSource;
use fetchd_motion::{MotionExecutor, SafetyGate};
use fetchd_perception::SpatialMapper;
use fetchd_types::{MotionCommand, RobotPose, TrackedObjectRecord};
use tracing::{debug, info, warn};

use crate::announcer::Announcer;
use crate::map_log::MapSink;

/// Tuning constants for the tracking loop.
///
/// The approach offsets are empirical: they park the base slightly short of
/// the object and shifted left so the extended right arm ends up on target.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Forward offset applied to the approach target (metres).
    pub approach_offset_x: f32,
    /// Lateral offset applied to the approach target (metres).
    pub approach_offset_y: f32,
    /// Proximity-stop distance for an in-flight approach (metres).
    pub stop_threshold: f32,
    /// Wait after navigation completes before querying the settled pose.
    pub settle_delay: Duration,
    /// Head tilt restored after arrival, to keep the object in view.
    pub head_tilt_angle: f32,
    pub head_tilt_speed: f32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            approach_offset_x: -0.10,
            approach_offset_y: 0.15,
            stop_threshold: 0.05,
            settle_delay: Duration::from_secs(2),
            head_tilt_angle: 0.3,
            head_tilt_speed: 0.2,
        }
    }
}

/// What one tick of the loop did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No usable detection this cycle.
    NoDetection,
    /// Detection received but depth/position could not be resolved.
    Unresolved,
    /// Already at the object; motion stopped instead of approaching.
    StoppedClose,
    /// Approach was rejected by the gate or navigation failed.
    MoveFailed,
    /// Full approach and grasp sequence completed.
    Reached,
}

pub struct TrackingOrchestrator {
    source: Box<dyn DetectionSource>,
    mapper: SpatialMapper,
    executor: MotionExecutor,
    gate: Arc<SafetyGate>,
    announcer: Announcer,
    map_sink: Box<dyn MapSink>,
    config: OrchestratorConfig,
    objects: Vec<TrackedObjectRecord>,
    robot_path: Vec<RobotPose>,
    targets: Vec<MotionCommand>,
    last_announced: Option<String>,
    shut_down: bool,
}

impl TrackingOrchestrator {
    pub fn new(
        source: Box<dyn DetectionSource>,
        mapper: SpatialMapper,
        executor: MotionExecutor,
        gate: Arc<SafetyGate>,
        announcer: Announcer,
        map_sink: Box<dyn MapSink>,
        config: OrchestratorConfig,
    ) -> Self {
        // Seed the pose history with the start pose so the map has an origin.
        let start_pose = executor.robot_pose().unwrap_or(RobotPose {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        });
        Self {
            source,
            mapper,
            executor,
            gate,
            announcer,
            map_sink,
            config,
            objects: Vec::new(),
            robot_path: vec![start_pose],
            targets: Vec::new(),
            last_announced: None,
            shut_down: false,
        }
    }

    /// Tracked-object history accumulated so far.
    pub fn objects(&self) -> &[TrackedObjectRecord] {
        &self.objects
    }

    /// Run one cycle of the tracking loop.
    pub async fn tick(&mut self) -> TickOutcome {
        let Some(detection) = self.source.receive().await else {
            debug!("no object detected, skipping iteration");
            return TickOutcome::NoDetection;
        };

        let Some((depth, position)) = self.mapper.resolve(&detection) else {
            warn!(category = %detection.category, "could not resolve position, skipping");
            return TickOutcome::Unresolved;
        };
        info!(
            category = %detection.category,
            depth,
            x_forward = position.x_forward,
            y_lateral = position.y_lateral,
            theta = position.theta,
            "object located"
        );

        if self.last_announced.as_deref() != Some(detection.category.as_str()) {
            self.announcer.announce_object(&detection.category);
            self.last_announced = Some(detection.category.clone());
        }

        if self
            .gate
            .stop_if_close(position.x_forward, self.config.stop_threshold)
        {
            return TickOutcome::StoppedClose;
        }

        self.objects
            .push(TrackedObjectRecord::new(&detection.category, position, depth));
        self.map_sink
            .update(&self.objects, &self.robot_path, &self.targets);

        let x = position.x_forward + self.config.approach_offset_x;
        let y = position.y_lateral + self.config.approach_offset_y;
        let theta = position.theta;
        self.targets.push(MotionCommand::new(x, y, theta));
        self.map_sink
            .update(&self.objects, &self.robot_path, &self.targets);

        if !self.executor.move_to_position(x, y, theta) {
            warn!(x, y, theta, "approach failed");
            return TickOutcome::MoveFailed;
        }

        // Let the base settle before trusting the odometry.
        tokio::time::sleep(self.config.settle_delay).await;
        if let Some(pose) = self.executor.robot_pose() {
            self.robot_path.push(pose);
        }
        self.map_sink
            .update(&self.objects, &self.robot_path, &self.targets);

        self.announcer.announce_reaching(&detection.category);
        self.executor
            .tilt_head(self.config.head_tilt_angle, self.config.head_tilt_speed);
        self.executor.reach_for_object();

        // Next sighting of the same category is a new episode.
        self.last_announced = None;
        tokio::time::sleep(self.config.settle_delay).await;
        TickOutcome::Reached
    }

    /// Loop [`tick`][Self::tick] until `shutdown` is set, then clean up.
    pub async fn run(&mut self, shutdown: Arc<AtomicBool>) {
        info!("tracking loop started");
        self.announcer.announce_searching();
        while !shutdown.load(Ordering::SeqCst) {
            self.tick().await;
        }
        self.shutdown();
    }

    /// Release motion resources. Idempotent; the feed socket closes when
    /// the orchestrator is dropped.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.executor.shutdown();
        info!("tracking loop stopped");
    }
}
