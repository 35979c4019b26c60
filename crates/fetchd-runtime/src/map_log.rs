//! Fire-and-forget map logging.
//!
//! After each tracked detection the orchestrator hands the accumulated
//! histories to a [`MapSink`].  The rendering collaborator consumes the
//! artifact offline; the tracking loop never waits on it and never fails
//! because of it.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fetchd_types::{MotionCommand, RobotPose, TrackedObjectRecord};
use serde::Serialize;
use tracing::{debug, warn};

/// Receiver for map updates. Implementations must swallow their own errors.
pub trait MapSink: Send + Sync {
    fn update(
        &self,
        records: &[TrackedObjectRecord],
        robot_poses: &[RobotPose],
        target_poses: &[MotionCommand],
    );
}

#[derive(Serialize)]
struct MapSnapshot<'a> {
    written_at: DateTime<Utc>,
    objects: &'a [TrackedObjectRecord],
    robot_path: &'a [RobotPose],
    targets: &'a [MotionCommand],
}

/// Appends one JSON document per update to a file.
pub struct JsonlMapSink {
    path: PathBuf,
}

impl JsonlMapSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MapSink for JsonlMapSink {
    fn update(
        &self,
        records: &[TrackedObjectRecord],
        robot_poses: &[RobotPose],
        target_poses: &[MotionCommand],
    ) {
        let snapshot = MapSnapshot {
            written_at: Utc::now(),
            objects: records,
            robot_path: robot_poses,
            targets: target_poses,
        };
        let line = match serde_json::to_string(&snapshot) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "map snapshot serialisation failed");
                return;
            }
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{line}"));
        match result {
            Ok(()) => debug!(path = %self.path.display(), objects = records.len(), "map updated"),
            Err(e) => warn!(error = %e, path = %self.path.display(), "map write failed"),
        }
    }
}

/// Discards every update. For tests and map-less deployments.
pub struct NullMapSink;

impl MapSink for NullMapSink {
    fn update(&self, _: &[TrackedObjectRecord], _: &[RobotPose], _: &[MotionCommand]) {}
}
