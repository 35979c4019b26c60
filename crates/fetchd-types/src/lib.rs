//! `fetchd-types` – shared data model for the tracking pipeline.
//!
//! Every other crate in the workspace depends on these types: the wire-level
//! [`Detection`], the derived [`SpatialPosition`] in the robot body frame,
//! the validated [`MotionCommand`], and the append-only
//! [`TrackedObjectRecord`] history entry consumed by the map-logging
//! collaborator.
//!
//! Body frame convention: `x` = forward, `y` = lateral (left-positive),
//! `theta` = heading in radians, counter-clockwise positive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A single object detection produced by the external vision collaborator.
///
/// Pixel coordinates refer to the wide camera at its fixed 320×240
/// resolution; the producer must resample before sending. `timestamp` is
/// Unix epoch seconds as reported by the detector's clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x_center: f32,
    pub y_center: f32,
    pub category: String,
    pub timestamp: f64,
}

/// A position in the robot body frame, derived from one detection.
///
/// This is a spherical-to-planar approximation (the target is assumed to lie
/// roughly at torso height), not a full 3D reprojection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialPosition {
    /// Distance ahead of the robot (metres).
    pub x_forward: f32,
    /// Lateral offset, left-positive (metres).
    pub y_lateral: f32,
    /// Heading towards the target (radians).
    pub theta: f32,
}

impl SpatialPosition {
    /// Build a body-frame position from an angular ray and a depth reading.
    ///
    /// `theta` is always recomputed as `atan2(y_lateral, x_forward)` so the
    /// heading is consistent with the reported forward/lateral pair.
    pub fn from_depth_and_angles(yaw: f32, pitch: f32, depth: f32) -> Self {
        let x_forward = depth * pitch.cos();
        let y_lateral = depth * yaw.sin();
        Self {
            x_forward,
            y_lateral,
            theta: y_lateral.atan2(x_forward),
        }
    }
}

/// The robot's own odometric pose, queried from the actuator interface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotPose {
    pub x: f32,
    pub y: f32,
    pub theta: f32,
}

/// A candidate base motion. Validated as a whole before dispatch – either
/// fully rejected or fully issued, never partially applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    pub x: f32,
    pub y: f32,
    pub theta: f32,
    pub speed: f32,
}

impl MotionCommand {
    /// A command at the default dispatch speed.
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta,
            speed: 0.5,
        }
    }
}

/// One entry of the append-only tracked-object history handed to the
/// map-logging collaborator. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObjectRecord {
    pub id: Uuid,
    pub category: String,
    pub x_forward: f32,
    pub y_lateral: f32,
    pub theta: f32,
    /// Robust depth estimate at detection time (metres).
    pub depth: f32,
    pub recorded_at: DateTime<Utc>,
}

impl TrackedObjectRecord {
    /// Build a record from a resolved position and its depth estimate.
    pub fn new(category: impl Into<String>, position: SpatialPosition, depth: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            x_forward: position.x_forward,
            y_lateral: position.y_lateral,
            theta: position.theta,
            depth,
            recorded_at: Utc::now(),
        }
    }
}

/// Coarse movement state reported by the actuator interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveStatus {
    Moving,
    Stopped,
}

/// Error taxonomy spanning the whole pipeline.
///
/// Transient sensor absence (no detection, no depth, stale timestamp) is
/// deliberately *not* an error – those paths return `Option::None` and the
/// next loop iteration retries naturally.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FetchError {
    /// An external service call failed at the operation boundary.
    #[error("Hardware fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    /// A candidate command violated a workspace bound. Rejected, not clamped.
    #[error("{axis} = {value} outside workspace bounds")]
    OutOfBounds { axis: String, value: f32 },

    /// The calibration artifact could not be read or parsed.
    #[error("Calibration error: {0}")]
    Calibration(String),

    /// An inbound detection payload could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}
