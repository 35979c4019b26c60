//! In-process simulation drivers for headless testing without a robot.
//!
//! Each stub records every call it receives and returns plausible kinematic
//! state, so the full tracking stack can run in unit tests and CI.  Failure
//! paths are scriptable: flip [`SimActuator::set_fail_all`] to make every
//! actuator call return a hardware fault, or
//! [`SimActuator::set_navigation_result`] to script navigation outcomes.

use std::sync::Mutex;

use fetchd_types::{FetchError, MoveStatus, RobotPose};
use tracing::trace;

use crate::actuator::{ActuatorInterface, AutonomyState};
use crate::speech::SpeechService;
use crate::vision::{CameraFrame, CameraId, DepthImage, VisionService};

// ────────────────────────────────────────────────────────────────────────────
// Sim actuator
// ────────────────────────────────────────────────────────────────────────────

/// One recorded actuator invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    MoveTo { x: f32, y: f32, theta: f32 },
    NavigateTo { x: f32, y: f32 },
    SetJointAngles { names: Vec<String>, speed: f32 },
    AngleInterpolation { joints: usize, blocking: bool },
    StopMove,
    SetStiffness { chain: String, level: f32 },
    SetCollisionProtection { group: String, enabled: bool },
    SetAutonomousState(AutonomyState),
}

struct SimActuatorState {
    pose: RobotPose,
    navigation_succeeds: bool,
    fail_all: bool,
    moving: bool,
    calls: Vec<ActuatorCall>,
}

/// A simulated actuator that records commands and integrates a crude pose.
///
/// `navigate_to` teleports the pose to the target on success; `move_to`
/// applies the command as a relative offset.
pub struct SimActuator {
    inner: Mutex<SimActuatorState>,
}

impl Default for SimActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimActuator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SimActuatorState {
                pose: RobotPose {
                    x: 0.0,
                    y: 0.0,
                    theta: 0.0,
                },
                navigation_succeeds: true,
                fail_all: false,
                moving: false,
                calls: Vec::new(),
            }),
        }
    }

    /// Script the outcome of subsequent `navigate_to` calls.
    pub fn set_navigation_result(&self, succeeds: bool) {
        self.inner.lock().unwrap().navigation_succeeds = succeeds;
    }

    /// When set, every call returns [`FetchError::HardwareFault`].
    pub fn set_fail_all(&self, fail: bool) {
        self.inner.lock().unwrap().fail_all = fail;
    }

    /// Override the simulated odometric pose.
    pub fn set_pose(&self, pose: RobotPose) {
        self.inner.lock().unwrap().pose = pose;
    }

    /// Snapshot of every call received so far, in order.
    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of `stop_move` calls received.
    pub fn stop_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::StopMove))
            .count()
    }

    /// The recorded `navigate_to` targets.
    pub fn navigation_targets(&self) -> Vec<(f32, f32)> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::NavigateTo { x, y } => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    fn fault(details: &str) -> FetchError {
        FetchError::HardwareFault {
            component: "sim_actuator".to_string(),
            details: details.to_string(),
        }
    }

    fn record(&self, call: ActuatorCall) -> Result<std::sync::MutexGuard<'_, SimActuatorState>, FetchError> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_all {
            return Err(Self::fault("scripted fault"));
        }
        trace!(?call, "sim actuator call");
        state.calls.push(call);
        Ok(state)
    }
}

impl ActuatorInterface for SimActuator {
    fn move_to(&self, x: f32, y: f32, theta: f32) -> Result<(), FetchError> {
        let mut state = self.record(ActuatorCall::MoveTo { x, y, theta })?;
        state.pose.x += x;
        state.pose.y += y;
        state.pose.theta += theta;
        Ok(())
    }

    fn navigate_to(&self, x: f32, y: f32) -> Result<bool, FetchError> {
        let mut state = self.record(ActuatorCall::NavigateTo { x, y })?;
        if state.navigation_succeeds {
            state.pose.x = x;
            state.pose.y = y;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn set_joint_angles(
        &self,
        names: &[&str],
        _angles: &[f32],
        speed: f32,
    ) -> Result<(), FetchError> {
        self.record(ActuatorCall::SetJointAngles {
            names: names.iter().map(|n| n.to_string()).collect(),
            speed,
        })?;
        Ok(())
    }

    fn angle_interpolation(
        &self,
        names: &[&str],
        keyframes: &[Vec<f32>],
        times: &[Vec<f32>],
        blocking: bool,
    ) -> Result<(), FetchError> {
        if names.len() != keyframes.len() || names.len() != times.len() {
            return Err(Self::fault("keyframe table shape mismatch"));
        }
        self.record(ActuatorCall::AngleInterpolation {
            joints: names.len(),
            blocking,
        })?;
        Ok(())
    }

    fn robot_pose(&self) -> Result<RobotPose, FetchError> {
        let state = self.inner.lock().unwrap();
        if state.fail_all {
            return Err(Self::fault("scripted fault"));
        }
        Ok(state.pose)
    }

    fn stop_move(&self) -> Result<(), FetchError> {
        let mut state = self.record(ActuatorCall::StopMove)?;
        state.moving = false;
        Ok(())
    }

    fn move_status(&self) -> Result<MoveStatus, FetchError> {
        let state = self.inner.lock().unwrap();
        if state.fail_all {
            return Err(Self::fault("scripted fault"));
        }
        Ok(if state.moving {
            MoveStatus::Moving
        } else {
            MoveStatus::Stopped
        })
    }

    fn set_stiffness(&self, chain: &str, level: f32) -> Result<(), FetchError> {
        self.record(ActuatorCall::SetStiffness {
            chain: chain.to_string(),
            level,
        })?;
        Ok(())
    }

    fn set_collision_protection(&self, group: &str, enabled: bool) -> Result<(), FetchError> {
        self.record(ActuatorCall::SetCollisionProtection {
            group: group.to_string(),
            enabled,
        })?;
        Ok(())
    }

    fn set_autonomous_state(&self, state: AutonomyState) -> Result<(), FetchError> {
        self.record(ActuatorCall::SetAutonomousState(state))?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sim vision
// ────────────────────────────────────────────────────────────────────────────

/// Wide-camera field of view used by the simulated angular mapping (radians).
const SIM_HFOV: f32 = 0.9983; // 57.2°
const SIM_VFOV: f32 = 0.7732; // 44.3°

/// A simulated vision service with a settable depth frame and a pinhole-style
/// angular mapping: image center maps to a zero ray, left/up positive yaw.
pub struct SimVision {
    depth: Mutex<Option<DepthImage>>,
}

impl Default for SimVision {
    fn default() -> Self {
        Self::new()
    }
}

impl SimVision {
    pub fn new() -> Self {
        Self {
            depth: Mutex::new(Some(DepthImage::constant(320, 240, 1200))),
        }
    }

    /// Replace the frame returned by `depth_image`. `None` makes the call
    /// fail, simulating a dropped sensor.
    pub fn set_depth_image(&self, image: Option<DepthImage>) {
        *self.depth.lock().unwrap() = image;
    }
}

impl VisionService for SimVision {
    fn angular_position(
        &self,
        _camera: CameraId,
        norm_x: f32,
        norm_y: f32,
    ) -> Result<(f32, f32), FetchError> {
        let yaw = (0.5 - norm_x) * SIM_HFOV;
        let pitch = (norm_y - 0.5) * SIM_VFOV;
        Ok((yaw, pitch))
    }

    fn depth_image(&self) -> Result<DepthImage, FetchError> {
        self.depth
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FetchError::HardwareFault {
                component: "sim_vision".to_string(),
                details: "no depth frame available".to_string(),
            })
    }

    fn video_frame(&self) -> Result<CameraFrame, FetchError> {
        Ok(CameraFrame {
            width: 320,
            height: 240,
            data: vec![0u8; 320 * 240 * 3],
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sim speech
// ────────────────────────────────────────────────────────────────────────────

/// A simulated speech engine that collects every phrase.
#[derive(Default)]
pub struct SimSpeech {
    phrases: Mutex<Vec<String>>,
}

impl SimSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every phrase spoken so far, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.phrases.lock().unwrap().clone()
    }
}

impl SpeechService for SimSpeech {
    fn say(&self, text: &str) -> Result<(), FetchError> {
        self.phrases.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
