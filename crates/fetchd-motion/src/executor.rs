//! [`MotionExecutor`] – base navigation and the arm grasp sequence.
//!
//! Every actuator call is caught at the boundary: a hardware fault becomes
//! that operation's failure (`false` or a skipped step) and is logged, never
//! propagated.  The tracking loop must survive any single faulty motion.

use std::f32::consts::PI;
use std::sync::Arc;

use fetchd_hal::{ActuatorInterface, AutonomyState};
use fetchd_types::{MoveStatus, RobotPose};
use tracing::{debug, info, warn};

use crate::gate::SafetyGate;
use crate::reach::{REACH_JOINTS, reach_keyframes, reach_times};

/// Default head tilt for looking down at the floor in front of the robot.
pub const HEAD_TILT_ANGLE: f32 = 0.3;
pub const HEAD_TILT_SPEED: f32 = 0.2;

/// Preparatory hip-roll weight shift before the grasp trajectory (radians).
const HIP_ROLL_SHIFT: f32 = 0.02;
/// Shoulder settle angle issued after the grasp trajectory completes.
const SHOULDER_SETTLE: f32 = 0.3;

/// Coarse motion state, for logging and status queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    Navigating,
    Reaching,
}

/// Drives the robot base and arm through the actuator interface, with every
/// candidate base motion passing the [`SafetyGate`] first.
pub struct MotionExecutor {
    actuator: Arc<dyn ActuatorInterface>,
    gate: Arc<SafetyGate>,
    state: ExecutorState,
    shut_down: bool,
}

impl MotionExecutor {
    pub fn new(actuator: Arc<dyn ActuatorInterface>, gate: Arc<SafetyGate>) -> Self {
        Self {
            actuator,
            gate,
            state: ExecutorState::Idle,
            shut_down: false,
        }
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// One-time setup before tracking starts: full-body stiffness, arm
    /// collision protection off so the grasp can extend fully, head tilted
    /// down towards the floor.  Each step is fail-soft.
    pub fn prepare(&mut self) {
        if let Err(e) = self.actuator.set_stiffness("Body", 1.0) {
            warn!(error = %e, "body stiffness setup failed");
        }
        if let Err(e) = self.actuator.set_collision_protection("Arms", false) {
            warn!(error = %e, "disabling arm collision protection failed");
        }
        if let Err(e) = self.actuator.set_autonomous_state(AutonomyState::Disabled) {
            warn!(error = %e, "disabling autonomous behaviours failed");
        }
        self.tilt_head(HEAD_TILT_ANGLE, HEAD_TILT_SPEED);
        info!("motion executor prepared");
    }

    /// Navigate the base to `(x, y)` and face heading `theta`.
    ///
    /// The target is validated against the safety gate first; a rejected
    /// target is never dispatched.  On successful navigation the executor
    /// queries the odometric pose and issues one in-place rotation for the
    /// residual heading error.  Returns `true` only when navigation
    /// succeeded.
    pub fn move_to_position(&mut self, x: f32, y: f32, theta: f32) -> bool {
        if !self.gate.validate(x, y, theta) {
            return false;
        }

        self.state = ExecutorState::Navigating;
        info!(x, y, theta, "navigating to target");

        let navigated = match self.actuator.navigate_to(x, y) {
            Ok(reached) => reached,
            Err(e) => {
                warn!(error = %e, "navigation call failed");
                false
            }
        };

        if navigated {
            info!("navigation successful");
            match self.actuator.robot_pose() {
                Ok(pose) => {
                    let residual = normalize_angle(theta - pose.theta);
                    debug!(residual, "correcting residual heading");
                    if let Err(e) = self.actuator.move_to(0.0, 0.0, residual) {
                        warn!(error = %e, "heading correction failed");
                    }
                }
                Err(e) => warn!(error = %e, "pose query failed, skipping heading correction"),
            }
        } else {
            info!("navigation failed");
        }

        self.state = ExecutorState::Idle;
        navigated
    }

    /// Execute the fixed grasp trajectory as one blocking motion.
    ///
    /// Stiffens the involved chains, shifts weight slightly onto the hip,
    /// then runs the keyframe table and settles the shoulder.  Any actuator
    /// fault aborts the sequence and returns `false`.
    pub fn reach_for_object(&mut self) -> bool {
        self.state = ExecutorState::Reaching;
        info!("starting arm grab sequence");

        let result = self.run_reach_sequence();
        if let Err(e) = &result {
            warn!(error = %e, "arm grab sequence failed");
        } else {
            info!("completed arm grab sequence");
        }

        self.state = ExecutorState::Idle;
        result.is_ok()
    }

    fn run_reach_sequence(&self) -> Result<(), fetchd_types::FetchError> {
        self.actuator.set_stiffness("RArm", 1.0)?;
        self.actuator.set_stiffness("Hip", 1.0)?;
        self.actuator.set_stiffness("Head", 0.8)?;

        // Weight shift so the lean during the reach stays balanced.
        self.actuator
            .set_joint_angles(&["HipRoll"], &[HIP_ROLL_SHIFT], 0.1)?;

        self.actuator
            .angle_interpolation(&REACH_JOINTS, &reach_keyframes(), &reach_times(), true)?;

        self.actuator
            .set_joint_angles(&["RShoulderPitch"], &[SHOULDER_SETTLE], 0.2)?;
        Ok(())
    }

    /// Tilt the head down (positive pitch) and centre the yaw. Fail-soft.
    pub fn tilt_head(&self, angle: f32, speed: f32) {
        if let Err(e) = self
            .actuator
            .set_joint_angles(&["HeadPitch", "HeadYaw"], &[angle, 0.0], speed)
        {
            warn!(error = %e, "head tilt failed");
        } else {
            debug!(angle, "tilted head");
        }
    }

    /// Current odometric pose, or `None` on a faulted query.
    pub fn robot_pose(&self) -> Option<RobotPose> {
        match self.actuator.robot_pose() {
            Ok(pose) => Some(pose),
            Err(e) => {
                warn!(error = %e, "pose query failed");
                None
            }
        }
    }

    /// Whether the base is currently in motion. A faulted status query
    /// reports `false`.
    pub fn is_moving(&self) -> bool {
        match self.actuator.move_status() {
            Ok(status) => status == MoveStatus::Moving,
            Err(e) => {
                warn!(error = %e, "move status query failed");
                false
            }
        }
    }

    /// Restore the robot to its resting configuration. Idempotent: repeat
    /// calls are no-ops.  Each step is fail-soft so a faulted `stop_move`
    /// still lets collision protection and autonomy be restored.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Err(e) = self.actuator.stop_move() {
            warn!(error = %e, "stop during shutdown failed");
        }
        if let Err(e) = self.actuator.set_collision_protection("Arms", true) {
            warn!(error = %e, "restoring arm collision protection failed");
        }
        if let Err(e) = self.actuator.set_autonomous_state(AutonomyState::Solitary) {
            warn!(error = %e, "restoring autonomous state failed");
        }
        info!("motion resources cleaned up");
    }
}

/// Normalise an angle into `(−π, π]`.
fn normalize_angle(mut angle: f32) -> f32 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchd_hal::sim::{ActuatorCall, SimActuator};

    fn executor() -> (Arc<SimActuator>, MotionExecutor) {
        let actuator = Arc::new(SimActuator::new());
        let gate = Arc::new(SafetyGate::new(actuator.clone()));
        let executor = MotionExecutor::new(actuator.clone(), gate);
        (actuator, executor)
    }

    #[test]
    fn successful_navigation_corrects_heading() {
        let (actuator, mut executor) = executor();
        assert!(executor.move_to_position(1.5, 0.2, 0.4));

        let calls = actuator.calls();
        assert_eq!(calls[0], ActuatorCall::NavigateTo { x: 1.5, y: 0.2 });
        // Sim pose keeps theta 0 after navigation, so the full target
        // heading is issued as the residual rotation.
        match calls[1] {
            ActuatorCall::MoveTo { x, y, theta } => {
                assert_eq!(x, 0.0);
                assert_eq!(y, 0.0);
                assert!((theta - 0.4).abs() < 1e-6);
            }
            ref other => panic!("expected MoveTo, got {other:?}"),
        }
        assert_eq!(executor.state(), ExecutorState::Idle);
    }

    #[test]
    fn out_of_bounds_target_never_reaches_actuator() {
        let (actuator, mut executor) = executor();
        assert!(!executor.move_to_position(5.0, 0.0, 0.0));
        assert!(actuator.calls().is_empty());
    }

    #[test]
    fn failed_navigation_skips_heading_correction() {
        let (actuator, mut executor) = executor();
        actuator.set_navigation_result(false);
        assert!(!executor.move_to_position(1.0, 0.0, 0.3));
        assert_eq!(actuator.navigation_targets(), vec![(1.0, 0.0)]);
        assert!(
            !actuator
                .calls()
                .iter()
                .any(|c| matches!(c, ActuatorCall::MoveTo { .. }))
        );
    }

    #[test]
    fn actuator_fault_reports_navigation_failure() {
        let (actuator, mut executor) = executor();
        actuator.set_fail_all(true);
        assert!(!executor.move_to_position(1.0, 0.0, 0.0));
        assert_eq!(executor.state(), ExecutorState::Idle);
    }

    #[test]
    fn reach_sequence_runs_in_order() {
        let (actuator, mut executor) = executor();
        assert!(executor.reach_for_object());

        let calls = actuator.calls();
        assert_eq!(
            calls[0],
            ActuatorCall::SetStiffness {
                chain: "RArm".to_string(),
                level: 1.0
            }
        );
        assert!(matches!(
            calls[3],
            ActuatorCall::SetJointAngles { .. } // hip-roll weight shift
        ));
        assert_eq!(
            calls[4],
            ActuatorCall::AngleInterpolation {
                joints: REACH_JOINTS.len(),
                blocking: true
            }
        );
        assert!(matches!(
            calls[5],
            ActuatorCall::SetJointAngles { .. } // shoulder settle
        ));
    }

    #[test]
    fn reach_fault_reports_failure() {
        let (actuator, mut executor) = executor();
        actuator.set_fail_all(true);
        assert!(!executor.reach_for_object());
        assert_eq!(executor.state(), ExecutorState::Idle);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let (actuator, mut executor) = executor();
        executor.shutdown();
        let count = actuator.calls().len();
        executor.shutdown();
        executor.shutdown();
        assert_eq!(actuator.calls().len(), count);
        assert_eq!(actuator.stop_count(), 1);
    }

    #[test]
    fn shutdown_steps_survive_stop_fault() {
        let (actuator, mut executor) = executor();
        actuator.set_fail_all(true);
        executor.shutdown();
        // All steps faulted, but the guard is set: a later non-faulty call
        // window must not re-run the sequence.
        actuator.set_fail_all(false);
        executor.shutdown();
        assert_eq!(actuator.stop_count(), 0);
    }

    #[test]
    fn normalize_angle_wraps_into_half_open_range() {
        assert!((normalize_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-6);
        assert!((normalize_angle(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-6);
        assert!((normalize_angle(PI) - PI).abs() < 1e-6);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-6);
    }

    #[test]
    fn prepare_disables_protection_and_tilts_head() {
        let (actuator, mut executor) = executor();
        executor.prepare();
        let calls = actuator.calls();
        assert!(calls.contains(&ActuatorCall::SetCollisionProtection {
            group: "Arms".to_string(),
            enabled: false
        }));
        assert!(calls.contains(&ActuatorCall::SetAutonomousState(AutonomyState::Disabled)));
        assert!(
            calls
                .iter()
                .any(|c| matches!(c, ActuatorCall::SetJointAngles { names, .. } if names[0] == "HeadPitch"))
        );
    }
}
