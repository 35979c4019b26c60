//! `ActuatorInterface` trait for the robot's base and joint motion services.
//!
//! The method set mirrors the middleware calls the motion executor needs:
//! relative base motion, assisted navigation, joint-angle control, keyframe
//! interpolation, pose queries, and the configuration calls the
//! prepare/cleanup sequences flip (stiffness, collision protection,
//! autonomy state).

use fetchd_types::{FetchError, MoveStatus, RobotPose};

/// Autonomy states the robot can be placed in. The pipeline disables
/// autonomous behaviours while tracking and restores them on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutonomyState {
    Disabled,
    Solitary,
}

/// The robot's actuation interface.
///
/// All methods take `&self`: handles are process-wide and shared between the
/// tracking loop and the shutdown path, so implementations use interior
/// mutability where they need state.
///
/// # Errors
///
/// Every method returns [`FetchError::HardwareFault`] when the underlying
/// service call fails. Callers treat that as the operation's failure and
/// continue – a fault must never abort the tracking loop.
pub trait ActuatorInterface: Send + Sync {
    /// Relative base motion: move `x` forward, `y` lateral, rotate `theta`.
    fn move_to(&self, x: f32, y: f32, theta: f32) -> Result<(), FetchError>;

    /// Assisted navigation towards `(x, y)`. Returns `false` when the
    /// navigation engine gives up (obstacle, no free path).
    fn navigate_to(&self, x: f32, y: f32) -> Result<bool, FetchError>;

    /// Command the named joints to the given angles at `speed` (0–1).
    fn set_joint_angles(&self, names: &[&str], angles: &[f32], speed: f32)
    -> Result<(), FetchError>;

    /// Execute a keyframe trajectory as one interpolated motion.
    ///
    /// `keyframes[i]` and `times[i]` belong to `names[i]`; `blocking` makes
    /// the call return only once the trajectory completes.
    fn angle_interpolation(
        &self,
        names: &[&str],
        keyframes: &[Vec<f32>],
        times: &[Vec<f32>],
        blocking: bool,
    ) -> Result<(), FetchError>;

    /// The robot's current odometric pose.
    fn robot_pose(&self) -> Result<RobotPose, FetchError>;

    /// Immediately stop any in-flight base motion.
    fn stop_move(&self) -> Result<(), FetchError>;

    /// Coarse movement status.
    fn move_status(&self) -> Result<MoveStatus, FetchError>;

    /// Set joint stiffness for a named chain (e.g. `"Body"`, `"RArm"`).
    fn set_stiffness(&self, chain: &str, level: f32) -> Result<(), FetchError>;

    /// Enable or disable external collision protection for a body group.
    fn set_collision_protection(&self, group: &str, enabled: bool) -> Result<(), FetchError>;

    /// Switch the robot's autonomy state.
    fn set_autonomous_state(&self, state: AutonomyState) -> Result<(), FetchError>;
}
