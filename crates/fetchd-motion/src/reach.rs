//! Fixed grasp trajectory for the right arm.
//!
//! The reach is open-loop: a hand-tuned keyframe table executed as one
//! blocking interpolated motion, with no visual feedback during execution.
//! Angles are radians; the time axis is shared by every joint.

/// Joints driven by the grasp trajectory, in table order.
pub const REACH_JOINTS: [&str; 10] = [
    "RShoulderPitch",
    "RShoulderRoll",
    "RElbowYaw",
    "RElbowRoll",
    "RWristYaw",
    "RHand",
    "HipPitch",
    "HipRoll",
    "HeadPitch",
    "HeadYaw",
];

/// Keyframe timestamps in seconds, identical for every joint.
pub const REACH_TIMES: [f32; 8] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];

/// Per-joint angle keyframes, row order matching [`REACH_JOINTS`].
pub const REACH_KEYS: [[f32; 8]; 10] = [
    // RShoulderPitch
    [1.4, 0.5, 0.2, -0.12, -0.2, -0.12, 0.1, 0.4],
    // RShoulderRoll
    [-0.15, -0.2, -0.15, -0.1, -0.08, -0.08, -0.1, -0.15],
    // RElbowYaw
    [1.5, 1.5, 1.3, 1.1, 1.0, 1.0, 1.2, 1.5],
    // RElbowRoll
    [0.3, 0.5, 0.6, 0.5, 0.4, 0.45, 0.6, 0.5],
    // RWristYaw
    [0.0, 0.2, 0.3, 0.4, 0.6, 0.6, 0.4, 0.2],
    // RHand
    [0.6, 0.8, 0.9, 0.8, 0.0, 0.0, 0.0, 0.0],
    // HipPitch
    [-0.05, -0.1, -0.25, -0.5, -0.65, -0.62, -0.3, -0.1],
    // HipRoll
    [0.0, -0.02, -0.03, -0.04, -0.04, -0.03, -0.02, 0.0],
    // HeadPitch
    [0.0, -0.1, -0.2, -0.3, -0.35, -0.35, -0.2, 0.0],
    // HeadYaw
    [0.0, 0.1, 0.15, 0.2, 0.2, 0.2, 0.1, 0.0],
];

/// Keyframe table in the owned shape the actuator interface takes.
pub fn reach_keyframes() -> Vec<Vec<f32>> {
    REACH_KEYS.iter().map(|row| row.to_vec()).collect()
}

/// Shared time axis replicated per joint.
pub fn reach_times() -> Vec<Vec<f32>> {
    vec![REACH_TIMES.to_vec(); REACH_JOINTS.len()]
}
