//! `fetchd-motion` – validated base navigation and the grasp sequence.
//!
//! # Modules
//!
//! - [`gate`] – [`SafetyGate`]: rule engine rejecting out-of-workspace
//!   targets before dispatch, plus the proximity stop.
//! - [`executor`] – [`MotionExecutor`]: navigation with residual heading
//!   correction, the blocking grasp trajectory, prepare and shutdown
//!   sequences.
//! - [`reach`] – the fixed keyframe table the grasp executes.

pub mod executor;
pub mod gate;
pub mod reach;

pub use executor::{ExecutorState, MotionExecutor};
pub use gate::{DEFAULT_STOP_THRESHOLD, Rule, SafetyGate, WorkspaceBoundsRule};
