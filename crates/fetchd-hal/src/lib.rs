//! `fetchd-hal` – trait seams for the robot's external services.
//!
//! The tracking pipeline never talks to the robot middleware directly; it
//! only ever sees these traits.  The process bootstrap owns the concrete
//! handles and hands `Arc<dyn …>` clones to each component, so drivers can
//! be swapped (real robot, simulation, test stub) without touching the
//! estimation or control logic.
//!
//! # Modules
//!
//! - [`actuator`] – [`ActuatorInterface`][actuator::ActuatorInterface]:
//!   base motion, joint trajectories, pose queries and the safety-relevant
//!   configuration calls (stiffness, collision protection, autonomy state).
//! - [`vision`] – [`VisionService`][vision::VisionService]: angular rays
//!   from image positions, depth frames and video frames.
//! - [`speech`] – [`SpeechService`][speech::SpeechService]: text-to-speech
//!   passthrough.
//! - [`sim`] – recording stub drivers for headless tests and CI.

pub mod actuator;
pub mod sim;
pub mod speech;
pub mod vision;

pub use actuator::{ActuatorInterface, AutonomyState};
pub use speech::SpeechService;
pub use vision::{CameraFrame, CameraId, DepthImage, VisionService};
