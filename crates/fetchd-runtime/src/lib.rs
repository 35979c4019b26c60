//! `fetchd-runtime` – process wiring for the tracking pipeline.
//!
//! # Modules
//!
//! - [`orchestrator`] – [`TrackingOrchestrator`]: the per-detection loop
//!   from feed receive through approach and grasp.
//! - [`map_log`] – [`MapSink`][map_log::MapSink]: fire-and-forget history
//!   snapshots for the offline map renderer.
//! - [`announcer`] – the pipeline's spoken status phrases.
//! - [`telemetry`] – `tracing` subscriber setup.

pub mod announcer;
pub mod map_log;
pub mod orchestrator;
pub mod telemetry;

pub use announcer::Announcer;
pub use map_log::{JsonlMapSink, MapSink, NullMapSink};
pub use orchestrator::{OrchestratorConfig, TickOutcome, TrackingOrchestrator};
