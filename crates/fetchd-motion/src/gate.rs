//! [`SafetyGate`] – workspace safety interlock / rule engine.
//!
//! Before a base motion is dispatched to the actuator, pass it through
//! [`SafetyGate::validate`].  Every registered [`Rule`] is evaluated in
//! order; the first violation logs a warning and the command is **not**
//! executed.  Commands are rejected whole, never clamped into range.
//!
//! One built-in rule is provided:
//! - [`WorkspaceBoundsRule`] – rejects commands whose target falls outside
//!   the rectangular workspace around the robot's start pose.

use std::sync::Arc;

use fetchd_hal::ActuatorInterface;
use fetchd_types::{FetchError, MotionCommand};
use tracing::{info, warn};

/// Distance at or below which the gate stops an in-flight approach (metres).
pub const DEFAULT_STOP_THRESHOLD: f32 = 0.03;

// ────────────────────────────────────────────────────────────────────────────
// Rule trait
// ────────────────────────────────────────────────────────────────────────────

/// A single workspace invariant that a candidate command must satisfy.
///
/// Implement this trait to create custom safety rules and add them to a
/// [`SafetyGate`] via [`SafetyGate::add_rule`].
pub trait Rule: Send + Sync {
    /// Human-readable name used in rejection logs.
    fn name(&self) -> &str;

    /// Return `Ok(())` when the command satisfies the invariant, or
    /// [`FetchError::OutOfBounds`] when it is violated.
    fn check(&self, command: &MotionCommand) -> Result<(), FetchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in rule
// ────────────────────────────────────────────────────────────────────────────

/// Rejects commands whose target leaves the rectangular workspace.
///
/// Bounds are inclusive on both ends, so a target exactly on an edge is
/// still dispatched.
pub struct WorkspaceBoundsRule {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
    pub theta_min: f32,
    pub theta_max: f32,
}

impl Default for WorkspaceBoundsRule {
    fn default() -> Self {
        Self {
            x_min: -1.0,
            x_max: 4.0,
            y_min: -1.0,
            y_max: 1.0,
            theta_min: -std::f32::consts::PI,
            theta_max: std::f32::consts::PI,
        }
    }
}

impl Rule for WorkspaceBoundsRule {
    fn name(&self) -> &str {
        "workspace_bounds"
    }

    fn check(&self, command: &MotionCommand) -> Result<(), FetchError> {
        let out_of_bounds = |axis: &str, value: f32| FetchError::OutOfBounds {
            axis: axis.to_string(),
            value,
        };
        if command.x < self.x_min || command.x > self.x_max {
            return Err(out_of_bounds("x", command.x));
        }
        if command.y < self.y_min || command.y > self.y_max {
            return Err(out_of_bounds("y", command.y));
        }
        if command.theta < self.theta_min || command.theta > self.theta_max {
            return Err(out_of_bounds("theta", command.theta));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SafetyGate
// ────────────────────────────────────────────────────────────────────────────

/// Rule engine that validates candidate base motions before dispatch, plus
/// the proximity stop that halts an approach near the target.
pub struct SafetyGate {
    rules: Vec<Box<dyn Rule>>,
    actuator: Arc<dyn ActuatorInterface>,
}

impl SafetyGate {
    /// A gate with the default workspace bounds registered.
    pub fn new(actuator: Arc<dyn ActuatorInterface>) -> Self {
        Self {
            rules: vec![Box::new(WorkspaceBoundsRule::default())],
            actuator,
        }
    }

    /// Register a new [`Rule`].  Rules are evaluated in insertion order.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Validate a candidate target against every registered rule.
    ///
    /// `false` means the first violated rule has already logged the
    /// rejection and the command must not be dispatched.
    pub fn validate(&self, x: f32, y: f32, theta: f32) -> bool {
        let command = MotionCommand::new(x, y, theta);
        for rule in &self.rules {
            if let Err(e) = rule.check(&command) {
                warn!(rule = rule.name(), error = %e, x, y, theta, "motion command rejected");
                return false;
            }
        }
        true
    }

    /// Stop in-flight motion when `distance` is at or below `threshold`.
    ///
    /// Returns `true` when a stop was issued.  A failed `stop_move` is
    /// logged and still reported as `true`: the approach is over either way.
    pub fn stop_if_close(&self, distance: f32, threshold: f32) -> bool {
        if distance > threshold {
            return false;
        }
        info!(distance, threshold, "object within stop threshold, stopping");
        if let Err(e) = self.actuator.stop_move() {
            warn!(error = %e, "stop_move failed");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchd_hal::sim::SimActuator;
    use std::f32::consts::PI;

    fn gate() -> (Arc<SimActuator>, SafetyGate) {
        let actuator = Arc::new(SimActuator::new());
        let gate = SafetyGate::new(actuator.clone());
        (actuator, gate)
    }

    #[test]
    fn in_bounds_command_passes() {
        let (_, gate) = gate();
        assert!(gate.validate(1.5, 0.0, 0.2));
    }

    #[test]
    fn bounds_are_inclusive() {
        let (_, gate) = gate();
        assert!(gate.validate(4.0, 1.0, PI));
        assert!(gate.validate(-1.0, -1.0, -PI));
    }

    #[test]
    fn out_of_bounds_is_rejected_per_axis() {
        let (_, gate) = gate();
        assert!(!gate.validate(4.1, 0.0, 0.0));
        assert!(!gate.validate(-1.1, 0.0, 0.0));
        assert!(!gate.validate(0.0, 1.2, 0.0));
        assert!(!gate.validate(0.0, 0.0, 3.5));
    }

    #[test]
    fn stop_issued_at_threshold() {
        let (actuator, gate) = gate();
        assert!(gate.stop_if_close(0.03, 0.05));
        assert_eq!(actuator.stop_count(), 1);
    }

    #[test]
    fn no_stop_beyond_threshold() {
        let (actuator, gate) = gate();
        assert!(!gate.stop_if_close(0.06, 0.05));
        assert_eq!(actuator.stop_count(), 0);
    }

    #[test]
    fn stop_reported_even_when_actuator_faults() {
        let (actuator, gate) = gate();
        actuator.set_fail_all(true);
        assert!(gate.stop_if_close(0.01, DEFAULT_STOP_THRESHOLD));
    }

    struct RejectAll;

    impl Rule for RejectAll {
        fn name(&self) -> &str {
            "reject_all"
        }

        fn check(&self, command: &MotionCommand) -> Result<(), FetchError> {
            Err(FetchError::OutOfBounds {
                axis: "x".to_string(),
                value: command.x,
            })
        }
    }

    #[test]
    fn custom_rules_are_evaluated() {
        let (_actuator, mut gate) = gate();
        gate.add_rule(Box::new(RejectAll));
        assert!(!gate.validate(0.5, 0.0, 0.0));
    }
}
