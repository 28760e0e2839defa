//! Operator feedback seam.

/// Fire-and-forget notifications to the robot operator.
///
/// The drive controller uses this exactly once today: a short rumble when
/// heading-sensor calibration finishes, so the operator knows the robot is
/// ready without watching a screen. Nothing is returned and failures are
/// swallowed by the implementation.
pub trait OperatorFeedback {
    /// Plays a rumble pattern, e.g. `"."` for a short pulse or `"-"` for a
    /// long one.
    fn rumble(&self, pattern: &str);
}

/// Feedback sink that discards every notification.
///
/// Useful for headless runs and tests.
pub struct Silent;

impl OperatorFeedback for Silent {
    fn rumble(&self, _pattern: &str) {}
}
