//! Sensor and feedback seams consumed by the motion controller.
//!
//! Like the drivetrain, these are traits rather than concrete devices so
//! the controller can be exercised against test doubles and ported between
//! hardware stacks without touching the control code.

/// Heading sensor interface.
///
/// Provides the [`HeadingSensor`](imu::HeadingSensor) trait for gyros and
/// inertial sensors that report an accumulated rotation in degrees.
pub mod imu;

/// Operator feedback interface.
///
/// Provides the [`OperatorFeedback`](feedback::OperatorFeedback) trait for
/// fire-and-forget driver notifications (rumble patterns and the like).
pub mod feedback;
