//! Closed-loop motion control for autonomous movement.
//!
//! This module is built around a PID control loop that runs on its own
//! thread, continuously steering the drivetrain toward whatever target was
//! last latched. Your autonomous routine issues commands and then blocks on
//! the wait interface until the motion settles:
//!
//! ```ignore
//! use talos::motion::drive::{Drive, DriveConfig};
//!
//! let chassis = Drive::new(my_drivetrain, my_imu, DriveConfig {
//!     wheel_diameter: 4.0,
//!     cartridge_rpm:  200.0,
//!     gear_ratio:     1.0,
//! });
//! chassis.init();
//!
//! chassis.drive(24.0, 110.0, true, true); // 24 inches, slewed, heading held
//! chassis.wait();
//! chassis.turn(90.0, 90.0);
//! chassis.wait();
//! ```
//!
//! The pieces:
//!
//! - [`drive`]: the control loop, command interface and blocking waits.
//! - [`gains`]: PID gain groups and slew parameters, each resettable to
//!   its compiled default.
//! - [`slew`]: the start-of-motion velocity ramp that keeps the wheels
//!   from slipping.
//! - [`settle`]: dwell and stall timers that decide when a motion is done.

/// Drive controller: background PID loop, motion commands and waits.
pub mod drive;

/// PID gain groups and slew parameters.
pub mod gains;

/// Start-of-motion slew ramp.
pub mod slew;

/// Completion detection timers.
pub mod settle;

/// Travel direction chosen when a drive command is issued, used to select
/// between the forward and backward gain and slew parameter sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Sign of `x` as −1.0, 0.0 or +1.0.
pub(crate) fn sgn(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Clamps `value` to the symmetric range ±|cap|.
pub(crate) fn clip(value: f64, cap: f64) -> f64 {
    let cap = cap.abs();
    value.clamp(-cap, cap)
}
