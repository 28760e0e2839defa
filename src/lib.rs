//! # Talos
//!
//! Talos is a closed-loop motion controller for two-wheel-train ("tank")
//! mobile robots. It drives the chassis to linear and angular targets with
//! PID control and provides:
//!
//! - **Drive, turn and swing motions**: straight-line drives with heading
//!   correction, in-place turns, and one-sided pivot turns, all tracked by
//!   a background control loop.
//! - **Slew-rate limiting**: a start-of-motion velocity ramp that stops
//!   the wheels slipping (or the robot wheelieing) on hard launches.
//! - **Settle detection**: waits that end when the motion settles, gets
//!   close enough, or stalls against an obstacle, so routines never hang.
//! - **Hardware seams**: the controller drives traits, not devices, and
//!   runs unchanged against real motors or test doubles.
//! - **Logging**: every command, settle verdict and calibration result is
//!   reported through the [`log`] facade, with a ready-made console/file
//!   logger in [`fs::logger`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use log::LevelFilter;
//! use talos::fs::logger;
//! use talos::motion::drive::{Drive, DriveConfig};
//! use talos::peripherals::feedback::Silent;
//!
//! fn main() {
//!     logger::init(LevelFilter::Info).expect("logger init failed");
//!
//!     // `chassis_hw` implements talos::drivetrain::Drivetrain and
//!     // `imu` implements talos::peripherals::imu::HeadingSensor.
//!     let chassis = Drive::new(chassis_hw, imu, DriveConfig {
//!         wheel_diameter: 4.0,
//!         cartridge_rpm:  200.0,
//!         gear_ratio:     1.0,
//!     });
//!     chassis.init();
//!     chassis.calibrate_imu(&Silent);
//!
//!     chassis.drive(24.0, 110.0, true, true);
//!     chassis.wait();
//!     chassis.turn(90.0, 90.0);
//!     chassis.wait();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`motion`]: the control loop, motion commands, gains, slew ramp and
//!   settle detection.
//! - [`drivetrain`]: the actuation trait the controller commands.
//! - [`peripherals`]: heading-sensor and operator-feedback traits.
//! - [`fs`]: logging utilities.

/// Actuation seam for the tank drivetrain.
///
/// Provides the [`Drivetrain`](drivetrain::Drivetrain) trait: left and
/// right actuator groups commanded as units, plus encoder and velocity
/// telemetry for the control loop.
pub mod drivetrain;

/// Filesystem utilities, including the crate's [`log`] backend.
pub mod fs;

/// Closed-loop motion control.
///
/// The [`Drive`](motion::drive::Drive) controller runs a fixed-period PID
/// loop on its own thread; commands latch targets and blocking waits
/// report when motions settle, give up or stall.
pub mod motion;

/// Sensor and feedback seams consumed by the motion controller.
pub mod peripherals;
