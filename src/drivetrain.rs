//! Actuation seam for the tank drivetrain.
//!
//! The motion controller never talks to motors directly. Instead it drives
//! anything that implements the [`Drivetrain`] trait: one group of actuators
//! per side, commanded as a unit, plus the encoder and velocity telemetry
//! the control loop feeds on.
//!
//! # Units
//!
//! - **Power** is a signed value on a symmetric ±127 scale. Implementations
//!   map it to their actuator's native range (for a 12 V motor that is
//!   `power * 12.0 / 127.0` volts).
//! - **Position** is signed encoder ticks, zeroed by
//!   [`Drivetrain::reset_positions`].
//! - **Velocity** is signed actuator speed in ticks; the controller only
//!   ever compares it against zero to detect a stalled chassis.
//!
//! # Threading
//!
//! The control loop runs on its own thread and shares the drivetrain with
//! caller code, so implementations take `&self` and handle their own
//! interior mutability.
//!
//! # Example
//!
//! ```ignore
//! use talos::drivetrain::{BrakeMode, Drivetrain};
//!
//! struct MyChassis { /* motor handles */ }
//!
//! impl Drivetrain for MyChassis {
//!     fn set_left(&self, power: f64) { /* command left motors */ }
//!     fn set_right(&self, power: f64) { /* command right motors */ }
//!     fn set_brake_mode(&self, mode: BrakeMode) { /* ... */ }
//!     fn left_position(&self) -> i32 { /* ... */ 0 }
//!     fn right_position(&self) -> i32 { 0 }
//!     fn left_velocity(&self) -> i32 { 0 }
//!     fn right_velocity(&self) -> i32 { 0 }
//!     fn reset_positions(&self) {}
//! }
//! ```

/// Brake behavior applied when an actuator is commanded to zero power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrakeMode {
    /// Actuators spin freely.
    Coast,
    /// Actuators actively resist rotation.
    Brake,
    /// Actuators actively hold their position.
    Hold,
}

/// A two-train ("tank") chassis: left and right actuator groups with
/// integrated position and velocity feedback.
pub trait Drivetrain: Send + Sync {
    /// Commands the left train. `power` is on the ±127 scale.
    fn set_left(&self, power: f64);

    /// Commands the right train. `power` is on the ±127 scale.
    fn set_right(&self, power: f64);

    /// Applies a brake mode to every actuator on both trains.
    fn set_brake_mode(&self, mode: BrakeMode);

    /// Left encoder position in ticks.
    fn left_position(&self) -> i32;

    /// Right encoder position in ticks.
    fn right_position(&self) -> i32;

    /// Left actuator velocity; zero means the train is not turning.
    fn left_velocity(&self) -> i32;

    /// Right actuator velocity; zero means the train is not turning.
    fn right_velocity(&self) -> i32;

    /// Zeroes both encoders.
    fn reset_positions(&self);

    /// Commands both trains in one call.
    fn set_tank(&self, left: f64, right: f64) {
        self.set_left(left);
        self.set_right(right);
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Test doubles shared by the motion tests.

    use std::sync::{Arc, Mutex};

    use super::{BrakeMode, Drivetrain};

    #[derive(Debug, Default)]
    struct StaticState {
        left_position:  f64,
        right_position: f64,
    }

    /// Chassis whose telemetry is set directly by the test; commands go
    /// nowhere and nothing moves.
    #[derive(Clone, Default)]
    pub struct StaticDrivetrain {
        state: Arc<Mutex<StaticState>>,
    }

    impl StaticDrivetrain {
        pub fn new() -> Self { Self::default() }

        pub fn set_positions(&self, left: f64, right: f64) {
            let mut s = self.state.lock().unwrap();
            s.left_position = left;
            s.right_position = right;
        }
    }

    impl Drivetrain for StaticDrivetrain {
        fn set_left(&self, _power: f64) {}

        fn set_right(&self, _power: f64) {}

        fn set_brake_mode(&self, _mode: BrakeMode) {}

        fn left_position(&self) -> i32 {
            self.state.lock().unwrap().left_position.round() as i32
        }

        fn right_position(&self) -> i32 {
            self.state.lock().unwrap().right_position.round() as i32
        }

        fn left_velocity(&self) -> i32 { 0 }

        fn right_velocity(&self) -> i32 { 0 }

        fn reset_positions(&self) { self.set_positions(0.0, 0.0); }
    }

    #[derive(Debug, Default)]
    struct SimState {
        left_position:  f64,
        right_position: f64,
        left_step:      f64,
        right_step:     f64,
    }

    /// First-order plant: every command advances the commanded side by
    /// `power * gain` ticks, and velocity reports the last step taken.
    #[derive(Clone)]
    pub struct SimDrivetrain {
        state: Arc<Mutex<SimState>>,
        gain:  f64,
    }

    impl SimDrivetrain {
        pub fn new(gain: f64) -> Self {
            Self { state: Arc::new(Mutex::new(SimState::default())), gain }
        }

        pub fn positions(&self) -> (f64, f64) {
            let s = self.state.lock().unwrap();
            (s.left_position, s.right_position)
        }
    }

    impl Drivetrain for SimDrivetrain {
        fn set_left(&self, power: f64) {
            let mut s = self.state.lock().unwrap();
            s.left_step = power * self.gain;
            s.left_position += s.left_step;
        }

        fn set_right(&self, power: f64) {
            let mut s = self.state.lock().unwrap();
            s.right_step = power * self.gain;
            s.right_position += s.right_step;
        }

        fn set_brake_mode(&self, _mode: BrakeMode) {}

        fn left_position(&self) -> i32 {
            self.state.lock().unwrap().left_position.round() as i32
        }

        fn right_position(&self) -> i32 {
            self.state.lock().unwrap().right_position.round() as i32
        }

        fn left_velocity(&self) -> i32 { self.state.lock().unwrap().left_step.round() as i32 }

        fn right_velocity(&self) -> i32 { self.state.lock().unwrap().right_step.round() as i32 }

        fn reset_positions(&self) {
            let mut s = self.state.lock().unwrap();
            s.left_position = 0.0;
            s.right_position = 0.0;
        }
    }

    /// Obstructed chassis: accepts commands but never moves and never
    /// reports velocity.
    #[derive(Clone, Default)]
    pub struct FrozenDrivetrain;

    impl Drivetrain for FrozenDrivetrain {
        fn set_left(&self, _power: f64) {}

        fn set_right(&self, _power: f64) {}

        fn set_brake_mode(&self, _mode: BrakeMode) {}

        fn left_position(&self) -> i32 { 0 }

        fn right_position(&self) -> i32 { 0 }

        fn left_velocity(&self) -> i32 { 0 }

        fn right_velocity(&self) -> i32 { 0 }

        fn reset_positions(&self) {}
    }
}
