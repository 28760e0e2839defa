//! Gain groups for the drive controller.
//!
//! Every motion mode has its own gain set, and each set can be adjusted and
//! reset independently, so a routine can soften the turn gains for one
//! fragile maneuver and restore the defaults afterwards without touching
//! anything else. Changes apply on the next control tick, including in the
//! middle of a motion.
//!
//! # Tuning
//!
//! Start with the proportional gain and raise it until the robot reaches
//! the target briskly, then add derivative gain to kill the overshoot. The
//! turn integral only engages close to the target (inside
//! [`TurnIntegral::start_error`]), where friction would otherwise leave the
//! robot parked a few degrees short.

use super::Direction;

/// Default forward drive gains.
pub const FW_DRIVE_KP: f64 = 0.45;
pub const FW_DRIVE_KD: f64 = 5.0;

/// Default backward drive gains.
pub const BW_DRIVE_KP: f64 = 0.45;
pub const BW_DRIVE_KD: f64 = 5.0;

/// Default heading-correction gains.
pub const HEADING_KP: f64 = 11.0;
pub const HEADING_KD: f64 = 20.0;

/// Default turn gains.
pub const TURN_KP: f64 = 5.0;
pub const TURN_KI: f64 = 0.003;
pub const TURN_KD: f64 = 35.0;

/// Heading error (degrees) below which the turn integral engages.
pub const TURN_START_I: f64 = 15.0;
/// Output cap while the turn integral is engaged.
pub const TURN_CLIPPED_SPEED: f64 = 30.0;

/// Default swing gains.
pub const SWING_KP: f64 = 12.0;
pub const SWING_KD: f64 = 35.0;

/// Default slew starting power, forward and backward.
pub const FW_SLEW_MIN_POWER: f64 = 80.0;
pub const BW_SLEW_MIN_POWER: f64 = 80.0;

/// Default slew distance in inches, forward and backward.
pub const FW_SLEW_DISTANCE: f64 = 7.0;
pub const BW_SLEW_DISTANCE: f64 = 7.0;

/// A proportional-derivative gain pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pd {
    pub kp: f64,
    pub kd: f64,
}

/// A full proportional-integral-derivative gain triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pid {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// Integral engagement parameters for turns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnIntegral {
    /// The integral accumulates only while |heading error| is below this.
    pub start_error:   f64,
    /// Output cap that replaces the motion's max speed while the integral
    /// is engaged.
    pub clipped_speed: f64,
}

/// A value parameterized per travel direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerDirection {
    pub forward:  f64,
    pub backward: f64,
}

impl PerDirection {
    pub fn get(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
        }
    }
}

/// The complete, independently adjustable gain configuration for one drive
/// controller instance.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveGains {
    /// Drive PD used when the target is ahead of the robot.
    pub forward_drive:  Pd,
    /// Drive PD used when the target is behind the robot.
    pub backward_drive: Pd,
    /// Heading-correction PD applied across the two trains while driving.
    pub heading:        Pd,
    /// Turn PID.
    pub turn:           Pid,
    /// Turn integral engagement threshold and engaged-output cap.
    pub turn_integral:  TurnIntegral,
    /// Swing (one-sided pivot) PD.
    pub swing:          Pd,
    /// Slew starting power per direction.
    pub slew_min_power: PerDirection,
    /// Slew distance in inches per direction.
    pub slew_distance:  PerDirection,
}

impl Default for DriveGains {
    fn default() -> Self {
        Self {
            forward_drive:  Pd { kp: FW_DRIVE_KP, kd: FW_DRIVE_KD },
            backward_drive: Pd { kp: BW_DRIVE_KP, kd: BW_DRIVE_KD },
            heading:        Pd { kp: HEADING_KP, kd: HEADING_KD },
            turn:           Pid { kp: TURN_KP, ki: TURN_KI, kd: TURN_KD },
            turn_integral:  TurnIntegral {
                start_error:   TURN_START_I,
                clipped_speed: TURN_CLIPPED_SPEED,
            },
            swing:          Pd { kp: SWING_KP, kd: SWING_KD },
            slew_min_power: PerDirection {
                forward:  FW_SLEW_MIN_POWER,
                backward: BW_SLEW_MIN_POWER,
            },
            slew_distance:  PerDirection {
                forward:  FW_SLEW_DISTANCE,
                backward: BW_SLEW_DISTANCE,
            },
        }
    }
}

impl DriveGains {
    /// The drive PD for the given travel direction.
    pub fn drive_gains(&self, direction: Direction) -> Pd {
        match direction {
            Direction::Forward => self.forward_drive,
            Direction::Backward => self.backward_drive,
        }
    }

    pub fn set_forward_drive(&mut self, kp: f64, kd: f64) {
        self.forward_drive = Pd { kp, kd };
    }

    pub fn set_backward_drive(&mut self, kp: f64, kd: f64) {
        self.backward_drive = Pd { kp, kd };
    }

    pub fn set_heading(&mut self, kp: f64, kd: f64) { self.heading = Pd { kp, kd }; }

    pub fn set_turn(&mut self, kp: f64, ki: f64, kd: f64) { self.turn = Pid { kp, ki, kd }; }

    pub fn set_turn_integral(&mut self, start_error: f64, clipped_speed: f64) {
        self.turn_integral = TurnIntegral { start_error, clipped_speed };
    }

    pub fn set_swing(&mut self, kp: f64, kd: f64) { self.swing = Pd { kp, kd }; }

    pub fn set_slew_min_power(&mut self, forward: f64, backward: f64) {
        self.slew_min_power = PerDirection { forward, backward };
    }

    pub fn set_slew_distance(&mut self, forward: f64, backward: f64) {
        self.slew_distance = PerDirection { forward, backward };
    }

    pub fn reset_forward_drive(&mut self) {
        self.forward_drive = Pd { kp: FW_DRIVE_KP, kd: FW_DRIVE_KD };
    }

    pub fn reset_backward_drive(&mut self) {
        self.backward_drive = Pd { kp: BW_DRIVE_KP, kd: BW_DRIVE_KD };
    }

    pub fn reset_heading(&mut self) { self.heading = Pd { kp: HEADING_KP, kd: HEADING_KD }; }

    pub fn reset_turn(&mut self) { self.turn = Pid { kp: TURN_KP, ki: TURN_KI, kd: TURN_KD }; }

    pub fn reset_turn_integral(&mut self) {
        self.turn_integral = TurnIntegral {
            start_error:   TURN_START_I,
            clipped_speed: TURN_CLIPPED_SPEED,
        };
    }

    pub fn reset_swing(&mut self) { self.swing = Pd { kp: SWING_KP, kd: SWING_KD }; }

    pub fn reset_slew_min_power(&mut self) {
        self.slew_min_power = PerDirection {
            forward:  FW_SLEW_MIN_POWER,
            backward: BW_SLEW_MIN_POWER,
        };
    }

    pub fn reset_slew_distance(&mut self) {
        self.slew_distance = PerDirection {
            forward:  FW_SLEW_DISTANCE,
            backward: BW_SLEW_DISTANCE,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_compiled_defaults() {
        let mut gains = DriveGains::default();
        gains.set_turn(9.0, 0.1, 70.0);
        gains.reset_turn();
        assert_eq!(gains.turn, Pid { kp: TURN_KP, ki: TURN_KI, kd: TURN_KD });
    }

    #[test]
    fn reset_is_isolated_to_one_group() {
        let mut gains = DriveGains::default();
        gains.set_forward_drive(1.2, 9.0);
        gains.set_swing(3.0, 4.0);
        gains.set_slew_min_power(50.0, 60.0);

        gains.reset_swing();

        // Swing is back at its defaults, the other edits survive.
        assert_eq!(gains.swing, Pd { kp: SWING_KP, kd: SWING_KD });
        assert_eq!(gains.forward_drive, Pd { kp: 1.2, kd: 9.0 });
        assert_eq!(gains.slew_min_power, PerDirection { forward: 50.0, backward: 60.0 });
    }

    #[test]
    fn slew_resets_keep_directions_distinct() {
        let mut gains = DriveGains::default();
        gains.set_slew_distance(3.0, 12.0);
        gains.reset_slew_distance();
        assert_eq!(gains.slew_distance.get(Direction::Forward), FW_SLEW_DISTANCE);
        assert_eq!(gains.slew_distance.get(Direction::Backward), BW_SLEW_DISTANCE);
    }

    #[test]
    fn direction_selects_gain_set() {
        let mut gains = DriveGains::default();
        gains.set_backward_drive(0.9, 2.0);
        assert_eq!(gains.drive_gains(Direction::Backward), Pd { kp: 0.9, kd: 2.0 });
        assert_eq!(
            gains.drive_gains(Direction::Forward),
            Pd { kp: FW_DRIVE_KP, kd: FW_DRIVE_KD }
        );
    }
}
