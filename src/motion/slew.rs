//! Start-of-motion slew ramp.
//!
//! Commanding a heavy chassis straight to full power makes the wheels slip
//! or lifts the front off the ground. The slew ramp caps output during the
//! first stretch of a drive: it starts the motion at a configured minimum
//! power and grows linearly with distance traveled, reaching the motion's
//! max speed after the configured slew distance. While it applies, the ramp
//! value replaces the PID output for that side outright.
//!
//! A ramp is computed once per drive command and is a one-way gate: once a
//! side has traveled past the ramp's end point the ramp stops applying, and
//! the drive controller never re-enables it for the rest of that motion.

use super::sgn;

/// A per-side velocity ramp, line form `output = slope * remaining + y_intercept`
/// where `remaining` is the signed distance to the ramp's end point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlewRamp {
    /// Travel sign of the motion, −1.0 or +1.0.
    pub sign:        f64,
    /// Encoder position at which the ramp ends.
    pub x_intercept: f64,
    /// Output at the ramp's end: the signed max speed.
    pub y_intercept: f64,
    /// Power gained per tick of travel (negative: remaining shrinks as
    /// output grows).
    pub slope:       f64,
}

impl SlewRamp {
    /// Builds the ramp for one side of a drive command.
    ///
    /// # Arguments
    ///
    /// * `start` - encoder position when the command was issued.
    /// * `distance_ticks` - slew distance converted to encoder ticks.
    /// * `min_power` - unsigned power the motion starts at.
    /// * `max_speed` - unsigned speed cap of the motion.
    /// * `sign` - travel sign for this side, from the target comparison.
    pub fn new(start: f64, distance_ticks: f64, min_power: f64, max_speed: f64, sign: f64) -> Self {
        let slope = if distance_ticks > 0.0 {
            (min_power - max_speed) / distance_ticks
        } else {
            0.0
        };
        Self {
            sign,
            x_intercept: start + sign * distance_ticks,
            y_intercept: sign * max_speed,
            slope,
        }
    }

    /// True while this side has not yet crossed the ramp's end point in its
    /// direction of travel.
    pub fn applies(&self, position: f64) -> bool {
        sgn(self.x_intercept - position) == self.sign
    }

    /// The ramp output at `position`, or `None` once the end point has been
    /// crossed.
    pub fn output(&self, position: f64) -> Option<f64> {
        let remaining = self.x_intercept - position;
        if sgn(remaining) == self.sign {
            Some(self.slope * remaining + self.y_intercept)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_ramp_runs_min_to_max() {
        let ramp = SlewRamp::new(100.0, 140.0, 80.0, 110.0, 1.0);
        assert_eq!(ramp.x_intercept, 240.0);

        let at_start = ramp.output(100.0).unwrap();
        assert!((at_start - 80.0).abs() < 1e-9, "ramp starts at min power, got {at_start}");

        let mid = ramp.output(170.0).unwrap();
        assert!((mid - 95.0).abs() < 1e-9, "linear halfway point, got {mid}");

        let near_end = ramp.output(239.9).unwrap();
        assert!((near_end - 110.0).abs() < 0.1);
    }

    #[test]
    fn backward_ramp_mirrors_forward() {
        let ramp = SlewRamp::new(0.0, 140.0, 80.0, 110.0, -1.0);
        assert_eq!(ramp.x_intercept, -140.0);

        let at_start = ramp.output(0.0).unwrap();
        assert!((at_start + 80.0).abs() < 1e-9, "starts at signed min power, got {at_start}");

        let near_end = ramp.output(-139.9).unwrap();
        assert!((near_end + 110.0).abs() < 0.1);
    }

    #[test]
    fn ramp_stops_applying_past_end_point() {
        let ramp = SlewRamp::new(0.0, 100.0, 80.0, 110.0, 1.0);
        assert!(ramp.applies(50.0));
        assert_eq!(ramp.output(100.0), None, "exactly at the end point");
        assert_eq!(ramp.output(130.0), None, "past the end point");
    }

    #[test]
    fn zero_distance_never_applies() {
        let ramp = SlewRamp::new(40.0, 0.0, 80.0, 110.0, 1.0);
        assert!(!ramp.applies(40.0));
        assert_eq!(ramp.output(40.0), None);
    }
}
