//! Completion detection for motions.
//!
//! "Done" is a judgement call for a feedback loop that never stops running:
//! the robot might settle inside the tight tolerance, hover just outside it
//! forever, or be physically blocked. The [`SettleMonitor`] runs three
//! dwell timers side by side, one per situation, and the first to expire
//! ends the wait:
//!
//! 1. **Small threshold** - error has stayed inside the tight tolerance for
//!    the small timeout: the motion genuinely settled.
//! 2. **Big threshold** - error has stayed inside a looser tolerance for a
//!    longer timeout: close enough, stop holding up the routine.
//! 3. **Velocity stall** - both trains have reported zero velocity for the
//!    stall timeout: the robot is obstructed and will not get closer.
//!
//! Each timer accumulates only while its condition holds and snaps back to
//! zero the instant it does not, so a momentary pass through the tolerance
//! band never counts as settling.

/// Tolerances and timeouts for one wait.
#[derive(Debug, Clone, Copy)]
pub struct SettleThresholds {
    /// Tight error tolerance (ticks or degrees, per mode).
    pub small_error:      f64,
    /// How long the error must stay inside `small_error`, in ms.
    pub small_timeout:    u64,
    /// Loose error tolerance.
    pub big_error:        f64,
    /// How long the error must stay inside `big_error`, in ms.
    pub big_timeout:      u64,
    /// How long both trains may report zero velocity, in ms.
    pub velocity_timeout: u64,
}

impl SettleThresholds {
    /// Preset for waits on encoder targets (errors in ticks).
    pub const DRIVE: SettleThresholds = SettleThresholds {
        small_error:      50.0,
        small_timeout:    80,
        big_error:        150.0,
        big_timeout:      300,
        velocity_timeout: 500,
    };

    /// Preset for waits on heading targets (errors in degrees).
    pub const TURN: SettleThresholds = SettleThresholds {
        small_error:      3.0,
        small_timeout:    100,
        big_error:        7.0,
        big_timeout:      500,
        velocity_timeout: 500,
    };
}

/// What the monitor concluded this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleVerdict {
    /// Keep waiting.
    Busy,
    /// Error held inside the tight tolerance: the motion settled.
    Settled,
    /// Error held inside the loose tolerance only: giving up on the tight
    /// one.
    GaveUp,
    /// Both trains sat at zero velocity too long: the robot is stalled.
    Stalled,
}

/// The three concurrent dwell timers backing one wait call.
///
/// A monitor is cheap and single-use: create a fresh one per wait so no
/// dwell time leaks from a previous motion.
#[derive(Debug, Default)]
pub struct SettleMonitor {
    small_ms: u64,
    big_ms:   u64,
    stall_ms: u64,
}

impl SettleMonitor {
    pub fn new() -> Self { Self::default() }

    /// Advances the timers by one tick and reports a verdict.
    ///
    /// # Arguments
    ///
    /// * `error` - worst absolute target error across the axes the active
    ///   mode cares about (both encoders for a drive, heading for a turn).
    /// * `stopped` - true when both trains report zero velocity.
    /// * `thresholds` - the preset for the active mode.
    /// * `dt_ms` - tick period in milliseconds.
    pub fn tick(
        &mut self,
        error: f64,
        stopped: bool,
        thresholds: &SettleThresholds,
        dt_ms: u64,
    ) -> SettleVerdict {
        if error < thresholds.small_error {
            self.small_ms += dt_ms;
            if self.small_ms > thresholds.small_timeout {
                return SettleVerdict::Settled;
            }
        } else {
            self.small_ms = 0;
        }

        if error < thresholds.big_error {
            self.big_ms += dt_ms;
            if self.big_ms > thresholds.big_timeout {
                return SettleVerdict::GaveUp;
            }
        } else {
            self.big_ms = 0;
        }

        if stopped {
            self.stall_ms += dt_ms;
            if self.stall_ms > thresholds.velocity_timeout {
                return SettleVerdict::Stalled;
            }
        } else {
            self.stall_ms = 0;
        }

        SettleVerdict::Busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TH: SettleThresholds = SettleThresholds {
        small_error:      5.0,
        small_timeout:    80,
        big_error:        20.0,
        big_timeout:      300,
        velocity_timeout: 500,
    };

    #[test]
    fn settles_after_dwelling_in_small_band() {
        let mut monitor = SettleMonitor::new();
        for _ in 0..8 {
            assert_eq!(monitor.tick(2.0, false, &TH, 10), SettleVerdict::Busy);
        }
        // 9th tick pushes the dwell past 80 ms.
        assert_eq!(monitor.tick(2.0, false, &TH, 10), SettleVerdict::Settled);
    }

    #[test]
    fn leaving_the_band_restarts_the_dwell_from_zero() {
        let mut monitor = SettleMonitor::new();
        for _ in 0..8 {
            monitor.tick(2.0, false, &TH, 10);
        }
        // One bad tick wipes the accumulated 80 ms.
        assert_eq!(monitor.tick(30.0, false, &TH, 10), SettleVerdict::Busy);
        for _ in 0..8 {
            assert_eq!(monitor.tick(2.0, false, &TH, 10), SettleVerdict::Busy);
        }
        assert_eq!(monitor.tick(2.0, false, &TH, 10), SettleVerdict::Settled);
    }

    #[test]
    fn gives_up_from_the_loose_band() {
        let mut monitor = SettleMonitor::new();
        // Error parked between the two tolerances: small timer never runs.
        for _ in 0..30 {
            assert_eq!(monitor.tick(10.0, false, &TH, 10), SettleVerdict::Busy);
        }
        assert_eq!(monitor.tick(10.0, false, &TH, 10), SettleVerdict::GaveUp);
    }

    #[test]
    fn stall_fires_with_error_still_large() {
        let mut monitor = SettleMonitor::new();
        for _ in 0..50 {
            assert_eq!(monitor.tick(400.0, true, &TH, 10), SettleVerdict::Busy);
        }
        assert_eq!(monitor.tick(400.0, true, &TH, 10), SettleVerdict::Stalled);
    }

    #[test]
    fn movement_resets_the_stall_timer() {
        let mut monitor = SettleMonitor::new();
        for _ in 0..50 {
            monitor.tick(400.0, true, &TH, 10);
        }
        monitor.tick(400.0, false, &TH, 10);
        for _ in 0..50 {
            assert_eq!(monitor.tick(400.0, true, &TH, 10), SettleVerdict::Busy);
        }
        assert_eq!(monitor.tick(400.0, true, &TH, 10), SettleVerdict::Stalled);
    }
}
