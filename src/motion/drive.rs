//! The drive controller: a background PID loop with blocking waits.
//!
//! # Architecture
//!
//! [`Drive::init`] spawns a control thread that runs forever at a fixed
//! 10 ms tick. Every tick it:
//!
//! 1. Reads encoder positions and the heading sensor.
//! 2. Computes PID terms for the active motion mode.
//! 3. Applies the slew ramp and output clipping.
//! 4. Commands the drivetrain.
//!
//! Commands ([`Drive::drive`], [`Drive::turn`], [`Drive::left_swing`],
//! [`Drive::right_swing`]) only latch a new target into the shared state;
//! the loop picks it up on its next tick. The loop never exits: a motion is
//! "done" only from the caller's point of view, via [`Drive::wait`] or
//! [`Drive::wait_until`], while the loop keeps holding the last target
//! indefinitely.
//!
//! # Usage
//!
//! ```ignore
//! use talos::motion::drive::{Drive, DriveConfig};
//! use talos::peripherals::feedback::Silent;
//!
//! let chassis = Drive::new(drivetrain, imu, DriveConfig {
//!     wheel_diameter: 4.0,
//!     cartridge_rpm:  200.0,
//!     gear_ratio:     1.0,
//! });
//! chassis.init();
//! chassis.calibrate_imu(&Silent);
//!
//! chassis.drive(24.0, 110.0, true, true);
//! chassis.wait();
//! chassis.turn(90.0, 90.0);
//! chassis.wait();
//! ```

use std::{
    f64::consts::PI,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use log::{error, info, trace, warn};

use super::{
    Direction, clip,
    gains::DriveGains,
    settle::{SettleMonitor, SettleThresholds, SettleVerdict},
    sgn,
    slew::SlewRamp,
};
use crate::{
    drivetrain::{BrakeMode, Drivetrain},
    peripherals::{feedback::OperatorFeedback, imu::HeadingSensor},
};

/// Control loop period.
const TICK: Duration = Duration::from_millis(TICK_MS);
const TICK_MS: u64 = 10;

/// Output is suppressed for this long after the loop starts, so the robot
/// stays put while the heading sensor finishes calibrating.
const STARTUP_GRACE_MS: u64 = 1500;

/// How long [`Drive::calibrate_imu`] waits before declaring the sensor
/// missing.
const CALIBRATION_BUDGET_MS: u64 = 2990;

/// Smallest nonzero drive output. Below this the motors stall against
/// static friction instead of creeping the last few ticks.
const MIN_SPEED: f64 = 9.0;

/// Drive error (ticks) under which the minimum-speed floor releases to
/// zero output.
const MIN_ERROR: f64 = 10.0;

/// Physical drivetrain description, used to convert inches to encoder
/// ticks.
#[derive(Debug, Clone, Copy)]
pub struct DriveConfig {
    /// Wheel diameter in inches. Most chassis run 2.75", 3.25" or 4".
    pub wheel_diameter: f64,
    /// Free speed of the motor cartridge in RPM (100, 200 or 600 for the
    /// common cartridges).
    pub cartridge_rpm:  f64,
    /// External gear ratio between motor and wheel: wheel revolutions are
    /// `motor revolutions / gear_ratio`.
    pub gear_ratio:     f64,
}

impl DriveConfig {
    /// Encoder ticks per wheel revolution. The integrated encoder reads 50
    /// counts per revolution of the bare 3600 RPM motor; the cartridge and
    /// external gearing multiply that up.
    pub fn ticks_per_rev(&self) -> f64 {
        50.0 * (3600.0 / self.cartridge_rpm) * self.gear_ratio
    }

    /// Encoder ticks per inch of wheel travel.
    pub fn ticks_per_inch(&self) -> f64 {
        self.ticks_per_rev() / (self.wheel_diameter * PI)
    }
}

/// Which side a swing pivots around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// The active motion and its mode-specific payload.
#[derive(Debug, Clone)]
enum Motion {
    /// No command issued yet; the loop outputs zero.
    Idle,
    /// Straight-line drive toward per-side encoder targets.
    Drive {
        left_target:        f64,
        right_target:       f64,
        left_start:         f64,
        right_start:        f64,
        direction:          Direction,
        heading_correction: bool,
        left_slew:          SlewRamp,
        right_slew:         SlewRamp,
        /// One-way latch: cleared by the loop when both ramps end, never
        /// set again for this motion.
        slewing:            bool,
    },
    /// In-place turn toward the shared heading target.
    Turn { sign: f64 },
    /// One-sided pivot toward the shared heading target.
    Swing { side: Side, sign: f64 },
}

/// Everything a command latches for the loop to act on.
#[derive(Debug)]
struct MotionState {
    motion:         Motion,
    /// Target heading in degrees. Persists across commands: drives hold
    /// whatever heading the last turn or swing left behind.
    heading_target: f64,
    max_speed:      f64,
}

/// Loop-local controller memory carried tick to tick.
#[derive(Debug, Default)]
struct LoopMemory {
    last_left_error:    f64,
    last_right_error:   f64,
    last_heading_error: f64,
    heading_integral:   f64,
    elapsed_ms:         u64,
}

/// One tick's sensor snapshot.
#[derive(Debug, Clone, Copy)]
struct Telemetry {
    left_position:  f64,
    right_position: f64,
    heading:        f64,
}

/// Locks a mutex, recovering the value if a panicking thread poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One tick of the controller: PID terms for the active mode, slew
/// override, clipping and per-side combination. Returns the left and right
/// power commands.
fn control_cycle(
    state: &mut MotionState,
    gains: &DriveGains,
    mem: &mut LoopMemory,
    t: Telemetry,
) -> (f64, f64) {
    let heading_error = state.heading_target - t.heading;
    let heading_der = heading_error - mem.last_heading_error;

    // The turn integral is gated, not clamped: it only accumulates close
    // to the target and is held at zero everywhere else.
    let mut integral_engaged = false;
    if let Motion::Turn { .. } = state.motion {
        if heading_error.abs() < gains.turn_integral.start_error {
            integral_engaged = true;
            mem.heading_integral += heading_error;
        } else {
            mem.heading_integral = 0.0;
        }
    } else {
        mem.heading_integral = 0.0;
    }

    let max_speed = state.max_speed;

    let command = match &mut state.motion {
        Motion::Idle => (0.0, 0.0),

        Motion::Drive {
            left_target,
            right_target,
            direction,
            heading_correction,
            left_slew,
            right_slew,
            slewing,
            ..
        } => {
            let left_error = *left_target - t.left_position;
            let right_error = *right_target - t.right_position;

            let pd = gains.drive_gains(*direction);
            let mut left_out =
                left_error * pd.kp + (left_error - mem.last_left_error) * pd.kd;
            let mut right_out =
                right_error * pd.kp + (right_error - mem.last_right_error) * pd.kd;
            let heading_out =
                heading_error * gains.heading.kp + heading_der * gains.heading.kd;

            // While slewing, the ramp value replaces the PID output for any
            // side still short of its ramp end point.
            if *slewing {
                let left_ramp = left_slew.output(t.left_position);
                let right_ramp = right_slew.output(t.right_position);
                if let Some(value) = left_ramp {
                    left_out = value;
                }
                if let Some(value) = right_ramp {
                    right_out = value;
                }
                if left_ramp.is_none() && right_ramp.is_none() {
                    *slewing = false;
                }
            }
            let slewing_now = *slewing;

            left_out = clip(left_out, max_speed);
            right_out = clip(right_out, max_speed);

            let (mut left_cmd, mut right_cmd) = if *heading_correction {
                (left_out + heading_out, right_out - heading_out)
            } else {
                (left_out, right_out)
            };

            // Minimum-speed floor: hold the floor while there is still
            // meaningful error, release to zero once inside it.
            if !slewing_now {
                if left_cmd.abs() < MIN_SPEED {
                    left_cmd = if left_error.abs() > MIN_ERROR {
                        MIN_SPEED * sgn(left_error)
                    } else {
                        0.0
                    };
                }
                if right_cmd.abs() < MIN_SPEED {
                    right_cmd = if right_error.abs() > MIN_ERROR {
                        MIN_SPEED * sgn(right_error)
                    } else {
                        0.0
                    };
                }
            }

            trace!(
                "drive tick: le {left_error:.1} re {right_error:.1} out ({left_cmd:.1}, {right_cmd:.1})"
            );

            mem.last_left_error = left_error;
            mem.last_right_error = right_error;

            (clip(left_cmd, max_speed), clip(right_cmd, max_speed))
        }

        Motion::Turn { sign } => {
            let out = heading_error * gains.turn.kp
                + mem.heading_integral * gains.turn.ki
                + heading_der * gains.turn.kd;
            // While the integral is engaged a tighter cap replaces the
            // motion's max speed.
            let cap = if integral_engaged {
                gains.turn_integral.clipped_speed
            } else {
                max_speed
            };
            let out = clip(out, cap);
            trace!(
                "turn tick: err {heading_error:.2} sign {sign:+.0} i {:.2} out {out:.1}",
                mem.heading_integral
            );
            (out, -out)
        }

        Motion::Swing { side, sign } => {
            let out = clip(
                heading_error * gains.swing.kp + heading_der * gains.swing.kd,
                max_speed,
            );
            trace!("swing tick: err {heading_error:.2} sign {sign:+.0} out {out:.1}");
            match side {
                Side::Left => (out, 0.0),
                Side::Right => (0.0, -out),
            }
        }
    };

    mem.last_heading_error = heading_error;

    // Hold still during the startup grace window; the heading sensor is
    // still calibrating.
    let in_grace = mem.elapsed_ms < STARTUP_GRACE_MS;
    mem.elapsed_ms += TICK_MS;
    if in_grace { (0.0, 0.0) } else { command }
}

fn control_loop<D: Drivetrain, H: HeadingSensor>(
    drivetrain: Arc<D>,
    imu: Arc<H>,
    state: Arc<Mutex<MotionState>>,
    gains: Arc<Mutex<DriveGains>>,
) {
    info!("drive control loop started");
    drivetrain.set_brake_mode(BrakeMode::Brake);
    drivetrain.reset_positions();

    let mut mem = LoopMemory::default();
    loop {
        let t = Telemetry {
            left_position:  drivetrain.left_position() as f64,
            right_position: drivetrain.right_position() as f64,
            heading:        imu.rotation(),
        };

        let (left, right) = {
            let gains = lock(&gains);
            let mut state = lock(&state);
            control_cycle(&mut state, &gains, &mut mem, t)
        };

        drivetrain.set_tank(left, right);
        thread::sleep(TICK);
    }
}

/// The drive controller.
///
/// Owns the shared motion state and gain configuration for one chassis;
/// two `Drive` instances share nothing. Construct it, spawn the control
/// loop with [`init`](Drive::init), then issue motions and wait on them.
pub struct Drive<D: Drivetrain + 'static, H: HeadingSensor + 'static> {
    drivetrain: Arc<D>,
    imu:        Arc<H>,
    config:     DriveConfig,
    state:      Arc<Mutex<MotionState>>,
    gains:      Arc<Mutex<DriveGains>>,
    started:    AtomicBool,
}

impl<D: Drivetrain + 'static, H: HeadingSensor + 'static> Drive<D, H> {
    /// Creates a controller for the given hardware. No thread is spawned
    /// until [`init`](Drive::init).
    pub fn new(drivetrain: D, imu: H, config: DriveConfig) -> Self {
        Self {
            drivetrain: Arc::new(drivetrain),
            imu: Arc::new(imu),
            config,
            state: Arc::new(Mutex::new(MotionState {
                motion:         Motion::Idle,
                heading_target: 0.0,
                max_speed:      0.0,
            })),
            gains: Arc::new(Mutex::new(DriveGains::default())),
            started: AtomicBool::new(false),
        }
    }

    /// Spawns the control loop thread. Call once, before the first motion;
    /// repeat calls are ignored with a warning.
    pub fn init(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("drive control loop already running");
            return;
        }
        let drivetrain = Arc::clone(&self.drivetrain);
        let imu = Arc::clone(&self.imu);
        let state = Arc::clone(&self.state);
        let gains = Arc::clone(&self.gains);
        let spawned = thread::Builder::new()
            .name("drive-control".into())
            .spawn(move || control_loop(drivetrain, imu, state, gains));
        if let Err(e) = spawned {
            error!("failed to spawn drive control loop: {e}");
        }
    }

    /// Calibrates the heading sensor, blocking until it settles or the
    /// calibration budget runs out. Rumbles the operator's controller when
    /// the sensor is ready.
    ///
    /// Returns `false` if the sensor never left its calibrating state; the
    /// control loop keeps running either way, but heading-dependent modes
    /// should not be used after a failure.
    pub fn calibrate_imu(&self, feedback: &dyn OperatorFeedback) -> bool {
        self.imu.calibrate();
        let mut waited: u64 = 0;
        while self.imu.is_calibrating() {
            waited += TICK_MS;
            if waited > CALIBRATION_BUDGET_MS {
                warn!("no heading sensor response, gave up after {waited} ms");
                return false;
            }
            thread::sleep(TICK);
        }
        feedback.rumble(".");
        info!("heading sensor calibrated in {waited} ms");
        true
    }

    /// Starts a straight-line drive of `target` inches (negative for
    /// reverse), capped at `max_speed`.
    ///
    /// `slew` ramps the first stretch of the motion up from the configured
    /// minimum power so the wheels don't slip. `heading_correction` adds a
    /// steering term that holds the heading left behind by the last turn,
    /// keeping the drive straight.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// chassis.drive(24.0, 110.0, true, true);  // forward two feet
    /// chassis.wait();
    /// chassis.drive(-12.0, 90.0, false, true); // back off a foot
    /// chassis.wait();
    /// ```
    pub fn drive(&self, target: f64, max_speed: f64, slew: bool, heading_correction: bool) {
        let ticks_per_inch = self.config.ticks_per_inch();
        let left_start = self.drivetrain.left_position() as f64;
        let right_start = self.drivetrain.right_position() as f64;

        let left_target = left_start + target * ticks_per_inch;
        let right_target = right_start + target * ticks_per_inch;

        // Backward only when the target sits behind both sides; everything
        // else, including a zero-length drive, counts as forward.
        let direction = if left_target < left_start && right_target < right_start {
            Direction::Backward
        } else {
            Direction::Forward
        };

        let left_sign = sgn(left_target - left_start);
        let right_sign = sgn(right_target - right_start);

        let (min_power, slew_ticks) = {
            let gains = lock(&self.gains);
            (
                gains.slew_min_power.get(direction),
                gains.slew_distance.get(direction) * ticks_per_inch,
            )
        };
        let left_slew = SlewRamp::new(left_start, slew_ticks, min_power, max_speed, left_sign);
        let right_slew = SlewRamp::new(right_start, slew_ticks, min_power, max_speed, right_sign);

        info!("drive started: {target:.1}\" -> ({left_target:.0}, {right_target:.0}) ticks");

        let mut state = lock(&self.state);
        state.max_speed = max_speed;
        state.motion = Motion::Drive {
            left_target,
            right_target,
            left_start,
            right_start,
            direction,
            heading_correction,
            left_slew,
            right_slew,
            slewing: slew,
        };
    }

    /// Starts an in-place turn to `degrees` (absolute heading, clockwise
    /// positive), capped at `max_speed`.
    pub fn turn(&self, degrees: f64, max_speed: f64) {
        let sign = sgn(degrees - self.imu.rotation());
        info!("turn started: target {degrees:.1} deg");

        let mut state = lock(&self.state);
        state.heading_target = degrees;
        state.max_speed = max_speed;
        state.motion = Motion::Turn { sign };
    }

    /// Starts a swing to `degrees`, pivoting on the right side: only the
    /// left train moves.
    pub fn left_swing(&self, degrees: f64, max_speed: f64) {
        self.swing(Side::Left, degrees, max_speed);
    }

    /// Starts a swing to `degrees`, pivoting on the left side: only the
    /// right train moves.
    pub fn right_swing(&self, degrees: f64, max_speed: f64) {
        self.swing(Side::Right, degrees, max_speed);
    }

    fn swing(&self, side: Side, degrees: f64, max_speed: f64) {
        let sign = sgn(degrees - self.imu.rotation());
        info!("{side:?} swing started: target {degrees:.1} deg");

        let mut state = lock(&self.state);
        state.heading_target = degrees;
        state.max_speed = max_speed;
        state.motion = Motion::Swing { side, sign };
    }

    /// Changes the speed cap of the motion in flight. Slew ramps keep the
    /// intercepts they were computed with.
    pub fn set_max_speed(&self, max_speed: f64) {
        lock(&self.state).max_speed = max_speed;
    }

    /// Applies a brake mode to the whole drivetrain.
    pub fn set_brake_mode(&self, mode: BrakeMode) { self.drivetrain.set_brake_mode(mode); }

    /// Zeroes both drive encoders.
    pub fn reset_drive_sensors(&self) { self.drivetrain.reset_positions(); }

    /// Zeroes the heading sensor.
    pub fn tare_gyro(&self) { self.imu.set_rotation(0.0); }

    /// Blocks until the active motion settles, gets close enough, or
    /// stalls.
    ///
    /// Polls the settle timers once per control tick with the active
    /// mode's thresholds. The outcome is advisory and only logged; the
    /// control loop keeps chasing the target either way.
    pub fn wait(&self) {
        thread::sleep(TICK);
        let mut monitor = SettleMonitor::new();
        loop {
            let stopped =
                self.drivetrain.left_velocity() == 0 && self.drivetrain.right_velocity() == 0;

            let (label, verdict) = {
                let state = lock(&self.state);
                match &state.motion {
                    Motion::Idle => return,
                    Motion::Drive { left_target, right_target, .. } => {
                        let left_error =
                            (left_target - self.drivetrain.left_position() as f64).abs();
                        let right_error =
                            (right_target - self.drivetrain.right_position() as f64).abs();
                        let error = left_error.max(right_error);
                        ("drive", monitor.tick(error, stopped, &SettleThresholds::DRIVE, TICK_MS))
                    }
                    Motion::Turn { .. } => {
                        let error = (state.heading_target - self.imu.rotation()).abs();
                        ("turn", monitor.tick(error, stopped, &SettleThresholds::TURN, TICK_MS))
                    }
                    Motion::Swing { .. } => {
                        let error = (state.heading_target - self.imu.rotation()).abs();
                        ("swing", monitor.tick(error, stopped, &SettleThresholds::TURN, TICK_MS))
                    }
                }
            };

            match verdict {
                SettleVerdict::Busy => thread::sleep(TICK),
                SettleVerdict::Settled => {
                    info!("{label} settled (small threshold)");
                    return;
                }
                SettleVerdict::GaveUp => {
                    warn!("{label} wait gave up (big threshold)");
                    return;
                }
                SettleVerdict::Stalled => {
                    warn!("{label} wait ended on zero velocity, chassis stalled?");
                    return;
                }
            }
        }
    }

    /// Blocks until the motion passes an intermediate point, so a routine
    /// can chain into its next command before the current motion settles.
    ///
    /// `value` is inches into the drive for drive motions and an absolute
    /// heading in degrees for turns and swings. Returns the instant the
    /// signed error to the intermediate point flips sign (the point was
    /// crossed); the settle timers run as a backstop in case it never is.
    pub fn wait_until(&self, value: f64) {
        enum Waypoint {
            Encoder { left: f64, right: f64 },
            Heading(f64),
        }

        let waypoint = {
            let state = lock(&self.state);
            match &state.motion {
                Motion::Idle => return,
                Motion::Drive { left_start, right_start, .. } => {
                    let ticks = value * self.config.ticks_per_inch();
                    Waypoint::Encoder { left: left_start + ticks, right: right_start + ticks }
                }
                Motion::Turn { .. } | Motion::Swing { .. } => Waypoint::Heading(value),
            }
        };

        match waypoint {
            Waypoint::Encoder { left, right } => {
                let left_sign = sgn(left - self.drivetrain.left_position() as f64);
                let right_sign = sgn(right - self.drivetrain.right_position() as f64);
                let mut monitor = SettleMonitor::new();
                loop {
                    let left_error = left - self.drivetrain.left_position() as f64;
                    let right_error = right - self.drivetrain.right_position() as f64;
                    if sgn(left_error) != left_sign && sgn(right_error) != right_sign {
                        info!("drive waypoint crossed, error sign flipped");
                        return;
                    }

                    let stopped = self.drivetrain.left_velocity() == 0
                        && self.drivetrain.right_velocity() == 0;
                    let error = left_error.abs().max(right_error.abs());
                    match monitor.tick(error, stopped, &SettleThresholds::DRIVE, TICK_MS) {
                        SettleVerdict::Busy => thread::sleep(TICK),
                        verdict => {
                            warn!("drive waypoint wait ended early: {verdict:?}");
                            return;
                        }
                    }
                }
            }
            Waypoint::Heading(target) => {
                let sign = sgn(target - self.imu.rotation());
                let mut monitor = SettleMonitor::new();
                loop {
                    let error = target - self.imu.rotation();
                    if sgn(error) != sign {
                        info!("heading waypoint crossed, error sign flipped");
                        return;
                    }

                    let stopped = self.drivetrain.left_velocity() == 0
                        && self.drivetrain.right_velocity() == 0;
                    match monitor.tick(error.abs(), stopped, &SettleThresholds::TURN, TICK_MS) {
                        SettleVerdict::Busy => thread::sleep(TICK),
                        verdict => {
                            warn!("heading waypoint wait ended early: {verdict:?}");
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Adjusts the forward drive PD gains.
    pub fn set_forward_drive_gains(&self, kp: f64, kd: f64) {
        lock(&self.gains).set_forward_drive(kp, kd);
    }

    /// Adjusts the backward drive PD gains.
    pub fn set_backward_drive_gains(&self, kp: f64, kd: f64) {
        lock(&self.gains).set_backward_drive(kp, kd);
    }

    /// Adjusts the heading-correction PD gains.
    pub fn set_heading_gains(&self, kp: f64, kd: f64) { lock(&self.gains).set_heading(kp, kd); }

    /// Adjusts the turn PID gains.
    pub fn set_turn_gains(&self, kp: f64, ki: f64, kd: f64) {
        lock(&self.gains).set_turn(kp, ki, kd);
    }

    /// Adjusts the turn integral engagement threshold and engaged cap.
    pub fn set_turn_integral(&self, start_error: f64, clipped_speed: f64) {
        lock(&self.gains).set_turn_integral(start_error, clipped_speed);
    }

    /// Adjusts the swing PD gains.
    pub fn set_swing_gains(&self, kp: f64, kd: f64) { lock(&self.gains).set_swing(kp, kd); }

    /// Adjusts the slew starting power (forward, backward).
    pub fn set_slew_min_power(&self, forward: f64, backward: f64) {
        lock(&self.gains).set_slew_min_power(forward, backward);
    }

    /// Adjusts the slew distance in inches (forward, backward).
    pub fn set_slew_distance(&self, forward: f64, backward: f64) {
        lock(&self.gains).set_slew_distance(forward, backward);
    }

    /// Restores the forward drive gains to their compiled defaults.
    pub fn reset_forward_drive_gains(&self) { lock(&self.gains).reset_forward_drive(); }

    /// Restores the backward drive gains to their compiled defaults.
    pub fn reset_backward_drive_gains(&self) { lock(&self.gains).reset_backward_drive(); }

    /// Restores the heading gains to their compiled defaults.
    pub fn reset_heading_gains(&self) { lock(&self.gains).reset_heading(); }

    /// Restores the turn gains to their compiled defaults.
    pub fn reset_turn_gains(&self) { lock(&self.gains).reset_turn(); }

    /// Restores the turn integral parameters to their compiled defaults.
    pub fn reset_turn_integral(&self) { lock(&self.gains).reset_turn_integral(); }

    /// Restores the swing gains to their compiled defaults.
    pub fn reset_swing_gains(&self) { lock(&self.gains).reset_swing(); }

    /// Restores the slew starting power to its compiled defaults.
    pub fn reset_slew_min_power(&self) { lock(&self.gains).reset_slew_min_power(); }

    /// Restores the slew distance to its compiled defaults.
    pub fn reset_slew_distance(&self) { lock(&self.gains).reset_slew_distance(); }
}
