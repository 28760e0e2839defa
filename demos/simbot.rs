//! A short autonomous routine run against a simulated chassis.
//!
//! The sim is a first-order plant: wheels advance proportionally to the
//! commanded power each tick, and the heading follows the difference
//! between the two sides. Run with:
//!
//! ```text
//! cargo run --example simbot
//! ```

use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use log::{LevelFilter, info};
use talos::{
    drivetrain::{BrakeMode, Drivetrain},
    fs::logger,
    motion::drive::{Drive, DriveConfig},
    peripherals::{feedback::Silent, imu::HeadingSensor},
};

/// Wheel travel per tick per unit of commanded power.
const PLANT_GAIN: f64 = 0.25;

/// Heading change per tick of left/right wheel split.
const DEG_PER_TICK: f64 = 0.05;

#[derive(Debug, Default)]
struct SimState {
    left:           f64,
    right:          f64,
    left_step:      f64,
    right_step:     f64,
    heading_offset: f64,
}

impl SimState {
    fn heading(&self) -> f64 { (self.left - self.right) * DEG_PER_TICK - self.heading_offset }
}

/// Simulated chassis: one struct serves as both the drivetrain and the
/// heading sensor.
#[derive(Clone, Default)]
struct SimBot {
    state: Arc<Mutex<SimState>>,
}

impl Drivetrain for SimBot {
    fn set_left(&self, power: f64) {
        let mut s = self.state.lock().unwrap();
        s.left_step = power * PLANT_GAIN;
        s.left += s.left_step;
    }

    fn set_right(&self, power: f64) {
        let mut s = self.state.lock().unwrap();
        s.right_step = power * PLANT_GAIN;
        s.right += s.right_step;
    }

    fn set_brake_mode(&self, _mode: BrakeMode) {}

    fn left_position(&self) -> i32 { self.state.lock().unwrap().left.round() as i32 }

    fn right_position(&self) -> i32 { self.state.lock().unwrap().right.round() as i32 }

    fn left_velocity(&self) -> i32 { self.state.lock().unwrap().left_step.round() as i32 }

    fn right_velocity(&self) -> i32 { self.state.lock().unwrap().right_step.round() as i32 }

    fn reset_positions(&self) {
        let mut s = self.state.lock().unwrap();
        s.left = 0.0;
        s.right = 0.0;
    }
}

impl HeadingSensor for SimBot {
    fn calibrate(&self) {}

    fn is_calibrating(&self) -> bool { false }

    fn rotation(&self) -> f64 { self.state.lock().unwrap().heading() }

    fn set_rotation(&self, degrees: f64) {
        let mut s = self.state.lock().unwrap();
        s.heading_offset = 0.0;
        s.heading_offset = s.heading() - degrees;
    }
}

fn main() {
    logger::init(LevelFilter::Info).expect("logger init failed");

    let bot = SimBot::default();
    let chassis = Drive::new(bot.clone(), bot.clone(), DriveConfig {
        wheel_diameter: 4.0,
        cartridge_rpm:  200.0,
        gear_ratio:     1.0,
    });
    chassis.init();
    chassis.calibrate_imu(&Silent);

    // The sim "calibrates" instantly; still give the loop its startup
    // grace window before commanding motion.
    thread::sleep(Duration::from_millis(1600));

    // The sim plant has no inertia, so soften the derivative gains.
    chassis.set_forward_drive_gains(0.45, 1.0);
    chassis.set_backward_drive_gains(0.45, 1.0);

    chassis.drive(24.0, 110.0, true, true);
    chassis.wait();

    chassis.turn(90.0, 90.0);
    chassis.wait();

    chassis.drive(-12.0, 90.0, false, true);
    chassis.wait();

    info!(
        "routine finished at ({}, {}) ticks, heading {:.1} deg",
        bot.left_position(),
        bot.right_position(),
        bot.rotation()
    );
}
