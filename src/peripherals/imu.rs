//! Heading sensor seam.

/// A single heading source: a gyro or inertial sensor reporting how far the
/// robot has rotated since the last reset.
///
/// Rotation is in degrees, unbounded (a full spin reads 360, not 0), with
/// clockwise positive. The control loop reads it every tick in turn and
/// swing modes and for heading correction while driving straight.
///
/// Calibration is split in two: [`calibrate`](HeadingSensor::calibrate)
/// begins a calibration cycle and returns immediately, and
/// [`is_calibrating`](HeadingSensor::is_calibrating) reports whether the
/// cycle is still running. The bounded wait lives in the drive controller,
/// which polls until the sensor settles or gives up.
pub trait HeadingSensor: Send + Sync {
    /// Begins a calibration cycle.
    fn calibrate(&self);

    /// True while a calibration cycle is still running.
    fn is_calibrating(&self) -> bool;

    /// Accumulated rotation in degrees since the last reset.
    fn rotation(&self) -> f64;

    /// Overwrites the accumulated rotation.
    fn set_rotation(&self, degrees: f64);
}
