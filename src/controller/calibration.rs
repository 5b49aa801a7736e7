//! # Calibration Module
//!
//! Maps raw evdev axis readings onto the ranges the recognition engine
//! expects.
//!
//! ## Ranges
//!
//! | Axis kind | Raw         | Normalized |
//! |-----------|-------------|------------|
//! | Stick     | `min..=max` | `-1.0..=1.0`, midpoint is 0 |
//! | Trigger   | `min..=max` | `0.0..=1.0`, `min` is released |
//!
//! Trigger readings at or below the trigger dead zone are reported as exactly
//! 0.0, since worn triggers rarely settle back to their minimum.
//!
//! ## Usage
//!
//! ```
//! use steno_stick::controller::calibration::AxisCalibration;
//!
//! let cal = AxisCalibration::new(0, 255);
//!
//! assert_eq!(cal.stick(0), -1.0);
//! assert_eq!(cal.stick(255), 1.0);
//! assert_eq!(cal.trigger(10, 0.1), 0.0);
//! assert_eq!(cal.trigger(255, 0.1), 1.0);
//! ```

/// Reported range of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCalibration {
    min: i32,
    max: i32,
}

impl Default for AxisCalibration {
    /// Signed 16-bit range, used when a device reports no range.
    fn default() -> Self {
        Self {
            min: i32::from(i16::MIN),
            max: i32::from(i16::MAX),
        }
    }
}

impl AxisCalibration {
    /// Creates a calibration for `min..=max`.
    ///
    /// A degenerate range (`max <= min`) falls back to the default range.
    ///
    /// # Arguments
    ///
    /// * `min` - Smallest raw value the axis reports
    /// * `max` - Largest raw value the axis reports
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        if max <= min {
            return Self::default();
        }
        Self { min, max }
    }

    #[must_use]
    pub fn min(&self) -> i32 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Fraction of the way from `min` to `max`, clamped to 0.0..=1.0.
    fn fraction(&self, raw: i32) -> f64 {
        let span = f64::from(self.max) - f64::from(self.min);
        ((f64::from(raw) - f64::from(self.min)) / span).clamp(0.0, 1.0)
    }

    /// Normalizes a stick reading to -1.0..=1.0.
    ///
    /// # Examples
    ///
    /// ```
    /// use steno_stick::controller::calibration::AxisCalibration;
    ///
    /// let cal = AxisCalibration::new(-100, 100);
    /// assert_eq!(cal.stick(0), 0.0);
    /// assert_eq!(cal.stick(-50), -0.5);
    /// ```
    #[must_use]
    pub fn stick(&self, raw: i32) -> f64 {
        self.fraction(raw) * 2.0 - 1.0
    }

    /// Normalizes a trigger reading to 0.0..=1.0.
    ///
    /// # Arguments
    ///
    /// * `raw` - Raw evdev value
    /// * `dead_zone` - Readings at or below this fraction report 0.0
    #[must_use]
    pub fn trigger(&self, raw: i32, dead_zone: f64) -> f64 {
        let value = self.fraction(raw);
        if value <= dead_zone {
            0.0
        } else {
            value
        }
    }
}
