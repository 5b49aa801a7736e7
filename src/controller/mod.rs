//! # Controller Module
//!
//! Game controller input via Linux evdev.
//!
//! This module handles:
//! - Gamepad detection and one reader thread per pad
//! - Translating evdev events into engine [`RawEvent`](crate::engine::RawEvent)s
//! - Normalizing axis ranges and the trigger dead zone

pub mod calibration;
pub mod gamepad;
pub mod mapper;

pub use calibration::AxisCalibration;
pub use gamepad::Gamepad;
pub use mapper::EventMapper;
