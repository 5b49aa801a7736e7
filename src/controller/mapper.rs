//! # Controller Event Mapper Module
//!
//! Converts raw evdev events into the engine's [`RawEvent`] vocabulary.
//!
//! ## Event Types
//!
//! - **EV_ABS (Absolute Axis)**: sticks, triggers and hats
//! - **EV_KEY (Key/Button)**: digital buttons
//!
//! Everything else (sync reports, force feedback, LEDs) is ignored.
//!
//! ## Numbering
//!
//! | Input  | Engine id | Source |
//! |--------|-----------|--------|
//! | Axis   | evdev `ABS_*` code | `ABS_X` = 0, `ABS_Y` = 1, `ABS_Z` = 2, `ABS_RX` = 3, ... |
//! | Button | position among the device's supported keys | codes from `BTN_JOYSTICK` up first, then lower codes |
//! | Hat    | `ABS_HAT0X/Y` .. `ABS_HAT3X/Y` | hats 0..=3 |
//!
//! Button numbering follows the SDL joystick convention, so a typical pad
//! reports `BTN_SOUTH` as button 0 and keyboard-range keys such as
//! `KEY_RECORD` come after every `BTN_*` code.
//!
//! ## Usage
//!
//! ```no_run
//! use steno_stick::controller::gamepad::Gamepad;
//! use steno_stick::controller::mapper::EventMapper;
//! use steno_stick::grammar::Mapping;
//!
//! let mapping = Mapping::builtin();
//! let mut pad = Gamepad::open_all(None)?.remove(0);
//! let mut mapper = EventMapper::for_device(pad.device(), &mapping, 0.1)?;
//!
//! for event in pad.fetch_events()? {
//!     if let Some(raw) = mapper.process_event(&event) {
//!         println!("{:?}", raw);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::{HashMap, HashSet};

use evdev::{AbsoluteAxisType, Device, InputEvent, InputEventKind, Key};
use tracing::trace;

use super::calibration::AxisCalibration;
use crate::engine::{HatDirection, RawEvent};
use crate::error::Result;
use crate::grammar::Mapping;

/// `BTN_JOYSTICK`, first code SDL numbers as a joystick button.
const BTN_JOYSTICK: u16 = 0x120;

/// evdev reports key auto-repeat with this value.
const KEY_REPEAT: i32 = 2;

/// Number of hats evdev can describe (`ABS_HAT0X` .. `ABS_HAT3Y`).
pub const HAT_COUNT: u16 = 4;

/// Hat index and whether the axis is the hat's y axis, for hat axis codes.
fn hat_axis(axis: AbsoluteAxisType) -> Option<(u16, bool)> {
    let first = AbsoluteAxisType::ABS_HAT0X.0;
    let offset = axis.0.checked_sub(first)?;
    (offset < HAT_COUNT * 2).then_some((offset / 2, offset % 2 == 1))
}

/// Per-device translator from evdev events to [`RawEvent`]s.
///
/// # Examples
///
/// ```
/// use evdev::{AbsoluteAxisType, EventType, InputEvent, Key};
/// use steno_stick::controller::calibration::AxisCalibration;
/// use steno_stick::controller::mapper::EventMapper;
/// use steno_stick::engine::RawEvent;
///
/// let mut mapper = EventMapper::new(0.1)
///     .with_buttons([Key::BTN_SOUTH, Key::BTN_EAST])
///     .with_axis(AbsoluteAxisType::ABS_X.0, AxisCalibration::new(0, 255));
///
/// let press = InputEvent::new(EventType::KEY, Key::BTN_EAST.code(), 1);
/// assert_eq!(
///     mapper.process_event(&press),
///     Some(RawEvent::Button { button: 1, pressed: true })
/// );
///
/// let left = InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_X.0, 0);
/// assert_eq!(mapper.process_event(&left), Some(RawEvent::Axis { axis: 0, value: -1.0 }));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventMapper {
    /// evdev key code to SDL-style button index
    buttons: HashMap<u16, u16>,
    axes: HashMap<u16, AxisCalibration>,
    triggers: HashSet<u16>,
    trigger_dead_zone: f64,
    /// Last (x, y) signs reported per hat
    hats: HashMap<u16, (i8, i8)>,
}

impl EventMapper {
    /// Creates a mapper with no buttons, no triggers and default axis ranges.
    ///
    /// # Arguments
    ///
    /// * `trigger_dead_zone` - Trigger readings at or below this fraction report 0.0
    #[must_use]
    pub fn new(trigger_dead_zone: f64) -> Self {
        Self {
            trigger_dead_zone,
            ..Self::default()
        }
    }

    /// Normalizes these axis codes as triggers (0.0..=1.0).
    #[must_use]
    pub fn with_triggers<I: IntoIterator<Item = u16>>(mut self, triggers: I) -> Self {
        self.triggers.extend(triggers);
        self
    }

    /// Numbers `keys` the way SDL does: codes from `BTN_JOYSTICK` upward in
    /// ascending order, then the codes below it.
    #[must_use]
    pub fn with_buttons<I: IntoIterator<Item = Key>>(mut self, keys: I) -> Self {
        let mut codes: Vec<u16> = keys.into_iter().map(|key| key.code()).collect();
        codes.sort_unstable_by_key(|&code| (code < BTN_JOYSTICK, code));
        codes.dedup();
        self.buttons = codes
            .into_iter()
            .enumerate()
            .map(|(index, code)| (code, index as u16))
            .collect();
        self
    }

    /// Sets the raw range of one axis.
    #[must_use]
    pub fn with_axis(mut self, axis: u16, calibration: AxisCalibration) -> Self {
        self.axes.insert(axis, calibration);
        self
    }

    /// Builds a mapper from a device's reported keys and axis ranges.
    ///
    /// Axes the mapping declares as triggers are normalized to 0.0..=1.0.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the device's axis ranges cannot be read
    pub fn for_device(device: &Device, mapping: &Mapping, trigger_dead_zone: f64) -> Result<Self> {
        let mut mapper = Self::new(trigger_dead_zone).with_triggers(mapping.triggers().keys().copied());

        if let Some(keys) = device.supported_keys() {
            mapper = mapper.with_buttons(keys.iter());
        }

        if let Some(axes) = device.supported_absolute_axes() {
            let ranges = device.get_abs_state()?;
            for axis in axes.iter() {
                if hat_axis(axis).is_some() {
                    continue;
                }
                if let Some(info) = ranges.get(usize::from(axis.0)) {
                    trace!("Axis {:?} range {}..={}", axis, info.minimum, info.maximum);
                    mapper
                        .axes
                        .insert(axis.0, AxisCalibration::new(info.minimum, info.maximum));
                }
            }
        }

        Ok(mapper)
    }

    /// SDL-style index of a key, if the device reported it.
    #[must_use]
    pub fn button_index(&self, key: Key) -> Option<u16> {
        self.buttons.get(&key.code()).copied()
    }

    /// Translates one evdev event.
    ///
    /// Returns `None` for events the engine has no use for: sync reports, key
    /// auto-repeat, unknown keys and hat reports that leave the direction
    /// unchanged.
    pub fn process_event(&mut self, event: &InputEvent) -> Option<RawEvent> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => self.process_axis_event(axis, event.value()),
            InputEventKind::Key(key) => self.process_key_event(key, event.value()),
            _ => None,
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) -> Option<RawEvent> {
        if let Some((hat, is_y)) = hat_axis(axis) {
            return self.process_hat_event(hat, is_y, value);
        }

        let calibration = self.axes.get(&axis.0).copied().unwrap_or_default();
        let value = if self.triggers.contains(&axis.0) {
            calibration.trigger(value, self.trigger_dead_zone)
        } else {
            calibration.stick(value)
        };

        Some(RawEvent::Axis {
            axis: axis.0,
            value,
        })
    }

    fn process_hat_event(&mut self, hat: u16, is_y: bool, value: i32) -> Option<RawEvent> {
        let sign = value.signum() as i8;
        let position = self.hats.entry(hat).or_insert((0, 0));
        let before = HatDirection::from_axes(position.0, position.1);

        if is_y {
            position.1 = sign;
        } else {
            position.0 = sign;
        }

        let direction = HatDirection::from_axes(position.0, position.1);
        (direction != before).then_some(RawEvent::Hat { hat, direction })
    }

    fn process_key_event(&self, key: Key, value: i32) -> Option<RawEvent> {
        if value == KEY_REPEAT {
            return None;
        }
        match self.button_index(key) {
            Some(button) => Some(RawEvent::Button {
                button,
                pressed: value != 0,
            }),
            None => {
                trace!("Ignoring unknown key {:?}", key);
                None
            }
        }
    }
}
