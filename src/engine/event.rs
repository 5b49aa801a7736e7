//! # Event Vocabulary
//!
//! Raw events as delivered by a device integration, and the normalized events
//! the recognition core consumes.

use std::fmt;

/// Identifies one physical device so callers can route its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device {}", self.0)
    }
}

/// Position of a hat switch.
///
/// Screen directions: `Up` is away from the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HatDirection {
    Centered,
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl HatDirection {
    pub const UP_BIT: u8 = 0x01;
    pub const RIGHT_BIT: u8 = 0x02;
    pub const DOWN_BIT: u8 = 0x04;
    pub const LEFT_BIT: u8 = 0x08;

    /// Decodes an SDL-style hat bitmask. Opposing bits cancel out.
    ///
    /// # Examples
    ///
    /// ```
    /// use steno_stick::engine::HatDirection;
    ///
    /// assert_eq!(HatDirection::from_bits(0), HatDirection::Centered);
    /// assert_eq!(HatDirection::from_bits(0x03), HatDirection::UpRight);
    /// assert_eq!(HatDirection::from_bits(0x05), HatDirection::Centered);
    /// ```
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        let x = i8::from(bits & Self::RIGHT_BIT != 0) - i8::from(bits & Self::LEFT_BIT != 0);
        let y = i8::from(bits & Self::DOWN_BIT != 0) - i8::from(bits & Self::UP_BIT != 0);
        Self::from_axes(x, y)
    }

    /// Builds a direction from the signs of a hat's x and y axes
    /// (`+x` right, `+y` down), as evdev reports them.
    #[must_use]
    pub fn from_axes(x: i8, y: i8) -> Self {
        match (x.signum(), y.signum()) {
            (0, 0) => HatDirection::Centered,
            (0, -1) => HatDirection::Up,
            (1, -1) => HatDirection::UpRight,
            (1, 0) => HatDirection::Right,
            (1, 1) => HatDirection::DownRight,
            (0, 1) => HatDirection::Down,
            (-1, 1) => HatDirection::DownLeft,
            (-1, 0) => HatDirection::Left,
            _ => HatDirection::UpLeft,
        }
    }

    /// Symbol suffix appended to the hat's name, e.g. `dpadur`.
    #[must_use]
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            HatDirection::Centered => None,
            HatDirection::Up => Some("u"),
            HatDirection::UpRight => Some("ur"),
            HatDirection::Right => Some("r"),
            HatDirection::DownRight => Some("dr"),
            HatDirection::Down => Some("d"),
            HatDirection::DownLeft => Some("dl"),
            HatDirection::Left => Some("l"),
            HatDirection::UpLeft => Some("ul"),
        }
    }

    /// The two orthogonal directions making up a diagonal.
    #[must_use]
    pub fn components(self) -> Option<[HatDirection; 2]> {
        match self {
            HatDirection::UpRight => Some([HatDirection::Up, HatDirection::Right]),
            HatDirection::DownRight => Some([HatDirection::Down, HatDirection::Right]),
            HatDirection::DownLeft => Some([HatDirection::Down, HatDirection::Left]),
            HatDirection::UpLeft => Some([HatDirection::Up, HatDirection::Left]),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_diagonal(self) -> bool {
        self.components().is_some()
    }
}

/// Events as produced by a device integration.
///
/// Ids are raw numbers; axis values are already normalized
/// (sticks in `[-1, 1]`, triggers in `[0, 1]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawEvent {
    Axis { axis: u16, value: f64 },
    Button { button: u16, pressed: bool },
    Hat { hat: u16, direction: HatDirection },
    DeviceRemoved,
}

/// A raw event tagged with the device that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceEvent {
    pub device: DeviceId,
    pub event: RawEvent,
}

/// Events in the core's vocabulary, with renames applied.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    AxisSample { axis: u16, value: f64 },
    ButtonEdge { name: String, pressed: bool },
    /// The hat moved to a non-centered position.
    HatMoved { name: String, direction: HatDirection },
    /// The hat returned to center; `symbols` are what the push contributes.
    HatCentered { name: String, symbols: Vec<String> },
    DeviceLost,
}
