//! # Gamepad Module
//!
//! Detects game controllers through the Linux evdev interface and reads their
//! events on dedicated threads.
//!
//! ## Controller Detection
//!
//! Any `/dev/input/event*` node qualifies when it:
//! - supports `BTN_SOUTH` (modern gamepads) or `BTN_TRIGGER` (joysticks), and
//! - reports at least one absolute axis.
//!
//! Nodes are scanned in sorted order so device ids are stable across runs
//! with the same hardware.
//!
//! ## Readers
//!
//! `fetch_events` blocks, so each pad gets an OS thread that forwards
//! translated events into a bounded tokio channel. When the pad disappears
//! the thread sends [`RawEvent::DeviceRemoved`] and exits.

use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use evdev::{Device, Key};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::mapper::EventMapper;
use crate::engine::{DeviceEvent, DeviceId, RawEvent};
use crate::error::{Result, StenoStickError};

/// Directory scanned for event nodes
const INPUT_DIR: &str = "/dev/input";

/// `ENODEV`, returned by evdev reads once the device is unplugged
const ENODEV: i32 = 19;

/// Whether an evdev device looks like a gamepad or joystick.
#[must_use]
pub fn is_gamepad(device: &Device) -> bool {
    let has_buttons = device.supported_keys().map_or(false, |keys| {
        keys.contains(Key::BTN_SOUTH) || keys.contains(Key::BTN_TRIGGER)
    });
    let has_axes = device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.iter().next().is_some());
    has_buttons && has_axes
}

/// An opened game controller
pub struct Gamepad {
    id: DeviceId,
    device: Device,
    device_path: PathBuf,
}

impl Gamepad {
    /// Opens a single event node without checking its capabilities.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the node cannot be opened
    pub fn open(id: DeviceId, path: &Path) -> Result<Self> {
        let device = Device::open(path)?;
        Ok(Self {
            id,
            device,
            device_path: path.to_path_buf(),
        })
    }

    /// Opens every detected gamepad, or only `path` when one is given.
    ///
    /// Ids are assigned from 0 in scan order.
    ///
    /// # Errors
    ///
    /// - `DeviceNotFound`: nothing qualifying was found
    /// - `Device`: `/dev/input` cannot be read
    /// - `Io`: an explicitly configured node cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use steno_stick::controller::gamepad::Gamepad;
    ///
    /// for pad in Gamepad::open_all(None)? {
    ///     println!("{}: {}", pad.id(), pad.device_path().display());
    /// }
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open_all(path: Option<&Path>) -> Result<Vec<Self>> {
        if let Some(path) = path {
            let pad = Self::open(DeviceId(0), path)?;
            if !is_gamepad(&pad.device) {
                warn!(
                    "{} does not look like a gamepad, using it anyway",
                    path.display()
                );
            }
            info!("Using {} ({})", path.display(), pad.name().unwrap_or("unnamed"));
            return Ok(vec![pad]);
        }

        let pads: Vec<Self> = scan(Path::new(INPUT_DIR))?
            .into_iter()
            .enumerate()
            .map(|(index, (device_path, device))| Self {
                id: DeviceId(index as u32),
                device,
                device_path,
            })
            .collect();

        if pads.is_empty() {
            return Err(StenoStickError::DeviceNotFound(INPUT_DIR.to_string()));
        }

        for pad in &pads {
            info!(
                "Found gamepad {} at {} ({})",
                pad.id.0,
                pad.device_path.display(),
                pad.name().unwrap_or("unnamed")
            );
        }
        Ok(pads)
    }

    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// The `/dev/input/eventX` node this pad was opened from
    #[must_use]
    pub fn device_path(&self) -> &Path {
        &self.device_path
    }

    /// Human-readable device name reported by the driver
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Fetch events from the controller, blocking until some are available
    ///
    /// # Errors
    ///
    /// Returns `Io` if reading fails (e.g., controller disconnected).
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = evdev::InputEvent> + '_> {
        Ok(self.device.fetch_events()?)
    }

    /// Reads this pad on a new thread until it disappears or `events` closes.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the thread cannot be spawned
    pub fn spawn_reader(
        self,
        mut mapper: EventMapper,
        events: mpsc::Sender<DeviceEvent>,
    ) -> Result<JoinHandle<()>> {
        let name = format!("gamepad-{}", self.id.0);
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || self.read_loop(&mut mapper, &events))?;
        Ok(handle)
    }

    fn read_loop(mut self, mapper: &mut EventMapper, events: &mpsc::Sender<DeviceEvent>) {
        let id = self.id;
        loop {
            let batch: Vec<RawEvent> = match self.device.fetch_events() {
                Ok(fetched) => fetched
                    .filter_map(|event| mapper.process_event(&event))
                    .collect(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    if e.raw_os_error() == Some(ENODEV) {
                        info!("{} disconnected ({})", id, self.device_path.display());
                    } else {
                        warn!("{} read failed: {}", id, e);
                    }
                    let _ = events.blocking_send(DeviceEvent {
                        device: id,
                        event: RawEvent::DeviceRemoved,
                    });
                    return;
                }
            };

            for event in batch {
                if events.blocking_send(DeviceEvent { device: id, event }).is_err() {
                    debug!("{} reader stopping, session closed", id);
                    return;
                }
            }
        }
    }
}

/// Opens every gamepad under `dir`, in sorted path order.
fn scan(dir: &Path) -> Result<Vec<(PathBuf, Device)>> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| StenoStickError::Device(format!("Failed to read {}: {}", dir.display(), e)))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| is_event_node(path))
        .collect();
    entries.sort();

    let mut found = Vec::new();
    for path in entries {
        match Device::open(&path) {
            Ok(device) => {
                let id = device.input_id();
                debug!(
                    "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
                    path.display(),
                    id.vendor(),
                    id.product()
                );
                if is_gamepad(&device) {
                    found.push((path, device));
                }
            }
            Err(e) => {
                // Permission denied or other errors - skip device
                debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }
    Ok(found)
}

fn is_event_node(path: &Path) -> bool {
    path.file_name()
        .map_or(false, |name| name.to_string_lossy().starts_with("event"))
}
