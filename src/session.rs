//! # Capture Session
//!
//! Routes device-tagged events to one [`Engine`] per device and hands every
//! completed stroke to a [`StrokeSink`].
//!
//! All engines share one read-only [`Mapping`]; no mutable state crosses
//! device boundaries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::{DeviceEvent, DeviceId, Engine, EngineSettings, RawEvent, Stroke};
use crate::grammar::Mapping;

/// Receives completed strokes.
#[cfg_attr(test, mockall::automock)]
pub trait StrokeSink {
    /// Called once per completed, non-empty stroke.
    fn send_stroke(&mut self, device: DeviceId, stroke: &Stroke);
}

impl StrokeSink for Vec<(DeviceId, Stroke)> {
    fn send_stroke(&mut self, device: DeviceId, stroke: &Stroke) {
        self.push((device, stroke.clone()));
    }
}

/// Active capture across any number of devices.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use steno_stick::engine::{DeviceEvent, DeviceId, EngineSettings, RawEvent};
/// use steno_stick::grammar::Mapping;
/// use steno_stick::session::Session;
///
/// let mapping = Arc::new(Mapping::parse("button 0 is a\na -> -Z\n"));
/// let mut session = Session::new(mapping, EngineSettings::default(), Vec::new());
///
/// let pad = DeviceId(0);
/// session.dispatch(DeviceEvent { device: pad, event: RawEvent::Button { button: 0, pressed: true } });
/// session.dispatch(DeviceEvent { device: pad, event: RawEvent::Button { button: 0, pressed: false } });
///
/// assert_eq!(session.sink().len(), 1);
/// ```
pub struct Session<S> {
    mapping: Arc<Mapping>,
    settings: EngineSettings,
    engines: HashMap<DeviceId, Engine>,
    sink: S,
    strokes_sent: u64,
}

impl<S: StrokeSink> Session<S> {
    #[must_use]
    pub fn new(mapping: Arc<Mapping>, settings: EngineSettings, sink: S) -> Self {
        Self {
            mapping,
            settings,
            engines: HashMap::new(),
            sink,
            strokes_sent: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of strokes handed to the sink so far.
    pub fn strokes_sent(&self) -> u64 {
        self.strokes_sent
    }

    /// Devices with live engines.
    pub fn active_devices(&self) -> usize {
        self.engines.len()
    }

    /// Engine for a device, if it has produced any events.
    pub fn engine(&self, device: DeviceId) -> Option<&Engine> {
        self.engines.get(&device)
    }

    /// Feeds one event to its device's engine.
    pub fn dispatch(&mut self, event: DeviceEvent) {
        let DeviceEvent { device, event } = event;

        if event == RawEvent::DeviceRemoved {
            if let Some(mut engine) = self.engines.remove(&device) {
                engine.handle(RawEvent::DeviceRemoved);
                info!("{} removed", device);
            }
            return;
        }

        let mapping = &self.mapping;
        let settings = self.settings;
        let engine = self.engines.entry(device).or_insert_with(|| {
            debug!("Starting engine for {}", device);
            Engine::new(Arc::clone(mapping), settings)
        });

        if let Some(stroke) = engine.handle(event) {
            self.strokes_sent += 1;
            self.sink.send_stroke(device, &stroke);
        }
    }

    /// Consumes events until the channel closes or `shutdown` resolves.
    ///
    /// Returns the session so callers can inspect it afterwards.
    pub async fn run<F>(mut self, mut events: mpsc::Receiver<DeviceEvent>, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Some(event) => self.dispatch(event),
                    None => {
                        info!("All devices closed");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.stop();
        self
    }

    /// Drops every engine, discarding unfinished strokes.
    pub fn stop(&mut self) {
        for (device, mut engine) in self.engines.drain() {
            debug!("Stopping engine for {}", device);
            engine.reset();
        }
    }
}
