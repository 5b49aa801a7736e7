//! # Stroke Output
//!
//! [`StrokeSink`] implementations that write completed strokes to stdout or a
//! file.
//!
//! | Format  | One line per stroke                                         |
//! |---------|-------------------------------------------------------------|
//! | `text`  | `TW`                                                        |
//! | `jsonl` | `{"timestamp":"…","device":0,"keys":["T-","W-"],"steno":"TW"}` |
//!
//! Every line is flushed as soon as it is written so a consumer reading the
//! stream sees strokes immediately.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::OutputFormat;
use crate::engine::{DeviceId, Stroke};
use crate::error::Result;
use crate::session::StrokeSink;

/// One JSONL line.
#[derive(Debug, Serialize)]
pub struct StrokeRecord<'a> {
    /// RFC 3339 time the stroke completed
    pub timestamp: String,
    pub device: u32,
    pub keys: Vec<&'a str>,
    pub steno: String,
}

impl<'a> StrokeRecord<'a> {
    #[must_use]
    pub fn new(device: DeviceId, stroke: &'a Stroke, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at.to_rfc3339(),
            device: device.0,
            keys: stroke.keys().collect(),
            steno: stroke.to_string(),
        }
    }
}

/// Writes strokes in one [`OutputFormat`] to any [`Write`] target.
///
/// # Examples
///
/// ```
/// use steno_stick::config::OutputFormat;
/// use steno_stick::engine::{DeviceId, Stroke};
/// use steno_stick::output::StrokeWriter;
/// use steno_stick::session::StrokeSink;
///
/// let mut writer = StrokeWriter::new(OutputFormat::Text, Vec::new());
/// writer.send_stroke(DeviceId(0), &Stroke::from_keys(["T-", "W-"]));
/// assert_eq!(writer.get_ref().as_slice(), b"TW\n");
/// ```
pub struct StrokeWriter<W> {
    format: OutputFormat,
    writer: W,
    lines_written: u64,
}

impl<W: Write> StrokeWriter<W> {
    #[must_use]
    pub fn new(format: OutputFormat, writer: W) -> Self {
        Self {
            format,
            writer,
            lines_written: 0,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Writes one stroke and flushes.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying writer fails
    pub fn write_stroke(&mut self, device: DeviceId, stroke: &Stroke) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{}", stroke)?,
            OutputFormat::Jsonl => {
                let record = StrokeRecord::new(device, stroke, Utc::now());
                serde_json::to_writer(&mut self.writer, &record)?;
                self.writer.write_all(b"\n")?;
            }
        }
        self.writer.flush()?;
        self.lines_written += 1;
        Ok(())
    }
}

impl<W: Write> StrokeSink for StrokeWriter<W> {
    fn send_stroke(&mut self, device: DeviceId, stroke: &Stroke) {
        if let Err(e) = self.write_stroke(device, stroke) {
            warn!("Failed to write stroke {} from {}: {}", stroke, device, e);
        }
    }
}

/// Opens the configured destination.
///
/// Files are opened for append and created if missing; `None` means stdout.
///
/// # Errors
///
/// Returns error if the output file cannot be opened
pub fn open(format: OutputFormat, path: Option<&Path>) -> Result<StrokeWriter<Box<dyn Write + Send>>> {
    let writer: Box<dyn Write + Send> = match path {
        Some(path) => {
            let file: File = OpenOptions::new().create(true).append(true).open(path)?;
            info!("Writing {:?} strokes to {}", format, path.display());
            Box::new(file)
        }
        None => {
            info!("Writing {:?} strokes to stdout", format);
            Box::new(io::stdout())
        }
    };
    Ok(StrokeWriter::new(format, writer))
}
