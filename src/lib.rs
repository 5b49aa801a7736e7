//! # Steno Stick Library
//!
//! Write steno chords with a game controller.
//!
//! This library turns controller input (stick gestures, trigger pulls, button
//! chords and hat pushes) into steno strokes, driven by a small line-oriented
//! mapping language.
//!
//! - [`grammar`]: the mapping language and the [`grammar::Mapping`] model
//! - [`engine`]: per-device recognition, from raw events to [`engine::Stroke`]s
//! - [`session`]: routing many devices to their engines and a stroke sink
//! - [`controller`]: evdev gamepads
//! - [`output`]: text and JSONL stroke writers

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod output;
pub mod session;
