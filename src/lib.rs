//! `tally` is a command-line tracker for sets of items organized into
//! named projects. Every item is an append-only log of timestamped field
//! changes, so the current state of an item and its whole history are both
//! first-class.
//!
//! The crate splits into the [`tracker`] engine (storage, configuration,
//! ids, filtering, command-line expansion), the [`cmd`] layer that renders
//! and mutates through that engine, and the [`app`] glue that wires both to
//! the environment.

pub const APP_NAME: &str = "tally";

pub mod app;
pub mod cmd;
pub mod tracker;
