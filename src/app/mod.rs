//! Application core: pure domain logic, zero I/O.
//!
//! Alert records and receiver reports, the alert dispatcher and the
//! guard node's service.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod dispatcher;
pub mod events;
pub mod ports;
pub mod service;
