//! FenceGuard firmware library.
//!
//! Exposes the pure-logic modules for integration testing and the host
//! simulator. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod node;
pub mod pins;
pub mod radio;
pub mod safety;
pub mod scheduler;
pub mod sim;

// Hardware-facing layers; the ESP-IDF implementations are guarded by cfg
// attributes inside, with host simulation stubs alongside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
