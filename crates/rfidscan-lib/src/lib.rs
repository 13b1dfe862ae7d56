//! rfidscan: driver for SpringCard Prox'N'Roll USB RFID scanners.
//!
//! Scanners are keyboard-emulating HID devices configured through vendor
//! feature reports. [`registry::Registry`] finds and opens them,
//! [`codec`] frames requests, and [`ops`] offers the typed commands.

pub mod codec;
pub mod config;
pub mod error;
pub mod identity;
pub mod layout;
pub mod led;
pub mod models;
pub mod multiconf;
pub mod ops;
pub mod protocol;
pub mod register;
pub mod registry;
pub mod transport;

pub use error::RfidscanError;
pub use registry::{DeviceSelector, Registry};
pub use transport::{DeviceError, HidHandle, HidTransport};
