//! Peripheral Module
//!
//! Access to the motion-sensing peripherals players connect.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      GameService                         │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │ spawn_link(player)
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                   link task (per player)                 │
//! │  discover -> subscribe -> decode samples / write tones   │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┴─────────────┐
//!         ▼                           ▼
//! ┌───────────────┐           ┌───────────────┐
//! │  WinRtBackend │           │   Simulated   │
//! │ (Windows BLE) │           │ (random walk) │
//! └───────────────┘           └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Thingy:52 identifiers and payload formats
//! - [`link`] - Per-player connection task
//! - [`simulated`] - Software peripheral for machines without BLE
//! - `winrt` - Windows Bluetooth LE backend

pub mod link;
pub mod protocol;
pub mod simulated;
#[cfg(windows)]
pub mod winrt;

#[cfg(test)]
pub(crate) mod scripted;

use std::future::Future;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

pub use link::{spawn_link, LinkEvent, LinkHandle};
pub use simulated::SimulatedPeripheral;
#[cfg(windows)]
pub use winrt::WinRtPeripheral;

#[derive(Debug, Error)]
pub enum PeripheralError {
    #[error("device discovery was cancelled")]
    Cancelled,
    #[error("no matching device found")]
    NotFound,
    #[error("connection handshake failed: {0}")]
    Handshake(String),
    #[error("service {0} not found on device")]
    ServiceNotFound(Uuid),
    #[error("characteristic {0} not found on device")]
    CharacteristicNotFound(Uuid),
    #[error("write failed: {0}")]
    Write(String),
    #[error("bluetooth backend error: {0}")]
    Backend(String),
}

/// Source of peripheral connections.
pub trait Peripheral: Send + Sync + 'static {
    type Link: PeripheralLink;

    /// Find a device advertising the configured service and complete the
    /// connection handshake.
    fn discover(&self) -> impl Future<Output = Result<Self::Link, PeripheralError>> + Send;
}

/// An established connection to one peripheral.
pub trait PeripheralLink: Send + 'static {
    fn name(&self) -> String;

    /// Enable motion notifications. Raw payloads are pushed into
    /// `notifications`; the sender is dropped when the device goes away.
    fn subscribe(
        &mut self,
        notifications: mpsc::UnboundedSender<Vec<u8>>,
    ) -> impl Future<Output = Result<(), PeripheralError>> + Send;

    /// Write a command to the speaker characteristic.
    fn send(&self, payload: &[u8]) -> impl Future<Output = Result<(), PeripheralError>> + Send;
}
