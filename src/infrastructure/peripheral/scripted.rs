//! Scripted peripheral used by tests to drive links by hand.

use crate::domain::models::MotionSample;
use crate::infrastructure::peripheral::protocol::encode_motion_packet;
use crate::infrastructure::peripheral::{Peripheral, PeripheralError, PeripheralLink};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
struct DeviceState {
    notifications: Option<mpsc::UnboundedSender<Vec<u8>>>,
    sent: Vec<Vec<u8>>,
}

/// Test-side control of one scripted device.
#[derive(Clone, Default)]
pub(crate) struct DeviceControl {
    state: Arc<Mutex<DeviceState>>,
}

impl DeviceControl {
    /// Deliver a raw notification. False when nobody is subscribed.
    pub(crate) fn notify(&self, payload: &[u8]) -> bool {
        let state = self.state.lock().unwrap();
        match &state.notifications {
            Some(tx) => tx.send(payload.to_vec()).is_ok(),
            None => false,
        }
    }

    pub(crate) fn emit(&self, sample: MotionSample) -> bool {
        self.notify(&encode_motion_packet(&sample))
    }

    pub(crate) fn disconnect(&self) {
        self.state.lock().unwrap().notifications = None;
    }

    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.clone()
    }
}

/// Hands out scripted devices (or failures) in the order they were pushed.
#[derive(Default)]
pub(crate) struct ScriptedPeripheral {
    script: Mutex<VecDeque<Result<DeviceControl, PeripheralError>>>,
}

impl ScriptedPeripheral {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_device(&self) -> DeviceControl {
        let control = DeviceControl::default();
        self.script.lock().unwrap().push_back(Ok(control.clone()));
        control
    }

    pub(crate) fn push_failure(&self, error: PeripheralError) {
        self.script.lock().unwrap().push_back(Err(error));
    }
}

impl Peripheral for ScriptedPeripheral {
    type Link = ScriptedLink;

    async fn discover(&self) -> Result<ScriptedLink, PeripheralError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(control)) => Ok(ScriptedLink { control }),
            Some(Err(e)) => Err(e),
            None => Err(PeripheralError::NotFound),
        }
    }
}

pub(crate) struct ScriptedLink {
    control: DeviceControl,
}

impl PeripheralLink for ScriptedLink {
    fn name(&self) -> String {
        "Scripted Thingy".to_string()
    }

    async fn subscribe(
        &mut self,
        notifications: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Result<(), PeripheralError> {
        self.control.state.lock().unwrap().notifications = Some(notifications);
        Ok(())
    }

    async fn send(&self, payload: &[u8]) -> Result<(), PeripheralError> {
        self.control.state.lock().unwrap().sent.push(payload.to_vec());
        Ok(())
    }
}
