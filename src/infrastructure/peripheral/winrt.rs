//! WinRT Bluetooth LE Backend
//!
//! Discovers Thingy devices through advertisement scanning and talks GATT
//! through the Windows Runtime Bluetooth APIs.

use crate::domain::settings::PeripheralProfile;
use crate::infrastructure::peripheral::{Peripheral, PeripheralError, PeripheralLink};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use windows::core::GUID;
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisementReceivedEventArgs, BluetoothLEAdvertisementWatcher,
    BluetoothLEScanningMode,
};
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattClientCharacteristicConfigurationDescriptorValue,
    GattCommunicationStatus, GattValueChangedEventArgs,
};
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Foundation::TypedEventHandler;
use windows::Storage::Streams::{DataReader, DataWriter};

type NotificationSlot = Arc<Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>>;

impl From<windows::core::Error> for PeripheralError {
    fn from(e: windows::core::Error) -> Self {
        PeripheralError::Backend(e.message().to_string())
    }
}

fn guid(id: Uuid) -> GUID {
    GUID::from_u128(id.as_u128())
}

pub struct WinRtPeripheral {
    profile: PeripheralProfile,
    discovery_timeout: Duration,
    // Addresses already bound to a player
    claimed: Arc<Mutex<HashSet<u64>>>,
}

impl WinRtPeripheral {
    pub fn new(profile: PeripheralProfile, discovery_timeout: Duration) -> Self {
        Self {
            profile,
            discovery_timeout,
            claimed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn claim(&self, address: u64) -> bool {
        self.claimed
            .lock()
            .map(|mut claimed| claimed.insert(address))
            .unwrap_or(false)
    }

    fn release(&self, address: u64) {
        release(&self.claimed, address);
    }

    /// Scan until an unclaimed device advertising the filter service shows up
    async fn scan(&self) -> Result<u64, PeripheralError> {
        info!(
            "Scanning for devices advertising {}",
            self.profile.filter_service
        );

        let watcher = BluetoothLEAdvertisementWatcher::new()?;
        watcher.SetScanningMode(BluetoothLEScanningMode::Active)?;

        let (found_tx, mut found_rx) = mpsc::unbounded_channel();
        let target = guid(self.profile.filter_service);
        let handler = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let service_uuids = args.Advertisement()?.ServiceUuids()?;
                    for i in 0..service_uuids.Size()? {
                        if service_uuids.GetAt(i)? == target {
                            let _ = found_tx.send(args.BluetoothAddress()?);
                            break;
                        }
                    }
                }
                Ok(())
            },
        );
        watcher.Received(&handler)?;
        watcher.Start()?;

        let found = tokio::time::timeout(self.discovery_timeout, async {
            while let Some(address) = found_rx.recv().await {
                if self.claim(address) {
                    return Some(address);
                }
                debug!("Skipping {:#X}, already bound", address);
            }
            None
        })
        .await;

        let _ = watcher.Stop();

        match found {
            Ok(Some(address)) => Ok(address),
            Ok(None) => Err(PeripheralError::Cancelled),
            Err(_) => Err(PeripheralError::NotFound),
        }
    }

    async fn open(&self, address: u64) -> Result<WinRtLink, PeripheralError> {
        info!("Connecting to {:#X}", address);
        let device = BluetoothLEDevice::FromBluetoothAddressAsync(address)?.await?;

        let motion = characteristic(
            &device,
            self.profile.motion_service,
            self.profile.motion_char,
        )
        .await?;
        let speaker = characteristic(
            &device,
            self.profile.sound_service,
            self.profile.speaker_char,
        )
        .await?;

        let name = device
            .Name()
            .map(|n| n.to_string())
            .unwrap_or_else(|_| format!("{:#X}", address));

        Ok(WinRtLink {
            name,
            address,
            device,
            motion,
            speaker,
            slot: Arc::new(Mutex::new(None)),
            claimed: self.claimed.clone(),
        })
    }
}

impl Peripheral for WinRtPeripheral {
    type Link = WinRtLink;

    async fn discover(&self) -> Result<WinRtLink, PeripheralError> {
        let address = self.scan().await?;
        let result = self.open(address).await;
        if result.is_err() {
            self.release(address);
        }
        result
    }
}

async fn characteristic(
    device: &BluetoothLEDevice,
    service_uuid: Uuid,
    char_uuid: Uuid,
) -> Result<GattCharacteristic, PeripheralError> {
    let services = device
        .GetGattServicesForUuidAsync(guid(service_uuid))?
        .await?;
    if services.Status()? != GattCommunicationStatus::Success {
        return Err(PeripheralError::Handshake(format!(
            "service query returned {:?}",
            services.Status()?
        )));
    }
    let services = services.Services()?;
    if services.Size()? == 0 {
        return Err(PeripheralError::ServiceNotFound(service_uuid));
    }
    let service = services.GetAt(0)?;

    let chars = service
        .GetCharacteristicsForUuidAsync(guid(char_uuid))?
        .await?;
    if chars.Status()? != GattCommunicationStatus::Success {
        return Err(PeripheralError::Handshake(format!(
            "characteristic query returned {:?}",
            chars.Status()?
        )));
    }
    let chars = chars.Characteristics()?;
    if chars.Size()? == 0 {
        return Err(PeripheralError::CharacteristicNotFound(char_uuid));
    }
    Ok(chars.GetAt(0)?)
}

fn release(claimed: &Mutex<HashSet<u64>>, address: u64) {
    if let Ok(mut claimed) = claimed.lock() {
        claimed.remove(&address);
    }
}

pub struct WinRtLink {
    name: String,
    address: u64,
    device: BluetoothLEDevice,
    motion: GattCharacteristic,
    speaker: GattCharacteristic,
    slot: NotificationSlot,
    claimed: Arc<Mutex<HashSet<u64>>>,
}

impl PeripheralLink for WinRtLink {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn subscribe(
        &mut self,
        notifications: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Result<(), PeripheralError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(notifications);
        }

        let slot = self.slot.clone();
        let data_handler = TypedEventHandler::new(
            move |_: windows::core::Ref<GattCharacteristic>,
                  args: windows::core::Ref<GattValueChangedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let buffer = args.CharacteristicValue()?;
                    let reader = DataReader::FromBuffer(&buffer)?;
                    let mut bytes = vec![0u8; reader.UnconsumedBufferLength()? as usize];
                    reader.ReadBytes(&mut bytes)?;
                    if let Ok(slot) = slot.lock() {
                        if let Some(tx) = slot.as_ref() {
                            let _ = tx.send(bytes);
                        }
                    }
                }
                Ok(())
            },
        );
        self.motion.ValueChanged(&data_handler)?;

        // Dropping the sender ends the notification stream on the link task
        let slot = self.slot.clone();
        let status_handler =
            TypedEventHandler::new(move |dev: windows::core::Ref<BluetoothLEDevice>, _| {
                if let Some(dev) = dev.as_ref() {
                    if dev.ConnectionStatus()? == BluetoothConnectionStatus::Disconnected {
                        if let Ok(mut slot) = slot.lock() {
                            slot.take();
                        }
                    }
                }
                Ok(())
            });
        self.device.ConnectionStatusChanged(&status_handler)?;

        let status = self
            .motion
            .WriteClientCharacteristicConfigurationDescriptorAsync(
                GattClientCharacteristicConfigurationDescriptorValue::Notify,
            )?
            .await?;
        if status != GattCommunicationStatus::Success {
            return Err(PeripheralError::Handshake(format!(
                "notification subscription returned {:?}",
                status
            )));
        }

        info!("Notifications enabled on {}", self.name);
        Ok(())
    }

    async fn send(&self, payload: &[u8]) -> Result<(), PeripheralError> {
        let writer = DataWriter::new()?;
        writer.WriteBytes(payload)?;
        let buffer = writer.DetachBuffer()?;

        let status = self.speaker.WriteValueAsync(&buffer)?.await?;
        if status != GattCommunicationStatus::Success {
            return Err(PeripheralError::Write(format!("{:?}", status)));
        }
        Ok(())
    }
}

impl Drop for WinRtLink {
    fn drop(&mut self) {
        if let Err(e) = self.device.Close() {
            warn!("Failed to close {}: {}", self.name, e);
        }
        release(&self.claimed, self.address);
    }
}
