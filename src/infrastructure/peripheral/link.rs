//! Per-player Link Task
//!
//! Owns one peripheral connection for the lifetime of a player's binding.

use crate::domain::models::{ConnectionStatus, MotionSample, PlayerId};
use crate::infrastructure::peripheral::protocol::parse_motion_packet;
use crate::infrastructure::peripheral::{Peripheral, PeripheralLink};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events a link task reports back to the game service
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Status {
        player: PlayerId,
        status: ConnectionStatus,
    },
    Sample {
        player: PlayerId,
        sample: MotionSample,
    },
    Failed {
        player: PlayerId,
        error: String,
    },
}

/// Handle kept by the game service. Dropping it tears the link down.
#[derive(Debug)]
pub struct LinkHandle {
    commands: mpsc::UnboundedSender<Vec<u8>>,
}

impl LinkHandle {
    /// Queue a speaker command. Returns false if the link is gone.
    pub fn send(&self, payload: Vec<u8>) -> bool {
        self.commands.send(payload).is_ok()
    }
}

/// Start connecting `player` to a peripheral in the background
pub fn spawn_link<P: Peripheral>(
    peripheral: Arc<P>,
    player: PlayerId,
    events: mpsc::UnboundedSender<LinkEvent>,
) -> LinkHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_link(peripheral, player, events, commands_rx));
    LinkHandle {
        commands: commands_tx,
    }
}

async fn run_link<P: Peripheral>(
    peripheral: Arc<P>,
    player: PlayerId,
    events: mpsc::UnboundedSender<LinkEvent>,
    mut commands: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    info!("Player {} is looking for a device", player);

    let mut link = match peripheral.discover().await {
        Ok(link) => link,
        Err(e) => {
            warn!("Player {} could not connect: {}", player, e);
            fail(&events, player, e.to_string());
            return;
        }
    };

    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
    if let Err(e) = link.subscribe(notify_tx).await {
        warn!(
            "Player {} could not subscribe to {}: {}",
            player,
            link.name(),
            e
        );
        fail(&events, player, e.to_string());
        return;
    }

    info!("Player {} connected to {}", player, link.name());
    let _ = events.send(LinkEvent::Status {
        player,
        status: ConnectionStatus::Connected,
    });

    loop {
        tokio::select! {
            notification = notify_rx.recv() => match notification {
                Some(payload) => match parse_motion_packet(&payload) {
                    Ok(sample) => {
                        if events.send(LinkEvent::Sample { player, sample }).is_err() {
                            break;
                        }
                    }
                    Err(e) => debug!("Player {}: dropping notification: {}", player, e),
                },
                None => {
                    info!("Player {}: {} stopped sending data", player, link.name());
                    break;
                }
            },
            command = commands.recv() => match command {
                Some(payload) => {
                    if let Err(e) = link.send(&payload).await {
                        warn!("Player {}: speaker write failed: {}", player, e);
                    }
                }
                // Handle dropped by the game service
                None => break,
            },
        }
    }

    let _ = events.send(LinkEvent::Status {
        player,
        status: ConnectionStatus::Disconnected,
    });
}

fn fail(events: &mpsc::UnboundedSender<LinkEvent>, player: PlayerId, error: String) {
    let _ = events.send(LinkEvent::Failed { player, error });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::peripheral::scripted::ScriptedPeripheral;
    use crate::infrastructure::peripheral::PeripheralError;

    #[tokio::test]
    async fn test_connect_stream_and_disconnect() {
        let peripheral = Arc::new(ScriptedPeripheral::new());
        let device = peripheral.push_device();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        let handle = spawn_link(peripheral, 3, events_tx);
        assert_eq!(
            events_rx.recv().await,
            Some(LinkEvent::Status {
                player: 3,
                status: ConnectionStatus::Connected
            })
        );

        // Malformed packets are dropped, valid ones come through
        assert!(device.notify(&[1, 2, 3]));
        assert!(device.emit(MotionSample::new(1.0, 2.0, 3.0)));
        assert_eq!(
            events_rx.recv().await,
            Some(LinkEvent::Sample {
                player: 3,
                sample: MotionSample::new(1.0, 2.0, 3.0)
            })
        );

        assert!(handle.send(vec![9, 9]));
        while device.sent().is_empty() {
            tokio::task::yield_now().await;
        }
        device.disconnect();
        assert_eq!(
            events_rx.recv().await,
            Some(LinkEvent::Status {
                player: 3,
                status: ConnectionStatus::Disconnected
            })
        );
        assert_eq!(device.sent(), vec![vec![9, 9]]);
    }

    #[tokio::test]
    async fn test_failed_discovery_is_reported() {
        let peripheral = Arc::new(ScriptedPeripheral::new());
        peripheral.push_failure(PeripheralError::Cancelled);
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        let _handle = spawn_link(peripheral, 0, events_tx);
        match events_rx.recv().await {
            Some(LinkEvent::Failed { player, error }) => {
                assert_eq!(player, 0);
                assert!(error.contains("cancelled"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropping_handle_closes_link() {
        let peripheral = Arc::new(ScriptedPeripheral::new());
        let _device = peripheral.push_device();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        let handle = spawn_link(peripheral, 1, events_tx);
        assert!(matches!(
            events_rx.recv().await,
            Some(LinkEvent::Status {
                status: ConnectionStatus::Connected,
                ..
            })
        ));
        drop(handle);
        assert_eq!(
            events_rx.recv().await,
            Some(LinkEvent::Status {
                player: 1,
                status: ConnectionStatus::Disconnected
            })
        );
    }
}
