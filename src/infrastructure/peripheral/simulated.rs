//! Simulated Peripheral
//!
//! Stand-in for a Thingy when no Bluetooth backend is available. Each device
//! performs a random walk over the accelerometer range.

use crate::domain::models::MotionSample;
use crate::domain::settings::SimulationSettings;
use crate::infrastructure::peripheral::protocol::encode_motion_packet;
use crate::infrastructure::peripheral::{Peripheral, PeripheralError, PeripheralLink};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

const AXIS_LIMIT: f32 = 10.0;

pub struct SimulatedPeripheral {
    settings: SimulationSettings,
    next_device: AtomicUsize,
}

impl SimulatedPeripheral {
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            next_device: AtomicUsize::new(1),
        }
    }
}

impl Peripheral for SimulatedPeripheral {
    type Link = SimulatedLink;

    async fn discover(&self) -> Result<SimulatedLink, PeripheralError> {
        tokio::time::sleep(Duration::from_millis(self.settings.connect_delay_ms)).await;
        let number = self.next_device.fetch_add(1, Ordering::Relaxed);
        info!("Simulated Thingy {} paired", number);

        Ok(SimulatedLink {
            name: format!("Simulated Thingy {}", number),
            interval: Duration::from_millis(self.settings.sample_interval_ms.max(1)),
            drift_step: self.settings.drift_step,
            walker: None,
        })
    }
}

pub struct SimulatedLink {
    name: String,
    interval: Duration,
    drift_step: f32,
    walker: Option<JoinHandle<()>>,
}

impl PeripheralLink for SimulatedLink {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn subscribe(
        &mut self,
        notifications: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Result<(), PeripheralError> {
        if let Some(walker) = self.walker.take() {
            walker.abort();
        }
        self.walker = Some(tokio::spawn(random_walk(
            notifications,
            self.interval,
            self.drift_step,
        )));
        Ok(())
    }

    async fn send(&self, payload: &[u8]) -> Result<(), PeripheralError> {
        info!("{} speaker: {:02X?}", self.name, payload);
        Ok(())
    }
}

impl Drop for SimulatedLink {
    fn drop(&mut self) {
        if let Some(walker) = self.walker.take() {
            walker.abort();
        }
    }
}

async fn random_walk(
    notifications: mpsc::UnboundedSender<Vec<u8>>,
    interval: Duration,
    drift_step: f32,
) {
    let mut rng = StdRng::from_entropy();
    let mut sample = MotionSample::new(
        rng.gen_range(-AXIS_LIMIT..AXIS_LIMIT),
        rng.gen_range(-AXIS_LIMIT..AXIS_LIMIT),
        rng.gen_range(-AXIS_LIMIT..AXIS_LIMIT),
    );
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        sample = step(&mut rng, sample, drift_step);
        if notifications
            .send(encode_motion_packet(&sample).to_vec())
            .is_err()
        {
            break;
        }
    }
}

fn step<R: Rng>(rng: &mut R, sample: MotionSample, drift_step: f32) -> MotionSample {
    let mut drift = |axis: f32| {
        let delta = if drift_step > 0.0 {
            rng.gen_range(-drift_step..=drift_step)
        } else {
            0.0
        };
        (axis + delta).clamp(-AXIS_LIMIT, AXIS_LIMIT)
    };
    MotionSample::new(drift(sample.x), drift(sample.y), drift(sample.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::peripheral::protocol::parse_motion_packet;

    #[test]
    fn test_step_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sample = MotionSample::new(9.9, -9.9, 0.0);
        for _ in 0..1000 {
            sample = step(&mut rng, sample, 2.0);
            for axis in [sample.x, sample.y, sample.z] {
                assert!((-AXIS_LIMIT..=AXIS_LIMIT).contains(&axis));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_device_streams_samples() {
        let peripheral = SimulatedPeripheral::new(SimulationSettings {
            sample_interval_ms: 10,
            drift_step: 0.5,
            connect_delay_ms: 5,
        });
        let mut link = peripheral.discover().await.unwrap();
        assert_eq!(link.name(), "Simulated Thingy 1");

        let (tx, mut rx) = mpsc::unbounded_channel();
        link.subscribe(tx).await.unwrap();
        for _ in 0..3 {
            let payload = rx.recv().await.unwrap();
            assert!(parse_motion_packet(&payload).is_ok());
        }

        link.send(&[0x58, 0x02, 0xF4, 0x01, 0x2C]).await.unwrap();
        drop(link);
        // Walker is aborted with the link, so the stream ends
        while rx.recv().await.is_some() {}
    }
}
