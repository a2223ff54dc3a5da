use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::record::{RemoteLocationRecord, CURRENT_LOCATION_FIELD};
use super::remote::RemoteStore;
use super::telemetry::{PublishSnapshot, PublishTelemetry};
use crate::events::{EventBus, LocationUpdate};
use crate::sensor::LocationSample;

/// Worker a session publishes for. Cleared on teardown so late fixes are dropped.
#[derive(Debug, Clone, Default)]
pub struct WorkerBinding(Arc<Mutex<Option<String>>>);

impl WorkerBinding {
    pub fn bind(worker_id: &str) -> Self {
        WorkerBinding(Arc::new(Mutex::new(Some(worker_id.to_string()))))
    }

    pub fn current(&self) -> Option<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().take();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Published,
    Stale,
}

/// Turns fixes into remote upserts and local `LOCATION_UPDATE` events.
#[derive(Clone)]
pub struct SamplePublisher {
    remote: Arc<dyn RemoteStore>,
    events: EventBus,
    telemetry: Arc<PublishTelemetry>,
    last_sample: Arc<Mutex<Option<LocationSample>>>,
}

impl SamplePublisher {
    pub fn new(remote: Arc<dyn RemoteStore>, events: EventBus) -> Self {
        SamplePublisher {
            remote,
            events,
            telemetry: Arc::new(PublishTelemetry::default()),
            last_sample: Arc::new(Mutex::new(None)),
        }
    }

    pub fn telemetry(&self) -> PublishSnapshot {
        self.telemetry.snapshot()
    }

    pub fn last_sample(&self) -> Option<LocationSample> {
        self.last_sample.lock().unwrap().clone()
    }

    /// Publishes one fix for the bound worker.
    ///
    /// The remote write is detached: its outcome is logged and counted but never
    /// reported back here.
    pub fn publish(&self, binding: &WorkerBinding, sample: LocationSample) -> Disposition {
        let Some(worker_id) = binding.current() else {
            self.telemetry.record_stale_drop();
            log::debug!("Dropping fix captured at {} after unbind", sample.captured_at_millis);
            return Disposition::Stale;
        };

        let record = RemoteLocationRecord::from_sample(&sample, true);
        let remote = self.remote.clone();
        let telemetry = self.telemetry.clone();
        tokio::spawn(async move {
            match remote
                .upsert(&worker_id, CURRENT_LOCATION_FIELD, &record)
                .await
            {
                Ok(()) => telemetry.record_published(),
                Err(e) => {
                    telemetry.record_publish_failure();
                    log::warn!("Failed to publish location for {}: {}", worker_id, e);
                }
            }
        });

        self.events.emit(LocationUpdate::from(&sample));
        *self.last_sample.lock().unwrap() = Some(sample);
        Disposition::Published
    }

    /// Spawns the single consumer of a session's fix channel.
    pub fn spawn_drain(
        &self,
        binding: WorkerBinding,
        samples: mpsc::UnboundedReceiver<LocationSample>,
    ) -> DrainHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(drain_samples(self.clone(), binding, samples, stop_rx));
        DrainHandle { stop_tx, join }
    }
}

#[derive(Debug)]
pub struct DrainHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl DrainHandle {
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.join.await {
            log::warn!("Sample drain task panicked: {}", e);
        }
    }
}

async fn drain_samples(
    publisher: SamplePublisher,
    binding: WorkerBinding,
    mut samples: mpsc::UnboundedReceiver<LocationSample>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => return,
            next = samples.recv() => match next {
                Some(sample) => {
                    publisher.publish(&binding, sample);
                }
                None => return,
            },
        }
    }
}
