use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::controller::sampling_request;
use crate::publish::{DrainHandle, SamplePublisher, WorkerBinding};
use crate::sensor::{PositionSensor, SensorError, SubscriptionRef};

/// The one live sensor subscription and the drain task publishing its fixes.
pub(crate) struct TrackingSession {
    worker_id: String,
    subscription: SubscriptionRef,
    binding: WorkerBinding,
    drain: DrainHandle,
    since: DateTime<Utc>,
}

impl TrackingSession {
    pub(crate) fn open(
        worker_id: &str,
        sensor: &dyn PositionSensor,
        publisher: &SamplePublisher,
    ) -> Result<Self, SensorError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = sensor.subscribe(sampling_request(), tx)?;
        let binding = WorkerBinding::bind(worker_id);
        let drain = publisher.spawn_drain(binding.clone(), rx);

        Ok(TrackingSession {
            worker_id: worker_id.to_string(),
            subscription,
            binding,
            drain,
            since: Utc::now(),
        })
    }

    pub(crate) fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub(crate) fn since(&self) -> DateTime<Utc> {
        self.since
    }

    /// Unsubscribe, then unbind, then stop the drain. Anything still queued
    /// after the unbind is dropped as stale.
    pub(crate) async fn close(self, sensor: &dyn PositionSensor) {
        sensor.unsubscribe(&self.subscription);
        self.binding.clear();
        self.drain.stop().await;
        log::debug!(
            "Closed subscription {} for {}",
            self.subscription,
            self.worker_id
        );
    }
}
