use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::ToSchema;

use crate::sensor::LocationSample;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    LocationUpdate,
}

/// Payload of a `LOCATION_UPDATE` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
}

impl From<&LocationSample> for LocationUpdate {
    fn from(sample: &LocationSample) -> Self {
        LocationUpdate {
            latitude: sample.latitude,
            longitude: sample.longitude,
            accuracy_meters: sample.accuracy_meters,
        }
    }
}

/// In-process broadcast of location updates to whoever is listening.
///
/// Delivery is best effort: with no receivers the event is dropped, and a
/// receiver that falls more than `EVENT_CAPACITY` events behind skips ahead.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LocationUpdate>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        EventBus { tx }
    }

    pub fn emit(&self, update: LocationUpdate) {
        if self.tx.send(update).is_err() {
            log::trace!("{} dropped: no listeners", EventKind::LocationUpdate);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LocationUpdate> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
