use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;

use super::error::SensorError;
use super::types::{LocationSample, SamplingRequest, SubscriptionRef};
use super::{PositionSensor, SampleSink};

const EARTH_RADIUS_M: f64 = 6_371_008.8;
const TURN_PER_FIX_DEG: f64 = 7.0;

/// Parses `"lat,lon"` in decimal degrees.
pub fn parse_origin(coordinates: &str) -> Option<(f64, f64)> {
    let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
    if parts.len() != 2 {
        return None;
    }
    let lat: f64 = parts[0].parse().ok()?;
    let lon: f64 = parts[1].parse().ok()?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    Some((lat, lon))
}

#[derive(Debug, Clone, Copy)]
pub struct TrackSettings {
    pub origin: (f64, f64),
    pub speed_mps: f64,
    pub accuracy_meters: f64,
    pub interval: Duration,
}

/// Stand-in positioning source that drives a slow circular track from an origin.
pub struct SimulatedSensor {
    settings: TrackSettings,
    permission_granted: bool,
    sinks: Arc<Mutex<HashMap<SubscriptionRef, SampleSink>>>,
}

impl SimulatedSensor {
    pub fn new(settings: TrackSettings, permission_granted: bool) -> Self {
        SimulatedSensor {
            settings,
            permission_granted,
            sinks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[cfg(test)]
    pub fn active_subscriptions(&self) -> usize {
        self.sinks.lock().unwrap().len()
    }
}

impl PositionSensor for SimulatedSensor {
    fn permission_granted(&self) -> bool {
        self.permission_granted
    }

    fn subscribe(
        &self,
        request: SamplingRequest,
        sink: SampleSink,
    ) -> Result<SubscriptionRef, SensorError> {
        if !self.permission_granted {
            return Err(SensorError::PermissionDenied);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SensorError::Unavailable(e.to_string()))?;

        let id = SubscriptionRef::generate();
        let cadence = request.clamp(self.settings.interval);
        self.sinks.lock().unwrap().insert(id, sink);

        log::info!(
            "Simulated sensor subscription {} started ({} every {:?})",
            id,
            request.priority,
            cadence
        );

        let walk = Walk::new(self.settings, cadence);
        runtime.spawn(drive_track(self.sinks.clone(), id, walk, cadence));
        Ok(id)
    }

    fn unsubscribe(&self, subscription: &SubscriptionRef) {
        if self.sinks.lock().unwrap().remove(subscription).is_none() {
            log::debug!("Unsubscribe for unknown subscription {}", subscription);
        } else {
            log::info!("Simulated sensor subscription {} released", subscription);
        }
    }
}

async fn drive_track(
    sinks: Arc<Mutex<HashMap<SubscriptionRef, SampleSink>>>,
    id: SubscriptionRef,
    mut walk: Walk,
    cadence: Duration,
) {
    let mut ticker = tokio::time::interval(cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let sample = walk.advance();

        // Send under the lock so `unsubscribe` cannot race a delivery.
        let delivered = {
            let locked = sinks.lock().unwrap();
            match locked.get(&id) {
                Some(sink) => sink.send(sample).is_ok(),
                None => false,
            }
        };
        if !delivered {
            return;
        }
    }
}

struct Walk {
    lat_deg: f64,
    lon_deg: f64,
    bearing_deg: f64,
    step_m: f64,
    speed_mps: f64,
    accuracy_meters: f64,
}

impl Walk {
    fn new(settings: TrackSettings, cadence: Duration) -> Self {
        Walk {
            lat_deg: settings.origin.0,
            lon_deg: settings.origin.1,
            bearing_deg: 0.0,
            step_m: settings.speed_mps * cadence.as_secs_f64(),
            speed_mps: settings.speed_mps,
            accuracy_meters: settings.accuracy_meters,
        }
    }

    fn advance(&mut self) -> LocationSample {
        let sample = LocationSample {
            latitude: self.lat_deg,
            longitude: self.lon_deg,
            accuracy_meters: self.accuracy_meters,
            speed_mps: self.speed_mps,
            bearing_degrees: self.bearing_deg,
            captured_at_millis: Utc::now().timestamp_millis(),
        };

        let bearing = self.bearing_deg.to_radians();
        let lat = self.lat_deg.to_radians();
        let angular = self.step_m / EARTH_RADIUS_M;
        self.lat_deg = (self.lat_deg + (angular * bearing.cos()).to_degrees()).clamp(-90.0, 90.0);
        let cos_lat = lat.cos().max(1e-6);
        self.lon_deg = wrap_longitude(self.lon_deg + (angular * bearing.sin() / cos_lat).to_degrees());
        self.bearing_deg = (self.bearing_deg + TURN_PER_FIX_DEG).rem_euclid(360.0);

        sample
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
