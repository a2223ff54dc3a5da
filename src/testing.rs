use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::duty::MemoryDutyStore;
use crate::events::EventBus;
use crate::notification::NotificationSurface;
use crate::publish::{RemoteLocationRecord, RemoteStore, RemoteStoreError, SamplePublisher};
use crate::sensor::{
    LocationSample, PositionSensor, SampleSink, SamplingRequest, SensorError, SubscriptionRef,
};
use crate::tracking::TrackingController;
use crate::web::server::AppState;

pub fn sample(latitude: f64, longitude: f64) -> LocationSample {
    LocationSample {
        latitude,
        longitude,
        accuracy_meters: 5.0,
        speed_mps: 8.0,
        bearing_degrees: 90.0,
        captured_at_millis: 1_700_000_000_000,
    }
}

pub async fn wait_until(condition: impl Fn() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached within 2s");
}

#[derive(Default)]
pub struct RecordingRemote {
    writes: Mutex<Vec<(String, String, RemoteLocationRecord)>>,
    fail: bool,
}

impl RecordingRemote {
    pub fn failing() -> Self {
        RecordingRemote {
            writes: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn writes(&self) -> Vec<(String, String, RemoteLocationRecord)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for RecordingRemote {
    async fn upsert(
        &self,
        key: &str,
        field: &str,
        record: &RemoteLocationRecord,
    ) -> Result<(), RemoteStoreError> {
        if self.fail {
            return Err(RemoteStoreError::Rejected {
                status: 500,
                body: "unavailable".into(),
            });
        }
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), field.to_string(), record.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorCall {
    Subscribe(SubscriptionRef),
    Unsubscribe(SubscriptionRef),
}

#[derive(Default)]
struct FakeSensorState {
    active: HashMap<SubscriptionRef, SampleSink>,
    every_sink: Vec<SampleSink>,
    calls: Vec<SensorCall>,
    max_active: usize,
    last_request: Option<SamplingRequest>,
}

/// Sensor that records every call and only emits when told to.
pub struct FakeSensor {
    permission: AtomicBool,
    unavailable: AtomicBool,
    state: Mutex<FakeSensorState>,
}

impl FakeSensor {
    pub fn new() -> Self {
        FakeSensor {
            permission: AtomicBool::new(true),
            unavailable: AtomicBool::new(false),
            state: Mutex::new(FakeSensorState::default()),
        }
    }

    pub fn denied() -> Self {
        let sensor = Self::new();
        sensor.set_permission(false);
        sensor
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SensorCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn active(&self) -> usize {
        self.state.lock().unwrap().active.len()
    }

    pub fn max_active(&self) -> usize {
        self.state.lock().unwrap().max_active
    }

    pub fn last_request(&self) -> Option<SamplingRequest> {
        self.state.lock().unwrap().last_request
    }

    /// Delivers to live subscriptions.
    pub fn emit(&self, sample: LocationSample) {
        for sink in self.state.lock().unwrap().active.values() {
            let _ = sink.send(sample.clone());
        }
    }

    /// Delivers to every sink ever handed out, released ones included.
    pub fn emit_late(&self, sample: LocationSample) {
        for sink in &self.state.lock().unwrap().every_sink {
            let _ = sink.send(sample.clone());
        }
    }
}

impl PositionSensor for FakeSensor {
    fn permission_granted(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn subscribe(
        &self,
        request: SamplingRequest,
        sink: SampleSink,
    ) -> Result<SubscriptionRef, SensorError> {
        if !self.permission_granted() {
            return Err(SensorError::PermissionDenied);
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SensorError::Unavailable("provider disabled".into()));
        }

        let id = SubscriptionRef::generate();
        let mut state = self.state.lock().unwrap();
        state.every_sink.push(sink.clone());
        state.active.insert(id, sink);
        state.max_active = state.max_active.max(state.active.len());
        state.calls.push(SensorCall::Subscribe(id));
        state.last_request = Some(request);
        Ok(id)
    }

    fn unsubscribe(&self, subscription: &SubscriptionRef) {
        let mut state = self.state.lock().unwrap();
        state.active.remove(subscription);
        state.calls.push(SensorCall::Unsubscribe(*subscription));
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    visible: AtomicBool,
    shows: AtomicUsize,
    withdrawals: AtomicUsize,
}

impl RecordingSurface {
    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn withdrawals(&self) -> usize {
        self.withdrawals.load(Ordering::SeqCst)
    }
}

impl NotificationSurface for RecordingSurface {
    fn show_active_indicator(&self) {
        self.visible.store(true, Ordering::SeqCst);
        self.shows.fetch_add(1, Ordering::SeqCst);
    }

    fn withdraw_indicator(&self) {
        self.visible.store(false, Ordering::SeqCst);
        self.withdrawals.fetch_add(1, Ordering::SeqCst);
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

/// HTTP state around a fresh controller with in-memory collaborators.
pub fn app_state(sensor: FakeSensor) -> AppState {
    app_state_with(Arc::new(sensor))
}

pub fn app_state_with(sensor: Arc<FakeSensor>) -> AppState {
    let events = EventBus::new();
    let publisher = SamplePublisher::new(Arc::new(RecordingRemote::default()), events.clone());
    let controller = TrackingController::new(
        sensor,
        Arc::new(MemoryDutyStore::new()),
        publisher,
        Arc::new(RecordingSurface::default()),
    )
    .into_shared();
    AppState::new(controller, events)
}
