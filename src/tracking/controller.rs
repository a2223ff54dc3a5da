use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};

use super::error::TrackingError;
use super::session::TrackingSession;
use super::types::{DutyOutcome, TrackingMode, TrackingStatus};
use crate::duty::{DutyState, DutyStore};
use crate::notification::NotificationSurface;
use crate::publish::SamplePublisher;
use crate::sensor::{PositionSensor, SamplingPriority, SamplingRequest};

/// Fastest acceptable fix interval.
pub const FASTEST_INTERVAL: Duration = Duration::from_secs(15);
/// Interval ceiling: a fix at least this often while tracking.
pub const MAX_INTERVAL: Duration = Duration::from_secs(30);

pub fn sampling_request() -> SamplingRequest {
    SamplingRequest {
        min_interval: FASTEST_INTERVAL,
        max_interval: MAX_INTERVAL,
        priority: SamplingPriority::HighAccuracy,
    }
}

/// All duty transitions go through this lock.
pub type SharedController = Arc<Mutex<TrackingController>>;

/// Owns the Idle/Tracking state machine and the single sensor subscription.
pub struct TrackingController {
    sensor: Arc<dyn PositionSensor>,
    duty_store: Arc<dyn DutyStore>,
    publisher: SamplePublisher,
    surface: Arc<dyn NotificationSurface>,
    release_tx: watch::Sender<bool>,
    session: Option<TrackingSession>,
}

impl TrackingController {
    pub fn new(
        sensor: Arc<dyn PositionSensor>,
        duty_store: Arc<dyn DutyStore>,
        publisher: SamplePublisher,
        surface: Arc<dyn NotificationSurface>,
    ) -> Self {
        let (release_tx, _) = watch::channel(false);
        TrackingController {
            sensor,
            duty_store,
            publisher,
            surface,
            release_tx,
            session: None,
        }
    }

    pub fn into_shared(self) -> SharedController {
        Arc::new(Mutex::new(self))
    }

    /// Flips to `true` once tracking has been stopped and the host may exit.
    pub fn release_signal(&self) -> watch::Receiver<bool> {
        self.release_tx.subscribe()
    }

    pub fn mode(&self) -> TrackingMode {
        match &self.session {
            Some(session) => TrackingMode::Tracking {
                worker_id: session.worker_id().to_string(),
                since: session.since(),
            },
            None => TrackingMode::Idle,
        }
    }

    pub fn status(&self) -> TrackingStatus {
        TrackingStatus {
            mode: self.mode(),
            last_sample: self.publisher.last_sample(),
            indicator_visible: self.surface.is_visible(),
            publish: self.publisher.telemetry(),
        }
    }

    /// The only state transition. A blank worker id is treated as going off duty.
    pub async fn set_duty(
        &mut self,
        worker_id: &str,
        on_duty: bool,
    ) -> Result<DutyOutcome, TrackingError> {
        let worker_id = worker_id.trim();
        if on_duty && !worker_id.is_empty() {
            self.go_on_duty(worker_id).await
        } else {
            Ok(self.go_off_duty().await)
        }
    }

    /// Process teardown: release the subscription but keep the persisted record,
    /// so the next start resumes tracking.
    pub async fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            log::info!("Releasing subscription for {} on shutdown", session.worker_id());
            session.close(self.sensor.as_ref()).await;
        }
    }

    async fn go_on_duty(&mut self, worker_id: &str) -> Result<DutyOutcome, TrackingError> {
        if let Some(session) = &self.session {
            if session.worker_id() == worker_id {
                log::debug!("Already tracking {}", worker_id);
                return Ok(DutyOutcome::AlreadyTracking {
                    worker_id: worker_id.to_string(),
                });
            }
        }

        if !self.sensor.permission_granted() {
            log::warn!(
                "Location permission not granted, not tracking {}",
                worker_id
            );
            return Err(TrackingError::PermissionDenied);
        }

        let previous = match self.session.take() {
            Some(session) => {
                let previous = session.worker_id().to_string();
                log::info!("Switching tracking from {} to {}", previous, worker_id);
                session.close(self.sensor.as_ref()).await;
                Some(previous)
            }
            None => None,
        };

        let session =
            match TrackingSession::open(worker_id, self.sensor.as_ref(), &self.publisher) {
                Ok(session) => session,
                Err(e) => {
                    log::error!("Failed to start tracking {}: {}", worker_id, e);
                    if previous.is_some() {
                        self.finish_off_duty();
                    }
                    return Err(e.into());
                }
            };
        self.session = Some(session);
        self.release_tx.send_replace(false);

        self.persist(&DutyState::on_duty(worker_id));
        self.surface.show_active_indicator();
        log::info!("Tracking {}", worker_id);

        Ok(match previous {
            Some(from) => DutyOutcome::Switched {
                from,
                to: worker_id.to_string(),
            },
            None => DutyOutcome::Started {
                worker_id: worker_id.to_string(),
            },
        })
    }

    async fn go_off_duty(&mut self) -> DutyOutcome {
        let Some(session) = self.session.take() else {
            self.clear_stale_duty_state();
            return DutyOutcome::AlreadyIdle;
        };

        let worker_id = session.worker_id().to_string();
        session.close(self.sensor.as_ref()).await;
        self.finish_off_duty();
        self.release_tx.send_replace(true);
        log::info!("Stopped tracking {}", worker_id);

        DutyOutcome::Stopped { worker_id }
    }

    /// Off-duty bookkeeping. Raising the host release is left to an explicit stop.
    fn finish_off_duty(&self) {
        self.persist(&DutyState::off_duty());
        self.surface.withdraw_indicator();
    }

    /// Idle already; only touch the store if it still claims we are on duty.
    fn clear_stale_duty_state(&self) {
        match self.duty_store.get() {
            Ok(Some(state)) if state.on_duty => {
                log::info!("Clearing stale on-duty record for {:?}", state.worker_id);
                self.persist(&DutyState::off_duty());
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Unreadable duty state, resetting to off duty: {}", e);
                self.persist(&DutyState::off_duty());
            }
        }
    }

    fn persist(&self, state: &DutyState) {
        if let Err(e) = self.duty_store.put(state) {
            log::error!("Failed to persist duty state: {}", e);
        }
    }
}
