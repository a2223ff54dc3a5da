use std::sync::Arc;

use crate::duty::DutyStore;
use crate::tracking::SharedController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Resumed(String),
    NothingToResume,
    Malformed,
    Failed(String),
}

/// Replays the persisted duty record once, when the agent comes up.
pub struct BootRecovery {
    store: Arc<dyn DutyStore>,
}

impl BootRecovery {
    pub fn new(store: Arc<dyn DutyStore>) -> Self {
        BootRecovery { store }
    }

    /// Consumes the recovery so it cannot be replayed within one process.
    ///
    /// Inconsistent or unreadable state never starts tracking and is left as is.
    pub async fn run(self, controller: &SharedController) -> RecoveryOutcome {
        let state = match self.store.get() {
            Ok(Some(state)) => state,
            Ok(None) => {
                log::info!("No persisted duty state, starting idle");
                return RecoveryOutcome::NothingToResume;
            }
            Err(e) => {
                log::warn!("Ignoring unreadable duty state: {}", e);
                return RecoveryOutcome::Malformed;
            }
        };

        let worker_id = match state.resumable_worker() {
            Ok(Some(worker_id)) => worker_id.to_string(),
            Ok(None) => {
                log::info!("Worker was off duty, starting idle");
                return RecoveryOutcome::NothingToResume;
            }
            Err(e) => {
                log::warn!("Not resuming tracking: {}", e);
                return RecoveryOutcome::Malformed;
            }
        };

        log::info!("Resuming tracking for {}", worker_id);
        let mut controller = controller.lock().await;
        match controller.set_duty(&worker_id, true).await {
            Ok(_) => RecoveryOutcome::Resumed(worker_id),
            Err(e) => {
                log::error!("Failed to resume tracking for {}: {}", worker_id, e);
                RecoveryOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duty::{DutyState, FileDutyStore, MemoryDutyStore};
    use crate::events::EventBus;
    use crate::publish::SamplePublisher;
    use crate::testing::{FakeSensor, RecordingRemote, RecordingSurface};
    use crate::tracking::{TrackingController, TrackingMode};

    fn controller(sensor: Arc<FakeSensor>, store: Arc<dyn DutyStore>) -> SharedController {
        let publisher =
            SamplePublisher::new(Arc::new(RecordingRemote::default()), EventBus::new());
        TrackingController::new(
            sensor,
            store,
            publisher,
            Arc::new(RecordingSurface::default()),
        )
        .into_shared()
    }

    #[tokio::test]
    async fn on_duty_record_resumes_tracking() {
        let store: Arc<dyn DutyStore> =
            Arc::new(MemoryDutyStore::with_state(DutyState::on_duty("D1")));
        let sensor = Arc::new(FakeSensor::new());
        let shared = controller(sensor.clone(), store.clone());

        let outcome = BootRecovery::new(store).run(&shared).await;

        assert_eq!(outcome, RecoveryOutcome::Resumed("D1".into()));
        assert!(matches!(
            shared.lock().await.mode(),
            TrackingMode::Tracking { ref worker_id, .. } if worker_id == "D1"
        ));
        assert_eq!(sensor.active(), 1);
    }

    #[tokio::test]
    async fn on_duty_without_worker_stays_idle() {
        let malformed = DutyState {
            worker_id: String::new(),
            on_duty: true,
        };
        let memory = Arc::new(MemoryDutyStore::with_state(malformed.clone()));
        let store: Arc<dyn DutyStore> = memory.clone();
        let sensor = Arc::new(FakeSensor::new());
        let shared = controller(sensor.clone(), store.clone());

        let outcome = BootRecovery::new(store).run(&shared).await;

        assert_eq!(outcome, RecoveryOutcome::Malformed);
        assert_eq!(shared.lock().await.mode(), TrackingMode::Idle);
        assert!(sensor.calls().is_empty());
        assert_eq!(memory.get().unwrap(), Some(malformed));
        assert_eq!(memory.writes(), 0);
    }

    #[tokio::test]
    async fn absent_or_off_duty_record_is_a_no_op() {
        for store in [
            MemoryDutyStore::new(),
            MemoryDutyStore::with_state(DutyState::off_duty()),
        ] {
            let store: Arc<dyn DutyStore> = Arc::new(store);
            let sensor = Arc::new(FakeSensor::new());
            let shared = controller(sensor.clone(), store.clone());

            let outcome = BootRecovery::new(store).run(&shared).await;

            assert_eq!(outcome, RecoveryOutcome::NothingToResume);
            assert!(sensor.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn unreadable_file_is_treated_as_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duty_state.yaml");
        std::fs::write(&path, "{{{ not yaml").unwrap();
        let store: Arc<dyn DutyStore> = Arc::new(FileDutyStore::new(path));
        let sensor = Arc::new(FakeSensor::new());
        let shared = controller(sensor.clone(), store.clone());

        let outcome = BootRecovery::new(store).run(&shared).await;

        assert_eq!(outcome, RecoveryOutcome::Malformed);
        assert_eq!(shared.lock().await.mode(), TrackingMode::Idle);
    }

    #[tokio::test]
    async fn denied_permission_fails_without_crashing() {
        let store: Arc<dyn DutyStore> =
            Arc::new(MemoryDutyStore::with_state(DutyState::on_duty("D1")));
        let sensor = Arc::new(FakeSensor::denied());
        let shared = controller(sensor.clone(), store.clone());

        let outcome = BootRecovery::new(store.clone()).run(&shared).await;

        assert!(matches!(outcome, RecoveryOutcome::Failed(_)));
        assert_eq!(shared.lock().await.mode(), TrackingMode::Idle);
        assert_eq!(store.get().unwrap(), Some(DutyState::on_duty("D1")));
    }
}
