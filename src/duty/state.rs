use serde::{Deserialize, Serialize};

use super::error::DutyStoreError;

/// Durable record of whether a worker was on duty when the agent last changed state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyState {
    #[serde(default)]
    pub worker_id: String,
    #[serde(default)]
    pub on_duty: bool,
}

impl DutyState {
    pub fn on_duty(worker_id: &str) -> Self {
        Self {
            worker_id: worker_id.to_string(),
            on_duty: true,
        }
    }

    pub fn off_duty() -> Self {
        Self::default()
    }

    /// Worker to resume tracking for, if any.
    ///
    /// An on-duty record without a worker id is rejected rather than guessed at.
    pub fn resumable_worker(&self) -> Result<Option<&str>, DutyStoreError> {
        if !self.on_duty {
            return Ok(None);
        }
        let worker_id = self.worker_id.trim();
        if worker_id.is_empty() {
            return Err(DutyStoreError::Malformed("on duty without a worker id"));
        }
        Ok(Some(worker_id))
    }
}
