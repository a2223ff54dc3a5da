use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::publish::PublishSnapshot;
use crate::sensor::LocationSample;

/// External start/stop command.
#[derive(Debug, Clone, Deserialize, PartialEq, ToSchema)]
pub struct DutyCommand {
    #[serde(default)]
    pub worker_id: String,
    pub on_duty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DutyOutcome {
    Started { worker_id: String },
    Switched { from: String, to: String },
    AlreadyTracking { worker_id: String },
    Stopped { worker_id: String },
    AlreadyIdle,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub enum TrackingMode {
    Idle,
    Tracking {
        worker_id: String,
        since: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackingStatus {
    pub mode: TrackingMode,
    pub last_sample: Option<LocationSample>,
    pub indicator_visible: bool,
    pub publish: PublishSnapshot,
}
