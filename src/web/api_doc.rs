use utoipa::OpenApi;

use super::api::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::duty::set_duty,
        super::api::duty::status,
        super::api::events::stream,
    ),
    components(
        schemas(
            ErrorResponse,
            crate::tracking::DutyCommand,
            crate::tracking::DutyOutcome,
            crate::tracking::TrackingMode,
            crate::tracking::TrackingStatus,
            crate::sensor::LocationSample,
            crate::publish::PublishSnapshot,
            crate::events::LocationUpdate,
        )
    ),
    info(
        title = "Duty Beacon API",
        description = "Start and stop duty tracking and follow location updates",
        version = "0.1.0"
    ),
    tags(
        (name = "duty", description = "Duty state and tracking status"),
        (name = "events", description = "Local location update stream")
    )
)]
pub struct ApiDoc;
