use axum::{extract::State, Json};

use crate::tracking::{DutyCommand, DutyOutcome, TrackingStatus};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[utoipa::path(
    post,
    path = "/api/duty",
    request_body = DutyCommand,
    responses(
        (status = 200, description = "Duty state applied", body = DutyOutcome),
        (status = 403, description = "Location permission not granted", body = ErrorResponse),
        (status = 503, description = "Positioning sensor unavailable", body = ErrorResponse)
    ),
    tag = "duty"
)]
pub async fn set_duty(
    State(state): State<AppState>,
    Json(command): Json<DutyCommand>,
) -> ApiResult<Json<DutyOutcome>> {
    let mut controller = state.controller.lock().await;
    let outcome = controller
        .set_duty(&command.worker_id, command.on_duty)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/duty/status",
    responses(
        (status = 200, description = "Tracking status", body = TrackingStatus)
    ),
    tag = "duty"
)]
pub async fn status(State(state): State<AppState>) -> Json<TrackingStatus> {
    let controller = state.controller.lock().await;
    Json(controller.status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use crate::testing::{app_state, FakeSensor};
    use crate::tracking::TrackingMode;

    fn command(worker_id: &str, on_duty: bool) -> Json<DutyCommand> {
        Json(DutyCommand {
            worker_id: worker_id.to_string(),
            on_duty,
        })
    }

    #[tokio::test]
    async fn start_then_status_reports_tracking() {
        let state = app_state(FakeSensor::new());

        let Json(outcome) = set_duty(State(state.clone()), command("D1", true))
            .await
            .ok()
            .unwrap();
        assert_eq!(
            outcome,
            DutyOutcome::Started {
                worker_id: "D1".into()
            }
        );

        let Json(current) = status(State(state)).await;
        assert!(matches!(
            current.mode,
            TrackingMode::Tracking { ref worker_id, .. } if worker_id == "D1"
        ));
        assert!(current.indicator_visible);
    }

    #[tokio::test]
    async fn denied_permission_maps_to_forbidden() {
        let state = app_state(FakeSensor::denied());

        let response = set_duty(State(state), command("D1", true))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unavailable_sensor_maps_to_service_unavailable() {
        let sensor = FakeSensor::new();
        sensor.set_unavailable(true);
        let state = app_state(sensor);

        let response = set_duty(State(state), command("D1", true))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn command_accepts_missing_worker_for_stop() {
        let command: DutyCommand = serde_json::from_str(r#"{"on_duty": false}"#).unwrap();
        assert_eq!(command.worker_id, "");
        assert!(!command.on_duty);
    }
}
