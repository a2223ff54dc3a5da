use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::boot::BootRecovery;
use crate::duty::{DutyStore, FileDutyStore};
use crate::events::EventBus;
use crate::notification::LogSurface;
use crate::publish::SamplePublisher;
use crate::tracking::{SharedController, TrackingController};

use super::api::duty as duty_handlers;
use super::api::events as event_handlers;
use super::api_doc::ApiDoc;
use super::config::{Config, ConfigError};

#[derive(Clone)]
pub struct AppState {
    pub controller: SharedController,
    pub events: EventBus,
    closing: watch::Receiver<bool>,
    closing_tx: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(controller: SharedController, events: EventBus) -> Self {
        let (closing_tx, closing) = watch::channel(false);
        AppState {
            controller,
            events,
            closing,
            closing_tx: Arc::new(closing_tx),
        }
    }

    /// Becomes `true` when the server starts shutting down, ending open event streams.
    pub fn closing_signal(&self) -> watch::Receiver<bool> {
        self.closing.clone()
    }

    pub(crate) fn begin_closing(&self) {
        self.closing_tx.send_replace(true);
    }
}

/// Wires the controller and its collaborators from configuration.
pub fn build_agent(
    config: &Config,
) -> Result<(SharedController, EventBus, Arc<dyn DutyStore>), ConfigError> {
    let duty_store: Arc<dyn DutyStore> =
        Arc::new(FileDutyStore::new(config.agent.state_file.clone()));
    let sensor = config.sensor.build()?;
    let remote = config.remote.build()?;
    let events = EventBus::new();
    let publisher = SamplePublisher::new(remote, events.clone());
    let surface = Arc::new(LogSurface::new(config.notification.clone()));

    let controller =
        TrackingController::new(sensor, duty_store.clone(), publisher, surface).into_shared();
    Ok((controller, events, duty_store))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/duty", post(duty_handlers::set_duty))
        .route("/api/duty/status", get(duty_handlers::status))
        .route("/api/events", get(event_handlers::stream))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let (controller, events, duty_store) =
        build_agent(&config).map_err(std::io::Error::other)?;

    let outcome = BootRecovery::new(duty_store).run(&controller).await;
    log::info!("Boot recovery: {:?}", outcome);

    let release = controller.lock().await.release_signal();
    let state = AppState::new(controller.clone(), events);
    let app = router(state.clone());

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(
            state,
            release,
            config.agent.exit_on_stop,
        ))
        .await?;

    controller.lock().await.shutdown().await;
    log::info!("Agent stopped");
    Ok(())
}

async fn shutdown_signal(
    state: AppState,
    mut release: watch::Receiver<bool>,
    exit_on_stop: bool,
) {
    let released = async move {
        if exit_on_stop {
            let stopped = release.wait_for(|released| *released).await.is_ok();
            if stopped {
                return;
            }
        }
        std::future::pending::<()>().await;
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => log::info!("Interrupted, shutting down"),
        _ = terminate() => log::info!("Terminated, shutting down"),
        _ = released => log::info!("Tracking stopped, releasing host process"),
    }
    state.begin_closing();
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            log::warn!("Cannot listen for SIGTERM: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testing::{app_state, app_state_with, FakeSensor};

    #[tokio::test]
    async fn release_ends_server_when_exit_on_stop() {
        let state = app_state(FakeSensor::new());
        let (release_tx, release) = watch::channel(false);
        let waiting = tokio::spawn(shutdown_signal(state.clone(), release, true));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        release_tx.send_replace(true);
        tokio::time::timeout(Duration::from_secs(2), waiting)
            .await
            .unwrap()
            .unwrap();
        assert!(*state.closing_signal().borrow());
    }

    #[tokio::test]
    async fn release_is_ignored_without_exit_on_stop() {
        let state = app_state(FakeSensor::new());
        let (release_tx, release) = watch::channel(false);
        release_tx.send_replace(true);

        let waiting = shutdown_signal(state.clone(), release, false);
        let waited = tokio::time::timeout(Duration::from_millis(100), waiting).await;

        assert!(waited.is_err());
        assert!(!*state.closing_signal().borrow());
    }

    #[tokio::test]
    async fn failed_switch_keeps_server_running() {
        let sensor = Arc::new(FakeSensor::new());
        let state = app_state_with(sensor.clone());
        let release = state.controller.lock().await.release_signal();
        let waiting = tokio::spawn(shutdown_signal(state.clone(), release, true));

        state.controller.lock().await.set_duty("W1", true).await.unwrap();
        sensor.set_unavailable(true);
        assert!(state.controller.lock().await.set_duty("W2", true).await.is_err());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        sensor.set_unavailable(false);
        state.controller.lock().await.set_duty("", false).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), waiting)
            .await
            .unwrap()
            .unwrap();
    }
}
