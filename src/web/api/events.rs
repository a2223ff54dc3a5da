use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{future, Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::BroadcastStream;

use crate::events::{EventBus, EventKind, LocationUpdate};
use crate::web::server::AppState;

#[utoipa::path(
    get,
    path = "/api/events",
    responses(
        (status = 200, description = "LOCATION_UPDATE events as Server-Sent Events",
         content_type = "text/event-stream", body = LocationUpdate)
    ),
    tag = "events"
)]
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = location_updates(&state.events, state.closing_signal())
        .filter_map(|update| future::ready(to_event(&update)))
        .map(Ok::<_, Infallible>);

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Updates from the bus until the server starts closing.
/// Lagged receivers skip what they missed.
fn location_updates(
    events: &EventBus,
    mut closing: watch::Receiver<bool>,
) -> impl Stream<Item = LocationUpdate> {
    let closed = async move {
        let _ = closing.wait_for(|closing| *closing).await;
    };

    BroadcastStream::new(events.subscribe())
        .filter_map(|item| future::ready(item.ok()))
        .take_until(closed)
}

fn to_event(update: &LocationUpdate) -> Option<Event> {
    Event::default()
        .event(EventKind::LocationUpdate.to_string())
        .json_data(update)
        .ok()
}
