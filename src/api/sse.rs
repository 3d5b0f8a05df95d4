//! Server-Sent Events support

use crate::runtime::ConversationSnapshot;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

/// Stream every published snapshot, starting with the current one
pub fn sse_stream(
    snapshot_rx: watch::Receiver<ConversationSnapshot>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let snapshots = WatchStream::new(snapshot_rx).map(|snapshot| Ok(snapshot_to_event(&snapshot)));

    Sse::new(snapshots).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn snapshot_to_event(snapshot: &ConversationSnapshot) -> Event {
    match Event::default().event("snapshot").json_data(snapshot) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize snapshot");
            Event::default().event("error").data("snapshot unavailable")
        }
    }
}
