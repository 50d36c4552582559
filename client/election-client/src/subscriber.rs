use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::events::{ElectionEvent, EventKind, EventStream};
use crate::ElectionSession;

/// Live event subscriptions of a session. Dropping it stops all of them.
#[derive(Debug, Default)]
pub struct Subscriptions {
    tasks: Vec<(EventKind, JoinHandle<()>)>,
}

impl Subscriptions {
    /// Kinds that were subscribed successfully.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.tasks.iter().map(|(kind, _)| *kind).collect()
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        for (_, task) in &self.tasks {
            task.abort();
        }
    }
}

impl ElectionSession {
    /// Subscribes to every contract event from the current chain head on.
    ///
    /// A kind that cannot be subscribed to is logged and skipped.
    pub async fn listen_for_events(self: &Arc<Self>) -> Subscriptions {
        let mut subscriptions = Subscriptions::default();
        for kind in EventKind::ALL {
            match self.contract().subscribe(kind).await {
                Ok(stream) => {
                    let task = tokio::spawn(Arc::clone(self).consume(stream));
                    subscriptions.tasks.push((kind, task));
                }
                Err(err) => warn!(%kind, %err, "Unable to subscribe"),
            }
        }
        info!(kinds = subscriptions.tasks.len(), "Listening for events");
        subscriptions
    }

    async fn consume(self: Arc<Self>, mut stream: EventStream) {
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => self.handle_event(event).await,
                Err(err) => warn!(kind = %stream.kind(), %err, "Event delivery failed"),
            }
        }
        warn!(kind = %stream.kind(), "Event stream ended");
    }

    /// Applies one event to the view: logs it, then either closes the
    /// election or re-renders.
    pub async fn handle_event(&self, event: ElectionEvent) {
        info!(?event, "Event received");
        self.update_view(|view| view.event_log.push(event.log_entry()));
        match event {
            ElectionEvent::ElectionEnded => self.update_view(|view| view.close_election()),
            ElectionEvent::Voted { .. }
            | ElectionEvent::CandidateAdded { .. }
            | ElectionEvent::CandidateRemoved { .. }
            | ElectionEvent::ElectionReset => self.render().await,
        }
    }
}
