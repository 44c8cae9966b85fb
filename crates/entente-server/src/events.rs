//! Event stream from the diplomacy engine to the log.
//!
//! [`ChannelObserver`] hands events to an unbounded channel so the engine
//! never waits on a consumer. [`spawn_event_logger`] drains the channel and
//! writes one structured log line per event, carrying the JSON payload that
//! notification and chat bridges consume.

use entente_core::{DiplomacyEvent, DiplomacyObserver};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Observer that forwards every event to a channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<DiplomacyEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DiplomacyEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl DiplomacyObserver for ChannelObserver {
    fn on_event(&self, event: &DiplomacyEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!("Event channel closed, dropping diplomacy event");
        }
    }
}

/// Spawn a task that logs every event until all senders are dropped.
pub fn spawn_event_logger(mut receiver: mpsc::UnboundedReceiver<DiplomacyEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            let [first, second] = event.audience();
            match serde_json::to_string(&event) {
                Ok(payload) => info!(
                    nation_a = %first,
                    nation_b = %second,
                    payload,
                    "{event}"
                ),
                Err(e) => warn!(error = %e, "failed to serialize diplomacy event"),
            }
        }
        debug!("Event logger stopped");
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn forwards_events_in_order() {
        let (observer, mut receiver) = ChannelObserver::channel();
        observer.on_event(&DiplomacyEvent::SanctionImposed {
            sanctioner: "a".into(),
            target: "b".into(),
        });
        observer.on_event(&DiplomacyEvent::SanctionLifted {
            sanctioner: "a".into(),
            target: "b".into(),
        });
        drop(observer);

        assert!(matches!(
            receiver.recv().await,
            Some(DiplomacyEvent::SanctionImposed { .. })
        ));
        assert!(matches!(
            receiver.recv().await,
            Some(DiplomacyEvent::SanctionLifted { .. })
        ));
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn logger_ends_when_senders_are_gone() {
        let (observer, receiver) = ChannelObserver::channel();
        let handle = spawn_event_logger(receiver);
        observer.on_event(&DiplomacyEvent::PeaceDeclared {
            nation_a: "a".into(),
            nation_b: "b".into(),
        });
        drop(observer);
        handle.await.unwrap();
    }
}
