//! Outboxes of connected peers
//!
//! Every accepted connection registers an unbounded queue here. Its writer
//! task drains the queue onto the WebSocket; the router only ever pushes.
//! Sending to an id with no outbox silently drops the event.

use crate::protocol::{ConnectionId, ServerEvent};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Default, Clone)]
pub struct Peers {
    outboxes: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>>,
}

impl Peers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the receiving end of its outbox
    pub fn register(&self, id: ConnectionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outboxes.write().insert(id, tx);
        tracing::debug!(connection = %id, "Outbox registered");
        rx
    }

    /// Drop a connection's outbox, which ends its writer task
    pub fn unregister(&self, id: &ConnectionId) {
        if self.outboxes.write().remove(id).is_some() {
            tracing::debug!(connection = %id, "Outbox removed");
        }
    }

    /// Queue an event for one connection
    ///
    /// Returns `false` if the connection is unknown or already gone.
    pub fn emit(&self, to: &ConnectionId, event: ServerEvent) -> bool {
        let outboxes = self.outboxes.read();
        let Some(tx) = outboxes.get(to) else {
            tracing::debug!(
                connection = %to,
                event = event.name(),
                "No such connection, event dropped"
            );
            return false;
        };
        if tx.send(event).is_err() {
            tracing::debug!(connection = %to, "Outbox closed, event dropped");
            return false;
        }
        true
    }

    /// Queue the same event for several connections
    pub fn emit_all<'a>(&self, to: impl IntoIterator<Item = &'a ConnectionId>, event: ServerEvent) {
        for id in to {
            self.emit(id, event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn emit_reaches_registered_connection() {
        let peers = Peers::new();
        let id: ConnectionId = Uuid::new_v4().into();
        let mut rx = peers.register(id);

        assert!(peers.emit(&id, ServerEvent::RoomCreated));
        assert!(matches!(rx.try_recv(), Ok(ServerEvent::RoomCreated)));
    }

    #[test]
    fn emit_to_unknown_connection_is_dropped() {
        let peers = Peers::new();
        let known: ConnectionId = Uuid::new_v4().into();
        let mut rx = peers.register(known);

        assert!(!peers.emit(&Uuid::new_v4().into(), ServerEvent::HostStopped));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unregister_closes_outbox() {
        let peers = Peers::new();
        let id: ConnectionId = Uuid::new_v4().into();
        let mut rx = peers.register(id);

        peers.unregister(&id);
        assert!(!peers.emit(&id, ServerEvent::HostStopped));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn emit_all_fans_out() {
        let peers = Peers::new();
        let ids: Vec<ConnectionId> = (0..3).map(|_| Uuid::new_v4().into()).collect();
        let mut receivers: Vec<_> = ids.iter().map(|id| peers.register(*id)).collect();

        peers.emit_all(&ids, ServerEvent::HostDisconnected);
        for rx in &mut receivers {
            assert!(matches!(rx.try_recv(), Ok(ServerEvent::HostDisconnected)));
        }

        // A closed outbox does not stop the others
        drop(receivers.remove(0));
        peers.emit_all(&ids, ServerEvent::HostStopped);
        assert!(!peers.emit(&ids[0], ServerEvent::HostStopped));
        for rx in &mut receivers {
            assert!(matches!(rx.try_recv(), Ok(ServerEvent::HostStopped)));
        }
    }
}
