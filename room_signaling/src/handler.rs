//! Event handlers for the signaling relay
//!
//! One handler per inbound event. Handlers hold no state of their own: they
//! check the request against the room registry, apply any change, and queue
//! the resulting events on the peers' outboxes, all under one registry lock.

use crate::error::RoomError;
use crate::protocol::{
    ClientEvent, ConnectionId, IceCandidate, RelayedCandidate, RelayedDescription,
    RoomCredentials, ServerEvent, SessionDescription,
};
use crate::state::{Joined, Removal, ServerState};

/// Route one decoded event sent by `sender`
pub fn handle_event(state: &ServerState, sender: ConnectionId, event: ClientEvent) {
    tracing::debug!(connection = %sender, event = event.name(), "Handling event");

    match event {
        ClientEvent::CreateRoom(credentials) => handle_create_room(state, sender, credentials),
        ClientEvent::JoinRoom(credentials) => handle_join_room(state, sender, credentials),
        ClientEvent::Offer(SessionDescription { target_id, sdp }) => {
            let event = ServerEvent::Offer(RelayedDescription { sdp, from: sender });
            relay(state, target_id, event);
        }
        ClientEvent::Answer(SessionDescription { target_id, sdp }) => {
            let event = ServerEvent::Answer(RelayedDescription { sdp, from: sender });
            relay(state, target_id, event);
        }
        ClientEvent::IceCandidate(IceCandidate {
            target_id,
            candidate,
        }) => {
            let event = ServerEvent::IceCandidate(RelayedCandidate {
                candidate,
                from: sender,
            });
            relay(state, target_id, event);
        }
        ClientEvent::HostStopped => handle_host_stopped(state, sender),
    }
}

/// Clean up after a terminated connection
///
/// Must run exactly once per connection, after its last event.
pub fn handle_disconnect(state: &ServerState, connection: ConnectionId) {
    let mut registry = state.registry();

    match registry.remove_connection(&connection) {
        Removal::HostRemoved { room, members } => {
            state
                .peers()
                .emit_all(&members, ServerEvent::HostDisconnected);
            tracing::info!(room = %room, host = %connection, "Host disconnected, room closed");
        }
        Removal::ViewerRemoved {
            room,
            host,
            viewers,
        } => {
            state.peers().emit(&host, ServerEvent::UpdateViewers(viewers));
            tracing::info!(room = %room, viewer = %connection, "Viewer left room");
        }
        Removal::NoOp => {}
    }
}

fn handle_create_room(state: &ServerState, sender: ConnectionId, credentials: RoomCredentials) {
    let RoomCredentials { room_id, password } = credentials;
    let mut registry = state.registry();

    match registry.create_room(room_id.clone(), password, sender) {
        Ok(()) => {
            state.peers().emit(&sender, ServerEvent::RoomCreated);
            tracing::info!(room = %room_id, host = %sender, "Room created");
        }
        Err(err) => reject(state, sender, err),
    }
}

fn handle_join_room(state: &ServerState, sender: ConnectionId, credentials: RoomCredentials) {
    let mut registry = state.registry();

    match registry.join_room(&credentials.room_id, &credentials.password, sender) {
        Ok(Joined { host, viewers }) => {
            let peers = state.peers();
            peers.emit(&sender, ServerEvent::RoomJoined);
            peers.emit(&host, ServerEvent::ViewerJoined(sender));
            peers.emit(&host, ServerEvent::UpdateViewers(viewers));
            tracing::debug!(room = %credentials.room_id, viewer = %sender, "Viewer joined room");
        }
        Err(err) => reject(state, sender, err),
    }
}

fn handle_host_stopped(state: &ServerState, sender: ConnectionId) {
    let registry = state.registry();

    let Some(room_id) = registry.room_of(&sender) else {
        tracing::debug!(connection = %sender, "host-stopped from connection without a room");
        return;
    };
    state
        .peers()
        .emit_all(&registry.members(room_id), ServerEvent::HostStopped);
    tracing::info!(room = %room_id, connection = %sender, "Host stopped sharing");
}

/// Forward a negotiation message; the target is not checked against any room
fn relay(state: &ServerState, target: ConnectionId, event: ServerEvent) {
    state.peers().emit(&target, event);
}

fn reject(state: &ServerState, sender: ConnectionId, err: RoomError) {
    tracing::debug!(connection = %sender, error = %err, "Request rejected");
    state
        .peers()
        .emit(&sender, ServerEvent::ErrorMessage(err.to_string()));
}
