//! Server state management for the signaling relay
//!
//! This module owns the room registry: which rooms exist, who hosts them,
//! who is watching, and which room every connection belongs to.
//!
//! [`RoomRegistry`] is a plain single-threaded structure. [`ServerState`] is
//! the shared handle the server hands to every connection task; it keeps the
//! registry behind a single mutex so each event is applied atomically.

use crate::error::RoomError;
use crate::peers::Peers;
use crate::protocol::{ConnectionId, RoomId};
use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A live room: one host and the viewers it admitted
#[derive(Debug, Clone)]
pub struct Room {
    host: ConnectionId,
    password: Value,
    viewers: HashSet<ConnectionId>,
}

impl Room {
    fn new(host: ConnectionId, password: Value) -> Self {
        Self {
            host,
            password,
            viewers: HashSet::new(),
        }
    }

    /// Connection that created the room
    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn viewers(&self) -> &HashSet<ConnectionId> {
        &self.viewers
    }

    /// Viewer ids as sent in `update-viewers`
    pub fn viewer_list(&self) -> Vec<ConnectionId> {
        self.viewers.iter().copied().collect()
    }

    /// Host followed by all viewers
    pub fn members(&self) -> Vec<ConnectionId> {
        std::iter::once(self.host)
            .chain(self.viewers.iter().copied())
            .collect()
    }

    pub fn is_host(&self, id: &ConnectionId) -> bool {
        self.host == *id
    }
}

/// Result of a successful join, used to notify the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub host: ConnectionId,
    pub viewers: Vec<ConnectionId>,
}

/// What [`RoomRegistry::remove_connection`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// The host left; the room is gone and `members` were still in it
    HostRemoved {
        room: RoomId,
        members: Vec<ConnectionId>,
    },
    /// A viewer left; `viewers` is the updated list for the host
    ViewerRemoved {
        room: RoomId,
        host: ConnectionId,
        viewers: Vec<ConnectionId>,
    },
    /// The connection never created or joined a room
    NoOp,
}

/// Map of rooms and connection memberships
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Map of room ID -> room
    rooms: HashMap<RoomId, Room>,
    /// Map of connection ID -> the room it created or joined
    connections: HashMap<ConnectionId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room hosted by `host`
    ///
    /// Existing rooms are never overwritten. A connection that already
    /// belongs to a room cannot create another one.
    pub fn create_room(
        &mut self,
        room_id: RoomId,
        password: Value,
        host: ConnectionId,
    ) -> Result<(), RoomError> {
        if self.rooms.contains_key(&room_id) {
            return Err(RoomError::RoomExists);
        }
        if self.connections.contains_key(&host) {
            return Err(RoomError::AlreadyInRoom);
        }

        self.rooms.insert(room_id.clone(), Room::new(host, password));
        self.connections.insert(host, room_id);
        Ok(())
    }

    /// Admit `viewer` into an existing room
    ///
    /// The password must match exactly, type included: `5` never matches
    /// `"5"`. Joining the same room twice is a no-op on the viewer set but
    /// still reports success.
    pub fn join_room(
        &mut self,
        room_id: &RoomId,
        password: &Value,
        viewer: ConnectionId,
    ) -> Result<Joined, RoomError> {
        let room = self.rooms.get_mut(room_id).ok_or(RoomError::RoomNotFound)?;
        if room.password != *password {
            return Err(RoomError::WrongPassword);
        }

        // Hosts and members of other rooms cannot become viewers here
        match self.connections.get(&viewer) {
            Some(current) if current != room_id => return Err(RoomError::AlreadyInRoom),
            Some(_) if room.is_host(&viewer) => return Err(RoomError::AlreadyInRoom),
            _ => {}
        }

        // Set semantics make a repeated join harmless
        room.viewers.insert(viewer);
        self.connections.insert(viewer, room_id.clone());

        Ok(Joined {
            host: room.host,
            viewers: room.viewer_list(),
        })
    }

    /// Drop every trace of a terminated connection
    ///
    /// A departing host takes its room with it, and its viewers become
    /// unassociated.
    pub fn remove_connection(&mut self, id: &ConnectionId) -> Removal {
        let Some(room_id) = self.connections.remove(id) else {
            return Removal::NoOp;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return Removal::NoOp;
        };

        if room.is_host(id) {
            // Delete the room and release everyone still in it
            let members: Vec<ConnectionId> = room.viewer_list();
            self.rooms.remove(&room_id);
            for member in &members {
                self.connections.remove(member);
            }
            Removal::HostRemoved {
                room: room_id,
                members,
            }
        } else {
            // Viewer left, host gets the new list
            room.viewers.remove(id);
            Removal::ViewerRemoved {
                host: room.host,
                viewers: room.viewer_list(),
                room: room_id,
            }
        }
    }

    pub fn get_room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Room the connection created or joined, if any
    pub fn room_of(&self, id: &ConnectionId) -> Option<&RoomId> {
        self.connections.get(id)
    }

    /// Host and viewers of a room, empty if the room does not exist
    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(Room::members)
            .unwrap_or_default()
    }
}

/// Shared server state handle
///
/// Clones share the same registry and peer outboxes.
#[derive(Default, Clone)]
pub struct ServerState {
    registry: Arc<Mutex<RoomRegistry>>,
    peers: Peers,
}

impl ServerState {
    /// Create a new server state handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the registry
    ///
    /// Hold the guard for the whole event so that reads, mutations and the
    /// resulting emits are not interleaved with another connection's event.
    pub fn registry(&self) -> MutexGuard<'_, RoomRegistry> {
        self.registry.lock()
    }

    /// Outboxes of connected peers
    pub fn peers(&self) -> &Peers {
        &self.peers
    }
}
