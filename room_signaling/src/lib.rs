//! Room-based WebRTC signaling relay over WebSocket
//!
//! One peer (the host) creates a password-protected room; other peers
//! (viewers) join it. The relay forwards session descriptions and ICE
//! candidates between them so they can open a direct peer-to-peer
//! connection. Media never passes through the relay.
//!
//! # Protocol
//!
//! Each WebSocket text frame is a JSON envelope
//! `{"event": "<name>", "data": <payload>}`; `data` is left out when an event
//! has no payload.
//!
//! ## Client → server
//!
//! - `create-room` `{"roomId": "...", "password": "..."}`
//! - `join-room` `{"roomId": "...", "password": "..."}`
//! - `offer` / `answer` `{"targetId": "<uuid>", "sdp": ...}`
//! - `ice-candidate` `{"targetId": "<uuid>", "candidate": ...}`
//! - `host-stopped`
//!
//! ## Server → client
//!
//! - `connected` `"<uuid>"` (first frame, the connection's own id)
//! - `room-created`, `room-joined`
//! - `error-message` `"Room already exists."` | `"Room not found."` |
//!   `"Incorrect password."` | `"Already in a room."`
//! - `viewer-joined` `"<uuid>"` and `update-viewers` `["<uuid>", ...]` (to the host)
//! - `offer` / `answer` `{"sdp": ..., "from": "<uuid>"}`
//! - `ice-candidate` `{"candidate": ..., "from": "<uuid>"}`
//! - `host-stopped`, `host-disconnected`
//!
//! `sdp` and `candidate` are relayed byte-for-byte without inspection.
//!
//! # Example
//!
//! ```bash
//! # Start the server on 0.0.0.0:5000
//! room-signaling
//!
//! # Host a room
//! websocat ws://127.0.0.1:5000
//! {"event":"create-room","data":{"roomId":"r1","password":"pw"}}
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handler;
pub mod peers;
pub mod protocol;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ClientRequestError, RoomError, SignalingError};
pub use handler::{handle_disconnect, handle_event};
pub use peers::Peers;
pub use protocol::{ClientEvent, ConnectionId, RoomId, ServerEvent};
pub use server::SignalingServer;
pub use state::{Room, RoomRegistry, ServerState};
