//! Error types for the signaling relay

use thiserror::Error;

/// Errors that can occur while running the signaling server
#[derive(Error, Debug)]
pub enum SignalingError {
    /// Socket error (bind, accept)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from client requests
#[derive(Error, Debug)]
pub enum ClientRequestError {
    /// Connection was closed
    #[error("Connection closed")]
    Close,

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unsupported message type
    #[error("Unsupported message type")]
    UnsupportedType,

    /// Event name not part of the protocol
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Event requires a `data` payload but none was sent
    #[error("Missing payload for event: {0}")]
    MissingPayload(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Admission failures reported back to the requesting peer
///
/// The display strings are sent verbatim as the `error-message` payload.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomError {
    #[error("Room already exists.")]
    RoomExists,

    #[error("Room not found.")]
    RoomNotFound,

    #[error("Incorrect password.")]
    WrongPassword,

    /// The connection already created or joined a different room
    #[error("Already in a room.")]
    AlreadyInRoom,
}
