//! Wire protocol for the signaling relay
//!
//! Every WebSocket text frame carries exactly one JSON envelope:
//!
//! ```json
//! {"event": "<event-name>", "data": <payload>}
//! ```
//!
//! `data` is omitted for events that carry no payload. Inbound, a missing
//! `data` and `"data": null` are treated the same.
//!
//! Negotiation payloads (`sdp`, `candidate`) are kept as raw JSON text and
//! written back out unchanged, so the relay never reinterprets them.

use crate::error::ClientRequestError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier assigned to a connection when the server accepts it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Room identifier, chosen by the host that creates the room
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload of `create-room` and `join-room`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCredentials {
    pub room_id: RoomId,
    /// Any JSON value, compared by type and value. Absent means `""`.
    #[serde(default = "empty_password")]
    pub password: Value,
}

fn empty_password() -> Value {
    Value::String(String::new())
}

/// Payload of an inbound `offer` or `answer`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescription {
    pub target_id: ConnectionId,
    pub sdp: Box<RawValue>,
}

/// Payload of an inbound `ice-candidate`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub target_id: ConnectionId,
    pub candidate: Box<RawValue>,
}

/// Events a peer can send to the relay
#[derive(Debug, Clone)]
pub enum ClientEvent {
    CreateRoom(RoomCredentials),
    JoinRoom(RoomCredentials),
    Offer(SessionDescription),
    Answer(SessionDescription),
    IceCandidate(IceCandidate),
    HostStopped,
}

impl ClientEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CreateRoom(_) => "create-room",
            ClientEvent::JoinRoom(_) => "join-room",
            ClientEvent::Offer(_) => "offer",
            ClientEvent::Answer(_) => "answer",
            ClientEvent::IceCandidate(_) => "ice-candidate",
            ClientEvent::HostStopped => "host-stopped",
        }
    }
}

#[derive(Deserialize)]
struct Envelope<'a> {
    event: String,
    #[serde(borrow, default)]
    data: Option<&'a RawValue>,
}

impl Envelope<'_> {
    fn payload<T: DeserializeOwned>(&self) -> Result<T, ClientRequestError> {
        let data = self
            .data
            .ok_or_else(|| ClientRequestError::MissingPayload(self.event.clone()))?;
        Ok(serde_json::from_str(data.get())?)
    }
}

impl FromStr for ClientEvent {
    type Err = ClientRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let envelope: Envelope<'_> = serde_json::from_str(s)?;
        let event = match envelope.event.as_str() {
            "create-room" => ClientEvent::CreateRoom(envelope.payload()?),
            "join-room" => ClientEvent::JoinRoom(envelope.payload()?),
            "offer" => ClientEvent::Offer(envelope.payload()?),
            "answer" => ClientEvent::Answer(envelope.payload()?),
            "ice-candidate" => ClientEvent::IceCandidate(envelope.payload()?),
            "host-stopped" => ClientEvent::HostStopped,
            _ => return Err(ClientRequestError::UnknownEvent(envelope.event)),
        };
        Ok(event)
    }
}

/// Session description forwarded to its target
#[derive(Debug, Clone, Serialize)]
pub struct RelayedDescription {
    pub sdp: Box<RawValue>,
    pub from: ConnectionId,
}

/// Connectivity candidate forwarded to its target
#[derive(Debug, Clone, Serialize)]
pub struct RelayedCandidate {
    pub candidate: Box<RawValue>,
    pub from: ConnectionId,
}

/// Events the relay sends to peers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// First frame on every connection, carrying the id the server assigned
    Connected(ConnectionId),
    RoomCreated,
    RoomJoined,
    ErrorMessage(String),
    ViewerJoined(ConnectionId),
    UpdateViewers(Vec<ConnectionId>),
    Offer(RelayedDescription),
    Answer(RelayedDescription),
    IceCandidate(RelayedCandidate),
    HostStopped,
    HostDisconnected,
}

impl ServerEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected(_) => "connected",
            ServerEvent::RoomCreated => "room-created",
            ServerEvent::RoomJoined => "room-joined",
            ServerEvent::ErrorMessage(_) => "error-message",
            ServerEvent::ViewerJoined(_) => "viewer-joined",
            ServerEvent::UpdateViewers(_) => "update-viewers",
            ServerEvent::Offer(_) => "offer",
            ServerEvent::Answer(_) => "answer",
            ServerEvent::IceCandidate(_) => "ice-candidate",
            ServerEvent::HostStopped => "host-stopped",
            ServerEvent::HostDisconnected => "host-disconnected",
        }
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> ConnectionId {
        Uuid::new_v4().into()
    }

    #[test]
    fn parses_room_requests() {
        let event: ClientEvent =
            r#"{"event":"create-room","data":{"roomId":"r1","password":"pw"}}"#
                .parse()
                .unwrap();
        match event {
            ClientEvent::CreateRoom(creds) => {
                assert_eq!(creds.room_id, RoomId::from("r1"));
                assert_eq!(creds.password, "pw");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let event: ClientEvent = r#"{"event":"join-room","data":{"roomId":"r1"}}"#
            .parse()
            .unwrap();
        match event {
            ClientEvent::JoinRoom(creds) => assert_eq!(creds.password, ""),
            other => panic!("unexpected event: {other:?}"),
        }

        // Non-string passwords decode as-is and are compared later
        let event: ClientEvent = r#"{"event":"join-room","data":{"roomId":"r1","password":5}}"#
            .parse()
            .unwrap();
        match event {
            ClientEvent::JoinRoom(creds) => assert_eq!(creds.password, json!(5)),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn host_stopped_needs_no_payload() {
        let bare: ClientEvent = r#"{"event":"host-stopped"}"#.parse().unwrap();
        assert!(matches!(bare, ClientEvent::HostStopped));

        let null: ClientEvent = r#"{"event":"host-stopped","data":null}"#.parse().unwrap();
        assert!(matches!(null, ClientEvent::HostStopped));
    }

    #[test]
    fn keeps_negotiation_payload_verbatim() {
        let target = id();
        let raw = r#"{"type":"offer","sdp":"v=0\r\no=- 1 2 IN IP4 0.0.0.0","x":[1, 2.50]}"#;
        let frame = format!(r#"{{"event":"offer","data":{{"targetId":"{target}","sdp":{raw}}}}}"#);

        let ClientEvent::Offer(offer) = frame.parse().unwrap() else {
            panic!("expected offer");
        };
        assert_eq!(offer.target_id, target);
        assert_eq!(offer.sdp.get(), raw);
    }

    #[test]
    fn rejects_unknown_and_incomplete_events() {
        let unknown = "{\"event\":\"kick\",\"data\":{}}".parse::<ClientEvent>();
        assert!(matches!(unknown, Err(ClientRequestError::UnknownEvent(name)) if name == "kick"));

        let missing = "{\"event\":\"join-room\"}".parse::<ClientEvent>();
        assert!(matches!(missing, Err(ClientRequestError::MissingPayload(_))));

        let no_target = r#"{"event":"answer","data":{"sdp":{}}}"#.parse::<ClientEvent>();
        assert!(matches!(no_target, Err(ClientRequestError::Json(_))));

        assert!("not json".parse::<ClientEvent>().is_err());
    }

    #[test]
    fn serializes_events_with_envelope() {
        let connected = id();
        let greeting: Value =
            serde_json::from_str(&ServerEvent::Connected(connected).to_string()).unwrap();
        assert_eq!(
            greeting,
            json!({"event": "connected", "data": connected.to_string()})
        );

        let room_created: Value =
            serde_json::from_str(&ServerEvent::RoomCreated.to_string()).unwrap();
        assert_eq!(room_created, json!({"event": "room-created"}));

        let error: Value =
            serde_json::from_str(&ServerEvent::ErrorMessage("Room not found.".into()).to_string())
                .unwrap();
        assert_eq!(error, json!({"event": "error-message", "data": "Room not found."}));

        let viewer = id();
        let update: Value =
            serde_json::from_str(&ServerEvent::UpdateViewers(vec![viewer]).to_string()).unwrap();
        assert_eq!(
            update,
            json!({"event": "update-viewers", "data": [viewer.to_string()]})
        );
    }

    #[test]
    fn relayed_candidate_carries_sender() {
        let from = id();
        let candidate = RawValue::from_string(
            r#"{"candidate":"candidate:1 1 UDP 2122 10.0.0.2 5000 typ host","sdpMLineIndex":0}"#
                .to_string(),
        )
        .unwrap();
        let event = ServerEvent::IceCandidate(RelayedCandidate {
            candidate: candidate.clone(),
            from,
        });

        let text = event.to_string();
        assert!(text.contains(candidate.get()));
        assert!(text.starts_with(r#"{"event":"ice-candidate","data":{"candidate":"#));
        assert!(text.ends_with(&format!(r#""from":"{from}"}}}}"#)));
    }
}
