//! WebSocket transport for the signaling relay
//!
//! Accepts TCP connections, upgrades them to WebSocket and runs one task per
//! connection. The task reads frames in arrival order and hands each decoded
//! event to the router; a companion writer task drains the connection's
//! outbox onto the socket.

use crate::config::ServerConfig;
use crate::error::{ClientRequestError, SignalingError};
use crate::handler::{handle_disconnect, handle_event};
use crate::protocol::{ClientEvent, ConnectionId, ServerEvent};
use crate::state::ServerState;
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{self, Message};

/// Signaling server
pub struct SignalingServer {
    config: ServerConfig,
    state: ServerState,
}

impl SignalingServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: ServerState::new(),
        }
    }

    /// Run the server until `shutdown` completes
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), SignalingError>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.serve(listener) => result,
        }
    }

    /// Accept connections on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<(), SignalingError> {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Signaling server listening");

        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(socket, peer_addr, state).await {
                            tracing::debug!(
                                peer = %peer_addr,
                                error = %e,
                                "Connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

async fn handle_connection(
    socket: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), SignalingError> {
    let ws = tokio_tungstenite::accept_async(socket).await?;
    let connection: ConnectionId = uuid::Uuid::new_v4().into();
    tracing::info!(connection = %connection, peer = %peer_addr, "Connected");

    // Register the outbox before anything can be routed to this id
    let (mut sink, mut stream) = ws.split();
    let mut outbox = state.peers().register(connection);
    state.peers().emit(&connection, ServerEvent::Connected(connection));

    // Writer task: outbox -> socket, ends once the outbox is dropped
    let writer = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(connection = %connection, error = %e, "Failed to encode event");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::text(text)).await {
                tracing::debug!(connection = %connection, error = %e, "Failed to send event");
                break;
            }
        }
        if let Err(e) = sink.close().await {
            tracing::debug!(connection = %connection, error = %e, "Failed to close socket");
        }
    });

    // Reader loop: frames are routed one at a time in arrival order
    while let Some(frame) = stream.next().await {
        match parse_request(frame) {
            Ok(Some(event)) => handle_event(&state, connection, event),
            Ok(None) => {}
            Err(ClientRequestError::Close) => break,
            Err(ClientRequestError::WebSocket(e)) => {
                tracing::debug!(connection = %connection, error = %e, "Read failed");
                break;
            }
            Err(e) => {
                tracing::warn!(connection = %connection, error = %e, "Ignoring invalid request");
            }
        }
    }

    // Room cleanup first, then drop the outbox so the writer drains and exits
    handle_disconnect(&state, connection);
    state.peers().unregister(&connection);
    tracing::info!(connection = %connection, "Disconnected");

    if let Err(e) = writer.await {
        tracing::debug!(connection = %connection, error = %e, "Writer task failed");
    }
    Ok(())
}

/// Decode one WebSocket frame; control frames yield `None`
fn parse_request(
    frame: Result<Message, tungstenite::Error>,
) -> Result<Option<ClientEvent>, ClientRequestError> {
    match frame? {
        Message::Text(text) => Ok(Some(text.as_str().parse()?)),
        Message::Binary(_) => Err(ClientRequestError::UnsupportedType),
        Message::Close(_) => Err(ClientRequestError::Close),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
    }
}
