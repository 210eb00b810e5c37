//! `SketchRelayServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room registry.

use std::sync::Arc;

use sketchrelay_protocol::{Codec, JsonCodec};
use sketchrelay_room::{RoomConfig, RoomRegistry};
use sketchrelay_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{ServerConfig, ServerError};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a SketchRelay server.
///
/// ```rust,no_run
/// use sketchrelay::prelude::*;
///
/// # async fn start() -> Result<(), ServerError> {
/// let server = SketchRelayServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SketchRelayServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl SketchRelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(&ServerConfig::default())
    }

    /// Creates a builder from loaded configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.bind.clone(),
            room_config: config.room_config(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the settings every room uses.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener. Speaks JSON over WebSocket.
    pub async fn build(self) -> Result<SketchRelayServer<JsonCodec>, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(self.room_config)),
            codec: JsonCodec,
        });

        Ok(SketchRelayServer { transport, state })
    }
}

impl Default for SketchRelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound SketchRelay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SketchRelayServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SketchRelayServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> SketchRelayServerBuilder {
        SketchRelayServerBuilder::new()
    }
}

impl<C: Codec> SketchRelayServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("SketchRelay server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
