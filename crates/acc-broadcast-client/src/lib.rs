//! Reconnecting client for the ACC broadcasting protocol.
//!
//! [`BroadcastClient`] registers with the simulator, keeps the entry list
//! coherent, delivers decoded messages to a [`BroadcastHandler`] and reconnects
//! after the configured delay whenever the connection goes quiet or fails.
//!
//! ```no_run
//! use acc_broadcast_client::{BroadcastClient, ClientConfig, ClientEvent};
//! use tokio::sync::mpsc;
//!
//! # async fn demo() -> Result<(), acc_broadcast_client::ClientError> {
//! let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ClientEvent>();
//! let (mut client, handle) = BroadcastClient::new(ClientConfig::default(), events_tx);
//!
//! tokio::spawn(async move {
//!     while let Some(event) = events_rx.recv().await {
//!         println!("{event:?}");
//!     }
//! });
//!
//! tokio::spawn(async move {
//!     if tokio::signal::ctrl_c().await.is_ok() {
//!         handle.request_disconnect();
//!     }
//! });
//!
//! client.run().await
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod state;
pub mod transport;

pub use cache::{CarStatus, EntryListCache};
pub use client::{BroadcastClient, ClientHandle};
pub use config::{ClientConfig, ConfigError};
pub use dispatch::{BroadcastHandler, ClientEvent, Dispatcher, NoopHandler};
pub use error::{ClientError, ErrorCategory};
pub use state::ConnectionState;
pub use transport::{Connector, Transport, UdpConnector, UdpTransport};

pub use acc_broadcast_protocol as protocol;
