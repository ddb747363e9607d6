//! Connection state machine.
//!
//! One task owns the socket, the receive buffer, the entry-list cache and the
//! handler. Each connection attempt walks the phases in order; transient
//! failures end the attempt and the next one starts after the reconnect delay.
//! Fatal failures end [`BroadcastClient::run`].

use std::net::SocketAddr;
use std::time::Instant;

use acc_broadcast_protocol::{InboundMessage, OutboundRequest, RegistrationResult, decode_inbound};
use tokio::sync::watch;
use tokio::time;
use tracing::{Instrument, debug, error, info, info_span, trace, warn};

use crate::cache::{CarStatus, EntryListCache};
use crate::config::ClientConfig;
use crate::dispatch::{BroadcastHandler, Dispatcher};
use crate::error::{ClientError, ErrorCategory};
use crate::state::ConnectionState;
use crate::transport::{Connector, Transport, UdpConnector};

/// Phase of a single connection attempt, carrying what it owns.
enum Phase<T> {
    Resolving,
    Connecting(SocketAddr),
    AwaitingRegistration(T),
    Active(T),
    Closing(T),
}

impl<T> Phase<T> {
    fn state(&self) -> ConnectionState {
        match self {
            Self::Resolving => ConnectionState::Resolving,
            Self::Connecting(_) => ConnectionState::Connecting,
            Self::AwaitingRegistration(_) => ConnectionState::AwaitingRegistration,
            Self::Active(_) => ConnectionState::Active,
            Self::Closing(_) => ConnectionState::Closing,
        }
    }
}

/// Outcome of one receive.
enum Received {
    Message(InboundMessage),
    /// Undecodable datagram, already logged.
    Dropped,
    Stopped,
}

/// Control side of a running client.
///
/// Dropping the handle does not stop the client.
#[derive(Debug)]
pub struct ClientHandle {
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ClientHandle {
    /// Ask the client to unregister and return from `run`.
    ///
    /// Honoured between reads, during the handshake and during the reconnect
    /// delay. Once requested it stays requested.
    pub fn request_disconnect(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_disconnect_requested(&self) -> bool {
        *self.stop_tx.borrow()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}

/// Reconnecting broadcasting client.
pub struct BroadcastClient<C: Connector, H> {
    config: ClientConfig,
    connector: C,
    dispatcher: Dispatcher<H>,
    cache: EntryListCache,
    buffer: Vec<u8>,
    connection_id: Option<i32>,
    state_tx: watch::Sender<ConnectionState>,
    stop_rx: watch::Receiver<bool>,
}

impl<H: BroadcastHandler> BroadcastClient<UdpConnector, H> {
    /// Client over real UDP sockets.
    pub fn new(config: ClientConfig, handler: H) -> (Self, ClientHandle) {
        Self::with_connector(config, UdpConnector, handler)
    }
}

impl<C: Connector, H: BroadcastHandler> BroadcastClient<C, H> {
    pub fn with_connector(config: ClientConfig, connector: C, handler: H) -> (Self, ClientHandle) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let client = Self {
            cache: EntryListCache::new(config.entry_list_refresh_interval()),
            buffer: vec![0; config.receive_buffer_size],
            config,
            connector,
            dispatcher: Dispatcher::new(handler),
            connection_id: None,
            state_tx,
            stop_rx,
        };
        let handle = ClientHandle { stop_tx, state_rx };
        (client, handle)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn handler(&self) -> &H {
        self.dispatcher.handler()
    }

    pub fn cache(&self) -> &EntryListCache {
        &self.cache
    }

    pub fn into_handler(self) -> H {
        self.dispatcher.into_handler()
    }

    /// Connect, receive and reconnect until a disconnect is requested.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned: an invalid configuration or a datagram
    /// that does not fit the receive buffer. A rejected registration is
    /// logged and retried like any other failed attempt.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        self.config.validate()?;
        let span = info_span!("acc_broadcast", address = %self.config.address);
        self.run_attempts().instrument(span).await
    }

    async fn run_attempts(&mut self) -> Result<(), ClientError> {
        let mut attempt: u64 = 0;
        loop {
            if self.stop_requested() {
                break;
            }
            if attempt > 0 {
                self.set_state(ConnectionState::Idle);
                if self.backoff().await {
                    break;
                }
            }
            attempt = attempt.saturating_add(1);

            let outcome = self.connect_once().await;
            self.teardown();

            match outcome {
                Ok(()) => {
                    info!(attempt, "disconnected");
                    break;
                }
                Err(e) if e.is_fatal() => {
                    error!(category = %e.category(), error = %e, "fatal broadcasting error");
                    self.set_state(ConnectionState::Idle);
                    return Err(e);
                }
                Err(e @ ClientError::RegistrationRejected { .. }) => {
                    error!(
                        category = %e.category(),
                        error = %e,
                        attempt,
                        retry_in_ms = self.config.reconnect_delay_ms,
                        "registration rejected"
                    );
                }
                Err(e) => {
                    warn!(
                        category = %e.category(),
                        error = %e,
                        attempt,
                        retry_in_ms = self.config.reconnect_delay_ms,
                        "connection attempt failed"
                    );
                }
            }
        }
        self.set_state(ConnectionState::Idle);
        Ok(())
    }

    /// One pass through the handshake and read loop. `Ok` means stopped on
    /// request.
    async fn connect_once(&mut self) -> Result<(), ClientError> {
        let mut phase = Phase::Resolving;
        loop {
            if self.stop_requested() {
                match phase {
                    Phase::Active(transport) => phase = Phase::Closing(transport),
                    Phase::Closing(_) => {}
                    _ => return Ok(()),
                }
            }
            self.set_state(phase.state());

            phase = match phase {
                Phase::Resolving => Phase::Connecting(self.resolve().await?),
                Phase::Connecting(remote) => Phase::AwaitingRegistration(self.open(remote).await?),
                Phase::AwaitingRegistration(mut transport) => {
                    if !self.register(&mut transport).await? {
                        return Ok(());
                    }
                    Phase::Active(transport)
                }
                Phase::Active(mut transport) => {
                    self.receive_loop(&mut transport).await?;
                    Phase::Closing(transport)
                }
                Phase::Closing(mut transport) => {
                    self.close(&mut transport).await;
                    return Ok(());
                }
            };
        }
    }

    async fn resolve(&mut self) -> Result<SocketAddr, ClientError> {
        let address = self.config.address.clone();
        let timeout = self.config.timeout();
        let resolved = match time::timeout(timeout, self.connector.resolve(&address)).await {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "address resolution timed out",
            )),
        };
        let remote = resolved.map_err(|source| ClientError::Resolve { address, source })?;
        debug!(remote = %remote, "address resolved");
        Ok(remote)
    }

    async fn open(&mut self, remote: SocketAddr) -> Result<C::Transport, ClientError> {
        self.connector
            .open(remote)
            .await
            .map_err(|source| ClientError::Open {
                remote: remote.to_string(),
                source,
            })
    }

    /// Send the registration and wait for its answer. Returns false when a
    /// disconnect was requested first.
    async fn register(&mut self, transport: &mut C::Transport) -> Result<bool, ClientError> {
        let request = OutboundRequest::Register {
            display_name: self.config.display_name.clone(),
            connection_password: self.config.connection_password.clone(),
            update_interval_ms: self.config.update_interval_ms,
            command_password: self.config.command_password.clone(),
        };
        self.send_request(transport, &request).await?;

        loop {
            match self.receive(transport).await? {
                Received::Stopped => return Ok(false),
                Received::Dropped => {}
                Received::Message(InboundMessage::RegistrationResult(result)) => {
                    self.on_registered(transport, result).await?;
                    return Ok(true);
                }
                Received::Message(other) => {
                    debug!(message_type = %other.kind(), "ignoring message before registration");
                }
            }
        }
    }

    async fn on_registered(
        &mut self,
        transport: &mut C::Transport,
        result: RegistrationResult,
    ) -> Result<(), ClientError> {
        if !result.success {
            return Err(ClientError::RegistrationRejected {
                reason: result.error_message,
            });
        }

        let connection_id = result.connection_id;
        info!(connection_id, readonly = result.readonly, "registered");
        self.connection_id = Some(connection_id);
        self.dispatcher
            .dispatch(&InboundMessage::RegistrationResult(result));

        if self.config.request_entry_list_on_connect {
            self.request_entry_list(transport).await?;
            self.cache.note_refresh_requested(Instant::now());
        }
        if self.config.request_track_data_on_connect {
            self.send_request(transport, &OutboundRequest::RequestTrackData { connection_id })
                .await?;
        }
        Ok(())
    }

    async fn receive_loop(&mut self, transport: &mut C::Transport) -> Result<(), ClientError> {
        loop {
            match self.receive(transport).await? {
                Received::Stopped => return Ok(()),
                Received::Dropped => {}
                Received::Message(message) => self.handle_message(transport, message).await?,
            }
        }
    }

    /// Read and decode one datagram, bounded by the configured timeout.
    async fn receive(&mut self, transport: &mut C::Transport) -> Result<Received, ClientError> {
        let timeout = self.config.timeout();
        let mut stop_rx = self.stop_rx.clone();

        let read = tokio::select! {
            biased;
            () = wait_for_stop(&mut stop_rx) => return Ok(Received::Stopped),
            read = time::timeout(timeout, transport.recv(&mut self.buffer)) => read,
        };

        let len = match read {
            Ok(Ok(len)) => len,
            Ok(Err(e)) => return Err(ClientError::Read(e)),
            Err(_) => {
                return Err(ClientError::ReadTimeout {
                    timeout_ms: timeout.as_millis(),
                });
            }
        };

        // A datagram filling the whole buffer may have been cut short.
        let capacity = self.buffer.len();
        if len >= capacity {
            return Err(ClientError::BufferOverflow {
                capacity,
                received: len,
            });
        }

        let frame = self.buffer.get(..len).unwrap_or_default();
        match decode_inbound(frame) {
            Ok(message) => {
                trace!(message_type = %message.kind(), bytes = len, "received");
                Ok(Received::Message(message))
            }
            Err(e) => {
                warn!(
                    category = %ErrorCategory::Decode,
                    message_type = ?frame.first(),
                    bytes = len,
                    error = %e,
                    "dropping undecodable message"
                );
                Ok(Received::Dropped)
            }
        }
    }

    async fn handle_message(
        &mut self,
        transport: &mut C::Transport,
        message: InboundMessage,
    ) -> Result<(), ClientError> {
        match &message {
            InboundMessage::RealtimeCarUpdate(update) => {
                let car_id = update.car_id;
                match self.cache.car_status(car_id) {
                    CarStatus::Known => self.dispatcher.dispatch(&message),
                    CarStatus::Pending => {
                        trace!(car_id, "car metadata pending, suppressing update");
                        if self.cache.on_pending_car(car_id, Instant::now()) {
                            info!(car_id, "car metadata missing, requesting entry list");
                            self.request_entry_list(transport).await?;
                        }
                    }
                    CarStatus::Unknown => {
                        trace!(car_id, "car not in entry list, suppressing update");
                        if self.cache.on_unknown_car(car_id, Instant::now()) {
                            info!(car_id, "unknown car, requesting entry list");
                            self.request_entry_list(transport).await?;
                        }
                    }
                }
            }
            InboundMessage::EntryList(list) => {
                self.cache.on_entry_list_received(list);
                self.dispatcher.dispatch(&message);
            }
            InboundMessage::EntryListCar(car) => {
                self.cache.on_entry_list_car_received(car);
                self.dispatcher.dispatch(&message);
            }
            InboundMessage::TrackData(track) => {
                debug!(track = %track.name, meters = track.meters, "track data received");
                self.cache.on_track_data(track);
                self.dispatcher.dispatch(&message);
            }
            InboundMessage::RegistrationResult(result) => {
                debug!(
                    connection_id = result.connection_id,
                    "ignoring repeated registration result"
                );
            }
            InboundMessage::RealtimeUpdate(_) | InboundMessage::BroadcastingEvent(_) => {
                self.dispatcher.dispatch(&message);
            }
        }
        Ok(())
    }

    async fn request_entry_list(&mut self, transport: &mut C::Transport) -> Result<(), ClientError> {
        let Some(connection_id) = self.connection_id else {
            warn!("not registered, skipping entry list request");
            return Ok(());
        };
        self.send_request(transport, &OutboundRequest::RequestEntryList { connection_id })
            .await
    }

    /// Encode in full, then send as one datagram. Anything but a complete
    /// write fails the attempt.
    async fn send_request(
        &mut self,
        transport: &mut C::Transport,
        request: &OutboundRequest,
    ) -> Result<(), ClientError> {
        let frame = request.encode().map_err(ClientError::Encode)?;
        let timeout = self.config.timeout();

        let written = match time::timeout(timeout, transport.send(&frame)).await {
            Ok(result) => result.map_err(ClientError::Write)?,
            Err(_) => {
                return Err(ClientError::WriteTimeout {
                    timeout_ms: timeout.as_millis(),
                });
            }
        };
        if written != frame.len() {
            return Err(ClientError::ShortWrite {
                written,
                expected: frame.len(),
            });
        }

        debug!(
            request = request.name(),
            connection_id = ?request.connection_id(),
            bytes = written,
            "request sent"
        );
        Ok(())
    }

    /// Best-effort unregister.
    async fn close(&mut self, transport: &mut C::Transport) {
        let Some(connection_id) = self.connection_id else {
            debug!("closing before registration, nothing to unregister");
            return;
        };
        let request = OutboundRequest::Unregister { connection_id };
        match self.send_request(transport, &request).await {
            Ok(()) => info!(connection_id, "unregistered"),
            Err(e) => warn!(connection_id, error = %e, "failed to unregister"),
        }
    }

    fn teardown(&mut self) {
        self.cache.reset();
        if self.connection_id.take().is_some() {
            self.dispatcher.disconnected();
        }
    }

    /// Sleep for the reconnect delay. Returns true when a disconnect was
    /// requested meanwhile.
    async fn backoff(&mut self) -> bool {
        let delay = self.config.reconnect_delay();
        debug!(delay_ms = self.config.reconnect_delay_ms, "waiting before reconnecting");
        let mut stop_rx = self.stop_rx.clone();
        tokio::select! {
            () = time::sleep(delay) => false,
            () = wait_for_stop(&mut stop_rx) => true,
        }
    }

    fn stop_requested(&self) -> bool {
        *self.stop_rx.borrow()
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "connection state");
        }
    }
}

/// Resolves once a stop is requested. Never resolves if the handle is gone.
async fn wait_for_stop(stop_rx: &mut watch::Receiver<bool>) {
    let stopped = stop_rx.wait_for(|stop| *stop).await.is_ok();
    if !stopped {
        std::future::pending::<()>().await;
    }
}
