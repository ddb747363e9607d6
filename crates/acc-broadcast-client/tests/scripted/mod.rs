//! In-memory connector for driving the state machine without sockets.
//!
//! Datagrams pushed through [`Script`] are read by whichever transport is
//! currently open; every frame the client sends is captured for inspection.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use acc_broadcast_client::protocol::{InboundMessage, OutboundRequest};
use acc_broadcast_client::{Connector, Transport};
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

#[derive(Debug, Default)]
struct Knobs {
    opens: AtomicUsize,
    open_failures: AtomicUsize,
    short_writes: AtomicUsize,
}

/// Decrement `counter` if positive; true when it was.
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

pub struct ScriptedConnector {
    inbound: Arc<Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>,
    sent: mpsc::UnboundedSender<Vec<u8>>,
    knobs: Arc<Knobs>,
}

pub struct ScriptedTransport {
    inbound: Arc<Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>,
    sent: mpsc::UnboundedSender<Vec<u8>>,
    knobs: Arc<Knobs>,
}

/// Test side of a scripted connection.
pub struct Script {
    inbound: mpsc::UnboundedSender<Vec<u8>>,
    sent: mpsc::UnboundedReceiver<Vec<u8>>,
    knobs: Arc<Knobs>,
}

pub fn scripted() -> (ScriptedConnector, Script) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let knobs = Arc::new(Knobs::default());
    let connector = ScriptedConnector {
        inbound: Arc::new(Mutex::new(inbound_rx)),
        sent: sent_tx,
        knobs: Arc::clone(&knobs),
    };
    let script = Script {
        inbound: inbound_tx,
        sent: sent_rx,
        knobs,
    };
    (connector, script)
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    async fn resolve(&mut self, _address: &str) -> io::Result<SocketAddr> {
        Ok(SocketAddr::from(([127, 0, 0, 1], 9000)))
    }

    async fn open(&mut self, _remote: SocketAddr) -> io::Result<ScriptedTransport> {
        self.knobs.opens.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.knobs.open_failures) {
            return Err(io::Error::new(io::ErrorKind::AddrNotAvailable, "scripted open failure"));
        }
        Ok(ScriptedTransport {
            inbound: Arc::clone(&self.inbound),
            sent: self.sent.clone(),
            knobs: Arc::clone(&self.knobs),
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        if take_one(&self.knobs.short_writes) {
            return Ok(frame.len().saturating_sub(1));
        }
        self.sent
            .send(frame.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "script dropped"))?;
        Ok(frame.len())
    }

    async fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let datagram = self.inbound.lock().await.recv().await;
        let Some(datagram) = datagram else {
            return std::future::pending().await;
        };
        // Behaves like a UDP socket: the tail of an oversized datagram is lost.
        let len = datagram.len().min(buffer.len());
        let (head, _) = datagram.split_at(len);
        let target = buffer
            .get_mut(..len)
            .ok_or_else(|| io::Error::other("buffer shorter than copy"))?;
        target.copy_from_slice(head);
        Ok(len)
    }
}

impl Script {
    pub fn push(&self, message: &InboundMessage) -> Result<(), Box<dyn std::error::Error>> {
        self.push_raw(message.encode()?)
    }

    pub fn push_raw(&self, datagram: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
        self.inbound
            .send(datagram)
            .map_err(|_| "client side of the script is gone".into())
    }

    /// Next request the client sent, failing after `within`.
    pub async fn next_request(
        &mut self,
        within: Duration,
    ) -> Result<OutboundRequest, Box<dyn std::error::Error>> {
        match tokio::time::timeout(within, self.sent.recv()).await {
            Ok(Some(frame)) => Ok(OutboundRequest::decode(&frame)?),
            Ok(None) => Err("client side of the script is gone".into()),
            Err(_) => Err("timed out waiting for a request".into()),
        }
    }

    /// Requests sent so far, without waiting.
    pub fn sent_requests(&mut self) -> Result<Vec<OutboundRequest>, Box<dyn std::error::Error>> {
        let mut requests = Vec::new();
        while let Ok(frame) = self.sent.try_recv() {
            requests.push(OutboundRequest::decode(&frame)?);
        }
        Ok(requests)
    }

    pub fn opens(&self) -> usize {
        self.knobs.opens.load(Ordering::SeqCst)
    }

    pub fn fail_next_opens(&self, count: usize) {
        self.knobs.open_failures.store(count, Ordering::SeqCst);
    }

    pub fn short_write_next_sends(&self, count: usize) {
        self.knobs.short_writes.store(count, Ordering::SeqCst);
    }
}
