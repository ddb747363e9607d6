//! Socket abstraction used by the client.
//!
//! The state machine only needs "resolve", "open a connected datagram socket",
//! "send one datagram" and "receive one datagram". Tests swap in scripted
//! implementations.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;

/// A connected datagram socket.
#[async_trait]
pub trait Transport: Send {
    /// Send one datagram, returning the number of bytes handed to the OS.
    async fn send(&mut self, frame: &[u8]) -> io::Result<usize>;

    /// Receive one datagram into `buffer`, returning its length.
    async fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize>;
}

/// Produces transports for a remote address.
#[async_trait]
pub trait Connector: Send {
    type Transport: Transport;

    async fn resolve(&mut self, address: &str) -> io::Result<SocketAddr>;

    async fn open(&mut self, remote: SocketAddr) -> io::Result<Self::Transport>;
}

/// Real UDP sockets.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpConnector;

#[async_trait]
impl Connector for UdpConnector {
    type Transport = UdpTransport;

    async fn resolve(&mut self, address: &str) -> io::Result<SocketAddr> {
        tokio::net::lookup_host(address).await?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{address} resolved to no addresses"),
            )
        })
    }

    async fn open(&mut self, remote: SocketAddr) -> io::Result<UdpTransport> {
        let bind_address = if remote.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(bind_address).await?;
        socket.connect(remote).await?;
        Ok(UdpTransport { socket })
    }
}

#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        self.socket.send(frame).await
    }

    async fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buffer).await
    }
}
