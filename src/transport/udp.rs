//! UDP-based transport implementation.
//!
//! 基于UDP的传输实现。

use super::session::Session;
use super::{Delivery, Transport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

const MAX_DATAGRAM_SIZE: usize = 65_536;

/// A session over a single UDP socket.
///
/// A listener learns its peer from the first datagram carrying the right
/// session key, and follows the peer if its address changes. A connector knows
/// its peer from the start.
///
/// 基于单个UDP套接字的会话。
///
/// 监听端从第一个携带正确会话密钥的数据报得知对端，并在对端地址变化时跟随。
/// 连接端从一开始就知道对端。
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    session: Session,
    remote_addr: Option<SocketAddr>,
    recv_buf: Vec<u8>,
}

impl UdpTransport {
    /// Binds a listener with a freshly generated session key.
    ///
    /// 使用新生成的会话密钥绑定一个监听端。
    pub async fn listen(bind_addr: SocketAddr, throwaway_window: u16) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        let key = rand::random::<u64>();
        info!(addr = %socket.local_addr()?, "Listening for a peer");
        Ok(Self::from_parts(socket, Session::new(key, throwaway_window), None))
    }

    /// Binds an ephemeral socket and targets `remote_addr` under `key`.
    ///
    /// 绑定一个临时套接字，并以 `key` 指向 `remote_addr`。
    pub async fn connect(key: u64, remote_addr: SocketAddr, throwaway_window: u16) -> Result<Self> {
        let unspecified: SocketAddr = match remote_addr {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(unspecified).await?;
        info!(local = %socket.local_addr()?, remote = %remote_addr, "Connecting to peer");
        Ok(Self::from_parts(
            socket,
            Session::new(key, throwaway_window),
            Some(remote_addr),
        ))
    }

    fn from_parts(socket: UdpSocket, session: Session, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            socket,
            session,
            remote_addr,
            recv_buf: vec![0; MAX_DATAGRAM_SIZE],
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn session_key(&self) -> u64 {
        self.session.key()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&mut self, payload: Bytes, time_to_next: u16) -> Result<()> {
        let remote_addr = self.remote_addr.ok_or(Error::NotAttached)?;
        let datagram = self.session.seal(&payload, time_to_next);
        self.socket.send_to(&datagram, remote_addr).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Delivery> {
        loop {
            let (len, src_addr) = self.socket.recv_from(&mut self.recv_buf).await?;
            let datagram = Bytes::copy_from_slice(&self.recv_buf[..len]);
            match self.session.open(datagram) {
                Ok(Some(delivery)) => {
                    if self.remote_addr != Some(src_addr) {
                        match self.remote_addr {
                            None => info!(peer = %src_addr, "Peer attached"),
                            Some(old) => debug!(from = %old, to = %src_addr, "Peer address changed"),
                        }
                        self.remote_addr = Some(src_addr);
                    }
                    return Ok(delivery);
                }
                Ok(None) => {
                    warn!(addr = %src_addr, bytes = len, "Dropping datagram with foreign session key");
                }
                Err(e) => {
                    warn!(addr = %src_addr, bytes = len, error = %e, "Dropping undecodable datagram");
                }
            }
        }
    }

    fn next_seq(&self) -> u64 {
        self.session.next_seq()
    }

    fn srtt(&self) -> Option<Duration> {
        self.session.srtt()
    }

    fn is_attached(&self) -> bool {
        self.remote_addr.is_some()
    }
}
