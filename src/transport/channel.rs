//! In-process transport linking two sessions over channels.
//!
//! 通过通道连接两个会话的进程内传输。

use super::session::Session;
use super::{Delivery, Transport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// Datagrams in flight per direction before the link starts dropping.
const CHANNEL_CAPACITY: usize = 1024;

/// One end of an in-memory datagram link. Encoded datagrams are the only thing
/// crossing between the two ends, exactly as over a socket. A full channel drops
/// the datagram instead of blocking.
///
/// 内存数据报链路的一端。两端之间只传递编码后的数据报，与套接字完全一致。
/// 通道满时丢弃数据报而不是阻塞。
#[derive(Debug)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Bytes>,
    rx: mpsc::Receiver<Bytes>,
    session: Session,
}

impl ChannelTransport {
    /// Creates two connected ends sharing `key`.
    ///
    /// 创建共享 `key` 的两个相连端点。
    pub fn pair(key: u64, throwaway_window: u16) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (b_tx, a_rx) = mpsc::channel(CHANNEL_CAPACITY);
        (
            Self {
                tx: a_tx,
                rx: a_rx,
                session: Session::new(key, throwaway_window),
            },
            Self {
                tx: b_tx,
                rx: b_rx,
                session: Session::new(key, throwaway_window),
            },
        )
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, payload: Bytes, time_to_next: u16) -> Result<()> {
        let datagram = self.session.seal(&payload, time_to_next);
        match self.tx.try_send(datagram) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("Channel link saturated, dropping datagram");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(Error::ChannelClosed),
        }
    }

    async fn recv(&mut self) -> Result<Delivery> {
        loop {
            let datagram = self.rx.recv().await.ok_or(Error::ChannelClosed)?;
            match self.session.open(datagram) {
                Ok(Some(delivery)) => return Ok(delivery),
                Ok(None) => warn!("Dropping datagram with foreign session key"),
                Err(e) => warn!(error = %e, "Dropping undecodable datagram"),
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
        true
    }
}
