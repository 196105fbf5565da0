//! 定义了在网络上传输的线路帧：可选的预测加上不透明载荷。
//! Defines the wire frame transmitted over the network: an optional forecast
//! followed by opaque payload.
//!
//! Layout: `[u16 LE forecast length L][L bytes forecast][payload]`. `L = 0`
//! means no forecast is attached.

use crate::error::{Error, Result};
use crate::forecast::Forecast;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the little-endian forecast length prefix.
/// 小端预测长度前缀的大小。
pub const FORECAST_LENGTH_SIZE: usize = 2;

/// One datagram's worth of application data, optionally carrying a forecast.
///
/// 一个数据报的应用数据，可选地携带一个预测。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WireFrame {
    forecast: Option<Bytes>,
    payload: Bytes,
}

impl WireFrame {
    /// Creates a frame with no forecast.
    /// 创建一个不带预测的帧。
    pub fn new(payload: Bytes) -> Self {
        Self {
            forecast: None,
            payload,
        }
    }

    /// Attaches a serialized forecast.
    ///
    /// 附加一个序列化后的预测。
    pub fn with_forecast(mut self, forecast: &Forecast) -> Result<Self> {
        self.forecast = Some(forecast.to_bytes()?);
        Ok(self)
    }

    pub fn has_forecast(&self) -> bool {
        self.forecast.is_some()
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Decodes the attached forecast, if any. A present but undecodable
    /// forecast is an error.
    ///
    /// 解码附带的预测（如有）。存在但无法解码的预测视为错误。
    pub fn forecast(&self) -> Result<Option<Forecast>> {
        self.forecast
            .as_deref()
            .map(Forecast::from_bytes)
            .transpose()
    }

    pub fn encoded_len(&self) -> usize {
        FORECAST_LENGTH_SIZE + self.forecast.as_ref().map_or(0, Bytes::len) + self.payload.len()
    }

    /// 将帧编码到缓冲区。
    /// Encodes the frame into a buffer.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        match &self.forecast {
            Some(forecast) => {
                debug_assert!(forecast.len() <= u16::MAX as usize);
                buf.put_u16_le(forecast.len() as u16);
                buf.put_slice(forecast);
            }
            None => buf.put_u16_le(0),
        }
        buf.put_slice(&self.payload);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// 从一个完整的数据报解码帧。
    /// Decodes a frame from a complete datagram.
    ///
    /// A declared forecast length larger than the bytes that follow is fatal
    /// framing corruption.
    pub fn decode(mut datagram: Bytes) -> Result<Self> {
        if datagram.len() < FORECAST_LENGTH_SIZE {
            return Err(Error::TruncatedFrame {
                declared: FORECAST_LENGTH_SIZE,
                available: datagram.len(),
            });
        }
        let declared = datagram.get_u16_le() as usize;
        if declared > datagram.len() {
            return Err(Error::TruncatedFrame {
                declared,
                available: datagram.len(),
            });
        }
        let forecast = (declared > 0).then(|| datagram.split_to(declared));
        Ok(Self {
            forecast,
            payload: datagram,
        })
    }
}
