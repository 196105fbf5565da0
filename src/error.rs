//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the forecast-paced link library.
/// 预测调速链路库的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying I/O error occurred.
    /// 发生了底层的I/O错误。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred during address parsing.
    /// 地址解析期间发生错误。
    #[error("Address parsing error: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    /// A wire frame declared more bytes than the datagram holds.
    /// The connection cannot recover from this.
    ///
    /// 线路帧声明的长度超过了数据报实际持有的字节数。连接无法从中恢复。
    #[error("Truncated wire frame: {declared} bytes declared, {available} available")]
    TruncatedFrame { declared: usize, available: usize },

    /// A forecast payload was present but could not be decoded.
    /// 预测载荷存在但无法解码。
    #[error("Malformed forecast payload: {0}")]
    MalformedForecast(&'static str),

    /// The serialized forecast does not fit the 16-bit length prefix.
    /// 序列化后的预测无法放入16位长度前缀。
    #[error("Serialized forecast is {0} bytes, exceeding the 65535 byte limit")]
    ForecastTooLarge(usize),

    /// A datagram was shorter than the session header.
    /// 数据报短于会话头。
    #[error("Malformed datagram received")]
    MalformedDatagram,

    /// The session key supplied on the command line could not be parsed.
    /// 命令行提供的会话密钥无法解析。
    #[error("Invalid session key: {0}")]
    InvalidSessionKey(String),

    /// A configuration value is outside its usable range.
    /// 配置值超出了可用范围。
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// An internal channel between the two ends of a link was closed.
    /// 链路两端之间的内部通道已关闭。
    #[error("Internal channel is broken")]
    ChannelClosed,

    /// A send was attempted before any peer attached to the listener.
    /// 在任何对端连接到监听者之前尝试发送。
    #[error("No peer has attached yet")]
    NotAttached,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(e) => e,
            Error::AddressParse(e) => std::io::Error::new(ErrorKind::InvalidInput, e),
            Error::TruncatedFrame { .. } => ErrorKind::InvalidData.into(),
            Error::MalformedForecast(_) => ErrorKind::InvalidData.into(),
            Error::ForecastTooLarge(_) => ErrorKind::InvalidInput.into(),
            Error::MalformedDatagram => ErrorKind::InvalidData.into(),
            Error::InvalidSessionKey(_) => ErrorKind::InvalidInput.into(),
            Error::InvalidConfig(_) => ErrorKind::InvalidInput.into(),
            Error::ChannelClosed => ErrorKind::BrokenPipe.into(),
            Error::NotAttached => ErrorKind::NotConnected.into(),
        }
    }
}
