//! The packet module, containing the wire frame that carries forecasts and payload.
//! packet 模块，包含承载预测与载荷的线路帧。

pub mod frame;
