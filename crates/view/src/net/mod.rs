pub mod codec;
mod framing;
mod protocol;
mod transport;

pub use framing::{FrameError, decode_len, encode_len};
pub use protocol::{
    Action, AreaInfo, DEFAULT_PORT, Edge, Entity, Point, Record, Request, RequestFlags, Response,
};
pub use transport::{ReceiveTask, SendTask, Transport, TransportError};
