pub mod net;
pub mod session;
pub mod task;
pub mod world;

pub use net::codec;
pub use net::{
    Action, AreaInfo, DEFAULT_PORT, Edge, Entity, FrameError, Point, ReceiveTask, Record, Request,
    RequestFlags, Response, SendTask, Transport, TransportError, decode_len, encode_len,
};
pub use session::{Session, SessionError};
pub use task::{CancelToken, Task, TaskError};
pub use world::{
    ActionKind, EntityKind, MAP_DIR_KEY, MergeReport, TIMESTEPS_KEY, WorldError, WorldStore,
};
