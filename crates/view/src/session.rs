use std::io;
use std::net::ToSocketAddrs;

use crate::net::codec::{self, CodecError};
use crate::net::{Request, Response, Transport, TransportError};
use crate::task::TaskError;
use crate::world::WorldStore;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The transport is gone; the session is over.
    #[error("transport is closed")]
    Closed,
    /// An in-flight task was cancelled from another handle.
    #[error("operation aborted")]
    Aborted,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<TaskError<TransportError>> for SessionError {
    fn from(e: TaskError<TransportError>) -> Self {
        match e {
            TaskError::Aborted => SessionError::Aborted,
            TaskError::Failed(e) => SessionError::Transport(e),
        }
    }
}

/// One connection's worth of request/response exchanges, feeding every
/// received record into a [`WorldStore`].
pub struct Session {
    transport: Transport,
    world: WorldStore,
}

impl Session {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        Ok(Self::new(Transport::connect(addr)?))
    }

    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            world: WorldStore::new(),
        }
    }

    pub fn world(&self) -> &WorldStore {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldStore {
        &mut self.world
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_alive()
    }

    pub fn close(&mut self) {
        self.transport.close();
    }

    /// Send one request; blocks until the frame is on the wire.
    pub fn send(&mut self, request: &Request) -> Result<(), SessionError> {
        let payload = codec::encode(request)?;
        let task = self.transport.send(&payload).ok_or(SessionError::Closed)?;
        task.result()?;
        log::debug!("sent request {:?}", request.flags());
        Ok(())
    }

    /// Block for the next server response and fold its record into the
    /// world.
    ///
    /// A transport failure here means end-of-session; a record-less
    /// response (a plain ack) is returned as-is without touching the world.
    pub fn receive(&mut self) -> Result<Response, SessionError> {
        let task = self.transport.receive().ok_or(SessionError::Closed)?;
        let payload = task.result()?;
        let response: Response = codec::decode(&payload)?;

        if response.record.is_some() {
            // Only InvalidRecord can come back, and the record is present.
            let _ = self.world.update(response.record.as_ref());
        } else {
            log::debug!("response carried no record: {:?}", response.message);
        }
        Ok(response)
    }

    /// One request/response round trip.
    pub fn exchange(&mut self, request: &Request) -> Result<Response, SessionError> {
        self.send(request)?;
        self.receive()
    }
}
