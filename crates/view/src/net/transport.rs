use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::task::{CancelToken, Task};

use super::framing::{self, FrameError};

const READ_CHUNK: usize = 1024;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the stream; the transport is no longer usable.
    #[error("connection closed by peer")]
    Closed,
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("i/o failure: {0}")]
    Io(Arc<io::Error>),
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        TransportError::Io(Arc::new(e))
    }
}

pub type SendTask = Task<usize, TransportError>;
pub type ReceiveTask = Task<Vec<u8>, TransportError>;

/// A framed TCP connection with at most one outstanding send and one
/// outstanding receive.
///
/// Repeated `send`/`receive` calls while the previous task is still in
/// flight coalesce onto that task, so the underlying stream never sees
/// interleaved writes or competing readers.
pub struct Transport {
    stream: Option<TcpStream>,
    alive: Arc<AtomicBool>,
    send_task: Option<SendTask>,
    recv_task: Option<ReceiveTask>,
}

impl Transport {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        log::info!("connected to {}", stream.peer_addr()?);
        Ok(Self {
            stream: Some(stream),
            alive: Arc::new(AtomicBool::new(true)),
            send_task: None,
            recv_task: None,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.stream.is_some() && self.alive.load(Ordering::SeqCst)
    }

    /// Release the connection. Pending tasks are aborted and the stream is
    /// shut down so their blocking reads return; the transport is
    /// permanently unusable afterwards.
    pub fn close(&mut self) {
        if let Some(task) = &self.send_task {
            task.abort();
        }
        if let Some(task) = &self.recv_task {
            task.abort();
        }
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            log::info!("transport closed");
        }
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Frame `payload` and write it in the background; the task yields the
    /// number of bytes put on the wire (prefix included).
    ///
    /// Returns the still-running previous task if one is in flight, and
    /// `None` once the transport is dead.
    pub fn send(&mut self, payload: &[u8]) -> Option<SendTask> {
        if let Some(task) = &self.send_task {
            if !task.done() {
                return Some(task.clone());
            }
        }
        let mut stream = self.worker_stream()?;
        let alive = Arc::clone(&self.alive);

        let mut frame = framing::encode_len(payload.len() as u32);
        frame.extend_from_slice(payload);

        let task = Task::spawn(move |_: &CancelToken| {
            if let Err(e) = stream.write_all(&frame) {
                alive.store(false, Ordering::SeqCst);
                return Err(TransportError::from(e));
            }
            Ok(frame.len())
        });
        self.send_task = Some(task.clone());
        Some(task)
    }

    /// Read one whole frame in the background; the task yields exactly the
    /// payload, without the length prefix. Same coalescing rule as `send`.
    pub fn receive(&mut self) -> Option<ReceiveTask> {
        if let Some(task) = &self.recv_task {
            if !task.done() {
                return Some(task.clone());
            }
        }
        let mut stream = self.worker_stream()?;
        let alive = Arc::clone(&self.alive);

        let task = Task::spawn(move |cancel: &CancelToken| read_frame(&mut stream, &alive, cancel));
        self.recv_task = Some(task.clone());
        Some(task)
    }

    fn worker_stream(&self) -> Option<TcpStream> {
        if !self.is_alive() {
            return None;
        }
        match self.stream.as_ref()?.try_clone() {
            Ok(stream) => Some(stream),
            Err(e) => {
                log::warn!("could not clone stream for worker: {e}");
                None
            }
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Accumulate one length-prefixed frame from the stream.
///
/// The prefix itself may arrive split across reads; bytes that land in the
/// same chunk as the prefix already belong to the payload.
fn read_frame(
    stream: &mut TcpStream,
    alive: &AtomicBool,
    cancel: &CancelToken,
) -> Result<Vec<u8>, TransportError> {
    let mut chunk = [0u8; READ_CHUNK];
    let mut header: Vec<u8> = Vec::new();
    let mut payload: Vec<u8> = Vec::new();
    let mut expected: Option<usize> = None;

    loop {
        if let Some(total) = expected {
            if payload.len() >= total {
                payload.truncate(total);
                return Ok(payload);
            }
        }
        if cancel.is_cancelled() {
            return Err(TransportError::Closed);
        }

        let want = match expected {
            Some(total) => (total - payload.len()).min(READ_CHUNK),
            None => READ_CHUNK,
        };
        let read = stream.read(&mut chunk[..want])?;
        if read == 0 {
            alive.store(false, Ordering::SeqCst);
            log::info!("stream closed by peer");
            return Err(TransportError::Closed);
        }

        if expected.is_none() {
            header.extend_from_slice(&chunk[..read]);
            match framing::decode_len(&header)? {
                Some((len, consumed)) => {
                    expected = Some(len as usize);
                    payload.extend_from_slice(&header[consumed..]);
                    header.clear();
                }
                None => continue, // prefix still incomplete
            }
        } else {
            payload.extend_from_slice(&chunk[..read]);
        }
    }
}
